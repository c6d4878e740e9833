use super::*;
use crate::foundation::transform::Transform;
use crate::mutation::config::MutationConfigOpts;

fn identity_image(z_sweep: ZSweep, projection: Projection) -> Image {
    Image::new(Node::top(Node::identity()), z_sweep, projection).expect("image")
}

fn load(src: &str) -> Result<(Image, LoadReport), LoadReport> {
    Image::load(&NodeRegistry::new(), &mut src.as_bytes())
}

#[test]
fn new_requires_top_root() {
    assert!(Image::new(Node::identity(), ZSweep::Linear, Projection::Planar).is_err());
    assert!(identity_image(ZSweep::Linear, Projection::Planar).ok());
}

#[test]
fn planar_sampling_spans_the_square() {
    let img = identity_image(ZSweep::Linear, Projection::Planar);
    assert_eq!(img.sampling_coordinate(0.0, 0.0, 0, 4, 4, 1), Xyz::new(-1.0, 1.0, 0.0));
    assert_eq!(img.sampling_coordinate(4.0, 4.0, 0, 4, 4, 1), Xyz::new(1.0, -1.0, 0.0));
    let z = img.sampling_coordinate(0.0, 0.0, 3, 4, 4, 4).z;
    assert!((z - 0.75).abs() < 1e-12);
}

#[test]
fn sinusoidal_sweep_follows_cosine() {
    let img = identity_image(ZSweep::Sinusoidal, Projection::Planar);
    let z = img.sampling_coordinate(0.0, 0.0, 0, 4, 4, 2).z;
    assert!((z - (std::f64::consts::PI * 0.25).cos()).abs() < 1e-12);
    assert!(img.sampling_coordinate(0.0, 0.0, 0, 4, 4, 1).z.abs() < 1e-12);
}

#[test]
fn spheremap_radius_follows_sweep() {
    let img = identity_image(ZSweep::Linear, Projection::Spheremap);
    let p = img.sampling_coordinate(1.0, 2.0, 0, 4, 4, 1);
    assert!((p.magnitude() - 1.0).abs() < 1e-12, "{p:?}");
    let img = identity_image(ZSweep::Sinusoidal, Projection::Spheremap);
    let p = img.sampling_coordinate(3.0, 1.0, 0, 4, 4, 1);
    assert!((p.magnitude() - 1.5).abs() < 1e-12, "{p:?}");
}

#[test]
fn colours_are_packed_and_clamped() {
    assert_eq!(pack_rgb(Xyz::new(255.0, 0.0, 127.9)), 0xff007f);
    assert_eq!(pack_rgb(Xyz::new(1e9, -4.0, f64::NAN)), 0xff0000);

    let mut root = Node::top(Node::constant(Xyz::new(2.0, -2.0, 0.0)));
    root.set_posttransform(&Transform::identity());
    let img = Image::new(root, ZSweep::Linear, Projection::Planar).expect("image");
    // 127.5 * (0.5 * v + 1): 2 -> 255, -2 -> 0, 0 -> 127.5
    assert_eq!(img.pixel(0, 0, 0, 1, 1, 1, &[]), 0xff007f);
}

#[test]
fn derived_images_get_new_serials() {
    let registry = NodeRegistry::new();
    let mut cfg = MutationConfig::new(MutationConfigOpts::default(), &registry);
    let img = Image::new_random(&registry, &mut cfg, None, false, ZSweep::Linear, Projection::Planar)
        .expect("random");
    assert!(img.ok());
    assert!(!img.is_constant());

    let copy = img.deepclone();
    assert_ne!(copy.serial(), img.serial());
    assert_eq!(copy.root(), img.root());
    assert!(!copy.locked());
    assert!(img.with_locked(true).locked());

    let mutant = img.mutated(&mut cfg);
    assert!(mutant.ok());
    assert_ne!(mutant.serial(), img.serial());
    assert_eq!(mutant.z_sweep(), ZSweep::Linear);

    let simple = img.simplified();
    assert!(simple.ok());
    assert!(simple.stats().nodes <= img.stats().nodes);
}

#[test]
fn favourite_names_resolve() {
    let registry = NodeRegistry::new();
    let mut cfg = MutationConfig::new(MutationConfigOpts::default(), &registry);
    let img = Image::new_random(
        &registry,
        &mut cfg,
        Some("Kaleidoscope"),
        true,
        ZSweep::Sinusoidal,
        Projection::Planar,
    )
    .expect("favourite");
    assert_eq!(img.root().children()[0].kind(), Kind::Kaleidoscope);

    let e = Image::new_random(&registry, &mut cfg, Some("NoSuchFunction"), false, ZSweep::Linear, Projection::Planar)
        .expect_err("unknown");
    assert!(e.to_string().contains("NoSuchFunction"));
}

#[test]
fn save_writes_header_and_attributes() {
    let img = identity_image(ZSweep::Linear, Projection::Spheremap);
    let text = img.to_markup();
    assert!(text.starts_with("<?xml version=\"1.0\"?>\n<evolvotron-image-function version=\""));
    assert!(text.contains("zsweep=\"linear\" projection=\"spheremap\">\n  <f>\n    <type>FunctionTop</type>"));
    assert!(text.ends_with("</evolvotron-image-function>\n"));
}

#[test]
fn load_round_trips() {
    let img = identity_image(ZSweep::Linear, Projection::Spheremap);
    let (back, report) = load(&img.to_markup()).expect("load");
    assert!(report.is_empty(), "{report}");
    assert_eq!(back.root(), img.root());
    assert_eq!(back.z_sweep(), ZSweep::Linear);
    assert_eq!(back.projection(), Projection::Spheremap);
}

#[test]
fn missing_attributes_are_warnings() {
    let (img, report) = load(
        "<evolvotron-image-function><f><type>FunctionIdentity</type></f></evolvotron-image-function>",
    )
    .expect("load");
    assert!(report.is_ok());
    let text = report.to_string();
    assert!(text.contains("Warning: File does not include evolvotron version"));
    assert!(text.contains("Defaulting to sinusoidal"));
    assert!(text.contains("Defaulting to planar"));
    assert!(text.contains("wrapping it in identity transforms"));
    assert_eq!(img.root().kind(), Kind::Top);
    assert_eq!(img.z_sweep(), ZSweep::Sinusoidal);
}

#[test]
fn other_versions_are_warnings() {
    let src = img_doc("0.0.1", "linear", "planar");
    let (_, report) = load(&src).expect("load");
    assert!(
        report
            .to_string()
            .contains("File saved from a different evolvotron version: 0.0.1")
    );
}

#[test]
fn bad_attributes_fail() {
    let report = load(&img_doc(crate::VERSION, "wobbly", "planar")).expect_err("zsweep");
    assert!(report.to_string().contains(
        "Error: zsweep attribute expected \"sinusoidal\" or \"linear\", but got \"wobbly\""
    ));
    let report = load(&img_doc(crate::VERSION, "linear", "cubic")).expect_err("projection");
    assert!(report.to_string().contains("but got \"cubic\""));
}

#[test]
fn wrong_document_element_fails() {
    let report = load("<picture/>").expect_err("root");
    assert!(
        report
            .to_string()
            .contains("Error: Expected <evolvotron-image-function> but got \"picture\"")
    );
}

#[test]
fn malformed_markup_is_a_parse_error() {
    let report = load("<evolvotron-image-function><f>").expect_err("markup");
    assert!(report.to_string().starts_with("Parse error: markup error at byte"));
}

fn img_doc(version: &str, zsweep: &str, projection: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\n<evolvotron-image-function version=\"{version}\" \
         zsweep=\"{zsweep}\" projection=\"{projection}\">\n\
         <f><type>FunctionIdentity</type></f>\n</evolvotron-image-function>\n"
    )
}
