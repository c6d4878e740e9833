use super::*;
use crate::foundation::xyz::Xyz;
use crate::function::markup::parser::parse_document;
use crate::function::registry::Kind;

fn info_of(src: &str) -> (Option<NodeInfo>, LoadReport) {
    let doc = parse_document(src).expect("well-formed");
    let mut report = LoadReport::default();
    let info = NodeInfo::from_element(&doc, &mut report);
    (info, report)
}

fn create(src: &str) -> (Option<Node>, LoadReport) {
    let registry = NodeRegistry::new();
    let (info, mut report) = info_of(src);
    let node = info.and_then(|i| Node::create(&registry, &i, &mut report));
    (node, report)
}

#[test]
fn reads_nested_functions() {
    let (info, report) = info_of(
        "<f><type>FunctionIterate</type><i>3</i>\
         <f><type>FunctionConstant</type><p>1</p><p>0</p><p>-1.5</p></f></f>",
    );
    assert!(report.is_ok(), "{report}");
    let info = info.expect("info");
    assert_eq!(info.name, "FunctionIterate");
    assert_eq!(info.iterations, Some(3));
    assert_eq!(info.children.len(), 1);
    assert_eq!(info.children[0].params, vec![1.0, 0.0, -1.5]);
}

#[test]
fn create_builds_checked_nodes() {
    let (node, report) =
        create("<f><type>FunctionConstant</type><p>1</p><p>0</p><p>-1</p></f>");
    assert!(report.is_ok());
    let node = node.expect("node");
    assert_eq!(node.kind(), Kind::Constant);
    assert_eq!(node.evaluate(Xyz::ZERO), Xyz::new(1.0, 0.0, -1.0));
}

#[test]
fn wrong_parameter_count_is_reported() {
    let (node, report) = create("<f><type>FunctionConstant</type><p>1</p></f>");
    assert!(node.is_none());
    assert!(!report.is_ok());
    assert!(
        report
            .to_string()
            .contains("Error: For function FunctionConstant: expected 3 parameters, but found 1"),
        "{report}"
    );
}

#[test]
fn wrong_argument_count_is_reported() {
    let (node, report) = create("<f><type>FunctionAdd</type><f><type>FunctionIdentity</type></f></f>");
    assert!(node.is_none());
    assert!(
        report
            .to_string()
            .contains("expected 2 arguments, but found 1"),
        "{report}"
    );
}

#[test]
fn iteration_flag_must_match() {
    let (node, report) = create("<f><type>FunctionIdentity</type><i>2</i></f>");
    assert!(node.is_none());
    assert!(report.to_string().contains("unexpected iteration count"));

    let (node, report) =
        create("<f><type>FunctionIterate</type><f><type>FunctionIdentity</type></f></f>");
    assert!(node.is_none());
    assert!(
        report
            .to_string()
            .contains("expected iteration count but none found")
    );
}

#[test]
fn unknown_names_are_reported() {
    let (node, report) = create("<f><type>FunctionBogus</type></f>");
    assert!(node.is_none());
    assert!(
        report
            .to_string()
            .contains("Error: Unrecognised function name: FunctionBogus")
    );
}

#[test]
fn malformed_numbers_are_reported() {
    let (info, report) = info_of("<f><type>FunctionConstant</type><p>one</p></f>");
    assert!(info.is_none());
    assert!(report.to_string().contains("Couldn't parse \"one\" as a real"));

    let (info, report) = info_of("<f><type>FunctionIterate</type><i>-2</i></f>");
    assert!(info.is_none());
    assert!(report.to_string().contains("Couldn't parse \"-2\" as an integer"));
}

#[test]
fn unexpected_content_is_reported() {
    let (info, report) = info_of("<f><q>1</q></f>");
    assert!(info.is_none());
    assert!(
        report
            .to_string()
            .contains("Expected <f>, <type>, <i> or <p> but got \"q\"")
    );

    let (info, report) = info_of("<f>stray</f>");
    assert!(info.is_none());
    assert!(report.to_string().contains("Unexpected character data : \"stray\""));

    let (info, report) = info_of("<f><type><p>1</p></type></f>");
    assert!(info.is_none());
    assert!(report.to_string().contains("got start element \"p\""));

    let (info, report) = info_of("<f><type></type></f>");
    assert!(info.is_none());
    assert!(report.to_string().contains("got end element \"type\""));
}

#[test]
fn single_root_function_required() {
    let doc = parse_document("<r><f><type>FunctionIdentity</type></f><f/></r>").expect("doc");
    let mut report = LoadReport::default();
    assert!(root_function(&doc, &mut report).is_none());
    assert!(report.to_string().contains("Multiple top level <f> elements encountered"));

    let doc = parse_document("<r></r>").expect("doc");
    let mut report = LoadReport::default();
    assert!(root_function(&doc, &mut report).is_none());
    assert!(report.to_string().contains("No root function node found"));
}

#[test]
fn saved_markup_reads_back() {
    let n = Node::new(
        Kind::Iterate,
        vec![],
        vec![Node::constant(Xyz::new(0.1, -2.5e-7, 3.0))],
        Some(5),
    )
    .expect("iterate");
    let mut out = Vec::new();
    n.save_function(&mut out, 0).expect("write");
    let text = String::from_utf8(out).expect("utf8");
    assert!(text.starts_with("<f>\n  <type>FunctionIterate</type>\n  <i>5</i>\n  <f>\n"));

    let (back, report) = create(&text);
    assert!(report.is_ok(), "{report}");
    assert_eq!(back.expect("node"), n);
}
