use super::*;
use crate::function::registry::NodeRegistry;
use crate::mutation::config::{MutationConfig, MutationConfigOpts};

fn leaf(kind: Kind, params: Vec<f64>) -> Node {
    Node::new(kind, params, vec![], None).expect("leaf")
}

fn node(kind: Kind, params: Vec<f64>, children: Vec<Node>) -> Node {
    Node::new(kind, params, children, None).expect("node")
}

fn same(a: Xyz, b: Xyz) -> bool {
    let eq = |x: f64, y: f64| x == y || (x.is_nan() && y.is_nan());
    eq(a.x, b.x) && eq(a.y, b.y) && eq(a.z, b.z)
}

const POINTS: [Xyz; 4] = [
    Xyz::new(0.0, 0.0, 0.0),
    Xyz::new(0.3, -0.7, 0.1),
    Xyz::new(-5.0, 2.5, -1.0),
    Xyz::new(1e3, 1e-3, -42.0),
];

#[test]
fn constant_ignores_its_input() {
    let c = Node::constant(Xyz::new(1.0, 0.0, -1.0));
    for p in POINTS {
        assert_eq!(c.evaluate(p), Xyz::new(1.0, 0.0, -1.0));
    }
    assert!(c.is_constant());
}

#[test]
fn identity_returns_its_input() {
    let i = Node::identity();
    for p in POINTS {
        assert_eq!(i.evaluate(p), p);
    }
    assert!(!i.is_constant());
}

#[test]
fn top_with_identity_transforms_is_identity() {
    let top = Node::top(Node::identity());
    assert!(top.ok());
    for p in POINTS {
        let v = top.evaluate(p);
        assert!((v - p).magnitude() < 1e-12, "{p:?} -> {v:?}");
    }
}

#[test]
fn top_applies_pre_then_post() {
    let mut top = Node::top(Node::identity());
    top.set_pretransform(&Transform::scale(2.0));
    top.set_posttransform(&Transform::translation(Xyz::new(1.0, 0.0, 0.0)));
    let v = top.evaluate(Xyz::new(1.0, 1.0, 1.0));
    assert!((v - Xyz::new(3.0, 2.0, 2.0)).magnitude() < 1e-12, "{v:?}");
}

#[test]
fn arithmetic_kinds() {
    let c = |x: f64, y: f64, z: f64| Node::constant(Xyz::new(x, y, z));
    let p = Xyz::new(0.5, 0.5, 0.5);

    let add = node(Kind::Add, vec![], vec![c(1.0, 2.0, 3.0), Node::identity()]);
    assert_eq!(add.evaluate(p), Xyz::new(1.5, 2.5, 3.5));

    let mul = node(Kind::Multiply, vec![], vec![c(2.0, 4.0, 6.0), Node::identity()]);
    assert_eq!(mul.evaluate(p), Xyz::new(1.0, 2.0, 3.0));

    let div = node(Kind::Divide, vec![], vec![c(1.0, 1.0, 1.0), c(2.0, 0.0, -4.0)]);
    let v = div.evaluate(p);
    assert_eq!(v.x, 0.5);
    assert!(v.y.is_finite());
    assert_eq!(v.z, -0.25);

    let cross = node(Kind::Cross, vec![], vec![c(1.0, 0.0, 0.0), c(0.0, 1.0, 0.0)]);
    assert_eq!(cross.evaluate(p), Xyz::new(0.0, 0.0, 1.0));
}

#[test]
fn compose_applies_in_order() {
    let shift = Node::transform(&Transform::translation(Xyz::new(1.0, 0.0, 0.0)));
    let double = Node::transform(&Transform::scale(2.0));
    let pair = node(Kind::ComposePair, vec![], vec![shift, double]);
    assert_eq!(pair.evaluate(Xyz::ZERO), Xyz::new(2.0, 0.0, 0.0));
}

#[test]
fn compose_with_a_constant_stage_is_constant() {
    let pair = node(
        Kind::ComposePair,
        vec![],
        vec![Node::identity(), Node::constant(Xyz::fill(0.25))],
    );
    assert!(pair.is_constant());
    let pair = node(
        Kind::ComposePair,
        vec![],
        vec![Node::constant(Xyz::fill(0.25)), leaf(Kind::Sin, vec![])],
    );
    assert!(pair.is_constant());
    assert_eq!(pair.evaluate(POINTS[2]), pair.evaluate(POINTS[3]));
}

#[test]
fn position_dependent_choosers_are_never_constant() {
    let c = |v: f64| Node::constant(Xyz::fill(v));
    let strip = node(Kind::ChooseStrip, vec![1.0, 0.0, 0.0], vec![c(0.0), c(1.0), c(0.5)]);
    assert!(!strip.is_constant());
    assert_ne!(
        strip.evaluate(Xyz::new(0.0, 0.0, 0.0)),
        strip.evaluate(Xyz::new(0.0, 2.0, 0.0))
    );

    let grid = node(Kind::ChooseFrom2InSquareGrid, vec![], vec![c(0.0), c(1.0)]);
    assert!(!grid.is_constant());
    assert_ne!(
        grid.evaluate(Xyz::new(0.5, 0.5, 0.0)),
        grid.evaluate(Xyz::new(1.5, 0.5, 0.0))
    );
}

#[test]
fn leaves_without_children_are_not_constant() {
    for k in [Kind::Sin, Kind::Cone, Kind::MandelbrotContour, Kind::NoiseOneChannel] {
        let mut cfg = MutationConfig::new(MutationConfigOpts::default(), &NodeRegistry::new());
        let n = Node::stubnew(&mut cfg, k);
        assert!(!n.is_constant(), "{k}");
    }
}

#[test]
fn degenerate_inputs_stay_finite() {
    let inversion = node(Kind::GeometricInversion, vec![], vec![Node::identity()]);
    assert_eq!(inversion.evaluate(Xyz::ZERO), Xyz::ZERO);

    let spiral = node(Kind::SpiralLogarithmic, vec![], vec![Node::identity()]);
    assert!(spiral.evaluate(Xyz::ZERO).is_finite());

    let pixelize = leaf(Kind::Pixelize, vec![0.0, 0.25, 0.0]);
    let v = pixelize.evaluate(Xyz::new(0.3, 0.3, 0.3));
    assert!(v.is_finite());
    assert_eq!(v.x, 0.3);
}

#[test]
fn every_kind_evaluates() {
    let mut cfg = MutationConfig::new(
        MutationConfigOpts {
            seed: 11,
            max_initial_iterations: 4,
            ..MutationConfigOpts::default()
        },
        &NodeRegistry::new(),
    );
    for k in Kind::ALL {
        let n = Node::stubnew(&mut cfg, k);
        for p in POINTS {
            // Totality: no panics anywhere in the domain.
            let _ = n.evaluate(p);
        }
    }
}

#[test]
fn constant_trees_agree_everywhere() {
    let mut cfg = MutationConfig::new(
        MutationConfigOpts {
            seed: 12,
            max_initial_iterations: 4,
            ..MutationConfigOpts::default()
        },
        &NodeRegistry::new(),
    );
    let mut seen = 0;
    for _ in 0..400 {
        let n = Node::stub(&mut cfg, false);
        if n.is_constant() {
            seen += 1;
            let v = n.evaluate(POINTS[0]);
            for p in &POINTS[1..] {
                assert!(same(n.evaluate(*p), v), "{:?}", n.kind());
            }
        }
    }
    assert!(seen > 0);
}
