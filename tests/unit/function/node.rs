use super::*;
use crate::function::registry::NodeRegistry;
use crate::mutation::config::MutationConfigOpts;

fn config(seed: u64) -> MutationConfig {
    let opts = MutationConfigOpts {
        seed,
        ..MutationConfigOpts::default()
    };
    MutationConfig::new(opts, &NodeRegistry::new())
}

#[test]
fn new_checks_contract() {
    assert!(Node::new(Kind::Constant, vec![1.0, 2.0, 3.0], vec![], None).is_ok());

    let e = Node::new(Kind::Constant, vec![1.0], vec![], None).expect_err("short params");
    assert!(e.to_string().contains("expected 3 parameters"), "{e}");

    let e = Node::new(Kind::Add, vec![], vec![Node::identity()], None).expect_err("one arg");
    assert!(e.to_string().contains("expected 2 arguments"), "{e}");

    assert!(Node::new(Kind::Iterate, vec![], vec![Node::identity()], None).is_err());
    assert!(Node::new(Kind::Iterate, vec![], vec![Node::identity()], Some(0)).is_err());
    assert!(Node::new(Kind::Iterate, vec![], vec![Node::identity()], Some(3)).is_ok());
    assert!(Node::new(Kind::Identity, vec![], vec![], Some(3)).is_err());
}

#[test]
fn ok_sees_broken_descendants() {
    let mut n = Node::new(
        Kind::Add,
        vec![],
        vec![Node::identity(), Node::constant(Xyz::ZERO)],
        None,
    )
    .expect("add");
    assert!(n.ok());
    n.children[1].params.pop();
    assert!(!n.ok());
}

#[test]
fn stubs_satisfy_contracts() {
    let mut cfg = config(1);
    for exciting in [false, true] {
        for _ in 0..200 {
            let n = Node::stub(&mut cfg, exciting);
            assert!(n.ok(), "{:?}", n.kind());
            assert_ne!(n.kind(), Kind::Top);
        }
    }
}

#[test]
fn stubnew_covers_every_kind() {
    let mut cfg = config(2);
    for k in Kind::ALL {
        let n = Node::stubnew(&mut cfg, k);
        assert_eq!(n.kind(), k);
        assert!(n.ok(), "{k}");
        if let Some(i) = n.iterations() {
            assert!((1..=cfg.max_initial_iterations()).contains(&i), "{k}: {i}");
        }
    }
}

#[test]
fn stubparams_are_in_unit_range() {
    let mut cfg = config(3);
    let p = Node::stubparams(&mut cfg, 500);
    assert_eq!(p.len(), 500);
    assert!(p.iter().all(|v| (-1.0..1.0).contains(v)));
}

#[test]
fn mutation_keeps_contracts() {
    let opts = MutationConfigOpts {
        seed: 4,
        probability_glitch: 0.3,
        probability_shuffle: 0.3,
        probability_insert: 0.3,
        probability_substitute: 0.3,
        probability_iterations_change_step: 0.5,
        probability_iterations_change_jump: 0.5,
        ..MutationConfigOpts::default()
    };
    let mut cfg = MutationConfig::new(opts, &NodeRegistry::new());
    let mut n = Node::stub(&mut cfg, true);
    for _ in 0..30 {
        n.mutate(&mut cfg);
        assert!(n.ok());
        // Keep the tree from growing without bound.
        if n.stats().nodes > 400 {
            n = Node::stub(&mut cfg, true);
        }
    }
}

#[test]
fn iteration_counts_never_reach_zero() {
    let mut cfg = config(5);
    for _ in 0..2000 {
        assert!(mutate_iterations(&mut cfg, 1) >= 1);
    }
}

#[test]
fn deepclone_is_independent() {
    let mut cfg = config(6);
    let a = Node::top_initial(&mut cfg, None, false);
    let mut b = a.deepclone();
    assert_eq!(a, b);
    b.mutate(&mut cfg);
    b.params[0] += 1.0;
    assert_ne!(a, b);
}

#[test]
fn stats_count_shape() {
    let n = Node::new(
        Kind::Add,
        vec![],
        vec![
            Node::constant(Xyz::new(1.0, 2.0, 3.0)),
            Node::new(Kind::Sin, vec![], vec![], None).expect("sin"),
        ],
        None,
    )
    .expect("add");
    let s = n.stats();
    assert_eq!(s.nodes, 3);
    assert_eq!(s.parameters, 3);
    assert_eq!(s.depth, 2);
    assert_eq!(s.width, 2);
    assert_eq!(s.constants, 1);
    assert!((s.proportion_constant() - 1.0 / 3.0).abs() < 1e-12);
    assert_eq!(TreeStats::default().proportion_constant(), 0.0);
}

#[test]
fn simplify_folds_constant_subtrees() {
    let c = |v: f64| Node::constant(Xyz::fill(v));
    let sum = Node::new(Kind::Add, vec![], vec![c(1.0), c(2.0)], None).expect("add");
    let n = Node::new(Kind::Multiply, vec![], vec![sum, Node::identity()], None).expect("mul");

    let mut s = n.deepclone();
    let removed = s.simplify_constants();
    assert_eq!(removed, 2);
    assert_eq!(s.children()[0], Node::constant(Xyz::fill(3.0)));
    assert!(s.ok());

    let p = Xyz::new(0.5, -2.0, 4.0);
    assert_eq!(s.evaluate(p), n.evaluate(p));
    assert_eq!(n.simplified(), s);
}

#[test]
fn substitute_keeps_contract() {
    let mut cfg = config(7);
    for _ in 0..200 {
        let old = Node::stub(&mut cfg, false);
        let fresh = substitute(&mut cfg, old);
        assert!(fresh.ok(), "{}", fresh.kind());
    }
}
