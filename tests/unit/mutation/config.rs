use super::*;

fn config() -> MutationConfig {
    MutationConfig::new(MutationConfigOpts::default(), &NodeRegistry::new())
}

#[test]
fn default_weights_penalise_expensive_kinds() {
    let cfg = config();
    assert_eq!(cfg.weighting(Kind::Add), 1.0);
    assert_eq!(cfg.weighting(Kind::Iterate), 1.0 / 1024.0);
    assert_eq!(cfg.weighting(Kind::MandelbrotContour), 1.0 / 1024.0);
    assert_eq!(cfg.weighting(Kind::Top), 0.0);
}

#[test]
fn top_is_never_drawn() {
    let mut cfg = config();
    cfg.set_weighting(Kind::Top, 1000.0);
    assert_eq!(cfg.weighting(Kind::Top), 0.0);
    for _ in 0..5000 {
        assert_ne!(cfg.random_kind(), Kind::Top);
    }
}

#[test]
fn single_weighted_kind_is_always_drawn() {
    let mut cfg = config();
    for k in Kind::ALL {
        cfg.set_weighting(k, 0.0);
    }
    cfg.set_weighting(Kind::Cross, 1.0);
    for _ in 0..100 {
        assert_eq!(cfg.random_kind(), Kind::Cross);
    }
    assert!((cfg.random_branching_ratio() - 2.0).abs() < 1e-12);
}

#[test]
fn zero_weights_fall_back_to_identity() {
    let mut cfg = config();
    for k in Kind::ALL {
        cfg.set_weighting(k, 0.0);
    }
    assert_eq!(cfg.random_kind(), Kind::Identity);
    assert_eq!(cfg.random_branching_ratio(), 0.0);
}

#[test]
fn randomized_weights_are_powers_of_two() {
    let mut cfg = config();
    cfg.randomize_weightings_for_classifications(Classification::STRUCTURE);
    for k in Kind::ALL {
        let w = cfg.weighting(k);
        if k.contract().classification.intersects(Classification::STRUCTURE) {
            let i = -w.log2();
            assert!((0.0..=10.0).contains(&i) && i.fract() == 0.0, "{k}: {w}");
        }
    }
    assert_eq!(cfg.weighting(Kind::Add), 1.0);
}

#[test]
fn general_cool_scales_probabilities() {
    let mut cfg = config();
    cfg.general_cool(0.5);
    assert!((cfg.magnitude() - 0.125).abs() < 1e-12);
    assert!((cfg.probability_glitch() - 0.025).abs() < 1e-12);
    assert!((cfg.probability_iterations_change_step() - 0.125).abs() < 1e-12);
    assert_eq!(cfg.proportion_basic(), 0.5);
    cfg.reset();
    assert!((cfg.magnitude() - 0.25).abs() < 1e-12);
}

#[test]
fn autocool_halves_at_halflife() {
    let opts = MutationConfigOpts {
        autocool: true,
        autocool_halflife: 4,
        ..MutationConfigOpts::default()
    };
    let mut cfg = MutationConfig::new(opts, &NodeRegistry::new());
    assert_eq!(cfg.decay_factor(), 1.0);
    for _ in 0..4 {
        cfg.autocool_step();
    }
    assert!((cfg.decay_factor() - 0.5).abs() < 1e-12);
    assert!((cfg.magnitude() - 0.125).abs() < 1e-12);
    cfg.reset_autocool();
    assert_eq!(cfg.decay_factor(), 1.0);
}

#[test]
fn opts_deserialize_with_defaults() {
    let opts: MutationConfigOpts =
        serde_json::from_str(r#"{ "magnitude": 0.5, "seed": 9 }"#).expect("parse opts");
    assert_eq!(opts.magnitude, 0.5);
    assert_eq!(opts.seed, 9);
    assert_eq!(opts.max_initial_iterations, 16);
    assert_eq!(opts.probability_shuffle, 0.05);
}

#[test]
fn reset_cooling_keeps_weights() {
    let mut cfg = config();
    cfg.set_weighting(Kind::Add, 0.25);
    cfg.general_cool(0.1);
    cfg.reset_cooling();
    assert!((cfg.magnitude() - 0.25).abs() < 1e-12);
    assert!((cfg.probability_insert() - 0.05).abs() < 1e-12);
    assert_eq!(cfg.weighting(Kind::Add), 0.25);
}
