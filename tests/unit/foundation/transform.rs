use super::*;

fn close(a: Xyz, b: Xyz) -> bool {
    (a - b).magnitude() < 1e-9
}

#[test]
fn identity_params_round_trip() {
    let t = Transform::identity();
    let p = t.to_params();
    assert_eq!(
        p,
        [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]
    );
    assert_eq!(Transform::from_params(&p), t);
}

#[test]
fn right_concatenation_applies_argument_first() {
    let mut t = Transform::translation(Xyz::new(1.0, 0.0, 0.0));
    t.concatenate_on_right(&Transform::scale(2.0));
    // scale then translate
    assert!(close(
        t.transformed(Xyz::new(1.0, 1.0, 1.0)),
        Xyz::new(3.0, 2.0, 2.0)
    ));

    let mut u = Transform::translation(Xyz::new(1.0, 0.0, 0.0));
    u.concatenate_on_left(&Transform::scale(2.0));
    // translate then scale
    assert!(close(
        u.transformed(Xyz::new(1.0, 1.0, 1.0)),
        Xyz::new(4.0, 2.0, 2.0)
    ));
}

#[test]
fn quarter_turn_about_z() {
    let t = Transform::rotate_z(std::f64::consts::FRAC_PI_2);
    assert!(close(
        t.transformed(Xyz::new(1.0, 0.0, 0.0)),
        Xyz::new(0.0, 1.0, 0.0)
    ));
}

#[test]
fn rotations_preserve_length() {
    let p = Xyz::new(0.3, -0.7, 1.1);
    for t in [
        Transform::rotate_x(0.4),
        Transform::rotate_y(-1.3),
        Transform::rotate_z(2.2),
    ] {
        assert!((t.transformed(p).magnitude() - p.magnitude()).abs() < 1e-12);
    }
}
