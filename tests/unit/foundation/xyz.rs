use super::*;

#[test]
fn cross_follows_right_hand_rule() {
    let x = Xyz::new(1.0, 0.0, 0.0);
    let y = Xyz::new(0.0, 1.0, 0.0);
    assert_eq!(x.cross(y), Xyz::new(0.0, 0.0, 1.0));
    assert_eq!(y.cross(x), Xyz::new(0.0, 0.0, -1.0));
}

#[test]
fn normalised_handles_zero() {
    assert_eq!(Xyz::ZERO.normalised(), Xyz::ZERO);
    let n = Xyz::new(3.0, 0.0, 4.0).normalised();
    assert!((n.magnitude() - 1.0).abs() < 1e-12);
    assert!((n.x - 0.6).abs() < 1e-12);
}

#[test]
fn rect_containment_uses_absolute_extents() {
    let half = Xyz::new(-1.0, 2.0, -3.0);
    assert!(half.origin_centred_rect_contains(Xyz::new(0.5, -1.5, 2.9)));
    assert!(!half.origin_centred_rect_contains(Xyz::new(1.0, 0.0, 0.0)));
}

#[test]
fn scalar_ops_commute() {
    let v = Xyz::new(1.0, -2.0, 0.5);
    assert_eq!(v * 2.0, 2.0 * v);
    assert_eq!((v * 2.0) / 2.0, v);
    assert_eq!(v + (-v), Xyz::ZERO);
}
