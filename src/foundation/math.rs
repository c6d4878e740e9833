/// Sampling step used by gradient-like operators.
pub const EPSILON: f64 = 1e-6;

/// Modulus always in `[0, |y|)`. A zero modulus yields zero rather than NaN.
pub fn modulusf(x: f64, y: f64) -> f64 {
    let y = y.abs();
    if y == 0.0 || !x.is_finite() {
        return 0.0;
    }
    let mut r = x % y;
    if r < 0.0 {
        r += y;
    }
    // -tiny % y + y can round up to y itself
    if r >= y { 0.0 } else { r }
}

/// Integer modulus always in `[0, |y|)`; `y == 0` yields 0.
pub fn modulusi(x: i64, y: i64) -> usize {
    let y = y.abs();
    if y == 0 {
        return 0;
    }
    x.rem_euclid(y) as usize
}

/// Like `modulusf` but ramps back down instead of wrapping, giving values in `[0, |y|]`.
pub fn trianglef(x: f64, y: f64) -> f64 {
    let y = y.abs();
    if y == 0.0 || !x.is_finite() {
        return 0.0;
    }
    let r = x.abs() % (2.0 * y);
    if r > y { 2.0 * y - r } else { r }
}

/// Floor to an integer, saturating for values outside `i64`.
pub(crate) fn floor_i64(x: f64) -> i64 {
    if x.is_nan() { 0 } else { x.floor() as i64 }
}
