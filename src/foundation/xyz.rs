use std::ops::{Add, AddAssign, Div, DivAssign, Mul, Neg, Sub, SubAssign};

/// A point, direction or colour in three dimensions.
///
/// Function trees map sample positions to colours and both are carried as `Xyz`.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Xyz {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// All three components set to `v`.
    pub const fn fill(v: f64) -> Self {
        Self::new(v, v, v)
    }

    pub fn dot(self, o: Self) -> f64 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    pub fn cross(self, o: Self) -> Self {
        Self::new(
            self.y * o.z - self.z * o.y,
            self.z * o.x - self.x * o.z,
            self.x * o.y - self.y * o.x,
        )
    }

    pub fn magnitude2(self) -> f64 {
        self.dot(self)
    }

    pub fn magnitude(self) -> f64 {
        self.magnitude2().sqrt()
    }

    /// Unit vector in the same direction; the zero vector stays zero.
    pub fn normalised(self) -> Self {
        let m = self.magnitude();
        if m == 0.0 { Self::ZERO } else { self / m }
    }

    /// Component-wise product.
    pub fn scaled(self, o: Self) -> Self {
        Self::new(self.x * o.x, self.y * o.y, self.z * o.z)
    }

    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self::new(f(self.x), f(self.y), f(self.z))
    }

    /// Whether `p` lies strictly inside the axis-aligned box centred on the origin whose
    /// half-extents are the absolute components of `self`.
    pub fn origin_centred_rect_contains(self, p: Self) -> bool {
        p.x.abs() < self.x.abs() && p.y.abs() < self.y.abs() && p.z.abs() < self.z.abs()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f64; 3]> for Xyz {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl Add for Xyz {
    type Output = Self;

    fn add(self, o: Self) -> Self {
        Self::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }
}

impl AddAssign for Xyz {
    fn add_assign(&mut self, o: Self) {
        *self = *self + o;
    }
}

impl Sub for Xyz {
    type Output = Self;

    fn sub(self, o: Self) -> Self {
        Self::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }
}

impl SubAssign for Xyz {
    fn sub_assign(&mut self, o: Self) {
        *self = *self - o;
    }
}

impl Mul<f64> for Xyz {
    type Output = Self;

    fn mul(self, k: f64) -> Self {
        Self::new(self.x * k, self.y * k, self.z * k)
    }
}

impl Mul<Xyz> for f64 {
    type Output = Xyz;

    fn mul(self, v: Xyz) -> Xyz {
        v * self
    }
}

impl Div<f64> for Xyz {
    type Output = Self;

    fn div(self, k: f64) -> Self {
        Self::new(self.x / k, self.y / k, self.z / k)
    }
}

impl DivAssign<f64> for Xyz {
    fn div_assign(&mut self, k: f64) {
        *self = *self / k;
    }
}

impl Neg for Xyz {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/xyz.rs"]
mod tests;
