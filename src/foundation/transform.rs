use crate::foundation::xyz::Xyz;

/// Affine map stored as a translation plus three basis vectors.
///
/// The parameter layout used by function nodes is twelve reals:
/// `translate, basis_x, basis_y, basis_z`, three components each.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translate: Xyz,
    pub basis_x: Xyz,
    pub basis_y: Xyz,
    pub basis_z: Xyz,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub const PARAMS: usize = 12;

    pub const fn identity() -> Self {
        Self {
            translate: Xyz::ZERO,
            basis_x: Xyz::new(1.0, 0.0, 0.0),
            basis_y: Xyz::new(0.0, 1.0, 0.0),
            basis_z: Xyz::new(0.0, 0.0, 1.0),
        }
    }

    pub fn new(translate: Xyz, basis_x: Xyz, basis_y: Xyz, basis_z: Xyz) -> Self {
        Self {
            translate,
            basis_x,
            basis_y,
            basis_z,
        }
    }

    /// Build from the first twelve entries of `p`.
    ///
    /// Callers guarantee `p.len() >= 12`; node parameter counts are validated on construction.
    pub fn from_params(p: &[f64]) -> Self {
        Self {
            translate: Xyz::new(p[0], p[1], p[2]),
            basis_x: Xyz::new(p[3], p[4], p[5]),
            basis_y: Xyz::new(p[6], p[7], p[8]),
            basis_z: Xyz::new(p[9], p[10], p[11]),
        }
    }

    pub fn to_params(&self) -> [f64; 12] {
        let t = self.translate;
        let (x, y, z) = (self.basis_x, self.basis_y, self.basis_z);
        [
            t.x, t.y, t.z, x.x, x.y, x.z, y.x, y.y, y.z, z.x, z.y, z.z,
        ]
    }

    pub fn translation(t: Xyz) -> Self {
        Self {
            translate: t,
            ..Self::identity()
        }
    }

    pub fn scale(k: f64) -> Self {
        Self::scale_xyz(Xyz::fill(k))
    }

    pub fn scale_xyz(k: Xyz) -> Self {
        Self::new(
            Xyz::ZERO,
            Xyz::new(k.x, 0.0, 0.0),
            Xyz::new(0.0, k.y, 0.0),
            Xyz::new(0.0, 0.0, k.z),
        )
    }

    pub fn rotate_x(a: f64) -> Self {
        let (s, c) = a.sin_cos();
        Self::new(
            Xyz::ZERO,
            Xyz::new(1.0, 0.0, 0.0),
            Xyz::new(0.0, c, s),
            Xyz::new(0.0, -s, c),
        )
    }

    pub fn rotate_y(a: f64) -> Self {
        let (s, c) = a.sin_cos();
        Self::new(
            Xyz::ZERO,
            Xyz::new(c, 0.0, -s),
            Xyz::new(0.0, 1.0, 0.0),
            Xyz::new(s, 0.0, c),
        )
    }

    pub fn rotate_z(a: f64) -> Self {
        let (s, c) = a.sin_cos();
        Self::new(
            Xyz::ZERO,
            Xyz::new(c, s, 0.0),
            Xyz::new(-s, c, 0.0),
            Xyz::new(0.0, 0.0, 1.0),
        )
    }

    pub fn transformed(&self, p: Xyz) -> Xyz {
        self.translate + self.transformed_no_translate(p)
    }

    pub fn transformed_no_translate(&self, p: Xyz) -> Xyz {
        self.basis_x * p.x + self.basis_y * p.y + self.basis_z * p.z
    }

    /// `self = self * t`: the result applies `t` first, then `self`.
    pub fn concatenate_on_right(&mut self, t: &Transform) -> &mut Self {
        *self = Self {
            translate: self.transformed(t.translate),
            basis_x: self.transformed_no_translate(t.basis_x),
            basis_y: self.transformed_no_translate(t.basis_y),
            basis_z: self.transformed_no_translate(t.basis_z),
        };
        self
    }

    /// `self = t * self`: the result applies `self` first, then `t`.
    pub fn concatenate_on_left(&mut self, t: &Transform) -> &mut Self {
        *self = Self {
            translate: t.transformed(self.translate),
            basis_x: t.transformed_no_translate(self.basis_x),
            basis_y: t.transformed_no_translate(self.basis_y),
            basis_z: t.transformed_no_translate(self.basis_z),
        };
        self
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/transform.rs"]
mod tests;
