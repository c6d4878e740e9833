use std::f64::consts::{FRAC_PI_2, FRAC_PI_3, PI, TAU};

use crate::foundation::math::{EPSILON, floor_i64, modulusf, modulusi, trianglef};
use crate::foundation::transform::Transform;
use crate::foundation::xyz::Xyz;
use crate::function::node::Node;
use crate::function::noise;
use crate::function::registry::Kind;

/// Step for second differences, where `EPSILON` squared would vanish.
const BIG_EPSILON: f64 = 1e-3;

const AXES: [Xyz; 3] = [
    Xyz::new(1.0, 0.0, 0.0),
    Xyz::new(0.0, 1.0, 0.0),
    Xyz::new(0.0, 0.0, 1.0),
];

impl Node {
    /// Colour at sample point `p`.
    ///
    /// Total over all inputs: degenerate denominators yield zero instead of dividing, and
    /// nothing here keeps state between calls.
    pub fn evaluate(&self, p: Xyz) -> Xyz {
        let a = |i: usize, q: Xyz| self.arg(i).evaluate(q);
        let pv = |i: usize| Xyz::new(self.param(i), self.param(i + 1), self.param(i + 2));

        match self.kind {
            Kind::ComposePair => a(1, a(0, p)),
            Kind::ComposeTriple => a(2, a(1, a(0, p))),
            Kind::Constant => pv(0),
            Kind::Identity => p,
            Kind::PostTransform => Transform::from_params(&self.params).transformed(a(0, p)),
            Kind::PreTransform => a(0, Transform::from_params(&self.params).transformed(p)),
            Kind::Top => {
                let v = a(0, self.pretransform().transformed(p));
                self.posttransform().transformed(v)
            }
            Kind::Transform => Transform::from_params(&self.params).transformed(p),
            Kind::TransformGeneralised => {
                Transform::new(a(0, p), a(1, p), a(2, p), a(3, p)).transformed(p)
            }
            Kind::PreTransformGeneralised => {
                let t = Transform::new(a(1, p), a(2, p), a(3, p), a(4, p));
                a(0, t.transformed(p))
            }
            Kind::PostTransformGeneralised => {
                let t = Transform::new(a(1, p), a(2, p), a(3, p), a(4, p));
                t.transformed(a(0, p))
            }
            Kind::TransformQuadratic => {
                let (x, y, z) = (p.x, p.y, p.z);
                pv(0) + pv(3) * x + pv(6) * y + pv(9) * z
                    + pv(12) * (x * y)
                    + pv(15) * (x * z)
                    + pv(18) * (y * z)
                    + pv(21) * (x * x)
                    + pv(24) * (y * y)
                    + pv(27) * (z * z)
            }

            Kind::Add => a(0, p) + a(1, p),
            Kind::Multiply => a(0, p).scaled(a(1, p)),
            Kind::Divide => {
                let (n, d) = (a(0, p), a(1, p));
                Xyz::new(safe_div(n.x, d.x), safe_div(n.y, d.y), safe_div(n.z, d.z))
            }
            Kind::Max => {
                let (u, v) = (a(0, p), a(1, p));
                Xyz::new(u.x.max(v.x), u.y.max(v.y), u.z.max(v.z))
            }
            Kind::Min => {
                let (u, v) = (a(0, p), a(1, p));
                Xyz::new(u.x.min(v.x), u.y.min(v.y), u.z.min(v.z))
            }
            Kind::Modulus => {
                let (u, v) = (a(0, p), a(1, p));
                Xyz::new(modulusf(u.x, v.x), modulusf(u.y, v.y), modulusf(u.z, v.z))
            }
            Kind::Cross => a(0, p).cross(a(1, p)),
            Kind::Exp => p.map(f64::exp),
            Kind::Sin => p.map(f64::sin),
            Kind::Cos => p.map(f64::cos),

            Kind::ChooseStrip => {
                if p.y.abs() > a(2, p).dot(pv(0)).abs() {
                    a(1, p)
                } else {
                    a(0, p)
                }
            }
            Kind::ChooseStripBlend => {
                let r0 = a(2, p).dot(pv(0)).abs();
                let r1 = a(3, p).dot(pv(3)).abs();
                let (inner, outer) = (r0.min(r1), r0.max(r1));
                let ay = p.y.abs();
                if ay <= inner {
                    a(0, p)
                } else if ay >= outer {
                    a(1, p)
                } else {
                    let (v0, v1) = (a(0, p), a(1, p));
                    v0 + (v1 - v0) * ((ay - inner) / (outer - inner))
                }
            }
            Kind::ChooseSphere => {
                if a(0, p).magnitude2() < a(1, p).magnitude2() {
                    a(2, p)
                } else {
                    a(3, p)
                }
            }
            Kind::ChooseRect => {
                if a(1, p).origin_centred_rect_contains(a(0, p)) {
                    a(2, p)
                } else {
                    a(3, p)
                }
            }
            Kind::ChooseFrom2InCubeMesh => {
                let s = floor_i64(p.x)
                    .wrapping_add(floor_i64(p.y))
                    .wrapping_add(floor_i64(p.z));
                a(usize::from(s & 1 == 0), p)
            }
            Kind::ChooseFrom3InCubeMesh => {
                let s = floor_i64(p.x)
                    .wrapping_add(floor_i64(p.y))
                    .wrapping_add(floor_i64(p.z));
                a(modulusi(s, 3), p)
            }
            Kind::ChooseFrom2InSquareGrid => {
                let s = floor_i64(p.x).wrapping_add(floor_i64(p.y));
                a(usize::from(s & 1 == 0), p)
            }
            Kind::ChooseFrom3InSquareGrid => {
                let s = floor_i64(p.x).wrapping_add(floor_i64(p.y));
                a(modulusi(s, 3), p)
            }
            Kind::ChooseFrom2InTriangleGrid => a(usize::from(triangle_cell(p) & 1 == 0), p),
            Kind::ChooseFrom3InTriangleGrid => a(modulusi(triangle_cell(p), 3), p),
            Kind::ChooseFrom3InDiamondGrid => {
                let [d0, d1, d2] = triangle_directions();
                let m = |d: Xyz| {
                    let q = p.dot(d);
                    (q - (q + 0.5).floor()).abs()
                };
                let (m0, m1, m2) = (m(d0), m(d1), m(d2));
                if m0 <= m1 && m0 <= m2 {
                    a(0, p)
                } else if m1 <= m0 && m1 <= m2 {
                    a(1, p)
                } else {
                    a(2, p)
                }
            }
            Kind::ChooseFrom3InHexagonGrid => {
                let (hx, hy) = nearest_hex(p.x, p.y);
                let which = hy.wrapping_add(if hx & 1 != 0 { 2 } else { 0 });
                a(modulusi(which, 3), p)
            }
            Kind::ChooseFrom2InBorderedHexagonGrid => {
                let home = nearest_hex(p.x, p.y);
                let b = modulusf(self.param(0), 0.5);
                let in_border = (0..6u32).any(|i| {
                    let (s, c) = (f64::from(i) * FRAC_PI_3).sin_cos();
                    nearest_hex(p.x + b * s, p.y + b * c) != home
                });
                a(usize::from(in_border), p)
            }

            Kind::Filter2D => {
                let (dx, dy) = (self.param(0), self.param(1));
                let ring = a(0, p + Xyz::new(dx, 0.0, 0.0))
                    + a(0, p + Xyz::new(-dx, 0.0, 0.0))
                    + a(0, p + Xyz::new(0.0, dy, 0.0))
                    + a(0, p + Xyz::new(0.0, -dy, 0.0));
                a(0, p) - ring / 4.0
            }
            Kind::Filter3D => {
                let (dx, dy, dz) = (self.param(0), self.param(1), self.param(2));
                let ring = a(0, p + Xyz::new(dx, 0.0, 0.0))
                    + a(0, p + Xyz::new(-dx, 0.0, 0.0))
                    + a(0, p + Xyz::new(0.0, dy, 0.0))
                    + a(0, p + Xyz::new(0.0, -dy, 0.0))
                    + a(0, p + Xyz::new(0.0, 0.0, dz))
                    + a(0, p + Xyz::new(0.0, 0.0, -dz));
                a(0, p) - ring / 6.0
            }
            Kind::AverageSamples => {
                let n = self.iteration_count();
                let (start, delta) = sample_line(p - pv(0), p + pv(0), n);
                let mut total = Xyz::ZERO;
                let mut q = start;
                for _ in 0..n {
                    total += a(0, q);
                    q += delta;
                }
                total / f64::from(n)
            }
            Kind::Streak => {
                let n = self.iteration_count();
                let (start, delta) = sample_line(p, p + pv(0), n);
                let mut total = Xyz::ZERO;
                let mut weight = 0.0;
                let mut q = start;
                for i in 0..n {
                    let k = 1.0 - f64::from(i) / f64::from(n);
                    total += a(0, q) * k;
                    weight += k;
                    q += delta;
                }
                total / weight
            }
            Kind::AverageRing | Kind::FilterRing => {
                let n = self.iteration_count();
                if n == 1 {
                    return if self.kind == Kind::AverageRing {
                        a(0, p)
                    } else {
                        Xyz::ZERO
                    };
                }
                let r = self.param(0);
                let da = TAU / f64::from(n);
                let mut total = Xyz::ZERO;
                for i in 0..n {
                    let (s, c) = (f64::from(i) * da).sin_cos();
                    total += a(0, p + Xyz::new(r * c, r * s, 0.0));
                }
                let mean = total / f64::from(n);
                if self.kind == Kind::AverageRing {
                    mean
                } else {
                    mean - a(0, p)
                }
            }
            Kind::ConvolveSamples => {
                let n = self.iteration_count();
                let (_, delta) = sample_line(p - pv(0), p + pv(0), n);
                let mut total = Xyz::ZERO;
                let mut offset = Xyz::ZERO;
                for _ in 0..n {
                    total += a(0, p + offset).cross(a(1, offset));
                    offset += delta;
                }
                total / f64::from(n)
            }
            Kind::AccumulateOctaves => {
                let mut total = Xyz::ZERO;
                let mut weight = 0.0;
                for i in 0..self.iteration_count() {
                    let scale = 2f64.powi(i.min(i32::MAX as u32) as i32);
                    total += a(0, p * scale) / scale;
                    weight += 1.0 / scale;
                }
                total / weight
            }
            Kind::Iterate => {
                let mut q = p;
                for _ in 0..self.iteration_count() {
                    q = a(0, q);
                }
                q
            }

            Kind::FriezeGroupHopFreeZ => a(0, Xyz::new(modulusf(p.x, 1.0), p.y, p.z)),
            Kind::FriezeGroupHopClampZ => {
                a(0, Xyz::new(modulusf(p.x, 1.0), p.y, self.param(0)))
            }
            Kind::FriezeGroupHopWarpFreeZ | Kind::FriezeGroupHopWarpClampZ => {
                let dx = pv(0).dot(a(1, Xyz::new(0.0, p.y, 0.0)));
                let x = modulusf(p.x - dx, 1.0) + dx;
                let z = if self.kind == Kind::FriezeGroupHopWarpClampZ {
                    self.param(3)
                } else {
                    p.z
                };
                a(0, Xyz::new(x, p.y, z))
            }
            Kind::FriezeGroupJumpFreeZ => a(0, Xyz::new(modulusf(p.x, 1.0), p.y.abs(), p.z)),
            Kind::FriezeGroupJumpClampZ => {
                a(0, Xyz::new(modulusf(p.x, 1.0), p.y.abs(), self.param(0)))
            }
            Kind::FriezeGroupSidle => a(0, Xyz::new(trianglef(p.x, 1.0), p.y, self.param(0))),
            Kind::FriezeGroupSpinhop => {
                let m = modulusf(p.x, 1.0);
                let x = if p.y > 0.0 { m } else { 1.0 - m };
                a(0, Xyz::new(x, p.y.abs(), self.param(0).max(0.0) * p.z))
            }
            Kind::FriezeGroupSpinjump => {
                a(0, Xyz::new(trianglef(p.x, 1.0), p.y.abs(), self.param(0)))
            }
            Kind::FriezeGroupSpinsidle => {
                let y = if modulusf(p.x + 0.5, 2.0) < 1.0 { p.y } else { -p.y };
                a(0, Xyz::new(trianglef(p.x, 0.5), y, self.param(0)))
            }
            Kind::FriezeGroupStep => {
                let x = if p.y > 0.0 {
                    modulusf(p.x, 1.0)
                } else {
                    modulusf(p.x + 0.5, 1.0)
                };
                a(0, Xyz::new(x, p.y.abs(), self.param(0)))
            }

            Kind::GeometricInversion => {
                let r2 = p.magnitude2();
                if r2 == 0.0 { a(0, p) } else { a(0, p / r2) }
            }
            Kind::Reflect => {
                let point = a(0, p);
                let normal = a(1, p).normalised();
                let pos = a(2, p);
                let d = (pos - point).dot(normal);
                if d < 0.0 { pos - normal * (2.0 * d) } else { pos }
            }

            Kind::Derivative => {
                let d = pv(0).normalised();
                central_difference(self.arg(0), p, d, EPSILON)
            }
            Kind::DerivativeGeneralised => {
                let d = a(1, p).normalised();
                central_difference(self.arg(0), p, d, EPSILON)
            }
            Kind::Gradient => {
                let e = Xyz::fill(EPSILON);
                (a(0, p + e) - a(0, p - e)) / (2.0 * EPSILON)
            }
            Kind::GradientGeneralised => {
                let s = |q: Xyz| a(0, q).dot(a(1, q));
                let g = |d: Xyz| (s(p + d * EPSILON) - s(p - d * EPSILON)) / (2.0 * EPSILON);
                Xyz::new(g(AXES[0]), g(AXES[1]), g(AXES[2]))
            }
            Kind::Divergence => {
                let f = self.arg(0);
                let dx = central_difference(f, p, AXES[0], EPSILON);
                let dy = central_difference(f, p, AXES[1], EPSILON);
                let dz = central_difference(f, p, AXES[2], EPSILON);
                Xyz::fill(dx.x + dy.y + dz.z)
            }
            Kind::Curl => {
                let f = self.arg(0);
                let dx = central_difference(f, p, AXES[0], EPSILON);
                let dy = central_difference(f, p, AXES[1], EPSILON);
                let dz = central_difference(f, p, AXES[2], EPSILON);
                Xyz::new(dy.z - dz.y, dz.x - dx.z, dx.y - dy.x)
            }
            Kind::ScalarLaplacian => {
                let centre = a(0, p) * 2.0;
                let h2 = BIG_EPSILON * BIG_EPSILON;
                AXES.iter()
                    .map(|&d| {
                        (a(0, p + d * BIG_EPSILON) - centre + a(0, p - d * BIG_EPSILON)) / h2
                    })
                    .fold(Xyz::ZERO, |acc, v| acc + v)
            }

            Kind::MandelbrotChoose => {
                let n = self.iteration_count();
                a(usize::from(brot(0.0, 0.0, p.x, p.y, n) != n), p)
            }
            Kind::MandelbrotContour => {
                let n = self.iteration_count();
                contour(brot(0.0, 0.0, p.x, p.y, n), n)
            }
            Kind::JuliaChoose => {
                let n = self.iteration_count();
                a(usize::from(brot(p.x, p.y, self.param(0), self.param(1), n) != n), p)
            }
            Kind::JuliaContour => {
                let n = self.iteration_count();
                contour(brot(p.x, p.y, self.param(0), self.param(1), n), n)
            }
            Kind::JuliabrotChoose => {
                let n = self.iteration_count();
                let [zr, zi, cr, ci] = self.juliabrot_start(p);
                a(usize::from(brot(zr, zi, cr, ci, n) != n), p)
            }
            Kind::JuliabrotContour => {
                let n = self.iteration_count();
                let [zr, zi, cr, ci] = self.juliabrot_start(p);
                contour(brot(zr, zi, cr, ci, n), n)
            }

            Kind::Kaleidoscope
            | Kind::KaleidoscopeZRotate
            | Kind::KaleidoscopeTwist
            | Kind::Windmill
            | Kind::WindmillZRotate
            | Kind::WindmillTwist => {
                let n = segments(self.param(0));
                let r = p.x.hypot(p.y);
                let mut angle = p.y.atan2(p.x);
                match self.kind {
                    Kind::KaleidoscopeZRotate | Kind::WindmillZRotate => {
                        angle += self.param(1) * p.z * PI;
                    }
                    Kind::KaleidoscopeTwist | Kind::WindmillTwist => angle += self.param(1) * r,
                    _ => {}
                }
                let folded = match self.kind {
                    Kind::Kaleidoscope | Kind::KaleidoscopeZRotate | Kind::KaleidoscopeTwist => {
                        trianglef(angle, PI / n)
                    }
                    _ => modulusf(angle, TAU / n),
                };
                let (s, c) = folded.sin_cos();
                a(0, Xyz::new(r * c, r * s, p.z))
            }

            Kind::Magnitudes => Xyz::new(
                a(0, p).magnitude(),
                a(1, p).magnitude(),
                a(2, p).magnitude(),
            ),
            Kind::Magnitude => pv(0) * a(0, p).magnitude(),
            Kind::IsotropicScale => p * a(0, p).magnitude(),
            Kind::Cone => Xyz::new(p.x * p.z, p.y * p.z, p.z),
            Kind::ExpCone => {
                let k = p.z.exp();
                Xyz::new(p.x * k, p.y * k, p.z)
            }
            Kind::SeparateZ => {
                let v = a(0, Xyz::new(p.x, p.y, 0.0));
                a(1, v + pv(0) * p.z)
            }

            Kind::NoiseOneChannel => Xyz::fill(noise::one_channel().sample(p)),
            Kind::MultiscaleNoiseOneChannel => {
                Xyz::fill(noise::multiscale_one_channel().multiscale(p))
            }
            Kind::NoiseThreeChannel => {
                let [r, g, b] = noise::three_channel();
                Xyz::new(r.sample(p), g.sample(p), b.sample(p))
            }
            Kind::MultiscaleNoiseThreeChannel => {
                let [r, g, b] = noise::multiscale_three_channel();
                Xyz::new(r.multiscale(p), g.multiscale(p), b.multiscale(p))
            }

            Kind::OrthoSphereShaded
            | Kind::OrthoSphereShadedBumpMapped
            | Kind::OrthoSphereReflect
            | Kind::OrthoSphereReflectBumpMapped => {
                let pr2 = p.x * p.x + p.y * p.y;
                if pr2 >= 1.0 || pr2.is_nan() {
                    return a(0, p);
                }
                let n = Xyz::new(p.x, p.y, -(1.0 - pr2).sqrt());
                let surface = match self.kind {
                    Kind::OrthoSphereShadedBumpMapped | Kind::OrthoSphereReflectBumpMapped => {
                        bumped_normal(self.arg(2), n)
                    }
                    _ => n,
                };
                match self.kind {
                    Kind::OrthoSphereShaded | Kind::OrthoSphereShadedBumpMapped => {
                        let light = pv(0).normalised();
                        let i = 0.5 * (1.0 + light.dot(surface));
                        a(1, n) * i
                    }
                    _ => {
                        let v = Xyz::new(0.0, 0.0, -1.0);
                        a(1, surface * (2.0 * surface.dot(v)) - v)
                    }
                }
            }

            Kind::Shadow => a(0, p) + a(0, p + pv(0)) * self.param(3),
            Kind::ShadowGeneralised => a(0, p) + a(0, p + a(1, p)) * self.param(0),

            Kind::CartesianToSpherical => cartesian_to_spherical(p),
            Kind::SphericalToCartesian => spherical_to_cartesian(p),
            Kind::EvaluateInSpherical => spherical_to_cartesian(a(0, cartesian_to_spherical(p))),
            Kind::SpiralLinear | Kind::SpiralLogarithmic => {
                let r = p.magnitude();
                let mut theta = p.y.atan2(p.x);
                if theta < 0.0 {
                    theta += TAU;
                }
                let radial = if self.kind == Kind::SpiralLinear {
                    r
                } else if r > 0.0 {
                    r.ln()
                } else {
                    0.0
                };
                let winding = (radial - theta / TAU).floor();
                let x = 2.0 * winding + theta / PI;
                a(0, Xyz::new(x, 2.0 * radial - x, p.z))
            }

            Kind::Rotate => {
                let angles = a(0, p) * PI;
                let mut t = Transform::rotate_x(angles.x);
                t.concatenate_on_right(&Transform::rotate_y(angles.y))
                    .concatenate_on_right(&Transform::rotate_z(angles.z));
                t.transformed(p)
            }
            Kind::Pixelize => Xyz::new(
                quantize(p.x, self.param(0)),
                quantize(p.y, self.param(1)),
                p.z,
            ),
            Kind::Voxelize => Xyz::new(
                quantize(p.x, self.param(0)),
                quantize(p.y, self.param(1)),
                quantize(p.z, self.param(2)),
            ),
        }
    }

    /// Whether [`Node::evaluate`] returns the same value at every point.
    ///
    /// Used to reject flat pictures and to fold subtrees. The rule must never claim constness
    /// for a node whose output depends on the sample position.
    pub fn is_constant(&self) -> bool {
        let arg0 = || self.arg(0).is_constant();
        match self.kind {
            Kind::Constant => true,
            Kind::ComposePair | Kind::ComposeTriple => self.children.iter().any(Node::is_constant),
            Kind::FriezeGroupHopWarpFreeZ
            | Kind::FriezeGroupHopWarpClampZ
            | Kind::PreTransformGeneralised
            | Kind::EvaluateInSpherical => arg0(),
            Kind::Rotate
            | Kind::TransformGeneralised
            | Kind::IsotropicScale
            | Kind::ChooseStrip
            | Kind::ChooseStripBlend
            | Kind::ChooseFrom2InCubeMesh
            | Kind::ChooseFrom3InCubeMesh
            | Kind::ChooseFrom2InSquareGrid
            | Kind::ChooseFrom3InSquareGrid
            | Kind::ChooseFrom2InTriangleGrid
            | Kind::ChooseFrom3InTriangleGrid
            | Kind::ChooseFrom3InDiamondGrid
            | Kind::ChooseFrom3InHexagonGrid
            | Kind::ChooseFrom2InBorderedHexagonGrid
            | Kind::MandelbrotChoose
            | Kind::JuliaChoose
            | Kind::JuliabrotChoose
            | Kind::OrthoSphereShaded
            | Kind::OrthoSphereShadedBumpMapped
            | Kind::OrthoSphereReflect
            | Kind::OrthoSphereReflectBumpMapped => false,
            _ => !self.children.is_empty() && self.children.iter().all(Node::is_constant),
        }
    }

    fn iteration_count(&self) -> u32 {
        self.iterations.unwrap_or(1).max(1)
    }

    /// Four-dimensional start point from the 4x(3+1) parameter basis.
    fn juliabrot_start(&self, p: Xyz) -> [f64; 4] {
        let row = |i: usize| {
            p.x * self.param(i) + p.y * self.param(i + 1) + p.z * self.param(i + 2)
                + self.param(i + 3)
        };
        [row(0), row(4), row(8), row(12)]
    }
}

fn safe_div(n: f64, d: f64) -> f64 {
    if d == 0.0 { 0.0 } else { n / d }
}

fn quantize(v: f64, step: f64) -> f64 {
    if step == 0.0 {
        v
    } else {
        step * (v / step).round()
    }
}

/// Start and step for `n` evenly spaced samples from `p0` to `p1`; one sample sits at `p0`.
fn sample_line(p0: Xyz, p1: Xyz, n: u32) -> (Xyz, Xyz) {
    if n <= 1 {
        (p0, Xyz::ZERO)
    } else {
        (p0, (p1 - p0) / f64::from(n - 1))
    }
}

fn central_difference(f: &Node, p: Xyz, d: Xyz, eps: f64) -> Xyz {
    (f.evaluate(p + d * eps) - f.evaluate(p - d * eps)) / (2.0 * eps)
}

/// Escape count of `z -> z^2 + c`; equal to `iterations` for points that never escape.
fn brot(z0r: f64, z0i: f64, cr: f64, ci: f64, iterations: u32) -> u32 {
    let (mut zr, mut zi) = (z0r, z0i);
    let mut i = 0;
    while i < iterations {
        let (zr2, zi2) = (zr * zr, zi * zi);
        if zr2 + zi2 > 4.0 {
            break;
        }
        zi = 2.0 * zr * zi + ci;
        zr = zr2 - zi2 + cr;
        i += 1;
    }
    i
}

/// -1 inside the set, escape fraction in `[0, 1)` outside.
fn contour(i: u32, n: u32) -> Xyz {
    if i == n {
        Xyz::fill(-1.0)
    } else {
        Xyz::fill(f64::from(i) / f64::from(n))
    }
}

fn triangle_directions() -> [Xyz; 3] {
    let (s1, c1) = FRAC_PI_3.sin_cos();
    let (s2, c2) = (2.0 * FRAC_PI_3).sin_cos();
    [Xyz::new(1.0, 0.0, 0.0), Xyz::new(c1, s1, 0.0), Xyz::new(c2, s2, 0.0)]
}

fn triangle_cell(p: Xyz) -> i64 {
    triangle_directions()
        .iter()
        .fold(0i64, |acc, d| acc.wrapping_add(floor_i64(p.dot(*d))))
}

const HEX_K: f64 = 0.866_025_403_784_438_6;

fn hex_centre(x: i64, y: i64) -> Xyz {
    let offset = if x & 1 != 0 { 0.5 } else { 0.0 };
    Xyz::new(x as f64 * HEX_K, y as f64 + offset, 0.0)
}

/// Grid coordinates of the hexagon containing `(px, py)`.
fn nearest_hex(px: f64, py: f64) -> (i64, i64) {
    let nx = (px / HEX_K).round_ties_even() as i64;
    let ny = if nx & 1 != 0 {
        (py - 0.5).round_ties_even() as i64
    } else {
        py.round_ties_even() as i64
    };
    let target = Xyz::new(px, py, 0.0);
    let mut best = (nx, ny);
    let mut best_m2 = (target - hex_centre(nx, ny)).magnitude2();
    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let (hx, hy) = (nx.wrapping_add(dx), ny.wrapping_add(dy));
            let m2 = (target - hex_centre(hx, hy)).magnitude2();
            if m2 < best_m2 {
                best = (hx, hy);
                best_m2 = m2;
            }
        }
    }
    best
}

/// Surface normal perturbed by the slope of `|bump(n)|^2` across the sphere.
fn bumped_normal(bump: &Node, n: Xyz) -> Xyz {
    let east = Xyz::new(0.0, 1.0, 0.0).cross(n).normalised();
    let north = n.cross(east);
    let h = |q: Xyz| bump.evaluate(q).magnitude2();
    let inv = 1.0 / (2.0 * EPSILON);
    let de = (h(n + east * EPSILON) - h(n - east * EPSILON)) * inv;
    let dn = (h(n + north * EPSILON) - h(n - north * EPSILON)) * inv;
    (n - east * de - north * dn).normalised()
}

/// Mirror or rotation segment count, at least 2.
fn segments(p: f64) -> f64 {
    if !p.is_finite() {
        return 2.0;
    }
    (2.0 + (8.0 * p.abs()).floor()).min(64.0)
}

fn cartesian_to_spherical(p: Xyz) -> Xyz {
    let r = p.magnitude();
    let theta = p.y.atan2(p.x) / PI;
    let phi = if r == 0.0 { 0.0 } else { (p.z / r).asin() / FRAC_PI_2 };
    Xyz::new(r, theta, phi)
}

fn spherical_to_cartesian(p: Xyz) -> Xyz {
    let r = p.x;
    let theta = PI * p.y;
    let phi = FRAC_PI_2 * p.z;
    Xyz::new(
        r * theta.cos() * phi.sin(),
        r * theta.sin() * phi.sin(),
        r * phi.cos(),
    )
}

#[cfg(test)]
#[path = "../../tests/unit/function/eval.rs"]
mod tests;
