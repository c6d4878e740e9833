use std::sync::OnceLock;

use crate::foundation::math::floor_i64;
use crate::foundation::random::Random01;
use crate::foundation::xyz::Xyz;

const N: usize = 256;
const MASK: i64 = (N as i64) - 1;

/// Gradient lattice noise.
///
/// Tables come from a fixed seed so saved functions look the same after reloading.
pub struct Noise {
    p: [usize; N + N + 2],
    g: [Xyz; N + N + 2],
}

impl Noise {
    pub fn new(seed: u64) -> Self {
        let mut r = Random01::new(seed);
        let mut p = [0usize; N + N + 2];
        let mut g = [Xyz::ZERO; N + N + 2];

        for gi in g.iter_mut().take(N) {
            *gi = r.sphere_normal();
        }
        for (i, pi) in p.iter_mut().enumerate().take(N + 1) {
            *pi = i;
        }
        let mut i = N;
        while i > 0 {
            let j = ((r.r01() * N as f64) as usize).min(N - 1);
            p.swap(i, j);
            i -= 2;
        }
        for i in 0..N + 2 {
            p[N + i] = p[i];
            g[N + i] = g[i];
        }
        Self { p, g }
    }

    /// Noise value at `p`, roughly in `[-1, 1]`.
    pub fn sample(&self, p: Xyz) -> f64 {
        if !p.is_finite() {
            return 0.0;
        }
        let tx = 2.0 * p.x + 10000.0;
        let ty = 2.0 * p.y + 10000.0;
        let tz = 2.0 * p.z + 10000.0;
        let (itx, ity, itz) = (floor_i64(tx), floor_i64(ty), floor_i64(tz));
        let rx0 = tx - itx as f64;
        let ry0 = ty - ity as f64;
        let rz0 = tz - itz as f64;
        let (rx1, ry1, rz1) = (rx0 - 1.0, ry0 - 1.0, rz0 - 1.0);

        let bx0 = (itx & MASK) as usize;
        let bx1 = (bx0 + 1) & (N - 1);
        let by0 = (ity & MASK) as usize;
        let by1 = (by0 + 1) & (N - 1);
        let bz0 = (itz & MASK) as usize;
        let bz1 = (bz0 + 1) & (N - 1);

        let i = self.p[bx0];
        let j = self.p[bx1];
        let b00 = self.p[i + by0];
        let b01 = self.p[i + by1];
        let b10 = self.p[j + by0];
        let b11 = self.p[j + by1];

        let v = |b: usize, x: f64, y: f64, z: f64| self.g[b].dot(Xyz::new(x, y, z));

        let sx = s_curve(rx0);
        let a0 = lerp(sx, v(b00 + bz0, rx0, ry0, rz0), v(b10 + bz0, rx1, ry0, rz0));
        let b0 = lerp(sx, v(b01 + bz0, rx0, ry1, rz0), v(b11 + bz0, rx1, ry1, rz0));
        let a1 = lerp(sx, v(b00 + bz1, rx0, ry0, rz1), v(b10 + bz1, rx1, ry0, rz1));
        let b1 = lerp(sx, v(b01 + bz1, rx0, ry1, rz1), v(b11 + bz1, rx1, ry1, rz1));

        let sy = s_curve(ry0);
        let c = lerp(sy, a0, b0);
        let d = lerp(sy, a1, b1);

        1.5 * lerp(s_curve(rz0), c, d)
    }

    /// Octave sum `sum 2^-i noise(2^i p)`, normalised by the weight total.
    pub fn multiscale(&self, p: Xyz) -> f64 {
        const OCTAVES: i32 = 8;
        let mut total = 0.0;
        let mut weight = 0.0;
        for i in 0..OCTAVES {
            let scale = 2f64.powi(i);
            total += self.sample(p * scale) / scale;
            weight += 1.0 / scale;
        }
        total / weight
    }
}

fn s_curve(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

fn table(cell: &'static OnceLock<Noise>, seed: u64) -> &'static Noise {
    cell.get_or_init(|| Noise::new(seed))
}

pub(crate) fn one_channel() -> &'static Noise {
    static T: OnceLock<Noise> = OnceLock::new();
    table(&T, 100)
}

pub(crate) fn multiscale_one_channel() -> &'static Noise {
    static T: OnceLock<Noise> = OnceLock::new();
    table(&T, 101)
}

pub(crate) fn three_channel() -> [&'static Noise; 3] {
    static T: [OnceLock<Noise>; 3] = [OnceLock::new(), OnceLock::new(), OnceLock::new()];
    [table(&T[0], 200), table(&T[1], 300), table(&T[2], 400)]
}

pub(crate) fn multiscale_three_channel() -> [&'static Noise; 3] {
    static T: [OnceLock<Noise>; 3] = [OnceLock::new(), OnceLock::new(), OnceLock::new()];
    [table(&T[0], 201), table(&T[1], 202), table(&T[2], 203)]
}
