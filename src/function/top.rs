use std::f64::consts::{FRAC_PI_2, TAU};

use crate::foundation::transform::Transform;
use crate::foundation::xyz::Xyz;
use crate::function::node::Node;
use crate::function::registry::Kind;
use crate::mutation::config::MutationConfig;

const POST: usize = Transform::PARAMS;

/// Root-node behaviour.
///
/// A Top carries a space transform in params `0..12` applied to the sample point and a colour
/// transform in params `12..24` applied to its child's result.
impl Node {
    /// A new root node.
    ///
    /// The child is an exciting stub, or a fresh node of `favourite` when given, drawn again
    /// until it is not constant (a favourite Constant is accepted as is). With `unwrapped`
    /// the space transform is only a random isotropic scale.
    pub fn top_initial(config: &mut MutationConfig, favourite: Option<Kind>, unwrapped: bool) -> Self {
        let child = loop {
            let candidate = match favourite {
                Some(kind) if kind != Kind::Top => Node::stubnew(config, kind),
                _ => Node::stub(config, true),
            };
            if !candidate.is_constant() || favourite == Some(Kind::Constant) {
                break candidate;
            }
        };

        let identity = Transform::identity().to_params();
        let mut params = Vec::with_capacity(2 * Transform::PARAMS);
        params.extend_from_slice(&identity);
        params.extend_from_slice(&identity);

        let mut top = Node {
            kind: Kind::Top,
            params,
            children: vec![child],
            iterations: None,
        };
        if unwrapped {
            let s = config.negexp();
            top.concatenate_pretransform_on_right(&Transform::scale(s));
        } else {
            top.reset_pretransform(config);
        }
        top.reset_posttransform(config);
        top
    }

    /// Wrap an existing child with identity space and colour transforms.
    pub fn top(child: Node) -> Self {
        let identity = Transform::identity().to_params();
        let mut params = Vec::with_capacity(2 * Transform::PARAMS);
        params.extend_from_slice(&identity);
        params.extend_from_slice(&identity);
        Node {
            kind: Kind::Top,
            params,
            children: vec![child],
            iterations: None,
        }
    }

    pub fn pretransform(&self) -> Transform {
        Transform::from_params(&self.params[..POST])
    }

    pub fn posttransform(&self) -> Transform {
        Transform::from_params(&self.params[POST..])
    }

    pub(crate) fn set_pretransform(&mut self, t: &Transform) {
        self.params[..POST].copy_from_slice(&t.to_params());
    }

    pub(crate) fn set_posttransform(&mut self, t: &Transform) {
        self.params[POST..].copy_from_slice(&t.to_params());
    }

    /// Compose `t` so it is applied to sample points before the current space transform.
    pub fn concatenate_pretransform_on_right(&mut self, t: &Transform) {
        let mut current = self.pretransform();
        current.concatenate_on_right(t);
        self.set_pretransform(&current);
    }

    pub(crate) fn mutate_top(&mut self, config: &mut MutationConfig) {
        self.mutate_node(config, false);

        if config.r01() < config.probability_parameter_reset() {
            self.reset_pretransform(config);
        } else {
            let k = config.magnitude();
            let t = interesting_pretransform(config, k);
            self.concatenate_pretransform_on_right(&t);
        }

        if config.r01() < config.probability_parameter_reset() {
            self.reset_posttransform(config);
        } else {
            let magnitude = config.magnitude();
            for p in &mut self.params[POST..] {
                *p += magnitude * config.signed_negexp();
            }
        }
    }

    fn reset_pretransform(&mut self, config: &mut MutationConfig) {
        let t = interesting_pretransform(config, 1.0);
        self.set_pretransform(&t);
    }

    fn reset_posttransform(&mut self, config: &mut MutationConfig) {
        let p = Node::stubparams(config, Transform::PARAMS);
        self.set_posttransform(&Transform::from_params(&p));
    }
}

/// Random space transform that tends to make pictures more interesting.
///
/// Scales, rotates about a random origin and translates, each by an amount governed by `k`;
/// `k == 1` builds a fresh transform, smaller values a perturbation of the current one.
pub(crate) fn interesting_pretransform(config: &mut MutationConfig, k: f64) -> Transform {
    let mut t = Transform::identity();

    let origin = random_offset(config, 1.0);
    t.concatenate_on_right(&Transform::translation(-origin));

    if config.r01() < 0.5 {
        let s = 1.0 + k * (config.negexp() - 1.0);
        t.concatenate_on_right(&Transform::scale(s));
    } else {
        let sx = 1.0 + k * (config.negexp() - 1.0);
        let sy = 1.0 + k * (config.negexp() - 1.0);
        let sz = 1.0 + k * (config.negexp() - 1.0);
        t.concatenate_on_right(&Transform::scale_xyz(Xyz::new(sx, sy, sz)));
    }

    let fresh = k == 1.0;
    if fresh || config.r01() < config.probability_parameter_reset() {
        if !fresh {
            t.concatenate_on_right(&Transform::scale(2.0));
        }
        while config.r01() < 0.125 {
            t.concatenate_on_right(&Transform::scale(2.0));
        }
        while config.r01() < 0.125 {
            t.concatenate_on_right(&Transform::scale(0.5));
        }
    }

    if fresh {
        let rotations: [fn(f64) -> Transform; 3] =
            [Transform::rotate_x, Transform::rotate_y, Transform::rotate_z];
        for rotate in rotations {
            if config.r01() < 0.0625 {
                let sign = if config.r01() < 0.5 { 1.0 } else { -1.0 };
                t.concatenate_on_right(&rotate(sign * FRAC_PI_2));
            }
        }
    }

    if config.r01() < 0.5 {
        let a = k * TAU * config.r01();
        t.concatenate_on_right(&Transform::rotate_z(a));
    }
    if config.r01() < 0.125 {
        let a = k * TAU * config.r01();
        t.concatenate_on_right(&Transform::rotate_x(a));
    }
    if config.r01() < 0.125 {
        let a = k * TAU * config.r01();
        t.concatenate_on_right(&Transform::rotate_y(a));
    }

    t.concatenate_on_right(&Transform::translation(origin));

    let shift = random_offset(config, k);
    t.concatenate_on_right(&Transform::translation(shift));
    t
}

/// Half the time zero; otherwise negexp x and y, and half of those also a negexp z.
fn random_offset(config: &mut MutationConfig, k: f64) -> Xyz {
    let mut o = Xyz::ZERO;
    if config.r01() < 0.5 {
        o.x = k * config.negexp();
        o.y = k * config.negexp();
        if config.r01() < 0.5 {
            o.z = k * config.negexp();
        }
    }
    o
}
