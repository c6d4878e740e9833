use crate::foundation::random::Random01;
use crate::foundation::xyz::Xyz;
use crate::function::registry::{Classification, Kind, NodeRegistry};

/// Tunables for random tree construction and mutation.
///
/// Plain data, loadable from JSON; every field is optional there and falls back to the
/// defaults below.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MutationConfigOpts {
    /// Scale of random parameter perturbation.
    pub magnitude: f64,
    pub probability_parameter_reset: f64,
    pub probability_glitch: f64,
    pub probability_shuffle: f64,
    pub probability_insert: f64,
    pub probability_substitute: f64,
    pub probability_iterations_change_step: f64,
    pub probability_iterations_change_jump: f64,
    /// Share of basic-kind picks that are constants.
    pub proportion_constant: f64,
    /// Share of non-constant basic picks that become transforms rather than identities.
    pub identity_suppression: f64,
    /// Share of stub picks drawn from the basic kinds.
    pub proportion_basic: f64,
    pub max_initial_iterations: u32,
    pub autocool: bool,
    /// Generations for the cooling factor to fall to one half.
    pub autocool_halflife: u32,
    pub seed: u64,
}

impl Default for MutationConfigOpts {
    fn default() -> Self {
        Self {
            magnitude: 0.25,
            probability_parameter_reset: 0.05,
            probability_glitch: 0.05,
            probability_shuffle: 0.05,
            probability_insert: 0.05,
            probability_substitute: 0.05,
            probability_iterations_change_step: 0.25,
            probability_iterations_change_jump: 0.02,
            proportion_constant: 0.5,
            identity_suppression: 1.0,
            proportion_basic: 0.5,
            max_initial_iterations: 16,
            autocool: false,
            autocool_halflife: 100,
            seed: 0,
        }
    }
}

/// Live mutation state: the tunables, per-kind selection weights and the random stream.
///
/// Only the thread that evolves images touches this; workers never see it.
#[derive(Clone, Debug)]
pub struct MutationConfig {
    configured: MutationConfigOpts,
    base: MutationConfigOpts,
    rng: Random01,
    weights: Vec<f64>,
    contracts_args: Vec<usize>,
    classifications: Vec<Classification>,
    pick: Vec<(f64, Kind)>,
    total_weight: f64,
    autocool_generations: u32,
}

impl MutationConfig {
    pub fn new(opts: MutationConfigOpts, registry: &NodeRegistry) -> Self {
        let mut weights = vec![0.0; Kind::COUNT];
        let mut contracts_args = vec![0; Kind::COUNT];
        let mut classifications = vec![Classification::NONE; Kind::COUNT];
        for r in registry.iter() {
            let i = r.kind.index();
            contracts_args[i] = r.contract.args;
            classifications[i] = r.contract.classification;
            weights[i] = initial_weight(r.kind, r.contract.classification);
        }
        let mut cfg = Self {
            rng: Random01::new(opts.seed),
            configured: opts.clone(),
            base: opts,
            weights,
            contracts_args,
            classifications,
            pick: Vec::new(),
            total_weight: 0.0,
            autocool_generations: 0,
        };
        cfg.recalculate_pick();
        cfg
    }

    pub fn opts(&self) -> &MutationConfigOpts {
        &self.base
    }

    /// Restore the configured values and weights, keeping the random stream position.
    pub fn reset(&mut self) {
        self.base = self.configured.clone();
        self.autocool_generations = 0;
        for k in Kind::ALL {
            self.weights[k.index()] = initial_weight(k, self.classifications[k.index()]);
        }
        self.recalculate_pick();
    }

    // Random stream.

    pub fn r01(&mut self) -> f64 {
        self.rng.r01()
    }

    pub fn negexp(&mut self) -> f64 {
        self.rng.negexp()
    }

    pub fn signed_negexp(&mut self) -> f64 {
        self.rng.signed_negexp()
    }

    pub fn below(&mut self, n: usize) -> usize {
        self.rng.below(n)
    }

    pub fn shuffle<T>(&mut self, v: &mut [T]) {
        self.rng.shuffle(v);
    }

    pub fn sphere_normal(&mut self) -> Xyz {
        self.rng.sphere_normal()
    }

    // Effective tunables, after cooling.

    /// `0.5^(generations / halflife)` with autocool on, otherwise 1.
    pub fn decay_factor(&self) -> f64 {
        if !self.base.autocool || self.base.autocool_halflife == 0 {
            return 1.0;
        }
        0.5f64.powf(f64::from(self.autocool_generations) / f64::from(self.base.autocool_halflife))
    }

    pub fn magnitude(&self) -> f64 {
        self.base.magnitude * self.decay_factor()
    }

    pub fn probability_parameter_reset(&self) -> f64 {
        self.base.probability_parameter_reset * self.decay_factor()
    }

    pub fn probability_glitch(&self) -> f64 {
        self.base.probability_glitch * self.decay_factor()
    }

    pub fn probability_shuffle(&self) -> f64 {
        self.base.probability_shuffle * self.decay_factor()
    }

    pub fn probability_insert(&self) -> f64 {
        self.base.probability_insert * self.decay_factor()
    }

    pub fn probability_substitute(&self) -> f64 {
        self.base.probability_substitute * self.decay_factor()
    }

    pub fn probability_iterations_change_step(&self) -> f64 {
        self.base.probability_iterations_change_step * self.decay_factor()
    }

    pub fn probability_iterations_change_jump(&self) -> f64 {
        self.base.probability_iterations_change_jump * self.decay_factor()
    }

    pub fn proportion_constant(&self) -> f64 {
        self.base.proportion_constant
    }

    pub fn identity_suppression(&self) -> f64 {
        self.base.identity_suppression
    }

    pub fn proportion_basic(&self) -> f64 {
        self.base.proportion_basic
    }

    pub fn max_initial_iterations(&self) -> u32 {
        self.base.max_initial_iterations
    }

    // Cooling.

    /// Scale the perturbation magnitude and every mutation probability by `f`.
    pub fn general_cool(&mut self, f: f64) {
        let b = &mut self.base;
        b.magnitude *= f;
        b.probability_parameter_reset *= f;
        b.probability_glitch *= f;
        b.probability_shuffle *= f;
        b.probability_insert *= f;
        b.probability_substitute *= f;
        b.probability_iterations_change_step *= f;
        b.probability_iterations_change_jump *= f;
    }

    /// Count one generation towards the autocool half-life.
    pub fn autocool_step(&mut self) {
        if self.base.autocool {
            self.autocool_generations = self.autocool_generations.saturating_add(1);
        }
    }

    pub fn autocool_generations(&self) -> u32 {
        self.autocool_generations
    }

    pub fn reset_autocool(&mut self) {
        self.autocool_generations = 0;
    }

    /// Undo every `general_cool` and autocool step; kind weights are left alone.
    pub fn reset_cooling(&mut self) {
        let c = &self.configured;
        let b = &mut self.base;
        b.magnitude = c.magnitude;
        b.probability_parameter_reset = c.probability_parameter_reset;
        b.probability_glitch = c.probability_glitch;
        b.probability_shuffle = c.probability_shuffle;
        b.probability_insert = c.probability_insert;
        b.probability_substitute = c.probability_substitute;
        b.probability_iterations_change_step = c.probability_iterations_change_step;
        b.probability_iterations_change_jump = c.probability_iterations_change_jump;
        self.autocool_generations = 0;
    }

    // Kind weighting.

    pub fn weighting(&self, kind: Kind) -> f64 {
        self.weights[kind.index()]
    }

    /// Top can never be drawn at random, so its weight stays zero.
    pub fn set_weighting(&mut self, kind: Kind, w: f64) {
        if kind == Kind::Top {
            return;
        }
        self.weights[kind.index()] = w.max(0.0);
        self.recalculate_pick();
    }

    /// Give every kind matching `mask` a weight of `2^-i`, `i` uniform in `0..=10`.
    ///
    /// An empty mask matches every kind.
    pub fn randomize_weightings_for_classifications(&mut self, mask: Classification) {
        for k in Kind::ALL {
            if k == Kind::Top {
                continue;
            }
            let matches = mask == Classification::NONE
                || mask.0 == u32::MAX
                || self.classifications[k.index()].intersects(mask);
            if matches {
                let i = (11.0 * self.rng.r01()).floor() as i32;
                self.weights[k.index()] = 2f64.powi(-i);
            }
        }
        self.recalculate_pick();
    }

    /// Expected child count of a node drawn by [`MutationConfig::random_kind`].
    pub fn random_branching_ratio(&self) -> f64 {
        if self.total_weight <= 0.0 {
            return 0.0;
        }
        let weighted: f64 = Kind::ALL
            .iter()
            .map(|k| self.weights[k.index()] * self.contracts_args[k.index()] as f64)
            .sum();
        weighted / self.total_weight
    }

    /// Weighted random kind. Falls back to Identity if every weight is zero.
    pub fn random_kind(&mut self) -> Kind {
        let r = self.rng.r01();
        let i = self.pick.partition_point(|(c, _)| *c < r);
        self.pick
            .get(i)
            .or_else(|| self.pick.last())
            .map(|(_, k)| *k)
            .unwrap_or(Kind::Identity)
    }

    fn recalculate_pick(&mut self) {
        self.total_weight = self.weights.iter().sum();
        self.pick.clear();
        if self.total_weight <= 0.0 {
            return;
        }
        let mut cumulative = 0.0;
        for k in Kind::ALL {
            let w = self.weights[k.index()];
            if w > 0.0 {
                cumulative += w / self.total_weight;
                self.pick.push((cumulative, k));
            }
        }
    }
}

fn initial_weight(kind: Kind, c: Classification) -> f64 {
    if kind == Kind::Top {
        0.0
    } else if c.intersects(Classification::ITERATIVE | Classification::FRACTAL) {
        1.0 / 1024.0
    } else {
        1.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mutation/config.rs"]
mod tests;
