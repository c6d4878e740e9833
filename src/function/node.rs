use crate::foundation::error::{EvolvotronError, EvolvotronResult};
use crate::foundation::transform::Transform;
use crate::foundation::xyz::Xyz;
use crate::function::registry::{Contract, Kind};
use crate::mutation::config::MutationConfig;

/// One node of a function tree.
///
/// The tree is strictly owned: children live inside their parent and cloning is always deep.
/// Parameter count, child count and the presence of an iteration count are fixed by the kind's
/// [`Contract`]; every constructor in this module keeps that true and [`Node::ok`] checks it.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub(crate) kind: Kind,
    pub(crate) params: Vec<f64>,
    pub(crate) children: Vec<Node>,
    pub(crate) iterations: Option<u32>,
}

/// Size and shape summary of a tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct TreeStats {
    pub nodes: usize,
    pub parameters: usize,
    pub depth: usize,
    /// Leaf count.
    pub width: usize,
    /// Nodes whose subtree is constant.
    pub constants: usize,
}

impl TreeStats {
    pub fn proportion_constant(&self) -> f64 {
        if self.nodes == 0 {
            0.0
        } else {
            self.constants as f64 / self.nodes as f64
        }
    }
}

impl Node {
    /// Build a node, checking the kind's contract.
    pub fn new(
        kind: Kind,
        params: Vec<f64>,
        children: Vec<Node>,
        iterations: Option<u32>,
    ) -> EvolvotronResult<Self> {
        let c = kind.contract();
        if params.len() != c.params {
            return Err(EvolvotronError::validation(format!(
                "{kind}: expected {} parameters, got {}",
                c.params,
                params.len()
            )));
        }
        if children.len() != c.args {
            return Err(EvolvotronError::validation(format!(
                "{kind}: expected {} arguments, got {}",
                c.args,
                children.len()
            )));
        }
        match (c.iterative, iterations) {
            (true, None) | (true, Some(0)) => {
                return Err(EvolvotronError::validation(format!(
                    "{kind}: expected an iteration count of at least 1"
                )));
            }
            (false, Some(_)) => {
                return Err(EvolvotronError::validation(format!(
                    "{kind}: unexpected iteration count"
                )));
            }
            _ => {}
        }
        Ok(Self {
            kind,
            params,
            children,
            iterations,
        })
    }

    pub fn constant(v: Xyz) -> Self {
        Self {
            kind: Kind::Constant,
            params: vec![v.x, v.y, v.z],
            children: Vec::new(),
            iterations: None,
        }
    }

    pub fn identity() -> Self {
        Self {
            kind: Kind::Identity,
            params: Vec::new(),
            children: Vec::new(),
            iterations: None,
        }
    }

    pub fn transform(t: &Transform) -> Self {
        Self {
            kind: Kind::Transform,
            params: t.to_params().to_vec(),
            children: Vec::new(),
            iterations: None,
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn contract(&self) -> Contract {
        self.kind.contract()
    }

    pub fn params(&self) -> &[f64] {
        &self.params
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn iterations(&self) -> Option<u32> {
        self.iterations
    }

    pub(crate) fn param(&self, i: usize) -> f64 {
        self.params[i]
    }

    pub(crate) fn arg(&self, i: usize) -> &Node {
        &self.children[i]
    }

    /// Independent copy sharing nothing with `self`.
    pub fn deepclone(&self) -> Self {
        self.clone()
    }

    /// Whether this node and every descendant satisfy their kind's contract.
    pub fn ok(&self) -> bool {
        let c = self.contract();
        let iterations_ok = match self.iterations {
            Some(n) => c.iterative && n >= 1,
            None => !c.iterative,
        };
        self.params.len() == c.params
            && self.children.len() == c.args
            && iterations_ok
            && self.children.iter().all(Node::ok)
    }

    pub fn stats(&self) -> TreeStats {
        let mut s = TreeStats {
            nodes: 1,
            parameters: self.params.len(),
            depth: 1,
            width: usize::from(self.children.is_empty()),
            constants: usize::from(self.is_constant()),
        };
        for child in &self.children {
            let cs = child.stats();
            s.nodes += cs.nodes;
            s.parameters += cs.parameters;
            s.depth = s.depth.max(cs.depth + 1);
            s.width += cs.width;
            s.constants += cs.constants;
        }
        s
    }

    // Random construction.

    /// `n` parameters uniform in `[-1, 1)`.
    pub fn stubparams(config: &mut MutationConfig, n: usize) -> Vec<f64> {
        (0..n).map(|_| -1.0 + 2.0 * config.r01()).collect()
    }

    /// `n` fresh non-exciting stubs.
    pub fn stubargs(config: &mut MutationConfig, n: usize) -> Vec<Node> {
        (0..n).map(|_| Node::stub(config, false)).collect()
    }

    /// Iteration count in `1..=max_initial_iterations`.
    pub fn stubiterations(config: &mut MutationConfig) -> u32 {
        let max = config.max_initial_iterations().max(1);
        1 + ((config.r01() * f64::from(max)).floor() as u32).min(max - 1)
    }

    /// A new node of `kind` with random parameters, stub children and, when iterative, a
    /// random iteration count.
    pub fn stubnew(config: &mut MutationConfig, kind: Kind) -> Self {
        if kind == Kind::Top {
            return Node::top_initial(config, None, false);
        }
        let c = kind.contract();
        let params = Node::stubparams(config, c.params);
        let children = Node::stubargs(config, c.args);
        let iterations = c.iterative.then(|| Node::stubiterations(config));
        Self {
            kind,
            params,
            children,
            iterations,
        }
    }

    /// Random subtree for filling a child slot.
    ///
    /// A share of picks (`proportion_basic`) are drawn from the cheap basic kinds: transforms,
    /// identities and constants. `exciting` pushes the draw out of that band so something
    /// structurally interesting happens at this point.
    pub fn stub(config: &mut MutationConfig, exciting: bool) -> Self {
        let base = config.proportion_basic();
        let r01 = config.r01();
        let r = if exciting {
            base + (1.0 - base) * r01
        } else {
            r01
        };
        let non_constant = 1.0 - config.proportion_constant();
        if r < non_constant * config.identity_suppression() * base {
            Node::stubnew(config, Kind::Transform)
        } else if r < non_constant * base {
            Node::stubnew(config, Kind::Identity)
        } else if r < base {
            Node::stubnew(config, Kind::Constant)
        } else {
            let kind = config.random_kind();
            Node::stubnew(config, kind)
        }
    }

    // Mutation.

    /// Mutate in place: children first, then this node's parameters, iteration count and
    /// child structure.
    pub fn mutate(&mut self, config: &mut MutationConfig) {
        if self.kind == Kind::Top {
            self.mutate_top(config);
        } else {
            self.mutate_node(config, true);
        }
        debug_assert!(self.ok(), "mutation broke the contract of {}", self.kind);
    }

    pub(crate) fn mutate_node(&mut self, config: &mut MutationConfig, own_params: bool) {
        for child in &mut self.children {
            child.mutate(config);
        }

        if own_params {
            let magnitude = config.magnitude();
            for p in &mut self.params {
                *p += magnitude * config.signed_negexp();
            }
        }

        if let Some(n) = self.iterations {
            self.iterations = Some(mutate_iterations(config, n));
        }

        for child in &mut self.children {
            if config.r01() < config.probability_glitch() {
                *child = Node::stub(config, false);
            }
        }

        for i in 0..self.children.len() {
            if config.r01() < config.probability_substitute() {
                let old = std::mem::replace(&mut self.children[i], Node::identity());
                self.children[i] = substitute(config, old);
            }
        }

        if config.r01() < config.probability_shuffle() {
            config.shuffle(&mut self.children);
        }

        for i in 0..self.children.len() {
            if config.r01() < config.probability_insert() {
                let old = std::mem::replace(&mut self.children[i], Node::identity());
                let wrapper = Node::stub(config, false);
                self.children[i] = Node {
                    kind: Kind::ComposePair,
                    params: Vec::new(),
                    children: vec![old, wrapper],
                    iterations: None,
                };
            }
        }
    }

    // Simplification.

    /// Replace every constant child subtree with a literal Constant holding its value.
    ///
    /// The node itself keeps its kind, so a Top root stays a Top. Returns the number of nodes
    /// removed from the tree.
    pub fn simplify_constants(&mut self) -> usize {
        let mut removed = 0;
        for child in &mut self.children {
            if child.kind != Kind::Constant && child.is_constant() {
                let before = child.stats().nodes;
                *child = Node::constant(child.evaluate(Xyz::ZERO));
                removed += before - 1;
            } else {
                removed += child.simplify_constants();
            }
        }
        removed
    }

    /// Simplified copy; see [`Node::simplify_constants`].
    pub fn simplified(&self) -> Self {
        let mut n = self.deepclone();
        n.simplify_constants();
        n
    }
}

fn mutate_iterations(config: &mut MutationConfig, mut n: u32) -> u32 {
    if config.r01() < config.probability_iterations_change_step() {
        if config.r01() < 0.5 {
            if n >= 2 {
                n -= 1;
            }
        } else {
            n = n.saturating_add(1);
        }
        if config.r01() < config.probability_iterations_change_jump() {
            if config.r01() < 0.5 {
                if n > 1 {
                    n = n.div_ceil(2);
                }
            } else {
                n = n.saturating_mul(2);
            }
        }
    }
    n.max(1)
}

/// New exciting kind that inherits as much of `old`'s parameters and children as fit.
fn substitute(config: &mut MutationConfig, old: Node) -> Node {
    let Node {
        params: mut p,
        children: mut a,
        ..
    } = old;
    let mut fresh = Node::stub(config, true);
    let c = fresh.contract();

    if a.len() < c.args {
        a.extend(Node::stubargs(config, c.args - a.len()));
    }
    config.shuffle(&mut a);
    a.truncate(c.args);

    if p.len() < c.params {
        p.extend(Node::stubparams(config, c.params - p.len()));
    }
    config.shuffle(&mut p);
    p.truncate(c.params);

    fresh.params = p;
    fresh.children = a;
    fresh
}

#[cfg(test)]
#[path = "../../tests/unit/function/node.rs"]
mod tests;
