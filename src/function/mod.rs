//! Function trees: the node kinds, their evaluation, random construction, mutation and the
//! saved document format.

pub(crate) mod eval;
pub(crate) mod markup;
/// Node storage, random construction and mutation.
pub mod node;
pub(crate) mod noise;
/// Kind catalogue and name lookup.
pub mod registry;
pub(crate) mod serial;
pub(crate) mod top;

pub use node::{Node, TreeStats};
pub use registry::{Classification, Contract, Kind, NodeRegistry, Registration};
