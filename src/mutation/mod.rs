//! Mutation tunables and the random stream that drives tree construction.

/// `MutationConfig` and its serde options.
pub mod config;

pub use config::{MutationConfig, MutationConfigOpts};
