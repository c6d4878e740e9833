//! Evolvotron grows pictures from random function trees.
//!
//! Each picture is an [`Image`]: a tree of [`Node`]s rooted at a Top node that maps a point in
//! space to a colour. Trees are built and mutated under a [`MutationConfig`], saved and loaded
//! as a small XML document, and rendered by a [`Farm`] of worker threads that always runs the
//! smallest (cheapest) pending task first.
//!
//! - Build a [`NodeRegistry`] and a [`MutationConfig`]
//! - Create images with [`Image::new_random`] and evolve them with [`Image::mutated`]
//! - Push [`RenderTask`]s to a [`Farm`] and collect them with [`Farm::pop_done`]
#![forbid(unsafe_code)]

/// Errors, vectors, transforms and random streams.
pub mod foundation;
/// Function trees.
pub mod function;
/// Batch layout for the command-line renderer.
pub mod grid;
/// Images and their documents.
pub mod image;
/// Mutation tunables.
pub mod mutation;
/// Render tasks and the compute farm.
pub mod render;

/// Version written into saved function documents.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use crate::foundation::error::{EvolvotronError, EvolvotronResult};
pub use crate::foundation::transform::Transform;
pub use crate::foundation::xyz::Xyz;
pub use crate::function::{Classification, Kind, Node, NodeRegistry, TreeStats};
pub use crate::grid::GridOpts;
pub use crate::image::{Image, LoadReport, Projection, ZSweep};
pub use crate::mutation::{MutationConfig, MutationConfigOpts};
pub use crate::render::{
    DisplayId, Farm, FarmOpts, MAX_MULTISAMPLE, RenderOpts, RenderTask, progressive_tasks,
};
