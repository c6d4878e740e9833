//! Small numeric building blocks shared by the function tree and the renderer.

/// Library error type.
pub mod error;
/// Periodic and clamped arithmetic helpers.
pub mod math;
/// Seeded random stream.
pub mod random;
/// Twelve-parameter affine maps.
pub mod transform;
/// Three-component vectors.
pub mod xyz;
