//! The compute farm: render tasks, the worker threads that evaluate them pixel by pixel, and
//! the scheduler that orders, preempts, cancels and delivers them.

/// Scheduler and delivery queues.
pub mod farm;
/// Units of render work.
pub mod task;
pub(crate) mod worker;

pub use farm::{Farm, FarmOpts, FarmStats};
pub use task::{Cursor, DisplayId, MAX_MULTISAMPLE, RenderOpts, RenderTask, TaskAbort, progressive_tasks};
