use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::render::farm::Shared;

/// Signals from the farm to one worker thread, checked between pixels.
#[derive(Debug, Default)]
pub(crate) struct WorkerFlags {
    kill: AtomicBool,
    abort: AtomicBool,
    defer: AtomicBool,
}

impl WorkerFlags {
    pub(crate) fn kill(&self) {
        self.kill.store(true, Ordering::Relaxed);
    }

    pub(crate) fn killed(&self) -> bool {
        self.kill.load(Ordering::Relaxed)
    }

    pub(crate) fn abort(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }

    pub(crate) fn defer(&self) {
        self.defer.store(true, Ordering::Relaxed);
    }

    pub(crate) fn deferred(&self) -> bool {
        self.defer.load(Ordering::Relaxed)
    }

    pub(crate) fn aborted(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }

    /// Take the abort and defer signals, clearing both.
    pub(crate) fn take(&self) -> (bool, bool) {
        (
            self.abort.swap(false, Ordering::Relaxed),
            self.defer.swap(false, Ordering::Relaxed),
        )
    }

    fn interrupted(&self) -> bool {
        self.killed() || self.aborted() || self.deferred()
    }
}

/// Body of worker thread `index`: take the most urgent task, render it until it completes or
/// is interrupted, hand it back, repeat until killed.
pub(crate) fn run(shared: Arc<Shared>, index: usize) {
    let flags = Arc::clone(&shared.flags[index]);
    tracing::trace!(worker = index, "worker started");
    while let Some(mut task) = shared.take_todo(index) {
        let abort = task.abort_handle();
        task.render(|| flags.interrupted() || abort.is_aborted());
        shared.finish(index, task);
    }
    tracing::trace!(worker = index, "worker stopped");
}
