use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crate::foundation::error::{EvolvotronError, EvolvotronResult};
use crate::render::task::{DisplayId, RenderTask};
use crate::render::worker::{self, WorkerFlags};

/// Options for [`Farm::new`].
#[derive(Clone, Debug)]
pub struct FarmOpts {
    /// Worker thread count; must be at least 1.
    pub threads: usize,
}

impl Default for FarmOpts {
    fn default() -> Self {
        Self {
            threads: thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

/// Queue sizes and counters, as reported by [`Farm::stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FarmStats {
    pub todo: usize,
    pub active: usize,
    pub done: usize,
    /// Tasks sent back to the todo queue so more urgent work could run.
    pub deferrals: u64,
}

#[derive(Clone, Copy, Debug)]
struct Running {
    display: DisplayId,
    priority: u64,
}

/// Todo entries sort by ascending priority, then arrival.
type TodoKey = (u64, u64);
/// Done entries sort by descending priority, then arrival.
type DoneKey = (Reverse<u64>, u64);

#[derive(Debug, Default)]
pub(crate) struct State {
    todo: BTreeMap<TodoKey, RenderTask>,
    done: BTreeMap<DisplayId, BTreeMap<DoneKey, RenderTask>>,
    last_delivered: Option<DisplayId>,
    running: Vec<Option<Running>>,
    seq: u64,
    deferrals: u64,
    shutdown: bool,
}

impl State {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn push_done(&mut self, mut task: RenderTask) {
        let seq = self.next_seq();
        task.mark_finished(seq);
        let key = (Reverse(task.priority()), seq);
        self.done.entry(task.display()).or_default().insert(key, task);
    }

    fn done_len(&self) -> usize {
        self.done.values().map(BTreeMap::len).sum()
    }

    fn active(&self) -> usize {
        self.running.iter().filter(|r| r.is_some()).count()
    }
}

/// Queues and worker signals, shared between the farm handle and its threads.
#[derive(Debug)]
pub(crate) struct Shared {
    state: Mutex<State>,
    work: Condvar,
    pub(crate) flags: Vec<Arc<WorkerFlags>>,
}

impl Shared {
    pub(crate) fn new(workers: usize) -> Self {
        Self {
            state: Mutex::new(State {
                running: vec![None; workers],
                ..State::default()
            }),
            work: Condvar::new(),
            flags: (0..workers).map(|_| Arc::default()).collect(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue `task` and defer every running task less urgent than it.
    pub(crate) fn push_todo(&self, task: RenderTask) {
        let mut st = self.lock();
        self.push_todo_locked(&mut st, task);
    }

    pub(crate) fn push_todo_all(&self, tasks: impl IntoIterator<Item = RenderTask>) {
        let mut st = self.lock();
        for task in tasks {
            self.push_todo_locked(&mut st, task);
        }
    }

    fn push_todo_locked(&self, st: &mut State, task: RenderTask) {
        let priority = task.priority();
        for (i, slot) in st.running.iter().enumerate() {
            if let Some(r) = slot
                && r.priority > priority
            {
                tracing::debug!(worker = i, running = r.priority, incoming = priority, "defer");
                self.flags[i].defer();
            }
        }
        let key = (priority, st.next_seq());
        st.todo.insert(key, task);
        self.work.notify_one();
    }

    /// Block until there is a task for worker `index`; `None` once the worker is killed.
    pub(crate) fn take_todo(&self, index: usize) -> Option<RenderTask> {
        let mut st = self.lock();
        loop {
            if st.shutdown || self.flags[index].killed() {
                return None;
            }
            if let Some((_, task)) = st.todo.pop_first() {
                if task.aborted() {
                    st.push_done(task);
                    continue;
                }
                st.running[index] = Some(Running {
                    display: task.display(),
                    priority: task.priority(),
                });
                return Some(task);
            }
            st = self
                .work
                .wait(st)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Take back a task from worker `index`: completed and aborted tasks go to the done
    /// queues, deferred ones back to todo with their progress intact.
    pub(crate) fn finish(&self, index: usize, task: RenderTask) {
        let mut st = self.lock();
        st.running[index] = None;
        let (abort, defer) = self.flags[index].take();
        if st.shutdown || self.flags[index].killed() {
            return;
        }
        if abort || task.aborted() {
            task.abort();
            st.push_done(task);
        } else if defer && !task.completed() {
            st.deferrals += 1;
            self.push_todo_locked(&mut st, task);
        } else {
            st.push_done(task);
        }
    }

    /// Next finished task, taking one display at a time in turn. Aborted tasks are dropped.
    pub(crate) fn pop_done(&self) -> Option<RenderTask> {
        let mut guard = self.lock();
        let st = &mut *guard;
        loop {
            let after = match st.last_delivered {
                Some(d) => Bound::Excluded(d),
                None => Bound::Unbounded,
            };
            let display = st
                .done
                .range((after, Bound::Unbounded))
                .next()
                .map(|(d, _)| *d)
                .or_else(|| st.done.keys().next().copied())?;
            st.last_delivered = Some(display);

            let queue = st.done.get_mut(&display)?;
            let task = queue.pop_first().map(|(_, t)| t);
            if queue.is_empty() {
                st.done.remove(&display);
            }
            match task {
                Some(t) if !t.aborted() => return Some(t),
                _ => continue,
            }
        }
    }

    pub(crate) fn fasttrack_aborted(&self) -> usize {
        let mut st = self.lock();
        let aborted: Vec<TodoKey> = st
            .todo
            .iter()
            .filter(|(_, t)| t.aborted())
            .map(|(k, _)| *k)
            .collect();
        for key in &aborted {
            if let Some(task) = st.todo.remove(key) {
                st.push_done(task);
            }
        }
        if !aborted.is_empty() {
            tracing::debug!(tasks = aborted.len(), "fast-tracked aborted tasks");
        }
        aborted.len()
    }

    /// Abort queued, running and undelivered tasks matching `which`.
    fn abort_where(&self, which: impl Fn(DisplayId) -> bool) -> usize {
        let mut st = self.lock();
        let mut count = 0;

        st.todo.retain(|_, t| {
            if which(t.display()) {
                t.abort();
                count += 1;
                false
            } else {
                true
            }
        });

        for (i, slot) in st.running.iter().enumerate() {
            if let Some(r) = slot
                && which(r.display)
            {
                self.flags[i].abort();
                count += 1;
            }
        }

        st.done.retain(|d, queue| {
            if which(*d) {
                for t in queue.values() {
                    t.abort();
                }
                count += queue.len();
                false
            } else {
                true
            }
        });
        count
    }

    pub(crate) fn stats(&self) -> FarmStats {
        let st = self.lock();
        FarmStats {
            todo: st.todo.len(),
            active: st.active(),
            done: st.done_len(),
            deferrals: st.deferrals,
        }
    }

    fn shutdown(&self) {
        let mut st = self.lock();
        st.shutdown = true;
        for f in &self.flags {
            f.kill();
        }
        st.todo.clear();
        st.done.clear();
        self.work.notify_all();
    }
}

/// Pool of render threads fed from a priority queue.
///
/// Smaller tasks run first and preempt larger running ones, which go back to the queue and
/// later resume where they stopped. Finished tasks wait in per-display queues, largest first,
/// and are handed out one display at a time.
#[derive(Debug)]
pub struct Farm {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl Farm {
    #[tracing::instrument(skip(opts), fields(threads = opts.threads))]
    pub fn new(opts: FarmOpts) -> EvolvotronResult<Self> {
        if opts.threads == 0 {
            return Err(EvolvotronError::validation(
                "farm 'threads' must be >= 1",
            ));
        }
        let shared = Arc::new(Shared::new(opts.threads));
        let mut farm = Self {
            shared,
            workers: Vec::with_capacity(opts.threads),
        };
        for index in 0..opts.threads {
            let shared = Arc::clone(&farm.shared);
            let handle = thread::Builder::new()
                .name(format!("evolvotron-worker-{index}"))
                .spawn(move || worker::run(shared, index))
                .map_err(|e| {
                    EvolvotronError::render(format!("failed to spawn worker {index}: {e}"))
                })?;
            farm.workers.push(handle);
        }
        tracing::info!(threads = opts.threads, "compute farm started");
        Ok(farm)
    }

    pub fn threads(&self) -> usize {
        self.shared.flags.len()
    }

    /// Queue a task, deferring any running task with a larger priority value.
    pub fn push_todo(&self, task: RenderTask) {
        self.shared.push_todo(task);
    }

    /// Queue several tasks at once, so workers only ever see the whole batch.
    pub fn push_todo_all(&self, tasks: impl IntoIterator<Item = RenderTask>) {
        self.shared.push_todo_all(tasks);
    }

    /// Non-blocking. Returns the next finished task, rotating fairly across displays.
    pub fn pop_done(&self) -> Option<RenderTask> {
        self.shared.pop_done()
    }

    /// Move queued tasks that were aborted through their handles straight to done, so no
    /// worker starts them. Returns how many moved.
    pub fn fasttrack_aborted(&self) -> usize {
        self.shared.fasttrack_aborted()
    }

    /// Abort every queued, running and undelivered task for `display`.
    pub fn abort_for(&self, display: DisplayId) -> usize {
        let n = self.shared.abort_where(|d| d == display);
        let id = display.0;
        tracing::debug!(display = id, tasks = n, "abort_for");
        n
    }

    /// Abort all tasks; the workers keep running.
    pub fn abort_all(&self) -> usize {
        let n = self.shared.abort_where(|_| true);
        tracing::debug!(tasks = n, "abort_all");
        n
    }

    /// Queued, running and undelivered tasks.
    pub fn tasks_outstanding(&self) -> usize {
        let s = self.stats();
        s.todo + s.active + s.done
    }

    pub fn stats(&self) -> FarmStats {
        self.shared.stats()
    }

    /// `[todo/active/done]`.
    pub fn write_info(&self) -> String {
        let s = self.stats();
        format!("[{}/{}/{}]", s.todo, s.active, s.done)
    }

    /// Stop and join every worker, dropping all outstanding tasks.
    pub fn shutdown(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        tracing::info!("compute farm shutting down");
        self.shared.shutdown();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("render worker panicked");
            }
        }
        tracing::info!("compute farm shut down");
    }
}

impl Drop for Farm {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/farm.rs"]
mod tests;
