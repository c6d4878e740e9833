use super::*;
use crate::function::node::Node;
use crate::image::{Image, Projection, ZSweep};
use crate::render::task::RenderOpts;

fn task(display: u64, side: u32) -> RenderTask {
    let image = Arc::new(
        Image::new(Node::top(Node::identity()), ZSweep::Linear, Projection::Planar)
            .expect("image"),
    );
    RenderTask::new(
        image,
        DisplayId(display),
        (side, side),
        1,
        0,
        0,
        RenderOpts::default(),
    )
}

fn done(shared: &Shared, t: RenderTask) {
    shared.lock().push_done(t);
}

#[test]
fn todo_pops_smallest_first() {
    let shared = Shared::new(1);
    for side in [64, 256, 16] {
        shared.push_todo(task(0, side));
    }
    let order: Vec<u64> = (0..3)
        .map(|_| shared.take_todo(0).expect("task").priority())
        .map(|p| {
            shared.lock().running[0] = None;
            p
        })
        .collect();
    assert_eq!(order, vec![256, 4096, 65536]);
}

#[test]
fn smaller_push_defers_larger_running_task() {
    let shared = Shared::new(2);
    shared.push_todo(task(0, 256));
    shared.push_todo(task(1, 16));
    let small = shared.take_todo(0).expect("small");
    let big = shared.take_todo(1).expect("big");
    assert_eq!(small.priority(), 256);
    assert_eq!(big.priority(), 65536);

    shared.push_todo(task(2, 64));
    assert!(!shared.flags[0].deferred());
    assert!(shared.flags[1].deferred());

    // The deferred task goes back to todo untouched by the worker's flags.
    shared.finish(1, big);
    assert!(!shared.flags[1].deferred());
    let s = shared.stats();
    assert_eq!((s.todo, s.active, s.done, s.deferrals), (2, 1, 0, 1));
}

#[test]
fn finished_tasks_are_delivered_round_robin() {
    let shared = Shared::new(0);
    done(&shared, task(1, 4));
    done(&shared, task(1, 8));
    done(&shared, task(2, 4));
    done(&shared, task(3, 4));

    let order: Vec<(u64, u64)> = std::iter::from_fn(|| shared.pop_done())
        .map(|t| (t.display().0, t.priority()))
        .collect();
    // Largest first within a display, one display per turn.
    assert_eq!(order, vec![(1, 64), (2, 16), (3, 16), (1, 16)]);
}

#[test]
fn aborted_tasks_are_never_delivered() {
    let shared = Shared::new(0);
    let t = task(1, 4);
    t.abort();
    done(&shared, t);
    done(&shared, task(2, 4));
    let delivered: Vec<u64> = std::iter::from_fn(|| shared.pop_done())
        .map(|t| t.display().0)
        .collect();
    assert_eq!(delivered, vec![2]);
}

#[test]
fn abort_for_clears_one_display() {
    let shared = Shared::new(1);
    shared.push_todo(task(1, 8));
    let running = shared.take_todo(0).expect("running");
    shared.push_todo(task(1, 4));
    shared.push_todo(task(2, 4));
    done(&shared, task(1, 2));
    done(&shared, task(2, 2));

    let n = shared.abort_where(|d| d == DisplayId(1));
    assert_eq!(n, 3);
    assert!(shared.flags[0].aborted());

    shared.finish(0, running);
    let delivered: Vec<u64> = std::iter::from_fn(|| shared.pop_done())
        .map(|t| t.display().0)
        .collect();
    assert_eq!(delivered, vec![2]);
    assert_eq!(shared.stats().todo, 1);
}

#[test]
fn fasttrack_moves_aborted_todo() {
    let shared = Shared::new(0);
    let t = task(1, 4);
    let handle = t.abort_handle();
    shared.push_todo(t);
    shared.push_todo(task(2, 4));
    handle.abort();
    assert_eq!(shared.fasttrack_aborted(), 1);
    let s = shared.stats();
    assert_eq!((s.todo, s.done), (1, 1));
    assert!(shared.pop_done().is_none());
}

#[test]
fn farm_rejects_zero_threads() {
    assert!(Farm::new(FarmOpts { threads: 0 }).is_err());
}

#[test]
fn farm_info_and_shutdown() {
    let mut farm = Farm::new(FarmOpts { threads: 2 }).expect("farm");
    assert_eq!(farm.threads(), 2);
    assert_eq!(farm.write_info(), "[0/0/0]");
    farm.shutdown();
    farm.shutdown();
}
