use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use super::models::{Path, TileCoord};
use super::node_graph::{Filters, NodeGraph};
use super::task::{AtomicStatus, CancelFlag, PathfinderTask, ProgressSignal, TaskStatus};
use super::world_map::WorldMap;

#[derive(Clone, Debug)]
pub struct SearchOutcome {
    pub status: TaskStatus,
    pub path: Option<Arc<Path>>,
    pub reached_target: bool,
    pub expanded: usize,
}

/// Breadth-first frontier search from `start` towards `target`.
///
/// Every time the expanded node is closer to the target than any before it,
/// its path is handed to `on_progress`, so callers always see the closest
/// path found so far. An exhausted frontier ends `Done` with that best effort.
pub fn search<F>(
    world: &WorldMap,
    filters: &Filters,
    start: TileCoord,
    target: TileCoord,
    cancel: &CancelFlag,
    mut on_progress: F,
) -> SearchOutcome
where
    F: FnMut(&Arc<Path>),
{
    let mut graph = NodeGraph::new(world);
    graph.push_seed(start);

    let mut best: Option<Arc<Path>> = None;
    let mut best_distance = i32::MAX;
    let mut expanded = 0usize;

    while let Some(id) = graph.boundary_node(0) {
        if cancel.is_cancelled() {
            return SearchOutcome { status: TaskStatus::Cancelled, path: best, reached_target: false, expanded };
        }
        let here = graph.node(id).position();
        if here == target {
            let path = Arc::new(graph.path_to(id));
            on_progress(&path);
            return SearchOutcome { status: TaskStatus::Done, path: Some(path), reached_target: true, expanded };
        }

        let distance = here.distance_to(target);
        if best.is_none() || distance < best_distance {
            let path = Arc::new(graph.path_to(id));
            on_progress(&path);
            best = Some(path);
            best_distance = distance;
        }

        graph.evaluate_boundary_node(0, filters);
        expanded += 1;
    }

    SearchOutcome { status: TaskStatus::Done, path: best, reached_target: false, expanded }
}

#[derive(Debug)]
struct Shared {
    start: TileCoord,
    target: TileCoord,
    status: AtomicStatus,
    path: Mutex<Option<Arc<Path>>>,
    reached_target: AtomicBool,
    cancel: CancelFlag,
}

impl Shared {
    fn publish(&self, path: &Arc<Path>) {
        *self.path.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(path));
    }
}

/// Direct search running on its own thread. Cheap to clone; clones share state.
#[derive(Clone, Debug)]
pub struct DirectSearchTask {
    shared: Arc<Shared>,
}

impl DirectSearchTask {
    /// Starts the worker immediately. `signal` is notified once the task is final.
    pub fn spawn(
        world: Arc<WorldMap>,
        filters: Filters,
        start: TileCoord,
        target: TileCoord,
        signal: Option<ProgressSignal>,
    ) -> Self {
        let shared = Arc::new(Shared {
            start,
            target,
            status: AtomicStatus::new(TaskStatus::Calculating),
            path: Mutex::new(None),
            reached_target: AtomicBool::new(false),
            cancel: CancelFlag::new(),
        });

        let worker = Arc::clone(&shared);
        let worker_signal = signal.clone();
        let spawned = thread::Builder::new().name("direct-search".into()).spawn(move || {
            let outcome = search(&world, &filters, worker.start, worker.target, &worker.cancel, |p| worker.publish(p));
            worker.reached_target.store(outcome.reached_target, Ordering::Release);
            worker.status.transition(outcome.status);
            log::debug!(
                "direct search {} -> {}: {:?} after {} expansions (reached={}, movements={})",
                worker.start,
                worker.target,
                worker.status.load(),
                outcome.expanded,
                outcome.reached_target,
                outcome.path.as_ref().map(|p| p.len()).unwrap_or(0)
            );
            if let Some(s) = worker_signal {
                s.notify();
            }
        });

        if let Err(err) = spawned {
            log::error!("direct search {} -> {}: failed to spawn worker: {}", start, target, err);
            shared.status.transition(TaskStatus::Cancelled);
            if let Some(s) = signal {
                s.notify();
            }
        }

        Self { shared }
    }

    /// Whether the final path ends on the target (false while running or after an exhausted search).
    pub fn reached_target(&self) -> bool {
        self.status() == TaskStatus::Done && self.shared.reached_target.load(Ordering::Acquire)
    }
}

impl PathfinderTask for DirectSearchTask {
    fn start(&self) -> TileCoord {
        self.shared.start
    }

    fn target(&self) -> TileCoord {
        self.shared.target
    }

    fn path(&self) -> Option<Arc<Path>> {
        self.shared.path.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn status(&self) -> TaskStatus {
        self.shared.status.load()
    }

    fn cancel(&self) {
        self.shared.cancel.cancel();
        self.shared.status.transition(TaskStatus::Cancelled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathfinder::collision_map::CollisionMapBuilder;
    use crate::pathfinder::task::wait_until_final;
    use std::time::Duration;

    fn t(x: i32, y: i32) -> TileCoord {
        TileCoord::new(x, y, 0)
    }

    fn open_world() -> WorldMap {
        let mut b = CollisionMapBuilder::new();
        b.open_area(0, 0, 0, 20, 20);
        WorldMap::new(b.build(), Vec::new())
    }

    #[test]
    fn reaches_target_and_reports_monotonic_progress() {
        let world = open_world();
        let mut distances = Vec::new();
        let out = search(&world, &Filters::default(), t(2, 2), t(12, 7), &CancelFlag::new(), |p| {
            distances.push(p.destination().distance_to(t(12, 7)));
        });
        assert_eq!(out.status, TaskStatus::Done);
        assert!(out.reached_target);
        let path = out.path.unwrap();
        assert_eq!(path.origin(), t(2, 2));
        assert_eq!(path.destination(), t(12, 7));
        assert_eq!(path.len(), 10);
        assert!(world.is_path_valid(&path));
        assert!(distances.windows(2).all(|w| w[1] < w[0] || w[1] == 0));
    }

    #[test]
    fn start_equals_target_is_a_single_self_walk() {
        let world = open_world();
        let out = search(&world, &Filters::default(), t(3, 3), t(3, 3), &CancelFlag::new(), |_| {});
        let path = out.path.unwrap();
        assert_eq!(path.len(), 1);
        assert!(path.movements()[0].is_stationary());
    }

    #[test]
    fn exhausted_frontier_keeps_best_effort() {
        let world = open_world();
        let out = search(&world, &Filters::default(), t(1, 1), t(25, 1), &CancelFlag::new(), |_| {});
        assert_eq!(out.status, TaskStatus::Done);
        assert!(!out.reached_target);
        assert_eq!(out.path.unwrap().destination().x, 20);
    }

    #[test]
    fn pre_cancelled_search_stops_immediately() {
        let world = open_world();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let out = search(&world, &Filters::default(), t(1, 1), t(9, 9), &cancel, |_| {});
        assert_eq!(out.status, TaskStatus::Cancelled);
        assert!(out.path.is_none());
        assert_eq!(out.expanded, 0);
    }

    #[test]
    fn threaded_task_finishes_and_notifies() {
        let world = Arc::new(open_world());
        let signal = ProgressSignal::new();
        let seen = signal.generation();
        let task = DirectSearchTask::spawn(world, Filters::default(), t(0, 0), t(20, 20), Some(signal.clone()));
        assert!(wait_until_final(&task, Duration::from_secs(10)));
        assert_eq!(task.status(), TaskStatus::Done);
        assert!(task.reached_target());
        assert_eq!(task.path().unwrap().destination(), t(20, 20));
        assert!(signal.generation() > seen);
    }
}
