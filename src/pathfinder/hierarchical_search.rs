use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use super::models::{Path, TileCoord};
use super::movement_policy::MovementPolicy;
use super::node_graph::{Filters, TransportFilter};
use super::route_task::{RouteTask, SegmentCache};
use super::section_mapper::SectionMapper;
use super::section_search::{SectionRoute, SectionRouteSearch};
use super::task::{AtomicStatus, CancelFlag, PathfinderTask, ProgressSignal, TaskStatus};
use super::world_map::WorldMap;

pub const MAX_CONCURRENT_ROUTES: usize = 5;
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// What the replacement rule needs to know about a route evaluation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Snapshot {
    pub status: TaskStatus,
    pub movements: Option<usize>,
}

impl Snapshot {
    pub fn of(task: &dyn PathfinderTask) -> Self {
        let status = task.status();
        Self { status, movements: task.path().map(|p| p.len()) }
    }
}

/// Whether `candidate` should become the active result.
pub fn should_replace(active: Option<Snapshot>, candidate: Snapshot) -> bool {
    let Some(active) = active else { return true };
    if candidate.status == TaskStatus::Cancelled {
        return false;
    }
    if active.status == TaskStatus::Cancelled {
        return true;
    }
    match (active.status == TaskStatus::Done, candidate.status == TaskStatus::Done) {
        (false, true) => true,
        (true, true) => match (active.movements, candidate.movements) {
            (Some(a), Some(c)) => c < a,
            (None, Some(_)) => true,
            _ => false,
        },
        _ => false,
    }
}

/// A running evaluation whose best effort is already longer than the finished active path is not worth finishing.
fn is_already_worse(active: Option<Snapshot>, running: Snapshot) -> bool {
    match (active, running.movements) {
        (Some(Snapshot { status: TaskStatus::Done, movements: Some(best) }), Some(current)) => current > best,
        _ => false,
    }
}

#[derive(Debug)]
struct Shared {
    start: TileCoord,
    target: TileCoord,
    status: AtomicStatus,
    active: Mutex<Option<Arc<RouteTask>>>,
    cancel: CancelFlag,
    signal: ProgressSignal,
}

impl Shared {
    fn active(&self) -> Option<Arc<RouteTask>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_active(&self, task: Arc<RouteTask>) {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
    }
}

/// Long-distance search: finds section routes, races their evaluations
/// (at most `max_concurrent` at a time, shortest heuristic first) and keeps
/// the best finished composite as the active result.
#[derive(Clone, Debug)]
pub struct HierarchicalSearchTask {
    shared: Arc<Shared>,
}

impl HierarchicalSearchTask {
    pub fn spawn(
        world: Arc<WorldMap>,
        sections: Arc<SectionMapper>,
        policy: MovementPolicy,
        start: TileCoord,
        target: TileCoord,
        max_concurrent: usize,
    ) -> Self {
        let shared = Arc::new(Shared {
            start,
            target,
            status: AtomicStatus::new(TaskStatus::Calculating),
            active: Mutex::new(None),
            cancel: CancelFlag::new(),
            signal: ProgressSignal::new(),
        });

        let worker = Arc::clone(&shared);
        let spawned = thread::Builder::new()
            .name("hierarchical-search".into())
            .spawn(move || run(&worker, world, sections, policy, max_concurrent.max(1)));
        if let Err(err) = spawned {
            log::error!("hierarchical search {} -> {}: failed to spawn worker: {}", start, target, err);
            shared.status.transition(TaskStatus::Cancelled);
        }
        Self { shared }
    }
}

fn wait_for_routes(shared: &Shared, search: &SectionRouteSearch, mut seen: u64) -> (Vec<SectionRoute>, u64) {
    while !search.status().is_terminal() {
        if shared.cancel.is_cancelled() {
            search.cancel();
            return (Vec::new(), seen);
        }
        seen = shared.signal.wait_for_change(seen, POLL_INTERVAL);
    }
    if search.status() != TaskStatus::Done {
        return (Vec::new(), seen);
    }
    let mut routes = search.routes();
    routes.sort_by_key(|r| r.length());
    (routes, seen)
}

fn run(
    shared: &Shared,
    world: Arc<WorldMap>,
    sections: Arc<SectionMapper>,
    policy: MovementPolicy,
    max_concurrent: usize,
) {
    let (start, target) = (shared.start, shared.target);
    let seen = shared.signal.generation();
    let section_search = SectionRouteSearch::spawn(
        Arc::clone(&world),
        Arc::clone(&sections),
        policy.clone(),
        start,
        target,
        Some(shared.signal.clone()),
    );
    log::debug!(
        "hierarchical search {} -> {}: sections {:?} -> {:?}",
        start,
        target,
        sections.section_of(start),
        sections.section_of(target)
    );

    let (routes, mut seen) = wait_for_routes(shared, &section_search, seen);
    let total_routes = routes.len();
    let mut routes: VecDeque<SectionRoute> = routes.into();

    let filters = Filters::for_trip(&policy, start, target)
        .with_transport(TransportFilter::LocalToSection(Arc::clone(&sections)));
    let cache = Arc::new(SegmentCache::new());
    let mut running: Vec<Arc<RouteTask>> = Vec::new();
    let mut explored = 0usize;

    while !shared.cancel.is_cancelled() && (!routes.is_empty() || !running.is_empty()) {
        while running.len() < max_concurrent {
            let Some(route) = routes.pop_front() else { break };
            running.push(Arc::new(RouteTask::new(
                route,
                &world,
                &filters,
                Arc::clone(&cache),
                Some(shared.signal.clone()),
            )));
            explored += 1;
        }

        let mut still_running = Vec::with_capacity(running.len());
        for task in running.drain(..) {
            let candidate = Snapshot::of(task.as_ref());
            let active = shared.active().map(|a| Snapshot::of(a.as_ref()));
            if candidate.status.is_terminal() {
                if should_replace(active, candidate) {
                    shared.set_active(task);
                }
                continue;
            }
            if is_already_worse(active, candidate) {
                task.cancel();
                continue;
            }
            if should_replace(active, candidate) {
                shared.set_active(Arc::clone(&task));
            }
            still_running.push(task);
        }
        running = still_running;

        let active_done = shared.active().map(|a| a.status() == TaskStatus::Done).unwrap_or(false);
        if active_done && !routes.is_empty() && shared.status.load() == TaskStatus::Calculating {
            shared.status.transition(TaskStatus::LookingForBetterPath);
        }

        if !running.is_empty() {
            seen = shared.signal.wait_for_change(seen, POLL_INTERVAL);
        }
    }

    if shared.cancel.is_cancelled() {
        running.iter().for_each(|t| t.cancel());
        section_search.cancel();
        shared.status.transition(TaskStatus::Cancelled);
    } else {
        shared.status.transition(TaskStatus::Done);
    }

    match shared.active().and_then(|a| a.path()) {
        Some(path) => log::debug!(
            "hierarchical search {} -> {}: {:?}, routes total {}, explored {}, path length {}",
            start,
            target,
            shared.status.load(),
            total_routes,
            explored,
            path.len()
        ),
        None => log::debug!(
            "hierarchical search {} -> {}: {:?}, no route found ({} routes)",
            start,
            target,
            shared.status.load(),
            total_routes
        ),
    }
}

impl PathfinderTask for HierarchicalSearchTask {
    fn start(&self) -> TileCoord {
        self.shared.start
    }

    fn target(&self) -> TileCoord {
        self.shared.target
    }

    fn path(&self) -> Option<Arc<Path>> {
        self.shared.active().and_then(|a| a.path())
    }

    fn status(&self) -> TaskStatus {
        self.shared.status.load()
    }

    fn cancel(&self) {
        self.shared.cancel.cancel();
        self.shared.status.transition(TaskStatus::Cancelled);
        self.shared.signal.notify();
    }
}
