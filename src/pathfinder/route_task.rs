use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::direct_search::DirectSearchTask;
use super::models::{Movement, Path, TileCoord};
use super::node_graph::Filters;
use super::section_search::SectionRoute;
use super::task::{PathfinderTask, ProgressSignal, TaskStatus};
use super::world_map::WorldMap;

/// Finished segment searches keyed by (start, target), shared by the routes of one hierarchical task.
#[derive(Debug, Default)]
pub struct SegmentCache {
    tasks: Mutex<HashMap<(TileCoord, TileCoord), DirectSearchTask>>,
}

impl SegmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, start: TileCoord, target: TileCoord) -> Option<DirectSearchTask> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner).get(&(start, target)).cloned()
    }

    /// Only finished searches are kept; the first one stored for a key wins.
    pub fn insert(&self, task: &DirectSearchTask) {
        if task.status() != TaskStatus::Done {
            return;
        }
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((task.start(), task.target()))
            .or_insert_with(|| task.clone());
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
struct RouteState {
    status: TaskStatus,
    final_path: Option<Arc<Path>>,
}

/// Evaluates one section route: a direct search per gap between consecutive
/// transports, stitched together with the route's transports once every
/// segment has reached its target.
#[derive(Debug)]
pub struct RouteTask {
    route: SectionRoute,
    segments: Vec<DirectSearchTask>,
    cache: Arc<SegmentCache>,
    state: Mutex<RouteState>,
}

impl RouteTask {
    pub fn new(
        route: SectionRoute,
        world: &Arc<WorldMap>,
        filters: &Filters,
        cache: Arc<SegmentCache>,
        signal: Option<ProgressSignal>,
    ) -> Self {
        let mut endpoints = Vec::with_capacity(route.transports.len() + 1);
        let mut from = route.origin;
        for t in &route.transports {
            endpoints.push((from, t.origin));
            from = t.destination;
        }
        endpoints.push((from, route.destination));

        let segments = endpoints
            .into_iter()
            .map(|(start, target)| match cache.get(start, target) {
                Some(cached) => {
                    if let Some(s) = &signal {
                        s.notify();
                    }
                    cached
                }
                None => DirectSearchTask::spawn(Arc::clone(world), filters.clone(), start, target, signal.clone()),
            })
            .collect();

        Self {
            route,
            segments,
            cache,
            state: Mutex::new(RouteState { status: TaskStatus::Calculating, final_path: None }),
        }
    }

    pub fn route(&self) -> &SectionRoute {
        &self.route
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    fn refresh(&self, state: &mut RouteState) {
        if state.status.is_terminal() {
            return;
        }
        let failed = self.segments.iter().any(|s| match s.status() {
            TaskStatus::Cancelled => true,
            TaskStatus::Done => !s.reached_target(),
            _ => false,
        });
        if failed {
            self.segments.iter().for_each(|s| s.cancel());
            self.segments.iter().for_each(|s| self.cache.insert(s));
            state.status = TaskStatus::Cancelled;
            return;
        }
        if self.segments.iter().all(|s| s.status() == TaskStatus::Done) {
            self.segments.iter().for_each(|s| self.cache.insert(s));
            state.final_path = self.compose(self.segments.len());
            state.status = match state.final_path {
                Some(_) => TaskStatus::Done,
                None => TaskStatus::Cancelled,
            };
        }
    }

    /// Joins the paths of the first `complete` segments with their transports,
    /// followed by the best effort of the next segment when there is one.
    fn compose(&self, complete: usize) -> Option<Arc<Path>> {
        let mut movements: Vec<Movement> = Vec::new();
        for (i, segment) in self.segments.iter().enumerate().take(complete) {
            let path = segment.path()?;
            movements.extend(path.movements().iter().filter(|m| !m.is_stationary()).copied());
            if let Some(t) = self.route.transports.get(i) {
                movements.push(Movement::Transport(*t));
            }
        }
        if let Some(next) = self.segments.get(complete) {
            if let Some(path) = next.path() {
                movements.extend(path.movements().iter().filter(|m| !m.is_stationary()).copied());
            }
        }
        if movements.is_empty() {
            // Start equals target with no transport in between.
            return self.segments.first().and_then(|s| s.path());
        }
        Some(Arc::new(Path::new(movements)))
    }
}

impl PathfinderTask for RouteTask {
    fn start(&self) -> TileCoord {
        self.route.origin
    }

    fn target(&self) -> TileCoord {
        self.route.destination
    }

    fn path(&self) -> Option<Arc<Path>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.refresh(&mut state);
        match state.status {
            TaskStatus::Done => state.final_path.clone(),
            TaskStatus::Cancelled => None,
            _ => {
                let complete = self.segments.iter().take_while(|s| s.reached_target()).count();
                self.compose(complete)
            }
        }
    }

    fn status(&self) -> TaskStatus {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.refresh(&mut state);
        state.status
    }

    fn cancel(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.segments.iter().for_each(|s| s.cancel());
        if !state.status.is_terminal() {
            state.status = TaskStatus::Cancelled;
        }
    }
}
