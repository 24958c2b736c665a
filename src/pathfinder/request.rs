use std::sync::Arc;

use super::config::Config;
use super::direct_search::DirectSearchTask;
use super::hierarchical_search::HierarchicalSearchTask;
use super::models::{Path, TileCoord, Transport};
use super::movement_policy::MovementPolicy;
use super::neighbor_policy::CARDINALS;
use super::node_graph::Filters;
use super::section_mapper::SectionMapper;
use super::supervisor::{TaskSupervisor, TickReport};
use super::task::{PathfinderTask, TaskStatus};
use super::world_map::WorldMap;

/// Nearest non-blocked tile, searching a square spiral (N, E, S, W, the leg
/// growing every second turn) until legs exceed `2 * radius + 1` tiles.
pub fn nearest_walkable(world: &WorldMap, c: TileCoord, radius: i32) -> Option<TileCoord> {
    if !world.is_blocked(c) {
        return Some(c);
    }
    let max_leg = 2 * radius.max(0) + 1;
    let mut pos = c;
    let mut leg = 1;
    let mut turns = 0;
    while leg <= max_leg {
        let dir = CARDINALS[turns % CARDINALS.len()];
        for _ in 0..leg {
            pos = dir.step(pos);
            if !world.is_blocked(pos) {
                return Some(pos);
            }
        }
        turns += 1;
        if turns % 2 == 0 {
            leg += 1;
        }
    }
    None
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TaskKind {
    Direct,
    Hierarchical,
}

/// Caller-side view of a requested path.
#[derive(Clone)]
pub struct PathHandle {
    task: Arc<dyn PathfinderTask>,
    kind: TaskKind,
    requested_start: TileCoord,
    requested_target: TileCoord,
}

impl PathHandle {
    pub fn current_path(&self) -> Option<Arc<Path>> {
        self.task.path()
    }

    pub fn is_final(&self) -> bool {
        self.task.is_final()
    }

    pub fn cancel(&self) {
        self.task.cancel()
    }

    pub fn status(&self) -> TaskStatus {
        self.task.status()
    }

    /// Snapped start actually searched from.
    pub fn start(&self) -> TileCoord {
        self.task.start()
    }

    /// Snapped target actually searched for.
    pub fn target(&self) -> TileCoord {
        self.task.target()
    }

    pub fn requested_start(&self) -> TileCoord {
        self.requested_start
    }

    pub fn requested_target(&self) -> TileCoord {
        self.requested_target
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn task(&self) -> &Arc<dyn PathfinderTask> {
        &self.task
    }
}

/// Owns the world snapshot, the section partition and the supervisor; one active request at a time.
pub struct PathRequester {
    world: Arc<WorldMap>,
    sections: Arc<SectionMapper>,
    supervisor: TaskSupervisor,
    snap_radius: i32,
    max_concurrent_routes: usize,
    active: Option<PathHandle>,
}

impl PathRequester {
    pub fn new(world: Arc<WorldMap>, sections: Arc<SectionMapper>, config: &Config) -> Self {
        Self {
            world,
            sections,
            supervisor: TaskSupervisor::new(config.stagnation_ticks()),
            snap_radius: config.snap_radius(),
            max_concurrent_routes: config.max_concurrent_routes(),
            active: None,
        }
    }

    pub fn world(&self) -> &Arc<WorldMap> {
        &self.world
    }

    pub fn sections(&self) -> &Arc<SectionMapper> {
        &self.sections
    }

    pub fn supervisor(&self) -> &TaskSupervisor {
        &self.supervisor
    }

    pub fn active(&self) -> Option<&PathHandle> {
        self.active.as_ref()
    }

    /// Supersedes any previous request. None when an endpoint has no walkable tile nearby.
    pub fn request_path(&mut self, start: TileCoord, target: TileCoord, policy: &MovementPolicy) -> Option<PathHandle> {
        if let Some(previous) = self.active.take() {
            previous.cancel();
        }

        let snapped_start = nearest_walkable(&self.world, start, self.snap_radius);
        let snapped_target = nearest_walkable(&self.world, target, self.snap_radius);
        let (Some(from), Some(to)) = (snapped_start, snapped_target) else {
            log::debug!("request {} -> {}: no walkable tile within {} tiles", start, target, self.snap_radius);
            return None;
        };

        let start_section = self.sections.section_of(from);
        let target_section = self.sections.section_of(to);
        let (kind, task): (TaskKind, Arc<dyn PathfinderTask>) = match (start_section, target_section) {
            (Some(a), Some(b)) if a != b => (
                TaskKind::Hierarchical,
                Arc::new(HierarchicalSearchTask::spawn(
                    Arc::clone(&self.world),
                    Arc::clone(&self.sections),
                    policy.clone(),
                    from,
                    to,
                    self.max_concurrent_routes,
                )),
            ),
            _ => (
                TaskKind::Direct,
                Arc::new(DirectSearchTask::spawn(
                    Arc::clone(&self.world),
                    Filters::for_trip(policy, from, to),
                    from,
                    to,
                    None,
                )),
            ),
        };
        log::debug!(
            "request {} -> {}: {:?} task, sections {:?} -> {:?}",
            from,
            to,
            kind,
            start_section,
            target_section
        );

        self.supervisor.register(Arc::clone(&task));
        let handle = PathHandle { task, kind, requested_start: start, requested_target: target };
        self.active = Some(handle.clone());
        Some(handle)
    }

    /// One game tick.
    pub fn tick(&mut self) -> TickReport {
        self.supervisor.evaluate()
    }

    /// Registers a transport for future requests; running searches keep their world snapshot.
    /// Transports added this way have no section and are only used by direct searches.
    pub fn add_transport(&mut self, t: Transport) -> bool {
        Arc::make_mut(&mut self.world).add_transport(t)
    }

    pub fn clear(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel();
        }
    }

    pub fn shutdown(&mut self) {
        self.clear();
        self.supervisor.cancel_all();
    }
}
