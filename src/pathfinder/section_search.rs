use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use super::models::{TileCoord, Transport};
use super::movement_policy::MovementPolicy;
use super::section_mapper::{SectionId, SectionMapper};
use super::task::{AtomicStatus, CancelFlag, ProgressSignal, TaskStatus};
use super::world_map::WorldMap;

/// Candidate chain of section-crossing transports from `origin` to `destination`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SectionRoute {
    pub origin: TileCoord,
    pub destination: TileCoord,
    pub transports: Vec<Transport>,
}

impl SectionRoute {
    /// Plane-ignoring walking distance between hops; a ranking heuristic only.
    pub fn length(&self) -> i32 {
        let (first, last) = match (self.transports.first(), self.transports.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return self.origin.distance_to_2d(self.destination),
        };
        let gaps: i32 = self
            .transports
            .windows(2)
            .map(|w| w[0].destination.distance_to_2d(w[1].origin))
            .sum();
        self.origin.distance_to_2d(first.origin) + gaps + last.destination.distance_to_2d(self.destination)
    }
}

struct SectionNode {
    section: SectionId,
    previous: Option<usize>,
    transport: Option<Transport>,
}

fn transport_chain(nodes: &[SectionNode], mut cursor: usize) -> Vec<Transport> {
    let mut chain = Vec::new();
    loop {
        let node = &nodes[cursor];
        if let Some(t) = node.transport {
            chain.push(t);
        }
        match node.previous {
            Some(p) => cursor = p,
            None => break,
        }
    }
    chain.reverse();
    chain
}

/// Breadth-first search over the section graph. Returns `Cancelled` with no
/// routes when either endpoint has no section or the flag is raised.
pub fn find_routes(
    world: &WorldMap,
    sections: &SectionMapper,
    policy: &MovementPolicy,
    start: TileCoord,
    target: TileCoord,
    cancel: &CancelFlag,
) -> (TaskStatus, Vec<SectionRoute>) {
    let (start_section, target_section) = match (sections.section_of(start), sections.section_of(target)) {
        (Some(s), Some(t)) => (s, t),
        _ => return (TaskStatus::Cancelled, Vec::new()),
    };

    // Section-crossing edges the player may use, grouped by origin section in transport order.
    let mut edges: HashMap<SectionId, Vec<(Transport, SectionId)>> = HashMap::new();
    for t in world.transports() {
        match sections.sections_of(t) {
            (Some(from), Some(to)) if from != to => {
                if policy.can_use_transport(t) {
                    edges.entry(from).or_default().push((*t, to));
                }
            }
            (Some(_), Some(_)) => {}
            _ => log::debug!("section search: transport {} -> {} has no section, skipped", t.origin, t.destination),
        }
    }

    let mut nodes = vec![SectionNode { section: start_section, previous: None, transport: None }];
    let mut boundary = VecDeque::from([0usize]);
    let mut visited = HashSet::from([start_section]);
    let mut routes = Vec::new();

    while let Some(current) = boundary.pop_front() {
        if cancel.is_cancelled() {
            return (TaskStatus::Cancelled, routes);
        }
        let section = nodes[current].section;
        let Some(outgoing) = edges.get(&section) else { continue };
        for (t, to) in outgoing {
            if *to == target_section {
                let mut transports = transport_chain(&nodes, current);
                transports.push(*t);
                routes.push(SectionRoute { origin: start, destination: target, transports });
            } else if visited.insert(*to) {
                nodes.push(SectionNode { section: *to, previous: Some(current), transport: Some(*t) });
                boundary.push_back(nodes.len() - 1);
            }
        }
    }
    (TaskStatus::Done, routes)
}

#[derive(Debug)]
struct Shared {
    start: TileCoord,
    target: TileCoord,
    status: AtomicStatus,
    routes: Mutex<Vec<SectionRoute>>,
    cancel: CancelFlag,
}

/// `find_routes` on a worker thread.
#[derive(Clone, Debug)]
pub struct SectionRouteSearch {
    shared: Arc<Shared>,
}

impl SectionRouteSearch {
    pub fn spawn(
        world: Arc<WorldMap>,
        sections: Arc<SectionMapper>,
        policy: MovementPolicy,
        start: TileCoord,
        target: TileCoord,
        signal: Option<ProgressSignal>,
    ) -> Self {
        let shared = Arc::new(Shared {
            start,
            target,
            status: AtomicStatus::new(TaskStatus::Calculating),
            routes: Mutex::new(Vec::new()),
            cancel: CancelFlag::new(),
        });

        let worker = Arc::clone(&shared);
        let worker_signal = signal.clone();
        let spawned = thread::Builder::new().name("section-search".into()).spawn(move || {
            let (status, routes) = find_routes(&world, &sections, &policy, worker.start, worker.target, &worker.cancel);
            log::debug!("section search {} -> {}: {:?} with {} routes", worker.start, worker.target, status, routes.len());
            *worker.routes.lock().unwrap_or_else(PoisonError::into_inner) = routes;
            worker.status.transition(status);
            if let Some(s) = worker_signal {
                s.notify();
            }
        });

        if let Err(err) = spawned {
            log::error!("section search {} -> {}: failed to spawn worker: {}", start, target, err);
            shared.status.transition(TaskStatus::Cancelled);
            if let Some(s) = signal {
                s.notify();
            }
        }
        Self { shared }
    }

    pub fn start(&self) -> TileCoord {
        self.shared.start
    }

    pub fn target(&self) -> TileCoord {
        self.shared.target
    }

    pub fn status(&self) -> TaskStatus {
        self.shared.status.load()
    }

    pub fn cancel(&self) {
        self.shared.cancel.cancel();
        self.shared.status.transition(TaskStatus::Cancelled);
    }

    /// Routes found; empty until the search is Done.
    pub fn routes(&self) -> Vec<SectionRoute> {
        self.shared.routes.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
