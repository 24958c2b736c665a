use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use super::models::{Movement, Path, TileCoord, Transport};
use super::movement_policy::{is_in_wilderness, MovementPolicy};
use super::neighbor_policy::EXPANSION_ORDER;
use super::section_mapper::SectionMapper;
use super::world_map::WorldMap;

pub type NodeId = usize;

/// Search-tree element; `previous` points at the parent inside the owning graph's arena.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Node {
    pub movement: Movement,
    pub previous: Option<NodeId>,
}

impl Node {
    pub fn position(&self) -> TileCoord {
        self.movement.destination()
    }
}

/// Predicate over candidate tiles.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WalkFilter {
    AvoidWilderness,
}

impl WalkFilter {
    pub fn allows(&self, c: TileCoord) -> bool {
        match self {
            WalkFilter::AvoidWilderness => !is_in_wilderness(c),
        }
    }
}

/// Predicate over candidate transports.
#[derive(Clone, Debug)]
pub enum TransportFilter {
    Never,
    Capabilities(MovementPolicy),
    /// Transports staying inside one section, plus agility shortcuts.
    LocalToSection(Arc<SectionMapper>),
}

impl TransportFilter {
    pub fn allows(&self, t: &Transport) -> bool {
        match self {
            TransportFilter::Never => false,
            TransportFilter::Capabilities(policy) => policy.can_use_transport(t),
            TransportFilter::LocalToSection(sections) => {
                if t.is_agility_shortcut() {
                    return true;
                }
                match sections.sections_of(t) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
        }
    }
}

/// Filters applied during expansion; every listed filter must pass.
#[derive(Clone, Debug, Default)]
pub struct Filters {
    pub walk: Vec<WalkFilter>,
    pub transport: Vec<TransportFilter>,
}

impl Filters {
    /// Walking-only connectivity, used for section flood fills.
    pub fn walking_only() -> Self {
        Self { walk: Vec::new(), transport: vec![TransportFilter::Never] }
    }

    /// Capability gate plus wilderness avoidance when the trip is not wilderness bound.
    pub fn for_trip(policy: &MovementPolicy, start: TileCoord, target: TileCoord) -> Self {
        let mut walk = Vec::new();
        if policy.avoids_wilderness_between(start, target) {
            walk.push(WalkFilter::AvoidWilderness);
        }
        Self { walk, transport: vec![TransportFilter::Capabilities(policy.clone())] }
    }

    pub fn with_transport(mut self, filter: TransportFilter) -> Self {
        self.transport.push(filter);
        self
    }

    pub fn allows_tile(&self, c: TileCoord) -> bool {
        self.walk.iter().all(|f| f.allows(c))
    }

    /// Tile filters also apply to where the transport lands.
    pub fn allows_transport(&self, t: &Transport) -> bool {
        self.transport.iter().all(|f| f.allows(t)) && self.allows_tile(t.destination)
    }
}

/// FIFO frontier over an arena of nodes, plus the visited set.
pub struct NodeGraph<'w> {
    world: &'w WorldMap,
    nodes: Vec<Node>,
    boundary: VecDeque<NodeId>,
    visited: HashSet<TileCoord>,
}

impl<'w> NodeGraph<'w> {
    pub fn new(world: &'w WorldMap) -> Self {
        Self { world, nodes: Vec::new(), boundary: VecDeque::new(), visited: HashSet::new() }
    }

    /// Adds a root node (degenerate self-walk) and marks its tile visited.
    pub fn push_seed(&mut self, c: TileCoord) -> NodeId {
        self.visited.insert(c);
        self.push_node(Node { movement: Movement::Walk { origin: c, destination: c }, previous: None })
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(node);
        self.boundary.push_back(id);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn boundary_node(&self, index: usize) -> Option<NodeId> {
        self.boundary.get(index).copied()
    }

    pub fn boundary_len(&self) -> usize {
        self.boundary.len()
    }

    pub fn is_boundary_empty(&self) -> bool {
        self.boundary.is_empty()
    }

    pub fn visited(&self) -> &HashSet<TileCoord> {
        &self.visited
    }

    pub fn into_visited(self) -> HashSet<TileCoord> {
        self.visited
    }

    /// Removes the frontier node at `index` and appends its unvisited neighbours:
    /// walking steps in expansion order first, then transports leaving the tile.
    pub fn evaluate_boundary_node(&mut self, index: usize, filters: &Filters) -> Option<NodeId> {
        let id = self.boundary.remove(index)?;
        let here = self.nodes[id].position();

        for dir in EXPANSION_ORDER {
            if !self.world.is_open(here, dir) {
                continue;
            }
            let next = dir.step(here);
            if !filters.allows_tile(next) || !self.visited.insert(next) {
                continue;
            }
            self.push_node(Node { movement: Movement::Walk { origin: here, destination: next }, previous: Some(id) });
        }

        let world = self.world;
        for t in world.transports_from(here) {
            if !filters.allows_transport(t) || !self.visited.insert(t.destination) {
                continue;
            }
            self.push_node(Node { movement: Movement::Transport(*t), previous: Some(id) });
        }
        Some(id)
    }

    /// Walks parents back to the root. The root self-walk is kept only when it is the whole path.
    pub fn path_to(&self, id: NodeId) -> Path {
        let mut movements = Vec::new();
        let mut cursor = Some(id);
        while let Some(cur) = cursor {
            let node = &self.nodes[cur];
            if node.previous.is_some() || movements.is_empty() {
                movements.push(node.movement);
            }
            cursor = node.previous;
        }
        movements.reverse();
        Path::new(movements)
    }
}
