pub mod collision_map;
pub mod config;
pub mod direct_search;
pub mod hierarchical_search;
pub mod logging;
pub mod models;
pub mod movement_policy;
pub mod neighbor_policy;
pub mod node_graph;
pub mod request;
pub mod route_task;
pub mod section_mapper;
pub mod section_search;
pub mod supervisor;
pub mod task;
pub mod transports;
pub mod world_map;

pub use models::{Movement, Path, TileCoord, Transport};
pub use movement_policy::MovementPolicy;
pub use request::{PathHandle, PathRequester};
pub use section_mapper::SectionMapper;
pub use task::{PathfinderTask, TaskStatus};
pub use world_map::WorldMap;
