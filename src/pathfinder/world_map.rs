use anyhow::Result;
use std::collections::HashMap;
use std::path::Path as FsPath;
use std::sync::Arc;

use super::collision_map::CollisionMap;
use super::models::{Movement, Path, TileCoord, Transport};
use super::neighbor_policy::OrdinalDirection;
use super::transports;

/// Collision data plus the transport table, indexed by origin.
#[derive(Clone, Debug, Default)]
pub struct WorldMap {
    collision: Arc<CollisionMap>,
    transports: Vec<Transport>,
    by_origin: HashMap<TileCoord, Vec<Transport>>,
}

impl WorldMap {
    pub fn new(collision: CollisionMap, transports: Vec<Transport>) -> Self {
        let mut world = Self { collision: Arc::new(collision), transports: Vec::new(), by_origin: HashMap::new() };
        let total = transports.len();
        for t in transports {
            world.add_transport(t);
        }
        if world.transports.len() != total {
            log::warn!("world map: dropped {} duplicate transports", total - world.transports.len());
        }
        world
    }

    pub fn load(collision_dir: &FsPath, transports_file: &FsPath) -> Result<Self> {
        let collision = CollisionMap::from_dir(collision_dir)?;
        let transports = transports::from_file(transports_file)?;
        Ok(Self::new(collision, transports))
    }

    pub fn collision(&self) -> &CollisionMap {
        &self.collision
    }

    pub fn is_blocked(&self, c: TileCoord) -> bool {
        self.collision.is_blocked(c)
    }

    pub fn is_open(&self, c: TileCoord, dir: OrdinalDirection) -> bool {
        self.collision.is_open(c, dir)
    }

    pub fn transports_from(&self, c: TileCoord) -> &[Transport] {
        self.by_origin.get(&c).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn transports(&self) -> &[Transport] {
        &self.transports
    }

    /// Registers a transport unless an equal one exists. Returns whether it was added.
    pub fn add_transport(&mut self, t: Transport) -> bool {
        let slot = self.by_origin.entry(t.origin).or_default();
        if slot.contains(&t) {
            return false;
        }
        slot.push(t);
        self.transports.push(t);
        true
    }

    /// Contiguous, every walk is a single open step (or the seed self-walk)
    /// and every transport movement is registered in this world.
    pub fn is_path_valid(&self, path: &Path) -> bool {
        if path.is_empty() || !path.is_contiguous() {
            return false;
        }
        path.movements().iter().all(|m| match m {
            Movement::Walk { origin, destination } => {
                if origin == destination {
                    return true;
                }
                if origin.distance_to(*destination) != 1 {
                    return false;
                }
                match OrdinalDirection::towards(*origin, *destination) {
                    Some(dir) => self.is_open(*origin, dir),
                    None => false,
                }
            }
            Movement::Transport(t) => self.transports_from(t.origin).contains(t),
        })
    }
}
