use anyhow::{anyhow, bail, Context, Result};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::models::TileCoord;
use super::neighbor_policy::{OrdinalDirection, EXPANSION_ORDER};

pub const REGION_SIZE: i32 = 64;
pub const PLANES: i32 = 4;
const FLAG_COUNT: usize = 2;
const FLAG_NORTH: usize = 0;
const FLAG_EAST: usize = 1;
/// Size of a fully populated region blob.
pub const REGION_BYTES: usize = (REGION_SIZE * REGION_SIZE * PLANES) as usize * FLAG_COUNT / 8;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RegionId {
    pub x: i32,
    pub y: i32,
}

impl RegionId {
    pub fn containing(c: TileCoord) -> Self {
        Self { x: c.x.div_euclid(REGION_SIZE), y: c.y.div_euclid(REGION_SIZE) }
    }
}

/// Region files are named `<rx>_<ry>`; anything after a dot is ignored.
pub fn parse_region_name(name: &str) -> Result<RegionId> {
    let stem = name.split('.').next().unwrap_or(name);
    let (x, y) = stem
        .split_once('_')
        .ok_or_else(|| anyhow!("region name '{}' is not of the form <x>_<y>", name))?;
    let x = x.trim().parse::<i32>().with_context(|| format!("parse region x in '{}'", name))?;
    let y = y.trim().parse::<i32>().with_context(|| format!("parse region y in '{}'", name))?;
    Ok(RegionId { x, y })
}

#[derive(Clone, Debug)]
struct RegionFlags {
    bits: Vec<u8>,
}

impl RegionFlags {
    fn empty() -> Self {
        Self { bits: vec![0; REGION_BYTES] }
    }

    /// Little-endian bitset; serializers trim trailing zero bytes, so short blobs are padded.
    fn decode(blob: &[u8]) -> Result<Self> {
        if blob.len() > REGION_BYTES {
            bail!("region blob has {} bytes, at most {} expected", blob.len(), REGION_BYTES);
        }
        let mut bits = blob.to_vec();
        bits.resize(REGION_BYTES, 0);
        Ok(Self { bits })
    }

    fn encode(&self) -> Vec<u8> {
        let used = self.bits.iter().rposition(|b| *b != 0).map(|i| i + 1).unwrap_or(0);
        self.bits[..used].to_vec()
    }

    fn index(local_x: i32, local_y: i32, plane: i32, flag: usize) -> usize {
        ((plane * REGION_SIZE * REGION_SIZE + local_y * REGION_SIZE + local_x) as usize) * FLAG_COUNT + flag
    }

    fn get(&self, index: usize) -> bool {
        self.bits[index / 8] & (1 << (index % 8)) != 0
    }

    fn set(&mut self, index: usize, value: bool) {
        if value {
            self.bits[index / 8] |= 1 << (index % 8);
        } else {
            self.bits[index / 8] &= !(1 << (index % 8));
        }
    }
}

/// Two bits per tile: open to the north and open to the east. Every other
/// direction is derived from the neighbouring tile's bits.
#[derive(Clone, Debug, Default)]
pub struct CollisionMap {
    regions: HashMap<RegionId, RegionFlags>,
}

impl CollisionMap {
    pub fn from_regions<I>(blobs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (RegionId, Vec<u8>)>,
    {
        let mut regions = HashMap::new();
        for (id, blob) in blobs {
            let flags = RegionFlags::decode(&blob)
                .with_context(|| format!("decode region {}_{}", id.x, id.y))?;
            if regions.insert(id, flags).is_some() {
                bail!("region {}_{} supplied more than once", id.x, id.y);
            }
        }
        Ok(Self { regions })
    }

    /// Loads every region file of a directory, decoding them in parallel.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            bail!("collision directory not found: {}", dir.display());
        }
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("read collision directory {}", dir.display()))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        files.sort();

        let decoded = files
            .par_iter()
            .map(|path| -> Result<(RegionId, Vec<u8>)> {
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .ok_or_else(|| anyhow!("unreadable region file name {}", path.display()))?;
                let id = parse_region_name(name)?;
                let blob = fs::read(path).with_context(|| format!("read region file {}", path.display()))?;
                Ok((id, blob))
            })
            .collect::<Result<Vec<_>>>()?;

        let map = Self::from_regions(decoded)?;
        log::info!("collision map: loaded {} regions from {}", map.region_count(), dir.display());
        Ok(map)
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Re-encodes every region, ordered by region id.
    pub fn region_blobs(&self) -> Vec<(RegionId, Vec<u8>)> {
        let mut out: Vec<(RegionId, Vec<u8>)> =
            self.regions.iter().map(|(id, flags)| (*id, flags.encode())).collect();
        out.sort_by_key(|(id, _)| *id);
        out
    }

    fn flag(&self, c: TileCoord, flag: usize) -> bool {
        if c.plane < 0 || c.plane >= PLANES {
            return false;
        }
        match self.regions.get(&RegionId::containing(c)) {
            Some(region) => region.get(RegionFlags::index(
                c.x.rem_euclid(REGION_SIZE),
                c.y.rem_euclid(REGION_SIZE),
                c.plane,
                flag,
            )),
            None => false,
        }
    }

    fn edge_open(&self, c: TileCoord, dir: OrdinalDirection) -> bool {
        match dir {
            OrdinalDirection::North => self.flag(c, FLAG_NORTH),
            OrdinalDirection::East => self.flag(c, FLAG_EAST),
            OrdinalDirection::South => self.flag(c.translate(0, -1), FLAG_NORTH),
            OrdinalDirection::West => self.flag(c.translate(-1, 0), FLAG_EAST),
            _ => false,
        }
    }

    /// Whether a single step from `c` in `dir` is possible. A diagonal step needs
    /// one of its two L-shaped detours to be open so corners are never cut.
    pub fn is_open(&self, c: TileCoord, dir: OrdinalDirection) -> bool {
        match dir.components() {
            None => self.edge_open(c, dir),
            Some((horizontal, vertical)) => {
                let via_horizontal =
                    self.edge_open(c, horizontal) && self.edge_open(horizontal.step(c), vertical);
                let via_vertical =
                    self.edge_open(c, vertical) && self.edge_open(vertical.step(c), horizontal);
                via_horizontal || via_vertical
            }
        }
    }

    /// A tile is blocked when no direction at all leads out of it.
    pub fn is_blocked(&self, c: TileCoord) -> bool {
        !EXPANSION_ORDER.iter().any(|d| self.is_open(c, *d))
    }
}

/// Programmatic construction of a collision map (tooling and tests).
#[derive(Clone, Debug, Default)]
pub struct CollisionMapBuilder {
    map: CollisionMap,
}

impl CollisionMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_flag(&mut self, c: TileCoord, flag: usize, value: bool) {
        if c.plane < 0 || c.plane >= PLANES {
            log::warn!("collision builder: ignoring tile {} outside planes 0..{}", c, PLANES);
            return;
        }
        let region = self
            .map
            .regions
            .entry(RegionId::containing(c))
            .or_insert_with(RegionFlags::empty);
        region.set(
            RegionFlags::index(c.x.rem_euclid(REGION_SIZE), c.y.rem_euclid(REGION_SIZE), c.plane, flag),
            value,
        );
    }

    pub fn set_open_north(&mut self, c: TileCoord, open: bool) -> &mut Self {
        self.set_flag(c, FLAG_NORTH, open);
        self
    }

    pub fn set_open_east(&mut self, c: TileCoord, open: bool) -> &mut Self {
        self.set_flag(c, FLAG_EAST, open);
        self
    }

    /// Opens every edge between tiles of the inclusive rectangle; edges leaving it stay untouched.
    pub fn open_area(&mut self, plane: i32, min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> &mut Self {
        for x in min_x..=max_x {
            for y in min_y..=max_y {
                let c = TileCoord::new(x, y, plane);
                if y < max_y {
                    self.set_flag(c, FLAG_NORTH, true);
                }
                if x < max_x {
                    self.set_flag(c, FLAG_EAST, true);
                }
            }
        }
        self
    }

    /// Closes all four edges touching the tile.
    pub fn block_tile(&mut self, c: TileCoord) -> &mut Self {
        self.set_flag(c, FLAG_NORTH, false);
        self.set_flag(c, FLAG_EAST, false);
        self.set_flag(c.translate(0, -1), FLAG_NORTH, false);
        self.set_flag(c.translate(-1, 0), FLAG_EAST, false);
        self
    }

    pub fn build(self) -> CollisionMap {
        self.map
    }
}
