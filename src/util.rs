use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use crate::pathfinder::TileCoord;

pub const COLLISION_REL_PATH: &str = "data/collision-map";
pub const TRANSPORTS_REL_PATH: &str = "data/transports.txt";
pub const SECTIONS_REL_PATH: &str = "data/sections.json";

pub fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// (collision dir, transports file, sections JSON) under the repo root.
pub fn default_paths() -> (PathBuf, PathBuf, PathBuf) {
    let root = repo_root();
    (root.join(COLLISION_REL_PATH), root.join(TRANSPORTS_REL_PATH), root.join(SECTIONS_REL_PATH))
}

/// Parses `x,y,plane` (spaces allowed around the commas).
pub fn parse_coord(input: &str) -> Result<TileCoord> {
    let parts: Vec<&str> = input.split(',').map(|p| p.trim()).collect();
    if parts.len() != 3 {
        bail!("expected x,y,plane but got '{}'", input);
    }
    let x = parts[0].parse::<i32>().with_context(|| format!("parse x in '{}'", input))?;
    let y = parts[1].parse::<i32>().with_context(|| format!("parse y in '{}'", input))?;
    let plane = parts[2].parse::<i32>().with_context(|| format!("parse plane in '{}'", input))?;
    Ok(TileCoord::new(x, y, plane))
}
