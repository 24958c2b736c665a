use anyhow::{Context, Result};
use std::path::Path;

use crate::db;
use crate::pathfinder::config::Config;
use crate::pathfinder::{SectionMapper, WorldMap};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildSectionsStats {
    pub sections: usize,
    pub tiles: usize,
    pub largest: usize,
    pub transports: usize,
    pub db_rows: Option<usize>,
}

pub fn cmd_build_sections(cfg: &Config) -> Result<BuildSectionsStats> {
    if let Some(dir) = &cfg.collision_dir {
        println!("Using collision dir : {}", dir.display());
    }
    if let Some(file) = &cfg.transports_file {
        println!("Using transports    : {}", file.display());
    }

    let world = super::load_world(cfg)?;
    let stats = build_and_store(&world, cfg.sections_file.as_deref(), cfg.sections_db.as_deref())?;

    println!(
        "Built {} sections covering {} tiles (largest {}) with {} transports",
        stats.sections, stats.tiles, stats.largest, stats.transports
    );
    if let Some(file) = &cfg.sections_file {
        println!("Sections JSON written to {}", file.display());
    }
    if let (Some(path), Some(rows)) = (&cfg.sections_db, stats.db_rows) {
        println!("Sections DB written to {} ({} rows)", path.display(), rows);
    }
    Ok(stats)
}

/// Flood fills `world` and writes the partition to whichever targets are given.
pub fn build_and_store(world: &WorldMap, json: Option<&Path>, db_path: Option<&Path>) -> Result<BuildSectionsStats> {
    let mapper = SectionMapper::build(world);

    if let Some(path) = json {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        mapper.save_json(path)?;
    }

    let db_rows = match db_path {
        Some(path) => {
            let mut conn = db::open_rw(path)?;
            let rows = mapper
                .save_db(&mut conn)
                .with_context(|| format!("store sections in {}", path.display()))?;
            Some(rows)
        }
        None => None,
    };

    let largest = (0..mapper.len()).map(|id| mapper.section(id).len()).max().unwrap_or(0);
    Ok(BuildSectionsStats {
        sections: mapper.len(),
        tiles: mapper.tile_count(),
        largest,
        transports: world.transports().len(),
        db_rows,
    })
}
