use anyhow::Result;

use crate::pathfinder::config::Config;
use crate::pathfinder::neighbor_policy::{OrdinalDirection, EXPANSION_ORDER};
use crate::pathfinder::{SectionMapper, TileCoord, Transport, WorldMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileReport {
    pub tile: TileCoord,
    pub blocked: bool,
    pub open: Vec<(OrdinalDirection, bool)>,
    pub section: Option<usize>,
    pub transports: Vec<Transport>,
    pub wilderness: bool,
}

pub fn inspect_tile(world: &WorldMap, sections: Option<&SectionMapper>, tile: TileCoord) -> TileReport {
    TileReport {
        tile,
        blocked: world.is_blocked(tile),
        open: EXPANSION_ORDER.iter().map(|d| (*d, world.is_open(tile, *d))).collect(),
        section: sections.and_then(|s| s.section_of(tile)),
        transports: world.transports_from(tile).to_vec(),
        wilderness: crate::pathfinder::movement_policy::is_in_wilderness(tile),
    }
}

pub fn cmd_inspect(cfg: &Config, tile: TileCoord) -> Result<()> {
    let world = super::load_world(cfg)?;
    // Only a stored partition is reported; inspecting never triggers a flood fill.
    let sections = super::load_stored_sections(cfg)?;

    let report = inspect_tile(&world, sections.as_ref(), tile);
    println!("Tile       : {}", report.tile);
    println!("Blocked    : {}", report.blocked);
    println!("Wilderness : {}", report.wilderness);
    match report.section {
        Some(id) => println!("Section    : {}", id),
        None => println!("Section    : -"),
    }
    for (dir, open) in &report.open {
        println!("  {:<10} {}", format!("{:?}", dir), if *open { "open" } else { "closed" });
    }
    if report.transports.is_empty() {
        println!("No transports start here");
    }
    for t in &report.transports {
        println!(
            "  transport -> {} (agility {}, ranged {}, strength {})",
            t.destination, t.agility_level, t.ranged_level, t.strength_level
        );
    }
    Ok(())
}
