use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::models::{TileCoord, Transport};
use super::node_graph::{Filters, NodeGraph};
use super::world_map::WorldMap;
use crate::db;

pub type SectionId = usize;

/// Partition of the walkable world into walking-only connected components.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SectionMapper {
    sections: Vec<Vec<TileCoord>>,
    index: HashMap<TileCoord, SectionId>,
}

impl SectionMapper {
    /// Flood fills from every transport origin and destination, in transport order.
    pub fn build(world: &WorldMap) -> Self {
        let mut mapper = Self::default();
        let filters = Filters::walking_only();
        for t in world.transports() {
            for seed in [t.origin, t.destination] {
                if mapper.index.contains_key(&seed) {
                    continue;
                }
                let mut graph = NodeGraph::new(world);
                graph.push_seed(seed);
                while graph.evaluate_boundary_node(0, &filters).is_some() {}
                let mut tiles: Vec<TileCoord> = graph.into_visited().into_iter().collect();
                tiles.sort();
                mapper.push_section(tiles);
            }
        }
        log::info!(
            "sections: built {} sections covering {} tiles from {} transports",
            mapper.len(),
            mapper.index.len(),
            world.transports().len()
        );
        mapper
    }

    fn push_section(&mut self, tiles: Vec<TileCoord>) {
        let id = self.sections.len();
        for c in &tiles {
            let previous = self.index.insert(*c, id);
            debug_assert!(previous.is_none(), "walking connectivity is symmetric");
        }
        self.sections.push(tiles);
    }

    /// Rebuilds a mapper from stored coordinate sets; a coordinate in two sections is an error.
    pub fn from_sections(sections: Vec<Vec<TileCoord>>) -> Result<Self> {
        let mut index = HashMap::new();
        for (id, tiles) in sections.iter().enumerate() {
            if tiles.is_empty() {
                bail!("section {} is empty", id);
            }
            for c in tiles {
                if let Some(other) = index.insert(*c, id) {
                    bail!("tile {} belongs to sections {} and {}", c, other, id);
                }
            }
        }
        Ok(Self { sections, index })
    }

    /// Every transport endpoint of `world` must have a section.
    pub fn validate_covers(&self, world: &WorldMap) -> Result<()> {
        for t in world.transports() {
            for c in [t.origin, t.destination] {
                if self.section_of(c).is_none() {
                    bail!("section partition does not cover transport endpoint {}", c);
                }
            }
        }
        Ok(())
    }

    pub fn section_of(&self, c: TileCoord) -> Option<SectionId> {
        self.index.get(&c).copied()
    }

    pub fn sections_of(&self, t: &Transport) -> (Option<SectionId>, Option<SectionId>) {
        (self.section_of(t.origin), self.section_of(t.destination))
    }

    pub fn section(&self, id: SectionId) -> &[TileCoord] {
        &self.sections[id]
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn tile_count(&self) -> usize {
        self.index.len()
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &self.sections)
            .with_context(|| format!("write sections to {}", path.display()))?;
        writer.flush()?;
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        let sections: Vec<Vec<TileCoord>> = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parse sections JSON {}", path.display()))?;
        let mapper = Self::from_sections(sections).with_context(|| format!("load sections {}", path.display()))?;
        log::info!("sections: loaded {} sections from {}", mapper.len(), path.display());
        Ok(mapper)
    }

    /// Replaces the stored partition in one transaction.
    pub fn save_db(&self, conn: &mut Connection) -> Result<usize> {
        db::with_tx(conn, |tx| {
            tx.execute("DELETE FROM sections", [])?;
            let mut stmt = tx.prepare("INSERT INTO sections(section_id, x, y, plane) VALUES (?1, ?2, ?3, ?4)")?;
            let mut rows = 0usize;
            for (id, tiles) in self.sections.iter().enumerate() {
                for c in tiles {
                    stmt.execute(rusqlite::params![id as i64, c.x, c.y, c.plane])?;
                    rows += 1;
                }
            }
            db::set_meta(tx, "section_count", &self.sections.len().to_string())?;
            Ok(rows)
        })
    }

    pub fn load_db(conn: &Connection) -> Result<Self> {
        let mut stmt = conn.prepare("SELECT section_id, x, y, plane FROM sections ORDER BY section_id, x, y, plane")?;
        let mut rows = stmt.query([])?;
        let mut sections: Vec<Vec<TileCoord>> = Vec::new();
        while let Some(row) = rows.next()? {
            let id: i64 = row.get(0)?;
            let c = TileCoord::new(row.get(1)?, row.get(2)?, row.get(3)?);
            let id = usize::try_from(id).with_context(|| format!("negative section id {}", id))?;
            if id > sections.len() {
                bail!("section ids are not contiguous: {} follows {}", id, sections.len());
            }
            if id == sections.len() {
                sections.push(Vec::new());
            }
            sections[id].push(c);
        }
        if let Some(expected) = db::get_meta(conn, "section_count")? {
            let expected: usize = expected.parse().context("parse meta section_count")?;
            if expected != sections.len() {
                bail!("meta lists {} sections, table holds {}", expected, sections.len());
            }
        }
        Self::from_sections(sections)
    }
}
