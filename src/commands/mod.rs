use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::db;
use crate::pathfinder::config::Config;
use crate::pathfinder::{logging, SectionMapper, WorldMap};
use crate::util;

pub mod build_sections;
pub mod inspect;
pub mod route;

#[derive(Args, Debug, Clone, Default)]
pub struct CommonOpts {
    /// Directory of collision region files named <rx>_<ry> (default: repo_root/data/collision-map or PATHFINDER_COLLISION_DIR)
    #[arg(long = "collision-dir", global = true)]
    pub collision_dir: Option<PathBuf>,
    /// Tab-separated transport definitions (default: repo_root/data/transports.txt or PATHFINDER_TRANSPORTS)
    #[arg(long = "transports", global = true)]
    pub transports: Option<PathBuf>,
    /// Section partition as JSON (default: repo_root/data/sections.json or PATHFINDER_SECTIONS_FILE)
    #[arg(long = "sections-file", global = true)]
    pub sections_file: Option<PathBuf>,
    /// Section partition as SQLite (optional, PATHFINDER_SECTIONS_DB)
    #[arg(long = "sections-db", global = true)]
    pub sections_db: Option<PathBuf>,
    /// Number of worker threads for region decoding (rayon)
    #[arg(long = "threads", global = true)]
    pub threads: Option<usize>,
    /// Ticks without path change before a task is cancelled (<= 0 disables)
    #[arg(long = "stagnation-ticks", global = true, allow_hyphen_values = true)]
    pub stagnation_ticks: Option<i32>,
    /// Radius searched for a walkable tile around blocked endpoints
    #[arg(long = "snap-radius", global = true)]
    pub snap_radius: Option<i32>,
    /// Section routes evaluated concurrently
    #[arg(long = "max-concurrent-routes", global = true)]
    pub max_concurrent_routes: Option<usize>,
    /// Tick length in milliseconds
    #[arg(long = "tick-millis", global = true)]
    pub tick_millis: Option<u64>,
    /// Log level (trace|debug|info|warn|error)
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,
}

/// CLI options first, environment overlaid on top (env > CLI).
pub fn resolve_config(common: &CommonOpts) -> Config {
    let mut cfg = Config {
        collision_dir: common.collision_dir.clone(),
        transports_file: common.transports.clone(),
        sections_file: common.sections_file.clone(),
        sections_db: common.sections_db.clone(),
        log_level: common.log_level.clone(),
        threads: common.threads,
        stagnation_ticks: common.stagnation_ticks,
        snap_radius: common.snap_radius,
        max_concurrent_routes: common.max_concurrent_routes,
        tick_millis: common.tick_millis,
    };
    cfg.overlay(Config::from_env_defaults());

    let (collision, transports, sections) = util::default_paths();
    cfg.collision_dir.get_or_insert(collision);
    cfg.transports_file.get_or_insert(transports);
    cfg.sections_file.get_or_insert(sections);
    cfg
}

/// Logging and the global rayon pool.
pub fn init_runtime(cfg: &Config) {
    logging::init(cfg.log_level.as_deref());
    if let Some(n) = cfg.threads {
        let _ = rayon::ThreadPoolBuilder::new().num_threads(n).build_global();
    }
}

pub fn load_world(cfg: &Config) -> Result<WorldMap> {
    let collision_dir = cfg.collision_dir.as_deref().context("no collision directory configured")?;
    let transports_file = cfg.transports_file.as_deref().context("no transports file configured")?;
    WorldMap::load(collision_dir, transports_file)
}

/// Stored partition, SQLite first and then JSON; None when neither holds one.
pub fn load_stored_sections(cfg: &Config) -> Result<Option<SectionMapper>> {
    if let Some(path) = cfg.sections_db.as_deref().filter(|p| p.exists()) {
        let conn = db::open_ro(path)?;
        if db::table_exists(&conn, "sections")?
            && conn.query_row("SELECT COUNT(*) FROM sections", [], |r| r.get::<_, i64>(0))? > 0
        {
            let mapper =
                SectionMapper::load_db(&conn).with_context(|| format!("load sections from {}", path.display()))?;
            return Ok(Some(mapper));
        }
        log::debug!("sections: {} holds no partition, trying JSON", path.display());
    }
    match cfg.sections_file.as_deref().filter(|p| p.exists()) {
        Some(path) => Ok(Some(SectionMapper::load_json(path)?)),
        None => Ok(None),
    }
}

/// Stored partition when available, otherwise a fresh flood fill.
pub fn load_or_build_sections(cfg: &Config, world: &WorldMap) -> Result<SectionMapper> {
    match load_stored_sections(cfg)? {
        Some(mapper) => {
            mapper.validate_covers(world)?;
            Ok(mapper)
        }
        None => {
            log::info!("sections: no stored partition found, flood filling");
            Ok(SectionMapper::build(world))
        }
    }
}
