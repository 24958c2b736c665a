use std::{env, path::PathBuf};

pub const DEFAULT_STAGNATION_TICKS: i32 = 10;
pub const DEFAULT_SNAP_RADIUS: i32 = 10;
pub const DEFAULT_TICK_MILLIS: u64 = 600;

#[derive(Clone, Debug, Default)]
pub struct Config {
    pub collision_dir: Option<PathBuf>,
    pub transports_file: Option<PathBuf>,
    pub sections_file: Option<PathBuf>,
    pub sections_db: Option<PathBuf>,
    pub log_level: Option<String>,
    pub threads: Option<usize>,
    pub stagnation_ticks: Option<i32>,
    pub snap_radius: Option<i32>,
    pub max_concurrent_routes: Option<usize>,
    pub tick_millis: Option<u64>,
}

impl Config {
    pub fn from_env_defaults() -> Self {
        let collision_dir = env::var("PATHFINDER_COLLISION_DIR").ok().map(PathBuf::from);
        let transports_file = env::var("PATHFINDER_TRANSPORTS").ok().map(PathBuf::from);
        let sections_file = env::var("PATHFINDER_SECTIONS_FILE").ok().map(PathBuf::from);
        let sections_db = env::var("PATHFINDER_SECTIONS_DB").ok().map(PathBuf::from);
        let log_level = env::var("PATHFINDER_LOG_LEVEL").ok();
        let threads = env::var("PATHFINDER_THREADS").ok().and_then(|s| s.trim().parse::<usize>().ok());
        let stagnation_ticks = env::var("PATHFINDER_STAGNATION_TICKS").ok().and_then(|s| s.trim().parse::<i32>().ok());
        let snap_radius = env::var("PATHFINDER_SNAP_RADIUS").ok().and_then(|s| s.trim().parse::<i32>().ok());
        let max_concurrent_routes =
            env::var("PATHFINDER_MAX_CONCURRENT_ROUTES").ok().and_then(|s| s.trim().parse::<usize>().ok());
        let tick_millis = env::var("PATHFINDER_TICK_MILLIS").ok().and_then(|s| s.trim().parse::<u64>().ok());
        Self {
            collision_dir,
            transports_file,
            sections_file,
            sections_db,
            log_level,
            threads,
            stagnation_ticks,
            snap_radius,
            max_concurrent_routes,
            tick_millis,
        }
    }

    /// Values set in `env` win over the ones already present (env > CLI).
    pub fn overlay(&mut self, env: Config) {
        if env.collision_dir.is_some() { self.collision_dir = env.collision_dir; }
        if env.transports_file.is_some() { self.transports_file = env.transports_file; }
        if env.sections_file.is_some() { self.sections_file = env.sections_file; }
        if env.sections_db.is_some() { self.sections_db = env.sections_db; }
        if env.log_level.is_some() { self.log_level = env.log_level; }
        if env.threads.is_some() { self.threads = env.threads; }
        if env.stagnation_ticks.is_some() { self.stagnation_ticks = env.stagnation_ticks; }
        if env.snap_radius.is_some() { self.snap_radius = env.snap_radius; }
        if env.max_concurrent_routes.is_some() { self.max_concurrent_routes = env.max_concurrent_routes; }
        if env.tick_millis.is_some() { self.tick_millis = env.tick_millis; }
    }

    pub fn stagnation_ticks(&self) -> i32 {
        self.stagnation_ticks.unwrap_or(DEFAULT_STAGNATION_TICKS)
    }

    pub fn snap_radius(&self) -> i32 {
        self.snap_radius.unwrap_or(DEFAULT_SNAP_RADIUS)
    }

    pub fn max_concurrent_routes(&self) -> usize {
        self.max_concurrent_routes
            .unwrap_or(super::hierarchical_search::MAX_CONCURRENT_ROUTES)
            .max(1)
    }

    pub fn tick_millis(&self) -> u64 {
        self.tick_millis.unwrap_or(DEFAULT_TICK_MILLIS)
    }
}
