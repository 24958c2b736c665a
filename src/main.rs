use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use shortest_path::commands::{self, CommonOpts};
use shortest_path::pathfinder::{MovementPolicy, TileCoord};
use shortest_path::util;

#[derive(Parser, Debug)]
#[command(name = "shortest_path", version, about = "Tile-grid pathfinder with section-level route search")]
struct Cli {
    #[command(flatten)]
    common: CommonOpts,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct CapabilityOpts {
    /// Allow paths through the wilderness even when neither endpoint is inside it
    #[arg(long)]
    allow_wilderness: bool,
    /// Use agility shortcuts the agility level allows
    #[arg(long)]
    agility_shortcuts: bool,
    /// Use grapple shortcuts (also needs ranged and strength)
    #[arg(long)]
    grapple_shortcuts: bool,
    #[arg(long, default_value_t = 1)]
    agility: i32,
    #[arg(long, default_value_t = 1)]
    ranged: i32,
    #[arg(long, default_value_t = 1)]
    strength: i32,
}

impl CapabilityOpts {
    fn into_policy(self) -> MovementPolicy {
        MovementPolicy {
            avoid_wilderness: !self.allow_wilderness,
            use_agility_shortcuts: self.agility_shortcuts,
            use_grapple_shortcuts: self.grapple_shortcuts,
            agility_level: self.agility,
            ranged_level: self.ranged,
            strength_level: self.strength,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Flood fill the walkable world into sections and store them (JSON and/or SQLite)
    BuildSections,

    /// Find a path between two tiles, ticking the stagnation watchdog until it is final
    Route {
        /// Start tile as x,y,plane
        #[arg(long, value_parser = parse_coord_arg, allow_hyphen_values = true)]
        start: TileCoord,
        /// Target tile as x,y,plane
        #[arg(long, value_parser = parse_coord_arg, allow_hyphen_values = true)]
        target: TileCoord,
        #[command(flatten)]
        caps: CapabilityOpts,
    },

    /// Print collision, section and transport data for one tile
    Inspect {
        /// Tile as x,y,plane
        #[arg(long, value_parser = parse_coord_arg, allow_hyphen_values = true)]
        tile: TileCoord,
    },
}

fn parse_coord_arg(s: &str) -> std::result::Result<TileCoord, String> {
    util::parse_coord(s).map_err(|e| format!("{:#}", e))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = commands::resolve_config(&cli.common);
    commands::init_runtime(&cfg);

    match cli.command {
        Commands::BuildSections => commands::build_sections::cmd_build_sections(&cfg).map(|_| ()),
        Commands::Route { start, target, caps } => {
            commands::route::cmd_route(&cfg, start, target, &caps.into_policy())
        }
        Commands::Inspect { tile } => commands::inspect::cmd_inspect(&cfg, tile),
    }
}
