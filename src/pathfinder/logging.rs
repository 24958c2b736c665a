use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;
use std::thread;

/// One record per segment search; a hierarchical search spawns dozens.
const SEGMENT_TARGET: &str = "shortest_path::pathfinder::direct_search";

fn builder(level: &str, rust_log: Option<&str>) -> Builder {
    let mut builder = Builder::new();
    match rust_log {
        Some(filters) => {
            builder.parse_filters(filters);
        }
        None => {
            builder.parse_filters(level);
            let cap = level.parse::<LevelFilter>().unwrap_or(LevelFilter::Info).min(LevelFilter::Info);
            builder.filter_module(SEGMENT_TARGET, cap);
        }
    }
    builder.format(|buf, record| {
        let ts = buf.timestamp_millis();
        writeln!(
            buf,
            "[{} {:<5} {}] {}",
            ts,
            record.level(),
            thread::current().name().unwrap_or("-"),
            record.args()
        )
    });
    builder
}

/// `RUST_LOG` replaces `level` entirely. Search workers are named threads,
/// so each record shows which kind of search wrote it. Safe to call more than once.
pub fn init(level: Option<&str>) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let _ = builder(level.unwrap_or("info"), rust_log.as_deref()).try_init();
}
