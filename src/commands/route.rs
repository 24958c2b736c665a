use anyhow::Result;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::pathfinder::config::Config;
use crate::pathfinder::{Movement, MovementPolicy, Path, PathRequester, TaskStatus, TileCoord};

/// Final state of a routed request.
#[derive(Debug, Clone)]
pub struct RouteOutcome {
    pub status: TaskStatus,
    pub start: TileCoord,
    pub target: TileCoord,
    pub path: Option<Arc<Path>>,
    pub ticks: u32,
    /// Cancelled by the stagnation watchdog rather than finishing on its own.
    pub stagnated: bool,
}

impl RouteOutcome {
    pub fn reached_target(&self) -> bool {
        self.path.as_ref().is_some_and(|p| p.destination() == self.target)
    }
}

pub fn cmd_route(cfg: &Config, start: TileCoord, target: TileCoord, policy: &MovementPolicy) -> Result<()> {
    let world = Arc::new(super::load_world(cfg)?);
    let sections = Arc::new(super::load_or_build_sections(cfg, &world)?);
    println!("Loaded {} regions, {} transports, {} sections", world.collision().region_count(), world.transports().len(), sections.len());

    let mut requester = PathRequester::new(world, sections, cfg);
    let tick = Duration::from_millis(cfg.tick_millis());
    let Some(outcome) = run_route(&mut requester, start, target, policy, tick) else {
        println!("No walkable tile within {} tiles of {} or {}", cfg.snap_radius(), start, target);
        return Ok(());
    };

    if outcome.start != start {
        println!("Start snapped to {}", outcome.start);
    }
    if outcome.target != target {
        println!("Target snapped to {}", outcome.target);
    }
    println!(
        "Status: {:?} after {} ticks{}",
        outcome.status,
        outcome.ticks,
        if outcome.stagnated { " (stagnated)" } else { "" }
    );
    match &outcome.path {
        Some(path) => {
            println!(
                "Path with {} movements ({} transports), reaches target: {}",
                path.len(),
                path.transports().count(),
                outcome.reached_target()
            );
            for (i, m) in path.movements().iter().enumerate() {
                println!("{:>5}  {}", i, describe(m));
            }
        }
        None => println!("No path found"),
    }
    Ok(())
}

/// Requests a path and ticks the supervisor every `tick` until the task is final
/// or the watchdog drops it. None when either endpoint cannot be snapped.
pub fn run_route(
    requester: &mut PathRequester,
    start: TileCoord,
    target: TileCoord,
    policy: &MovementPolicy,
    tick: Duration,
) -> Option<RouteOutcome> {
    let handle = requester.request_path(start, target, policy)?;
    let mut ticks = 0u32;
    let mut stagnated = false;
    while !handle.is_final() {
        thread::sleep(tick);
        ticks += 1;
        let report = requester.tick();
        if !requester.supervisor().contains(handle.task()) {
            stagnated = report.stagnated > 0 && handle.status() == TaskStatus::Cancelled;
            break;
        }
    }
    log::debug!("route {} -> {}: {:?} after {} ticks", handle.start(), handle.target(), handle.status(), ticks);

    Some(RouteOutcome {
        status: handle.status(),
        start: handle.start(),
        target: handle.target(),
        path: handle.current_path(),
        ticks,
        stagnated,
    })
}

pub fn describe(m: &Movement) -> String {
    match m {
        Movement::Walk { origin, destination } if origin == destination => format!("stand  {}", origin),
        Movement::Walk { origin, destination } => format!("walk   {} -> {}", origin, destination),
        Movement::Transport(t) => {
            let mut req = Vec::new();
            if t.agility_level > 0 {
                req.push(format!("agility {}", t.agility_level));
            }
            if t.ranged_level > 0 {
                req.push(format!("ranged {}", t.ranged_level));
            }
            if t.strength_level > 0 {
                req.push(format!("strength {}", t.strength_level));
            }
            if req.is_empty() {
                format!("travel {} -> {}", t.origin, t.destination)
            } else {
                format!("travel {} -> {} [{}]", t.origin, t.destination, req.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathfinder::collision_map::CollisionMapBuilder;
    use crate::pathfinder::{SectionMapper, Transport, WorldMap};

    fn t(x: i32, y: i32) -> TileCoord {
        TileCoord::new(x, y, 0)
    }

    #[test]
    fn describes_movements() {
        assert_eq!(describe(&Movement::Walk { origin: t(1, 1), destination: t(1, 1) }), "stand  (1, 1, 0)");
        assert_eq!(describe(&Movement::Walk { origin: t(1, 1), destination: t(1, 2) }), "walk   (1, 1, 0) -> (1, 2, 0)");
        let shortcut = Transport::with_requirements(t(1, 1), t(5, 1), 31, 0, 0);
        assert_eq!(describe(&Movement::Transport(shortcut)), "travel (1, 1, 0) -> (5, 1, 0) [agility 31]");
    }

    #[test]
    fn run_route_finishes_direct_request() {
        let mut b = CollisionMapBuilder::new();
        b.open_area(0, 0, 0, 8, 8);
        let world = Arc::new(WorldMap::new(b.build(), Vec::new()));
        let sections = Arc::new(SectionMapper::build(&world));
        let mut requester = PathRequester::new(world, sections, &Config::default());

        let outcome = run_route(&mut requester, t(0, 0), t(6, 3), &MovementPolicy::default(), Duration::from_millis(5))
            .unwrap();
        assert_eq!(outcome.status, TaskStatus::Done);
        assert!(outcome.reached_target());
        assert!(!outcome.stagnated);
        assert_eq!(outcome.path.unwrap().len(), 6);
    }
}
