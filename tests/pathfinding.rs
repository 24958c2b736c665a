mod common;

use anyhow::Result;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use common::*;
use shortest_path::pathfinder::direct_search::DirectSearchTask;
use shortest_path::pathfinder::hierarchical_search::HierarchicalSearchTask;
use shortest_path::pathfinder::movement_policy::is_in_wilderness;
use shortest_path::pathfinder::node_graph::Filters;
use shortest_path::pathfinder::request::TaskKind;
use shortest_path::pathfinder::supervisor::TaskSupervisor;
use shortest_path::pathfinder::task::wait_until_final;
use shortest_path::pathfinder::collision_map::CollisionMapBuilder;
use shortest_path::pathfinder::{MovementPolicy, PathfinderTask, SectionMapper, TaskStatus, TileCoord, WorldMap};

const WAIT: Duration = Duration::from_secs(30);

/// Status changes seen while polling until the task is final.
fn observe_statuses(task: &dyn PathfinderTask) -> Vec<TaskStatus> {
    let deadline = Instant::now() + WAIT;
    let mut seen = vec![task.status()];
    loop {
        let status = task.status();
        if seen.last() != Some(&status) {
            seen.push(status);
        }
        if status.is_terminal() || Instant::now() >= deadline {
            return seen;
        }
        thread::yield_now();
    }
}

fn ferry_search(max_concurrent: usize) -> (Arc<WorldMap>, HierarchicalSearchTask) {
    let world = Arc::new(ferry_islands());
    let sections = Arc::new(SectionMapper::build(&world));
    let task = HierarchicalSearchTask::spawn(
        Arc::clone(&world),
        sections,
        MovementPolicy::default(),
        FERRY_START,
        FERRY_TARGET,
        max_concurrent,
    );
    (world, task)
}

fn agility(level: i32) -> MovementPolicy {
    MovementPolicy { use_agility_shortcuts: true, agility_level: level, ..Default::default() }
}

#[test]
fn stepping_stones_need_the_agility_level() -> Result<()> {
    let world = Arc::new(stepping_stones());

    let low = DirectSearchTask::spawn(
        Arc::clone(&world),
        Filters::for_trip(&agility(30), STONES_START, STONES_TARGET),
        STONES_START,
        STONES_TARGET,
        None,
    );
    assert!(wait_until_final(&low, WAIT));
    let around = low.path().unwrap();
    assert!(low.reached_target());
    assert_eq!(around.transports().count(), 0);
    assert!(around.tiles().any(|c| c.y > 3385), "walks around the river's north end");

    let high = DirectSearchTask::spawn(
        Arc::clone(&world),
        Filters::for_trip(&agility(31), STONES_START, STONES_TARGET),
        STONES_START,
        STONES_TARGET,
        None,
    );
    assert!(wait_until_final(&high, WAIT));
    let across = high.path().unwrap();
    assert_eq!(across.destination(), STONES_TARGET);
    let used: Vec<_> = across.transports().collect();
    assert_eq!(used.len(), 1);
    assert_eq!(used[0].agility_level, 31);
    assert!(across.len() < around.len());
    assert!(world.is_path_valid(&across));
    assert!(world.is_path_valid(&around));
    Ok(())
}

#[test]
fn wilderness_is_avoided_unless_allowed() -> Result<()> {
    let world = Arc::new(wilderness_wall());

    let careful = DirectSearchTask::spawn(
        Arc::clone(&world),
        Filters::for_trip(&MovementPolicy::default(), WILDY_START, WILDY_TARGET),
        WILDY_START,
        WILDY_TARGET,
        None,
    );
    assert!(wait_until_final(&careful, WAIT));
    let gated = careful.path().unwrap();
    assert_eq!(gated.destination(), WILDY_TARGET);
    assert!(gated.tiles().all(|c| !is_in_wilderness(c)));
    assert_eq!(gated.transports().count(), 1);

    let reckless_policy = MovementPolicy { avoid_wilderness: false, ..Default::default() };
    let reckless = DirectSearchTask::spawn(
        Arc::clone(&world),
        Filters::for_trip(&reckless_policy, WILDY_START, WILDY_TARGET),
        WILDY_START,
        WILDY_TARGET,
        None,
    );
    assert!(wait_until_final(&reckless, WAIT));
    let over = reckless.path().unwrap();
    assert_eq!(over.destination(), WILDY_TARGET);
    assert_eq!(over.transports().count(), 0);
    assert!(over.tiles().any(is_in_wilderness));
    assert_eq!(over.len(), 4);
    Ok(())
}

#[test]
fn hierarchical_request_prefers_the_direct_boat() -> Result<()> {
    let mut requester = requester(islands(), &patient_config());
    let handle = requester.request_path(ISLAND_START, ISLAND_TARGET, &MovementPolicy::default()).unwrap();
    assert_eq!(handle.kind(), TaskKind::Hierarchical);

    assert!(wait_until_final(handle.task().as_ref(), WAIT));
    assert_eq!(handle.status(), TaskStatus::Done);
    let path = handle.current_path().unwrap();
    assert_eq!(path.origin(), ISLAND_START);
    assert_eq!(path.destination(), ISLAND_TARGET);
    let used: Vec<_> = path.transports().copied().collect();
    assert_eq!(used, vec![ISLAND_SHORTCUT]);
    assert!(path.is_contiguous());
    assert!(requester.world().is_path_valid(&path));

    let report = requester.tick();
    assert_eq!(report.finished, 1);
    assert!(requester.supervisor().is_empty());
    Ok(())
}

#[test]
fn same_section_request_runs_direct() -> Result<()> {
    let mut requester = requester(stepping_stones(), &patient_config());
    let handle = requester.request_path(STONES_START, STONES_TARGET, &agility(31)).unwrap();
    assert_eq!(handle.kind(), TaskKind::Direct);
    assert!(wait_until_final(handle.task().as_ref(), WAIT));
    assert_eq!(handle.current_path().unwrap().destination(), STONES_TARGET);
    Ok(())
}

#[test]
fn blocked_start_is_snapped_to_the_riverbank() -> Result<()> {
    let mut requester = requester(stepping_stones(), &patient_config());
    let in_river = TileCoord::new(3151, 3364, 0);
    let handle = requester.request_path(in_river, STONES_TARGET, &MovementPolicy::default()).unwrap();
    assert_eq!(handle.requested_start(), in_river);
    assert_eq!(handle.start(), TileCoord::new(3149, 3362, 0));
    assert_eq!(handle.target(), STONES_TARGET);

    assert!(wait_until_final(handle.task().as_ref(), WAIT));
    let path = handle.current_path().unwrap();
    assert_eq!(path.origin(), TileCoord::new(3149, 3362, 0));
    assert_eq!(path.destination(), STONES_TARGET);

    // Nothing walkable anywhere near plane 3.
    let nowhere = TileCoord::new(3151, 3364, 3);
    assert!(requester.request_path(nowhere, STONES_TARGET, &MovementPolicy::default()).is_none());
    Ok(())
}

#[test]
fn new_request_cancels_the_previous_one() -> Result<()> {
    let mut b = CollisionMapBuilder::new();
    b.open_area(0, 0, 0, 700, 700);
    let mut requester = requester(WorldMap::new(b.build(), Vec::new()), &patient_config());

    let first = requester.request_path(t(0, 0), t(700, 700), &MovementPolicy::default()).unwrap();
    let second = requester.request_path(t(0, 0), t(3, 1), &MovementPolicy::default()).unwrap();
    assert!(first.is_final());
    assert_eq!(first.status(), TaskStatus::Cancelled);

    assert!(wait_until_final(second.task().as_ref(), WAIT));
    assert_eq!(second.status(), TaskStatus::Done);
    assert_eq!(second.current_path().unwrap().len(), 3);
    requester.shutdown();
    assert!(requester.active().is_none());
    assert!(requester.supervisor().is_empty());
    Ok(())
}

#[test]
fn direct_search_is_deterministic() -> Result<()> {
    let world = Arc::new(stepping_stones());
    let run = || {
        let task = DirectSearchTask::spawn(
            Arc::clone(&world),
            Filters::for_trip(&agility(99), STONES_START, STONES_TARGET),
            STONES_START,
            STONES_TARGET,
            None,
        );
        assert!(wait_until_final(&task, WAIT));
        task.path().unwrap()
    };
    let a = run();
    let b = run();
    assert_eq!(*a, *b);
    Ok(())
}

#[test]
fn cancelling_a_large_search_is_immediate() -> Result<()> {
    let mut b = CollisionMapBuilder::new();
    b.open_area(0, 0, 0, 700, 700);
    let world = Arc::new(WorldMap::new(b.build(), Vec::new()));

    // Unreachable target on another plane: the frontier would cover the whole area.
    let task = DirectSearchTask::spawn(
        world,
        Filters::walking_only(),
        TileCoord::new(0, 0, 0),
        TileCoord::new(5, 5, 1),
        None,
    );
    task.cancel();
    assert!(task.is_final());
    assert_eq!(task.status(), TaskStatus::Cancelled);
    assert!(!task.reached_target());
    Ok(())
}

#[test]
fn supervisor_evicts_finished_direct_task() -> Result<()> {
    let world = Arc::new(stepping_stones());
    let task: Arc<dyn PathfinderTask> = Arc::new(DirectSearchTask::spawn(
        world,
        Filters::walking_only(),
        STONES_START,
        STONES_START.translate(2, 2),
        None,
    ));
    let mut supervisor = TaskSupervisor::new(3);
    supervisor.register(Arc::clone(&task));
    assert!(supervisor.contains(&task));

    assert!(wait_until_final(task.as_ref(), WAIT));
    let report = supervisor.evaluate();
    assert_eq!(report.finished, 1);
    assert_eq!(report.stagnated, 0);
    assert!(!supervisor.contains(&task));
    Ok(())
}

#[test]
fn added_transport_only_affects_later_requests() -> Result<()> {
    let mut requester = requester(stepping_stones(), &patient_config());
    let before = requester.request_path(STONES_START, STONES_TARGET, &MovementPolicy::default()).unwrap();
    assert!(wait_until_final(before.task().as_ref(), WAIT));
    let long_way = before.current_path().unwrap();

    let ferry = shortest_path::pathfinder::Transport::new(STONES_START, STONES_TARGET);
    assert!(requester.add_transport(ferry));
    assert!(!requester.add_transport(ferry));

    let after = requester.request_path(STONES_START, STONES_TARGET, &MovementPolicy::default()).unwrap();
    assert!(wait_until_final(after.task().as_ref(), WAIT));
    let short_way = after.current_path().unwrap();
    assert_eq!(short_way.len(), 1);
    assert!(long_way.len() > 1);
    assert_eq!(before.current_path().unwrap(), long_way);
    Ok(())
}

#[test]
fn hierarchical_search_keeps_looking_while_routes_remain() -> Result<()> {
    let (world, task) = ferry_search(5);
    let statuses = observe_statuses(&task);
    assert_eq!(statuses, vec![TaskStatus::Calculating, TaskStatus::LookingForBetterPath, TaskStatus::Done]);

    let path = task.path().unwrap();
    assert_eq!(path.origin(), FERRY_START);
    assert_eq!(path.destination(), FERRY_TARGET);
    assert_eq!(path.transports().count(), 1);
    assert_eq!(path.len(), 101);
    assert!(world.is_path_valid(&path));
    Ok(())
}

#[test]
fn route_pool_size_does_not_change_the_result() -> Result<()> {
    let (_, serial) = ferry_search(1);
    let (_, wide) = ferry_search(FERRY_COUNT as usize);
    assert!(wait_until_final(&serial, WAIT));
    assert!(wait_until_final(&wide, WAIT));
    assert_eq!(serial.status(), TaskStatus::Done);
    assert_eq!(wide.status(), TaskStatus::Done);
    assert_eq!(serial.path().unwrap().len(), wide.path().unwrap().len());
    Ok(())
}

#[test]
fn cancelled_hierarchical_search_stays_cancelled() -> Result<()> {
    let (_, task) = ferry_search(5);
    task.cancel();
    assert!(task.is_final());
    assert_eq!(task.status(), TaskStatus::Cancelled);

    // The orchestrator winds down its route evaluations without leaving the terminal state.
    thread::sleep(Duration::from_millis(50));
    assert_eq!(task.status(), TaskStatus::Cancelled);
    Ok(())
}
