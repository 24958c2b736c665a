#![allow(dead_code)]

use std::sync::Arc;

use shortest_path::pathfinder::collision_map::CollisionMapBuilder;
use shortest_path::pathfinder::config::Config;
use shortest_path::pathfinder::{PathRequester, SectionMapper, TileCoord, Transport, WorldMap};

pub fn t(x: i32, y: i32) -> TileCoord {
    TileCoord::new(x, y, 0)
}

pub const STONES_START: TileCoord = TileCoord::new(3161, 3364, 0);
pub const STONES_TARGET: TileCoord = TileCoord::new(3143, 3364, 0);

/// A river (x 3150..=3153) crossable by walking around its northern end or
/// by an agility 31 stepping-stone shortcut in both directions.
pub fn stepping_stones() -> WorldMap {
    let mut b = CollisionMapBuilder::new();
    b.open_area(0, 3138, 3355, 3166, 3390);
    for x in 3150..=3153 {
        for y in 3355..=3385 {
            b.block_tile(t(x, y));
        }
    }
    let west = t(3149, 3363);
    let east = t(3154, 3363);
    WorldMap::new(
        b.build(),
        vec![
            Transport::with_requirements(west, east, 31, 0, 0),
            Transport::with_requirements(east, west, 31, 0, 0),
        ],
    )
}

pub const WILDY_START: TileCoord = TileCoord::new(3099, 3521, 0);
pub const WILDY_TARGET: TileCoord = TileCoord::new(3101, 3521, 0);

/// A wall at x 3100 that ends just inside the wilderness border (y 3523),
/// plus a gate at its southern end.
pub fn wilderness_wall() -> WorldMap {
    let mut b = CollisionMapBuilder::new();
    b.open_area(0, 3090, 3510, 3110, 3530);
    for y in 3510..=3522 {
        b.block_tile(t(3100, y));
    }
    WorldMap::new(b.build(), vec![Transport::new(t(3099, 3511), t(3101, 3511))])
}

pub const ISLAND_START: TileCoord = TileCoord::new(3202, 3202, 0);
pub const ISLAND_TARGET: TileCoord = TileCoord::new(3245, 3205, 0);
pub const ISLAND_SHORTCUT: Transport = Transport {
    origin: TileCoord::new(3200, 3200, 0),
    destination: TileCoord::new(3250, 3210, 0),
    agility_level: 0,
    ranged_level: 0,
    strength_level: 0,
};

/// Three disconnected islands: A -> B -> C by boat, or A -> C directly.
pub fn islands() -> WorldMap {
    let mut b = CollisionMapBuilder::new();
    b.open_area(0, 3200, 3200, 3210, 3210);
    b.open_area(0, 3220, 3200, 3230, 3210);
    b.open_area(0, 3240, 3200, 3250, 3210);
    WorldMap::new(
        b.build(),
        vec![
            Transport::new(t(3210, 3205), t(3220, 3205)),
            Transport::new(t(3230, 3205), t(3240, 3205)),
            ISLAND_SHORTCUT,
        ],
    )
}

pub fn requester(world: WorldMap, cfg: &Config) -> PathRequester {
    let sections = SectionMapper::build(&world);
    PathRequester::new(Arc::new(world), Arc::new(sections), cfg)
}

/// Stagnation watchdog off, so slow machines never cut a search short.
pub fn patient_config() -> Config {
    Config { stagnation_ticks: Some(0), ..Default::default() }
}

pub const FERRY_COUNT: i32 = 12;
pub const FERRY_START: TileCoord = TileCoord::new(3310, 3320, 0);
pub const FERRY_TARGET: TileCoord = TileCoord::new(3470, 3320, 0);

/// Two islands joined by more parallel boats than the route pool holds at once.
/// Every boat gives the same walk: 50 steps, the crossing, 50 steps.
pub fn ferry_islands() -> WorldMap {
    let mut b = CollisionMapBuilder::new();
    b.open_area(0, 3300, 3300, 3360, 3360);
    b.open_area(0, 3420, 3300, 3480, 3360);
    let boats = (0..FERRY_COUNT)
        .map(|k| Transport::new(t(3360, 3300 + 3 * k), t(3420, 3300 + 3 * k)))
        .collect();
    WorldMap::new(b.build(), boats)
}
