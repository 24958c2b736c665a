use serde::{Deserialize, Serialize};
use std::fmt;

/// A single tile of the world grid.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
    pub plane: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32, plane: i32) -> Self {
        Self { x, y, plane }
    }

    pub fn translate(self, dx: i32, dy: i32) -> Self {
        Self { x: self.x + dx, y: self.y + dy, plane: self.plane }
    }

    /// Chebyshev distance; tiles on different planes are infinitely far apart.
    pub fn distance_to(self, other: TileCoord) -> i32 {
        if self.plane != other.plane {
            return i32::MAX;
        }
        self.distance_to_2d(other)
    }

    /// Chebyshev distance ignoring the plane.
    pub fn distance_to_2d(self, other: TileCoord) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.plane)
    }
}

/// Directed non-adjacent link between two tiles, optionally skill gated.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Transport {
    pub origin: TileCoord,
    pub destination: TileCoord,
    pub agility_level: i32,
    pub ranged_level: i32,
    pub strength_level: i32,
}

impl Transport {
    pub fn new(origin: TileCoord, destination: TileCoord) -> Self {
        Self::with_requirements(origin, destination, 0, 0, 0)
    }

    pub fn with_requirements(
        origin: TileCoord,
        destination: TileCoord,
        agility_level: i32,
        ranged_level: i32,
        strength_level: i32,
    ) -> Self {
        Self { origin, destination, agility_level, ranged_level, strength_level }
    }

    pub fn is_agility_shortcut(&self) -> bool {
        self.agility_level > 0
    }

    /// Agility shortcut that additionally needs ranged or strength (crossbow grapples).
    pub fn is_grapple_shortcut(&self) -> bool {
        self.is_agility_shortcut() && (self.ranged_level > 0 || self.strength_level > 0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Movement {
    Walk { origin: TileCoord, destination: TileCoord },
    Transport(Transport),
}

impl Movement {
    pub fn origin(&self) -> TileCoord {
        match self {
            Movement::Walk { origin, .. } => *origin,
            Movement::Transport(t) => t.origin,
        }
    }

    pub fn destination(&self) -> TileCoord {
        match self {
            Movement::Walk { destination, .. } => *destination,
            Movement::Transport(t) => t.destination,
        }
    }

    pub fn is_walk(&self) -> bool {
        matches!(self, Movement::Walk { .. })
    }

    /// A walk that starts and ends on the same tile (search seed).
    pub fn is_stationary(&self) -> bool {
        matches!(self, Movement::Walk { origin, destination } if origin == destination)
    }
}

/// Non-empty, contiguous sequence of movements.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Path {
    movements: Vec<Movement>,
}

impl Path {
    pub fn new(movements: Vec<Movement>) -> Self {
        debug_assert!(!movements.is_empty(), "path must contain at least one movement");
        let path = Self { movements };
        debug_assert!(path.is_contiguous(), "path movements must be contiguous");
        path
    }

    pub fn movements(&self) -> &[Movement] {
        &self.movements
    }

    pub fn len(&self) -> usize {
        self.movements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movements.is_empty()
    }

    pub fn origin(&self) -> TileCoord {
        self.movements[0].origin()
    }

    pub fn destination(&self) -> TileCoord {
        self.movements[self.movements.len() - 1].destination()
    }

    pub fn is_contiguous(&self) -> bool {
        self.movements
            .windows(2)
            .all(|w| w[0].destination() == w[1].origin())
    }

    /// Origin followed by every movement destination.
    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> + '_ {
        std::iter::once(self.origin()).chain(self.movements.iter().map(|m| m.destination()))
    }

    pub fn transports(&self) -> impl Iterator<Item = &Transport> + '_ {
        self.movements.iter().filter_map(|m| match m {
            Movement::Transport(t) => Some(t),
            Movement::Walk { .. } => None,
        })
    }

    pub fn into_movements(self) -> Vec<Movement> {
        self.movements
    }
}
