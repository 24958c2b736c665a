use super::models::TileCoord;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Offset(pub i32, pub i32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum OrdinalDirection {
    North,
    East,
    South,
    West,
    NorthEast,
    SouthEast,
    SouthWest,
    NorthWest,
}

/// Order in which neighbours are generated during frontier expansion.
/// Cardinals first; this fixes tie-breaking between equally short paths.
pub const EXPANSION_ORDER: [OrdinalDirection; 8] = [
    OrdinalDirection::North,
    OrdinalDirection::East,
    OrdinalDirection::South,
    OrdinalDirection::West,
    OrdinalDirection::NorthEast,
    OrdinalDirection::SouthEast,
    OrdinalDirection::SouthWest,
    OrdinalDirection::NorthWest,
];

pub const CARDINALS: [OrdinalDirection; 4] = [
    OrdinalDirection::North,
    OrdinalDirection::East,
    OrdinalDirection::South,
    OrdinalDirection::West,
];

impl OrdinalDirection {
    pub fn offset(self) -> Offset {
        match self {
            OrdinalDirection::North => Offset(0, 1),
            OrdinalDirection::East => Offset(1, 0),
            OrdinalDirection::South => Offset(0, -1),
            OrdinalDirection::West => Offset(-1, 0),
            OrdinalDirection::NorthEast => Offset(1, 1),
            OrdinalDirection::SouthEast => Offset(1, -1),
            OrdinalDirection::SouthWest => Offset(-1, -1),
            OrdinalDirection::NorthWest => Offset(-1, 1),
        }
    }

    pub fn is_diagonal(self) -> bool {
        let Offset(dx, dy) = self.offset();
        dx != 0 && dy != 0
    }

    pub fn from_offset(offset: Offset) -> Option<Self> {
        EXPANSION_ORDER.iter().copied().find(|d| d.offset() == offset)
    }

    /// Direction of a single step from `origin` towards `destination` (components clamped to -1..=1).
    /// None when both tiles share x and y.
    pub fn towards(origin: TileCoord, destination: TileCoord) -> Option<Self> {
        let dx = (destination.x - origin.x).clamp(-1, 1);
        let dy = (destination.y - origin.y).clamp(-1, 1);
        Self::from_offset(Offset(dx, dy))
    }

    /// Horizontal and vertical components of a diagonal.
    pub fn components(self) -> Option<(OrdinalDirection, OrdinalDirection)> {
        let Offset(dx, dy) = self.offset();
        if dx == 0 || dy == 0 {
            return None;
        }
        let horizontal = if dx > 0 { OrdinalDirection::East } else { OrdinalDirection::West };
        let vertical = if dy > 0 { OrdinalDirection::North } else { OrdinalDirection::South };
        Some((horizontal, vertical))
    }

    pub fn step(self, from: TileCoord) -> TileCoord {
        let Offset(dx, dy) = self.offset();
        from.translate(dx, dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansion_order_puts_cardinals_first() {
        assert!(EXPANSION_ORDER[..4].iter().all(|d| !d.is_diagonal()));
        assert!(EXPANSION_ORDER[4..].iter().all(|d| d.is_diagonal()));
        assert_eq!(&EXPANSION_ORDER[..4], &CARDINALS);
    }

    #[test]
    fn towards_clamps_long_offsets() {
        let o = TileCoord::new(10, 10, 0);
        assert_eq!(OrdinalDirection::towards(o, TileCoord::new(15, 10, 0)), Some(OrdinalDirection::East));
        assert_eq!(OrdinalDirection::towards(o, TileCoord::new(5, 2, 0)), Some(OrdinalDirection::SouthWest));
        assert_eq!(OrdinalDirection::towards(o, TileCoord::new(10, 11, 0)), Some(OrdinalDirection::North));
        assert_eq!(OrdinalDirection::towards(o, o), None);
    }

    #[test]
    fn diagonal_components() {
        assert_eq!(
            OrdinalDirection::SouthEast.components(),
            Some((OrdinalDirection::East, OrdinalDirection::South))
        );
        assert_eq!(OrdinalDirection::North.components(), None);
        for d in EXPANSION_ORDER {
            assert_eq!(OrdinalDirection::from_offset(d.offset()), Some(d));
        }
    }
}
