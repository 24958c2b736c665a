use super::models::{TileCoord, Transport};

/// Inclusive tile rectangle on one plane.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct WorldArea {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub plane: i32,
}

impl WorldArea {
    pub const fn new(x: i32, y: i32, width: i32, height: i32, plane: i32) -> Self {
        Self { x, y, width, height, plane }
    }

    pub fn contains(&self, c: TileCoord) -> bool {
        c.plane == self.plane
            && c.x >= self.x
            && c.x < self.x + self.width
            && c.y >= self.y
            && c.y < self.y + self.height
    }
}

pub const WILDERNESS_ABOVE_GROUND: WorldArea = WorldArea::new(2944, 3523, 448, 448, 0);
pub const WILDERNESS_UNDERGROUND: WorldArea = WorldArea::new(2944, 9918, 320, 442, 0);

pub fn is_in_wilderness(c: TileCoord) -> bool {
    WILDERNESS_ABOVE_GROUND.contains(c) || WILDERNESS_UNDERGROUND.contains(c)
}

/// Player movement capabilities used to decide which transports are usable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovementPolicy {
    pub avoid_wilderness: bool,
    pub use_agility_shortcuts: bool,
    pub use_grapple_shortcuts: bool,
    pub agility_level: i32,
    pub ranged_level: i32,
    pub strength_level: i32,
}

impl Default for MovementPolicy {
    fn default() -> Self {
        Self {
            avoid_wilderness: true,
            use_agility_shortcuts: false,
            use_grapple_shortcuts: false,
            agility_level: 1,
            ranged_level: 1,
            strength_level: 1,
        }
    }
}

impl MovementPolicy {
    pub fn can_use_transport(&self, t: &Transport) -> bool {
        if !t.is_agility_shortcut() {
            return true;
        }
        if !self.use_agility_shortcuts {
            return false;
        }
        if t.is_grapple_shortcut() {
            return self.use_grapple_shortcuts
                && self.agility_level >= t.agility_level
                && self.ranged_level >= t.ranged_level
                && self.strength_level >= t.strength_level;
        }
        self.agility_level >= t.agility_level
    }

    /// Wilderness avoidance only applies to trips that neither start nor end there.
    pub fn avoids_wilderness_between(&self, start: TileCoord, target: TileCoord) -> bool {
        self.avoid_wilderness && !is_in_wilderness(start) && !is_in_wilderness(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tr(agility: i32, ranged: i32, strength: i32) -> Transport {
        Transport::with_requirements(TileCoord::new(0, 0, 0), TileCoord::new(1, 0, 0), agility, ranged, strength)
    }

    #[test]
    fn wilderness_boxes_are_plane_zero_and_half_open() {
        assert!(is_in_wilderness(TileCoord::new(2944, 3523, 0)));
        assert!(is_in_wilderness(TileCoord::new(3391, 3970, 0)));
        assert!(!is_in_wilderness(TileCoord::new(3392, 3600, 0)));
        assert!(!is_in_wilderness(TileCoord::new(3100, 3522, 0)));
        assert!(!is_in_wilderness(TileCoord::new(3100, 3600, 1)));
        assert!(is_in_wilderness(TileCoord::new(3000, 10000, 0)));
        assert!(!is_in_wilderness(TileCoord::new(3264, 10000, 0)));
    }

    #[test]
    fn always_available_transports_ignore_flags() {
        let p = MovementPolicy::default();
        assert!(p.can_use_transport(&tr(0, 0, 0)));
        assert!(p.can_use_transport(&tr(0, 50, 50)));
        assert!(!p.can_use_transport(&tr(1, 0, 0)));
    }

    #[test]
    fn agility_shortcut_level_gate() {
        let mut p = MovementPolicy { use_agility_shortcuts: true, agility_level: 30, ..Default::default() };
        assert!(!p.can_use_transport(&tr(31, 0, 0)));
        p.agility_level = 31;
        assert!(p.can_use_transport(&tr(31, 0, 0)));
    }

    #[test]
    fn grapple_needs_flag_and_all_levels() {
        let mut p = MovementPolicy {
            use_agility_shortcuts: true,
            agility_level: 99,
            ranged_level: 99,
            strength_level: 99,
            ..Default::default()
        };
        assert!(!p.can_use_transport(&tr(8, 37, 22)));
        p.use_grapple_shortcuts = true;
        assert!(p.can_use_transport(&tr(8, 37, 22)));
        p.strength_level = 21;
        assert!(!p.can_use_transport(&tr(8, 37, 22)));
    }

    #[test]
    fn avoidance_lifts_when_an_endpoint_is_in_wilderness() {
        let p = MovementPolicy::default();
        let outside = TileCoord::new(3100, 3500, 0);
        let inside = TileCoord::new(3100, 3600, 0);
        assert!(p.avoids_wilderness_between(outside, outside));
        assert!(!p.avoids_wilderness_between(outside, inside));
        let relaxed = MovementPolicy { avoid_wilderness: false, ..Default::default() };
        assert!(!relaxed.avoids_wilderness_between(outside, outside));
    }
}
