//! Direction bits shared by grid walls and wall-object orientation codes.
//! Bit layout: west=1, north=2, east=4, south=8, northwest=16, northeast=32, southeast=64, southwest=128.

use crate::models::TilePosition;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Movement {
    pub name: &'static str,
    pub bit: u32,
    pub dx: i32,
    pub dy: i32,
}

pub const WEST: Movement = Movement { name: "west", bit: 1 << 0, dx: -1, dy: 0 };
pub const NORTH: Movement = Movement { name: "north", bit: 1 << 1, dx: 0, dy: 1 };
pub const EAST: Movement = Movement { name: "east", bit: 1 << 2, dx: 1, dy: 0 };
pub const SOUTH: Movement = Movement { name: "south", bit: 1 << 3, dx: 0, dy: -1 };
pub const NORTHWEST: Movement = Movement { name: "northwest", bit: 1 << 4, dx: -1, dy: 1 };
pub const NORTHEAST: Movement = Movement { name: "northeast", bit: 1 << 5, dx: 1, dy: 1 };
pub const SOUTHEAST: Movement = Movement { name: "southeast", bit: 1 << 6, dx: 1, dy: -1 };
pub const SOUTHWEST: Movement = Movement { name: "southwest", bit: 1 << 7, dx: -1, dy: -1 };

// Cardinals first so straight routes win ties in the search.
pub const MOVEMENT_ORDER: [Movement; 8] = [
    NORTH, SOUTH, EAST, WEST, NORTHEAST, NORTHWEST, SOUTHEAST, SOUTHWEST,
];

impl Movement {
    pub fn is_diagonal(&self) -> bool {
        self.dx != 0 && self.dy != 0
    }

    pub fn apply(&self, t: TilePosition) -> TilePosition {
        t.offset(self.dx, self.dy)
    }

    pub fn opposite(&self) -> Movement {
        match self.bit {
            b if b == WEST.bit => EAST,
            b if b == EAST.bit => WEST,
            b if b == NORTH.bit => SOUTH,
            b if b == SOUTH.bit => NORTH,
            b if b == NORTHWEST.bit => SOUTHEAST,
            b if b == SOUTHEAST.bit => NORTHWEST,
            b if b == NORTHEAST.bit => SOUTHWEST,
            _ => NORTHEAST,
        }
    }
}

/// Orientation code of a wall object to its direction. Unknown codes map to `None`.
pub fn from_orientation(code: i32) -> Option<Movement> {
    match code {
        1 => Some(WEST),
        2 => Some(NORTH),
        4 => Some(EAST),
        8 => Some(SOUTH),
        16 => Some(NORTHWEST),
        32 => Some(NORTHEAST),
        64 => Some(SOUTHEAST),
        128 => Some(SOUTHWEST),
        _ => None,
    }
}

/// Direction of a one-step move, if the tiles are adjacent on one plane.
pub fn between(from: TilePosition, to: TilePosition) -> Option<Movement> {
    if from.plane != to.plane {
        return None;
    }
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    MOVEMENT_ORDER.iter().copied().find(|m| m.dx == dx && m.dy == dy)
}

/// True when a wall at `probe` with this orientation faces the `neighbor` tile.
pub fn faces_neighbor(orientation: i32, probe: TilePosition, neighbor: TilePosition) -> bool {
    match from_orientation(orientation) {
        Some(m) => m.apply(probe) == neighbor,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(x: i32, y: i32) -> TilePosition {
        TilePosition::new(x, y, 0)
    }

    #[test]
    fn orientation_codes_map_to_offsets() {
        assert_eq!(from_orientation(1), Some(WEST));
        assert_eq!(from_orientation(2).map(|m| (m.dx, m.dy)), Some((0, 1)));
        assert_eq!(from_orientation(64).map(|m| (m.dx, m.dy)), Some((1, -1)));
        assert_eq!(from_orientation(128).map(|m| (m.dx, m.dy)), Some((-1, -1)));
        assert_eq!(from_orientation(3), None);
    }

    #[test]
    fn wall_faces_neighbor_only_in_its_direction() {
        // wall on the north edge of (10,10) blocks the step to (10,11)
        assert!(faces_neighbor(2, t(10, 10), t(10, 11)));
        assert!(!faces_neighbor(2, t(10, 10), t(10, 9)));
        assert!(!faces_neighbor(0, t(10, 10), t(10, 11)));
    }

    #[test]
    fn between_and_opposite() {
        assert_eq!(between(t(0, 0), t(1, 1)), Some(NORTHEAST));
        assert_eq!(between(t(0, 0), t(2, 0)), None);
        assert_eq!(NORTHEAST.opposite(), SOUTHWEST);
        assert_eq!(WEST.opposite(), EAST);
        assert!(SOUTHWEST.is_diagonal());
    }

    #[test]
    fn order_is_cardinals_first() {
        let names: Vec<&str> = MOVEMENT_ORDER.iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["north", "south", "east", "west", "northeast", "northwest", "southeast", "southwest"]);
    }
}
