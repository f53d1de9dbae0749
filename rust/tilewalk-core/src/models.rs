use std::fmt;

use serde::{Deserialize, Serialize};

pub type ItemId = i32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePosition {
    pub x: i32,
    pub y: i32,
    pub plane: i32,
}

impl TilePosition {
    pub const fn new(x: i32, y: i32, plane: i32) -> Self {
        Self { x, y, plane }
    }

    /// Chebyshev distance; tiles on different planes are infinitely far apart.
    pub fn distance_to(&self, other: TilePosition) -> i32 {
        if self.plane != other.plane {
            return i32::MAX;
        }
        self.distance_to_2d(other)
    }

    pub fn distance_to_2d(&self, other: TilePosition) -> i32 {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        dx.max(dy)
    }

    pub fn offset(&self, dx: i32, dy: i32) -> TilePosition {
        TilePosition { x: self.x + dx, y: self.y + dy, plane: self.plane }
    }

    /// 64x64 map region id.
    pub fn region_id(&self) -> i32 {
        ((self.x >> 6) << 8) | (self.y >> 6)
    }
}

impl From<[i32; 3]> for TilePosition {
    fn from(t: [i32; 3]) -> Self {
        TilePosition { x: t[0], y: t[1], plane: t[2] }
    }
}

impl From<TilePosition> for [i32; 3] {
    fn from(t: TilePosition) -> Self {
        [t.x, t.y, t.plane]
    }
}

impl fmt::Display for TilePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.plane)
    }
}

/// Axis-aligned tile area on one plane, inclusive on both corners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub min: TilePosition,
    pub max: TilePosition,
}

impl Area {
    pub fn new(x: i32, y: i32, width: i32, height: i32, plane: i32) -> Self {
        Area {
            min: TilePosition::new(x, y, plane),
            max: TilePosition::new(x + width.max(1) - 1, y + height.max(1) - 1, plane),
        }
    }

    pub fn contains(&self, t: TilePosition) -> bool {
        t.plane == self.min.plane
            && t.x >= self.min.x
            && t.x <= self.max.x
            && t.y >= self.min.y
            && t.y <= self.max.y
    }

    pub fn intersects(&self, other: &Area) -> bool {
        self.min.plane == other.min.plane && self.intersects_2d(other)
    }

    /// Overlap test that ignores planes.
    pub fn intersects_2d(&self, other: &Area) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}

/// Ordered route from start to goal inclusive. May be empty when no route exists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<TilePosition>);

impl Path {
    pub fn new(tiles: Vec<TilePosition>) -> Self {
        Path(tiles)
    }

    pub fn empty() -> Self {
        Path(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<TilePosition> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<TilePosition> {
        self.0.last().copied()
    }

    pub fn get(&self, index: usize) -> Option<TilePosition> {
        self.0.get(index).copied()
    }

    pub fn index_of(&self, tile: TilePosition) -> Option<usize> {
        self.0.iter().position(|t| *t == tile)
    }

    pub fn contains(&self, tile: TilePosition) -> bool {
        self.0.contains(&tile)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TilePosition> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[TilePosition] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<TilePosition> {
        self.0
    }
}

impl From<Vec<TilePosition>> for Path {
    fn from(v: Vec<TilePosition>) -> Self {
        Path(v)
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a TilePosition;
    type IntoIter = std::slice::Iter<'a, TilePosition>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Outcome of a navigation call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkerState {
    Arrived,
    Moving,
    Unreachable,
    Exit,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(x: i32, y: i32, p: i32) -> TilePosition {
        TilePosition::new(x, y, p)
    }

    #[test]
    fn chebyshev_distance_and_plane_gap() {
        assert_eq!(t(0, 0, 0).distance_to(t(3, 5, 0)), 5);
        assert_eq!(t(0, 0, 0).distance_to(t(1, 1, 1)), i32::MAX);
        assert_eq!(t(0, 0, 0).distance_to_2d(t(1, 1, 1)), 1);
    }

    #[test]
    fn region_id_matches_map_squares() {
        // Motherlode mine sits in region 14936 = (58 << 8) | 88
        assert_eq!(t(3740, 5660, 0).region_id(), 14936);
        assert_eq!(t(0, 0, 0).region_id(), 0);
    }

    #[test]
    fn tile_serializes_as_named_fields() {
        let v = serde_json::to_value(t(1, 2, 3)).unwrap();
        assert_eq!(v, serde_json::json!({"x": 1, "y": 2, "plane": 3}));
    }

    #[test]
    fn path_serializes_as_plain_list() {
        let p = Path::new(vec![t(0, 0, 0), t(0, 1, 0)]);
        let v = serde_json::to_value(&p).unwrap();
        assert!(v.is_array());
        assert_eq!(p.index_of(t(0, 1, 0)), Some(1));
        assert_eq!(p.index_of(t(9, 9, 0)), None);
    }

    #[test]
    fn area_overlap() {
        let a = Area::new(0, 0, 3, 3, 0);
        let b = Area::new(2, 2, 3, 3, 0);
        let c = Area::new(5, 5, 1, 1, 0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.contains(t(2, 2, 0)));
        assert!(!a.contains(t(2, 2, 1)));
    }
}
