//! Advisory planning: path metrics and the direct versus bank-first comparison.

use std::collections::{BTreeSet, HashSet};
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Area, ItemId, Path, TilePosition};
use crate::pathfinder::PathfindingService;
use crate::transport::{AgentProfile, Transport, TransportCatalog, TransportKind};

/// Default tolerance for [`nearest_accessible_index`].
pub const DEFAULT_TARGET_TOLERANCE: i32 = 2;

/// Length of `path` if it actually ends at `target`, otherwise `i32::MAX`.
///
/// The end counts when it is on the target's plane and a 2x2 area around it overlaps the 2x2 area
/// around the target.
pub fn total_tiles(path: &Path, target: TilePosition) -> i32 {
    let Some(last) = path.last() else {
        return i32::MAX;
    };
    if last.plane != target.plane {
        return i32::MAX;
    }
    let end = Area::new(last.x, last.y, 2, 2, last.plane);
    let goal = Area::new(target.x, target.y, 2, 2, target.plane);
    if !end.intersects_2d(&goal) {
        return i32::MAX;
    }
    path.len() as i32
}

/// Whether a path ending area of `path_size_*` overlaps an object of `size_*` at `target`, grown by two.
pub fn path_reaches_area(
    path: &Path,
    target: TilePosition,
    size_x: i32,
    size_y: i32,
    path_size_x: i32,
    path_size_y: i32,
) -> bool {
    let Some(last) = path.last() else {
        return false;
    };
    let end = Area::new(last.x, last.y, path_size_x, path_size_y, last.plane);
    let object = Area::new(target.x, target.y, size_x + 2, size_y + 2, target.plane);
    end.intersects_2d(&object)
}

/// Index into `targets` of the first one whose tolerance square overlaps the end of `path`.
pub fn nearest_accessible_index(path: &Path, targets: &[TilePosition], tolerance: i32) -> Option<usize> {
    let last = path.last()?;
    let end = Area::new(last.x, last.y, tolerance, tolerance, last.plane);
    targets
        .iter()
        .position(|t| Area::new(t.x, t.y, tolerance, tolerance, t.plane).intersects_2d(&end))
}

/// Catalog edges a path would take from `start_index` on, in walking order.
///
/// At each step the candidates leaving that tile (plus teleports) whose destination lies later on the
/// path are considered; `preferred` kinds come first, then enum order. The scan resumes at the chosen
/// edge's destination.
pub fn transports_for_path(
    catalog: &TransportCatalog,
    path: &Path,
    start_index: usize,
    preferred: Option<TransportKind>,
) -> Vec<Transport> {
    let mut used = Vec::new();
    let mut i = start_index;
    while i < path.len() {
        let Some(tile) = path.get(i) else { break };
        let mut candidates: Vec<(&Transport, usize)> = catalog
            .at(tile)
            .iter()
            .chain(catalog.anywhere().iter())
            .filter_map(|t| {
                let dest = path.iter().skip(i + 1).position(|p| *p == t.destination)? + i + 1;
                // teleports only count where the path actually jumps
                if t.origin.is_none() && path.get(i + 1) == Some(t.destination) && tile.distance_to(t.destination) <= 1 {
                    return None;
                }
                if t.origin.is_none() && dest != i + 1 {
                    return None;
                }
                Some((t, dest))
            })
            .collect();
        candidates.sort_by_key(|(t, _)| (Some(t.kind) != preferred, t.kind));
        match candidates.first() {
            Some(&(t, dest)) => {
                used.push(t.clone());
                i = dest;
            }
            None => i += 1,
        }
    }
    used
}

/// Item ids required by `transports` that `profile` does not carry.
pub fn missing_items(transports: &[Transport], profile: &AgentProfile) -> BTreeSet<ItemId> {
    TransportCatalog::missing_items(transports.iter(), profile)
}

/// Direct route versus "bank first, then travel with the banked items".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteComparison {
    pub direct_path: Path,
    pub nearest_bank: Option<TilePosition>,
    pub path_to_bank: Path,
    pub path_from_bank: Path,
    pub analysis: String,
}

impl RouteComparison {
    pub fn direct_distance(&self) -> i32 {
        if self.direct_path.is_empty() {
            -1
        } else {
            self.direct_path.len() as i32
        }
    }

    pub fn banking_distance(&self) -> i32 {
        if self.path_to_bank.is_empty() || self.path_from_bank.is_empty() {
            -1
        } else {
            (self.path_to_bank.len() + self.path_from_bank.len()) as i32
        }
    }

    pub fn tile_savings(&self) -> i32 {
        (self.direct_distance() - self.banking_distance()).abs()
    }

    pub fn is_direct_faster(&self) -> bool {
        let banking = self.banking_distance();
        let direct = self.direct_distance();
        if banking == -1 {
            return true;
        }
        if direct == -1 {
            return false;
        }
        direct <= banking
    }
}

/// Runs the comparison against one path service.
pub struct RouteAdvisor<'a> {
    paths: &'a PathfindingService,
    full_catalog: &'a TransportCatalog,
    banks: &'a [TilePosition],
}

impl<'a> RouteAdvisor<'a> {
    pub fn new(paths: &'a PathfindingService, full_catalog: &'a TransportCatalog, banks: &'a [TilePosition]) -> Self {
        Self { paths, full_catalog, banks }
    }

    /// Closest known bank on the same plane, by straight-line distance.
    pub fn nearest_bank(&self, from: TilePosition) -> Option<TilePosition> {
        self.banks.iter().copied().filter(|b| b.plane == from.plane).min_by_key(|b| from.distance_to(*b))
    }

    pub fn compare(
        &self,
        start: TilePosition,
        target: TilePosition,
        carried: &AgentProfile,
        banked: &AgentProfile,
    ) -> RouteComparison {
        let goal: HashSet<TilePosition> = [target].into_iter().collect();
        let direct_path = self.paths.compute_with(start, &goal, &self.full_catalog.usable_by(carried));
        let direct = total_tiles(&direct_path, target);

        let with_bank = carried.merged(banked);
        let bank_catalog = self.full_catalog.usable_by(&with_bank);
        let hypothetical = self.paths.compute_with(start, &goal, &bank_catalog);
        let hypothetical_len = total_tiles(&hypothetical, target);

        let mut report = RouteComparison { direct_path, ..Default::default() };
        let mut analysis = String::new();
        let _ = write!(analysis, "direct: {}", fmt_tiles(direct));
        if hypothetical_len < direct {
            if let Some(bank) = self.nearest_bank(start) {
                let to_bank: HashSet<TilePosition> = [bank].into_iter().collect();
                report.path_to_bank = self.paths.compute_with(start, &to_bank, &self.full_catalog.usable_by(carried));
                report.path_from_bank = self.paths.compute_with(bank, &goal, &bank_catalog);
                report.nearest_bank = Some(bank);
                let _ = write!(analysis, "; via bank {bank}: {}", fmt_tiles(report.banking_distance()));
            } else {
                analysis.push_str("; no bank known");
            }
        } else {
            analysis.push_str("; banked items do not shorten the route");
        }
        let verdict = if report.is_direct_faster() { "direct" } else { "bank first" };
        let _ = write!(analysis, "; recommended: {verdict}");
        debug!(%start, %target, %analysis, "route comparison");
        report.analysis = analysis;
        report
    }
}

fn fmt_tiles(n: i32) -> String {
    if n == i32::MAX || n < 0 {
        "unreachable".to_string()
    } else {
        format!("{n} tiles")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(x: i32, y: i32) -> TilePosition {
        TilePosition::new(x, y, 0)
    }

    fn line(from: i32, to: i32) -> Path {
        Path::new((from..=to).map(|x| t(x, 0)).collect())
    }

    #[test]
    fn total_tiles_checks_end() {
        assert_eq!(total_tiles(&line(0, 9), t(9, 0)), 10);
        assert_eq!(total_tiles(&line(0, 9), t(10, 1)), 10, "adjacent end still counts");
        assert_eq!(total_tiles(&line(0, 9), t(20, 0)), i32::MAX);
        assert_eq!(total_tiles(&line(0, 9), TilePosition::new(9, 0, 1)), i32::MAX);
        assert_eq!(total_tiles(&Path::empty(), t(0, 0)), i32::MAX);
    }

    #[test]
    fn area_reach_uses_grown_object() {
        let path = line(0, 5);
        // a 1x1 object at (4,-2) grows to x 4..=6, y -2..=0 and covers the end tile
        assert!(path_reaches_area(&path, t(4, -2), 1, 1, 1, 1));
        // growth extends from the object's corner only, so (6,0) starts one past the end
        assert!(!path_reaches_area(&path, t(6, 0), 1, 1, 1, 1));
        assert!(path_reaches_area(&path, t(6, 0), 1, 1, 2, 2));
        assert!(!path_reaches_area(&path, t(9, 0), 1, 1, 1, 1));
    }

    #[test]
    fn first_target_within_tolerance() {
        let path = line(0, 5);
        let targets = [t(30, 0), t(6, 0), t(5, 0)];
        assert_eq!(nearest_accessible_index(&path, &targets, DEFAULT_TARGET_TOLERANCE), Some(1));
        assert_eq!(nearest_accessible_index(&Path::empty(), &targets, 2), None);
    }

    #[test]
    fn comparison_metrics() {
        let mut c = RouteComparison { direct_path: line(0, 9), ..Default::default() };
        assert_eq!(c.banking_distance(), -1);
        assert!(c.is_direct_faster());
        c.path_to_bank = line(0, 2);
        c.path_from_bank = line(2, 4);
        assert_eq!(c.banking_distance(), 6);
        assert_eq!(c.tile_savings(), 4);
        assert!(!c.is_direct_faster());
        c.direct_path = Path::empty();
        assert!(!c.is_direct_faster());
    }

    #[test]
    fn transports_follow_path_order_and_preference() {
        let path = Path::new(vec![t(0, 0), t(1, 0), t(10, 0), t(11, 0), t(50, 0)]);
        let boat = Transport::new(Some(t(1, 0)), t(10, 0), TransportKind::Boat);
        let glider = Transport::new(Some(t(1, 0)), t(10, 0), TransportKind::GnomeGlider);
        let spell = Transport::new(None, t(50, 0), TransportKind::TeleportSpell);
        let catalog = TransportCatalog::new(vec![glider, boat, spell]).unwrap();

        let used = transports_for_path(&catalog, &path, 0, None);
        let kinds: Vec<_> = used.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TransportKind::Boat, TransportKind::TeleportSpell]);

        let used = transports_for_path(&catalog, &path, 0, Some(TransportKind::GnomeGlider));
        assert_eq!(used[0].kind, TransportKind::GnomeGlider);
    }
}
