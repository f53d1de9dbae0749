mod common;

use std::collections::HashSet;

use common::{fast_config, t, walker, FakeWorld};
use tilewalk_core::graph::TileGraph;
use tilewalk_core::{
    AgentProfile, GridGraph, GridSpec, Path, TilePosition, Transport, TransportCatalog, TransportKind,
};

/// Every consecutive pair is either an adjacent walkable step or a catalog edge.
fn assert_valid(graph: &dyn TileGraph, catalog: &TransportCatalog, path: &Path) {
    let tiles = path.as_slice();
    for pair in tiles.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let stepped = graph.neighbors(a).contains(&b);
        let edge = catalog
            .at(a)
            .iter()
            .chain(catalog.anywhere().iter())
            .any(|e| e.destination == b);
        assert!(stepped || edge, "{a} -> {b} is neither a step nor an edge");
    }
}

fn walled_world() -> GridGraph {
    // a wall along x = 15 with one gap at y = 18
    let blocked = (0..20).filter(|y| *y != 18).map(|y| t(15, y)).collect();
    GridGraph::new(GridSpec { blocked, ..GridSpec::rect(0, 0, 40, 20) }).unwrap()
}

#[test]
fn computed_paths_only_step_or_use_edges() {
    let world = FakeWorld::new(walled_world(), t(2, 2));
    let ladder = Transport::new(Some(t(10, 2)), t(20, 2), TransportKind::AgilityShortcut).with_duration(3);
    let catalog = TransportCatalog::new([ladder]).unwrap();
    let w = walker(&world, catalog.clone(), fast_config());

    let with_edge = w.paths().compute_with(t(2, 2), &HashSet::from([t(30, 2)]), &catalog);
    assert_eq!(with_edge.last(), Some(t(30, 2)));
    assert!(with_edge.contains(t(20, 2)), "shortcut beats the detour through the gap");
    assert_valid(world.graph.as_ref(), &catalog, &with_edge);

    let walking = w.paths().compute_with(t(2, 2), &HashSet::from([t(30, 2)]), &TransportCatalog::empty());
    assert!(walking.contains(t(15, 18)));
    assert_valid(world.graph.as_ref(), &TransportCatalog::empty(), &walking);
    assert!(walking.len() > with_edge.len());
}

#[test]
fn reachability_queries() {
    let world = FakeWorld::new(walled_world(), t(2, 2));
    let w = walker(&world, TransportCatalog::empty(), fast_config());

    assert!(w.can_reach(t(30, 10)));
    assert!(w.can_reach(t(2, 2)));
    // inside the wall: the path ends next to it, which counts for a 1x1 object
    assert!(w.can_reach(t(15, 5)));

    assert_eq!(w.total_tiles(t(0, 0), t(5, 0)), 6);
    // ending beside a blocked tile still overlaps its 2x2 square
    assert_eq!(w.total_tiles(t(0, 0), t(15, 5)), 15);
    assert_eq!(w.total_tiles(t(0, 0), TilePosition::new(5, 0, 1)), i32::MAX);

    let nearest = w.nearest_accessible_target(&[t(15, 3), t(8, 8)], 2);
    assert_eq!(nearest, Some(t(8, 8)));
    assert_eq!(w.nearest_accessible_target(&[], 2), None);
}

#[test]
fn edges_on_a_path_and_missing_items() {
    let world = FakeWorld::open(60, 10, t(0, 5));
    world.give_items([563]);
    let spell = Transport::new(None, t(50, 5), TransportKind::TeleportSpell)
        .with_selector("Varrock Teleport")
        .with_items([563, 554]);
    let catalog = TransportCatalog::new([spell]).unwrap();
    let w = walker(&world, catalog, fast_config());

    let path = Path::new(vec![t(0, 5), t(50, 5), t(51, 5)]);
    let used = w.transports_for_path(&path, 0, None);
    assert_eq!(used.len(), 1);
    assert_eq!(used[0].kind, TransportKind::TeleportSpell);
    assert_eq!(w.missing_transport_items(&path).into_iter().collect::<Vec<_>>(), vec![554]);
}

#[test]
fn banked_teleport_makes_the_bank_route_faster() {
    let spec = GridSpec { banks: vec![t(4, 5)], ..GridSpec::rect(0, 0, 100, 10) };
    let graph = GridGraph::new(spec).unwrap();
    let banks = graph.banks().to_vec();
    let world = FakeWorld::new(graph, t(0, 5));
    let tablet = Transport::new(None, t(88, 5), TransportKind::TeleportItem).with_items([8007]);
    let w = walker(&world, TransportCatalog::new([tablet]).unwrap(), fast_config()).with_banks(banks);

    // nothing to withdraw: walking is all there is
    let plain = w.compare_routes(t(90, 5));
    assert!(plain.is_direct_faster());
    assert_eq!(plain.nearest_bank, None);

    w.set_bank_profile(AgentProfile::with_items([8007]));
    let report = w.compare_routes(t(90, 5));
    assert_eq!(report.nearest_bank, Some(t(4, 5)));
    assert!(!report.is_direct_faster());
    assert!(report.tile_savings() > 50);
    assert_eq!(report.path_from_bank.first(), Some(t(4, 5)));
}
