use traffic_core::simulation::{
    demo, LaneId, PathStep, Pathfinder, RoadNetwork, SegmentEnd, SegmentId, Vec2,
    DEFAULT_SEARCH_RADIUS,
};

/// A: (0,0)-(100,0) joined end-to-start with B: (100,0)-(200,0)
fn chain() -> (RoadNetwork, SegmentId, SegmentId) {
    let mut network = RoadNetwork::new();
    let a = network.create_road(Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0));
    let b = network.create_road(Vec2::new(100.0, 0.0), Vec2::new(200.0, 0.0));
    network.connect_with_intersection(a, SegmentEnd::End, b, SegmentEnd::Start);
    (network, a, b)
}

fn segments_of(path: &[PathStep]) -> Vec<SegmentId> {
    path.iter().map(|step| step.segment).collect()
}

/// Routing across a two-segment chain visits both in order
#[test]
fn test_path_along_chain() {
    let (network, a, b) = chain();
    let mut pathfinder = Pathfinder::new();

    let path = pathfinder.find_path(
        &network,
        Vec2::new(10.0, 5.0),
        Vec2::new(150.0, 5.0),
        DEFAULT_SEARCH_RADIUS,
    );
    assert_eq!(
        path,
        vec![PathStep::new(a, LaneId(0)), PathStep::new(b, LaneId(0))]
    );

    let back = pathfinder.find_path(
        &network,
        Vec2::new(150.0, 5.0),
        Vec2::new(10.0, 5.0),
        DEFAULT_SEARCH_RADIUS,
    );
    assert_eq!(segments_of(&back), vec![b, a]);
}

/// Both points on one segment give a single-step route
#[test]
fn test_path_on_same_segment() {
    let (network, a, _) = chain();
    let mut pathfinder = Pathfinder::new();

    let path = pathfinder.find_path(
        &network,
        Vec2::new(10.0, 0.0),
        Vec2::new(90.0, 0.0),
        DEFAULT_SEARCH_RADIUS,
    );
    assert_eq!(path, vec![PathStep::new(a, LaneId(0))]);
}

/// Unconnected segments have no route
#[test]
fn test_path_between_disconnected_segments_is_empty() {
    let (mut network, _, _) = chain();
    network.create_road(Vec2::new(0.0, 300.0), Vec2::new(100.0, 300.0));
    let mut pathfinder = Pathfinder::new();

    let path = pathfinder.find_path(
        &network,
        Vec2::new(10.0, 0.0),
        Vec2::new(50.0, 300.0),
        DEFAULT_SEARCH_RADIUS,
    );
    assert!(path.is_empty());
}

/// Points farther than the search radius from any road have no route
#[test]
fn test_path_outside_search_radius_is_empty() {
    let (network, _, _) = chain();
    let mut pathfinder = Pathfinder::new();

    assert!(pathfinder
        .find_path(&network, Vec2::new(50.0, 80.0), Vec2::new(150.0, 0.0), 50.0)
        .is_empty());
    assert!(pathfinder
        .find_path(&network, Vec2::new(50.0, 0.0), Vec2::new(150.0, -80.0), 50.0)
        .is_empty());
    assert!(pathfinder
        .find_path(&RoadNetwork::new(), Vec2::ZERO, Vec2::ONE, 50.0)
        .is_empty());
}

/// Grid routes are connected and run between the snapped segments
#[test]
fn test_grid_route_is_connected() {
    let network = demo::build_grid_network(4, 4, 100.0, Vec2::ZERO);
    let mut pathfinder = Pathfinder::new();

    let from = Vec2::new(50.0, 0.0);
    let to = Vec2::new(300.0, 250.0);
    let path = pathfinder.find_path(&network, from, to, DEFAULT_SEARCH_RADIUS);

    assert!(path.len() >= 2, "expected a multi-segment route, got {:?}", path);
    assert_eq!(path.first().map(|s| s.segment), network.find_nearest_segment(from, 50.0));
    assert_eq!(path.last().map(|s| s.segment), network.find_nearest_segment(to, 50.0));
    for pair in path.windows(2) {
        assert!(
            network.neighbors(pair[0].segment).contains(&pair[1].segment),
            "{:?} and {:?} do not share an intersection",
            pair[0].segment,
            pair[1].segment
        );
    }
    assert!(path.iter().all(|step| step.lane == LaneId(0)));
}

/// Identical networks route identically
#[test]
fn test_routing_is_deterministic() {
    let first = demo::build_grid_network(5, 5, 80.0, Vec2::ZERO);
    let second = demo::build_grid_network(5, 5, 80.0, Vec2::ZERO);

    let from = Vec2::new(40.0, 0.0);
    let to = Vec2::new(320.0, 280.0);
    let a = Pathfinder::new().find_path(&first, from, to, 50.0);
    let b = Pathfinder::new().find_path(&second, from, to, 50.0);
    assert!(!a.is_empty());
    assert_eq!(a, b);
}

/// Cached routes are dropped once the network changes
#[test]
fn test_cache_follows_network_edits() {
    let mut network = RoadNetwork::new();
    let a = network.create_road(Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0));
    let b = network.create_road(Vec2::new(100.0, 0.0), Vec2::new(200.0, 0.0));
    let c = network.create_road(Vec2::new(200.0, 0.0), Vec2::new(300.0, 0.0));
    network.connect_with_intersection(a, SegmentEnd::End, b, SegmentEnd::Start);
    network.connect_with_intersection(b, SegmentEnd::End, c, SegmentEnd::Start);

    let mut pathfinder = Pathfinder::new();
    assert_eq!(pathfinder.find_segment_route(&network, a, c), Some(vec![a, b, c]));
    assert_eq!(pathfinder.cached_routes(), 1);
    assert_eq!(pathfinder.find_segment_route(&network, a, c), Some(vec![a, b, c]));
    assert_eq!(pathfinder.cached_routes(), 1);

    network.remove_segment(b);
    assert_eq!(pathfinder.find_segment_route(&network, a, c), None);

    pathfinder.invalidate();
    assert_eq!(pathfinder.cached_routes(), 0);
}

/// Four one-lane roads joined pairwise by two intersections
fn paired(first: (usize, usize), second: (usize, usize)) -> (RoadNetwork, Vec<SegmentId>) {
    let mut network = RoadNetwork::new();
    let roads: Vec<_> = (0..4)
        .map(|i| {
            let y = i as f32 * 100.0;
            network.create_road(Vec2::new(0.0, y), Vec2::new(100.0, y))
        })
        .collect();
    for (from, to) in [first, second] {
        network.connect_with_intersection(
            roads[from],
            SegmentEnd::End,
            roads[to],
            SegmentEnd::Start,
        );
    }
    (network, roads)
}

/// Replacing a shared network in place never serves routes from the old one
#[test]
fn test_cache_ignores_replaced_network() {
    let (chained, roads) = paired((0, 1), (1, 2));
    let (rewired, _) = paired((0, 2), (1, 3));
    assert_eq!(chained.revision(), rewired.revision());
    assert_ne!(chained.generation(), rewired.generation());

    let shared = chained.into_shared();
    let mut pathfinder = Pathfinder::new();
    assert_eq!(
        pathfinder.find_segment_route(&shared.borrow(), roads[0], roads[2]),
        Some(vec![roads[0], roads[1], roads[2]])
    );

    *shared.borrow_mut() = rewired;
    assert_eq!(
        pathfinder.find_segment_route(&shared.borrow(), roads[0], roads[2]),
        Some(vec![roads[0], roads[2]])
    );
}

/// Clones and cleared networks count as new networks
#[test]
fn test_generation_changes_on_clone_and_clear() {
    let (mut network, _) = paired((0, 1), (1, 2));
    let copy = network.clone();
    assert_eq!(copy.revision(), network.revision());
    assert_ne!(copy.generation(), network.generation());

    let before = network.version();
    network.clear();
    assert_ne!(network.generation(), before.0);
    assert!(network.revision() > before.1);
}

/// A* prefers the shorter branch of a diamond even when the longer one has
/// lower ids
#[test]
fn test_route_takes_cheaper_branch() {
    let mut network = RoadNetwork::new();
    let start = network.create_road(Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0));
    let goal = network.create_road(Vec2::new(200.0, 0.0), Vec2::new(300.0, 0.0));
    let upper_in = network.create_road(Vec2::new(100.0, 0.0), Vec2::new(150.0, 200.0));
    let upper_out = network.create_road(Vec2::new(150.0, 200.0), Vec2::new(200.0, 0.0));
    let lower_in = network.create_road(Vec2::new(100.0, 0.0), Vec2::new(150.0, -20.0));
    let lower_out = network.create_road(Vec2::new(150.0, -20.0), Vec2::new(200.0, 0.0));

    let split = network.create_intersection(Vec2::new(100.0, 0.0));
    let merge = network.create_intersection(Vec2::new(200.0, 0.0));
    for (junction, segment, end) in [
        (split, start, SegmentEnd::End),
        (split, upper_in, SegmentEnd::Start),
        (split, lower_in, SegmentEnd::Start),
        (merge, upper_out, SegmentEnd::End),
        (merge, lower_out, SegmentEnd::End),
        (merge, goal, SegmentEnd::Start),
    ] {
        assert!(network.attach_segment(junction, segment, end));
    }
    network.connect_with_intersection(upper_in, SegmentEnd::End, upper_out, SegmentEnd::Start);
    network.connect_with_intersection(lower_in, SegmentEnd::End, lower_out, SegmentEnd::Start);

    let mut pathfinder = Pathfinder::new();
    assert_eq!(
        pathfinder.find_segment_route(&network, start, goal),
        Some(vec![start, lower_in, lower_out, goal])
    );

    // With the short branch gone the detour is still found
    network.remove_segment(lower_in);
    assert_eq!(
        pathfinder.find_segment_route(&network, start, goal),
        Some(vec![start, upper_in, upper_out, goal])
    );
}
