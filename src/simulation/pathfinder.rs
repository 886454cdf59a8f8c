//! A* routing over the segment adjacency graph

use log::{debug, trace};
use petgraph::algo::astar;
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

use super::road_network::RoadNetwork;
use super::types::{LaneId, PathStep, SegmentId, Vec2};

/// Finds routes between world points and remembers segment-to-segment
/// results until the network changes
#[derive(Debug, Clone, Default)]
pub struct Pathfinder {
    /// `None` marks a pair already known to be unreachable
    cache: HashMap<(SegmentId, SegmentId), Option<Vec<SegmentId>>>,
    /// Network (generation, revision) the cache was filled against
    version: Option<(u64, u64)>,
}

impl Pathfinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every cached route
    pub fn invalidate(&mut self) {
        self.cache.clear();
        self.version = None;
    }

    pub fn cached_routes(&self) -> usize {
        self.cache.len()
    }

    /// Route between two world points.
    ///
    /// Each point snaps to the nearest segment within `search_radius`. The
    /// result runs from the start segment to the end segment inclusive, on
    /// lane 0 throughout. Empty when either point is off the network or no
    /// connected route exists.
    pub fn find_path(
        &mut self,
        network: &RoadNetwork,
        from: Vec2,
        to: Vec2,
        search_radius: f32,
    ) -> Vec<PathStep> {
        let Some(start) = network.find_nearest_segment(from, search_radius) else {
            debug!("No segment within {} of route start {:?}", search_radius, from);
            return Vec::new();
        };
        let Some(end) = network.find_nearest_segment(to, search_radius) else {
            debug!("No segment within {} of route end {:?}", search_radius, to);
            return Vec::new();
        };

        self.find_segment_route(network, start, end)
            .map(|segments| {
                segments
                    .into_iter()
                    .map(|segment| PathStep::new(segment, LaneId(0)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Segment sequence from `start` to `end` inclusive, or `None` if
    /// either is unknown or they are not connected
    pub fn find_segment_route(
        &mut self,
        network: &RoadNetwork,
        start: SegmentId,
        end: SegmentId,
    ) -> Option<Vec<SegmentId>> {
        if self.version != Some(network.version()) {
            self.cache.clear();
            self.version = Some(network.version());
        }

        if start == end {
            return network.segment(start).map(|_| vec![start]);
        }

        if let Some(route) = self.cache.get(&(start, end)) {
            trace!("Route cache hit {:?} -> {:?}", start, end);
            return route.clone();
        }

        let route = Self::search(network, start, end);
        self.cache.insert((start, end), route.clone());
        route
    }

    fn search(network: &RoadNetwork, start: SegmentId, end: SegmentId) -> Option<Vec<SegmentId>> {
        let start_node = network.node_of(start)?;
        let end_node = network.node_of(end)?;
        let goal = network.segment(end)?.midpoint();
        let graph = network.adjacency();

        let (cost, node_path) = astar(
            graph,
            start_node,
            |node| node == end_node,
            |edge| *edge.weight(),
            |node| {
                network
                    .segment(graph[node])
                    .map(|segment| segment.midpoint().distance(goal))
                    .unwrap_or(0.0)
            },
        )?;

        let route: Vec<SegmentId> = node_path.into_iter().map(|node| graph[node]).collect();
        debug!(
            "Routed {:?} -> {:?} over {} segments (cost {:.1})",
            start,
            end,
            route.len(),
            cost
        );
        Some(route)
    }
}
