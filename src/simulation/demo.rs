//! Canned scenario used by the headless runner and tests

use anyhow::{Context, Result};
use log::{debug, info};
use rand::seq::IndexedRandom;
use rand::Rng;

use super::road_network::{LaneType, RoadNetwork};
use super::types::{
    EntityId, IntersectionId, LaneId, PathStep, SegmentEnd, SegmentId, Vec2, DEFAULT_LANE_WIDTH,
};
use super::world::TrafficSimulation;

/// Builds a `cols` x `rows` grid of junctions `spacing` apart, starting at
/// `origin`, with a two-lane segment between each pair of neighbours.
///
/// Every junction allows every lane of each attached segment onto every
/// lane of the others.
pub fn build_grid_network(cols: usize, rows: usize, spacing: f32, origin: Vec2) -> RoadNetwork {
    let mut network = RoadNetwork::new();
    let point = |col: usize, row: usize| origin + Vec2::new(col as f32, row as f32) * spacing;

    let mut junctions: Vec<Vec<IntersectionId>> = Vec::with_capacity(rows);
    for row in 0..rows {
        let line = (0..cols)
            .map(|col| network.create_intersection(point(col, row)))
            .collect();
        junctions.push(line);
    }

    let add_road = |network: &mut RoadNetwork, from: (usize, usize), to: (usize, usize)| {
        let segment = network.create_segment(point(from.0, from.1), point(to.0, to.1));
        network.add_lane(segment, DEFAULT_LANE_WIDTH, LaneType::Driving);
        network.add_lane(segment, DEFAULT_LANE_WIDTH, LaneType::Driving);
        network.attach_segment(junctions[from.1][from.0], segment, SegmentEnd::Start);
        network.attach_segment(junctions[to.1][to.0], segment, SegmentEnd::End);
    };

    for row in 0..rows {
        for col in 0..cols {
            if col + 1 < cols {
                add_road(&mut network, (col, row), (col + 1, row));
            }
            if row + 1 < rows {
                add_road(&mut network, (col, row), (col, row + 1));
            }
        }
    }

    for junction in junctions.iter().flatten() {
        connect_all_lanes(&mut network, *junction);
    }

    info!(
        "Built {}x{} grid: {} segments, {} intersections",
        cols,
        rows,
        network.segment_count(),
        network.intersection_count()
    );
    network
}

/// Allows every lane of each attached segment onto every lane of the others
fn connect_all_lanes(network: &mut RoadNetwork, junction: IntersectionId) {
    let Some(intersection) = network.intersection(junction) else {
        return;
    };
    let lanes: Vec<(SegmentId, usize)> = intersection
        .connected_segments()
        .filter_map(|segment| Some((segment, network.segment(segment)?.lane_count())))
        .collect();

    for &(from, from_lanes) in &lanes {
        for &(to, to_lanes) in &lanes {
            if from == to {
                continue;
            }
            for from_lane in 0..from_lanes as u32 {
                for to_lane in 0..to_lanes as u32 {
                    network.define_connection(
                        junction,
                        PathStep::new(from, LaneId(from_lane)),
                        PathStep::new(to, LaneId(to_lane)),
                    );
                }
            }
        }
    }
}

/// Spawns `count` vehicles at random road points and routes each one to a
/// random destination elsewhere on the network.
///
/// Vehicles that cannot be routed are still spawned and simply drift.
pub fn populate<R: Rng>(
    sim: &mut TrafficSimulation,
    count: usize,
    rng: &mut R,
) -> Result<Vec<EntityId>> {
    let network = sim
        .road_network()
        .context("Cannot populate a simulation without a road network")?;
    let segments: Vec<(SegmentId, f32)> = network
        .borrow()
        .segments()
        .map(|segment| (segment.id(), segment.length()))
        .collect();

    let mut vehicles = Vec::with_capacity(count);
    if segments.is_empty() {
        return Ok(vehicles);
    }

    sim.reserve(count);
    for _ in 0..count {
        let (start, destination) = {
            let network = network.borrow();
            let random_point = |rng: &mut R| -> Option<Vec2> {
                let (segment, length) = *segments.choose(rng)?;
                let distance = rng.random_range(0.0..=length);
                network.point_at_distance(segment, distance)
            };
            (random_point(rng), random_point(rng))
        };
        let (Some(start), Some(destination)) = (start, destination) else {
            continue;
        };

        let id = sim.create_vehicle(start, Vec2::ZERO)?;
        if !sim.create_path(id, start, destination) {
            debug!("Vehicle {:?} has no route to {:?}", id, destination);
        }
        vehicles.push(id);
    }

    info!("Spawned {} vehicles", vehicles.len());
    Ok(vehicles)
}
