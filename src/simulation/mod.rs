//! Standalone traffic simulation module
//!
//! An entity/component store, a road network with lanes and intersections,
//! an A* pathfinder over that network, and the per-tick systems that move
//! vehicles along it. Everything runs single-threaded behind
//! [`TrafficSimulation`].

mod components;
mod config;
pub mod demo;
mod entity;
mod pathfinder;
mod road_network;
mod snapshot;
pub mod systems;
mod types;
mod world;

pub use components::{
    Bounds, Collision, Component, ComponentKind, ComponentPools, PathFollowing, Pool, Signal,
    SignalPhase, Transform, Vehicle, MAX_COMPONENT_TYPES,
};
pub use config::{SignalTiming, SimConfig};
pub use entity::{ComponentMask, ComponentSet, EntityStore};
pub use pathfinder::Pathfinder;
pub use road_network::{Intersection, Lane, LaneType, RoadNetwork, Segment, SharedRoadNetwork};
pub use snapshot::{
    AttachmentRecord, ConnectionRecord, IntersectionRecord, LaneRecord, NetworkSnapshot,
    SegmentRecord,
};
pub use types::{
    EntityId, IntersectionId, LaneId, PathStep, SegmentEnd, SegmentId, Vec2,
    BOUNCE_RESTITUTION, COLLISION_DAMPING, DEFAULT_COLLISION_RADIUS, DEFAULT_GREEN_DURATION,
    DEFAULT_LANE_WIDTH, DEFAULT_MAX_SPEED, DEFAULT_RED_DURATION, DEFAULT_SEARCH_RADIUS,
    DEFAULT_VEHICLE_LENGTH, DEFAULT_VEHICLE_WIDTH, DEFAULT_WORLD_HEIGHT, DEFAULT_WORLD_WIDTH,
    DEFAULT_YELLOW_DURATION, DEGENERATE_LENGTH, HEADING_EPSILON, LOOK_AHEAD_BASE,
    LOOK_AHEAD_SPEED_FACTOR,
};
pub use world::{SimState, SimSummary, TrafficSimulation};
