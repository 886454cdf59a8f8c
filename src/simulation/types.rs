//! Core types for the traffic simulation
//!
//! Identifier newtypes, the shared 2D vector type and the tuning constants
//! used across the systems.

use serde::{Deserialize, Serialize};

pub use glam::Vec2;

/// Identifier of an entity in the [`EntityStore`](super::entity::EntityStore).
///
/// Carries no data of its own; it is only a key into the component pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl EntityId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A wrapper type for road segment IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub u32);

/// A wrapper type for intersection IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntersectionId(pub u32);

/// Index of a lane within its owning segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LaneId(pub u32);

impl LaneId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One hop of a route: a segment and the lane used on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PathStep {
    pub segment: SegmentId,
    pub lane: LaneId,
}

impl PathStep {
    pub fn new(segment: SegmentId, lane: LaneId) -> Self {
        Self { segment, lane }
    }
}

/// Which end of a segment attaches to an intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentEnd {
    Start,
    End,
}

impl SegmentEnd {
    pub fn is_start(self) -> bool {
        matches!(self, SegmentEnd::Start)
    }
}

/// Velocity components are multiplied by this (after negation) when a vehicle
/// is pushed back inside the world bounds.
pub const BOUNCE_RESTITUTION: f32 = 0.5;

/// Applied to both velocities after two vehicles exchange them on impact.
pub const COLLISION_DAMPING: f32 = 0.9;

/// Collision radius given to vehicles spawned through the facade.
pub const DEFAULT_COLLISION_RADIUS: f32 = 2.0;

/// Maximum speed of a freshly created vehicle, in units per second.
pub const DEFAULT_MAX_SPEED: f32 = 100.0;

/// Physical vehicle dimensions in world units
pub const DEFAULT_VEHICLE_LENGTH: f32 = 4.0;
pub const DEFAULT_VEHICLE_WIDTH: f32 = 2.0;

/// Look-ahead distance = speed * LOOK_AHEAD_SPEED_FACTOR + LOOK_AHEAD_BASE
pub const LOOK_AHEAD_BASE: f32 = 5.0;
pub const LOOK_AHEAD_SPEED_FACTOR: f32 = 2.0;

/// Radius used to snap world points onto the road network.
pub const DEFAULT_SEARCH_RADIUS: f32 = 50.0;

/// Heading only follows velocity while the speed exceeds this.
pub const HEADING_EPSILON: f32 = 0.1;

/// Width of a lane added without an explicit width.
pub const DEFAULT_LANE_WIDTH: f32 = 3.5;

/// Default signal phase durations in seconds
pub const DEFAULT_GREEN_DURATION: f32 = 30.0;
pub const DEFAULT_YELLOW_DURATION: f32 = 5.0;
pub const DEFAULT_RED_DURATION: f32 = 30.0;

/// World size used when the caller does not pick one.
pub const DEFAULT_WORLD_WIDTH: f32 = 800.0;
pub const DEFAULT_WORLD_HEIGHT: f32 = 600.0;

/// Segments shorter than this are treated as points by geometric queries.
pub const DEGENERATE_LENGTH: f32 = 0.0001;
