//! Tunable parameters for a simulation instance

use super::types::{
    BOUNCE_RESTITUTION, COLLISION_DAMPING, DEFAULT_COLLISION_RADIUS, DEFAULT_GREEN_DURATION,
    DEFAULT_MAX_SPEED, DEFAULT_RED_DURATION, DEFAULT_SEARCH_RADIUS, DEFAULT_VEHICLE_LENGTH,
    DEFAULT_VEHICLE_WIDTH, DEFAULT_YELLOW_DURATION, HEADING_EPSILON, LOOK_AHEAD_BASE,
    LOOK_AHEAD_SPEED_FACTOR,
};

/// Phase durations of a traffic signal, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalTiming {
    pub green: f32,
    pub yellow: f32,
    pub red: f32,
}

impl Default for SignalTiming {
    fn default() -> Self {
        Self {
            green: DEFAULT_GREEN_DURATION,
            yellow: DEFAULT_YELLOW_DURATION,
            red: DEFAULT_RED_DURATION,
        }
    }
}

impl SignalTiming {
    pub fn new(green: f32, yellow: f32, red: f32) -> Self {
        Self { green, yellow, red }
    }

    /// Length of one full green-yellow-red cycle
    pub fn cycle(&self) -> f32 {
        self.green + self.yellow + self.red
    }
}

/// Simulation-wide tuning knobs.
///
/// Every field defaults to the matching constant in [`super::types`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Factor applied to a velocity component that bounced off the bounds
    pub restitution: f32,
    /// Factor applied to both velocities after a vehicle-vehicle exchange
    pub collision_damping: f32,
    pub max_speed: f32,
    pub vehicle_length: f32,
    pub vehicle_width: f32,
    /// Overrides the radius derived from the vehicle dimensions
    pub collision_radius: Option<f32>,
    pub look_ahead_base: f32,
    pub look_ahead_speed_factor: f32,
    /// Snap radius used when resolving route endpoints onto segments
    pub search_radius: f32,
    pub heading_epsilon: f32,
    pub signal_timing: SignalTiming,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            restitution: BOUNCE_RESTITUTION,
            collision_damping: COLLISION_DAMPING,
            max_speed: DEFAULT_MAX_SPEED,
            vehicle_length: DEFAULT_VEHICLE_LENGTH,
            vehicle_width: DEFAULT_VEHICLE_WIDTH,
            collision_radius: Some(DEFAULT_COLLISION_RADIUS),
            look_ahead_base: LOOK_AHEAD_BASE,
            look_ahead_speed_factor: LOOK_AHEAD_SPEED_FACTOR,
            search_radius: DEFAULT_SEARCH_RADIUS,
            heading_epsilon: HEADING_EPSILON,
            signal_timing: SignalTiming::default(),
        }
    }
}

impl SimConfig {
    /// Look-ahead distance along the road for a vehicle travelling at `speed`
    pub fn look_ahead(&self, speed: f32) -> f32 {
        speed * self.look_ahead_speed_factor + self.look_ahead_base
    }
}
