//! Component data and the per-type pools that own it
//!
//! The component set is closed: every type is tagged by a [`ComponentKind`]
//! variant, and the pool for a kind is a plain struct field, so looking up a
//! pool never depends on registration order.

use super::config::SignalTiming;
use super::types::{EntityId, IntersectionId, PathStep, Vec2};

/// Upper bound on the number of component kinds a mask can describe.
pub const MAX_COMPONENT_TYPES: usize = 32;

/// Tag of every component type known to the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ComponentKind {
    Transform = 0,
    Vehicle = 1,
    PathFollowing = 2,
    Collision = 3,
    Signal = 4,
    Bounds = 5,
}

impl ComponentKind {
    pub const COUNT: usize = 6;

    pub const ALL: [ComponentKind; Self::COUNT] = [
        ComponentKind::Transform,
        ComponentKind::Vehicle,
        ComponentKind::PathFollowing,
        ComponentKind::Collision,
        ComponentKind::Signal,
        ComponentKind::Bounds,
    ];

    pub const fn bit(self) -> u32 {
        1 << (self as u32)
    }

    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::Transform => "Transform",
            ComponentKind::Vehicle => "Vehicle",
            ComponentKind::PathFollowing => "PathFollowing",
            ComponentKind::Collision => "Collision",
            ComponentKind::Signal => "Signal",
            ComponentKind::Bounds => "Bounds",
        }
    }
}

// Adding a kind past the mask width must fail the build, not a tick.
const _: () = assert!(ComponentKind::COUNT <= MAX_COMPONENT_TYPES);

/// Position, velocity and advisory heading of an entity
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Radians, derived from velocity; only meaningful for rendering
    pub heading: f32,
}

impl Transform {
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        let heading = if velocity.length_squared() > 0.0 {
            velocity.y.atan2(velocity.x)
        } else {
            0.0
        };
        Self {
            position,
            velocity,
            heading,
        }
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

/// Vehicle-specific properties
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vehicle {
    pub max_speed: f32,
    /// Mirrors the transform's velocity magnitude after each movement pass
    pub current_speed: f32,
    pub target_speed: f32,
    pub length: Option<f32>,
    pub width: Option<f32>,
}

impl Vehicle {
    pub fn new(max_speed: f32) -> Self {
        Self {
            max_speed,
            current_speed: 0.0,
            target_speed: 0.0,
            length: None,
            width: None,
        }
    }

    pub fn with_dimensions(mut self, length: f32, width: f32) -> Self {
        self.length = Some(length);
        self.width = Some(width);
        self
    }

    /// Radius of the circle enclosing the vehicle footprint, if its
    /// dimensions are known
    pub fn bounding_radius(&self) -> Option<f32> {
        match (self.length, self.width) {
            (Some(length), Some(width)) => Some(length.max(width) * 0.5),
            (Some(extent), None) | (None, Some(extent)) => Some(extent * 0.5),
            (None, None) => None,
        }
    }
}

/// Route progress of a vehicle following a precomputed path
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathFollowing {
    path: Vec<PathStep>,
    cursor: usize,
    distance_along_segment: f32,
    /// Direction of the road at the last look-ahead point
    pub lane_direction: Vec2,
}

impl PathFollowing {
    pub fn new(path: Vec<PathStep>) -> Self {
        Self {
            path,
            ..Self::default()
        }
    }

    /// Replaces the route and rewinds progress to its first step
    pub fn set_path(&mut self, path: Vec<PathStep>) {
        self.path = path;
        self.cursor = 0;
        self.distance_along_segment = 0.0;
    }

    pub fn path(&self) -> &[PathStep] {
        &self.path
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_step(&self) -> Option<PathStep> {
        self.path.get(self.cursor).copied()
    }

    pub fn distance_along_segment(&self) -> f32 {
        self.distance_along_segment
    }

    pub fn has_arrived(&self) -> bool {
        self.cursor >= self.path.len()
    }

    pub(crate) fn advance(&mut self) {
        self.cursor += 1;
        self.distance_along_segment = 0.0;
    }

    /// Skips a step without resetting segment progress
    pub(crate) fn skip(&mut self) {
        self.cursor += 1;
    }

    pub(crate) fn travel(&mut self, distance: f32) {
        self.distance_along_segment += distance;
    }
}

/// Circle collider, plus the contacts found during the current tick
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Collision {
    pub radius: f32,
    pub colliding: bool,
    pub colliding_with: Vec<EntityId>,
}

impl Collision {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            colliding: false,
            colliding_with: Vec::new(),
        }
    }

    pub(crate) fn reset(&mut self) {
        self.colliding = false;
        self.colliding_with.clear();
    }
}

/// Phase of a traffic signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalPhase {
    Green,
    Yellow,
    Red,
}

impl SignalPhase {
    /// Phase that follows this one in the fixed Green -> Yellow -> Red cycle
    pub fn next(self) -> SignalPhase {
        match self {
            SignalPhase::Green => SignalPhase::Yellow,
            SignalPhase::Yellow => SignalPhase::Red,
            SignalPhase::Red => SignalPhase::Green,
        }
    }
}

/// Traffic signal state machine attached to an intersection approach
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal {
    pub phase: SignalPhase,
    pub time_remaining: f32,
    pub timing: SignalTiming,
    pub intersection: Option<IntersectionId>,
}

impl Signal {
    /// A signal that starts at the beginning of its green phase
    pub fn new(timing: SignalTiming) -> Self {
        Self {
            phase: SignalPhase::Green,
            time_remaining: timing.green,
            timing,
            intersection: None,
        }
    }

    pub fn duration_of(&self, phase: SignalPhase) -> f32 {
        match phase {
            SignalPhase::Green => self.timing.green,
            SignalPhase::Yellow => self.timing.yellow,
            SignalPhase::Red => self.timing.red,
        }
    }

    /// Counts the timer down and moves to the next phase once it runs out.
    ///
    /// Overshoot past zero is discarded: the new phase always starts with its
    /// full configured duration.
    pub fn tick(&mut self, delta_secs: f32) {
        self.time_remaining -= delta_secs;
        if self.time_remaining <= 0.0 {
            self.phase = self.phase.next();
            self.time_remaining = self.duration_of(self.phase);
        }
    }
}

/// World extents consulted by the bounds system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
    pub keep_in_bounds: bool,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            keep_in_bounds: true,
        }
    }
}

/// Dense, entity-indexed storage for one component type
#[derive(Debug, Clone)]
pub struct Pool<T> {
    slots: Vec<Option<T>>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T> Pool<T> {
    /// Stores `value` for `entity`, growing the pool if needed
    pub fn insert(&mut self, entity: EntityId, value: T) -> &mut T {
        let index = entity.index();
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        self.slots[index].insert(value)
    }

    pub fn get(&self, entity: EntityId) -> Option<&T> {
        self.slots.get(entity.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut T> {
        self.slots.get_mut(entity.index()).and_then(Option::as_mut)
    }

    /// Mutable access to two distinct entities at once
    pub fn get_pair_mut(&mut self, a: EntityId, b: EntityId) -> Option<(&mut T, &mut T)> {
        let (ia, ib) = (a.index(), b.index());
        if ia == ib || ia.max(ib) >= self.slots.len() {
            return None;
        }
        let (low, high) = self.slots.split_at_mut(ia.max(ib));
        let (first, second) = (low[ia.min(ib)].as_mut()?, high[0].as_mut()?);
        if ia < ib {
            Some((first, second))
        } else {
            Some((second, first))
        }
    }

    pub fn remove(&mut self, entity: EntityId) -> Option<T> {
        self.slots.get_mut(entity.index()).and_then(Option::take)
    }

    pub fn reserve(&mut self, capacity: usize) {
        if capacity > self.slots.len() {
            self.slots.reserve(capacity - self.slots.len());
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// One pool per component kind
#[derive(Debug, Clone, Default)]
pub struct ComponentPools {
    pub(crate) transforms: Pool<Transform>,
    pub(crate) vehicles: Pool<Vehicle>,
    pub(crate) paths: Pool<PathFollowing>,
    pub(crate) colliders: Pool<Collision>,
    pub(crate) signals: Pool<Signal>,
    pub(crate) bounds: Pool<Bounds>,
}

impl ComponentPools {
    /// Drops whatever component of `kind` the entity holds
    pub fn remove_kind(&mut self, kind: ComponentKind, entity: EntityId) {
        match kind {
            ComponentKind::Transform => {
                self.transforms.remove(entity);
            }
            ComponentKind::Vehicle => {
                self.vehicles.remove(entity);
            }
            ComponentKind::PathFollowing => {
                self.paths.remove(entity);
            }
            ComponentKind::Collision => {
                self.colliders.remove(entity);
            }
            ComponentKind::Signal => {
                self.signals.remove(entity);
            }
            ComponentKind::Bounds => {
                self.bounds.remove(entity);
            }
        }
    }

    pub fn reserve(&mut self, capacity: usize) {
        self.transforms.reserve(capacity);
        self.vehicles.reserve(capacity);
        self.paths.reserve(capacity);
        self.colliders.reserve(capacity);
        self.signals.reserve(capacity);
        self.bounds.reserve(capacity);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// A type that lives in one of the [`ComponentPools`]
pub trait Component: Sized + 'static {
    const KIND: ComponentKind;

    fn pool(pools: &ComponentPools) -> &Pool<Self>;

    fn pool_mut(pools: &mut ComponentPools) -> &mut Pool<Self>;
}

macro_rules! impl_component {
    ($ty:ty, $kind:ident, $field:ident) => {
        impl Component for $ty {
            const KIND: ComponentKind = ComponentKind::$kind;

            fn pool(pools: &ComponentPools) -> &Pool<Self> {
                &pools.$field
            }

            fn pool_mut(pools: &mut ComponentPools) -> &mut Pool<Self> {
                &mut pools.$field
            }
        }
    };
}

impl_component!(Transform, Transform, transforms);
impl_component!(Vehicle, Vehicle, vehicles);
impl_component!(PathFollowing, PathFollowing, paths);
impl_component!(Collision, Collision, colliders);
impl_component!(Signal, Signal, signals);
impl_component!(Bounds, Bounds, bounds);
