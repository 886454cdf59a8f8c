//! Main simulation facade that ties everything together
//!
//! [`TrafficSimulation`] owns the entity store and the pathfinder, borrows a
//! shared road network, and runs the systems in a fixed order on every
//! [`update`](TrafficSimulation::update).

use anyhow::{bail, Context, Result};
use log::{debug, info, warn};

use super::components::{
    Bounds, Collision, PathFollowing, Signal, SignalPhase, Transform, Vehicle,
};
use super::config::SimConfig;
use super::entity::EntityStore;
use super::pathfinder::Pathfinder;
use super::road_network::SharedRoadNetwork;
use super::systems::{
    bounds_system, collision_system, movement_system, path_following_system, signal_system,
};
use super::types::{EntityId, IntersectionId, Vec2, DEFAULT_COLLISION_RADIUS};

/// Lifecycle of a simulation instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    /// No world size yet; updates are ignored
    Uninitialized,
    /// Bounds are set but no tick has run since the last (re)initialize
    Initialized,
    /// At least one update has run
    Running,
}

/// Point-in-time counters for reporting
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimSummary {
    pub elapsed: f32,
    pub ticks: u64,
    pub vehicles: usize,
    pub routed: usize,
    pub arrived: usize,
    pub colliding: usize,
    pub signals: usize,
    pub segments: usize,
    pub intersections: usize,
}

/// The simulation core
pub struct TrafficSimulation {
    store: EntityStore,
    config: SimConfig,
    state: SimState,

    width: f32,
    height: f32,
    keep_in_bounds: bool,
    bounds_entity: Option<EntityId>,

    /// Attached, not owned; an editor may hold the same network
    road_network: Option<SharedRoadNetwork>,
    pathfinder: Pathfinder,

    elapsed: f32,
    ticks: u64,
}

impl Default for TrafficSimulation {
    fn default() -> Self {
        Self::new()
    }
}

impl TrafficSimulation {
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    pub fn with_config(config: SimConfig) -> Self {
        Self {
            store: EntityStore::new(),
            config,
            state: SimState::Uninitialized,
            width: 0.0,
            height: 0.0,
            keep_in_bounds: true,
            bounds_entity: None,
            road_network: None,
            pathfinder: Pathfinder::new(),
            elapsed: 0.0,
            ticks: 0,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state != SimState::Uninitialized
    }

    /// Read access to the underlying entities and components
    pub fn entity_store(&self) -> &EntityStore {
        &self.store
    }

    /// Simulated seconds since the last (re)initialize
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Sets the world size and creates (or resizes) the global bounds entity
    pub fn initialize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;

        let bounds = Bounds {
            width,
            height,
            keep_in_bounds: self.keep_in_bounds,
        };
        let existing = self
            .bounds_entity
            .filter(|id| self.store.has::<Bounds>(*id));
        let id = existing.unwrap_or_else(|| self.store.create());
        match self.store.add(id, bounds) {
            Ok(_) => self.bounds_entity = Some(id),
            Err(err) => warn!("Failed to attach world bounds: {err:#}"),
        }

        self.state = SimState::Initialized;
        info!("Initialized simulation ({}x{})", width, height);
    }

    /// Drops every entity and re-initializes with the same world size.
    ///
    /// The attached road network is left alone.
    pub fn clear(&mut self) {
        if !self.is_initialized() {
            return;
        }

        self.store.clear();
        self.bounds_entity = None;
        self.pathfinder.invalidate();
        self.elapsed = 0.0;
        self.ticks = 0;
        info!("Cleared simulation");
        self.initialize(self.width, self.height);
    }

    /// Pre-sizes storage for `count` vehicles; not a capacity limit
    pub fn reserve(&mut self, count: usize) {
        // one extra slot for the bounds entity
        self.store.reserve(count + 1);
    }

    pub fn keep_in_bounds(&self) -> bool {
        self.keep_in_bounds
    }

    pub fn set_keep_in_bounds(&mut self, keep_in_bounds: bool) {
        self.keep_in_bounds = keep_in_bounds;
        if let Some(bounds) = self
            .bounds_entity
            .and_then(|id| self.store.get_mut::<Bounds>(id))
        {
            bounds.keep_in_bounds = keep_in_bounds;
        }
    }

    /// Attaches a shared road network, enabling path following.
    ///
    /// Cached routes from any previous network are dropped.
    pub fn set_road_network(&mut self, network: SharedRoadNetwork) {
        self.pathfinder.invalidate();
        self.road_network = Some(network);
        info!("Attached road network");
    }

    pub fn detach_road_network(&mut self) -> Option<SharedRoadNetwork> {
        self.pathfinder.invalidate();
        self.road_network.take()
    }

    pub fn road_network(&self) -> Option<SharedRoadNetwork> {
        self.road_network.clone()
    }

    /// Spawns a vehicle with a transform, vehicle data and a circle collider
    pub fn create_vehicle(&mut self, position: Vec2, velocity: Vec2) -> Result<EntityId> {
        if !self.is_initialized() {
            bail!("Cannot create vehicle before the simulation is initialized");
        }

        let vehicle = Vehicle::new(self.config.max_speed)
            .with_dimensions(self.config.vehicle_length, self.config.vehicle_width);
        let radius = self
            .config
            .collision_radius
            .or_else(|| vehicle.bounding_radius())
            .unwrap_or(DEFAULT_COLLISION_RADIUS);

        let id = self.store.create();
        self.store
            .add(id, Transform::new(position, velocity))
            .context("Failed to attach transform to new vehicle")?;
        self.store.add(id, vehicle)?;
        self.store.add(id, Collision::new(radius))?;

        debug!("Created vehicle {:?} at {:?}", id, position);
        Ok(id)
    }

    /// Removes a vehicle; `false` if `id` is not a live vehicle
    pub fn destroy_vehicle(&mut self, id: EntityId) -> bool {
        if !self.store.has::<Vehicle>(id) {
            return false;
        }
        self.store.destroy(id);
        true
    }

    /// Live vehicles in ascending id order
    pub fn vehicle_ids(&self) -> Vec<EntityId> {
        self.store.query::<(Transform, Vehicle)>()
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicle_ids().len()
    }

    pub fn position(&self, id: EntityId) -> Option<Vec2> {
        self.store.get::<Transform>(id).map(|t| t.position)
    }

    pub fn velocity(&self, id: EntityId) -> Option<Vec2> {
        self.store.get::<Transform>(id).map(|t| t.velocity)
    }

    pub fn heading(&self, id: EntityId) -> Option<f32> {
        self.store.get::<Transform>(id).map(|t| t.heading)
    }

    /// Entities `id` overlapped during the last tick
    pub fn colliding_with(&self, id: EntityId) -> Option<&[EntityId]> {
        self.store
            .get::<Collision>(id)
            .map(|c| c.colliding_with.as_slice())
    }

    /// `None` if the entity has no route assigned
    pub fn has_arrived(&self, id: EntityId) -> Option<bool> {
        self.store.get::<PathFollowing>(id).map(PathFollowing::has_arrived)
    }

    /// Routes a vehicle between two world points over the attached network.
    ///
    /// Returns `false` when there is no network, `id` is not a vehicle, or
    /// no route exists; the vehicle's previous route is then left unchanged.
    pub fn create_path(&mut self, id: EntityId, from: Vec2, to: Vec2) -> bool {
        if !self.store.has::<Vehicle>(id) {
            return false;
        }
        let Some(network) = &self.road_network else {
            debug!("No road network attached; cannot route {:?}", id);
            return false;
        };

        let path = self.pathfinder.find_path(
            &network.borrow(),
            from,
            to,
            self.config.search_radius,
        );
        if path.is_empty() {
            debug!("No route for {:?} from {:?} to {:?}", id, from, to);
            return false;
        }

        debug!("Routed {:?} over {} steps", id, path.len());
        match self.store.get_mut::<PathFollowing>(id) {
            Some(existing) => {
                existing.set_path(path);
                true
            }
            None => self.store.add(id, PathFollowing::new(path)).is_ok(),
        }
    }

    /// Creates a stand-alone signal entity using the configured timing
    pub fn create_signal(&mut self, intersection: Option<IntersectionId>) -> EntityId {
        let mut signal = Signal::new(self.config.signal_timing);
        signal.intersection = intersection;

        let id = self.store.create();
        if let Err(err) = self.store.add(id, signal) {
            warn!("Failed to attach signal: {err:#}");
        }
        id
    }

    pub fn signal(&self, id: EntityId) -> Option<&Signal> {
        self.store.get::<Signal>(id)
    }

    pub fn signal_phase(&self, id: EntityId) -> Option<SignalPhase> {
        self.signal(id).map(|s| s.phase)
    }

    /// Advances the simulation by one tick.
    ///
    /// Systems run in this order: movement, bounds, path following (only
    /// with a network attached), collision, signals.
    pub fn update(&mut self, delta_secs: f32) {
        if !self.is_initialized() {
            warn!("update called before initialize; ignoring");
            return;
        }
        self.state = SimState::Running;

        movement_system(&mut self.store, delta_secs, &self.config);
        bounds_system(&mut self.store, &self.config);

        if let Some(network) = &self.road_network {
            match network.try_borrow() {
                Ok(network) => {
                    path_following_system(&mut self.store, &network, delta_secs, &self.config)
                }
                Err(_) => warn!("Road network is being edited; skipping path following"),
            }
        }

        collision_system(&mut self.store, &self.config);
        signal_system(&mut self.store, delta_secs);

        self.elapsed += delta_secs;
        self.ticks += 1;
    }

    pub fn summary(&self) -> SimSummary {
        let vehicles = self.vehicle_ids();
        let routed: Vec<&PathFollowing> = vehicles
            .iter()
            .filter_map(|id| self.store.get::<PathFollowing>(*id))
            .collect();
        let (segments, intersections) = self
            .road_network
            .as_ref()
            .and_then(|network| network.try_borrow().ok())
            .map(|network| (network.segment_count(), network.intersection_count()))
            .unwrap_or_default();

        SimSummary {
            elapsed: self.elapsed,
            ticks: self.ticks,
            vehicles: vehicles.len(),
            routed: routed.len(),
            arrived: routed.iter().filter(|p| p.has_arrived()).count(),
            colliding: vehicles
                .iter()
                .filter(|id| {
                    self.store
                        .get::<Collision>(**id)
                        .is_some_and(|c| c.colliding)
                })
                .count(),
            signals: self.store.query::<(Signal,)>().len(),
            segments,
            intersections,
        }
    }

    pub fn print_summary(&self) {
        let summary = self.summary();
        info!("=== Traffic Simulation Summary ===");
        info!("Time: {:.2}s ({} ticks)", summary.elapsed, summary.ticks);
        info!(
            "Segments: {}, Intersections: {}",
            summary.segments, summary.intersections
        );
        info!(
            "Vehicles: {} (routed {}, arrived {}, colliding {})",
            summary.vehicles, summary.routed, summary.arrived, summary.colliding
        );
        if summary.signals > 0 {
            info!("Signals: {}", summary.signals);
        }

        for id in self.vehicle_ids() {
            if let (Some(transform), Some(vehicle)) = (
                self.store.get::<Transform>(id),
                self.store.get::<Vehicle>(id),
            ) {
                let remaining = self
                    .store
                    .get::<PathFollowing>(id)
                    .map(|p| p.path().len().saturating_sub(p.cursor()))
                    .unwrap_or(0);
                debug!(
                    "  Vehicle {:?}: speed={:.1}, position=({:.1}, {:.1}), path_remaining={}",
                    id.0,
                    vehicle.current_speed,
                    transform.position.x,
                    transform.position.y,
                    remaining
                );
            }
        }
    }

    /// Renders roads, intersections and vehicles onto a character grid
    /// covering the world rectangle
    pub fn render_map(&self, columns: usize, rows: usize) -> String {
        let columns = columns.max(1);
        let rows = rows.max(1);
        let mut grid = vec![vec![' '; columns]; rows];

        let width = self.width.max(1.0);
        let height = self.height.max(1.0);
        let to_grid = |point: Vec2| -> (i32, i32) {
            let col = (point.x / width * (columns - 1) as f32).round() as i32;
            let row = (point.y / height * (rows - 1) as f32).round() as i32;
            (row, col)
        };
        let mut plot = |row: i32, col: i32, glyph: char, over: &[char]| {
            if row < 0 || col < 0 || row >= rows as i32 || col >= columns as i32 {
                return;
            }
            let cell = &mut grid[row as usize][col as usize];
            if over.contains(cell) {
                *cell = glyph;
            }
        };

        if let Some(network) = self
            .road_network
            .as_ref()
            .and_then(|network| network.try_borrow().ok())
        {
            for segment in network.segments() {
                let (start_row, start_col) = to_grid(segment.start());
                let (end_row, end_col) = to_grid(segment.end());

                // Bresenham line
                let dx = (end_col - start_col).abs();
                let dy = (end_row - start_row).abs();
                let sx = if start_col < end_col { 1 } else { -1 };
                let sy = if start_row < end_row { 1 } else { -1 };
                let mut err = dx - dy;
                let (mut x, mut y) = (start_col, start_row);

                loop {
                    plot(y, x, '.', &[' ']);
                    if x == end_col && y == end_row {
                        break;
                    }
                    let e2 = 2 * err;
                    if e2 > -dy {
                        err -= dy;
                        x += sx;
                    }
                    if e2 < dx {
                        err += dx;
                        y += sy;
                    }
                }
            }

            for intersection in network.intersections() {
                let (row, col) = to_grid(intersection.position());
                plot(row, col, '+', &[' ', '.']);
            }
        }

        for id in self.vehicle_ids() {
            if let Some(position) = self.position(id) {
                let (row, col) = to_grid(position);
                plot(row, col, 'C', &[' ', '.', '+']);
            }
        }

        let mut map = String::with_capacity((columns + 1) * rows);
        for row in &grid {
            map.extend(row.iter());
            map.push('\n');
        }
        map
    }

    pub fn draw_map(&self) {
        println!("\n=== World Map ===");
        println!("Legend: +=Intersection, C=Vehicle, .=Road");
        println!();
        print!("{}", self.render_map(80, 30));
        println!();
    }
}
