//! Per-tick systems
//!
//! Each system is a plain function over the entity store, run once per tick
//! in the order fixed by [`TrafficSimulation`](super::world::TrafficSimulation).

mod bounds;
mod collision;
mod movement;
mod path_following;
mod signals;

pub use bounds::bounds_system;
pub use collision::collision_system;
pub use movement::movement_system;
pub use path_following::path_following_system;
pub use signals::signal_system;
