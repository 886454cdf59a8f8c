use crate::simulation::components::Transform;
use crate::simulation::config::SimConfig;
use crate::simulation::entity::EntityStore;

/// Integrates every transform's position by its velocity (explicit Euler).
///
/// Heading follows the velocity only while the speed exceeds the heading
/// epsilon, so a stopped vehicle keeps facing the way it was going. Vehicles also get
/// their `current_speed` refreshed from the velocity magnitude.
pub fn movement_system(store: &mut EntityStore, delta_secs: f32, config: &SimConfig) {
    for id in store.query::<(Transform,)>() {
        let pools = store.pools_mut();
        let Some(transform) = pools.transforms.get_mut(id) else {
            continue;
        };

        transform.position += transform.velocity * delta_secs;

        let velocity = transform.velocity;
        let speed = velocity.length();
        if speed > config.heading_epsilon {
            transform.heading = velocity.y.atan2(velocity.x);
        }

        if let Some(vehicle) = pools.vehicles.get_mut(id) {
            vehicle.current_speed = speed;
        }
    }
}

