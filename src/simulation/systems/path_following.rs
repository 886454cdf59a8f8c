use log::warn;

use crate::simulation::components::{PathFollowing, Transform, Vehicle};
use crate::simulation::config::SimConfig;
use crate::simulation::entity::EntityStore;
use crate::simulation::road_network::RoadNetwork;

/// Steers route-following vehicles toward a look-ahead point on their
/// current segment.
///
/// The look-ahead distance grows with speed. Once it runs past the end of a
/// segment the route cursor moves to the next step; a vehicle that has run
/// out of steps is told to stop. Progress along the segment advances by the
/// speed measured before this tick's steering is applied.
pub fn path_following_system(
    store: &mut EntityStore,
    network: &RoadNetwork,
    delta_secs: f32,
    config: &SimConfig,
) {
    for id in store.query::<(Transform, Vehicle, PathFollowing)>() {
        let pools = store.pools_mut();
        let (Some(transform), Some(vehicle), Some(path)) = (
            pools.transforms.get_mut(id),
            pools.vehicles.get_mut(id),
            pools.paths.get_mut(id),
        ) else {
            continue;
        };

        if path.has_arrived() {
            vehicle.target_speed = 0.0;
            continue;
        }

        let look_ahead = config.look_ahead(vehicle.current_speed);
        let mut target_distance = path.distance_along_segment() + look_ahead;

        let Some(mut step) = path.current_step() else {
            continue;
        };
        let Some(mut segment) = network.segment(step.segment) else {
            warn!("{:?} follows removed segment {:?}; skipping step", id, step.segment);
            path.skip();
            continue;
        };

        if target_distance > segment.length() {
            path.advance();
            match path.current_step() {
                Some(next) => step = next,
                None => {
                    vehicle.target_speed = 0.0;
                    continue;
                }
            }
            segment = match network.segment(step.segment) {
                Some(next) => next,
                None => {
                    warn!("{:?} follows removed segment {:?}; skipping step", id, step.segment);
                    path.skip();
                    continue;
                }
            };
            target_distance = look_ahead;
        }

        let target = segment.point_at_distance(target_distance);
        path.lane_direction = segment.direction_at_distance(target_distance);

        let desired = (target - transform.position).normalize_or_zero() * vehicle.max_speed;
        let steering = desired - transform.velocity;
        transform.velocity += steering * delta_secs;
        transform.velocity = transform.velocity.clamp_length_max(vehicle.max_speed);

        path.travel(vehicle.current_speed * delta_secs);
        vehicle.target_speed = vehicle.max_speed;
    }
}
