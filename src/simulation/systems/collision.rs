use log::trace;

use crate::simulation::components::{Collision, Transform, Vehicle};
use crate::simulation::config::SimConfig;
use crate::simulation::entity::EntityStore;
use crate::simulation::types::Vec2;

/// Pairwise circle collision with positional separation.
///
/// Pairs are visited as (i, j) with i < j in ascending id order, and each
/// resolution moves the entities before later pairs are tested. Overlapping
/// entities are pushed apart by half the overlap each; when both are
/// vehicles they also swap velocities, damped.
pub fn collision_system(store: &mut EntityStore, config: &SimConfig) {
    let ids = store.query::<(Transform, Collision)>();

    for id in &ids {
        if let Some(collider) = store.pools_mut().colliders.get_mut(*id) {
            collider.reset();
        }
    }

    for (i, &a) in ids.iter().enumerate() {
        for &b in &ids[i + 1..] {
            let both_vehicles = store.has::<Vehicle>(a) && store.has::<Vehicle>(b);
            let pools = store.pools_mut();

            let (Some((collider_a, collider_b)), Some((transform_a, transform_b))) = (
                pools.colliders.get_pair_mut(a, b),
                pools.transforms.get_pair_mut(a, b),
            ) else {
                continue;
            };

            let offset = transform_b.position - transform_a.position;
            let distance = offset.length();
            let min_distance = collider_a.radius + collider_b.radius;
            if distance >= min_distance {
                continue;
            }

            collider_a.colliding = true;
            collider_b.colliding = true;
            collider_a.colliding_with.push(b);
            collider_b.colliding_with.push(a);

            // Coincident centres have no line between them; pick +x.
            let normal = if distance > 0.0 {
                offset / distance
            } else {
                Vec2::X
            };
            let push = normal * ((min_distance - distance) * 0.5);
            transform_a.position -= push;
            transform_b.position += push;

            if both_vehicles {
                let velocity_a = transform_a.velocity;
                transform_a.velocity = transform_b.velocity * config.collision_damping;
                transform_b.velocity = velocity_a * config.collision_damping;
            }

            trace!("{:?} and {:?} collided (overlap {:.3})", a, b, min_distance - distance);
        }
    }
}
