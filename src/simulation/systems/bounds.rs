use log::trace;

use crate::simulation::components::{Bounds, Transform, Vehicle};
use crate::simulation::config::SimConfig;
use crate::simulation::entity::EntityStore;

/// The first live bounds entity governs the whole world
fn world_bounds(store: &EntityStore) -> Option<Bounds> {
    store
        .query::<(Bounds,)>()
        .first()
        .and_then(|id| store.get::<Bounds>(*id))
        .copied()
}

/// Keeps vehicles inside the world rectangle with an inelastic bounce.
///
/// Each axis is clamped independently; a clamped axis has its velocity
/// component reversed and scaled by the restitution factor.
pub fn bounds_system(store: &mut EntityStore, config: &SimConfig) {
    let Some(bounds) = world_bounds(store) else {
        return;
    };
    if !bounds.keep_in_bounds {
        return;
    }

    for id in store.query::<(Transform, Vehicle)>() {
        let Some(transform) = store.pools_mut().transforms.get_mut(id) else {
            continue;
        };

        let before = transform.position;
        bounce_axis(
            &mut transform.position.x,
            &mut transform.velocity.x,
            bounds.width,
            config.restitution,
        );
        bounce_axis(
            &mut transform.position.y,
            &mut transform.velocity.y,
            bounds.height,
            config.restitution,
        );

        if before != transform.position {
            trace!("{:?} bounced off bounds at {:?}", id, transform.position);
        }
    }
}

fn bounce_axis(position: &mut f32, velocity: &mut f32, limit: f32, restitution: f32) {
    if *position < 0.0 {
        *position = 0.0;
        *velocity = -*velocity * restitution;
    } else if *position > limit {
        *position = limit;
        *velocity = -*velocity * restitution;
    }
}
