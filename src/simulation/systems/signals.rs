use log::trace;

use crate::simulation::components::Signal;
use crate::simulation::entity::EntityStore;

/// Runs every signal's phase timer.
///
/// Only signal state changes here; vehicles do not consult it.
pub fn signal_system(store: &mut EntityStore, delta_secs: f32) {
    for id in store.query::<(Signal,)>() {
        let Some(signal) = store.pools_mut().signals.get_mut(id) else {
            continue;
        };
        let phase = signal.phase;
        signal.tick(delta_secs);
        if signal.phase != phase {
            trace!("Signal {:?} changed {:?} -> {:?}", id, phase, signal.phase);
        }
    }
}
