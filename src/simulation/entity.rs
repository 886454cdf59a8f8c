//! Entity store: identifier allocation, component masks and queries
//!
//! Entities are plain integer ids. Each id owns a [`ComponentMask`] recording
//! which pools hold a component for it; the pools themselves live in
//! [`ComponentPools`].

use anyhow::{bail, Result};
use log::trace;

use super::components::{Component, ComponentKind, ComponentPools};
use super::types::EntityId;

/// Fixed-width bitset with one bit per [`ComponentKind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ComponentMask(u32);

impl ComponentMask {
    pub const EMPTY: ComponentMask = ComponentMask(0);

    pub fn of<S: ComponentSet>() -> Self {
        S::mask()
    }

    pub const fn with_kind(self, kind: ComponentKind) -> Self {
        ComponentMask(self.0 | kind.bit())
    }

    pub fn insert(&mut self, kind: ComponentKind) {
        self.0 |= kind.bit();
    }

    pub fn remove(&mut self, kind: ComponentKind) {
        self.0 &= !kind.bit();
    }

    pub fn contains(self, kind: ComponentKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// True when every bit of `other` is also set here
    pub fn is_superset_of(self, other: ComponentMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn kinds(self) -> impl Iterator<Item = ComponentKind> {
        ComponentKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

/// A set of component types that can be queried together
pub trait ComponentSet {
    fn mask() -> ComponentMask;
}

macro_rules! impl_component_set {
    ($($ty:ident),+) => {
        impl<$($ty: Component),+> ComponentSet for ($($ty,)+) {
            fn mask() -> ComponentMask {
                ComponentMask::EMPTY$(.with_kind($ty::KIND))+
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);

/// Owns entity ids, their masks and the component pools
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    masks: Vec<ComponentMask>,
    /// Liveness is tracked apart from the mask so an entity with no
    /// components yet still counts as created.
    alive: Vec<bool>,
    free_ids: Vec<EntityId>,
    alive_count: usize,
    pools: ComponentPools,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates an entity, reusing a freed id when one is available
    pub fn create(&mut self) -> EntityId {
        let id = match self.free_ids.pop() {
            Some(id) => id,
            None => {
                let id = EntityId(self.masks.len() as u32);
                self.masks.push(ComponentMask::EMPTY);
                self.alive.push(false);
                id
            }
        };

        self.masks[id.index()] = ComponentMask::EMPTY;
        self.alive[id.index()] = true;
        self.alive_count += 1;
        trace!("Created entity {:?}", id);
        id
    }

    /// Removes every component of `id` and recycles the id; no-op for dead ids
    pub fn destroy(&mut self, id: EntityId) {
        if !self.exists(id) {
            return;
        }

        let mask = self.masks[id.index()];
        for kind in mask.kinds() {
            self.pools.remove_kind(kind, id);
        }

        self.masks[id.index()] = ComponentMask::EMPTY;
        self.alive[id.index()] = false;
        self.free_ids.push(id);
        self.alive_count -= 1;
        trace!("Destroyed entity {:?}", id);
    }

    pub fn exists(&self, id: EntityId) -> bool {
        self.alive.get(id.index()).copied().unwrap_or(false)
    }

    /// Number of live entities
    pub fn alive_count(&self) -> usize {
        self.alive_count
    }

    pub fn mask(&self, id: EntityId) -> ComponentMask {
        if self.exists(id) {
            self.masks[id.index()]
        } else {
            ComponentMask::EMPTY
        }
    }

    /// Component kinds currently attached to `id`
    pub fn kinds(&self, id: EntityId) -> Vec<ComponentKind> {
        self.mask(id).kinds().collect()
    }

    /// Live entities carrying every component in `S`, in ascending id order
    pub fn query<S: ComponentSet>(&self) -> Vec<EntityId> {
        self.query_mask(S::mask())
    }

    pub fn query_mask(&self, required: ComponentMask) -> Vec<EntityId> {
        self.masks
            .iter()
            .enumerate()
            .filter(|(index, mask)| self.alive[*index] && mask.is_superset_of(required))
            .map(|(index, _)| EntityId(index as u32))
            .collect()
    }

    /// Attaches `component` to a live entity, replacing any previous value
    pub fn add<T: Component>(&mut self, id: EntityId, component: T) -> Result<&mut T> {
        debug_assert!(
            self.exists(id),
            "adding {} to dead entity {:?}",
            T::KIND.name(),
            id
        );
        if !self.exists(id) {
            bail!("Cannot add {} to entity {:?}: entity does not exist", T::KIND.name(), id);
        }

        self.masks[id.index()].insert(T::KIND);
        Ok(T::pool_mut(&mut self.pools).insert(id, component))
    }

    /// Detaches the component if present; safe to call when absent
    pub fn remove<T: Component>(&mut self, id: EntityId) -> Option<T> {
        if !self.exists(id) {
            return None;
        }
        self.masks[id.index()].remove(T::KIND);
        T::pool_mut(&mut self.pools).remove(id)
    }

    pub fn has<T: Component>(&self, id: EntityId) -> bool {
        self.mask(id).contains(T::KIND)
    }

    pub fn get<T: Component>(&self, id: EntityId) -> Option<&T> {
        if !self.has::<T>(id) {
            return None;
        }
        T::pool(&self.pools).get(id)
    }

    pub fn get_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        if !self.has::<T>(id) {
            return None;
        }
        T::pool_mut(&mut self.pools).get_mut(id)
    }

    /// Pre-sizes masks and pools for `capacity` entities
    pub fn reserve(&mut self, capacity: usize) {
        if capacity > self.masks.len() {
            let additional = capacity - self.masks.len();
            self.masks.reserve(additional);
            self.alive.reserve(additional);
        }
        self.pools.reserve(capacity);
    }

    /// Drops every entity and resets id allocation
    pub fn clear(&mut self) {
        self.masks.clear();
        self.alive.clear();
        self.free_ids.clear();
        self.alive_count = 0;
        self.pools.clear();
    }

    pub(crate) fn pools_mut(&mut self) -> &mut ComponentPools {
        &mut self.pools
    }
}
