use std::collections::HashMap;

use hecs::Entity;
use rapier2d::prelude::*;

/// Turns rapier's collider-level contact events into entity pairs.
///
/// Every native shape is registered in `owners` when it is created, so a
/// collider handle resolves to the entity whose collider component made it.
/// Only `Started` events are forwarded; `Stopped` is ignored.
pub(crate) struct ContactTranslator<'a, F> {
    owners: &'a HashMap<ColliderHandle, Entity>,
    on_collision: F,
}

impl<'a, F> ContactTranslator<'a, F>
where
    F: Fn(Entity, Entity) + Send + Sync,
{
    pub(crate) fn new(owners: &'a HashMap<ColliderHandle, Entity>, on_collision: F) -> Self {
        Self {
            owners,
            on_collision,
        }
    }

    fn owner(&self, shape: ColliderHandle) -> Entity {
        match self.owners.get(&shape) {
            Some(&entity) => entity,
            None => panic!("contact on shape {shape:?} with no owning entity"),
        }
    }

    pub(crate) fn begin_contact(&self, shape_a: ColliderHandle, shape_b: ColliderHandle) {
        let a = self.owner(shape_a);
        let b = self.owner(shape_b);
        (self.on_collision)(a, b);
    }
}

impl<F> EventHandler for ContactTranslator<'_, F>
where
    F: Fn(Entity, Entity) + Send + Sync,
{
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if let CollisionEvent::Started(a, b, _) = event {
            self.begin_contact(a, b);
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}
