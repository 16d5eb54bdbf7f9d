use std::collections::{HashMap, HashSet};

use hecs::{Entity, World};
use rapier2d::prelude::RigidBodyHandle;

use crate::components::{Body, Pose};

/// Membership changes of the `{Body, Pose}` family since the last sync.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FamilyChanges {
    /// Entities that now carry both components but are not admitted yet.
    pub added: Vec<Entity>,
    /// Admitted entities that lost a component or were despawned.
    pub removed: Vec<Entity>,
    /// Admitted entities still in the family whose `Body` no longer links
    /// to the admitted native body, e.g. after the component was replaced.
    pub replaced: Vec<Entity>,
}

impl FamilyChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.replaced.is_empty()
    }
}

/// Diff the current family query against the `admitted` set.
pub fn family_changes(
    world: &World,
    admitted: &HashMap<Entity, RigidBodyHandle>,
) -> FamilyChanges {
    let mut changes = FamilyChanges::default();
    let mut current = HashSet::new();

    for (entity, (body, _)) in world.query::<(&Body, &Pose)>().iter() {
        current.insert(entity);
        match admitted.get(&entity) {
            None => changes.added.push(entity),
            Some(&handle) if body.native_handle() != Some(handle) => {
                changes.replaced.push(entity)
            }
            Some(_) => {}
        }
    }
    changes.removed = admitted
        .keys()
        .filter(|entity| !current.contains(entity))
        .copied()
        .collect();

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{lock, NativeLink, NativeWorld, SharedWorld};
    use glam::Vec2;
    use rapier2d::prelude::RigidBodyBuilder;

    fn bound(world: &SharedWorld) -> (Body, RigidBodyHandle) {
        let handle = lock(world).insert_body(RigidBodyBuilder::dynamic().build());
        let mut body = Body::default();
        body.bind(NativeLink::new(handle, world));
        (body, handle)
    }

    #[test]
    fn requires_both_body_and_pose() {
        let mut world = World::new();
        let full = world.spawn((Body::default(), Pose::new(Vec2::ZERO)));
        world.spawn((Body::default(),));
        world.spawn((Pose::new(Vec2::ONE),));

        let changes = family_changes(&world, &HashMap::new());
        assert_eq!(changes.added, vec![full]);
        assert!(changes.removed.is_empty());
    }

    #[test]
    fn admitted_members_are_not_added_again() {
        let native = NativeWorld::shared(Vec2::ZERO);
        let (body, handle) = bound(&native);
        let mut world = World::new();
        let e = world.spawn((body, Pose::default()));
        let admitted = HashMap::from([(e, handle)]);

        assert!(family_changes(&world, &admitted).is_empty());
    }

    #[test]
    fn despawn_and_component_loss_are_removals() {
        let native = NativeWorld::shared(Vec2::ZERO);
        let (body_a, handle_a) = bound(&native);
        let (body_b, handle_b) = bound(&native);
        let mut world = World::new();
        let despawned = world.spawn((body_a, Pose::default()));
        let stripped = world.spawn((body_b, Pose::default()));
        let admitted = HashMap::from([(despawned, handle_a), (stripped, handle_b)]);

        world.despawn(despawned).unwrap();
        world.remove_one::<Pose>(stripped).unwrap();

        let mut changes = family_changes(&world, &admitted);
        changes.removed.sort_by_key(|e| e.to_bits());
        let mut expected = vec![despawned, stripped];
        expected.sort_by_key(|e| e.to_bits());
        assert_eq!(changes.removed, expected);
        assert!(changes.added.is_empty());
        assert!(changes.replaced.is_empty());
    }

    #[test]
    fn swapped_body_component_is_a_replacement() {
        let native = NativeWorld::shared(Vec2::ZERO);
        let (body, handle) = bound(&native);
        let mut world = World::new();
        let e = world.spawn((body, Pose::default()));
        let admitted = HashMap::from([(e, handle)]);

        world.insert_one(e, Body::default()).unwrap();

        let changes = family_changes(&world, &admitted);
        assert_eq!(changes.replaced, vec![e]);
        assert!(changes.added.is_empty());
        assert!(changes.removed.is_empty());
    }
}
