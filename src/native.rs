use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use glam::Vec2;
use rapier2d::prelude::*;

use crate::components::Pose;

// ---------------------------------------------------------------------------
// Conversion helpers, glam to nalgebra and back
// ---------------------------------------------------------------------------

pub(crate) fn to_native(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

pub(crate) fn from_native(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

pub(crate) fn pose_to_isometry(pose: &Pose) -> Isometry<Real> {
    Isometry::new(to_native(pose.translation), pose.rotation)
}

pub(crate) fn isometry_to_pose(iso: &Isometry<Real>) -> Pose {
    Pose {
        translation: from_native(&iso.translation.vector),
        rotation: iso.rotation.angle(),
    }
}

// ---------------------------------------------------------------------------
// NativeWorld
// ---------------------------------------------------------------------------

/// Everything rapier needs to step one simulation island.
///
/// Owned exclusively by `PhysicsSystem` behind an `Arc<Mutex<_>>`; components
/// only ever hold a [`NativeLink`] (weak) into it.
pub(crate) struct NativeWorld {
    gravity: Vector<Real>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    pub(crate) bodies: RigidBodySet,
    pub(crate) colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    /// Reused when submitting polygon vertices. Cleared before every use.
    pub(crate) scratch: Vec<Point<Real>>,
}

pub(crate) type SharedWorld = Arc<Mutex<NativeWorld>>;

/// Lock the world, recovering the guard if a previous holder panicked.
pub(crate) fn lock(world: &Mutex<NativeWorld>) -> MutexGuard<'_, NativeWorld> {
    world.lock().unwrap_or_else(PoisonError::into_inner)
}

impl NativeWorld {
    pub(crate) fn new(gravity: Vec2) -> Self {
        Self {
            gravity: to_native(gravity),
            params: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            scratch: Vec::new(),
        }
    }

    pub(crate) fn shared(gravity: Vec2) -> SharedWorld {
        Arc::new(Mutex::new(Self::new(gravity)))
    }

    pub(crate) fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = to_native(gravity);
    }

    #[cfg(test)]
    pub(crate) fn gravity(&self) -> Vec2 {
        from_native(&self.gravity)
    }

    pub(crate) fn insert_body(&mut self, body: RigidBody) -> RigidBodyHandle {
        self.bodies.insert(body)
    }

    pub(crate) fn insert_shape(
        &mut self,
        collider: Collider,
        parent: RigidBodyHandle,
    ) -> ColliderHandle {
        self.colliders
            .insert_with_parent(collider, parent, &mut self.bodies)
    }

    /// Remove a body together with every collider attached to it.
    /// Returns the handles of the colliders that went with it.
    pub(crate) fn remove_body(&mut self, handle: RigidBodyHandle) -> Vec<ColliderHandle> {
        let attached = self
            .bodies
            .get(handle)
            .map(|rb| rb.colliders().to_vec())
            .unwrap_or_default();
        self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        attached
    }

    /// Advance the simulation by `dt` seconds.
    pub(crate) fn step(
        &mut self,
        dt: Real,
        velocity_iterations: NonZeroUsize,
        position_iterations: usize,
        events: &dyn EventHandler,
    ) {
        self.params.dt = dt;
        self.params.num_solver_iterations = velocity_iterations;
        self.params.num_internal_stabilization_iterations = position_iterations;

        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            events,
        );
    }

    /// User forces accumulate in rapier until reset; the scene API treats a
    /// force as lasting exactly one step.
    pub(crate) fn clear_forces(&mut self) {
        for (_handle, rb) in self.bodies.iter_mut() {
            rb.reset_forces(false);
            rb.reset_torques(false);
        }
    }
}

// ---------------------------------------------------------------------------
// NativeLink
// ---------------------------------------------------------------------------

/// Non-owning reference from a component into a record owned by [`NativeWorld`].
///
/// Resolution fails once the world is dropped (shutdown) or the record is
/// removed: rapier handles are generational, so a stale handle finds nothing.
#[derive(Clone)]
pub(crate) struct NativeLink<H> {
    pub(crate) handle: H,
    world: Weak<Mutex<NativeWorld>>,
}

impl<H: Copy> NativeLink<H> {
    pub(crate) fn new(handle: H, world: &SharedWorld) -> Self {
        Self {
            handle,
            world: Arc::downgrade(world),
        }
    }

    /// Whether the owning world still exists. Does not lock it.
    pub(crate) fn is_live(&self) -> bool {
        self.world.strong_count() > 0
    }

    /// Run `f` against the locked world if it still exists.
    pub(crate) fn with_world<R>(&self, f: impl FnOnce(&mut NativeWorld, H) -> R) -> Option<R> {
        let world = self.world.upgrade()?;
        let mut guard = lock(&world);
        Some(f(&mut guard, self.handle))
    }
}

impl NativeLink<RigidBodyHandle> {
    pub(crate) fn read<R>(&self, f: impl FnOnce(&RigidBody) -> R) -> Option<R> {
        self.with_world(|world, handle| world.bodies.get(handle).map(f))
            .flatten()
    }

    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut RigidBody) -> R) -> Option<R> {
        self.with_world(|world, handle| world.bodies.get_mut(handle).map(f))
            .flatten()
    }
}

impl NativeLink<ColliderHandle> {
    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut Collider) -> R) -> Option<R> {
        self.with_world(|world, handle| world.colliders.get_mut(handle).map(f))
            .flatten()
    }
}
