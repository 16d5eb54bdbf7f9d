use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use glam::Vec2;
use hecs::{Entity, World};
use rapier2d::prelude::{ColliderHandle, RigidBodyBuilder, RigidBodyHandle};
use tracing::{debug, info, trace, warn};

use crate::components::{Body, BodyKind, CircleCollider, NativeShape, PolygonCollider, Pose};
use crate::config::PhysicsConfig;
use crate::engine::schedule::{Priority, Updatable};
use crate::engine::time::TimeSource;
use crate::error::PhysicsError;
use crate::native::{
    isometry_to_pose, lock, pose_to_isometry, to_native, NativeLink, NativeWorld, SharedWorld,
};
use crate::signals::{CollisionSignal, CollisionSink};

use super::contact::ContactTranslator;
use super::family::family_changes;

/// Creates body components without naming the engine behind them.
pub trait BodyFactory {
    fn create_body(&self) -> Body;
}

pub trait CircleColliderFactory {
    fn create_circle_collider(&self) -> CircleCollider;
}

pub trait PolygonColliderFactory {
    fn create_polygon_collider(&self) -> PolygonCollider;
}

/// Running counters, mostly for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhysicsStats {
    pub bodies_created: u64,
    pub bodies_destroyed: u64,
    pub shapes_created: u64,
    pub steps: u64,
    pub signals_forwarded: u64,
}

/// Keeps a rapier world in lockstep with the `{Body, Pose}` family of a scene.
///
/// Per tick: kinematic poses are pushed into the engine, the engine steps,
/// dynamic poses are read back. Static bodies are never touched. Contacts
/// that start during the step are published as [`CollisionSignal`]s.
pub struct PhysicsSystem {
    gravity: Vec2,
    velocity_iterations: NonZeroUsize,
    position_iterations: NonZeroUsize,
    priority: i32,
    native: Option<SharedWorld>,
    signals: Option<Arc<dyn CollisionSink>>,
    /// Admitted entities and their native bodies.
    admitted: HashMap<Entity, RigidBodyHandle>,
    /// Owning entity of every live native shape.
    shape_owners: HashMap<ColliderHandle, Entity>,
    stats: PhysicsStats,
}

impl std::fmt::Debug for PhysicsSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsSystem")
            .field("gravity", &self.gravity)
            .field("velocity_iterations", &self.velocity_iterations)
            .field("position_iterations", &self.position_iterations)
            .field("priority", &self.priority)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Default for PhysicsSystem {
    fn default() -> Self {
        Self::new(Priority::NORMAL)
    }
}

impl PhysicsSystem {
    pub fn new(priority: i32) -> Self {
        let defaults = PhysicsConfig::default();
        Self {
            gravity: defaults.gravity,
            velocity_iterations: iterations(defaults.velocity_iterations),
            position_iterations: iterations(defaults.position_iterations),
            priority,
            native: None,
            signals: None,
            admitted: HashMap::new(),
            shape_owners: HashMap::new(),
            stats: PhysicsStats::default(),
        }
    }

    /// Apply a configuration, validating it first.
    pub fn with_config(mut self, config: &PhysicsConfig) -> Result<Self, PhysicsError> {
        config.validate()?;
        self.set_gravity(config.gravity);
        self.velocity_iterations = iterations(config.velocity_iterations);
        self.position_iterations = iterations(config.position_iterations);
        Ok(self)
    }

    // -- configuration --

    pub fn set_gravity(&mut self, gravity: Vec2) -> &mut Self {
        self.gravity = gravity;
        if let Some(native) = &self.native {
            lock(native).set_gravity(gravity);
        }
        self
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn set_velocity_iterations(&mut self, count: i64) -> Result<&mut Self, PhysicsError> {
        self.velocity_iterations =
            positive(count).ok_or(PhysicsError::InvalidVelocityIterations(count))?;
        Ok(self)
    }

    pub fn velocity_iterations(&self) -> usize {
        self.velocity_iterations.get()
    }

    pub fn set_position_iterations(&mut self, count: i64) -> Result<&mut Self, PhysicsError> {
        self.position_iterations =
            positive(count).ok_or(PhysicsError::InvalidPositionIterations(count))?;
        Ok(self)
    }

    pub fn position_iterations(&self) -> usize {
        self.position_iterations.get()
    }

    // -- lifecycle --

    /// Create the simulation world with the current gravity. Collision
    /// signals go to `signals`; with `None` they are dropped.
    pub fn startup(&mut self, signals: Option<Arc<dyn CollisionSink>>) {
        self.native = Some(NativeWorld::shared(self.gravity));
        self.signals = signals;
        info!(gravity = ?self.gravity, "physics world started");
    }

    /// Discard the world and everything in it. Components keep their links,
    /// which simply stop resolving.
    pub fn shutdown(&mut self) {
        self.signals = None;
        self.native = None;
        self.admitted.clear();
        self.shape_owners.clear();
        info!("physics world shut down");
    }

    pub fn is_started(&self) -> bool {
        self.native.is_some()
    }

    pub fn stats(&self) -> PhysicsStats {
        self.stats
    }

    pub fn is_admitted(&self, entity: Entity) -> bool {
        self.admitted.contains_key(&entity)
    }

    pub fn admitted_count(&self) -> usize {
        self.admitted.len()
    }

    pub fn native_body_count(&self) -> usize {
        self.native.as_ref().map_or(0, |n| lock(n).bodies.len())
    }

    pub fn native_shape_count(&self) -> usize {
        self.native.as_ref().map_or(0, |n| lock(n).colliders.len())
    }

    /// Pose of the native body backing `entity`, if it is admitted.
    pub fn native_pose(&self, entity: Entity) -> Option<Pose> {
        let handle = *self.admitted.get(&entity)?;
        let native = lock(self.native.as_ref()?);
        native
            .bodies
            .get(handle)
            .map(|rb| isometry_to_pose(rb.position()))
    }

    fn shared_world(&self) -> Result<SharedWorld, PhysicsError> {
        self.native.clone().ok_or(PhysicsError::NotStarted)
    }

    // -- membership --

    /// Create the native body and shapes for an entity that just joined the
    /// `{Body, Pose}` family.
    ///
    /// # Panics
    /// If the entity is already admitted or lacks `Body` or `Pose`.
    pub fn on_entity_added(&mut self, world: &mut World, entity: Entity) -> Result<(), PhysicsError> {
        let shared = self.shared_world()?;
        assert!(
            !self.admitted.contains_key(&entity),
            "entity {entity:?} admitted twice"
        );

        let mut native = lock(&shared);
        let (handle, kind) = {
            let Ok((body, pose)) = world.query_one_mut::<(&mut Body, &Pose)>(entity) else {
                panic!("entity {entity:?} admitted without Body and Pose");
            };
            let (linvel, angvel) = body.cached_velocities();
            let (linear_damping, angular_damping) = body.cached_damping();
            let rb = RigidBodyBuilder::new(body.kind().into())
                .position(pose_to_isometry(pose))
                .linvel(to_native(linvel))
                .angvel(angvel)
                .linear_damping(linear_damping)
                .angular_damping(angular_damping)
                .build();
            let handle = native.insert_body(rb);
            body.bind(NativeLink::new(handle, &shared));
            (handle, body.kind())
        };
        self.admitted.insert(entity, handle);
        self.stats.bodies_created += 1;

        let mut shapes = 0;
        shapes +=
            self.attach_shape::<CircleCollider>(world, entity, &mut native, &shared, handle);
        shapes +=
            self.attach_shape::<PolygonCollider>(world, entity, &mut native, &shared, handle);

        debug!(?entity, ?kind, shapes, "native body created");
        Ok(())
    }

    /// Destroy the native body (and with it all shapes) of an entity that
    /// left the family. The entity may already be despawned.
    ///
    /// # Panics
    /// If the entity is not currently admitted.
    pub fn on_entity_removed(&mut self, world: &mut World, entity: Entity) -> Result<(), PhysicsError> {
        let shared = self.shared_world()?;
        let Some(handle) = self.admitted.remove(&entity) else {
            panic!("entity {entity:?} removed without a native body");
        };

        if let Ok(body) = world.query_one_mut::<&mut Body>(entity) {
            body.unbind();
        }
        release_shape::<CircleCollider>(world, entity);
        release_shape::<PolygonCollider>(world, entity);

        let removed_shapes = lock(&shared).remove_body(handle);
        for shape in &removed_shapes {
            self.shape_owners.remove(shape);
        }
        self.stats.bodies_destroyed += 1;

        debug!(?entity, shapes = removed_shapes.len(), "native body destroyed");
        Ok(())
    }

    /// Bring the admitted set in line with the current family: removals first,
    /// then admissions. An entity whose `Body` was replaced while admitted is
    /// removed and admitted again, so the new component gets bound.
    pub fn sync_family(&mut self, world: &mut World) -> Result<(), PhysicsError> {
        if !self.is_started() {
            return Err(PhysicsError::NotStarted);
        }
        let changes = family_changes(world, &self.admitted);
        for &entity in changes.removed.iter().chain(&changes.replaced) {
            self.on_entity_removed(world, entity)?;
        }
        for &entity in changes.replaced.iter().chain(&changes.added) {
            self.on_entity_added(world, entity)?;
        }
        Ok(())
    }

    fn attach_shape<C: NativeShape>(
        &mut self,
        world: &mut World,
        entity: Entity,
        native: &mut NativeWorld,
        shared: &SharedWorld,
        body: RigidBodyHandle,
    ) -> usize {
        let Ok(collider) = world.query_one_mut::<&mut C>(entity) else {
            return 0;
        };
        match collider.create_native_shape(native, shared, body) {
            Ok(shape) => {
                self.shape_owners.insert(shape, entity);
                self.stats.shapes_created += 1;
                1
            }
            Err(err) => {
                warn!(?entity, %err, "collider skipped");
                0
            }
        }
    }

    // -- tick --

    /// One full tick: collect kinematic poses, step, deploy dynamic poses.
    /// Contacts that begin during the step are forwarded as they happen.
    ///
    /// A non-positive or non-finite `elapsed` skips the step itself.
    pub fn tick(&mut self, world: &mut World, elapsed: f32) -> Result<(), PhysicsError> {
        let shared = self.shared_world()?;
        let mut native = lock(&shared);

        self.collect_transforms(world, &mut native);

        if elapsed.is_finite() && elapsed > 0.0 {
            let forwarded = self.step(&mut native, elapsed);
            native.clear_forces();
            self.stats.steps += 1;
            trace!(elapsed, forwarded, "physics step");
        } else {
            trace!(elapsed, "physics step skipped");
        }

        self.deploy_transforms(world, &native);
        Ok(())
    }

    /// Push scene poses of kinematic entities into their native bodies.
    fn collect_transforms(&self, world: &World, native: &mut NativeWorld) {
        for (entity, (body, pose)) in world.query::<(&Body, &Pose)>().iter() {
            if body.kind() != BodyKind::Kinematic {
                continue;
            }
            let Some(&handle) = self.admitted.get(&entity) else {
                continue;
            };
            if let Some(rb) = native.bodies.get_mut(handle) {
                rb.set_position(pose_to_isometry(pose), true);
            }
        }
    }

    /// Overwrite scene poses of dynamic entities with the simulated result.
    fn deploy_transforms(&self, world: &mut World, native: &NativeWorld) {
        for (entity, (body, pose)) in world.query_mut::<(&Body, &mut Pose)>() {
            if body.kind() != BodyKind::Dynamic {
                continue;
            }
            let Some(&handle) = self.admitted.get(&entity) else {
                continue;
            };
            if let Some(rb) = native.bodies.get(handle) {
                *pose = isometry_to_pose(rb.position());
            }
        }
    }

    /// Step the world, publishing each entity pair at most once per step.
    /// Returns how many signals were published.
    fn step(&mut self, native: &mut NativeWorld, elapsed: f32) -> usize {
        let reported: Mutex<HashSet<CollisionSignal>> = Mutex::new(HashSet::new());
        let signals = self.signals.as_deref();

        {
            let translator = ContactTranslator::new(&self.shape_owners, |a, b| {
                forward_collision(signals, &reported, CollisionSignal::new(a, b));
            });
            native.step(
                elapsed,
                self.velocity_iterations,
                self.position_iterations.get(),
                &translator,
            );
        }

        let forwarded = if signals.is_some() {
            reported.into_inner().unwrap_or_else(PoisonError::into_inner).len()
        } else {
            0
        };
        self.stats.signals_forwarded += forwarded as u64;
        forwarded
    }
}

/// Publish `signal` unless the pair was already reported this step. Without
/// a sink the signal is dropped.
fn forward_collision(
    sink: Option<&dyn CollisionSink>,
    reported: &Mutex<HashSet<CollisionSignal>>,
    signal: CollisionSignal,
) {
    let Some(sink) = sink else {
        return;
    };
    let first = reported
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(signal);
    if first {
        sink.queue_signal(signal);
    }
}

fn release_shape<C: NativeShape>(world: &mut World, entity: Entity) {
    if let Ok(collider) = world.query_one_mut::<&mut C>(entity) {
        collider.release_native_shape();
    }
}

fn iterations(count: u32) -> NonZeroUsize {
    NonZeroUsize::new(count as usize).unwrap_or(NonZeroUsize::MIN)
}

fn positive(count: i64) -> Option<NonZeroUsize> {
    usize::try_from(count).ok().and_then(NonZeroUsize::new)
}

impl Updatable for PhysicsSystem {
    fn priority(&self) -> i32 {
        self.priority
    }

    fn update(&mut self, world: &mut World, time: &dyn TimeSource) -> Result<(), PhysicsError> {
        self.sync_family(world)?;
        self.tick(world, time.elapsed())
    }
}

impl BodyFactory for PhysicsSystem {
    fn create_body(&self) -> Body {
        Body::default()
    }
}

impl CircleColliderFactory for PhysicsSystem {
    fn create_circle_collider(&self) -> CircleCollider {
        CircleCollider::default()
    }
}

impl PolygonColliderFactory for PhysicsSystem {
    fn create_polygon_collider(&self) -> PolygonCollider {
        PolygonCollider::default()
    }
}
