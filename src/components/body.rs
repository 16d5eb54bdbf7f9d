use glam::Vec2;
use rapier2d::prelude::{Point, RigidBody, RigidBodyHandle, RigidBodyType};

use crate::components::Pose;
use crate::native::{from_native, to_native, NativeLink};

/// How a body participates in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyKind {
    /// Immovable. Neither pushed into nor read back from the engine.
    Static,
    /// Driven by the scene: its pose is pushed into the engine each tick.
    Kinematic,
    /// Driven by the engine: its pose is read back after each step.
    #[default]
    Dynamic,
}

impl From<BodyKind> for RigidBodyType {
    fn from(kind: BodyKind) -> Self {
        match kind {
            BodyKind::Static => RigidBodyType::Fixed,
            BodyKind::Kinematic => RigidBodyType::KinematicVelocityBased,
            BodyKind::Dynamic => RigidBodyType::Dynamic,
        }
    }
}

/// Rigid body component.
///
/// The fields here are always the logical value. While the entity is admitted
/// the component is linked to a native body, and every write is mirrored into
/// it; reads of velocities prefer the live native value.
pub struct Body {
    kind: BodyKind,
    linear_velocity: Vec2,
    angular_velocity: f32,
    linear_damping: f32,
    angular_damping: f32,
    native: Option<NativeLink<RigidBodyHandle>>,
}

impl Default for Body {
    fn default() -> Self {
        Self::new(BodyKind::default())
    }
}

/// A clone copies the logical state only and is never linked.
impl Clone for Body {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            linear_velocity: self.linear_velocity,
            angular_velocity: self.angular_velocity,
            linear_damping: self.linear_damping,
            angular_damping: self.angular_damping,
            native: None,
        }
    }
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Body")
            .field("kind", &self.kind)
            .field("linear_velocity", &self.linear_velocity)
            .field("angular_velocity", &self.angular_velocity)
            .field("linear_damping", &self.linear_damping)
            .field("angular_damping", &self.angular_damping)
            .field("native", &self.native_handle())
            .finish()
    }
}

impl Body {
    pub fn new(kind: BodyKind) -> Self {
        Self {
            kind,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            native: None,
        }
    }

    pub fn with_linear_velocity(mut self, velocity: Vec2) -> Self {
        self.linear_velocity = velocity;
        self
    }

    pub fn with_angular_velocity(mut self, velocity: f32) -> Self {
        self.angular_velocity = velocity;
        self
    }

    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    // -- native link --

    /// Handle of the native body, if one is linked and its world is alive.
    pub fn native_handle(&self) -> Option<RigidBodyHandle> {
        self.native
            .as_ref()
            .filter(|link| link.is_live())
            .map(|link| link.handle)
    }

    pub fn is_bound(&self) -> bool {
        self.native_handle().is_some()
    }

    pub(crate) fn bind(&mut self, link: NativeLink<RigidBodyHandle>) {
        self.native = Some(link);
    }

    pub(crate) fn unbind(&mut self) -> Option<NativeLink<RigidBodyHandle>> {
        self.native.take()
    }

    fn read_native<R>(&self, f: impl FnOnce(&RigidBody) -> R) -> Option<R> {
        self.native.as_ref()?.read(f)
    }

    fn write_native(&self, f: impl FnOnce(&mut RigidBody)) {
        if let Some(link) = &self.native {
            link.write(f);
        }
    }

    // -- kind --

    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: BodyKind) {
        self.kind = kind;
        self.write_native(|rb| rb.set_body_type(kind.into(), true));
    }

    // -- velocities --

    pub fn linear_velocity(&self) -> Vec2 {
        self.read_native(|rb| from_native(rb.linvel()))
            .unwrap_or(self.linear_velocity)
    }

    pub fn set_linear_velocity(&mut self, velocity: Vec2) -> &mut Self {
        self.linear_velocity = velocity;
        self.write_native(|rb| rb.set_linvel(to_native(velocity), true));
        self
    }

    pub fn angular_velocity(&self) -> f32 {
        self.read_native(|rb| rb.angvel())
            .unwrap_or(self.angular_velocity)
    }

    pub fn set_angular_velocity(&mut self, velocity: f32) -> &mut Self {
        self.angular_velocity = velocity;
        self.write_native(|rb| rb.set_angvel(velocity, true));
        self
    }

    // -- damping --

    pub fn linear_damping(&self) -> f32 {
        self.read_native(|rb| rb.linear_damping())
            .unwrap_or(self.linear_damping)
    }

    pub fn set_linear_damping(&mut self, damping: f32) {
        self.linear_damping = damping;
        self.write_native(|rb| rb.set_linear_damping(damping));
    }

    pub fn angular_damping(&self) -> f32 {
        self.read_native(|rb| rb.angular_damping())
            .unwrap_or(self.angular_damping)
    }

    pub fn set_angular_damping(&mut self, damping: f32) {
        self.angular_damping = damping;
        self.write_native(|rb| rb.set_angular_damping(damping));
    }

    // -- forces --

    /// Apply a force at the center of mass for the next step, waking the body.
    /// Without a native body there is nothing to push, so this does nothing.
    pub fn apply_force(&self, force: Vec2) {
        self.write_native(|rb| rb.add_force(to_native(force), true));
    }

    /// Apply a torque for the next step, waking the body. No-op while unlinked.
    pub fn apply_torque(&self, torque: f32) {
        self.write_native(|rb| rb.add_torque(torque, true));
    }

    // -- coordinate frames --
    //
    // While linked these use the native body's transform. Unlinked, the
    // world-space variants fall back to the entity's pose (zero if none is
    // given) and the local-space variants return zero.

    pub fn world_vector(&self, pose: Option<&Pose>, local: Vec2) -> Vec2 {
        self.read_native(|rb| from_native(&(rb.position() * to_native(local))))
            .unwrap_or_else(|| {
                pose.map(|p| p.matrix().transform_vector2(local))
                    .unwrap_or(Vec2::ZERO)
            })
    }

    pub fn world_point(&self, pose: Option<&Pose>, local: Vec2) -> Vec2 {
        self.read_native(|rb| {
            let p = rb.position() * Point::new(local.x, local.y);
            Vec2::new(p.x, p.y)
        })
        .unwrap_or_else(|| {
            pose.map(|p| p.matrix().transform_point2(local))
                .unwrap_or(Vec2::ZERO)
        })
    }

    pub fn local_vector(&self, world: Vec2) -> Vec2 {
        self.read_native(|rb| {
            from_native(&rb.position().inverse_transform_vector(&to_native(world)))
        })
        .unwrap_or(Vec2::ZERO)
    }

    pub fn local_point(&self, world: Vec2) -> Vec2 {
        self.read_native(|rb| {
            let p = rb
                .position()
                .inverse_transform_point(&Point::new(world.x, world.y));
            Vec2::new(p.x, p.y)
        })
        .unwrap_or(Vec2::ZERO)
    }

    /// Logical values to seed a new native body with.
    pub(crate) fn cached_velocities(&self) -> (Vec2, f32) {
        (self.linear_velocity, self.angular_velocity)
    }

    pub(crate) fn cached_damping(&self) -> (f32, f32) {
        (self.linear_damping, self.angular_damping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{lock, NativeWorld, SharedWorld};
    use rapier2d::prelude::{ColliderBuilder, RigidBodyBuilder};
    use std::f32::consts::FRAC_PI_2;
    use std::num::NonZeroUsize;

    fn bound_body(kind: BodyKind, pose: Pose) -> (SharedWorld, Body) {
        let world = NativeWorld::shared(Vec2::ZERO);
        let handle = lock(&world).insert_body(
            RigidBodyBuilder::new(kind.into())
                .translation(to_native(pose.translation))
                .rotation(pose.rotation)
                .build(),
        );
        let mut body = Body::new(kind);
        body.bind(NativeLink::new(handle, &world));
        (world, body)
    }

    #[test]
    fn unbound_defaults_are_zero() {
        let body = Body::default();
        assert_eq!(body.kind(), BodyKind::Dynamic);
        assert_eq!(body.linear_velocity(), Vec2::ZERO);
        assert_eq!(body.angular_velocity(), 0.0);
        assert!(!body.is_bound());
    }

    #[test]
    fn unbound_setters_cache_values() {
        let mut body = Body::new(BodyKind::Kinematic);
        body.set_linear_velocity(Vec2::new(1.0, 2.0))
            .set_angular_velocity(0.5);
        body.set_linear_damping(0.25);
        body.set_angular_damping(0.75);
        body.set_kind(BodyKind::Static);

        assert_eq!(body.kind(), BodyKind::Static);
        assert_eq!(body.linear_velocity(), Vec2::new(1.0, 2.0));
        assert_eq!(body.angular_velocity(), 0.5);
        assert_eq!(body.linear_damping(), 0.25);
        assert_eq!(body.angular_damping(), 0.75);
    }

    #[test]
    fn unbound_force_has_no_effect() {
        let body = Body::default();
        body.apply_force(Vec2::new(100.0, 0.0));
        body.apply_torque(5.0);
        assert_eq!(body.linear_velocity(), Vec2::ZERO);
        assert_eq!(body.angular_velocity(), 0.0);
    }

    #[test]
    fn bound_setters_write_through() {
        let (world, mut body) = bound_body(BodyKind::Dynamic, Pose::default());
        let handle = body.native_handle().unwrap();

        body.set_linear_velocity(Vec2::new(3.0, -1.0));
        body.set_angular_velocity(2.0);
        body.set_linear_damping(0.1);
        body.set_angular_damping(0.2);
        body.set_kind(BodyKind::Kinematic);

        let native = lock(&world);
        let rb = native.bodies.get(handle).unwrap();
        assert_eq!(from_native(rb.linvel()), Vec2::new(3.0, -1.0));
        assert_eq!(rb.angvel(), 2.0);
        assert_eq!(rb.linear_damping(), 0.1);
        assert_eq!(rb.angular_damping(), 0.2);
        assert_eq!(rb.body_type(), RigidBodyType::KinematicVelocityBased);
    }

    #[test]
    fn bound_getters_prefer_native_value() {
        let (world, body) = bound_body(BodyKind::Dynamic, Pose::default());
        let handle = body.native_handle().unwrap();

        lock(&world)
            .bodies
            .get_mut(handle)
            .unwrap()
            .set_linvel(to_native(Vec2::new(7.0, 0.0)), true);

        assert_eq!(body.linear_velocity(), Vec2::new(7.0, 0.0));
    }

    #[test]
    fn bound_force_accelerates_native_body() {
        let world = NativeWorld::shared(Vec2::ZERO);
        let handle = {
            let mut native = lock(&world);
            let handle = native.insert_body(RigidBodyBuilder::dynamic().build());
            native.insert_shape(ColliderBuilder::ball(0.5).build(), handle);
            handle
        };
        let mut body = Body::new(BodyKind::Dynamic);
        body.bind(NativeLink::new(handle, &world));

        body.apply_force(Vec2::new(10.0, 0.0));
        lock(&world).step(1.0 / 60.0, NonZeroUsize::new(8).unwrap(), 3, &());

        assert!(body.linear_velocity().x > 0.0);
    }

    #[test]
    fn values_fall_back_to_cache_after_world_dropped() {
        let (world, mut body) = bound_body(BodyKind::Dynamic, Pose::default());
        body.set_linear_velocity(Vec2::new(1.0, 1.0));
        assert!(body.is_bound());
        drop(world);

        assert_eq!(body.linear_velocity(), Vec2::new(1.0, 1.0));
        assert!(!body.is_bound());
        assert_eq!(body.native_handle(), None);
    }

    #[test]
    fn bound_frame_conversions_use_native_transform() {
        let pose = Pose::new(Vec2::new(2.0, 0.0)).with_rotation(FRAC_PI_2);
        let (_world, body) = bound_body(BodyKind::Dynamic, pose);

        assert!((body.world_vector(None, Vec2::X) - Vec2::Y).length() < 1e-5);
        assert!((body.world_point(None, Vec2::X) - Vec2::new(2.0, 1.0)).length() < 1e-5);
        assert!((body.local_vector(Vec2::Y) - Vec2::X).length() < 1e-5);
        assert!((body.local_point(Vec2::new(2.0, 1.0)) - Vec2::X).length() < 1e-5);
    }

    #[test]
    fn unbound_world_conversions_fall_back_to_pose() {
        let body = Body::default();
        let pose = Pose::new(Vec2::new(2.0, 0.0)).with_rotation(FRAC_PI_2);

        assert!((body.world_vector(Some(&pose), Vec2::X) - Vec2::Y).length() < 1e-5);
        assert!((body.world_point(Some(&pose), Vec2::X) - Vec2::new(2.0, 1.0)).length() < 1e-5);
    }

    // Unlinked bodies have no local frame; these pin the zero fallback.
    #[test]
    fn unbound_conversions_without_frame_return_zero() {
        let body = Body::default();
        assert_eq!(body.world_vector(None, Vec2::X), Vec2::ZERO);
        assert_eq!(body.world_point(None, Vec2::X), Vec2::ZERO);
        assert_eq!(body.local_vector(Vec2::X), Vec2::ZERO);
        assert_eq!(body.local_point(Vec2::X), Vec2::ZERO);
    }

    #[test]
    fn clone_is_never_linked() {
        let (_world, mut body) = bound_body(BodyKind::Kinematic, Pose::default());
        body.set_linear_velocity(Vec2::new(4.0, 0.0));

        let copy = body.clone();
        assert!(!copy.is_bound());
        assert_eq!(copy.kind(), BodyKind::Kinematic);
        assert_eq!(copy.linear_velocity(), Vec2::new(4.0, 0.0));
    }
}
