use glam::Vec2;
use hecs::{Entity, World};

use crate::components::{BodyKind, Pose};
use crate::systems::{BodyFactory, CircleColliderFactory, PolygonColliderFactory};

/// Human-readable name used when logging collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label(pub &'static str);

/// Game-side driver for a kinematic body: sweeps it back and forth along X.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweep {
    pub origin: Vec2,
    pub amplitude: f32,
    /// Radians per second.
    pub speed: f32,
    pub phase: f32,
}

impl Sweep {
    pub fn advance(&mut self, dt: f32) -> Vec2 {
        self.phase += self.speed * dt;
        self.origin + Vec2::new(self.amplitude * self.phase.sin(), 0.0)
    }
}

// ---------------------------------------------------------------------------
// Spawn helpers
// ---------------------------------------------------------------------------

/// Spawn the ground: a static box whose top face sits at `top_y`.
pub fn spawn_ground<F>(world: &mut World, factory: &F, half_width: f32, top_y: f32) -> Entity
where
    F: BodyFactory + PolygonColliderFactory,
{
    let half_height = 0.5;
    let mut body = factory.create_body();
    body.set_kind(BodyKind::Static);

    let mut shape = factory.create_polygon_collider();
    shape.set_vertices(box_vertices(half_width, half_height));
    shape.set_friction(0.8);

    world.spawn((
        body,
        Pose::new(Vec2::new(0.0, top_y - half_height)),
        shape,
        Label("ground"),
    ))
}

/// Spawn a dynamic ball with a little bounce.
pub fn spawn_ball<F>(
    world: &mut World,
    factory: &F,
    pos: Vec2,
    radius: f32,
    initial_vel: Vec2,
) -> Entity
where
    F: BodyFactory + CircleColliderFactory,
{
    let mut body = factory.create_body();
    body.set_linear_velocity(initial_vel);
    body.set_linear_damping(0.05);

    let mut shape = factory.create_circle_collider();
    shape.set_radius(radius);
    shape.set_restitution(0.4);

    world.spawn((body, Pose::new(pos), shape, Label("ball")))
}

/// Spawn a dynamic crate, optionally tilted.
pub fn spawn_crate<F>(world: &mut World, factory: &F, pos: Vec2, half_extent: f32, tilt: f32) -> Entity
where
    F: BodyFactory + PolygonColliderFactory,
{
    let body = factory.create_body();
    let mut shape = factory.create_polygon_collider();
    shape.set_vertices(box_vertices(half_extent, half_extent));
    shape.set_density(2.0);

    world.spawn((
        body,
        Pose::new(pos).with_rotation(tilt),
        shape,
        Label("crate"),
    ))
}

/// Spawn a kinematic paddle that game logic moves through its [`Sweep`].
pub fn spawn_paddle<F>(world: &mut World, factory: &F, origin: Vec2, amplitude: f32) -> Entity
where
    F: BodyFactory + PolygonColliderFactory,
{
    let mut body = factory.create_body();
    body.set_kind(BodyKind::Kinematic);

    let mut shape = factory.create_polygon_collider();
    shape.set_vertices(box_vertices(1.5, 0.2));

    world.spawn((
        body,
        Pose::new(origin),
        shape,
        Sweep {
            origin,
            amplitude,
            speed: 1.5,
            phase: 0.0,
        },
        Label("paddle"),
    ))
}

/// Counter-clockwise corners of an axis-aligned box centred on the origin.
fn box_vertices(half_width: f32, half_height: f32) -> Vec<Vec2> {
    vec![
        Vec2::new(-half_width, -half_height),
        Vec2::new(half_width, -half_height),
        Vec2::new(half_width, half_height),
        Vec2::new(-half_width, half_height),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Body, CircleCollider, PolygonCollider};
    use crate::systems::PhysicsSystem;

    #[test]
    fn prefabs_carry_the_family_components() {
        let physics = PhysicsSystem::default();
        let mut world = World::new();
        let ground = spawn_ground(&mut world, &physics, 20.0, 0.0);
        let ball = spawn_ball(&mut world, &physics, Vec2::new(0.0, 5.0), 0.5, Vec2::ZERO);
        let paddle = spawn_paddle(&mut world, &physics, Vec2::new(0.0, 2.0), 3.0);

        assert_eq!(world.get::<&Body>(ground).unwrap().kind(), BodyKind::Static);
        assert_eq!(world.get::<&Pose>(ground).unwrap().translation.y, -0.5);
        assert_eq!(world.get::<&PolygonCollider>(ground).unwrap().vertices().len(), 4);
        assert_eq!(world.get::<&CircleCollider>(ball).unwrap().radius(), 0.5);
        assert_eq!(world.get::<&Body>(paddle).unwrap().kind(), BodyKind::Kinematic);
        assert!(!world.get::<&Body>(ball).unwrap().is_bound());
    }

    #[test]
    fn sweep_oscillates_around_origin() {
        let mut sweep = Sweep {
            origin: Vec2::new(1.0, 2.0),
            amplitude: 3.0,
            speed: std::f32::consts::FRAC_PI_2,
            phase: 0.0,
        };
        let quarter = sweep.advance(1.0);
        assert!((quarter - Vec2::new(4.0, 2.0)).length() < 1e-5);
        let half = sweep.advance(1.0);
        assert!((half - Vec2::new(1.0, 2.0)).length() < 1e-5);
    }
}
