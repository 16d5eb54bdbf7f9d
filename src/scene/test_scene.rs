use glam::Vec2;
use hecs::{Entity, World};

use crate::scene::prefabs::{spawn_ball, spawn_crate, spawn_ground, spawn_paddle};
use crate::systems::{BodyFactory, CircleColliderFactory, PolygonColliderFactory};

/// Handles to the entities the demo drives or reports on.
pub struct TestScene {
    pub ground: Entity,
    pub paddle: Entity,
    pub balls: Vec<Entity>,
    pub crate_box: Entity,
}

/// Build and populate the test scene: ground, a row of falling balls,
/// a tilted crate and a sweeping paddle just above the ground.
pub fn load_test_scene<F>(world: &mut World, factory: &F) -> TestScene
where
    F: BodyFactory + CircleColliderFactory + PolygonColliderFactory,
{
    let ground = spawn_ground(world, factory, 25.0, 0.0);

    // (x, y, radius); each ball drifts toward the centre
    let drops = [(-4.0_f32, 6.0_f32, 0.5_f32), (-1.5, 8.0, 0.35), (1.0, 10.0, 0.6), (3.5, 7.0, 0.45)];
    let balls = drops
        .iter()
        .map(|&(x, y, r)| {
            spawn_ball(world, factory, Vec2::new(x, y), r, Vec2::new(-x * 0.2, 0.0))
        })
        .collect();

    let crate_box = spawn_crate(world, factory, Vec2::new(0.0, 4.0), 0.75, 0.3);
    let paddle = spawn_paddle(world, factory, Vec2::new(0.0, 1.0), 4.0);

    TestScene {
        ground,
        paddle,
        balls,
        crate_box,
    }
}
