use std::sync::Arc;
use std::time::Duration;

use hecs::{Entity, World};
use tracing::{debug, info};

use crate::components::Pose;
use crate::config::PhysicsConfig;
use crate::engine::schedule::Updatable;
use crate::engine::time::{FixedStep, FrameTimer, TimeSource};
use crate::error::PhysicsError;
use crate::scene::prefabs::{Label, Sweep};
use crate::scene::test_scene::{load_test_scene, TestScene};
use crate::signals::{CollisionQueue, CollisionSink};
use crate::systems::{PhysicsStats, PhysicsSystem};

/// How a run measures time between ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Clock {
    /// Every tick advances by the same amount, as fast as possible.
    Fixed(FixedStep),
    /// Wall-clock frame timing, paced to roughly `frame` per tick.
    Realtime { frame: Duration },
}

/// Headless host: owns the scene, the physics system and the signal queue.
pub struct SimulationApp {
    world: World,
    physics: PhysicsSystem,
    collisions: Arc<CollisionQueue>,
    scene: TestScene,
    collisions_seen: u64,
}

impl SimulationApp {
    pub fn new(config: &PhysicsConfig) -> Result<Self, PhysicsError> {
        let mut physics = PhysicsSystem::default().with_config(config)?;
        let collisions = Arc::new(CollisionQueue::new());
        let sink: Arc<dyn CollisionSink> = collisions.clone();
        physics.startup(Some(sink));

        let mut world = World::new();
        let scene = load_test_scene(&mut world, &physics);
        info!(entities = world.len(), "scene loaded");

        Ok(Self {
            world,
            physics,
            collisions,
            scene,
            collisions_seen: 0,
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn scene(&self) -> &TestScene {
        &self.scene
    }

    pub fn physics(&self) -> &PhysicsSystem {
        &self.physics
    }

    pub fn collisions_seen(&self) -> u64 {
        self.collisions_seen
    }

    /// Run `ticks` frames, then shut physics down and return its counters.
    pub fn run(&mut self, ticks: u32, clock: Clock) -> Result<PhysicsStats, PhysicsError> {
        match clock {
            Clock::Fixed(step) => {
                for _ in 0..ticks {
                    self.frame(&step)?;
                }
            }
            Clock::Realtime { frame } => {
                let mut timer = FrameTimer::new();
                for _ in 0..ticks {
                    std::thread::sleep(frame);
                    timer.tick();
                    self.frame(&timer)?;
                }
            }
        }

        let stats = self.physics.stats();
        info!(
            ticks,
            steps = stats.steps,
            bodies_created = stats.bodies_created,
            bodies_destroyed = stats.bodies_destroyed,
            shapes_created = stats.shapes_created,
            collisions = stats.signals_forwarded,
            "simulation finished"
        );
        self.physics.shutdown();
        Ok(stats)
    }

    /// One frame: game logic, then physics, then collision reporting.
    pub fn frame(&mut self, time: &dyn TimeSource) -> Result<(), PhysicsError> {
        drive_sweeps(&mut self.world, time.elapsed());
        self.physics.update(&mut self.world, time)?;

        for signal in self.collisions.drain() {
            self.collisions_seen += 1;
            info!(
                a = label(&self.world, signal.entity_a),
                b = label(&self.world, signal.entity_b),
                "collision"
            );
        }
        Ok(())
    }
}

/// Move every swept kinematic pose along its path.
fn drive_sweeps(world: &mut World, dt: f32) {
    for (entity, (sweep, pose)) in world.query_mut::<(&mut Sweep, &mut Pose)>() {
        pose.translation = sweep.advance(dt);
        debug!(?entity, x = pose.translation.x, "sweep");
    }
}

fn label(world: &World, entity: Entity) -> &'static str {
    world.get::<&Label>(entity).map_or("unnamed", |l| l.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn falling() -> PhysicsConfig {
        PhysicsConfig {
            gravity: Vec2::new(0.0, -9.81),
            ..PhysicsConfig::default()
        }
    }

    #[test]
    fn fixed_run_admits_scene_and_steps() {
        let mut app = SimulationApp::new(&falling()).unwrap();
        let stats = app.run(120, Clock::Fixed(FixedStep::SIXTY_HZ)).unwrap();

        assert_eq!(stats.steps, 120);
        assert_eq!(stats.bodies_created, 7);
        assert_eq!(stats.shapes_created, 7);
        assert!(!app.physics().is_started());
    }

    #[test]
    fn balls_land_and_collide() {
        let mut app = SimulationApp::new(&falling()).unwrap();
        app.run(240, Clock::Fixed(FixedStep::SIXTY_HZ)).unwrap();

        assert!(app.collisions_seen() > 0);
        let ball = app.scene().balls[0];
        let y = app.world().get::<&Pose>(ball).unwrap().translation.y;
        assert!(y < 6.0 && y > -1.0, "ball ended at {y}");
    }

    #[test]
    fn paddle_follows_game_logic() {
        let mut app = SimulationApp::new(&PhysicsConfig::default()).unwrap();
        app.frame(&FixedStep(0.5)).unwrap();

        let paddle = app.scene().paddle;
        let pose = *app.world().get::<&Pose>(paddle).unwrap();
        let expected = 4.0 * (1.5_f32 * 0.5).sin();
        assert!((pose.translation.x - expected).abs() < 1e-5);
        let native = app.physics().native_pose(paddle).unwrap();
        assert!((native.translation.x - pose.translation.x).abs() < 1e-5);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = PhysicsConfig {
            position_iterations: 0,
            ..PhysicsConfig::default()
        };
        assert!(SimulationApp::new(&config).is_err());
    }
}
