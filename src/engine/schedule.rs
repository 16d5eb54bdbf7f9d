use hecs::World;

use crate::engine::time::TimeSource;
use crate::error::PhysicsError;

/// Update ordering. Lower values run earlier in a frame.
pub struct Priority;

impl Priority {
    pub const VERY_HIGH: i32 = -2000;
    pub const HIGH: i32 = -1000;
    pub const NORMAL: i32 = 0;
    pub const LOW: i32 = 1000;
    pub const VERY_LOW: i32 = 2000;
}

/// A system advanced once per frame by the host.
pub trait Updatable {
    fn priority(&self) -> i32 {
        Priority::NORMAL
    }

    fn update(&mut self, world: &mut World, time: &dyn TimeSource) -> Result<(), PhysicsError>;
}

/// Runs registered systems in priority order; ties keep registration order.
#[derive(Default)]
pub struct Scheduler {
    systems: Vec<Box<dyn Updatable>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, system: Box<dyn Updatable>) {
        self.systems.push(system);
        self.systems.sort_by_key(|s| s.priority());
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Advance every system by one tick, stopping at the first failure.
    pub fn tick(&mut self, world: &mut World, time: &dyn TimeSource) -> Result<(), PhysicsError> {
        for system in &mut self.systems {
            system.update(world, time)?;
        }
        Ok(())
    }
}
