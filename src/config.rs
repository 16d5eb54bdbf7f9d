use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::PhysicsError;

pub const DEFAULT_VELOCITY_ITERATIONS: u32 = 8;
pub const DEFAULT_POSITION_ITERATIONS: u32 = 3;

/// Tunables of the simulation world.
///
/// Missing fields in a config file fall back to the defaults, so
/// `{"gravity": [0.0, -9.81]}` is a complete file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: Vec2,
    /// Solver iterations spent on the velocity constraints.
    pub velocity_iterations: u32,
    /// Stabilization iterations spent on positional correction.
    pub position_iterations: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::ZERO,
            velocity_iterations: DEFAULT_VELOCITY_ITERATIONS,
            position_iterations: DEFAULT_POSITION_ITERATIONS,
        }
    }
}

impl PhysicsConfig {
    pub fn from_json_str(text: &str) -> Result<Self, PhysicsError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PhysicsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PhysicsError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Rejects zero iteration counts.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        if self.velocity_iterations == 0 {
            return Err(PhysicsError::InvalidVelocityIterations(0));
        }
        if self.position_iterations == 0 {
            return Err(PhysicsError::InvalidPositionIterations(0));
        }
        Ok(())
    }
}
