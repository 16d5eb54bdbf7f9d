use std::path::PathBuf;

use thiserror::Error;

/// Recoverable failures reported by the physics layer.
///
/// Broken admission/removal invariants are not represented here: those panic,
/// since they mean the hosting container violated its contract.
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// Velocity iteration count was zero or negative. The previous value is kept.
    #[error("velocity iterations must be greater than zero, got {0}")]
    InvalidVelocityIterations(i64),

    /// Position iteration count was zero or negative. The previous value is kept.
    #[error("position iterations must be greater than zero, got {0}")]
    InvalidPositionIterations(i64),

    /// A membership event or tick arrived while no simulation world exists.
    #[error("physics system has not been started")]
    NotStarted,

    /// The polygon's vertices do not span a convex hull.
    #[error("polygon collider with {vertices} vertices has no convex hull")]
    DegeneratePolygon { vertices: usize },

    #[error("failed to read physics config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse physics config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}
