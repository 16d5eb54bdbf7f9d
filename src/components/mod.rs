pub mod body;
pub mod collider;

use glam::{Affine2, Vec2};

pub use body::{Body, BodyKind};
pub use collider::{CircleCollider, ColliderMaterial, PolygonCollider};
pub(crate) use collider::NativeShape;

/// Spatial pose of an entity: 2D translation plus rotation in radians.
///
/// Game logic writes it between ticks; the physics system pushes it into
/// kinematic bodies and overwrites it from dynamic ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub translation: Vec2,
    pub rotation: f32,
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(Vec2::ZERO)
    }
}

impl Pose {
    pub fn new(translation: Vec2) -> Self {
        Self {
            translation,
            rotation: 0.0,
        }
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn matrix(&self) -> Affine2 {
        Affine2::from_angle_translation(self.rotation, self.translation)
    }
}
