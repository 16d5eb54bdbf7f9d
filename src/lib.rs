//! Keeps a hecs scene of `{Body, Pose}` entities in lockstep with a rapier2d
//! rigid-body world and reports contacts back as entity pairs.

pub mod app;
pub mod components;
pub mod config;
pub mod engine;
pub mod error;
mod native;
pub mod scene;
pub mod signals;
pub mod systems;

pub use components::{Body, BodyKind, CircleCollider, ColliderMaterial, PolygonCollider, Pose};
pub use config::PhysicsConfig;
pub use error::PhysicsError;
pub use signals::{CollisionQueue, CollisionSignal, CollisionSink};
pub use systems::{
    BodyFactory, CircleColliderFactory, PhysicsStats, PhysicsSystem, PolygonColliderFactory,
};
