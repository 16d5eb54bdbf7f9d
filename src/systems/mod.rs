mod contact;
mod family;
mod physics;

pub use family::{family_changes, FamilyChanges};
pub use physics::{
    BodyFactory, CircleColliderFactory, PhysicsStats, PhysicsSystem, PolygonColliderFactory,
};
