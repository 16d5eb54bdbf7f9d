use glam::Vec2;
use rapier2d::prelude::*;

use crate::error::PhysicsError;
use crate::native::{to_native, NativeLink, NativeWorld, SharedWorld};

pub const DEFAULT_CATEGORY_BITS: u16 = 0x0001;
pub const DEFAULT_MASK_BITS: u16 = 0xFFFF;

/// Surface and filtering properties shared by every collider shape.
///
/// Two shapes are allowed to touch when each one's category bits intersect
/// the other's mask bits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderMaterial {
    /// Bounciness. 0.0 = no bounce, 1.0 = perfect bounce.
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
    pub category_bits: u16,
    pub mask_bits: u16,
}

impl Default for ColliderMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.0,
            friction: 0.5,
            density: 1.0,
            category_bits: DEFAULT_CATEGORY_BITS,
            mask_bits: DEFAULT_MASK_BITS,
        }
    }
}

impl ColliderMaterial {
    fn interaction_groups(&self) -> InteractionGroups {
        InteractionGroups::new(
            Group::from_bits_truncate(u32::from(self.category_bits)),
            Group::from_bits_truncate(u32::from(self.mask_bits)),
        )
    }

    fn apply(&self, builder: ColliderBuilder) -> ColliderBuilder {
        builder
            .restitution(self.restitution)
            .friction(self.friction)
            .density(self.density)
            .collision_groups(self.interaction_groups())
            .active_events(ActiveEvents::COLLISION_EVENTS)
    }
}

/// Capability of a collider component to materialize as a native shape.
///
/// The physics system only attaches shapes for component types implementing
/// this; any other collider-like component on an entity is ignored.
pub(crate) trait NativeShape: hecs::Component {
    /// Build the native shape from the current geometry and material, attach
    /// it to `body`, and keep the resulting handle.
    fn create_native_shape(
        &mut self,
        native: &mut NativeWorld,
        shared: &SharedWorld,
        body: RigidBodyHandle,
    ) -> Result<ColliderHandle, PhysicsError>;

    /// Forget the native shape. Called when its body is destroyed.
    fn release_native_shape(&mut self);

    fn native_handle(&self) -> Option<ColliderHandle>;
}

// ---------------------------------------------------------------------------
// Shared material state with write-through to the native shape
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ShapeState {
    material: ColliderMaterial,
    native: Option<NativeLink<ColliderHandle>>,
}

/// A copy keeps the material and drops the native link.
impl Clone for ShapeState {
    fn clone(&self) -> Self {
        Self {
            material: self.material,
            native: None,
        }
    }
}

impl ShapeState {
    fn write_native(&self, f: impl FnOnce(&mut Collider)) {
        if let Some(link) = &self.native {
            link.write(f);
        }
    }

    fn set_restitution(&mut self, restitution: f32) {
        self.material.restitution = restitution;
        self.write_native(|c| c.set_restitution(restitution));
    }

    fn set_friction(&mut self, friction: f32) {
        self.material.friction = friction;
        self.write_native(|c| c.set_friction(friction));
    }

    fn set_density(&mut self, density: f32) {
        self.material.density = density;
        self.write_native(|c| c.set_density(density));
    }

    fn set_category_bits(&mut self, bits: u16) {
        self.material.category_bits = bits;
        self.write_native(|c| {
            let mut groups = c.collision_groups();
            groups.memberships = Group::from_bits_truncate(u32::from(bits));
            c.set_collision_groups(groups);
        });
    }

    fn set_mask_bits(&mut self, bits: u16) {
        self.material.mask_bits = bits;
        self.write_native(|c| {
            let mut groups = c.collision_groups();
            groups.filter = Group::from_bits_truncate(u32::from(bits));
            c.set_collision_groups(groups);
        });
    }

    fn attach(
        &mut self,
        builder: ColliderBuilder,
        native: &mut NativeWorld,
        shared: &SharedWorld,
        body: RigidBodyHandle,
    ) -> ColliderHandle {
        let handle = native.insert_shape(self.material.apply(builder).build(), body);
        self.native = Some(NativeLink::new(handle, shared));
        handle
    }
}

macro_rules! material_accessors {
    () => {
        pub fn material(&self) -> &ColliderMaterial {
            &self.state.material
        }

        pub fn with_material(mut self, material: ColliderMaterial) -> Self {
            self.state.material = material;
            self
        }

        pub fn restitution(&self) -> f32 {
            self.state.material.restitution
        }

        pub fn set_restitution(&mut self, restitution: f32) {
            self.state.set_restitution(restitution);
        }

        pub fn friction(&self) -> f32 {
            self.state.material.friction
        }

        pub fn set_friction(&mut self, friction: f32) {
            self.state.set_friction(friction);
        }

        pub fn density(&self) -> f32 {
            self.state.material.density
        }

        pub fn set_density(&mut self, density: f32) {
            self.state.set_density(density);
        }

        pub fn category_bits(&self) -> u16 {
            self.state.material.category_bits
        }

        pub fn set_category_bits(&mut self, bits: u16) {
            self.state.set_category_bits(bits);
        }

        pub fn mask_bits(&self) -> u16 {
            self.state.material.mask_bits
        }

        pub fn set_mask_bits(&mut self, bits: u16) {
            self.state.set_mask_bits(bits);
        }

        /// Shape offset relative to the body origin.
        pub fn offset(&self) -> Vec2 {
            self.offset
        }

        /// Geometry changes take effect the next time a native shape is built.
        pub fn set_offset(&mut self, offset: Vec2) {
            self.offset = offset;
        }
    };
}

// ---------------------------------------------------------------------------
// CircleCollider
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct CircleCollider {
    radius: f32,
    offset: Vec2,
    state: ShapeState,
}

impl CircleCollider {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            offset: Vec2::ZERO,
            state: ShapeState::default(),
        }
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
    }

    material_accessors!();
}

impl NativeShape for CircleCollider {
    fn create_native_shape(
        &mut self,
        native: &mut NativeWorld,
        shared: &SharedWorld,
        body: RigidBodyHandle,
    ) -> Result<ColliderHandle, PhysicsError> {
        let builder = ColliderBuilder::ball(self.radius).translation(to_native(self.offset));
        Ok(self.state.attach(builder, native, shared, body))
    }

    fn release_native_shape(&mut self) {
        self.state.native = None;
    }

    fn native_handle(&self) -> Option<ColliderHandle> {
        self.state
            .native
            .as_ref()
            .filter(|link| link.is_live())
            .map(|link| link.handle)
    }
}

// ---------------------------------------------------------------------------
// PolygonCollider
// ---------------------------------------------------------------------------

/// Convex polygon. Vertices are in body-local space before the offset is
/// applied; a non-convex outline is replaced by its convex hull.
#[derive(Clone, Default)]
pub struct PolygonCollider {
    vertices: Vec<Vec2>,
    offset: Vec2,
    state: ShapeState,
}

impl PolygonCollider {
    pub fn new(vertices: Vec<Vec2>) -> Self {
        Self {
            vertices,
            offset: Vec2::ZERO,
            state: ShapeState::default(),
        }
    }

    /// Axis-aligned rectangle centered on the body origin.
    pub fn rectangle(half_width: f32, half_height: f32) -> Self {
        Self::new(vec![
            Vec2::new(-half_width, -half_height),
            Vec2::new(half_width, -half_height),
            Vec2::new(half_width, half_height),
            Vec2::new(-half_width, half_height),
        ])
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    pub fn set_vertices(&mut self, vertices: Vec<Vec2>) {
        self.vertices = vertices;
    }

    material_accessors!();
}

impl NativeShape for PolygonCollider {
    fn create_native_shape(
        &mut self,
        native: &mut NativeWorld,
        shared: &SharedWorld,
        body: RigidBodyHandle,
    ) -> Result<ColliderHandle, PhysicsError> {
        if self.vertices.len() < 3 {
            return Err(PhysicsError::DegeneratePolygon {
                vertices: self.vertices.len(),
            });
        }

        let mut scratch = std::mem::take(&mut native.scratch);
        scratch.clear();
        scratch.extend(
            self.vertices
                .iter()
                .map(|v| Point::new(v.x + self.offset.x, v.y + self.offset.y)),
        );
        let builder = ColliderBuilder::convex_hull(&scratch);
        native.scratch = scratch;

        let builder = builder.ok_or(PhysicsError::DegeneratePolygon {
            vertices: self.vertices.len(),
        })?;
        Ok(self.state.attach(builder, native, shared, body))
    }

    fn release_native_shape(&mut self) {
        self.state.native = None;
    }

    fn native_handle(&self) -> Option<ColliderHandle> {
        self.state
            .native
            .as_ref()
            .filter(|link| link.is_live())
            .map(|link| link.handle)
    }
}
