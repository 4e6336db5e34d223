//! Scene component types stored in the [`render_core::ecs::EntityStore`]
//! and the per-object/per-light records an extraction job builds from them.
//!
//! Relationships are modeled as ids rather than pointers (see `DESIGN.md`'s
//! note on the source's pointer-bearing `Entity`/`Object` types):
//! [`GameObject`] carries parent/child/sibling [`EntityId`]s instead of
//! owning references, and no component ever owns an entity.

use render_core::ecs::{Component, ComponentTypeId, EntityId, EntityStore};
use render_core::error::EntityStoreError;

use crate::math::{Aabb, Mat4, Vec3};
use crate::lights::LightRecord;

/// Maximum number of submeshes one [`Mesh`] component may reference
/// without spilling into a second entity. Chosen generously for typical
/// scene assets while keeping the component `Copy` and chunk-friendly.
pub const MAX_SUBMESHES: usize = 4;

/// World transform of an entity, stored as the composed model matrix
/// rather than separate translation/rotation/scale so the extraction job
/// never has to recompose it per frame — physics/animation systems write
/// a fresh matrix here each tick instead.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Transform {
    /// Object-to-world matrix.
    pub model: Mat4,
}

impl Component for Transform {
    const NAME: &'static str = "Transform";
}

impl Transform {
    /// A transform at the identity pose.
    #[must_use]
    pub const fn identity() -> Self {
        Self { model: Mat4::IDENTITY }
    }

    /// A transform translating by `t` with no rotation or scale.
    #[must_use]
    pub fn from_translation(t: Vec3) -> Self {
        Self {
            model: Mat4::from_translation(t),
        }
    }
}

/// One drawable piece of a [`Mesh`]: a vertex array plus draw parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submesh {
    /// Resource-pool id of the vertex array object.
    pub vertex_array: u32,
    /// Index count for an indexed draw (`0` selects a non-indexed
    /// [`render_gpu::CommandBuffer::draw`]).
    pub index_count: u32,
    /// Byte offset into the bound index buffer.
    pub index_offset: u32,
}

/// A renderable mesh: up to [`MAX_SUBMESHES`] draw calls sharing one
/// local-space bounding box.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct Mesh {
    /// Local-space bounds, transformed by [`Transform::model`] at
    /// extraction time for both frustum and occlusion tests.
    pub local_bounds: Aabb,
    /// The submeshes backing this mesh, in `submeshes[..submesh_count]`.
    pub submeshes: [Submesh; MAX_SUBMESHES],
    /// Number of valid entries in `submeshes`.
    pub submesh_count: u8,
}

impl Component for Mesh {
    const NAME: &'static str = "Mesh";
}

impl Mesh {
    /// A single-submesh mesh with the given bounds and draw parameters.
    #[must_use]
    pub fn single(local_bounds: Aabb, vertex_array: u32, index_count: u32) -> Self {
        let mut submeshes = [Submesh {
            vertex_array: 0,
            index_count: 0,
            index_offset: 0,
        }; MAX_SUBMESHES];
        submeshes[0] = Submesh {
            vertex_array,
            index_count,
            index_offset: 0,
        };
        Self {
            local_bounds,
            submeshes,
            submesh_count: 1,
        }
    }

    /// The valid submesh slice.
    #[must_use]
    pub fn submeshes(&self) -> &[Submesh] {
        &self.submeshes[..self.submesh_count as usize]
    }
}

/// Surface material parameters, matching the `ObjectConstants` std140
/// layout's material fields.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Material {
    /// Diffuse albedo (rgb) plus an unused alpha slot.
    pub diffuse_color: [f32; 4],
    /// Index of refraction, packed into its own vec4 like the original
    /// layout (`x` used, `yzw` padding).
    pub ior: f32,
    /// A small integer material id used by the shader to select a BRDF
    /// variant.
    pub material_id: u32,
    /// Metalness in `[0, 1]`.
    pub metalness: f32,
    /// Roughness in `[0, 1]`.
    pub roughness: f32,
    /// Resource-pool id of the diffuse texture, rebound per-subpass
    /// whenever it changes between consecutively drawn objects.
    pub diffuse_texture: u32,
}

impl Component for Material {
    const NAME: &'static str = "Material";
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse_color: [1.0, 1.0, 1.0, 1.0],
            ior: 1.5,
            material_id: 0,
            metalness: 0.0,
            roughness: 1.0,
            diffuse_texture: 0,
        }
    }
}

/// Marks a mesh as eligible for the software occlusion pipeline instead of
/// an immediate frustum-only cull. See [`crate::occlusion::ViewVisibility`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Visibility;

impl Component for Visibility {
    const NAME: &'static str = "Visibility";
}

/// A light source. Two shapes are supported, matching the forward pass's
/// 16-byte-aligned packing (see [`crate::lights`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    /// An omnidirectional point light with a falloff radius.
    Sphere {
        /// Light color (linear rgb).
        color: Vec3,
        /// Falloff radius.
        radius: f32,
    },
    /// A capsule-shaped area light between two points.
    Line {
        /// Second endpoint, relative to the entity's [`Transform`] origin
        /// (the first endpoint is the transform's translation column).
        p2: Vec3,
        /// Light color (linear rgb).
        color: Vec3,
        /// Capsule radius.
        radius: f32,
    },
}

impl Component for Light {
    const NAME: &'static str = "Light";
}

/// Parent/child/sibling links for entities organized in a scene graph,
/// stored as ids rather than pointers — no component ever owns an entity;
/// the [`render_core::ecs::EntityStore`] is the sole owner of component
/// data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameObject {
    /// The parent entity, or [`render_core::ecs::NULL_ENTITY`] at the
    /// scene root.
    pub parent: EntityId,
    /// The first child, or null if this entity has none.
    pub first_child: EntityId,
    /// The next sibling sharing `parent`, or null if this is the last one.
    pub next_sibling: EntityId,
}

impl Component for GameObject {
    const NAME: &'static str = "GameObject";
}

impl Default for GameObject {
    fn default() -> Self {
        Self {
            parent: render_core::ecs::NULL_ENTITY,
            first_child: render_core::ecs::NULL_ENTITY,
            next_sibling: render_core::ecs::NULL_ENTITY,
        }
    }
}

/// A mesh instance collected for one view, with its components
/// already-transformed into world space.
#[derive(Debug, Clone, Copy)]
pub struct RenderMesh {
    /// The source entity, for diagnostics.
    pub entity: EntityId,
    /// World-space bounds, used both for back-to-front sort and the
    /// occlusion query.
    pub world_bounds: Aabb,
    /// Object-to-world model matrix.
    pub model: Mat4,
    /// The normal matrix (inverse-transpose of `model`'s upper 3x3, or
    /// `model` itself for uniformly scaled/rigid transforms).
    pub normal: Mat4,
    /// Texture-coordinate transform; identity unless a UV-scrolling
    /// effect is driving it (outside this core's scope, carried as a
    /// field for layout fidelity with `ObjectConstants`).
    pub texture: Mat4,
    pub material: Material,
    /// Submeshes to draw, copied out of the source [`Mesh`] component.
    pub submeshes: [Submesh; MAX_SUBMESHES],
    /// Count of valid entries in `submeshes`.
    pub submesh_count: u8,
    /// Whether this mesh is governed by [`crate::occlusion::ViewVisibility`]
    /// rather than having already been frustum-culled at extraction.
    pub occlusion_managed: bool,
}

impl RenderMesh {
    /// The valid submesh slice.
    #[must_use]
    pub fn submeshes(&self) -> &[Submesh] {
        &self.submeshes[..self.submesh_count as usize]
    }
}

/// The [`ComponentTypeId`]s this crate's components were assigned by an
/// [`EntityStore`], registered once up front so [`crate::view::RenderView`]
/// can build queries and read component slices without re-deriving them
/// from `TypeId` on every extraction.
#[derive(Debug, Clone, Copy)]
pub struct SceneComponentIds {
    /// [`Transform`]'s id.
    pub transform: ComponentTypeId,
    /// [`Mesh`]'s id.
    pub mesh: ComponentTypeId,
    /// [`Material`]'s id.
    pub material: ComponentTypeId,
    /// [`Visibility`]'s id.
    pub visibility: ComponentTypeId,
    /// [`Light`]'s id.
    pub light: ComponentTypeId,
    /// [`GameObject`]'s id.
    pub game_object: ComponentTypeId,
}

impl SceneComponentIds {
    /// Registers every scene component type with `store`, returning their
    /// assigned ids. Idempotent: calling this more than once on the same
    /// store returns the same ids each time.
    ///
    /// # Errors
    ///
    /// Propagates [`EntityStore::register_component`]'s error if the store
    /// has no room left for a new component type.
    pub fn register(store: &mut EntityStore) -> Result<Self, EntityStoreError> {
        Ok(Self {
            transform: store.register_component::<Transform>()?,
            mesh: store.register_component::<Mesh>()?,
            material: store.register_component::<Material>()?,
            visibility: store.register_component::<Visibility>()?,
            light: store.register_component::<Light>()?,
            game_object: store.register_component::<GameObject>()?,
        })
    }
}

/// One object collected for a view: either a mesh to draw or a light to
/// pack into `SceneConstants`.
#[derive(Debug, Clone)]
pub enum RenderObject {
    /// A mesh instance.
    Mesh(RenderMesh),
    /// A light source, already converted to its packed record.
    Light(LightRecord),
}

impl RenderObject {
    /// Sort key used by [`crate::view::sort_objects`]: lights first
    /// (tag `0`), then meshes (tag `1`) ordered back-to-front by the
    /// caller.
    #[must_use]
    pub(crate) const fn sort_tag(&self) -> u8 {
        match self {
            Self::Light(_) => 0,
            Self::Mesh(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_single_reports_one_submesh() {
        let bounds = Aabb::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 1.0));
        let mesh = Mesh::single(bounds, 7, 36);
        assert_eq!(mesh.submeshes().len(), 1);
        assert_eq!(mesh.submeshes()[0].vertex_array, 7);
    }

    #[test]
    fn render_object_sort_tag_orders_lights_before_meshes() {
        let light = RenderObject::Light(LightRecord::sphere(Vec3::ZERO, Vec3::ZERO, 1.0));
        assert!(light.sort_tag() < RenderObject::Mesh(default_mesh()).sort_tag());
    }

    #[test]
    fn registering_scene_components_twice_is_idempotent() {
        let mut store = EntityStore::new(1);
        let first = SceneComponentIds::register(&mut store).unwrap();
        let second = SceneComponentIds::register(&mut store).unwrap();
        assert_eq!(first.transform, second.transform);
        assert_eq!(first.mesh, second.mesh);
        assert_eq!(first.light, second.light);
    }

    fn default_mesh() -> RenderMesh {
        RenderMesh {
            entity: render_core::ecs::NULL_ENTITY,
            world_bounds: Aabb::new(Vec3::ZERO, Vec3::ZERO),
            model: Mat4::IDENTITY,
            normal: Mat4::IDENTITY,
            texture: Mat4::IDENTITY,
            material: Material::default(),
            submeshes: [Submesh {
                vertex_array: 0,
                index_count: 0,
                index_offset: 0,
            }; MAX_SUBMESHES],
            submesh_count: 0,
            occlusion_managed: false,
        }
    }
}
