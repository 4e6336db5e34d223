//! Light packing for the forward pass, and the std140 GPU-facing constant
//! block layouts (`SceneConstants`, `ObjectConstants`, `LightConstants`) —
//! these are the acceptance contract shared with shaders, so their field
//! order and padding are normative, not an implementation detail.

use bytemuck::{Pod, Zeroable};

use crate::math::Vec3;

/// Up to this many lights are packed into one [`SceneConstants`] block per
/// view; additional lights enqueued beyond it are dropped (saturating,
/// not an error).
pub const MAX_LIGHTS: usize = 8;

/// Which variant a [`LightRecord`] holds, packed as an `i32` into
/// `SceneConstants::light_types`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum LightKind {
    /// An omnidirectional point light.
    Sphere = 0,
    /// A capsule-shaped line light.
    Line = 1,
}

/// One light collected for a view, already reduced to the packed form its
/// [`LightConstants`] record will take.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightRecord {
    kind: LightKind,
    v1: [f32; 4],
    v2: [f32; 4],
    v3: [f32; 4],
}

impl LightRecord {
    /// A sphere light: `v1 = (center.xyz, radius)`, `v2 = (color.rgb,
    /// radius)` — the radius is carried in both records so the shader
    /// can read it from either.
    #[must_use]
    pub fn sphere(center: Vec3, color: Vec3, radius: f32) -> Self {
        Self {
            kind: LightKind::Sphere,
            v1: [center.x, center.y, center.z, radius],
            v2: [color.x, color.y, color.z, radius],
            v3: [0.0; 4],
        }
    }

    /// A line light: `v1 = (p1, 1)`, `v2 = (p2, radius)`, `v3 = (color, 1)`.
    #[must_use]
    pub fn line(p1: Vec3, p2: Vec3, color: Vec3, radius: f32) -> Self {
        Self {
            kind: LightKind::Line,
            v1: [p1.x, p1.y, p1.z, 1.0],
            v2: [p2.x, p2.y, p2.z, radius],
            v3: [color.x, color.y, color.z, 1.0],
        }
    }

    /// Which variant this record holds.
    #[must_use]
    pub const fn kind(&self) -> LightKind {
        self.kind
    }

    fn into_constants(self) -> LightConstants {
        LightConstants {
            v1: self.v1,
            v2: self.v2,
            v3: self.v3,
            v4: [0.0; 4],
        }
    }
}

/// One light's GPU-facing record: four 16-byte-aligned `vec4`s, whose
/// meaning depends on the light's [`LightKind`] (see [`LightRecord`]).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightConstants {
    v1: [f32; 4],
    v2: [f32; 4],
    v3: [f32; 4],
    v4: [f32; 4],
}

impl Default for LightConstants {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// `ivec4`, std140-laid-out.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct IVec4 {
    /// First component. `num_lights` uses only `.x`; `light_types` packs
    /// four light-kind tags per `IVec4`.
    pub x: i32,
    /// Second component.
    pub y: i32,
    /// Third component.
    pub z: i32,
    /// Fourth component.
    pub w: i32,
}

impl IVec4 {
    const ZERO: Self = Self { x: 0, y: 0, z: 0, w: 0 };

    fn set(&mut self, lane: usize, value: i32) {
        match lane {
            0 => self.x = value,
            1 => self.y = value,
            2 => self.z = value,
            _ => self.w = value,
        }
    }

    /// Reads back lane `lane` (`0..4`), matching the packed
    /// `types[i>>2][i&3]` indexing scheme.
    #[must_use]
    pub const fn get(&self, lane: usize) -> i32 {
        match lane {
            0 => self.x,
            1 => self.y,
            2 => self.z,
            _ => self.w,
        }
    }
}

/// Result of [`pack_lights`]: the fixed-size arrays `SceneConstants`
/// embeds directly.
#[derive(Debug, Clone, Copy)]
pub struct PackedLights {
    /// Always 8 entries; only `num_lights.x` of them hold real data, the
    /// rest are zeroed.
    pub lights: [LightConstants; MAX_LIGHTS],
    /// `.x` holds the number of lights actually packed (`min(len, 8)`).
    pub num_lights: IVec4,
    /// Two `ivec4`s, four light-kind tags each, covering all 8 light
    /// slots: `light_types[i >> 2].get(i & 3) == lights[i].kind`.
    pub light_types: [IVec4; 2],
}

/// Packs up to [`MAX_LIGHTS`] lights into the forward pass's constant
/// layout. Lights beyond the 8th are silently dropped (saturating, not a
/// recoverable error — the scene owns the decision of which 8 to submit).
#[must_use]
pub fn pack_lights(records: &[LightRecord]) -> PackedLights {
    let count = records.len().min(MAX_LIGHTS);
    let mut lights = [LightConstants::default(); MAX_LIGHTS];
    let mut light_types = [IVec4::ZERO; 2];
    for (i, record) in records.iter().take(count).enumerate() {
        lights[i] = record.into_constants();
        light_types[i >> 2].set(i & 3, record.kind() as i32);
    }
    PackedLights {
        lights,
        num_lights: IVec4 {
            x: count as i32,
            ..IVec4::ZERO
        },
        light_types,
    }
}

/// Per-frame, per-view constants, std140-laid-out to match the forward
/// pass's shader-side constant block exactly.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SceneConstants {
    /// View matrix.
    pub view: [[f32; 4]; 4],
    /// Projection matrix.
    pub projection: [[f32; 4]; 4],
    /// Precomposed `projection * view`.
    pub view_projection: [[f32; 4]; 4],
    /// Light-space view-projection, for the shadow view's moment map.
    pub light_vp: [[f32; 4]; 4],
    /// Spherical-harmonics-style ambient basis (6 directions); zeroed
    /// until an irradiance-probe subsystem is wired up.
    pub ambient_basis: [[f32; 4]; 6],
    /// `.x` holds the active light count.
    pub num_lights: IVec4,
    /// Packed light-kind tags, 4 per `ivec4`.
    pub light_types: [IVec4; 2],
    /// The packed light records themselves.
    pub lights: [LightConstants; MAX_LIGHTS],
}

impl SceneConstants {
    /// Builds a block from a view/projection pair and pre-packed lights,
    /// with `light_vp` and `ambient_basis` left at their default (zero)
    /// values — populated by the caller when a shadow view or ambient
    /// probe feeds them.
    #[must_use]
    pub fn new(view: [[f32; 4]; 4], projection: [[f32; 4]; 4], view_projection: [[f32; 4]; 4], packed: PackedLights) -> Self {
        Self {
            view,
            projection,
            view_projection,
            light_vp: [[0.0; 4]; 4],
            ambient_basis: [[0.0; 4]; 6],
            num_lights: packed.num_lights,
            light_types: packed.light_types,
            lights: packed.lights,
        }
    }
}

/// Per-object constants, std140-laid-out to match the shader-side
/// constant block exactly.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectConstants {
    /// Object-to-world model matrix.
    pub model: [[f32; 4]; 4],
    /// Normal matrix (inverse-transpose of `model`'s upper 3x3).
    pub normal: [[f32; 4]; 4],
    /// Texture-coordinate transform.
    pub texture: [[f32; 4]; 4],
    /// Diffuse albedo.
    pub diff_color: [f32; 4],
    /// Index of refraction in `.x`, padding elsewhere.
    pub ior: [f32; 4],
    /// Packed `(material_id, metalness, roughness, 0)`.
    pub materialid_metalness_roughness_0: [f32; 4],
    /// Explicit std140 tail padding to a 16-byte multiple.
    pub pad_: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere_at(i: i32) -> LightRecord {
        LightRecord::sphere(Vec3::new(i as f32, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0), 2.0)
    }

    #[test]
    fn more_than_eight_lights_saturate_to_eight() {
        let records: Vec<_> = (0..10).map(sphere_at).collect();
        let packed = pack_lights(&records);
        assert_eq!(packed.num_lights.x, 8);
    }

    #[test]
    fn light_types_round_trip_each_lane() {
        let records = vec![
            LightRecord::sphere(Vec3::ZERO, Vec3::ZERO, 1.0),
            LightRecord::line(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, 1.0),
            LightRecord::sphere(Vec3::ZERO, Vec3::ZERO, 1.0),
            LightRecord::line(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, 1.0),
            LightRecord::sphere(Vec3::ZERO, Vec3::ZERO, 1.0),
        ];
        let packed = pack_lights(&records);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(packed.light_types[i >> 2].get(i & 3), record.kind() as i32);
        }
    }

    #[test]
    fn fewer_than_eight_lights_pack_exactly_that_many() {
        let records = vec![sphere_at(0), sphere_at(1), sphere_at(2)];
        let packed = pack_lights(&records);
        assert_eq!(packed.num_lights.x, 3);
    }

    #[test]
    fn object_constants_layout_is_16_byte_aligned_and_sized() {
        assert_eq!(std::mem::align_of::<ObjectConstants>() % 4, 0);
        assert_eq!(std::mem::size_of::<ObjectConstants>() % 16, 0);
    }

    #[test]
    fn scene_constants_layout_is_16_byte_multiple_sized() {
        assert_eq!(std::mem::size_of::<SceneConstants>() % 16, 0);
    }
}
