//! Minimal column-major vector/matrix math.
//!
//! This crate's math surface is small (model/view/projection composition,
//! AABB transforms, frustum plane extraction) and always column-major
//! 4x4, so it is hand-rolled here rather than pulling in a general SIMD
//! math crate the rest of this crate has no other use for.

use bytemuck::{Pod, Zeroable};

/// A 3-component float vector.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vec3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Vec3 {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Builds a vector from components.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Componentwise subtraction.
    #[must_use]
    pub fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }

    /// Componentwise addition.
    #[must_use]
    pub fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }

    /// Scales every component by `s`.
    #[must_use]
    pub fn scale(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }

    /// Dot product.
    #[must_use]
    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Squared distance to another point (cheaper than `sub(...).length()`
    /// when only relative ordering matters, as in back-to-front sort).
    #[must_use]
    pub fn distance_squared(self, rhs: Self) -> f32 {
        let d = self.sub(rhs);
        d.dot(d)
    }

    /// Componentwise minimum.
    #[must_use]
    pub fn min(self, rhs: Self) -> Self {
        Self::new(self.x.min(rhs.x), self.y.min(rhs.y), self.z.min(rhs.z))
    }

    /// Componentwise maximum.
    #[must_use]
    pub fn max(self, rhs: Self) -> Self {
        Self::new(self.x.max(rhs.x), self.y.max(rhs.y), self.z.max(rhs.z))
    }
}

/// A 4-component float vector, std140-friendly.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vec4 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
    /// W component.
    pub w: f32,
}

impl Vec4 {
    /// Builds a vector from components.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Lifts a [`Vec3`] to homogeneous coordinates with the given `w`.
    #[must_use]
    pub const fn from_vec3(v: Vec3, w: f32) -> Self {
        Self::new(v.x, v.y, v.z, w)
    }
}

/// A column-major 4x4 float matrix (`cols[c][r]`), matching the layout the
/// command-buffer's `PushUniform Matrix4x4` payload and the std140
/// `ObjectConstants`/`SceneConstants` blocks expect.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Mat4 {
    /// The four columns of the matrix.
    pub cols: [[f32; 4]; 4],
}

impl Mat4 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// A pure translation matrix.
    #[must_use]
    pub const fn from_translation(t: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[3] = [t.x, t.y, t.z, 1.0];
        m
    }

    /// A pure (non-uniform) scale matrix.
    #[must_use]
    pub const fn from_scale(s: Vec3) -> Self {
        Self {
            cols: [
                [s.x, 0.0, 0.0, 0.0],
                [0.0, s.y, 0.0, 0.0],
                [0.0, 0.0, s.z, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Matrix product `self * rhs`.
    #[must_use]
    pub fn mul(&self, rhs: &Self) -> Self {
        let mut out = Self {
            cols: [[0.0; 4]; 4],
        };
        for c in 0..4 {
            for r in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += self.cols[k][r] * rhs.cols[c][k];
                }
                out.cols[c][r] = sum;
            }
        }
        out
    }

    /// Transforms a homogeneous point/vector by this matrix.
    #[must_use]
    pub fn mul_vec4(&self, v: Vec4) -> Vec4 {
        let comp = [v.x, v.y, v.z, v.w];
        let mut out = [0.0_f32; 4];
        for r in 0..4 {
            let mut sum = 0.0;
            for c in 0..4 {
                sum += self.cols[c][r] * comp[c];
            }
            out[r] = sum;
        }
        Vec4::new(out[0], out[1], out[2], out[3])
    }

    /// Transforms a point (implicit `w = 1`), returning the dehomogenized
    /// `xyz` (dividing by `w` when it's not 1, e.g. after a perspective
    /// projection).
    #[must_use]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let v = self.mul_vec4(Vec4::from_vec3(p, 1.0));
        if (v.w - 1.0).abs() < f32::EPSILON || v.w == 0.0 {
            Vec3::new(v.x, v.y, v.z)
        } else {
            Vec3::new(v.x / v.w, v.y / v.w, v.z / v.w)
        }
    }

    /// A right-handed look-at view matrix.
    #[must_use]
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let f = normalize(target.sub(eye));
        let s = normalize(cross(f, up));
        let u = cross(s, f);
        Self {
            cols: [
                [s.x, u.x, -f.x, 0.0],
                [s.y, u.y, -f.y, 0.0],
                [s.z, u.z, -f.z, 0.0],
                [-s.dot(eye), -u.dot(eye), f.dot(eye), 1.0],
            ],
        }
    }

    /// A right-handed perspective projection matrix with an OpenGL-style
    /// `[-1, 1]` NDC depth range.
    #[must_use]
    pub fn perspective(fov_y_radians: f32, aspect: f32, near: f32, far: f32) -> Self {
        let tan_half_fov = (fov_y_radians * 0.5).tan();
        let mut m = Self {
            cols: [[0.0; 4]; 4],
        };
        m.cols[0][0] = 1.0 / (aspect * tan_half_fov);
        m.cols[1][1] = 1.0 / tan_half_fov;
        m.cols[2][2] = -(far + near) / (far - near);
        m.cols[2][3] = -1.0;
        m.cols[3][2] = -(2.0 * far * near) / (far - near);
        m
    }
}

/// Normalizes `v`; returns the zero vector if `v` has zero length.
#[must_use]
pub fn normalize(v: Vec3) -> Vec3 {
    let len = v.length();
    if len > f32::EPSILON {
        v.scale(1.0 / len)
    } else {
        Vec3::ZERO
    }
}

/// Cross product.
#[must_use]
pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(
        a.y * b.z - a.z * b.y,
        a.z * b.x - a.x * b.z,
        a.x * b.y - a.y * b.x,
    )
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Builds an AABB from explicit corners.
    #[must_use]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// The AABB's center point.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        self.min.add(self.max).scale(0.5)
    }

    /// The AABB's half-extents along each axis.
    #[must_use]
    pub fn half_extents(&self) -> Vec3 {
        self.max.sub(self.min).scale(0.5)
    }

    /// The 8 corner points of the box, in a fixed (not further specified)
    /// order; used by the occlusion rasterizer to build a screen-space AABB.
    #[must_use]
    pub fn corners(&self) -> [Vec3; 8] {
        let Self { min, max } = *self;
        [
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(min.x, max.y, max.z),
            Vec3::new(max.x, max.y, max.z),
        ]
    }

    /// Decomposes the box into 12 world-space triangles (2 per face). The
    /// occlusion pipeline has no CPU-side access to a mesh's real vertex
    /// data — meshes are opaque GPU vertex arrays — so it treats a mesh's
    /// world bounds as a coarse stand-in occluder/occludee shape instead of
    /// a triangle-exact silhouette.
    #[must_use]
    pub fn triangles(&self) -> [[Vec3; 3]; 12] {
        let c = self.corners();
        [
            // -Z face (0,1,3,2)
            [c[0], c[1], c[3]],
            [c[0], c[3], c[2]],
            // +Z face (4,5,7,6)
            [c[4], c[5], c[7]],
            [c[4], c[7], c[6]],
            // -X face (0,2,6,4)
            [c[0], c[2], c[6]],
            [c[0], c[6], c[4]],
            // +X face (1,3,7,5)
            [c[1], c[3], c[7]],
            [c[1], c[7], c[5]],
            // -Y face (0,1,5,4)
            [c[0], c[1], c[5]],
            [c[0], c[5], c[4]],
            // +Y face (2,3,7,6)
            [c[2], c[3], c[7]],
            [c[2], c[7], c[6]],
        ]
    }

    /// Transforms every corner by `m` and returns the AABB enclosing the
    /// result (a standard, possibly loose, re-fit under rotation).
    #[must_use]
    pub fn transformed(&self, m: &Mat4) -> Self {
        let corners = self.corners();
        let mut min = m.transform_point(corners[0]);
        let mut max = min;
        for c in &corners[1..] {
            let p = m.transform_point(*c);
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_matrix_leaves_points_unchanged() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(Mat4::IDENTITY.transform_point(p), p);
    }

    #[test]
    fn translation_then_inverse_translation_is_identity() {
        let t = Vec3::new(1.0, -2.0, 3.0);
        let m = Mat4::from_translation(t);
        let p = Vec3::new(0.0, 0.0, 0.0);
        assert_eq!(m.transform_point(p), t);
    }

    #[test]
    fn matrix_multiplication_composes_translations() {
        let a = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let b = Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0));
        let combined = a.mul(&b);
        let p = combined.transform_point(Vec3::ZERO);
        assert_eq!(p, Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn aabb_center_and_half_extents() {
        let aabb = Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(3.0, 1.0, 1.0));
        assert_eq!(aabb.center(), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(aabb.half_extents(), Vec3::new(2.0, 1.0, 1.0));
    }

    #[test]
    fn aabb_triangles_cover_every_corner() {
        let aabb = Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let corners = aabb.corners();
        let triangles = aabb.triangles();
        assert_eq!(triangles.len(), 12);
        for corner in corners {
            assert!(triangles.iter().flatten().any(|v| *v == corner));
        }
    }

    #[test]
    fn look_at_places_target_on_negative_z_in_view_space() {
        let view = Mat4::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        let target_in_view = view.transform_point(Vec3::ZERO);
        assert!(target_in_view.z < 0.0);
    }
}
