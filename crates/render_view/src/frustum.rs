//! Frustum extraction from a view-projection matrix and AABB visibility
//! tests, used by [`crate::view::RenderView::extract`] to cull meshes that
//! don't carry a [`crate::scene::Visibility`] component.

use crate::math::{Aabb, Mat4};

/// A plane `ax + by + cz + d = 0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Plane {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
}

impl Plane {
    fn new(a: f32, b: f32, c: f32, d: f32) -> Self {
        let len = (a * a + b * b + c * c).sqrt();
        if len > f32::EPSILON {
            Self {
                a: a / len,
                b: b / len,
                c: c / len,
                d: d / len,
            }
        } else {
            Self { a, b, c, d }
        }
    }

    fn distance_to_point(self, x: f32, y: f32, z: f32) -> f32 {
        self.a * x + self.b * y + self.c * z + self.d
    }
}

/// The six half-spaces bounding a view frustum, extracted from a combined
/// view-projection matrix by the standard Gribb/Hartmann row-combination
/// method.
#[derive(Debug, Clone, Copy, Default)]
pub struct Frustum {
    planes: [Plane; 6],
}

impl Frustum {
    /// Extracts the frustum planes from `view_projection` (column-major,
    /// `cols[c][r]`).
    #[must_use]
    pub fn from_view_projection(m: &Mat4) -> Self {
        let row = |r: usize| [m.cols[0][r], m.cols[1][r], m.cols[2][r], m.cols[3][r]];
        let r0 = row(0);
        let r1 = row(1);
        let r2 = row(2);
        let r3 = row(3);

        let combine = |a: [f32; 4], b: [f32; 4], sign: f32| {
            Plane::new(
                a[0] + sign * b[0],
                a[1] + sign * b[1],
                a[2] + sign * b[2],
                a[3] + sign * b[3],
            )
        };

        Self {
            planes: [
                combine(r3, r0, 1.0),  // left
                combine(r3, r0, -1.0), // right
                combine(r3, r1, 1.0),  // bottom
                combine(r3, r1, -1.0), // top
                combine(r3, r2, 1.0),  // near
                combine(r3, r2, -1.0), // far
            ],
        }
    }

    /// Whether `aabb` intersects or lies inside the frustum (conservative:
    /// never culls a box that genuinely overlaps, per the standard
    /// plane/AABB separating-axis shortcut).
    #[must_use]
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        let center = aabb.center();
        let half = aabb.half_extents();
        for plane in &self.planes {
            let radius = half.x * plane.a.abs() + half.y * plane.b.abs() + half.z * plane.c.abs();
            let distance = plane.distance_to_point(center.x, center.y, center.z);
            if distance < -radius {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    fn camera_frustum() -> Frustum {
        let view = Mat4::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        let proj = Mat4::perspective(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        Frustum::from_view_projection(&proj.mul(&view))
    }

    #[test]
    fn box_at_origin_is_visible() {
        let frustum = camera_frustum();
        let aabb = Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        assert!(frustum.intersects_aabb(&aabb));
    }

    #[test]
    fn box_far_behind_the_camera_is_culled() {
        let frustum = camera_frustum();
        let aabb = Aabb::new(Vec3::new(-1.0, -1.0, 49.0), Vec3::new(1.0, 1.0, 51.0));
        assert!(!frustum.intersects_aabb(&aabb));
    }

    #[test]
    fn box_far_to_the_side_is_culled() {
        let frustum = camera_frustum();
        let aabb = Aabb::new(Vec3::new(500.0, -1.0, -1.0), Vec3::new(502.0, 1.0, 1.0));
        assert!(!frustum.intersects_aabb(&aabb));
    }
}
