//! Renderer-wide configuration. No file format backs this (YAML/`.meta`
//! loading is explicitly out of scope) — `render_cli` builds one directly
//! from parsed `clap` flags, everything else gets `Default`.

/// Tunables a [`crate::renderer::Renderer`] and its
/// [`crate::view::RenderView`]s are constructed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererConfig {
    /// Number of threads in the [`crate::worker::WorkerPool`].
    pub worker_count: usize,
    /// Byte size of the small per-view scratch [`render_core::memory::MemoryPool`]
    /// used for object-constant staging.
    pub scratch_pool_bytes: usize,
    /// Byte size of the per-view visibility [`render_core::memory::MemoryPool`]
    /// backing the occlusion rasterizer's working set.
    pub visibility_pool_bytes: usize,
    /// How many object-constant records share one uniform-buffer block
    /// before a subpass boundary is inserted.
    pub objects_per_block: u32,
    /// Minimum uniform-buffer offset alignment object records are strided
    /// by; mimics a real backend's `GL_UNIFORM_BUFFER_OFFSET_ALIGNMENT`.
    pub uniform_align: usize,
    /// Occlusion buffer tile resolution: `(width, height, tile_size)`.
    pub occlusion_tile_resolution: (u32, u32, u32),
    /// Mip levels generated for a moment-shadow-map view's target at the
    /// end of its render job.
    pub shadow_mip_levels: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            scratch_pool_bytes: 256 * 1024,
            visibility_pool_bytes: 64 * 1024,
            objects_per_block: 64,
            uniform_align: 256,
            occlusion_tile_resolution: (
                crate::occlusion::BUFFER_WIDTH,
                crate::occlusion::BUFFER_HEIGHT,
                crate::occlusion::TILE_SIZE,
            ),
            shadow_mip_levels: 4,
        }
    }
}

impl RendererConfig {
    /// Byte stride one [`crate::lights::ObjectConstants`] record occupies
    /// in the object uniform buffer, rounded up to [`Self::uniform_align`].
    #[must_use]
    pub fn object_stride(&self) -> usize {
        align_up(std::mem::size_of::<crate::lights::ObjectConstants>(), self.uniform_align)
    }

    /// Byte size of one full uniform-buffer block (`objects_per_block`
    /// strided object records).
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.object_stride() * self.objects_per_block as usize
    }
}

fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_nonzero_capacities() {
        let config = RendererConfig::default();
        assert!(config.scratch_pool_bytes > 0);
        assert!(config.objects_per_block > 0);
        assert_eq!(config.block_size(), config.object_stride() * config.objects_per_block as usize);
    }

    #[test]
    fn object_stride_is_aligned() {
        let config = RendererConfig::default();
        assert_eq!(config.object_stride() % config.uniform_align, 0);
    }
}
