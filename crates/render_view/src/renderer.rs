//! `Renderer`: owns every GPU-facing cache (`RenderTarget`, `ConstantBuffer`,
//! scratch `MemoryPool`, plus the program/sampler/LUT caches) and the
//! [`FenceTable`] that guards their reuse.
//!
//! The four cache vectors share one lookup shape — shared read, linear
//! search for a config match whose `lock` succeeds, and only on a miss a
//! brief exclusive write to append a fresh entry — factored here as
//! [`query_cached`] rather than repeated per resource type.

use std::collections::HashMap;

use parking_lot::{Mutex, RwLock};
use render_core::memory::MemoryPool;
use render_core::sync::{Fence, FenceId, FenceTable, Lockable};

/// What a [`RenderTarget`] is used for; part of its value-equal config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTargetPurpose {
    /// Depth-only prepass target.
    DepthPrepass,
    /// Variance/moment shadow-map target.
    MomentShadowMap,
    /// Forward-shaded color + linear-z target.
    ForwardLinearZ,
    /// Deferred G-buffer target.
    DeferredGBuffer,
}

/// Pixel format of one [`RenderTarget`] attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentFormat {
    /// 8-bit-per-channel RGBA color.
    Rgba8,
    /// 16-bit float RGBA color.
    Rgba16F,
    /// 32-bit float depth.
    Depth32F,
    /// Single-channel 32-bit float, used for moment/linear-z targets.
    R32F,
}

/// An enumerated, value-equal description of a framebuffer. Two configs
/// are equal iff every field matches — [`Renderer::query_render_target`]
/// uses this as its cache-hit predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTargetConfig {
    /// What this target is rendered for.
    pub purpose: RenderTargetPurpose,
    /// MSAA sample count (`1` for no multisampling).
    pub samples: u32,
    /// Viewport width in pixels.
    pub width: u32,
    /// Viewport height in pixels.
    pub height: u32,
    /// Attachment formats, in binding order.
    pub attachments: Vec<AttachmentFormat>,
}

/// A cached framebuffer plus its attachment texture ids.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    /// The config this target was created for.
    pub config: RenderTargetConfig,
    /// Raw resource-pool id of the framebuffer object.
    pub framebuffer: u32,
    /// Raw resource-pool ids of each attachment texture, in config order.
    pub attachments: Vec<u32>,
}

/// A cached uniform buffer.
#[derive(Debug, Clone, Copy)]
pub struct ConstantBuffer {
    /// Raw resource-pool id of the buffer object.
    pub buffer: u32,
    /// Byte capacity of the buffer.
    pub size: usize,
}

struct PooledMemory {
    pool: MemoryPool,
    size: usize,
}

/// Searches `cache` for an entry matching `matches` that successfully
/// locks against `fence`; on a miss, builds one with `create`, locks it,
/// and appends it. Returns the entry's index, used as its opaque id.
fn query_cached<T>(
    cache: &RwLock<Vec<Mutex<Lockable<T>>>>,
    fence: &Fence,
    matches: impl Fn(&T) -> bool,
    create: impl FnOnce() -> T,
) -> u32 {
    {
        let entries = cache.read();
        for (index, entry) in entries.iter().enumerate() {
            let mut locked = entry.lock();
            if matches(locked.get()) && locked.lock(fence.clone()) {
                return index as u32;
            }
        }
    }
    let mut entries = cache.write();
    let index = entries.len();
    let mut lockable = Lockable::new(create());
    lockable.lock(fence.clone());
    entries.push(Mutex::new(lockable));
    index as u32
}

/// Owns every pooled GPU-facing resource and the fence bookkeeping that
/// guards their reuse across in-flight frames.
pub struct Renderer {
    fences: Mutex<FenceTable>,
    next_resource_id: Mutex<u32>,
    programs: RwLock<HashMap<String, u32>>,
    samplers: RwLock<HashMap<String, u32>>,
    luts: RwLock<HashMap<String, u32>>,
    render_targets: RwLock<Vec<Mutex<Lockable<RenderTarget>>>>,
    constant_buffers: RwLock<Vec<Mutex<Lockable<ConstantBuffer>>>>,
    memory_pools: RwLock<Vec<Mutex<Lockable<PooledMemory>>>>,
}

impl Renderer {
    /// An empty renderer with no cached resources.
    #[must_use]
    pub fn new() -> Self {
        Self {
            fences: Mutex::new(FenceTable::new()),
            // Resource id 0 is reserved as `Invalid`.
            next_resource_id: Mutex::new(1),
            programs: RwLock::new(HashMap::new()),
            samplers: RwLock::new(HashMap::new()),
            luts: RwLock::new(HashMap::new()),
            render_targets: RwLock::new(Vec::new()),
            constant_buffers: RwLock::new(Vec::new()),
            memory_pools: RwLock::new(Vec::new()),
        }
    }

    fn allocate_resource_id(&self) -> u32 {
        let mut next = self.next_resource_id.lock();
        let id = *next;
        *next += 1;
        id
    }

    /// Creates a fence with an initial refcount of 2: one held by the
    /// table, one returned here for the caller (typically a
    /// [`crate::view::RenderView`]) to hold until it calls
    /// [`Renderer::done_fence`].
    pub fn query_fence(&self, label: &'static str) -> Fence {
        let fence = self.fences.lock().create(label);
        fence.ref_();
        fence
    }

    /// Releases the renderer's reference to `id`. Once every other
    /// dependent has also dereffed (refcount back to 0), the table forgets
    /// the fence; cache entries that were locked against it become
    /// re-lockable the next time [`Renderer::query_render_target`] (or its
    /// siblings) runs its linear scan, since `Lockable::lock` itself checks
    /// the live refcount rather than the table needing a separate sweep.
    pub fn done_fence(&self, id: FenceId) {
        self.fences.lock().done(id);
    }

    fn memoized_cache_lookup(cache: &RwLock<HashMap<String, u32>>, name: &str, allocate: impl FnOnce() -> u32) -> u32 {
        if let Some(id) = cache.read().get(name) {
            return *id;
        }
        let mut cache = cache.write();
        *cache.entry(name.to_string()).or_insert_with(|| {
            let id = allocate();
            tracing::debug!(name, id, "program/sampler/lut cache miss");
            id
        })
    }

    /// Looks up (or compiles and caches) the program named `name`.
    pub fn query_program(&self, name: &str) -> u32 {
        Self::memoized_cache_lookup(&self.programs, name, || self.allocate_resource_id())
    }

    /// Looks up (or creates and caches) the sampler named `name`.
    pub fn query_sampler(&self, name: &str) -> u32 {
        Self::memoized_cache_lookup(&self.samplers, name, || self.allocate_resource_id())
    }

    /// Looks up (or bakes and caches) the LUT named `name`.
    pub fn query_lut(&self, name: &str) -> u32 {
        Self::memoized_cache_lookup(&self.luts, name, || self.allocate_resource_id())
    }

    /// Finds or allocates a [`RenderTarget`] matching `config`, locked
    /// against `fence`. Returns its opaque id for use with
    /// [`Renderer::render_target_framebuffer`] and as a command buffer
    /// operand.
    pub fn query_render_target(&self, config: &RenderTargetConfig, fence: &Fence) -> u32 {
        query_cached(
            &self.render_targets,
            fence,
            |rt: &RenderTarget| &rt.config == config,
            || {
                let framebuffer = self.allocate_resource_id();
                let attachments = config.attachments.iter().map(|_| self.allocate_resource_id()).collect();
                let purpose = config.purpose;
                tracing::debug!(framebuffer, ?purpose, "render target cache miss");
                RenderTarget {
                    config: config.clone(),
                    framebuffer,
                    attachments,
                }
            },
        )
    }

    /// The raw framebuffer resource id backing `id`, for
    /// `CommandBuffer::begin_render_pass`.
    #[must_use]
    pub fn render_target_framebuffer(&self, id: u32) -> u32 {
        self.render_targets.read()[id as usize].lock().get().framebuffer
    }

    /// The raw resource id of render target `id`'s `index`'th attachment
    /// (in config order), for `CommandBuffer::generate_mipmaps` and
    /// sampler binding.
    #[must_use]
    pub fn render_target_attachment(&self, id: u32, index: usize) -> u32 {
        self.render_targets.read()[id as usize].lock().get().attachments[index]
    }

    /// Releases every fence held by render target `id`, matching the
    /// original `Renderer::releaseRenderTarget` convenience wrapper over
    /// `Lockable::unlock`.
    pub fn release_render_target(&self, id: u32) {
        self.render_targets.read()[id as usize].lock().unlock();
    }

    /// Finds or allocates the smallest cached [`ConstantBuffer`] with
    /// `size >= requested`, locked against `fence`.
    pub fn query_constant_buffer(&self, requested: usize, fence: &Fence) -> u32 {
        query_cached(
            &self.constant_buffers,
            fence,
            |cb: &ConstantBuffer| cb.size >= requested,
            || {
                let buffer = self.allocate_resource_id();
                tracing::debug!(buffer, size = requested, "constant buffer cache miss");
                ConstantBuffer { buffer, size: requested }
            },
        )
    }

    /// The raw buffer id and capacity backing `id`.
    #[must_use]
    pub fn constant_buffer_info(&self, id: u32) -> (u32, usize) {
        let guard = self.constant_buffers.read()[id as usize].lock();
        let cb = guard.get();
        (cb.buffer, cb.size)
    }

    /// Releases every fence held by constant buffer `id`.
    pub fn release_constant_buffer(&self, id: u32) {
        self.constant_buffers.read()[id as usize].lock().unlock();
    }

    /// Finds or allocates the smallest cached scratch [`MemoryPool`] with
    /// `size >= requested` bytes, locked against `fence`.
    pub fn query_memory_pool(&self, requested: usize, fence: &Fence) -> u32 {
        query_cached(
            &self.memory_pools,
            fence,
            |pm: &PooledMemory| pm.size >= requested,
            || {
                tracing::debug!(size = requested, "memory pool cache miss");
                PooledMemory {
                    pool: MemoryPool::new(requested),
                    size: requested,
                }
            },
        )
    }

    /// Runs `f` against the scratch pool backing `id`. The pool's own
    /// bump allocator only needs a shared borrow (see
    /// [`render_core::memory::MemoryPool`]'s single-writer contract), so
    /// `f` may itself call `alloc`.
    pub fn with_memory_pool<R>(&self, id: u32, f: impl FnOnce(&MemoryPool) -> R) -> R {
        let guard = self.memory_pools.read()[id as usize].lock();
        f(&guard.get().pool)
    }

    /// Releases every fence held by memory pool `id` and resets its bump
    /// offset back to zero, ready for reuse.
    pub fn release_memory_pool(&self, id: u32) {
        let mut guard = self.memory_pools.write();
        let mut locked = guard[id as usize].lock();
        locked.unlock();
        locked.get_mut().pool.reset();
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target_config() -> RenderTargetConfig {
        RenderTargetConfig {
            purpose: RenderTargetPurpose::ForwardLinearZ,
            samples: 1,
            width: 1920,
            height: 1080,
            attachments: vec![AttachmentFormat::Rgba8, AttachmentFormat::Depth32F],
        }
    }

    #[test]
    fn fence_guards_render_target_reuse() {
        let renderer = Renderer::new();
        let config = target_config();

        let fence1 = renderer.query_fence("frame1");
        let id1 = renderer.query_render_target(&config, &fence1);

        // Still locked under fence1 (refcount 2): a second request for the
        // same config must allocate a fresh target, not reuse id1.
        let fence2 = renderer.query_fence("frame2");
        let id2 = renderer.query_render_target(&config, &fence2);
        assert_ne!(id1, id2, "locked target must not be handed out again");

        renderer.done_fence(fence1.id());
        renderer.release_render_target(id1);

        let fence3 = renderer.query_fence("frame3");
        let id3 = renderer.query_render_target(&config, &fence3);
        assert_eq!(id1, id3, "released target should be reused once unlocked");
    }

    #[test]
    fn constant_buffer_hands_out_the_smallest_fit() {
        let renderer = Renderer::new();
        let fence = renderer.query_fence("f");
        let small = renderer.query_constant_buffer(64, &fence);
        renderer.release_constant_buffer(small);

        let fence2 = renderer.query_fence("g");
        let reused = renderer.query_constant_buffer(32, &fence2);
        assert_eq!(small, reused);
        let (_, size) = renderer.constant_buffer_info(reused);
        assert_eq!(size, 64);
    }

    #[test]
    fn program_cache_memoizes_by_name() {
        let renderer = Renderer::new();
        let a = renderer.query_program("forward_opaque");
        let b = renderer.query_program("forward_opaque");
        let c = renderer.query_program("shadow_moment");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn memory_pool_alloc_round_trips_through_with_memory_pool() {
        let renderer = Renderer::new();
        let fence = renderer.query_fence("scratch");
        let id = renderer.query_memory_pool(256, &fence);
        let handle = renderer.with_memory_pool(id, |pool| pool.alloc::<[f32; 4]>(1)).unwrap();
        assert_eq!(handle.len(), 16);
    }
}
