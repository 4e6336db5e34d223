//! `GlSink`: the abstraction a [`crate::CommandBuffer`] dispatches decoded
//! commands against at `execute()` time.
//!
//! The render core never talks to a real GL/Vulkan context directly —
//! that's outside scope per the data model's Non-goals — so `execute()` is
//! parameterized over any sink implementing this trait. Production code
//! wires a real backend; tests and the CLI's `bench-cmdbuf`/`run-frame`
//! commands use [`RecordingSink`].

use render_core::memory::{MemoryHandle, MemoryPool};
use render_core::sync::FenceId;

use crate::command::{Primitive, UniformKind};

/// Receives decoded commands as a [`crate::CommandBuffer`] executes.
///
/// Every method corresponds to one opcode; `execute()` calls them in
/// program order and stops after `end()`.
pub trait GlSink {
    /// `BeginRenderPass`: `render_target` is a raw resource handle index.
    fn begin_render_pass(&mut self, render_target: u32);
    /// `BeginSubpass`.
    fn begin_subpass(&mut self, subpass: u32);
    /// `UseProgram`: `program` is a raw resource handle index.
    fn use_program(&mut self, program: u32);
    /// `Draw`.
    fn draw(&mut self, vertex_array: u32, primitive: Primitive, vertex_count: u32);
    /// `DrawIndexed`.
    fn draw_indexed(
        &mut self,
        vertex_array: u32,
        primitive: Primitive,
        index_count: u32,
        index_offset: u32,
    );
    /// `DrawBaseVertex`.
    fn draw_base_vertex(
        &mut self,
        vertex_array: u32,
        primitive: Primitive,
        vertex_count: u32,
        base_vertex: u32,
        index_offset: u32,
    );
    /// `BufferUpload`: `src` is the scratch-pool region the bytes were
    /// staged into before recording.
    fn buffer_upload(&mut self, dest_buffer: u32, src: MemoryHandle, size: usize);
    /// `PushUniform` with an immediate integer value.
    fn push_uniform_int(&mut self, location: u32, value: i32);
    /// `PushUniform` with an immediate float value.
    fn push_uniform_float(&mut self, location: u32, value: f32);
    /// `PushUniform` binding a sampler to a texture unit/resource.
    fn push_uniform_sampler(&mut self, location: u32, texture: u32);
    /// `PushUniform` with a vec4 staged in the scratch pool.
    fn push_uniform_vector4(&mut self, location: u32, data: MemoryHandle);
    /// `PushUniform` with a 4x4 matrix staged in the scratch pool.
    fn push_uniform_matrix4x4(&mut self, location: u32, data: MemoryHandle);
    /// `FenceSync`: signal `fence` once prior commands complete.
    fn fence_sync(&mut self, fence: FenceId);
    /// `FenceWait`: block the GPU timeline on `fence`.
    fn fence_wait(&mut self, fence: FenceId);
    /// `GenerateMipmaps`: regenerate `texture`'s mip chain down to
    /// `levels` levels. Emitted only by a moment-shadow-map view, at the
    /// end of recording, before `FenceSync`/`End`.
    fn generate_mipmaps(&mut self, texture: u32, levels: u32);
    /// `End`.
    fn end(&mut self);
}

/// A [`GlSink`] that performs no GPU work and just records the sequence of
/// calls it received, keyed by kind. Used by tests and `render_cli` to
/// exercise `execute()` without a real backend.
#[derive(Debug, Default)]
pub struct RecordingSink<'a> {
    /// Flattened log of dispatched calls, most recent last.
    pub calls: Vec<String>,
    /// Uniform payloads read back out of the backing pool, for assertions.
    pool: Option<&'a MemoryPool>,
}

impl<'a> RecordingSink<'a> {
    /// Builds an empty sink. If `pool` is `Some`, vector/matrix uniform
    /// payloads are dereferenced and logged with their values; otherwise
    /// only the handle is logged.
    #[must_use]
    pub fn new(pool: Option<&'a MemoryPool>) -> Self {
        Self {
            calls: Vec::new(),
            pool,
        }
    }

    fn pool(&self) -> Option<&MemoryPool> {
        self.pool
    }
}

impl GlSink for RecordingSink<'_> {
    fn begin_render_pass(&mut self, render_target: u32) {
        self.calls.push(format!("begin_render_pass({render_target})"));
    }

    fn begin_subpass(&mut self, subpass: u32) {
        self.calls.push(format!("begin_subpass({subpass})"));
    }

    fn use_program(&mut self, program: u32) {
        self.calls.push(format!("use_program({program})"));
    }

    fn draw(&mut self, vertex_array: u32, primitive: Primitive, vertex_count: u32) {
        self.calls
            .push(format!("draw({vertex_array}, {primitive:?}, {vertex_count})"));
    }

    fn draw_indexed(
        &mut self,
        vertex_array: u32,
        primitive: Primitive,
        index_count: u32,
        index_offset: u32,
    ) {
        self.calls.push(format!(
            "draw_indexed({vertex_array}, {primitive:?}, {index_count}, {index_offset})"
        ));
    }

    fn draw_base_vertex(
        &mut self,
        vertex_array: u32,
        primitive: Primitive,
        vertex_count: u32,
        base_vertex: u32,
        index_offset: u32,
    ) {
        self.calls.push(format!(
            "draw_base_vertex({vertex_array}, {primitive:?}, {vertex_count}, {base_vertex}, {index_offset})"
        ));
    }

    fn buffer_upload(&mut self, dest_buffer: u32, src: MemoryHandle, size: usize) {
        self.calls
            .push(format!("buffer_upload({dest_buffer}, {}, {size})", src.len()));
    }

    fn push_uniform_int(&mut self, location: u32, value: i32) {
        self.calls.push(format!("push_uniform_int({location}, {value})"));
    }

    fn push_uniform_float(&mut self, location: u32, value: f32) {
        self.calls.push(format!("push_uniform_float({location}, {value})"));
    }

    fn push_uniform_sampler(&mut self, location: u32, texture: u32) {
        self.calls.push(format!("push_uniform_sampler({location}, {texture})"));
    }

    fn push_uniform_vector4(&mut self, location: u32, data: MemoryHandle) {
        if let Some(pool) = self.pool() {
            let v = pool.ptr::<[f32; 4]>(data);
            self.calls.push(format!("push_uniform_vector4({location}, {v:?})"));
        } else {
            self.calls.push(format!("push_uniform_vector4({location})"));
        }
    }

    fn push_uniform_matrix4x4(&mut self, location: u32, data: MemoryHandle) {
        if let Some(pool) = self.pool() {
            let m = pool.ptr::<[f32; 16]>(data);
            self.calls
                .push(format!("push_uniform_matrix4x4({location}, {:?})", &m[..4]));
        } else {
            self.calls.push(format!("push_uniform_matrix4x4({location})"));
        }
    }

    fn fence_sync(&mut self, fence: FenceId) {
        self.calls.push(format!("fence_sync({fence:?})"));
    }

    fn fence_wait(&mut self, fence: FenceId) {
        self.calls.push(format!("fence_wait({fence:?})"));
    }

    fn generate_mipmaps(&mut self, texture: u32, levels: u32) {
        self.calls.push(format!("generate_mipmaps({texture}, {levels})"));
    }

    fn end(&mut self) {
        self.calls.push("end".to_string());
    }
}
