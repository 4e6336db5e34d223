//! The compact, tagged command buffer: every recorded command is one or
//! more 32-bit words, decoded and dispatched against a [`crate::GlSink`]
//! at `execute()` time.
//!
//! Word 0 of every command packs an 8-bit opcode into the high byte and a
//! 24-bit payload (`data`) into the rest:
//!
//! ```text
//! bit  31                24 23                      0
//!      +------------------+-------------------------+
//!      |      opcode      |           data           |
//!      +------------------+-------------------------+
//! ```
//!
//! Commands whose payload doesn't fit 24 bits append further raw `u32`
//! words, per [`Opcode`]'s documentation.

use render_core::memory::{MemoryHandle, MemoryPool, ALLOC_ALIGN};
use render_core::sync::FenceId;

use crate::error::CommandBufferError;
use crate::sink::GlSink;

const OPCODE_SHIFT: u32 = 24;
const DATA_MASK: u32 = 0x00FF_FFFF;

/// A primitive topology, packed into 3 bits.
///
/// Codes match the normative table: `0=Points, 1=Lines, 2=LineLoop,
/// 3=LineStrip, 4=Triangles, 5=TriangleFan, 6=TriangleStrip`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Primitive {
    /// Independent points.
    Points = 0,
    /// Independent line segments.
    Lines = 1,
    /// A closed loop of line segments.
    LineLoop = 2,
    /// A connected line strip.
    LineStrip = 3,
    /// Independent triangles.
    Triangles = 4,
    /// A triangle fan around the first vertex.
    TriangleFan = 5,
    /// A connected triangle strip.
    TriangleStrip = 6,
}

impl Primitive {
    const fn from_bits(bits: u32) -> Self {
        match bits {
            0 => Self::Points,
            1 => Self::Lines,
            2 => Self::LineLoop,
            3 => Self::LineStrip,
            4 => Self::Triangles,
            5 => Self::TriangleFan,
            _ => Self::TriangleStrip,
        }
    }
}

/// Which kind of value a `PushUniform` command carries, packed into 3 bits
/// of word 0's `data` field alongside the 21-bit uniform location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UniformKind {
    /// An immediate `i32`, carried directly in word 1.
    Int = 0,
    /// An immediate `f32`, carried as raw bits in word 1.
    Float = 1,
    /// A sampler binding; word 1 is a texture resource handle.
    Sampler = 2,
    /// A 4-component float vector staged in the scratch pool; word 1 is its
    /// handle offset, shifted right by [`ALLOC_ALIGN`]'s power of two.
    Vector4 = 3,
    /// A 4x4 float matrix staged in the scratch pool, encoded like
    /// [`UniformKind::Vector4`].
    Matrix4x4 = 4,
}

impl UniformKind {
    const fn from_bits(bits: u32) -> Self {
        match bits {
            0 => Self::Int,
            1 => Self::Float,
            2 => Self::Sampler,
            3 => Self::Vector4,
            _ => Self::Matrix4x4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum Opcode {
    BeginRenderPass = 0,
    BeginSubpass = 1,
    UseProgram = 2,
    Draw = 3,
    DrawIndexed = 4,
    DrawBaseVertex = 5,
    BufferUpload = 6,
    PushUniform = 7,
    FenceSync = 8,
    FenceWait = 9,
    End = 10,
    GenerateMipmaps = 11,
}

impl Opcode {
    const fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::BeginRenderPass,
            1 => Self::BeginSubpass,
            2 => Self::UseProgram,
            3 => Self::Draw,
            4 => Self::DrawIndexed,
            5 => Self::DrawBaseVertex,
            6 => Self::BufferUpload,
            7 => Self::PushUniform,
            8 => Self::FenceSync,
            9 => Self::FenceWait,
            10 => Self::End,
            11 => Self::GenerateMipmaps,
            other => panic!("unknown opcode in a recorded command buffer: {other}"),
        }
    }
}

fn pack(opcode: Opcode, data: u32) -> u32 {
    debug_assert_eq!(data & !DATA_MASK, 0, "data field overflowed 24 bits");
    ((opcode as u32) << OPCODE_SHIFT) | (data & DATA_MASK)
}

fn check_bits(field: &'static str, value: u64, bits: u32) -> Result<(), CommandBufferError> {
    if value >= (1u64 << bits) {
        return Err(CommandBufferError::OperandOverflow { field, value, bits });
    }
    Ok(())
}

/// A recorded, not-yet-executed sequence of render commands.
///
/// Recording methods validate their operands against the bit layout and
/// return `Err` immediately on overflow, per the "fail at record time"
/// policy; `execute()` treats the buffer as already well-formed and panics
/// on anything that would indicate a bug in this module rather than in the
/// caller.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    words: Vec<u32>,
    ended: bool,
}

impl CommandBuffer {
    /// An empty, unterminated command buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of 32-bit words recorded so far.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    fn push_word(&mut self, opcode: Opcode, data: u32) -> Result<(), CommandBufferError> {
        if self.ended {
            return Err(CommandBufferError::AlreadyEnded);
        }
        self.words.push(pack(opcode, data));
        Ok(())
    }

    /// Records `BeginRenderPass`.
    ///
    /// # Errors
    /// See [`CommandBufferError::OperandOverflow`]/[`CommandBufferError::AlreadyEnded`].
    pub fn begin_render_pass(&mut self, render_target: u32) -> Result<(), CommandBufferError> {
        check_bits("render_target", u64::from(render_target), 24)?;
        self.push_word(Opcode::BeginRenderPass, render_target)
    }

    /// Records `BeginSubpass`.
    ///
    /// # Errors
    /// See [`CommandBuffer::begin_render_pass`].
    pub fn begin_subpass(&mut self, subpass: u32) -> Result<(), CommandBufferError> {
        check_bits("subpass", u64::from(subpass), 24)?;
        self.push_word(Opcode::BeginSubpass, subpass)
    }

    /// Records `UseProgram`.
    ///
    /// # Errors
    /// See [`CommandBuffer::begin_render_pass`].
    pub fn use_program(&mut self, program: u32) -> Result<(), CommandBufferError> {
        check_bits("program", u64::from(program), 24)?;
        self.push_word(Opcode::UseProgram, program)
    }

    /// Records `Draw`: word 0 carries the vertex array handle, word 1
    /// packs `primitive` (3 bits) and `vertex_count` (24 bits).
    ///
    /// # Errors
    /// See [`CommandBuffer::begin_render_pass`].
    pub fn draw(
        &mut self,
        vertex_array: u32,
        primitive: Primitive,
        vertex_count: u32,
    ) -> Result<(), CommandBufferError> {
        check_bits("vertex_array", u64::from(vertex_array), 24)?;
        check_bits("vertex_count", u64::from(vertex_count), 24)?;
        self.push_word(Opcode::Draw, vertex_array)?;
        let word1 = ((primitive as u32) << 24) | (vertex_count & DATA_MASK);
        self.words.push(word1);
        Ok(())
    }

    /// Records `DrawIndexed`: an extra raw word carries `index_offset`.
    ///
    /// # Errors
    /// See [`CommandBuffer::begin_render_pass`].
    pub fn draw_indexed(
        &mut self,
        vertex_array: u32,
        primitive: Primitive,
        index_count: u32,
        index_offset: u32,
    ) -> Result<(), CommandBufferError> {
        check_bits("vertex_array", u64::from(vertex_array), 24)?;
        check_bits("index_count", u64::from(index_count), 24)?;
        self.push_word(Opcode::DrawIndexed, vertex_array)?;
        let word1 = ((primitive as u32) << 24) | (index_count & DATA_MASK);
        self.words.push(word1);
        self.words.push(index_offset);
        Ok(())
    }

    /// Records `DrawBaseVertex`: two extra raw words carry `base_vertex`
    /// and `index_offset`, matching the original engine's encoding.
    ///
    /// # Errors
    /// See [`CommandBuffer::begin_render_pass`].
    pub fn draw_base_vertex(
        &mut self,
        vertex_array: u32,
        primitive: Primitive,
        vertex_count: u32,
        base_vertex: u32,
        index_offset: u32,
    ) -> Result<(), CommandBufferError> {
        check_bits("vertex_array", u64::from(vertex_array), 24)?;
        check_bits("vertex_count", u64::from(vertex_count), 24)?;
        self.push_word(Opcode::DrawBaseVertex, vertex_array)?;
        let word1 = ((primitive as u32) << 24) | (vertex_count & DATA_MASK);
        self.words.push(word1);
        self.words.push(base_vertex);
        self.words.push(index_offset);
        Ok(())
    }

    /// Records `BufferUpload`. `src` must be a handle into the scratch
    /// `MemoryPool` aligned to [`ALLOC_ALIGN`] (true of every handle
    /// `MemoryPool::alloc` produces), since its offset is packed shifted
    /// right by `ALLOC_ALIGN`'s bit width.
    ///
    /// # Errors
    /// Returns [`CommandBufferError::Misaligned`] if `src`'s offset isn't
    /// `ALLOC_ALIGN`-aligned (unreachable for handles obtained from
    /// `MemoryPool::alloc`, but checked defensively), or an overflow error
    /// if `dest_buffer`, the shifted offset, or `size` don't fit their
    /// fields.
    pub fn buffer_upload(
        &mut self,
        dest_buffer: u32,
        src: MemoryHandle,
        offset: usize,
        size: usize,
    ) -> Result<(), CommandBufferError> {
        check_bits("dest_buffer", u64::from(dest_buffer), 24)?;
        if offset % ALLOC_ALIGN != 0 {
            return Err(CommandBufferError::Misaligned {
                offset,
                align: ALLOC_ALIGN,
            });
        }
        let shifted = offset / ALLOC_ALIGN;
        check_bits("src_offset", shifted as u64, 20)?;
        check_bits("size", size as u64, 12)?;
        debug_assert!(size <= src.len());
        self.push_word(Opcode::BufferUpload, dest_buffer)?;
        let word1 = ((size as u32 & 0xFFF) << 20) | (shifted as u32 & 0x000F_FFFF);
        self.words.push(word1);
        Ok(())
    }

    fn push_uniform_header(&mut self, kind: UniformKind, location: u32) -> Result<(), CommandBufferError> {
        check_bits("location", u64::from(location), 21)?;
        let data = ((kind as u32) << 21) | (location & 0x001F_FFFF);
        self.push_word(Opcode::PushUniform, data)
    }

    /// Records an integer `PushUniform`.
    ///
    /// # Errors
    /// See [`CommandBuffer::begin_render_pass`].
    pub fn push_uniform_int(&mut self, location: u32, value: i32) -> Result<(), CommandBufferError> {
        self.push_uniform_header(UniformKind::Int, location)?;
        self.words.push(value as u32);
        Ok(())
    }

    /// Records a float `PushUniform`.
    ///
    /// # Errors
    /// See [`CommandBuffer::begin_render_pass`].
    pub fn push_uniform_float(&mut self, location: u32, value: f32) -> Result<(), CommandBufferError> {
        self.push_uniform_header(UniformKind::Float, location)?;
        self.words.push(value.to_bits());
        Ok(())
    }

    /// Records a sampler `PushUniform`.
    ///
    /// # Errors
    /// See [`CommandBuffer::begin_render_pass`].
    pub fn push_uniform_sampler(&mut self, location: u32, texture: u32) -> Result<(), CommandBufferError> {
        self.push_uniform_header(UniformKind::Sampler, location)?;
        self.words.push(texture);
        Ok(())
    }

    /// Records a vec4 `PushUniform` whose data lives at `offset` bytes
    /// into the scratch pool.
    ///
    /// # Errors
    /// Returns [`CommandBufferError::Misaligned`] if `offset` isn't
    /// `ALLOC_ALIGN`-aligned.
    pub fn push_uniform_vector4(&mut self, location: u32, offset: usize) -> Result<(), CommandBufferError> {
        self.push_uniform_indirect(UniformKind::Vector4, location, offset)
    }

    /// Records a 4x4 matrix `PushUniform` whose data lives at `offset`
    /// bytes into the scratch pool.
    ///
    /// # Errors
    /// Returns [`CommandBufferError::Misaligned`] if `offset` isn't
    /// `ALLOC_ALIGN`-aligned.
    pub fn push_uniform_matrix4x4(&mut self, location: u32, offset: usize) -> Result<(), CommandBufferError> {
        self.push_uniform_indirect(UniformKind::Matrix4x4, location, offset)
    }

    fn push_uniform_indirect(
        &mut self,
        kind: UniformKind,
        location: u32,
        offset: usize,
    ) -> Result<(), CommandBufferError> {
        if offset % ALLOC_ALIGN != 0 {
            return Err(CommandBufferError::Misaligned {
                offset,
                align: ALLOC_ALIGN,
            });
        }
        let shifted = offset / ALLOC_ALIGN;
        check_bits("uniform_offset", shifted as u64, 32)?;
        self.push_uniform_header(kind, location)?;
        self.words.push(shifted as u32);
        Ok(())
    }

    /// Records `FenceSync`.
    ///
    /// # Errors
    /// See [`CommandBuffer::begin_render_pass`].
    pub fn fence_sync(&mut self, fence: FenceId) -> Result<(), CommandBufferError> {
        check_bits("fence_id", fence.raw(), 23)?;
        self.push_word(Opcode::FenceSync, fence.raw() as u32)
    }

    /// Records `FenceWait`.
    ///
    /// # Errors
    /// See [`CommandBuffer::begin_render_pass`].
    pub fn fence_wait(&mut self, fence: FenceId) -> Result<(), CommandBufferError> {
        check_bits("fence_id", fence.raw(), 23)?;
        self.push_word(Opcode::FenceWait, fence.raw() as u32)
    }

    /// Records `GenerateMipmaps`: a moment-shadow-map view emits this
    /// against its own moment target at the end of recording, before
    /// `FenceSync`/`End`. `levels` rides along as a plain follow-up word
    /// since it needs no packed encoding of its own.
    ///
    /// # Errors
    /// See [`CommandBuffer::begin_render_pass`].
    pub fn generate_mipmaps(&mut self, texture: u32, levels: u32) -> Result<(), CommandBufferError> {
        check_bits("texture", u64::from(texture), 24)?;
        self.push_word(Opcode::GenerateMipmaps, texture)?;
        self.words.push(levels);
        Ok(())
    }

    /// Terminates the buffer with `End`. No further commands may be
    /// recorded afterward.
    ///
    /// # Errors
    /// Returns [`CommandBufferError::AlreadyEnded`] if called twice.
    pub fn end(&mut self) -> Result<(), CommandBufferError> {
        self.push_word(Opcode::End, 0)?;
        self.ended = true;
        Ok(())
    }

    /// Decodes and dispatches every recorded command against `sink`,
    /// resolving indirect uniform/upload payloads against `pool`.
    ///
    /// # Panics
    ///
    /// Panics if the buffer was never terminated with `end()`, or if its
    /// word stream is malformed — both indicate a bug in this module's
    /// recording methods, not a caller error, since recording already
    /// validated every operand.
    pub fn execute(&self, sink: &mut dyn GlSink, pool: &MemoryPool) {
        assert!(self.ended, "execute() called on a buffer missing End");
        let mut pc = 0usize;
        loop {
            let word0 = self.words[pc];
            let opcode = Opcode::from_u8((word0 >> OPCODE_SHIFT) as u8);
            let data = word0 & DATA_MASK;
            pc += 1;
            match opcode {
                Opcode::BeginRenderPass => sink.begin_render_pass(data),
                Opcode::BeginSubpass => sink.begin_subpass(data),
                Opcode::UseProgram => sink.use_program(data),
                Opcode::Draw => {
                    let word1 = self.words[pc];
                    pc += 1;
                    let primitive = Primitive::from_bits(word1 >> 24);
                    sink.draw(data, primitive, word1 & DATA_MASK);
                }
                Opcode::DrawIndexed => {
                    let word1 = self.words[pc];
                    let index_offset = self.words[pc + 1];
                    pc += 2;
                    let primitive = Primitive::from_bits(word1 >> 24);
                    sink.draw_indexed(data, primitive, word1 & DATA_MASK, index_offset);
                }
                Opcode::DrawBaseVertex => {
                    let word1 = self.words[pc];
                    let base_vertex = self.words[pc + 1];
                    let index_offset = self.words[pc + 2];
                    pc += 3;
                    let primitive = Primitive::from_bits(word1 >> 24);
                    sink.draw_base_vertex(data, primitive, word1 & DATA_MASK, base_vertex, index_offset);
                }
                Opcode::BufferUpload => {
                    let word1 = self.words[pc];
                    pc += 1;
                    let size = (word1 >> 20) as usize;
                    let shifted = word1 & 0x000F_FFFF;
                    let offset = shifted as usize * ALLOC_ALIGN;
                    let handle = MemoryHandle::from_raw_parts(offset, size);
                    sink.buffer_upload(data, handle, size);
                }
                Opcode::PushUniform => {
                    let kind = UniformKind::from_bits(data >> 21);
                    let location = data & 0x001F_FFFF;
                    let payload = self.words[pc];
                    pc += 1;
                    match kind {
                        UniformKind::Int => sink.push_uniform_int(location, payload as i32),
                        UniformKind::Float => sink.push_uniform_float(location, f32::from_bits(payload)),
                        UniformKind::Sampler => sink.push_uniform_sampler(location, payload),
                        UniformKind::Vector4 => {
                            let offset = payload as usize * ALLOC_ALIGN;
                            let handle =
                                MemoryHandle::from_raw_parts(offset, std::mem::size_of::<[f32; 4]>());
                            let _ = pool;
                            sink.push_uniform_vector4(location, handle);
                        }
                        UniformKind::Matrix4x4 => {
                            let offset = payload as usize * ALLOC_ALIGN;
                            let handle =
                                MemoryHandle::from_raw_parts(offset, std::mem::size_of::<[f32; 16]>());
                            sink.push_uniform_matrix4x4(location, handle);
                        }
                    }
                }
                Opcode::FenceSync => sink.fence_sync(FenceId::from_raw(u64::from(data))),
                Opcode::FenceWait => sink.fence_wait(FenceId::from_raw(u64::from(data))),
                Opcode::GenerateMipmaps => {
                    let levels = self.words[pc];
                    pc += 1;
                    sink.generate_mipmaps(data, levels);
                }
                Opcode::End => {
                    sink.end();
                    break;
                }
            }
        }
    }

    /// Resets the buffer to empty, ready to record a new frame's commands.
    pub fn reset(&mut self) {
        self.words.clear();
        self.ended = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use render_core::sync::FenceId;

    fn fence(raw: u64) -> FenceId {
        FenceId::from_raw(raw)
    }

    #[test]
    fn draw_round_trips_opcode_and_operands() {
        let mut buf = CommandBuffer::new();
        buf.begin_render_pass(7).unwrap();
        buf.use_program(3).unwrap();
        buf.draw(5, Primitive::Triangles, 36).unwrap();
        buf.fence_sync(fence(2)).unwrap();
        buf.end().unwrap();

        // 5 commands, 8 words total; the Draw command's two words match
        // `(OpDraw<<24)|5` and `(4<<24)|36` exactly (Triangles packs to
        // code 4).
        assert_eq!(buf.word_count(), 8);
        let draw_opcode = 3u32; // Opcode::Draw's discriminant
        assert_eq!(buf.words[2], (draw_opcode << 24) | 5);
        assert_eq!(buf.words[3], (4u32 << 24) | 36);

        let pool = MemoryPool::new(0);
        let mut sink = RecordingSinkForTest::default();
        buf.execute(&mut sink, &pool);
        assert_eq!(
            sink.calls,
            vec![
                "begin_render_pass(7)".to_string(),
                "use_program(3)".to_string(),
                "draw(5, Triangles, 36)".to_string(),
                "fence_sync(FenceId(2))".to_string(),
                "end".to_string(),
            ]
        );
    }

    #[test]
    fn out_of_range_vertex_count_fails_at_record_time() {
        let mut buf = CommandBuffer::new();
        let err = buf.draw(0, Primitive::Triangles, 1 << 24).unwrap_err();
        assert_eq!(
            err,
            CommandBufferError::OperandOverflow {
                field: "vertex_count",
                value: 1 << 24,
                bits: 24,
            }
        );
        // The failed recording left the buffer untouched, not partially
        // written — nothing was appended before the bounds check failed.
        assert_eq!(buf.word_count(), 0);
    }

    #[test]
    fn out_of_range_resource_id_fails_at_record_time() {
        let mut buf = CommandBuffer::new();
        let err = buf.begin_render_pass(1 << 24).unwrap_err();
        assert!(matches!(err, CommandBufferError::OperandOverflow { field: "render_target", .. }));
    }

    #[test]
    fn push_uniform_kinds_pack_into_three_bits_alongside_a_21_bit_location() {
        let mut buf = CommandBuffer::new();
        buf.push_uniform_int(5, -3).unwrap();
        buf.push_uniform_float(6, 1.5).unwrap();
        buf.push_uniform_sampler(7, 9).unwrap();
        buf.end().unwrap();

        let pool = MemoryPool::new(0);
        let mut sink = RecordingSinkForTest::default();
        buf.execute(&mut sink, &pool);
        assert_eq!(
            sink.calls,
            vec![
                "push_uniform_int(5, -3)".to_string(),
                "push_uniform_float(6, 1.5)".to_string(),
                "push_uniform_sampler(7, 9)".to_string(),
                "end".to_string(),
            ]
        );
    }

    #[test]
    fn recording_after_end_is_rejected() {
        let mut buf = CommandBuffer::new();
        buf.end().unwrap();
        assert_eq!(buf.use_program(1).unwrap_err(), CommandBufferError::AlreadyEnded);
    }

    #[test]
    fn generate_mipmaps_round_trips_texture_and_levels() {
        let mut buf = CommandBuffer::new();
        buf.generate_mipmaps(9, 4).unwrap();
        buf.end().unwrap();

        let pool = MemoryPool::new(0);
        let mut sink = RecordingSinkForTest::default();
        buf.execute(&mut sink, &pool);
        assert_eq!(
            sink.calls,
            vec!["generate_mipmaps(9, 4)".to_string(), "end".to_string()]
        );
    }

    #[test]
    fn misaligned_buffer_upload_offset_is_rejected() {
        let mut buf = CommandBuffer::new();
        let pool = MemoryPool::new(64);
        let handle = pool.alloc::<u8>(16).unwrap();
        let err = buf.buffer_upload(0, handle, 1, 16).unwrap_err();
        assert_eq!(err, CommandBufferError::Misaligned { offset: 1, align: ALLOC_ALIGN });
    }

    // A minimal sink used only by this module's tests, distinct from
    // `RecordingSink` so these assertions don't depend on its pool-aware
    // formatting of vector/matrix uniforms.
    #[derive(Default)]
    struct RecordingSinkForTest {
        calls: Vec<String>,
    }

    impl GlSink for RecordingSinkForTest {
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
        fn draw_indexed(&mut self, vertex_array: u32, primitive: Primitive, index_count: u32, index_offset: u32) {
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
        fn push_uniform_vector4(&mut self, location: u32, _data: MemoryHandle) {
            self.calls.push(format!("push_uniform_vector4({location})"));
        }
        fn push_uniform_matrix4x4(&mut self, location: u32, _data: MemoryHandle) {
            self.calls.push(format!("push_uniform_matrix4x4({location})"));
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
}
