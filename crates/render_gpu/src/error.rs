//! Recording-time errors for [`crate::CommandBuffer`].
//!
//! Per the render core's error policy, a malformed operand is caught and
//! reported as a `Result` when it is *recorded*, before any GPU work is
//! produced — never discovered later at `execute()` time.

use thiserror::Error;

/// Failure recording a command into a [`crate::CommandBuffer`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandBufferError {
    /// A field that must fit the command word's bit layout overflowed it.
    #[error("{field} value {value} does not fit in {bits} bits")]
    OperandOverflow {
        /// Name of the offending field, for diagnostics.
        field: &'static str,
        /// The value that was rejected.
        value: u64,
        /// Width of the bitfield it was being packed into.
        bits: u32,
    },

    /// A `MemoryPool` handle passed to an indirect uniform upload was not
    /// aligned to [`render_core::memory::ALLOC_ALIGN`], so its offset can't
    /// round-trip through the command word's shifted encoding.
    #[error("memory pool offset {offset} is not {align}-byte aligned")]
    Misaligned {
        /// The unaligned byte offset.
        offset: usize,
        /// Required alignment.
        align: usize,
    },

    /// A command was recorded after the buffer was already terminated with
    /// `end()`.
    #[error("command buffer already ended")]
    AlreadyEnded,
}
