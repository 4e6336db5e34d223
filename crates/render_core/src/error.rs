//! Error types shared across the render core's fallible, recording-time APIs.
//!
//! Per the error handling policy: programmer errors (bad handles, overflowed
//! operand fields) are either a `panic!`/`debug_assert!` at the boundary that
//! caused them, or a `Result` returned at *recording* time so callers can
//! propagate with `?` before any GPU work happens. Transient cache misses are
//! never represented as an error variant here.

use thiserror::Error;

/// Errors produced while allocating from or growing a [`crate::memory::ResourcePool`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResourcePoolError {
    /// The pool has reached its configured capacity and growth is disabled.
    #[error("resource pool exhausted: capacity {capacity} reached")]
    Exhausted {
        /// The pool's fixed capacity at the time of the failed allocation.
        capacity: usize,
    },
}

/// Errors produced by the entity store while creating or mutating entities.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntityStoreError {
    /// A query or prototype referenced more component types than fit in a
    /// [`crate::ecs::ComponentTypeMap`].
    #[error("component type map overflow: {count} types requested, max is {max}")]
    TooManyComponentTypes {
        /// Number of distinct component types requested.
        count: usize,
        /// The fixed maximum supported by the bitmap (128).
        max: usize,
    },

    /// A chunk row could not fit a prototype whose components exceed the
    /// fixed chunk byte budget.
    #[error("prototype row size {row_size} bytes exceeds chunk capacity {chunk_size} bytes")]
    RowTooLarge {
        /// Computed size of one entity's row across all its components.
        row_size: usize,
        /// Fixed byte budget of a single [`crate::ecs::PrototypeChunk`].
        chunk_size: usize,
    },
}
