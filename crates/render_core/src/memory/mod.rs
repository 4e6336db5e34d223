//! GPU resource pooling and per-frame scratch memory.
//!
//! Two distinct allocators with different lifetimes: [`ResourcePool`] holds
//! long-lived, generation-checked GPU resource handles (C1), while
//! [`MemoryPool`] is a bump arena reset once per frame for CPU-side scratch
//! data destined for the command buffer (C2).

// Bump-pointer dereferencing needs raw pointer casts into an owned buffer.
#![allow(unsafe_code)]

mod arena;
mod pool;

pub use arena::{MemoryHandle, MemoryPool, ALLOC_ALIGN};
pub use pool::{ResourceHandle, ResourcePool};
