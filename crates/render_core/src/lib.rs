//! Entity storage, GPU resource pooling, per-frame scratch memory, and
//! fence-guarded resource reuse for the render core.
//!
//! This crate is the foundation `render_gpu` and `render_view` build on: it
//! has no notion of a command buffer or a frame graph, only the data
//! structures those layers need — the archetype [`ecs::EntityStore`], the
//! generational [`memory::ResourcePool`], the bump-pointer
//! [`memory::MemoryPool`], and the [`sync::Fence`]/[`sync::Lockable`] pair
//! that lets higher layers decide when a pooled resource is safe to reuse.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod ecs;
pub mod error;
pub mod memory;
pub mod sync;
