//! The command-buffer layer (C4): a compact, linear, typed instruction
//! stream that encodes draws, uniform updates, buffer uploads, render-pass
//! transitions, and fence sync/wait, recorded off-thread and executed on
//! the GL thread.
//!
//! This crate never talks to a real graphics backend — `execute()` is
//! parameterized over the [`GlSink`] trait, so a caller supplies whatever
//! backend (or a [`RecordingSink`] for tests) receives the decoded stream.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

mod command;
mod error;
mod sink;

pub use command::{CommandBuffer, Primitive, UniformKind};
pub use error::CommandBufferError;
pub use sink::{GlSink, RecordingSink};
