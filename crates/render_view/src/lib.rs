//! The render-view layer (C5): per-view extraction, frustum/occlusion
//! culling, light packing, and command-buffer recording, coordinated
//! across a [`worker::WorkerPool`] so a frame's views build concurrently.
//!
//! Built on `render_core`'s entity store and resource pooling and
//! `render_gpu`'s command buffer; this crate owns everything between "the
//! scene changed" and "here is a recorded [`render_gpu::CommandBuffer`] for
//! this view."

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod frustum;
pub mod lights;
pub mod math;
pub mod occlusion;
pub mod renderer;
pub mod scene;
pub mod view;
pub mod worker;

pub use config::RendererConfig;
pub use renderer::Renderer;
pub use scene::SceneComponentIds;
pub use view::{ExtractionOutput, RenderKind, RenderView, Scene, ViewKind};
pub use worker::WorkerPool;
