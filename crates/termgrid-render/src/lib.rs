#![forbid(unsafe_code)]

//! Render kernel: colors, cell planes, blending, compositing, and frame flush.
//!
//! The central type is [`OptimizedBuffer`](buffer::OptimizedBuffer), which owns
//! one [`CellGrid`](grid::CellGrid) allocated through a
//! [`RenderEngine`](engine::RenderEngine) and offers every drawing operation on
//! it. [`FrameRenderer`](renderer::FrameRenderer) double-buffers two of them and
//! hands damage runs to the engine once per frame.

pub mod attrs;
pub mod blend;
pub mod buffer;
pub mod color;
pub mod diff;
pub mod drawing;
pub mod engine;
pub mod error;
pub mod grid;
pub mod renderer;
pub mod supersample;
pub mod text;

mod scissor;

pub use attrs::TextAttributes;
pub use buffer::{BufferOptions, OptimizedBuffer, SourceRect};
pub use color::{ColorInput, Rgba};
pub use error::{BufferError, EngineError, Result};
pub use grid::{CellGrid, CellSnapshot};
pub use renderer::{FrameRenderer, RenderStats, RendererConfig};
