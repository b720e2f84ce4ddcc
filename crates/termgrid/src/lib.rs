#![forbid(unsafe_code)]

//! termgrid public facade crate.
//!
//! Re-exports the compositor, engine, renderer, and (with the default `fx`
//! feature) the post-processing filters, plus a prelude for everyday use.
//!
//! ```
//! use termgrid::prelude::*;
//!
//! let engine = std::rc::Rc::new(HeapEngine::new());
//! let mut renderer = FrameRenderer::new(engine, 40, 12, RendererConfig::from_env())?;
//! let frame = renderer.next_buffer();
//! frame.draw_box(&BoxOptions::new(0, 0, 40, 12).with_title("termgrid", TitleAlignment::Center))?;
//! frame.draw_text("hello", 2, 2, Rgba::WHITE, None, TextAttributes::BOLD, None)?;
//! renderer.render(false)?;
//! # Ok::<(), termgrid::Error>(())
//! ```

// --- Core re-exports -------------------------------------------------------

pub use termgrid_core::geometry::Rect;

// --- Render re-exports -----------------------------------------------------

pub use termgrid_render::drawing::{
    BorderChars, BorderSides, BorderStyle, BoxOptions, Side, TitleAlignment,
};
pub use termgrid_render::engine::{FlushFrame, HeapEngine, RenderEngine};
pub use termgrid_render::supersample::PixelFormat;
pub use termgrid_render::text::{Selection, TextBuffer, TextChunk};
pub use termgrid_render::{
    BufferOptions, CellGrid, CellSnapshot, ColorInput, EngineError, FrameRenderer,
    OptimizedBuffer, RenderStats, RendererConfig, Rgba, SourceRect, TextAttributes,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type.
pub use termgrid_render::BufferError as Error;

/// Standard result type for termgrid APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        BorderStyle, BoxOptions, BufferOptions, Error, FrameRenderer, HeapEngine,
        OptimizedBuffer, Rect, RendererConfig, Result, Rgba, TextAttributes, TitleAlignment,
    };

    #[cfg(feature = "fx")]
    pub use termgrid_fx::{EffectChain, PostEffect};

    pub use crate::{core, render};

    #[cfg(feature = "fx")]
    pub use crate::fx;
}

pub use termgrid_core as core;
#[cfg(feature = "fx")]
pub use termgrid_fx as fx;
pub use termgrid_render as render;
