#![forbid(unsafe_code)]

//! Post-processing filters for cell grids.
//!
//! Every filter rewrites a [`CellGrid`] in place, once per frame, after the
//! scene is composed and before the frame is flushed. Filters never allocate a
//! new grid; the ones that need to read unmodified neighbours keep a scratch
//! copy that is reused across frames.
//!
//! Pure filters ignore the frame delta. [`Distortion`] is the exception: it
//! keeps burst state between calls and advances it by `dt` seconds.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use termgrid_fx::{Brightness, EffectChain, PostEffect, Vignette};
//! use termgrid_render::engine::HeapEngine;
//! use termgrid_render::{BufferOptions, OptimizedBuffer, Rgba};
//!
//! let engine = Rc::new(HeapEngine::new());
//! let mut buf = OptimizedBuffer::create(engine, 40, 10, BufferOptions::default())?;
//! buf.clear(Rgba::GRAY)?;
//!
//! let mut chain = EffectChain::new()
//!     .with(Brightness::new(1.2))
//!     .with(Vignette::new(0.5));
//! termgrid_fx::apply_to(&mut buf, &mut chain, 1.0 / 60.0)?;
//! # Ok::<(), termgrid_render::BufferError>(())
//! ```

use core::fmt;

use termgrid_render::{CellGrid, OptimizedBuffer};

pub mod ascii;
pub mod bloom;
pub mod blur;
pub mod chromatic;
pub mod color;
pub mod glitch;
pub mod noise;
pub mod vignette;

pub use ascii::AsciiArt;
pub use bloom::Bloom;
pub use blur::BoxBlur;
pub use chromatic::ChromaticAberration;
pub use color::{Brightness, Grayscale, Invert, Scanlines, Sepia};
pub use glitch::{Distortion, GlitchConfig, GlitchKind, GlitchLine, GlitchPalette};
pub use noise::Noise;
pub use vignette::Vignette;

/// An in-place frame filter.
///
/// Implementations must tolerate empty grids without panicking.
pub trait PostEffect {
    /// Short name for diagnostics.
    fn name(&self) -> &'static str;

    /// Rewrite `grid`. `dt` is the time since the previous frame in seconds.
    fn apply(&mut self, grid: &mut CellGrid, dt: f32);
}

impl<E: PostEffect + ?Sized> PostEffect for Box<E> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn apply(&mut self, grid: &mut CellGrid, dt: f32) {
        (**self).apply(grid, dt);
    }
}

/// Run `effect` over a buffer's grid.
///
/// Fails only when the buffer has been destroyed.
pub fn apply_to(
    buffer: &mut OptimizedBuffer,
    effect: &mut dyn PostEffect,
    dt: f32,
) -> termgrid_render::Result<()> {
    effect.apply(buffer.grid_mut()?, dt);
    Ok(())
}

// ---------------------------------------------------------------------------
// EffectChain
// ---------------------------------------------------------------------------

/// Ordered list of effects, applied first to last.
#[derive(Default)]
pub struct EffectChain {
    effects: Vec<Box<dyn PostEffect>>,
}

impl EffectChain {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an effect.
    pub fn push(&mut self, effect: impl PostEffect + 'static) {
        self.effects.push(Box::new(effect));
    }

    /// Builder form of [`push`](Self::push).
    #[must_use]
    pub fn with(mut self, effect: impl PostEffect + 'static) -> Self {
        self.push(effect);
        self
    }

    /// Remove and return the last effect.
    pub fn pop(&mut self) -> Option<Box<dyn PostEffect>> {
        self.effects.pop()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.effects.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Effect names in application order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.effects.iter().map(|e| e.name())
    }
}

impl fmt::Debug for EffectChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl PostEffect for EffectChain {
    fn name(&self) -> &'static str {
        "chain"
    }

    fn apply(&mut self, grid: &mut CellGrid, dt: f32) {
        for effect in &mut self.effects {
            let _span = termgrid_core::trace_span!("post_effect", name = effect.name()).entered();
            effect.apply(grid, dt);
        }
    }
}
