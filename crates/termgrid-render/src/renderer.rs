#![forbid(unsafe_code)]

//! Double-buffered frame renderer.
//!
//! The scene draws into [`FrameRenderer::next_buffer`]. [`FrameRenderer::render`]
//! then:
//!
//! 1. diffs the next frame against the current one
//! 2. decides between a full and a damage-only flush
//! 3. hands the frame to the engine (skipped when nothing changed)
//! 4. swaps the buffers
//! 5. clears the new next buffer to the background color
//!
//! A full flush happens on the first frame, after a resize or background
//! change, when forced, or when the changed-cell ratio exceeds
//! [`RendererConfig::full_flush_ratio`].

use core::{fmt, mem};
use std::rc::Rc;

use crate::buffer::{BufferOptions, OptimizedBuffer};
use crate::color::{ColorInput, Rgba};
use crate::diff::GridDiff;
use crate::engine::{FlushFrame, RenderEngine};
use crate::error::Result;

/// Environment variable forcing every frame to flush in full.
pub const ENV_FORCE_FULL_FLUSH: &str = "TERMGRID_FORCE_FULL_FLUSH";
/// Environment variable overriding [`RendererConfig::full_flush_ratio`].
pub const ENV_FULL_FLUSH_RATIO: &str = "TERMGRID_FULL_FLUSH_RATIO";

/// Renderer settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererConfig {
    /// Always flush the whole frame.
    pub force_full_flush: bool,
    /// Fraction of changed cells (0..=1) above which a frame flushes in full.
    pub full_flush_ratio: f32,
    /// Color the next buffer is cleared to after each frame.
    pub background: Rgba,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            force_full_flush: false,
            full_flush_ratio: 0.5,
            background: Rgba::BLACK,
        }
    }
}

impl RendererConfig {
    /// Defaults overridden by `TERMGRID_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the `TERMGRID_*`
    /// keys. Unparseable values are ignored with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(v) = lookup(ENV_FORCE_FULL_FLUSH) {
            config.force_full_flush = matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        if let Some(v) = lookup(ENV_FULL_FLUSH_RATIO) {
            match v.trim().parse::<f32>() {
                Ok(ratio) if (0.0..=1.0).contains(&ratio) => config.full_flush_ratio = ratio,
                _ => tracing::warn!(value = %v, "ignoring invalid {ENV_FULL_FLUSH_RATIO}"),
            }
        }
        config
    }

    #[must_use]
    pub fn with_force_full_flush(mut self, force: bool) -> Self {
        self.force_full_flush = force;
        self
    }

    #[must_use]
    pub fn with_full_flush_ratio(mut self, ratio: f32) -> Self {
        self.full_flush_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn with_background(mut self, background: Rgba) -> Self {
        self.background = background;
        self
    }
}

/// Outcome of one [`FrameRenderer::render`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    pub changed_cells: usize,
    pub runs: usize,
    /// The frame was flushed in full.
    pub full: bool,
    /// The engine was called at all.
    pub flushed: bool,
}

/// Two buffers and the flush policy between them.
pub struct FrameRenderer {
    engine: Rc<dyn RenderEngine>,
    current: OptimizedBuffer,
    next: OptimizedBuffer,
    config: RendererConfig,
    needs_full: bool,
    frames: u64,
}

impl fmt::Debug for FrameRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameRenderer")
            .field("engine", &self.engine.name())
            .field("current", &self.current)
            .field("next", &self.next)
            .field("config", &self.config)
            .field("needs_full", &self.needs_full)
            .field("frames", &self.frames)
            .finish()
    }
}

impl FrameRenderer {
    pub fn new(
        engine: Rc<dyn RenderEngine>,
        width: u32,
        height: u32,
        config: RendererConfig,
    ) -> Result<Self> {
        let mut current = OptimizedBuffer::create(
            engine.clone(),
            width,
            height,
            BufferOptions::default().with_id("frame-0"),
        )?;
        let mut next = OptimizedBuffer::create(
            engine.clone(),
            width,
            height,
            BufferOptions::default().with_id("frame-1"),
        )?;
        current.clear(config.background)?;
        next.clear(config.background)?;
        tracing::debug!(width, height, engine = engine.name(), "renderer created");
        Ok(Self {
            engine,
            current,
            next,
            config,
            needs_full: true,
            frames: 0,
        })
    }

    /// Buffer the scene draws the upcoming frame into.
    #[inline]
    pub fn next_buffer(&mut self) -> &mut OptimizedBuffer {
        &mut self.next
    }

    /// The last rendered frame.
    #[inline]
    pub fn current_buffer(&self) -> &OptimizedBuffer {
        &self.current
    }

    #[inline]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Frames rendered so far.
    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    #[inline]
    pub fn engine(&self) -> &Rc<dyn RenderEngine> {
        &self.engine
    }

    /// Flush the next frame and swap. `force` flushes in full.
    pub fn render(&mut self, force: bool) -> Result<RenderStats> {
        let _span = tracing::trace_span!("render", frame = self.frames, force).entered();

        let next = self.next.grid()?;
        let diff = GridDiff::compute(self.current.grid()?, next);
        let runs = diff.runs();
        let ratio = diff.len() as f32 / next.len().max(1) as f32;
        let full = force
            || self.config.force_full_flush
            || self.needs_full
            || ratio > self.config.full_flush_ratio;
        let flushed = full || !diff.is_empty();

        if flushed {
            self.engine.flush(&FlushFrame {
                grid: next,
                full,
                runs: &runs,
                background: self.config.background,
            })?;
        }

        mem::swap(&mut self.current, &mut self.next);
        self.next.clear(self.config.background)?;
        self.needs_full = false;
        self.frames += 1;

        Ok(RenderStats {
            changed_cells: diff.len(),
            runs: runs.len(),
            full,
            flushed,
        })
    }

    /// Resize both buffers. The next frame flushes in full.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if self.current.width()? == width && self.current.height()? == height {
            return Ok(());
        }
        self.current.resize(width, height)?;
        self.next.resize(width, height)?;
        self.needs_full = true;
        tracing::debug!(width, height, "renderer resized");
        Ok(())
    }

    /// Change the clear color. The next frame flushes in full.
    ///
    /// Accepts an [`Rgba`] or a hex string; a malformed string fails with
    /// [`BufferError::InvalidColor`](crate::BufferError::InvalidColor).
    pub fn set_background_color(&mut self, background: impl Into<ColorInput>) -> Result<()> {
        let background = background.into().resolve()?;
        self.next.clear(background)?;
        self.config.background = background;
        self.needs_full = true;
        Ok(())
    }

    /// Release both buffers. Idempotent.
    pub fn destroy(&mut self) {
        self.current.destroy();
        self.next.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::TextAttributes;
    use crate::engine::HeapEngine;
    use crate::error::BufferError;

    fn renderer(w: u32, h: u32) -> (Rc<HeapEngine>, FrameRenderer) {
        let engine = Rc::new(HeapEngine::new());
        let r = FrameRenderer::new(engine.clone(), w, h, RendererConfig::default()).unwrap();
        (engine, r)
    }

    #[test]
    fn first_frame_is_full() {
        let (engine, mut r) = renderer(4, 2);
        let stats = r.render(false).unwrap();
        assert!(stats.full);
        assert!(stats.flushed);
        assert_eq!(stats.changed_cells, 0);
        let last = engine.last_flush().unwrap();
        assert!(last.full);
        assert_eq!(last.cells_written, 8);
    }

    #[test]
    fn unchanged_frame_skips_flush() {
        let (engine, mut r) = renderer(4, 2);
        r.render(false).unwrap();
        let stats = r.render(false).unwrap();
        assert_eq!(stats, RenderStats::default());
        assert_eq!(engine.stats().flushes, 1);
        assert_eq!(r.frame_count(), 2);
    }

    #[test]
    fn small_change_flushes_damage_runs() {
        let (engine, mut r) = renderer(10, 4);
        r.render(false).unwrap();
        r.next_buffer()
            .draw_text("hi", 3, 2, Rgba::WHITE, Some(Rgba::BLACK), TextAttributes::empty(), None)
            .unwrap();
        let stats = r.render(false).unwrap();
        assert!(!stats.full);
        assert_eq!(stats.changed_cells, 2);
        assert_eq!(stats.runs, 1);
        let last = engine.last_flush().unwrap();
        assert_eq!(last.cells_written, 2);
        assert_eq!(last.runs[0].y, 2);
        assert_eq!(r.current_buffer().get(3, 2).unwrap().unwrap().ch, 'h');
        assert_eq!(r.next_buffer().get(3, 2).unwrap().unwrap().ch, ' ');
    }

    #[test]
    fn large_change_promotes_to_full() {
        let (_, mut r) = renderer(4, 4);
        r.render(false).unwrap();
        r.next_buffer().fill_rect(0, 0, 4, 3, Rgba::RED).unwrap();
        assert!(r.render(false).unwrap().full);
    }

    #[test]
    fn force_and_config_force_full() {
        let (_, mut r) = renderer(4, 4);
        r.render(false).unwrap();
        assert!(r.render(true).unwrap().full);

        let engine = Rc::new(HeapEngine::new());
        let config = RendererConfig::default().with_force_full_flush(true);
        let mut r = FrameRenderer::new(engine, 2, 2, config).unwrap();
        r.render(false).unwrap();
        let stats = r.render(false).unwrap();
        assert!(stats.full && stats.flushed);
    }

    #[test]
    fn resize_forces_full_frame() {
        let (engine, mut r) = renderer(4, 4);
        r.render(false).unwrap();
        r.resize(6, 3).unwrap();
        assert_eq!(r.next_buffer().width().unwrap(), 6);
        assert_eq!(r.current_buffer().height().unwrap(), 3);
        assert!(r.render(false).unwrap().full);
        assert_eq!(engine.last_flush().unwrap().width, 6);
    }

    #[test]
    fn background_color_applies_to_next_frames() {
        let (engine, mut r) = renderer(2, 1);
        r.set_background_color(Rgba::BLUE).unwrap();
        r.render(false).unwrap();
        assert_eq!(engine.last_flush().unwrap().background, Rgba::BLUE);
        assert_eq!(r.next_buffer().get(0, 0).unwrap().unwrap().bg, Rgba::BLUE);
    }

    #[test]
    fn background_color_from_hex() {
        let (_, mut r) = renderer(2, 1);
        r.set_background_color("#ff0000").unwrap();
        assert_eq!(r.config().background, Rgba::RED);
        assert!(matches!(
            r.set_background_color("#nothex"),
            Err(BufferError::InvalidColor(_))
        ));
        assert_eq!(r.config().background, Rgba::RED);
    }

    #[test]
    fn destroy_releases_both_buffers() {
        let (engine, mut r) = renderer(2, 2);
        assert_eq!(engine.stats().live_grids, 2);
        r.destroy();
        assert_eq!(engine.stats().live_grids, 0);
        assert!(matches!(r.render(false), Err(BufferError::Destroyed { .. })));
    }

    #[test]
    fn config_from_lookup() {
        let config = RendererConfig::from_lookup(|key| match key {
            ENV_FORCE_FULL_FLUSH => Some("TRUE".into()),
            ENV_FULL_FLUSH_RATIO => Some("0.25".into()),
            _ => None,
        });
        assert!(config.force_full_flush);
        assert_eq!(config.full_flush_ratio, 0.25);

        let config = RendererConfig::from_lookup(|key| match key {
            ENV_FORCE_FULL_FLUSH => Some("0".into()),
            ENV_FULL_FLUSH_RATIO => Some("7".into()),
            _ => None,
        });
        assert!(!config.force_full_flush);
        assert_eq!(config.full_flush_ratio, RendererConfig::default().full_flush_ratio);
    }

    #[test]
    #[tracing_test::traced_test]
    fn invalid_ratio_is_logged() {
        let _ = RendererConfig::from_lookup(|key| {
            (key == ENV_FULL_FLUSH_RATIO).then(|| "lots".to_string())
        });
        assert!(logs_contain("ignoring invalid"));
    }
}
