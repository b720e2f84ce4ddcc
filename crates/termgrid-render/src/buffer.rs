#![forbid(unsafe_code)]

//! The compositor: one cell grid plus every drawing operation on it.
//!
//! # Lifecycle
//!
//! An [`OptimizedBuffer`] allocates its [`CellGrid`] through a shared
//! [`RenderEngine`] and hands it back on [`destroy`](OptimizedBuffer::destroy)
//! (or drop). After destroy the grid is gone; every public method then returns
//! [`BufferError::Destroyed`] naming the buffer, and logs at `error`.
//!
//! # Clipping
//!
//! Draw operations clip to the buffer bounds intersected with the top of the
//! scissor stack. Out-of-bounds coordinates and empty regions are silent
//! no-ops. [`clear`](OptimizedBuffer::clear) ignores the scissor stack.
//!
//! # Invariants
//!
//! 1. While alive, `grid` planes have length `width * height`
//! 2. Each scissor entry is contained in the one below it
//! 3. No drawing call writes outside the effective clip

use core::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use termgrid_core::geometry::Rect;

use crate::attrs::TextAttributes;
use crate::blend::blend_colors;
use crate::color::Rgba;
use crate::engine::RenderEngine;
use crate::error::{BufferError, Result};
use crate::grid::{CellGrid, CellSnapshot, DEFAULT_FG};
use crate::scissor::ScissorStack;

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Creation options for [`OptimizedBuffer::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferOptions {
    /// Blits *from* this buffer composite by alpha instead of overwriting.
    pub respect_alpha: bool,
    /// Diagnostic id; a sequential `buffer-N` is generated when `None`.
    pub id: Option<String>,
}

impl BufferOptions {
    #[must_use]
    pub fn with_respect_alpha(mut self, respect_alpha: bool) -> Self {
        self.respect_alpha = respect_alpha;
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Region of a source buffer to blit. Clipped to the source bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SourceRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A cell grid with compositing operations.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use termgrid_render::engine::HeapEngine;
/// use termgrid_render::{BufferOptions, OptimizedBuffer, Rgba, TextAttributes};
///
/// let engine = Rc::new(HeapEngine::new());
/// let mut buf = OptimizedBuffer::create(engine, 10, 4, BufferOptions::default())?;
/// buf.clear(Rgba::BLACK)?;
/// buf.set_cell(1, 1, 'x', Rgba::RED, Rgba::BLACK, TextAttributes::BOLD)?;
/// assert_eq!(buf.get(1, 1)?.map(|c| c.ch), Some('x'));
/// # Ok::<(), termgrid_render::BufferError>(())
/// ```
pub struct OptimizedBuffer {
    id: String,
    grid: Option<CellGrid>,
    engine: Rc<dyn RenderEngine>,
    scissor: ScissorStack,
}

/// Log and build the use-after-destroy error.
fn destroyed(id: &str) -> BufferError {
    tracing::error!(buffer = id, "operation on destroyed buffer");
    BufferError::Destroyed { id: id.to_owned() }
}

fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(BufferError::InvalidDimensions { width, height });
    }
    Ok(())
}

impl OptimizedBuffer {
    /// Allocate a `width x height` buffer through `engine`.
    ///
    /// Fails with [`BufferError::InvalidDimensions`] on a zero dimension and
    /// with [`BufferError::Engine`] if the engine refuses the allocation.
    pub fn create(
        engine: Rc<dyn RenderEngine>,
        width: u32,
        height: u32,
        options: BufferOptions,
    ) -> Result<Self> {
        check_dimensions(width, height)?;
        let id = options.id.unwrap_or_else(|| {
            format!("buffer-{}", NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed))
        });
        let grid = engine.allocate(width, height, options.respect_alpha)?;
        tracing::debug!(
            buffer = %id,
            width,
            height,
            respect_alpha = options.respect_alpha,
            engine = engine.name(),
            "buffer created"
        );
        Ok(Self {
            id,
            grid: Some(grid),
            engine,
            scissor: ScissorStack::default(),
        })
    }

    /// Diagnostic id. Available after destroy.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.grid.is_none()
    }

    /// The engine this buffer allocates through.
    #[inline]
    pub fn engine(&self) -> &Rc<dyn RenderEngine> {
        &self.engine
    }

    /// Direct read access to the planes.
    #[inline]
    pub fn grid(&self) -> Result<&CellGrid> {
        self.grid.as_ref().ok_or_else(|| destroyed(&self.id))
    }

    /// Direct write access to the planes. Bypasses the scissor stack.
    #[inline]
    pub fn grid_mut(&mut self) -> Result<&mut CellGrid> {
        self.grid.as_mut().ok_or_else(|| destroyed(&self.id))
    }

    pub fn width(&self) -> Result<u32> {
        self.grid().map(CellGrid::width)
    }

    pub fn height(&self) -> Result<u32> {
        self.grid().map(CellGrid::height)
    }

    pub fn respect_alpha(&self) -> Result<bool> {
        self.grid().map(CellGrid::respect_alpha)
    }

    pub fn set_respect_alpha(&mut self, respect_alpha: bool) -> Result<()> {
        self.grid_mut()?.set_respect_alpha(respect_alpha);
        Ok(())
    }

    /// Grid plus effective clip, borrowed together for drawing.
    pub(crate) fn canvas(&mut self) -> Result<Canvas<'_>> {
        let Self {
            id, grid, scissor, ..
        } = self;
        let grid = grid.as_mut().ok_or_else(|| destroyed(id))?;
        let clip = scissor.clip(Rect::from_size(grid.width(), grid.height()));
        Ok(Canvas { grid, clip })
    }

    // ========== Whole-grid operations ==========

    /// Reset every cell to a space with white fg, no attributes, and `bg`.
    pub fn clear(&mut self, bg: Rgba) -> Result<()> {
        self.clear_with(bg, ' ')
    }

    /// Like [`clear`](Self::clear) with a custom fill character.
    pub fn clear_with(&mut self, bg: Rgba, ch: char) -> Result<()> {
        self.grid_mut()?
            .fill(ch as u32, DEFAULT_FG, bg, TextAttributes::empty());
        Ok(())
    }

    /// Reallocate to `width x height` through the engine.
    ///
    /// The overlapping region is kept; new cells get the defaults. Any plane
    /// slices obtained earlier must be re-fetched.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        check_dimensions(width, height)?;
        let Self {
            id, grid, engine, ..
        } = self;
        let grid = grid.as_mut().ok_or_else(|| destroyed(id))?;
        if grid.width() == width && grid.height() == height {
            return Ok(());
        }
        let (old_w, old_h) = (grid.width(), grid.height());
        engine.resize(grid, width, height)?;
        tracing::debug!(buffer = %id, old_w, old_h, width, height, "buffer resized");
        Ok(())
    }

    /// Release the grid back to the engine. Idempotent.
    pub fn destroy(&mut self) {
        if let Some(grid) = self.grid.take() {
            self.scissor.clear();
            self.engine.release(grid);
            tracing::debug!(buffer = %self.id, "buffer destroyed");
        }
    }

    // ========== Cell access ==========

    /// Overwrite one cell. No-op outside the clip.
    pub fn set_cell(
        &mut self,
        x: i32,
        y: i32,
        ch: char,
        fg: Rgba,
        bg: Rgba,
        attributes: TextAttributes,
    ) -> Result<()> {
        self.canvas()?.put(x, y, ch as u32, fg, bg, attributes);
        Ok(())
    }

    /// Copy out one cell; `None` when out of bounds.
    pub fn get(&self, x: i32, y: i32) -> Result<Option<CellSnapshot>> {
        Ok(self.grid()?.cell(x, y))
    }

    /// Composite one cell over the existing content.
    ///
    /// With opaque `fg` and `bg` this is [`set_cell`](Self::set_cell).
    /// Otherwise `bg` is blended over the destination background and the
    /// written background keeps `bg`'s own alpha. A space drawn over a
    /// non-space keeps the existing glyph and attributes, tinting its
    /// foreground with `bg`.
    pub fn set_cell_with_alpha_blending(
        &mut self,
        x: i32,
        y: i32,
        ch: char,
        fg: Rgba,
        bg: Rgba,
        attributes: TextAttributes,
    ) -> Result<()> {
        self.canvas()?
            .put_blended(x, y, ch as u32, fg, bg, attributes);
        Ok(())
    }

    /// Fill a rectangle with spaces on `bg`.
    ///
    /// Translucent `bg` composites through the blending path; opaque `bg`
    /// overwrites directly.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, bg: Rgba) -> Result<()> {
        self.canvas()?.fill(Rect::new(x, y, width, height), bg);
        Ok(())
    }

    // ========== Blitting ==========

    /// Copy a region of `src` into this buffer at `(dest_x, dest_y)`.
    ///
    /// `source` defaults to all of `src` and is clipped to its bounds. When
    /// `src` respects alpha, fully transparent source cells are skipped and
    /// the rest are alpha-blended; otherwise rows are copied plane by plane.
    pub fn draw_frame_buffer(
        &mut self,
        dest_x: i32,
        dest_y: i32,
        src: &OptimizedBuffer,
        source: Option<SourceRect>,
    ) -> Result<()> {
        let src_grid = src.grid()?;
        let mut canvas = self.canvas()?;

        let (sw, sh) = (src_grid.width(), src_grid.height());
        let region = source.unwrap_or(SourceRect::new(0, 0, sw, sh));
        let sx0 = region.x.min(sw);
        let sy0 = region.y.min(sh);
        let copy_w = region.width.min(sw - sx0);
        let copy_h = region.height.min(sh - sy0);
        if copy_w == 0 || copy_h == 0 {
            return Ok(());
        }

        let visible = Rect::new(dest_x, dest_y, copy_w, copy_h).intersection(&canvas.clip);
        if visible.is_empty() {
            return Ok(());
        }

        let _span = tracing::trace_span!(
            "draw_frame_buffer",
            src = src.id(),
            width = visible.width,
            height = visible.height,
            respect_alpha = src_grid.respect_alpha()
        )
        .entered();

        // Offsets of the visible region inside the source region.
        let off_x = visible.x.abs_diff(dest_x);
        let off_y = visible.y.abs_diff(dest_y);

        for row in 0..visible.height {
            let sy = sy0 + off_y + row;
            let dy = visible.y + row as i32;
            let src_start = sy as usize * sw as usize + (sx0 + off_x) as usize;

            if !src_grid.respect_alpha() {
                if let Some(dst_start) = canvas.grid.index(visible.x, dy) {
                    canvas
                        .grid
                        .copy_span(dst_start, src_grid, src_start, visible.width as usize);
                }
                continue;
            }

            for col in 0..visible.width {
                let si = src_start + col as usize;
                let fg = src_grid.fg()[si];
                let bg = src_grid.bg()[si];
                if bg.a == 0.0 && fg.a == 0.0 {
                    continue;
                }
                canvas.put_blended(
                    visible.x + col as i32,
                    dy,
                    src_grid.chars()[si],
                    fg,
                    bg,
                    src_grid.attributes()[si],
                );
            }
        }
        Ok(())
    }

    // ========== Scissor stack ==========

    /// Push a clip rect, intersected with the current one.
    pub fn push_scissor_rect(&mut self, rect: Rect) -> Result<()> {
        let bounds = {
            let grid = self.grid()?;
            Rect::from_size(grid.width(), grid.height())
        };
        self.scissor.push(rect, bounds);
        Ok(())
    }

    /// Pop the top clip rect. No-op on an empty stack.
    pub fn pop_scissor_rect(&mut self) -> Result<()> {
        self.grid()?;
        self.scissor.pop();
        Ok(())
    }

    /// Remove all clip rects.
    pub fn clear_scissor_rects(&mut self) -> Result<()> {
        self.grid()?;
        self.scissor.clear();
        Ok(())
    }

    /// Current top of the scissor stack; `None` when unconstrained.
    pub fn scissor_rect(&self) -> Result<Option<Rect>> {
        self.grid()?;
        Ok(self.scissor.top())
    }

    pub fn scissor_depth(&self) -> Result<usize> {
        self.grid()?;
        Ok(self.scissor.depth())
    }
}

impl Drop for OptimizedBuffer {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for OptimizedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("OptimizedBuffer");
        s.field("id", &self.id).field("engine", &self.engine.name());
        match &self.grid {
            Some(grid) => s
                .field("width", &grid.width())
                .field("height", &grid.height())
                .field("respect_alpha", &grid.respect_alpha()),
            None => s.field("destroyed", &true),
        };
        s.field("scissor_depth", &self.scissor.depth()).finish()
    }
}

/// Mutable grid plus the effective clip rect.
///
/// Drawing helpers in sibling modules go through this so clipping and the
/// blending rules live in one place.
pub(crate) struct Canvas<'a> {
    pub(crate) grid: &'a mut CellGrid,
    pub(crate) clip: Rect,
}

impl Canvas<'_> {
    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if !self.clip.contains(x, y) {
            return None;
        }
        self.grid.index(x, y)
    }

    /// Overwrite one cell if it lies inside the clip.
    #[inline]
    pub(crate) fn put(
        &mut self,
        x: i32,
        y: i32,
        ch: u32,
        fg: Rgba,
        bg: Rgba,
        attributes: TextAttributes,
    ) {
        if let Some(i) = self.index(x, y) {
            self.grid.write(i, ch, fg, bg, attributes);
        }
    }

    /// Alpha-composite one cell if it lies inside the clip.
    pub(crate) fn put_blended(
        &mut self,
        x: i32,
        y: i32,
        ch: u32,
        fg: Rgba,
        bg: Rgba,
        attributes: TextAttributes,
    ) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        if !fg.has_alpha() && !bg.has_alpha() {
            self.grid.write(i, ch, fg, bg, attributes);
            return;
        }

        let dest = self.grid.planes();
        let dest_ch = dest.chars[i];
        let dest_fg = dest.fg[i];
        let dest_bg = dest.bg[i];
        let dest_attrs = dest.attributes[i];

        let blended_bg = blend_colors(bg, dest_bg);
        let preserve = ch == ' ' as u32 && dest_ch != ' ' as u32 && dest_ch != 0;

        let (out_ch, out_fg, out_attrs) = if preserve {
            (dest_ch, blend_colors(bg, dest_fg), dest_attrs)
        } else {
            let out_fg = if fg.has_alpha() {
                blend_colors(fg, dest_bg)
            } else {
                fg
            };
            (ch, out_fg, attributes)
        };

        self.grid
            .write(i, out_ch, out_fg, blended_bg.with_alpha(bg.a), out_attrs);
    }

    /// Fill `rect` (clipped) with spaces on `bg`.
    pub(crate) fn fill(&mut self, rect: Rect, bg: Rgba) {
        let area = rect.intersection(&self.clip);
        if area.is_empty() {
            return;
        }
        let space = ' ' as u32;
        if bg.has_alpha() {
            for y in area.top()..area.bottom() {
                for x in area.left()..area.right() {
                    self.put_blended(x, y, space, DEFAULT_FG, bg, TextAttributes::empty());
                }
            }
            return;
        }
        let width = self.grid.width() as usize;
        let planes = self.grid.planes_mut();
        for y in area.top()..area.bottom() {
            let start = y as usize * width + area.x as usize;
            let end = start + area.width as usize;
            planes.chars[start..end].fill(space);
            planes.fg[start..end].fill(DEFAULT_FG);
            planes.bg[start..end].fill(bg);
            planes.attributes[start..end].fill(TextAttributes::empty());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blend::blend_colors;
    use crate::engine::HeapEngine;
    use crate::error::EngineError;

    fn engine() -> Rc<HeapEngine> {
        Rc::new(HeapEngine::new())
    }

    fn buffer(w: u32, h: u32) -> OptimizedBuffer {
        OptimizedBuffer::create(engine(), w, h, BufferOptions::default()).unwrap()
    }

    fn alpha_buffer(w: u32, h: u32) -> OptimizedBuffer {
        OptimizedBuffer::create(
            engine(),
            w,
            h,
            BufferOptions::default().with_respect_alpha(true),
        )
        .unwrap()
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn create_rejects_zero_dimensions() {
        let err = OptimizedBuffer::create(engine(), 0, 5, BufferOptions::default()).unwrap_err();
        assert_eq!(
            err,
            BufferError::InvalidDimensions {
                width: 0,
                height: 5
            }
        );
    }

    #[test]
    fn create_surfaces_engine_failure() {
        let engine = Rc::new(HeapEngine::with_max_cells(10));
        let err = OptimizedBuffer::create(engine, 4, 4, BufferOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            BufferError::Engine(EngineError::AllocationTooLarge { .. })
        ));
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = buffer(1, 1);
        let b = buffer(1, 1);
        assert_ne!(a.id(), b.id());
        assert!(a.id().starts_with("buffer-"));
        let c = OptimizedBuffer::create(engine(), 1, 1, BufferOptions::default().with_id("main"))
            .unwrap();
        assert_eq!(c.id(), "main");
    }

    #[test]
    fn clear_resets_all_fields() {
        let mut buf = buffer(4, 3);
        buf.set_cell(1, 1, 'x', Rgba::RED, Rgba::BLUE, TextAttributes::BOLD)
            .unwrap();
        buf.clear(Rgba::BLACK).unwrap();
        let grid = buf.grid().unwrap();
        for i in 0..grid.len() {
            let c = grid.cell_at(i);
            assert_eq!(c.ch, ' ');
            assert_eq!(c.fg, Rgba::WHITE);
            assert_eq!(c.bg, Rgba::BLACK);
            assert!(c.attributes.is_empty());
        }
    }

    #[test]
    fn clear_with_custom_char_ignores_scissor() {
        let mut buf = buffer(4, 4);
        buf.push_scissor_rect(Rect::new(0, 0, 1, 1)).unwrap();
        buf.clear_with(Rgba::BLUE, '.').unwrap();
        assert_eq!(buf.get(3, 3).unwrap().unwrap().ch, '.');
    }

    #[test]
    fn set_and_get_cell() {
        let mut buf = buffer(5, 5);
        buf.set_cell(2, 3, 'Q', Rgba::RED, Rgba::GREEN, TextAttributes::ITALIC)
            .unwrap();
        let c = buf.get(2, 3).unwrap().unwrap();
        assert_eq!(c.ch, 'Q');
        assert_eq!(c.fg, Rgba::RED);
        assert_eq!(c.bg, Rgba::GREEN);
        assert_eq!(c.attributes, TextAttributes::ITALIC);
    }

    #[test]
    fn out_of_bounds_is_silent() {
        let mut buf = buffer(3, 3);
        let before = buf.grid().unwrap().clone();
        for (x, y) in [(-1, 0), (0, -1), (3, 0), (0, 3), (i32::MIN, i32::MAX)] {
            buf.set_cell(x, y, 'x', Rgba::RED, Rgba::RED, TextAttributes::empty())
                .unwrap();
            buf.set_cell_with_alpha_blending(
                x,
                y,
                'x',
                Rgba::RED,
                Rgba::RED.with_alpha(0.5),
                TextAttributes::empty(),
            )
            .unwrap();
            assert_eq!(buf.get(x, y).unwrap(), None);
        }
        assert_eq!(buf.grid().unwrap(), &before);
    }

    #[test]
    fn opaque_blend_matches_set_cell() {
        let mut a = buffer(2, 1);
        let mut b = buffer(2, 1);
        a.set_cell(0, 0, 'z', Rgba::RED, Rgba::BLUE, TextAttributes::DIM)
            .unwrap();
        b.set_cell_with_alpha_blending(0, 0, 'z', Rgba::RED, Rgba::BLUE, TextAttributes::DIM)
            .unwrap();
        assert_eq!(a.grid().unwrap(), b.grid().unwrap());
    }

    #[test]
    fn translucent_bg_keeps_incoming_alpha() {
        let mut buf = buffer(10, 10);
        buf.clear(Rgba::BLACK).unwrap();
        let bg = Rgba::new(0.0, 0.0, 1.0, 0.5);
        buf.set_cell_with_alpha_blending(5, 5, 'X', Rgba::RED, bg, TextAttributes::empty())
            .unwrap();
        let c = buf.get(5, 5).unwrap().unwrap();
        let expected = blend_colors(bg, Rgba::BLACK);
        assert_eq!(c.ch, 'X');
        assert_eq!(c.fg, Rgba::RED);
        assert!(approx(c.bg.r, expected.r));
        assert!(approx(c.bg.g, expected.g));
        assert!(approx(c.bg.b, expected.b));
        assert_eq!(c.bg.a, 0.5);
    }

    #[test]
    fn translucent_fg_blends_over_destination_bg() {
        let mut buf = buffer(1, 1);
        buf.clear(Rgba::BLACK).unwrap();
        let fg = Rgba::new(1.0, 1.0, 1.0, 0.5);
        buf.set_cell_with_alpha_blending(0, 0, 'a', fg, Rgba::BLACK, TextAttributes::empty())
            .unwrap();
        let c = buf.get(0, 0).unwrap().unwrap();
        assert_eq!(c.fg, blend_colors(fg, Rgba::BLACK));
    }

    #[test]
    fn space_overlay_preserves_glyph() {
        let mut buf = buffer(3, 1);
        buf.clear(Rgba::BLACK).unwrap();
        buf.set_cell(1, 0, 'A', Rgba::GREEN, Rgba::new(0.2, 0.2, 0.2, 0.6), TextAttributes::BOLD)
            .unwrap();
        let overlay = Rgba::new(1.0, 0.0, 0.0, 0.4);
        buf.set_cell_with_alpha_blending(1, 0, ' ', Rgba::WHITE, overlay, TextAttributes::empty())
            .unwrap();
        let c = buf.get(1, 0).unwrap().unwrap();
        assert_eq!(c.ch, 'A');
        assert_eq!(c.attributes, TextAttributes::BOLD);
        assert_eq!(c.fg, blend_colors(overlay, Rgba::GREEN));
        assert_eq!(c.bg.a, 0.4);
    }

    #[test]
    fn space_overlay_on_space_writes_space() {
        let mut buf = buffer(1, 1);
        buf.clear(Rgba::BLACK).unwrap();
        let overlay = Rgba::new(1.0, 0.0, 0.0, 0.4);
        buf.set_cell_with_alpha_blending(0, 0, ' ', Rgba::WHITE, overlay, TextAttributes::UNDERLINE)
            .unwrap();
        let c = buf.get(0, 0).unwrap().unwrap();
        assert_eq!(c.ch, ' ');
        assert_eq!(c.attributes, TextAttributes::UNDERLINE);
    }

    #[test]
    fn fill_rect_opaque_overwrites_and_clips() {
        let mut buf = buffer(5, 5);
        buf.set_cell(1, 1, 'x', Rgba::RED, Rgba::RED, TextAttributes::BOLD)
            .unwrap();
        buf.fill_rect(-2, -2, 4, 4, Rgba::BLUE).unwrap();
        let c = buf.get(1, 1).unwrap().unwrap();
        assert_eq!(c.ch, ' ');
        assert_eq!(c.fg, Rgba::WHITE);
        assert_eq!(c.bg, Rgba::BLUE);
        assert!(c.attributes.is_empty());
        assert_eq!(buf.get(2, 2).unwrap().unwrap().bg, Rgba::TRANSPARENT);
    }

    #[test]
    fn fill_rect_translucent_blends() {
        let mut buf = buffer(2, 1);
        buf.clear(Rgba::BLACK).unwrap();
        buf.set_cell(0, 0, 'k', Rgba::WHITE, Rgba::BLACK, TextAttributes::empty())
            .unwrap();
        let tint = Rgba::new(1.0, 0.0, 0.0, 0.5);
        buf.fill_rect(0, 0, 2, 1, tint).unwrap();
        let c0 = buf.get(0, 0).unwrap().unwrap();
        assert_eq!(c0.ch, 'k');
        let c1 = buf.get(1, 0).unwrap().unwrap();
        assert!(approx(c1.bg.r, blend_colors(tint, Rgba::BLACK).r));
        assert_eq!(c1.bg.a, 0.5);
    }

    #[test]
    fn fill_rect_opaque_paths_agree() {
        let mut a = buffer(4, 4);
        let mut b = buffer(4, 4);
        a.fill_rect(1, 1, 2, 2, Rgba::GREEN).unwrap();
        for y in 1..3 {
            for x in 1..3 {
                b.set_cell_with_alpha_blending(x, y, ' ', Rgba::WHITE, Rgba::GREEN, TextAttributes::empty())
                    .unwrap();
            }
        }
        assert_eq!(a.grid().unwrap(), b.grid().unwrap());
    }

    #[test]
    fn zero_area_fill_is_noop() {
        let mut buf = buffer(3, 3);
        let before = buf.grid().unwrap().clone();
        buf.fill_rect(0, 0, 0, 3, Rgba::RED).unwrap();
        buf.fill_rect(5, 5, 2, 2, Rgba::RED).unwrap();
        assert_eq!(buf.grid().unwrap(), &before);
    }

    #[test]
    fn scissor_clips_drawing() {
        let mut buf = buffer(10, 10);
        buf.push_scissor_rect(Rect::new(2, 2, 3, 3)).unwrap();
        buf.fill_rect(0, 0, 10, 10, Rgba::RED).unwrap();
        assert_eq!(buf.get(2, 2).unwrap().unwrap().bg, Rgba::RED);
        assert_eq!(buf.get(4, 4).unwrap().unwrap().bg, Rgba::RED);
        assert_eq!(buf.get(5, 5).unwrap().unwrap().bg, Rgba::TRANSPARENT);
        assert_eq!(buf.get(1, 2).unwrap().unwrap().bg, Rgba::TRANSPARENT);
        buf.set_cell(0, 0, 'x', Rgba::RED, Rgba::RED, TextAttributes::empty())
            .unwrap();
        assert_eq!(buf.get(0, 0).unwrap().unwrap().ch, ' ');
    }

    #[test]
    fn scissor_push_pop_algebra() {
        let mut buf = buffer(20, 20);
        assert_eq!(buf.scissor_rect().unwrap(), None);
        let a = Rect::new(2, 2, 10, 10);
        buf.push_scissor_rect(a).unwrap();
        buf.push_scissor_rect(Rect::new(6, 0, 10, 5)).unwrap();
        assert_eq!(buf.scissor_rect().unwrap(), Some(Rect::new(6, 2, 6, 3)));
        buf.pop_scissor_rect().unwrap();
        assert_eq!(buf.scissor_rect().unwrap(), Some(a));
        buf.pop_scissor_rect().unwrap();
        buf.pop_scissor_rect().unwrap();
        assert_eq!(buf.scissor_rect().unwrap(), None);
        buf.push_scissor_rect(a).unwrap();
        buf.clear_scissor_rects().unwrap();
        assert_eq!(buf.scissor_depth().unwrap(), 0);
    }

    #[test]
    fn blit_opaque_copies_region() {
        let mut src = buffer(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                let ch = char::from(b'a' + (y * 4 + x) as u8);
                src.set_cell(x, y, ch, Rgba::RED, Rgba::BLUE, TextAttributes::empty())
                    .unwrap();
            }
        }
        let mut dst = buffer(6, 6);
        dst.draw_frame_buffer(1, 1, &src, Some(SourceRect::new(2, 2, 5, 5)))
            .unwrap();
        assert_eq!(dst.get(1, 1).unwrap().unwrap().ch, 'k');
        assert_eq!(dst.get(2, 2).unwrap().unwrap().ch, 'p');
        assert_eq!(dst.get(3, 3).unwrap().unwrap().ch, ' ');
        assert_eq!(dst.get(0, 0).unwrap().unwrap().ch, ' ');
    }

    #[test]
    fn blit_negative_destination_clips() {
        let mut src = buffer(3, 3);
        src.set_cell(2, 2, 'z', Rgba::RED, Rgba::BLUE, TextAttributes::empty())
            .unwrap();
        let mut dst = buffer(3, 3);
        dst.draw_frame_buffer(-2, -2, &src, None).unwrap();
        assert_eq!(dst.get(0, 0).unwrap().unwrap().ch, 'z');
        assert_eq!(dst.get(1, 1).unwrap().unwrap().bg, Rgba::TRANSPARENT);
    }

    #[test]
    fn blit_alpha_skips_transparent_cells() {
        let mut src = alpha_buffer(2, 1);
        src.grid_mut().unwrap().fill(
            'q' as u32,
            Rgba::TRANSPARENT,
            Rgba::TRANSPARENT,
            TextAttributes::empty(),
        );
        src.set_cell(1, 0, 'w', Rgba::WHITE, Rgba::RED.with_alpha(0.5), TextAttributes::empty())
            .unwrap();
        let mut dst = buffer(2, 1);
        dst.clear(Rgba::BLACK).unwrap();
        dst.draw_frame_buffer(0, 0, &src, None).unwrap();
        let c0 = dst.get(0, 0).unwrap().unwrap();
        assert_eq!(c0.ch, ' ');
        assert_eq!(c0.bg, Rgba::BLACK);
        let c1 = dst.get(1, 0).unwrap().unwrap();
        assert_eq!(c1.ch, 'w');
        assert_eq!(c1.bg.a, 0.5);
    }

    #[test]
    fn blit_respects_destination_scissor() {
        let mut src = buffer(4, 4);
        src.clear(Rgba::RED).unwrap();
        let mut dst = buffer(4, 4);
        dst.push_scissor_rect(Rect::new(1, 1, 2, 2)).unwrap();
        dst.draw_frame_buffer(0, 0, &src, None).unwrap();
        assert_eq!(dst.get(1, 1).unwrap().unwrap().bg, Rgba::RED);
        assert_eq!(dst.get(0, 0).unwrap().unwrap().bg, Rgba::TRANSPARENT);
        assert_eq!(dst.get(3, 3).unwrap().unwrap().bg, Rgba::TRANSPARENT);
    }

    #[test]
    fn blit_source_outside_bounds_is_noop() {
        let src = buffer(3, 3);
        let mut dst = buffer(3, 3);
        dst.clear(Rgba::GREEN).unwrap();
        let before = dst.grid().unwrap().clone();
        dst.draw_frame_buffer(0, 0, &src, Some(SourceRect::new(5, 0, 2, 2)))
            .unwrap();
        dst.draw_frame_buffer(10, 10, &src, None).unwrap();
        assert_eq!(dst.grid().unwrap(), &before);
    }

    #[test]
    fn resize_keeps_overlap() {
        let mut buf = buffer(3, 3);
        buf.set_cell(1, 1, 'r', Rgba::RED, Rgba::BLUE, TextAttributes::empty())
            .unwrap();
        buf.resize(5, 2).unwrap();
        assert_eq!((buf.width().unwrap(), buf.height().unwrap()), (5, 2));
        assert_eq!(buf.get(1, 1).unwrap().unwrap().ch, 'r');
        assert_eq!(buf.get(4, 1).unwrap().unwrap().ch, ' ');
        assert!(buf.resize(0, 2).is_err());
    }

    #[test]
    fn resize_over_engine_limit_fails() {
        let engine = Rc::new(HeapEngine::with_max_cells(20));
        let mut buf = OptimizedBuffer::create(engine, 4, 4, BufferOptions::default()).unwrap();
        assert!(matches!(buf.resize(5, 5), Err(BufferError::Engine(_))));
        assert_eq!(buf.width().unwrap(), 4);
    }

    #[test]
    fn destroy_is_idempotent_and_releases() {
        let engine = engine();
        let mut buf =
            OptimizedBuffer::create(engine.clone(), 2, 2, BufferOptions::default()).unwrap();
        assert_eq!(engine.stats().live_grids, 1);
        buf.destroy();
        buf.destroy();
        assert!(buf.is_destroyed());
        assert_eq!(engine.stats().live_grids, 0);
        assert_eq!(engine.stats().releases, 1);
        drop(buf);
        assert_eq!(engine.stats().releases, 1);
    }

    #[test]
    fn drop_releases_grid() {
        let engine = engine();
        {
            let _buf =
                OptimizedBuffer::create(engine.clone(), 2, 2, BufferOptions::default()).unwrap();
        }
        assert_eq!(engine.stats().live_grids, 0);
    }

    #[test]
    fn use_after_destroy_names_buffer() {
        let mut buf = OptimizedBuffer::create(
            engine(),
            2,
            2,
            BufferOptions::default().with_id("overlay"),
        )
        .unwrap();
        buf.destroy();
        let expected = BufferError::Destroyed {
            id: "overlay".into(),
        };
        assert_eq!(buf.clear(Rgba::BLACK).unwrap_err(), expected);
        assert_eq!(buf.get(0, 0).unwrap_err(), expected);
        assert_eq!(
            buf.set_cell(0, 0, 'x', Rgba::RED, Rgba::RED, TextAttributes::empty())
                .unwrap_err(),
            expected
        );
        assert_eq!(buf.fill_rect(0, 0, 1, 1, Rgba::RED).unwrap_err(), expected);
        assert_eq!(buf.resize(3, 3).unwrap_err(), expected);
        assert_eq!(buf.push_scissor_rect(Rect::new(0, 0, 1, 1)).unwrap_err(), expected);
        assert_eq!(buf.pop_scissor_rect().unwrap_err(), expected);
        assert_eq!(buf.width().unwrap_err(), expected);
        assert_eq!(buf.set_respect_alpha(true).unwrap_err(), expected);
    }

    #[test]
    fn blit_from_destroyed_source_fails() {
        let mut src = OptimizedBuffer::create(
            engine(),
            2,
            2,
            BufferOptions::default().with_id("gone"),
        )
        .unwrap();
        src.destroy();
        let mut dst = buffer(2, 2);
        assert_eq!(
            dst.draw_frame_buffer(0, 0, &src, None).unwrap_err(),
            BufferError::Destroyed { id: "gone".into() }
        );
    }

    #[test]
    fn respect_alpha_toggle() {
        let mut buf = buffer(1, 1);
        assert!(!buf.respect_alpha().unwrap());
        buf.set_respect_alpha(true).unwrap();
        assert!(buf.respect_alpha().unwrap());
    }

    #[test]
    fn debug_shows_state() {
        let mut buf = buffer(2, 3);
        let s = format!("{buf:?}");
        assert!(s.contains("width: 2"));
        buf.destroy();
        assert!(format!("{buf:?}").contains("destroyed: true"));
    }

    mod property {
        use super::*;
        use proptest::prelude::*;

        fn coord() -> impl Strategy<Value = i32> {
            -20i32..40
        }

        proptest! {
            #[test]
            fn out_of_bounds_writes_never_touch_grid(
                w in 1u32..16,
                h in 1u32..16,
                x in coord(),
                y in coord(),
            ) {
                prop_assume!(x < 0 || y < 0 || x >= w as i32 || y >= h as i32);
                let mut buf = buffer(w, h);
                let before = buf.grid().unwrap().clone();
                buf.set_cell(x, y, 'x', Rgba::RED, Rgba::RED, TextAttributes::BOLD).unwrap();
                buf.set_cell_with_alpha_blending(
                    x, y, 'y', Rgba::RED, Rgba::RED.with_alpha(0.3), TextAttributes::empty(),
                ).unwrap();
                prop_assert!(buf.get(x, y).unwrap().is_none());
                prop_assert_eq!(buf.grid().unwrap(), &before);
            }

            #[test]
            fn clear_sets_every_cell(
                w in 1u32..24,
                h in 1u32..24,
                r in 0.0f32..=1.0,
                a in 0.0f32..=1.0,
            ) {
                let mut buf = buffer(w, h);
                let bg = Rgba::new(r, 0.5, 0.25, a);
                buf.clear(bg).unwrap();
                let grid = buf.grid().unwrap();
                prop_assert!(grid.bg().iter().all(|c| *c == bg));
                prop_assert!(grid.fg().iter().all(|c| *c == Rgba::WHITE));
            }

            #[test]
            fn nested_scissor_is_intersection(
                ax in -5i32..25, ay in -5i32..25, aw in 0u32..25, ah in 0u32..25,
                bx in -5i32..25, by in -5i32..25, bw in 0u32..25, bh in 0u32..25,
            ) {
                let mut buf = buffer(20, 20);
                let bounds = Rect::from_size(20, 20);
                let a = Rect::new(ax, ay, aw, ah);
                let b = Rect::new(bx, by, bw, bh);
                buf.push_scissor_rect(a).unwrap();
                let after_a = buf.scissor_rect().unwrap();
                buf.push_scissor_rect(b).unwrap();
                prop_assert_eq!(
                    buf.scissor_rect().unwrap(),
                    Some(bounds.intersection(&a).intersection(&b))
                );
                buf.pop_scissor_rect().unwrap();
                prop_assert_eq!(buf.scissor_rect().unwrap(), after_a);
            }
        }
    }
}
