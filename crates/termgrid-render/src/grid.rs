#![forbid(unsafe_code)]

//! Cell grid: four parallel planes addressed by `y * width + x`.
//!
//! # Layout
//!
//! A [`CellGrid`] stores one entry per cell in each of four planes:
//!
//! | plane | type | meaning |
//! |---|---|---|
//! | `chars` | `u32` | Unicode scalar value |
//! | `fg` | [`Rgba`] | foreground color |
//! | `bg` | [`Rgba`] | background color |
//! | `attributes` | [`TextAttributes`] | style bits |
//!
//! All four planes always have length `width * height`. Planar storage keeps
//! post-processing passes (which usually touch only one or two planes) cache
//! friendly, and lets blits copy whole row slices.
//!
//! Grids are normally produced by a [`RenderEngine`](crate::engine::RenderEngine)
//! and owned by an [`OptimizedBuffer`](crate::OptimizedBuffer); filters receive
//! `&mut CellGrid` directly.

use crate::attrs::TextAttributes;
use crate::color::Rgba;
use core::ops::Range;

/// Character written into fresh or cleared cells.
pub const DEFAULT_CHAR: char = ' ';
/// Foreground of fresh or cleared cells.
pub const DEFAULT_FG: Rgba = Rgba::WHITE;
/// Background of fresh cells.
pub const DEFAULT_BG: Rgba = Rgba::TRANSPARENT;

/// Owned copy of one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSnapshot {
    /// Stored character. Invalid codepoints read back as U+FFFD.
    pub ch: char,
    pub fg: Rgba,
    pub bg: Rgba,
    pub attributes: TextAttributes,
}

/// Shared view of all four planes.
#[derive(Debug, Clone, Copy)]
pub struct Planes<'a> {
    pub chars: &'a [u32],
    pub fg: &'a [Rgba],
    pub bg: &'a [Rgba],
    pub attributes: &'a [TextAttributes],
}

/// Mutable view of all four planes, borrowed together.
#[derive(Debug)]
pub struct PlanesMut<'a> {
    pub chars: &'a mut [u32],
    pub fg: &'a mut [Rgba],
    pub bg: &'a mut [Rgba],
    pub attributes: &'a mut [TextAttributes],
}

/// Rectangular grid of cells stored as parallel planes.
///
/// Equality compares size, alpha mode and cell contents; the engine handle
/// is ignored.
#[derive(Debug, Clone)]
pub struct CellGrid {
    handle: u64,
    width: u32,
    height: u32,
    respect_alpha: bool,
    chars: Vec<u32>,
    fg: Vec<Rgba>,
    bg: Vec<Rgba>,
    attributes: Vec<TextAttributes>,
}

impl CellGrid {
    /// Create a grid with every cell set to the defaults
    /// (space, white fg, transparent bg, no attributes).
    pub fn new(width: u32, height: u32, respect_alpha: bool) -> Self {
        let len = width as usize * height as usize;
        Self {
            handle: 0,
            width,
            height,
            respect_alpha,
            chars: vec![DEFAULT_CHAR as u32; len],
            fg: vec![DEFAULT_FG; len],
            bg: vec![DEFAULT_BG; len],
            attributes: vec![TextAttributes::empty(); len],
        }
    }

    /// Tag the grid with an engine-assigned storage handle.
    #[must_use]
    pub const fn with_handle(mut self, handle: u64) -> Self {
        self.handle = handle;
        self
    }

    /// Storage handle assigned by the allocating engine; `0` for grids built
    /// directly.
    #[inline]
    pub const fn handle(&self) -> u64 {
        self.handle
    }

    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of cells (`width * height`).
    #[inline]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Whether blits from this grid composite by alpha.
    #[inline]
    pub const fn respect_alpha(&self) -> bool {
        self.respect_alpha
    }

    #[inline]
    pub fn set_respect_alpha(&mut self, respect_alpha: bool) {
        self.respect_alpha = respect_alpha;
    }

    /// Plane index for `(x, y)`, or `None` when out of bounds.
    #[inline]
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Index range covering row `y`.
    #[inline]
    pub fn row_range(&self, y: u32) -> Option<Range<usize>> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.width as usize;
        Some(start..start + self.width as usize)
    }

    /// Copy out the cell at `(x, y)`.
    #[inline]
    pub fn cell(&self, x: i32, y: i32) -> Option<CellSnapshot> {
        self.index(x, y).map(|i| self.cell_at(i))
    }

    /// Copy out the cell at plane index `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    #[inline]
    pub fn cell_at(&self, i: usize) -> CellSnapshot {
        CellSnapshot {
            ch: char::from_u32(self.chars[i]).unwrap_or(char::REPLACEMENT_CHARACTER),
            fg: self.fg[i],
            bg: self.bg[i],
            attributes: self.attributes[i],
        }
    }

    /// Overwrite all four fields of the cell at plane index `i`.
    #[inline]
    pub fn write(&mut self, i: usize, ch: u32, fg: Rgba, bg: Rgba, attributes: TextAttributes) {
        self.chars[i] = ch;
        self.fg[i] = fg;
        self.bg[i] = bg;
        self.attributes[i] = attributes;
    }

    /// Copy one cell from `src` at `src_i` into `dst_i`.
    #[inline]
    pub fn copy_cell(&mut self, dst_i: usize, src: &CellGrid, src_i: usize) {
        self.chars[dst_i] = src.chars[src_i];
        self.fg[dst_i] = src.fg[src_i];
        self.bg[dst_i] = src.bg[src_i];
        self.attributes[dst_i] = src.attributes[src_i];
    }

    /// Copy `len` consecutive cells of `src` starting at `src_i` into this
    /// grid starting at `dst_i`, plane by plane.
    #[inline]
    pub fn copy_span(&mut self, dst_i: usize, src: &CellGrid, src_i: usize, len: usize) {
        self.chars[dst_i..dst_i + len].copy_from_slice(&src.chars[src_i..src_i + len]);
        self.fg[dst_i..dst_i + len].copy_from_slice(&src.fg[src_i..src_i + len]);
        self.bg[dst_i..dst_i + len].copy_from_slice(&src.bg[src_i..src_i + len]);
        self.attributes[dst_i..dst_i + len]
            .copy_from_slice(&src.attributes[src_i..src_i + len]);
    }

    /// Set every cell to the same values.
    pub fn fill(&mut self, ch: u32, fg: Rgba, bg: Rgba, attributes: TextAttributes) {
        self.chars.fill(ch);
        self.fg.fill(fg);
        self.bg.fill(bg);
        self.attributes.fill(attributes);
    }

    /// Make this grid an exact copy of `other`, reusing allocations.
    ///
    /// The handle is not copied.
    pub fn copy_from(&mut self, other: &CellGrid) {
        self.width = other.width;
        self.height = other.height;
        self.respect_alpha = other.respect_alpha;
        self.chars.clone_from(&other.chars);
        self.fg.clone_from(&other.fg);
        self.bg.clone_from(&other.bg);
        self.attributes.clone_from(&other.attributes);
    }

    /// Change dimensions, keeping the overlapping top-left region.
    ///
    /// Newly exposed cells get the defaults. Plane slices borrowed before the
    /// call are invalid afterwards (the borrow checker enforces this).
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        let mut next = Self::new(width, height, self.respect_alpha).with_handle(self.handle);
        let copy_w = self.width.min(width) as usize;
        for y in 0..self.height.min(height) {
            let src = y as usize * self.width as usize;
            let dst = y as usize * width as usize;
            next.copy_span(dst, self, src, copy_w);
        }
        *self = next;
    }

    #[inline]
    pub fn chars(&self) -> &[u32] {
        &self.chars
    }

    #[inline]
    pub fn fg(&self) -> &[Rgba] {
        &self.fg
    }

    #[inline]
    pub fn bg(&self) -> &[Rgba] {
        &self.bg
    }

    #[inline]
    pub fn attributes(&self) -> &[TextAttributes] {
        &self.attributes
    }

    /// All planes, read-only.
    #[inline]
    pub fn planes(&self) -> Planes<'_> {
        Planes {
            chars: &self.chars,
            fg: &self.fg,
            bg: &self.bg,
            attributes: &self.attributes,
        }
    }

    /// All planes, mutable at once.
    #[inline]
    pub fn planes_mut(&mut self) -> PlanesMut<'_> {
        PlanesMut {
            chars: &mut self.chars,
            fg: &mut self.fg,
            bg: &mut self.bg,
            attributes: &mut self.attributes,
        }
    }

    /// `true` when cell `i` here and cell `j` in `other` are bit-identical.
    #[inline]
    pub fn cell_bits_eq(&self, i: usize, other: &CellGrid, j: usize) -> bool {
        self.chars[i] == other.chars[j]
            && self.attributes[i] == other.attributes[j]
            && self.fg[i].bits_eq(&other.fg[j])
            && self.bg[i].bits_eq(&other.bg[j])
    }
}

impl PartialEq for CellGrid {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.respect_alpha == other.respect_alpha
            && self.chars == other.chars
            && self.fg == other.fg
            && self.bg == other.bg
            && self.attributes == other.attributes
    }
}
