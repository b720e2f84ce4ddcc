#![forbid(unsafe_code)]

//! Text drawing, selection highlighting, and styled text buffers.
//!
//! Text is placed one codepoint per column with no wrapping and no width
//! measurement; shaping belongs to a higher layer. Every character goes
//! through the alpha-blending path, so text drawn with a translucent or
//! absent background composites over what is underneath.
//!
//! # Selection colors
//!
//! A [`Selection`] with an explicit `bg_color` paints selected cells with it
//! (and `fg_color`, or the original foreground). Without one, selected cells
//! swap colors: the background becomes the original foreground, and the
//! foreground becomes the original background, or black when that background
//! is fully transparent.

use termgrid_core::geometry::Rect;

use crate::attrs::TextAttributes;
use crate::buffer::OptimizedBuffer;
use crate::color::Rgba;
use crate::error::Result;

/// Highlighted character range `[start, end)`, in codepoints.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
    pub bg_color: Option<Rgba>,
    pub fg_color: Option<Rgba>,
}

impl Selection {
    /// Selection using the swap-colors default.
    pub const fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            bg_color: None,
            fg_color: None,
        }
    }

    #[must_use]
    pub const fn with_colors(mut self, bg: Option<Rgba>, fg: Option<Rgba>) -> Self {
        self.bg_color = bg;
        self.fg_color = fg;
        self
    }

    #[inline]
    pub const fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }

    /// Colors for a selected cell whose normal colors are `(fg, bg)`.
    #[inline]
    pub fn highlight(&self, fg: Rgba, bg: Rgba) -> (Rgba, Rgba) {
        match self.bg_color {
            Some(sel_bg) => (self.fg_color.unwrap_or(fg), sel_bg),
            None => {
                let sel_fg = if bg.a > 0.0 { bg } else { Rgba::BLACK };
                (sel_fg, fg)
            }
        }
    }
}

impl OptimizedBuffer {
    /// Draw `text` left to right starting at `(x, y)`.
    ///
    /// `bg` of `None` draws over a transparent background, which keeps glyphs
    /// already present under spaces in `text`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_text(
        &mut self,
        text: &str,
        x: i32,
        y: i32,
        fg: Rgba,
        bg: Option<Rgba>,
        attributes: TextAttributes,
        selection: Option<&Selection>,
    ) -> Result<()> {
        let mut canvas = self.canvas()?;
        if y < canvas.clip.top() || y >= canvas.clip.bottom() {
            return Ok(());
        }
        let bg = bg.unwrap_or(Rgba::TRANSPARENT);
        let right = canvas.clip.right();

        for (i, ch) in text.chars().enumerate() {
            let Some(cx) = i32::try_from(i).ok().and_then(|i| x.checked_add(i)) else {
                break;
            };
            if cx >= right {
                break;
            }
            let (f, b) = match selection {
                Some(sel) if sel.contains(i) => sel.highlight(fg, bg),
                _ => (fg, bg),
            };
            canvas.put_blended(cx, y, ch as u32, f, b, attributes);
        }
        Ok(())
    }

    /// Draw a [`TextBuffer`] with its lines stacked from `(x, y)`.
    ///
    /// `clip`, when given, further restricts which destination cells are
    /// written. The buffer's own selection, if any, is highlighted.
    pub fn draw_text_buffer(
        &mut self,
        text: &TextBuffer,
        x: i32,
        y: i32,
        clip: Option<Rect>,
    ) -> Result<()> {
        let mut canvas = self.canvas()?;
        let region = match clip {
            Some(rect) => rect.intersection(&canvas.clip),
            None => canvas.clip,
        };
        if region.is_empty() {
            return Ok(());
        }
        let _span = tracing::trace_span!("draw_text_buffer", len = text.len()).entered();

        for (row, line) in text.line_spans().enumerate() {
            let Some(cy) = i32::try_from(row).ok().and_then(|r| y.checked_add(r)) else {
                break;
            };
            if cy >= region.bottom() {
                break;
            }
            if cy < region.top() {
                continue;
            }
            for col in 0..line.width as usize {
                let Some(cx) = i32::try_from(col).ok().and_then(|c| x.checked_add(c)) else {
                    break;
                };
                if !region.contains(cx, cy) {
                    continue;
                }
                let i = line.start as usize + col;
                let (mut fg, mut bg) = (text.fg[i], text.bg[i]);
                if let Some(sel) = text.selection.as_ref().filter(|s| s.contains(i)) {
                    (fg, bg) = sel.highlight(fg, bg);
                }
                canvas.put_blended(cx, cy, text.chars[i], fg, bg, text.attributes[i]);
            }
        }
        Ok(())
    }
}

/// A styled text fragment for [`TextBuffer::write_chunk`].
///
/// Unset style fields fall back to the buffer's defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextChunk<'a> {
    pub text: &'a str,
    pub fg: Option<Rgba>,
    pub bg: Option<Rgba>,
    pub attributes: Option<TextAttributes>,
}

impl<'a> TextChunk<'a> {
    pub const fn new(text: &'a str) -> Self {
        Self {
            text,
            fg: None,
            bg: None,
            attributes: None,
        }
    }

    #[must_use]
    pub const fn fg(mut self, fg: Rgba) -> Self {
        self.fg = Some(fg);
        self
    }

    #[must_use]
    pub const fn bg(mut self, bg: Rgba) -> Self {
        self.bg = Some(bg);
        self
    }

    #[must_use]
    pub const fn attributes(mut self, attributes: TextAttributes) -> Self {
        self.attributes = Some(attributes);
        self
    }
}

/// Start offset and width (in codepoints) of one line in a [`TextBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInfo {
    pub start: u32,
    pub width: u32,
}

/// Growable run of styled codepoints.
///
/// Lines are separated by `'\n'`, which is stored like any other character
/// but never drawn. Call [`finalize_line_info`](Self::finalize_line_info)
/// after writing to cache the line table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextBuffer {
    chars: Vec<u32>,
    fg: Vec<Rgba>,
    bg: Vec<Rgba>,
    attributes: Vec<TextAttributes>,
    default_fg: Option<Rgba>,
    default_bg: Option<Rgba>,
    default_attributes: Option<TextAttributes>,
    selection: Option<Selection>,
    lines: Vec<LineInfo>,
}

const NEWLINE: u32 = '\n' as u32;

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            chars: Vec::with_capacity(capacity),
            fg: Vec::with_capacity(capacity),
            bg: Vec::with_capacity(capacity),
            attributes: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Number of stored codepoints, newlines included.
    #[inline]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.chars.capacity()
    }

    /// Append a chunk; returns the number of codepoints written.
    pub fn write_chunk(&mut self, chunk: TextChunk<'_>) -> usize {
        let fg = chunk.fg.or(self.default_fg).unwrap_or(Rgba::WHITE);
        let bg = chunk.bg.or(self.default_bg).unwrap_or(Rgba::TRANSPARENT);
        let attributes = chunk
            .attributes
            .or(self.default_attributes)
            .unwrap_or_default();
        let before = self.chars.len();
        for ch in chunk.text.chars() {
            self.push(ch as u32, fg, bg, attributes);
        }
        self.lines.clear();
        self.chars.len() - before
    }

    /// Append `text` with the default style.
    pub fn write_str(&mut self, text: &str) -> usize {
        self.write_chunk(TextChunk::new(text))
    }

    /// Overwrite the codepoint at `index`. No-op past the end.
    pub fn set_cell(
        &mut self,
        index: usize,
        ch: char,
        fg: Rgba,
        bg: Rgba,
        attributes: TextAttributes,
    ) {
        if index >= self.chars.len() {
            return;
        }
        let newline_changed = (self.chars[index] == NEWLINE) != (ch == '\n');
        self.chars[index] = ch as u32;
        self.fg[index] = fg;
        self.bg[index] = bg;
        self.attributes[index] = attributes;
        if newline_changed {
            self.lines.clear();
        }
    }

    /// Character at `index`; invalid codepoints read as U+FFFD.
    pub fn char_at(&self, index: usize) -> Option<char> {
        self.chars
            .get(index)
            .map(|c| char::from_u32(*c).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    /// Style at `index` as `(fg, bg, attributes)`.
    pub fn style_at(&self, index: usize) -> Option<(Rgba, Rgba, TextAttributes)> {
        Some((
            *self.fg.get(index)?,
            *self.bg.get(index)?,
            *self.attributes.get(index)?,
        ))
    }

    /// Text content as a `String`.
    pub fn text(&self) -> String {
        self.chars
            .iter()
            .map(|c| char::from_u32(*c).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }

    /// New buffer holding `self` followed by `other`, with `self`'s defaults.
    pub fn concat(&self, other: &TextBuffer) -> TextBuffer {
        let mut out = TextBuffer::with_capacity(self.len() + other.len());
        out.default_fg = self.default_fg;
        out.default_bg = self.default_bg;
        out.default_attributes = self.default_attributes;
        for src in [self, other] {
            out.chars.extend_from_slice(&src.chars);
            out.fg.extend_from_slice(&src.fg);
            out.bg.extend_from_slice(&src.bg);
            out.attributes.extend_from_slice(&src.attributes);
        }
        out
    }

    /// Truncate to `len` codepoints, or reserve room for `len`.
    pub fn resize(&mut self, len: usize) {
        if len < self.chars.len() {
            self.chars.truncate(len);
            self.fg.truncate(len);
            self.bg.truncate(len);
            self.attributes.truncate(len);
            self.lines.clear();
        } else {
            let extra = len - self.chars.len();
            self.chars.reserve(extra);
            self.fg.reserve(extra);
            self.bg.reserve(extra);
            self.attributes.reserve(extra);
        }
    }

    /// Drop all content and the selection; capacity and defaults stay.
    pub fn reset(&mut self) {
        self.chars.clear();
        self.fg.clear();
        self.bg.clear();
        self.attributes.clear();
        self.lines.clear();
        self.selection = None;
    }

    pub fn set_selection(&mut self, start: usize, end: usize, bg: Option<Rgba>, fg: Option<Rgba>) {
        self.selection = Some(Selection::new(start, end).with_colors(bg, fg));
    }

    pub fn reset_selection(&mut self) {
        self.selection = None;
    }

    #[inline]
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn set_default_fg(&mut self, fg: Option<Rgba>) {
        self.default_fg = fg;
    }

    pub fn set_default_bg(&mut self, bg: Option<Rgba>) {
        self.default_bg = bg;
    }

    pub fn set_default_attributes(&mut self, attributes: Option<TextAttributes>) {
        self.default_attributes = attributes;
    }

    pub fn reset_defaults(&mut self) {
        self.default_fg = None;
        self.default_bg = None;
        self.default_attributes = None;
    }

    /// Rebuild and cache the line table.
    pub fn finalize_line_info(&mut self) {
        self.lines = self.line_spans().collect();
    }

    /// Cached line table; empty until [`finalize_line_info`](Self::finalize_line_info)
    /// runs after the last write.
    #[inline]
    pub fn line_info(&self) -> &[LineInfo] {
        &self.lines
    }

    #[inline]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Lines computed on the fly. An empty buffer has one empty line.
    fn line_spans(&self) -> impl Iterator<Item = LineInfo> + '_ {
        let mut start = 0usize;
        let mut done = false;
        core::iter::from_fn(move || {
            if done {
                return None;
            }
            let rest = &self.chars[start..];
            let info = match rest.iter().position(|c| *c == NEWLINE) {
                Some(n) => {
                    let info = LineInfo {
                        start: start as u32,
                        width: n as u32,
                    };
                    start += n + 1;
                    info
                }
                None => {
                    done = true;
                    LineInfo {
                        start: start as u32,
                        width: rest.len() as u32,
                    }
                }
            };
            Some(info)
        })
    }

    fn push(&mut self, ch: u32, fg: Rgba, bg: Rgba, attributes: TextAttributes) {
        self.chars.push(ch);
        self.fg.push(fg);
        self.bg.push(bg);
        self.attributes.push(attributes);
    }
}
