#![forbid(unsafe_code)]

//! Box and border drawing.
//!
//! Box options cross the engine boundary as one packed `u32`:
//!
//! | bits | field |
//! |---|---|
//! | 0-3 | sides: top `0b1000`, right `0b0100`, bottom `0b0010`, left `0b0001` |
//! | 4 | fill interior |
//! | 5-6 | title alignment (0 left, 1 center, 2 right) |
//!
//! [`OptimizedBuffer::draw_box`] packs a [`BoxOptions`] and forwards to
//! [`OptimizedBuffer::draw_box_packed`], the same entry point a native engine
//! would expose. All border cells go through the alpha-blending path, so
//! translucent borders composite over what is underneath.

use core::fmt;

use termgrid_core::geometry::Rect;

use crate::attrs::TextAttributes;
use crate::buffer::{Canvas, OptimizedBuffer};
use crate::color::Rgba;
use crate::error::Result;

/// Characters used to draw a box.
///
/// The junction characters are not used by [`OptimizedBuffer::draw_box`]
/// itself; they travel with the style for callers composing grids of boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderChars {
    pub top_left: char,
    pub top_right: char,
    pub bottom_left: char,
    pub bottom_right: char,
    pub horizontal: char,
    pub vertical: char,
    pub top_t: char,
    pub bottom_t: char,
    pub left_t: char,
    pub right_t: char,
    pub cross: char,
}

impl BorderChars {
    /// Light box-drawing characters (U+250x).
    pub const SINGLE: Self = Self {
        top_left: '┌',
        top_right: '┐',
        bottom_left: '└',
        bottom_right: '┘',
        horizontal: '─',
        vertical: '│',
        top_t: '┬',
        bottom_t: '┴',
        left_t: '├',
        right_t: '┤',
        cross: '┼',
    };

    /// Rounded corners.
    pub const ROUNDED: Self = Self {
        top_left: '╭',
        top_right: '╮',
        bottom_left: '╰',
        bottom_right: '╯',
        ..Self::SINGLE
    };

    /// Double-line border.
    pub const DOUBLE: Self = Self {
        top_left: '╔',
        top_right: '╗',
        bottom_left: '╚',
        bottom_right: '╝',
        horizontal: '═',
        vertical: '║',
        top_t: '╦',
        bottom_t: '╩',
        left_t: '╠',
        right_t: '╣',
        cross: '╬',
    };

    /// Heavy (thick) border.
    pub const HEAVY: Self = Self {
        top_left: '┏',
        top_right: '┓',
        bottom_left: '┗',
        bottom_right: '┛',
        horizontal: '━',
        vertical: '┃',
        top_t: '┳',
        bottom_t: '┻',
        left_t: '┣',
        right_t: '┫',
        cross: '╋',
    };

    /// ASCII-only border.
    pub const ASCII: Self = Self {
        top_left: '+',
        top_right: '+',
        bottom_left: '+',
        bottom_right: '+',
        horizontal: '-',
        vertical: '|',
        top_t: '+',
        bottom_t: '+',
        left_t: '+',
        right_t: '+',
        cross: '+',
    };

    /// Build from a caller-supplied array.
    ///
    /// Order: top-left, top-right, bottom-left, bottom-right, horizontal,
    /// vertical, top-T, bottom-T, left-T, right-T, cross. The first six are
    /// required; missing junctions fall back to [`BorderChars::SINGLE`].
    pub fn from_slice(chars: &[char]) -> core::result::Result<Self, BorderCharsError> {
        if chars.len() < 6 {
            return Err(BorderCharsError::TooFew(chars.len()));
        }
        if chars.len() > 11 {
            return Err(BorderCharsError::TooMany(chars.len()));
        }
        let mut all = Self::SINGLE.to_array();
        all[..chars.len()].copy_from_slice(chars);
        Ok(Self::from_array(all))
    }

    /// Flatten in [`from_slice`](Self::from_slice) order.
    pub const fn to_array(self) -> [char; 11] {
        [
            self.top_left,
            self.top_right,
            self.bottom_left,
            self.bottom_right,
            self.horizontal,
            self.vertical,
            self.top_t,
            self.bottom_t,
            self.left_t,
            self.right_t,
            self.cross,
        ]
    }

    const fn from_array(c: [char; 11]) -> Self {
        Self {
            top_left: c[0],
            top_right: c[1],
            bottom_left: c[2],
            bottom_right: c[3],
            horizontal: c[4],
            vertical: c[5],
            top_t: c[6],
            bottom_t: c[7],
            left_t: c[8],
            right_t: c[9],
            cross: c[10],
        }
    }
}

/// Rejected custom border array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderCharsError {
    TooFew(usize),
    TooMany(usize),
}

impl fmt::Display for BorderCharsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFew(n) => write!(f, "border needs at least 6 characters, got {n}"),
            Self::TooMany(n) => write!(f, "border takes at most 11 characters, got {n}"),
        }
    }
}

impl std::error::Error for BorderCharsError {}

/// Named border style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorderStyle {
    #[default]
    Single,
    Double,
    Rounded,
    Heavy,
    Ascii,
    Custom(BorderChars),
}

impl BorderStyle {
    pub const fn chars(self) -> BorderChars {
        match self {
            Self::Single => BorderChars::SINGLE,
            Self::Double => BorderChars::DOUBLE,
            Self::Rounded => BorderChars::ROUNDED,
            Self::Heavy => BorderChars::HEAVY,
            Self::Ascii => BorderChars::ASCII,
            Self::Custom(chars) => chars,
        }
    }
}

bitflags::bitflags! {
    /// Which sides of a box get a border. Bit values are the packed layout.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BorderSides: u8 {
        const TOP    = 0b1000;
        const RIGHT  = 0b0100;
        const BOTTOM = 0b0010;
        const LEFT   = 0b0001;
        const ALL    = Self::TOP.bits() | Self::RIGHT.bits() | Self::BOTTOM.bits() | Self::LEFT.bits();
    }
}

impl Default for BorderSides {
    fn default() -> Self {
        Self::ALL
    }
}

/// One side of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl From<Side> for BorderSides {
    fn from(side: Side) -> Self {
        match side {
            Side::Top => Self::TOP,
            Side::Right => Self::RIGHT,
            Side::Bottom => Self::BOTTOM,
            Side::Left => Self::LEFT,
        }
    }
}

/// Border side selection as callers express it: every side, or a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BorderSidesInput {
    All,
    Sides(Vec<Side>),
}

impl BorderSidesInput {
    /// Collapse into the side mask.
    pub fn resolve(&self) -> BorderSides {
        match self {
            Self::All => BorderSides::ALL,
            Self::Sides(sides) => sides
                .iter()
                .fold(BorderSides::empty(), |acc, s| acc | BorderSides::from(*s)),
        }
    }
}

impl From<bool> for BorderSidesInput {
    fn from(all: bool) -> Self {
        if all {
            Self::All
        } else {
            Self::Sides(Vec::new())
        }
    }
}

impl From<Vec<Side>> for BorderSidesInput {
    fn from(sides: Vec<Side>) -> Self {
        Self::Sides(sides)
    }
}

/// Horizontal placement of a box title in the top border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum TitleAlignment {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

impl TitleAlignment {
    /// Decode the two packed bits. The unused value 3 reads as `Left`.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            1 => Self::Center,
            2 => Self::Right,
            _ => Self::Left,
        }
    }
}

/// Decoded form of a packed options word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedBoxOptions {
    pub sides: BorderSides,
    pub fill: bool,
    pub title_alignment: TitleAlignment,
}

/// Pack side mask, fill flag, and title alignment into one word.
pub const fn pack_box_options(sides: BorderSides, fill: bool, alignment: TitleAlignment) -> u32 {
    (sides.bits() as u32 & 0b1111) | ((fill as u32) << 4) | (((alignment as u32) & 0b11) << 5)
}

/// Inverse of [`pack_box_options`]. Bits above 6 are ignored.
pub const fn unpack_box_options(packed: u32) -> PackedBoxOptions {
    PackedBoxOptions {
        sides: BorderSides::from_bits_truncate((packed & 0b1111) as u8),
        fill: packed & (1 << 4) != 0,
        title_alignment: TitleAlignment::from_bits(((packed >> 5) & 0b11) as u8),
    }
}

/// Everything [`OptimizedBuffer::draw_box`] needs.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxOptions {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub style: BorderStyle,
    pub sides: BorderSides,
    pub border_color: Rgba,
    pub background_color: Rgba,
    /// Fill the interior with `background_color` before drawing the border.
    pub fill: bool,
    pub title: Option<String>,
    pub title_alignment: TitleAlignment,
}

impl BoxOptions {
    /// Single-line box with all sides, white border, transparent background.
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            style: BorderStyle::Single,
            sides: BorderSides::ALL,
            border_color: Rgba::WHITE,
            background_color: Rgba::TRANSPARENT,
            fill: false,
            title: None,
            title_alignment: TitleAlignment::Left,
        }
    }

    #[must_use]
    pub fn with_style(mut self, style: BorderStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn with_sides(mut self, sides: impl Into<BorderSidesInput>) -> Self {
        self.sides = sides.into().resolve();
        self
    }

    #[must_use]
    pub fn with_border_color(mut self, color: Rgba) -> Self {
        self.border_color = color;
        self
    }

    /// Set the background and turn on interior fill.
    #[must_use]
    pub fn with_fill(mut self, background: Rgba) -> Self {
        self.background_color = background;
        self.fill = true;
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>, alignment: TitleAlignment) -> Self {
        self.title = Some(title.into());
        self.title_alignment = alignment;
        self
    }

    /// The packed options word for this box.
    pub const fn packed(&self) -> u32 {
        pack_box_options(self.sides, self.fill, self.title_alignment)
    }
}

impl OptimizedBuffer {
    /// Draw a box described by `options`.
    pub fn draw_box(&mut self, options: &BoxOptions) -> Result<()> {
        self.draw_box_packed(
            Rect::new(options.x, options.y, options.width, options.height),
            options.style.chars(),
            options.packed(),
            options.border_color,
            options.background_color,
            options.title.as_deref(),
        )
    }

    /// Draw a box from a packed options word.
    ///
    /// Fills first (interior only, excluding drawn sides), then the border.
    /// Corners appear only where both adjacent sides are drawn. The title
    /// needs the top border and a width of at least 4; it is truncated to
    /// `width - 4` characters.
    pub fn draw_box_packed(
        &mut self,
        rect: Rect,
        chars: BorderChars,
        packed: u32,
        border_color: Rgba,
        background_color: Rgba,
        title: Option<&str>,
    ) -> Result<()> {
        let mut canvas = self.canvas()?;
        if rect.is_empty() {
            return Ok(());
        }
        let opts = unpack_box_options(packed);
        let sides = opts.sides;

        if opts.fill {
            canvas.fill(interior(rect, sides), background_color);
        }

        // Border geometry is computed in i64 so edges near the i32 limits
        // neither overflow nor wrap; cells outside the clip are skipped.
        let clip = canvas.clip;
        let (clip_x0, clip_y0) = (i64::from(clip.left()), i64::from(clip.top()));
        let (clip_x1, clip_y1) = (i64::from(clip.right()) - 1, i64::from(clip.bottom()) - 1);
        let put = |canvas: &mut Canvas<'_>, x: i64, y: i64, ch: char| {
            if let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) {
                border_cell(canvas, x, y, ch, border_color, background_color);
            }
        };

        let left = i64::from(rect.x);
        let top = i64::from(rect.y);
        let width = i64::from(rect.width);
        let right = left + width - 1;
        let bottom = top + i64::from(rect.height) - 1;
        let has_left = sides.contains(BorderSides::LEFT);
        let has_right = sides.contains(BorderSides::RIGHT);
        let has_top = sides.contains(BorderSides::TOP);
        let has_bottom = sides.contains(BorderSides::BOTTOM);
        let x_span = left.max(clip_x0)..=right.min(clip_x1);

        let horizontal = |canvas: &mut Canvas<'_>, y: i64, first: char, last: char| {
            if y < clip_y0 || y > clip_y1 {
                return;
            }
            for x in x_span.clone() {
                let ch = if x == left && has_left {
                    first
                } else if x == right && has_right {
                    last
                } else {
                    chars.horizontal
                };
                put(canvas, x, y, ch);
            }
        };
        if has_top {
            horizontal(&mut canvas, top, chars.top_left, chars.top_right);
        }
        if has_bottom && (bottom != top || !has_top) {
            horizontal(&mut canvas, bottom, chars.bottom_left, chars.bottom_right);
        }

        let v_start = if has_top { top + 1 } else { top };
        let v_end = if has_bottom { bottom - 1 } else { bottom };
        for y in v_start.max(clip_y0)..=v_end.min(clip_y1) {
            if has_left {
                put(&mut canvas, left, y, chars.vertical);
            }
            if has_right && (right != left || !has_left) {
                put(&mut canvas, right, y, chars.vertical);
            }
        }

        let title = match title {
            Some(title) if has_top && rect.width >= 4 => title,
            _ => return Ok(()),
        };
        let max = (rect.width - 4) as usize;
        let len = title.chars().take(max).count() as i64;
        if len == 0 {
            return Ok(());
        }
        let start = match opts.title_alignment {
            TitleAlignment::Left => left + 2,
            TitleAlignment::Center => left + (width - len) / 2,
            TitleAlignment::Right => left + width - 2 - len,
        };
        for (i, ch) in title.chars().take(max).enumerate() {
            let x = start + i as i64;
            if (clip_x0..=clip_x1).contains(&x) {
                put(&mut canvas, x, top, ch);
            }
        }
        Ok(())
    }
}

#[inline]
fn border_cell(canvas: &mut Canvas<'_>, x: i32, y: i32, ch: char, fg: Rgba, bg: Rgba) {
    canvas.put_blended(x, y, ch as u32, fg, bg, TextAttributes::empty());
}

/// Part of `rect` not covered by the drawn sides.
fn interior(rect: Rect, sides: BorderSides) -> Rect {
    let inset = |on: bool| u32::from(on);
    let l = inset(sides.contains(BorderSides::LEFT));
    let r = inset(sides.contains(BorderSides::RIGHT));
    let t = inset(sides.contains(BorderSides::TOP));
    let b = inset(sides.contains(BorderSides::BOTTOM));
    Rect::new(
        rect.x.saturating_add_unsigned(l),
        rect.y.saturating_add_unsigned(t),
        rect.width.saturating_sub(l + r),
        rect.height.saturating_sub(t + b),
    )
}
