#![forbid(unsafe_code)]

//! Separable box blur.
//!
//! # Algorithm
//!
//! Each plane (fg, then bg) is blurred in two passes, horizontal then
//! vertical. A pass keeps a running sum over a `2 * radius + 1` window:
//! one add and one subtract per cell, so the cost is independent of the
//! radius. Samples past the edge repeat the edge cell. All four channels,
//! alpha included, are averaged.
//!
//! Afterwards each character is replaced from [`BLUR_RAMP`] by the blurred
//! foreground alpha.

use termgrid_render::{CellGrid, Rgba};

use crate::PostEffect;

/// Glyphs indexed by `min(4, floor(fg_alpha * 5))`.
pub const BLUR_RAMP: [char; 5] = [' ', '░', '▒', '▓', ' '];

/// Box blur with a square window of `2 * radius + 1` cells.
#[derive(Debug, Clone, Default)]
pub struct BoxBlur {
    /// Window half-size. Zero or negative disables the effect.
    pub radius: i32,
    line: Vec<Rgba>,
}

impl BoxBlur {
    pub fn new(radius: i32) -> Self {
        Self {
            radius,
            line: Vec::new(),
        }
    }
}

#[inline]
fn add(acc: &mut [f32; 4], c: Rgba) {
    acc[0] += c.r;
    acc[1] += c.g;
    acc[2] += c.b;
    acc[3] += c.a;
}

#[inline]
fn sub(acc: &mut [f32; 4], c: Rgba) {
    acc[0] -= c.r;
    acc[1] -= c.g;
    acc[2] -= c.b;
    acc[3] -= c.a;
}

/// Blur `len` samples starting at `start` with the given `stride`, in place.
///
/// `line` is scratch space holding a copy of the original samples.
fn blur_line(
    plane: &mut [Rgba],
    start: usize,
    stride: usize,
    len: usize,
    radius: usize,
    line: &mut Vec<Rgba>,
) {
    line.clear();
    line.extend((0..len).map(|i| plane[start + i * stride]));

    let last = len - 1;
    let at = |i: isize| line[i.clamp(0, last as isize) as usize];
    let r = radius as isize;
    let norm = 1.0 / (2 * radius + 1) as f32;

    let mut acc = [0.0f32; 4];
    for k in -r..=r {
        add(&mut acc, at(k));
    }
    for i in 0..len {
        plane[start + i * stride] = Rgba::from_array(acc.map(|v| v * norm));
        let i = i as isize;
        add(&mut acc, at(i + r + 1));
        sub(&mut acc, at(i - r));
    }
}

fn blur_plane(plane: &mut [Rgba], width: usize, height: usize, radius: usize, line: &mut Vec<Rgba>) {
    for y in 0..height {
        blur_line(plane, y * width, 1, width, radius, line);
    }
    for x in 0..width {
        blur_line(plane, x, width, height, radius, line);
    }
}

/// Ramp glyph for a blurred foreground alpha.
#[inline]
pub fn blur_glyph(alpha: f32) -> char {
    let i = (alpha.max(0.0) * 5.0).floor() as usize;
    BLUR_RAMP[i.min(4)]
}

impl PostEffect for BoxBlur {
    fn name(&self) -> &'static str {
        "box_blur"
    }

    fn apply(&mut self, grid: &mut CellGrid, _dt: f32) {
        if self.radius <= 0 || grid.is_empty() {
            return;
        }
        let radius = self.radius as usize;
        let (w, h) = (grid.width() as usize, grid.height() as usize);
        let planes = grid.planes_mut();
        blur_plane(planes.fg, w, h, radius, &mut self.line);
        blur_plane(planes.bg, w, h, radius, &mut self.line);
        for (ch, fg) in planes.chars.iter_mut().zip(planes.fg.iter()) {
            *ch = blur_glyph(fg.a) as u32;
        }
    }
}
