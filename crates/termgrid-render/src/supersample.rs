#![forbid(unsafe_code)]

//! Draw raw pixel data at twice the cell resolution using quadrant glyphs.
//!
//! Each cell covers a 2x2 pixel block. The four pixels are split around their
//! mean luminance: brighter-than-mean pixels form the glyph (foreground, the
//! average of those pixels), the rest form the background. The glyph is the
//! quadrant block whose filled quarters match the bright pixels.

use crate::attrs::TextAttributes;
use crate::buffer::OptimizedBuffer;
use crate::color::Rgba;
use crate::error::Result;

/// Byte layout of one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PixelFormat {
    #[default]
    Rgba = 0,
    Rgb = 1,
    Bgra = 2,
    Bgr = 3,
}

impl PixelFormat {
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba | Self::Bgra => 4,
            Self::Rgb | Self::Bgr => 3,
        }
    }

    /// Decode the pixel starting at `px[0]`.
    #[inline]
    fn decode(self, px: &[u8]) -> Rgba {
        match self {
            Self::Rgba => Rgba::from_ints(px[0], px[1], px[2], px[3]),
            Self::Rgb => Rgba::from_ints(px[0], px[1], px[2], 255),
            Self::Bgra => Rgba::from_ints(px[2], px[1], px[0], px[3]),
            Self::Bgr => Rgba::from_ints(px[2], px[1], px[0], 255),
        }
    }
}

/// Quadrant glyphs indexed by mask: top-left 1, top-right 2, bottom-left 4,
/// bottom-right 8.
pub const QUADRANT_GLYPHS: [char; 16] = [
    ' ', '▘', '▝', '▀', '▖', '▌', '▞', '▛', '▗', '▚', '▐', '▜', '▄', '▙', '▟', '█',
];

/// Glyph, fg, and bg for one 2x2 block `[tl, tr, bl, br]`.
pub fn quadrant_cell(block: [Rgba; 4]) -> (char, Rgba, Rgba) {
    let lum = block.map(Rgba::luminance);
    let mean = lum.iter().sum::<f32>() / 4.0;

    // Margin keeps rounding in `mean` from lighting up a uniform block.
    let mut mask = 0usize;
    for (bit, l) in lum.iter().enumerate() {
        if *l > mean + 1e-6 {
            mask |= 1 << bit;
        }
    }

    if mask == 0 {
        let avg = average(block.iter().copied());
        return (' ', avg, avg);
    }
    let on = average((0..4).filter(|b| mask & (1 << b) != 0).map(|b| block[b]));
    let off = average((0..4).filter(|b| mask & (1 << b) == 0).map(|b| block[b]));
    (QUADRANT_GLYPHS[mask], on, off)
}

fn average(colors: impl Iterator<Item = Rgba>) -> Rgba {
    let mut sum = [0.0f32; 4];
    let mut n = 0u32;
    for c in colors {
        for (s, v) in sum.iter_mut().zip(c.to_array()) {
            *s += v;
        }
        n += 1;
    }
    if n == 0 {
        return Rgba::TRANSPARENT;
    }
    Rgba::from_array(sum.map(|s| s / n as f32))
}

impl OptimizedBuffer {
    /// Draw `pixels` with the top-left block at cell `(x, y)`.
    ///
    /// `bytes_per_row` is the row stride, which may exceed
    /// `width * bytes_per_pixel` for aligned data. Trailing odd pixel rows or
    /// columns are skipped. Cells are written through the blending path.
    pub fn draw_super_sample_buffer(
        &mut self,
        x: i32,
        y: i32,
        pixels: &[u8],
        format: PixelFormat,
        bytes_per_row: usize,
    ) -> Result<()> {
        let mut canvas = self.canvas()?;
        let bpp = format.bytes_per_pixel();
        if bytes_per_row < bpp * 2 {
            return Ok(());
        }
        let px_w = bytes_per_row / bpp;
        let px_h = pixels.len() / bytes_per_row;
        let cols = px_w / 2;
        let rows = px_h / 2;

        let _span = tracing::trace_span!("draw_super_sample_buffer", cols, rows).entered();

        let pixel = |px: usize, py: usize| {
            let at = py * bytes_per_row + px * bpp;
            format.decode(&pixels[at..at + bpp])
        };

        for cy in 0..rows {
            let Some(dy) = i32::try_from(cy).ok().and_then(|c| y.checked_add(c)) else {
                break;
            };
            for cx in 0..cols {
                let Some(dx) = i32::try_from(cx).ok().and_then(|c| x.checked_add(c)) else {
                    break;
                };
                if !canvas.clip.contains(dx, dy) {
                    continue;
                }
                let (px, py) = (cx * 2, cy * 2);
                let block = [
                    pixel(px, py),
                    pixel(px + 1, py),
                    pixel(px, py + 1),
                    pixel(px + 1, py + 1),
                ];
                let (ch, fg, bg) = quadrant_cell(block);
                canvas.put_blended(dx, dy, ch as u32, fg, bg, TextAttributes::empty());
            }
        }
        Ok(())
    }
}
