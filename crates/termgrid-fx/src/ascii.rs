#![forbid(unsafe_code)]

//! Luminance-to-glyph mapping.

use termgrid_render::CellGrid;

use crate::PostEffect;

/// Default ramp, darkest first.
pub const DEFAULT_RAMP: &str = " .:-=+*#%@";

/// Replace each cell's character with a ramp glyph picked by bg luminance.
///
/// The index is `floor(lum * ramp.len())`, clamped to the last glyph. Colors
/// are left alone. An empty ramp does nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsciiArt {
    ramp: Vec<char>,
}

impl AsciiArt {
    pub fn new(ramp: &str) -> Self {
        Self {
            ramp: ramp.chars().collect(),
        }
    }

    #[inline]
    pub fn ramp(&self) -> &[char] {
        &self.ramp
    }

    /// Glyph for a luminance value.
    pub fn glyph(&self, lum: f32) -> Option<char> {
        let last = self.ramp.len().checked_sub(1)?;
        let i = (lum.max(0.0) * self.ramp.len() as f32).floor() as usize;
        Some(self.ramp[i.min(last)])
    }
}

impl Default for AsciiArt {
    fn default() -> Self {
        Self::new(DEFAULT_RAMP)
    }
}

impl PostEffect for AsciiArt {
    fn name(&self) -> &'static str {
        "ascii_art"
    }

    fn apply(&mut self, grid: &mut CellGrid, _dt: f32) {
        if self.ramp.is_empty() {
            return;
        }
        let planes = grid.planes_mut();
        for (ch, bg) in planes.chars.iter_mut().zip(planes.bg.iter()) {
            if let Some(glyph) = self.glyph(bg.luminance()) {
                *ch = glyph as u32;
            }
        }
    }
}
