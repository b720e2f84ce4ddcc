#![forbid(unsafe_code)]

//! Per-cell color filters.
//!
//! All of these touch RGB only; alpha is left as it was.

use termgrid_render::{CellGrid, Rgba};

use crate::PostEffect;

/// Run `f` over every fg and bg color.
fn map_colors(grid: &mut CellGrid, f: impl Fn(Rgba) -> Rgba) {
    let planes = grid.planes_mut();
    for c in planes.fg.iter_mut().chain(planes.bg.iter_mut()) {
        *c = f(*c);
    }
}

// ---------------------------------------------------------------------------
// Scanlines
// ---------------------------------------------------------------------------

/// Darken the background of every `step`-th row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scanlines {
    /// Multiplier for the affected rows' bg RGB.
    pub strength: f32,
    /// Row period. Rows with `y % step == 0` are affected.
    pub step: u32,
}

impl Scanlines {
    pub fn new(strength: f32, step: u32) -> Self {
        Self { strength, step }
    }
}

impl Default for Scanlines {
    fn default() -> Self {
        Self::new(0.8, 2)
    }
}

impl PostEffect for Scanlines {
    fn name(&self) -> &'static str {
        "scanlines"
    }

    fn apply(&mut self, grid: &mut CellGrid, _dt: f32) {
        let step = self.step.max(1);
        let strength = self.strength;
        let width = grid.width() as usize;
        let height = grid.height();
        let bg = grid.planes_mut().bg;
        for y in (0..height).step_by(step as usize) {
            let start = y as usize * width;
            for c in &mut bg[start..start + width] {
                *c = c.map_rgb(|v| v * strength);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Grayscale / Sepia / Invert
// ---------------------------------------------------------------------------

/// Replace RGB with luminance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Grayscale;

impl PostEffect for Grayscale {
    fn name(&self) -> &'static str {
        "grayscale"
    }

    fn apply(&mut self, grid: &mut CellGrid, _dt: f32) {
        map_colors(grid, |c| {
            let lum = c.luminance();
            c.map_rgb(|_| lum)
        });
    }
}

/// Classic sepia tone matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sepia;

/// Apply the sepia matrix to one color, clamping each channel to 1.
pub fn sepia(c: Rgba) -> Rgba {
    let Rgba { r, g, b, a } = c;
    Rgba::new(
        (0.393 * r + 0.769 * g + 0.189 * b).min(1.0),
        (0.349 * r + 0.686 * g + 0.168 * b).min(1.0),
        (0.272 * r + 0.534 * g + 0.131 * b).min(1.0),
        a,
    )
}

impl PostEffect for Sepia {
    fn name(&self) -> &'static str {
        "sepia"
    }

    fn apply(&mut self, grid: &mut CellGrid, _dt: f32) {
        map_colors(grid, sepia);
    }
}

/// `1 - channel` on RGB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Invert;

impl PostEffect for Invert {
    fn name(&self) -> &'static str {
        "invert"
    }

    fn apply(&mut self, grid: &mut CellGrid, _dt: f32) {
        map_colors(grid, |c| c.map_rgb(|v| 1.0 - v));
    }
}

// ---------------------------------------------------------------------------
// Brightness
// ---------------------------------------------------------------------------

/// Scale RGB by a factor, clamped to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brightness {
    pub factor: f32,
}

impl Brightness {
    pub fn new(factor: f32) -> Self {
        Self { factor }
    }
}

impl Default for Brightness {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl PostEffect for Brightness {
    fn name(&self) -> &'static str {
        "brightness"
    }

    fn apply(&mut self, grid: &mut CellGrid, _dt: f32) {
        if self.factor == 1.0 {
            return;
        }
        let factor = self.factor;
        map_colors(grid, |c| c.map_rgb(|v| (v * factor).min(1.0)));
    }
}
