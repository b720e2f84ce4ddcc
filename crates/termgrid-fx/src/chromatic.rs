#![forbid(unsafe_code)]

//! Radial chromatic aberration on the foreground plane.

use termgrid_render::{CellGrid, Rgba};

use crate::PostEffect;

/// Split fg red and blue horizontally, more strongly away from the center.
///
/// For a cell at distance `d` from the grid center the offset is
/// `round(strength * d / max(cx, cy))`. Red is sampled `offset` cells to the
/// left, blue `offset` cells to the right, both clamped to the row. Green
/// and alpha stay put. Backgrounds are untouched.
#[derive(Debug, Clone, Default)]
pub struct ChromaticAberration {
    pub strength: f32,
    scratch: Vec<Rgba>,
}

impl ChromaticAberration {
    pub fn new(strength: f32) -> Self {
        Self {
            strength,
            scratch: Vec::new(),
        }
    }
}

impl PostEffect for ChromaticAberration {
    fn name(&self) -> &'static str {
        "chromatic_aberration"
    }

    fn apply(&mut self, grid: &mut CellGrid, _dt: f32) {
        let (w, h) = (grid.width(), grid.height());
        if w == 0 || h == 0 || self.strength == 0.0 {
            return;
        }
        let cx = w as f32 / 2.0;
        let cy = h as f32 / 2.0;
        let max_dim = cx.max(cy);

        self.scratch.clear();
        self.scratch.extend_from_slice(grid.fg());
        let src = &self.scratch;
        let fg = grid.planes_mut().fg;

        let last = w as i64 - 1;
        for y in 0..h {
            let row = y as usize * w as usize;
            let dy = y as f32 - cy;
            for x in 0..w {
                let dx = x as f32 - cx;
                let dist = (dx * dx + dy * dy).sqrt();
                let offset = (self.strength * dist / max_dim).round() as i64;
                let red_x = (i64::from(x) - offset).clamp(0, last) as usize;
                let blue_x = (i64::from(x) + offset).clamp(0, last) as usize;

                let i = row + x as usize;
                let own = src[i];
                fg[i] = Rgba::new(src[row + red_x].r, own.g, src[row + blue_x].b, own.a);
            }
        }
    }
}
