#![forbid(unsafe_code)]

//! Glow around bright cells.
//!
//! Pass one finds every cell whose luminance `max(fg_lum, bg_lum)` exceeds
//! the threshold and records its intensity
//! `(lum - threshold) / (1 - threshold + EPSILON)`. Pass two adds
//! `intensity * strength * (1 - dist² / radius²)` to the fg and bg RGB of
//! each neighbour inside the circular radius. Bright cells are all found
//! before anything is written, so glows never feed into each other; a cell
//! does not glow onto itself.

use termgrid_render::CellGrid;

use crate::PostEffect;

/// Keeps the intensity finite when the threshold is 1.
pub const EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bright {
    x: i32,
    y: i32,
    intensity: f32,
}

/// Additive glow around cells brighter than `threshold`.
#[derive(Debug, Clone)]
pub struct Bloom {
    pub threshold: f32,
    pub strength: f32,
    pub radius: i32,
    bright: Vec<Bright>,
}

impl Bloom {
    pub fn new(threshold: f32, strength: f32, radius: i32) -> Self {
        Self {
            threshold,
            strength,
            radius,
            bright: Vec::new(),
        }
    }
}

impl Default for Bloom {
    fn default() -> Self {
        Self::new(0.8, 0.2, 2)
    }
}

impl PostEffect for Bloom {
    fn name(&self) -> &'static str {
        "bloom"
    }

    fn apply(&mut self, grid: &mut CellGrid, _dt: f32) {
        if self.radius <= 0 || grid.is_empty() {
            return;
        }
        let (w, h) = (grid.width() as i32, grid.height() as i32);

        self.bright.clear();
        let span = 1.0 - self.threshold + EPSILON;
        for (i, (fg, bg)) in grid.fg().iter().zip(grid.bg()).enumerate() {
            let lum = fg.luminance().max(bg.luminance());
            if lum > self.threshold {
                let i = i as i32;
                self.bright.push(Bright {
                    x: i % w,
                    y: i / w,
                    intensity: (lum - self.threshold) / span,
                });
            }
        }
        if self.bright.is_empty() {
            return;
        }
        termgrid_core::trace!(bright = self.bright.len(), "bloom sources");

        let r = self.radius;
        let radius_sq = (r * r) as f32;
        let planes = grid.planes_mut();
        for b in &self.bright {
            for dy in -r..=r {
                let y = b.y + dy;
                if !(0..h).contains(&y) {
                    continue;
                }
                for dx in -r..=r {
                    let x = b.x + dx;
                    if (dx == 0 && dy == 0) || !(0..w).contains(&x) {
                        continue;
                    }
                    let dist_sq = (dx * dx + dy * dy) as f32;
                    if dist_sq > radius_sq {
                        continue;
                    }
                    let amount = b.intensity * self.strength * (1.0 - dist_sq / radius_sq);
                    let i = (y * w + x) as usize;
                    planes.fg[i] = planes.fg[i].map_rgb(|v| (v + amount).min(1.0));
                    planes.bg[i] = planes.bg[i].map_rgb(|v| (v + amount).min(1.0));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use termgrid_render::{Rgba, TextAttributes};

    fn dark(w: u32, h: u32) -> CellGrid {
        let mut g = CellGrid::new(w, h, false);
        g.fill(' ' as u32, Rgba::BLACK, Rgba::BLACK, TextAttributes::empty());
        g
    }

    #[test]
    fn glow_falls_off_with_distance() {
        let mut g = dark(7, 7);
        g.write(24, '*' as u32, Rgba::WHITE, Rgba::BLACK, TextAttributes::empty());
        Bloom::new(0.5, 1.0, 2).apply(&mut g, 0.0);

        // The source keeps its own color.
        assert_eq!(g.cell(3, 3).unwrap().fg, Rgba::WHITE);
        assert_eq!(g.cell(3, 3).unwrap().bg, Rgba::BLACK);

        let near = g.cell(4, 3).unwrap().bg.r;
        let far = g.cell(5, 3).unwrap().bg.r;
        let diag = g.cell(4, 4).unwrap().bg.r;
        assert!(near > diag && diag > far);
        // dist² == radius² gives zero falloff; beyond the circle nothing.
        assert_eq!(far, 0.0);
        assert_eq!(g.cell(5, 5).unwrap().bg.r, 0.0);
        assert_eq!(g.cell(0, 0).unwrap().bg.r, 0.0);
    }

    #[test]
    fn glow_amount_matches_formula() {
        let mut g = dark(3, 1);
        g.write(0, '*' as u32, Rgba::WHITE, Rgba::BLACK, TextAttributes::empty());
        Bloom::new(0.0, 0.5, 2).apply(&mut g, 0.0);
        let lum = Rgba::WHITE.luminance();
        let intensity = lum / (1.0 + EPSILON);
        let expected = intensity * 0.5 * (1.0 - 1.0 / 4.0);
        assert!((g.fg()[1].r - expected).abs() < 1e-6);
        assert_eq!(g.fg()[1].a, 1.0);
    }

    #[test]
    fn sources_do_not_compound() {
        // Two adjacent bright cells: each receives only the other's glow,
        // computed from original luminance.
        let mut g = dark(2, 1);
        let c = Rgba::rgb(0.6, 0.6, 0.6);
        g.write(0, '*' as u32, c, Rgba::BLACK, TextAttributes::empty());
        g.write(1, '*' as u32, c, Rgba::BLACK, TextAttributes::empty());
        Bloom::new(0.5, 1.0, 2).apply(&mut g, 0.0);
        assert_eq!(g.fg()[0], g.fg()[1]);
        assert!(g.fg()[0].r > 0.6);
    }

    #[test]
    fn zero_radius_is_noop() {
        let mut g = dark(3, 3);
        g.write(4, '*' as u32, Rgba::WHITE, Rgba::WHITE, TextAttributes::empty());
        let before = g.clone();
        Bloom::new(0.1, 1.0, 0).apply(&mut g, 0.0);
        assert_eq!(g, before);
    }

    mod property {
        use super::*;

        proptest! {
            #[test]
            fn nothing_above_threshold_is_noop(
                levels in proptest::collection::vec((0u8..=100, 0u8..=100), 16),
                radius in 1i32..4,
            ) {
                let mut g = CellGrid::new(4, 4, false);
                for (i, (f, b)) in levels.iter().enumerate() {
                    let fg = Rgba::rgb(f32::from(*f) / 200.0, 0.0, 0.0);
                    let bg = Rgba::rgb(0.0, f32::from(*b) / 200.0, 0.0);
                    g.write(i, ' ' as u32, fg, bg, TextAttributes::empty());
                }
                let before = g.clone();
                Bloom::new(0.6, 1.0, radius).apply(&mut g, 0.0);
                prop_assert_eq!(g, before);
            }
        }
    }
}
