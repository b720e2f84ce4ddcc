#![forbid(unsafe_code)]

//! Radial darkening toward the edges.
//!
//! The per-cell base attenuation `min(1, dist² / max_dist²)` depends only on
//! the grid size, so it is computed once per `(width, height)` and reused
//! until the size changes. Each frame then scales colors by
//! `max(0, 1 - base * strength)`, so `strength` can change freely without
//! touching the cache.

use termgrid_render::CellGrid;

use crate::PostEffect;

#[derive(Debug, Clone, Default)]
struct AttenuationCache {
    size: (u32, u32),
    base: Vec<f32>,
}

/// Darken fg and bg RGB by distance from the grid center.
#[derive(Debug, Clone, Default)]
pub struct Vignette {
    pub strength: f32,
    cache: AttenuationCache,
    computations: u64,
}

impl Vignette {
    pub fn new(strength: f32) -> Self {
        Self {
            strength,
            ..Self::default()
        }
    }

    /// How many times the attenuation table has been built.
    #[inline]
    pub fn cache_computations(&self) -> u64 {
        self.computations
    }

    fn ensure_cache(&mut self, width: u32, height: u32) {
        if self.cache.size == (width, height) && self.cache.base.len() == (width * height) as usize
        {
            return;
        }
        let cx = width as f32 / 2.0;
        let cy = height as f32 / 2.0;
        let max_dist_sq = cx * cx + cy * cy;

        self.cache.size = (width, height);
        self.cache.base.clear();
        self.cache.base.reserve(width as usize * height as usize);
        for y in 0..height {
            let dy = y as f32 - cy;
            for x in 0..width {
                let dx = x as f32 - cx;
                let base = if max_dist_sq > 0.0 {
                    ((dx * dx + dy * dy) / max_dist_sq).min(1.0)
                } else {
                    0.0
                };
                self.cache.base.push(base);
            }
        }
        self.computations += 1;
        termgrid_core::debug!(width, height, "vignette attenuation rebuilt");
    }
}

impl PostEffect for Vignette {
    fn name(&self) -> &'static str {
        "vignette"
    }

    fn apply(&mut self, grid: &mut CellGrid, _dt: f32) {
        if grid.is_empty() {
            return;
        }
        self.ensure_cache(grid.width(), grid.height());
        let strength = self.strength;
        let planes = grid.planes_mut();
        let cells = planes.fg.iter_mut().zip(planes.bg.iter_mut());
        for ((fg, bg), base) in cells.zip(&self.cache.base) {
            let factor = (1.0 - base * strength).max(0.0);
            *fg = fg.map_rgb(|v| v * factor);
            *bg = bg.map_rgb(|v| v * factor);
        }
    }
}
