#![forbid(unsafe_code)]

//! Random brightness noise.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use termgrid_render::CellGrid;

use crate::PostEffect;

/// Add one random delta in `[-strength/2, strength/2)` to the RGB of both fg
/// and bg of each cell, clamped to `[0, 1]`. A fresh delta is drawn per cell
/// on every call.
#[derive(Debug, Clone)]
pub struct Noise {
    pub strength: f32,
    rng: StdRng,
}

impl Noise {
    /// OS-seeded noise.
    pub fn new(strength: f32) -> Self {
        Self {
            strength,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic noise for tests and replays.
    pub fn with_seed(strength: f32, seed: u64) -> Self {
        Self {
            strength,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl PostEffect for Noise {
    fn name(&self) -> &'static str {
        "noise"
    }

    fn apply(&mut self, grid: &mut CellGrid, _dt: f32) {
        let strength = self.strength;
        let planes = grid.planes_mut();
        for (fg, bg) in planes.fg.iter_mut().zip(planes.bg.iter_mut()) {
            let delta = (self.rng.random::<f32>() - 0.5) * strength;
            *fg = fg.map_rgb(|v| (v + delta).clamp(0.0, 1.0));
            *bg = bg.map_rgb(|v| (v + delta).clamp(0.0, 1.0));
        }
    }
}
