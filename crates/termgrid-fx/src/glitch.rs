#![forbid(unsafe_code)]

//! Time-driven row glitches.
//!
//! # State machine
//!
//! ```text
//!            roll < chance * dt
//!   Idle ─────────────────────────▶ Bursting { remaining, lines }
//!    ▲                                   │
//!    └──────── remaining <= 0 ───────────┘
//! ```
//!
//! While idle, each tick rolls for a new burst. A burst picks a random
//! duration and `1..=max_glitch_lines` distinct rows, each with a
//! [`GlitchKind`]. While bursting, every tick decays the timer and reapplies
//! the row glitches to the freshly composed frame; the tick on which the
//! timer runs out leaves the frame alone.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use termgrid_render::{CellGrid, Rgba, TextAttributes};

use crate::PostEffect;

/// Tuning for [`Distortion`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlitchConfig {
    /// Expected bursts per second while idle.
    pub glitch_chance_per_second: f32,
    /// Upper bound on rows affected by one burst.
    pub max_glitch_lines: u32,
    /// Burst duration range, seconds.
    pub min_glitch_duration: f32,
    pub max_glitch_duration: f32,
    /// Largest horizontal shift, in cells, either direction.
    pub max_shift_amount: i32,
    /// Share of shifts among non-color glitches; the rest are flips.
    pub shift_flip_ratio: f32,
    /// Probability that a glitched row is a color glitch.
    pub color_glitch_chance: f32,
}

impl Default for GlitchConfig {
    fn default() -> Self {
        Self {
            glitch_chance_per_second: 0.5,
            max_glitch_lines: 3,
            min_glitch_duration: 0.05,
            max_glitch_duration: 0.2,
            max_shift_amount: 10,
            shift_flip_ratio: 0.6,
            color_glitch_chance: 0.2,
        }
    }
}

/// What happens to one glitched row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlitchKind {
    /// Rotate the row by this many cells (positive moves right).
    Shift(i32),
    /// Mirror the row.
    Flip,
    /// Recolor a random span.
    Color,
}

/// Color generators for [`GlitchKind::Color`] rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlitchPalette {
    /// Independent random fg and bg.
    Random,
    /// Magenta, cyan, or yellow accents over a dark tint of the same hue.
    ChannelEmphasis,
    /// A random color and its inverse.
    HighContrast,
}

impl GlitchPalette {
    const ALL: [Self; 3] = [Self::Random, Self::ChannelEmphasis, Self::HighContrast];

    /// Produce an `(fg, bg)` pair.
    fn colors(self, rng: &mut StdRng) -> (Rgba, Rgba) {
        match self {
            Self::Random => (random_rgb(rng), random_rgb(rng)),
            Self::ChannelEmphasis => {
                let accents = [Rgba::MAGENTA, Rgba::CYAN, Rgba::YELLOW];
                let accent = accents[rng.random_range(0..accents.len())];
                let level = rng.random_range(0.6..=1.0f32);
                let shade = rng.random_range(0.1..=0.3f32);
                (accent.map_rgb(|v| v * level), accent.map_rgb(|v| v * shade))
            }
            Self::HighContrast => {
                let c = random_rgb(rng);
                (c, c.map_rgb(|v| 1.0 - v))
            }
        }
    }
}

fn random_rgb(rng: &mut StdRng) -> Rgba {
    Rgba::rgb(rng.random(), rng.random(), rng.random())
}

/// One glitched row within a burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlitchLine {
    pub row: u32,
    pub kind: GlitchKind,
}

#[derive(Debug, Clone, PartialEq)]
enum GlitchState {
    Idle,
    Bursting {
        remaining: f32,
        lines: Vec<GlitchLine>,
    },
}

/// Row scratch for shift and flip.
#[derive(Debug, Clone, Default)]
struct RowScratch {
    chars: Vec<u32>,
    fg: Vec<Rgba>,
    bg: Vec<Rgba>,
    attributes: Vec<TextAttributes>,
}

/// Stateful glitch filter. Call [`apply`](PostEffect::apply) once per frame
/// with the frame delta.
#[derive(Debug, Clone)]
pub struct Distortion {
    config: GlitchConfig,
    state: GlitchState,
    rng: StdRng,
    scratch: RowScratch,
}

impl Distortion {
    /// OS-seeded glitches.
    pub fn new(config: GlitchConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Deterministic glitches for tests and replays.
    pub fn with_seed(config: GlitchConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: GlitchConfig, rng: StdRng) -> Self {
        Self {
            config,
            state: GlitchState::Idle,
            rng,
            scratch: RowScratch::default(),
        }
    }

    #[inline]
    pub fn config(&self) -> &GlitchConfig {
        &self.config
    }

    #[inline]
    pub fn set_config(&mut self, config: GlitchConfig) {
        self.config = config;
    }

    #[inline]
    pub fn is_bursting(&self) -> bool {
        matches!(self.state, GlitchState::Bursting { .. })
    }

    /// Seconds left in the current burst, if any.
    pub fn remaining(&self) -> Option<f32> {
        match self.state {
            GlitchState::Bursting { remaining, .. } => Some(remaining),
            GlitchState::Idle => None,
        }
    }

    /// Rows glitched by the current burst.
    pub fn active_lines(&self) -> &[GlitchLine] {
        match &self.state {
            GlitchState::Bursting { lines, .. } => lines,
            GlitchState::Idle => &[],
        }
    }

    /// End any burst in progress.
    pub fn reset(&mut self) {
        self.state = GlitchState::Idle;
    }

    /// Advance the state machine by `dt`. Returns `true` when the frame should
    /// be glitched.
    fn tick(&mut self, dt: f32, height: u32) -> bool {
        if let GlitchState::Bursting { remaining, .. } = &mut self.state {
            *remaining -= dt;
            if *remaining <= 0.0 {
                self.state = GlitchState::Idle;
                termgrid_core::trace!("glitch burst ended");
                return false;
            }
            return true;
        }

        let chance = self.config.glitch_chance_per_second * dt;
        if height == 0 || self.rng.random::<f32>() >= chance {
            return false;
        }
        self.start_burst(height);
        true
    }

    fn start_burst(&mut self, height: u32) {
        let cfg = self.config;
        let (lo, hi) = if cfg.min_glitch_duration <= cfg.max_glitch_duration {
            (cfg.min_glitch_duration, cfg.max_glitch_duration)
        } else {
            (cfg.max_glitch_duration, cfg.min_glitch_duration)
        };
        let duration = lo + (hi - lo) * self.rng.random::<f32>();

        let count = self.rng.random_range(1..=cfg.max_glitch_lines.max(1));
        let mut lines: Vec<GlitchLine> = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let row = self.rng.random_range(0..height);
            if lines.iter().any(|l| l.row == row) {
                continue;
            }
            let kind = if self.rng.random::<f32>() < cfg.color_glitch_chance {
                GlitchKind::Color
            } else if self.rng.random::<f32>() < cfg.shift_flip_ratio {
                let max = cfg.max_shift_amount.abs();
                GlitchKind::Shift(self.rng.random_range(-max..=max))
            } else {
                GlitchKind::Flip
            };
            lines.push(GlitchLine { row, kind });
        }

        termgrid_core::debug!(duration, lines = lines.len(), "glitch burst started");
        self.state = GlitchState::Bursting {
            remaining: duration,
            lines,
        };
    }

    fn permute_row(&mut self, grid: &mut CellGrid, row: u32, kind: GlitchKind) {
        let Some(range) = grid.row_range(row) else {
            return;
        };
        let w = range.len();
        let planes = grid.planes_mut();
        let s = &mut self.scratch;
        s.chars.clear();
        s.chars.extend_from_slice(&planes.chars[range.clone()]);
        s.fg.clear();
        s.fg.extend_from_slice(&planes.fg[range.clone()]);
        s.bg.clear();
        s.bg.extend_from_slice(&planes.bg[range.clone()]);
        s.attributes.clear();
        s.attributes.extend_from_slice(&planes.attributes[range.clone()]);

        for x in 0..w {
            let from = match kind {
                GlitchKind::Shift(shift) => (x as i64 - i64::from(shift)).rem_euclid(w as i64) as usize,
                GlitchKind::Flip => w - 1 - x,
                GlitchKind::Color => x,
            };
            let i = range.start + x;
            planes.chars[i] = s.chars[from];
            planes.fg[i] = s.fg[from];
            planes.bg[i] = s.bg[from];
            planes.attributes[i] = s.attributes[from];
        }
    }

    fn recolor_row(&mut self, grid: &mut CellGrid, row: u32) {
        let Some(range) = grid.row_range(row) else {
            return;
        };
        let w = range.len();
        if w == 0 {
            return;
        }
        let start = self.rng.random_range(0..w);
        let len = self.rng.random_range(1..=w - start);
        let palette = GlitchPalette::ALL[self.rng.random_range(0..GlitchPalette::ALL.len())];

        let planes = grid.planes_mut();
        for i in range.start + start..range.start + start + len {
            let (fg, bg) = palette.colors(&mut self.rng);
            planes.fg[i] = fg.with_alpha(planes.fg[i].a);
            planes.bg[i] = bg.with_alpha(planes.bg[i].a);
        }
    }
}

impl Default for Distortion {
    fn default() -> Self {
        Self::new(GlitchConfig::default())
    }
}

impl PostEffect for Distortion {
    fn name(&self) -> &'static str {
        "distortion"
    }

    fn apply(&mut self, grid: &mut CellGrid, dt: f32) {
        if !self.tick(dt, grid.height()) {
            return;
        }
        let lines = self.active_lines().to_vec();
        for line in lines {
            match line.kind {
                GlitchKind::Color => self.recolor_row(grid, line.row),
                kind => self.permute_row(grid, line.row, kind),
            }
        }
    }
}
