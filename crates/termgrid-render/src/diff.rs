#![forbid(unsafe_code)]

//! Damage computation between two cell grids.
//!
//! # Algorithm
//!
//! Row-major scan over all four planes:
//! 1. Iterate y from 0 to height
//! 2. Iterate x from 0 to width
//! 3. Compare old and new cells bit for bit (colors via `Rgba::bits_eq`)
//! 4. Record the position if different
//!
//! Positions come out sorted by `(y, x)`, so [`GridDiff::runs`] can coalesce
//! them into [`DamageRun`]s in one pass without sorting.
//!
//! # Usage
//!
//! ```
//! use termgrid_render::{CellGrid, Rgba, TextAttributes};
//! use termgrid_render::diff::GridDiff;
//!
//! let old = CellGrid::new(80, 24, false);
//! let mut new = old.clone();
//! new.write(5, 'X' as u32, Rgba::WHITE, Rgba::BLACK, TextAttributes::empty());
//! new.write(6, 'Y' as u32, Rgba::WHITE, Rgba::BLACK, TextAttributes::empty());
//!
//! let diff = GridDiff::compute(&old, &new);
//! assert_eq!(diff.len(), 2);
//! assert_eq!(diff.runs().len(), 1);
//! ```

use crate::grid::CellGrid;

/// A contiguous run of changed cells on one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DamageRun {
    /// Row index.
    pub y: u32,
    /// Start column (inclusive).
    pub x0: u32,
    /// End column (inclusive).
    pub x1: u32,
}

impl DamageRun {
    #[inline]
    pub const fn new(y: u32, x0: u32, x1: u32) -> Self {
        debug_assert!(x0 <= x1);
        Self { y, x0, x1 }
    }

    /// Number of cells in this run.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.x1 - self.x0 + 1
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.x1 < self.x0
    }
}

/// Changed cell positions between two grids.
#[derive(Debug, Clone, Default)]
pub struct GridDiff {
    changes: Vec<(u32, u32)>,
}

impl GridDiff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the diff between two grids.
    ///
    /// When the dimensions differ every cell of `new` counts as changed.
    pub fn compute(old: &CellGrid, new: &CellGrid) -> Self {
        let _span = tracing::trace_span!(
            "grid_diff",
            width = new.width(),
            height = new.height()
        )
        .entered();

        if old.width() != new.width() || old.height() != new.height() {
            return Self::full(new);
        }

        let width = new.width();
        let height = new.height();
        let mut changes = Vec::with_capacity(new.len() / 20);

        for y in 0..height {
            let row = y as usize * width as usize;
            for x in 0..width {
                let i = row + x as usize;
                if !old.cell_bits_eq(i, new, i) {
                    changes.push((x, y));
                }
            }
        }

        tracing::trace!(changes = changes.len(), "diff computed");
        Self { changes }
    }

    /// A diff marking every cell of `grid` as changed.
    pub fn full(grid: &CellGrid) -> Self {
        let mut changes = Vec::with_capacity(grid.len());
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                changes.push((x, y));
            }
        }
        Self { changes }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Changed `(x, y)` positions in row-major order.
    #[inline]
    pub fn changes(&self) -> &[(u32, u32)] {
        &self.changes
    }

    /// Coalesce consecutive columns on the same row into runs.
    pub fn runs(&self) -> Vec<DamageRun> {
        let mut runs = Vec::new();
        let mut i = 0;

        while i < self.changes.len() {
            let (x0, y) = self.changes[i];
            let mut x1 = x0;
            i += 1;

            while i < self.changes.len() {
                let (x, yy) = self.changes[i];
                if yy != y || x != x1 + 1 {
                    break;
                }
                x1 = x;
                i += 1;
            }

            runs.push(DamageRun::new(y, x0, x1));
        }

        runs
    }

    pub fn clear(&mut self) {
        self.changes.clear();
    }
}
