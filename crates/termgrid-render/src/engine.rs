#![forbid(unsafe_code)]

//! Render engine adapter.
//!
//! A [`RenderEngine`] owns the lifecycle of cell-grid storage and presents
//! finished frames. Buffers never allocate planes themselves; they ask their
//! engine, and hand the grid back on destroy.
//!
//! Engines are shared between buffers via `Rc<dyn RenderEngine>`, so every
//! method takes `&self`. All calls happen on the frame-render thread;
//! implementations use `Cell`/`RefCell` for bookkeeping.
//!
//! [`HeapEngine`] is the in-process implementation: plain `Vec` planes, a cell
//! budget, and a record of the last flushed frame for hosts and tests.

use core::cell::{Cell, RefCell};
use std::collections::HashSet;

use crate::color::Rgba;
use crate::diff::DamageRun;
use crate::error::EngineError;
use crate::grid::CellGrid;

/// One frame handed to [`RenderEngine::flush`].
#[derive(Debug, Clone, Copy)]
pub struct FlushFrame<'a> {
    /// The finished frame.
    pub grid: &'a CellGrid,
    /// Repaint everything; `runs` is then informational.
    pub full: bool,
    /// Changed cells since the previous frame, row-major.
    pub runs: &'a [DamageRun],
    /// Terminal background for cells with transparent bg.
    pub background: Rgba,
}

impl FlushFrame<'_> {
    /// Cells the engine needs to write for this frame.
    pub fn cells_to_write(&self) -> usize {
        if self.full {
            self.grid.len()
        } else {
            self.runs.iter().map(|r| r.len() as usize).sum()
        }
    }
}

/// Storage and presentation service behind every buffer.
pub trait RenderEngine {
    /// Short engine name for diagnostics.
    fn name(&self) -> &'static str;

    /// Allocate a grid with default cells.
    fn allocate(
        &self,
        width: u32,
        height: u32,
        respect_alpha: bool,
    ) -> Result<CellGrid, EngineError>;

    /// Resize `grid` in place, keeping the overlapping region.
    fn resize(&self, grid: &mut CellGrid, width: u32, height: u32) -> Result<(), EngineError>;

    /// Take back a grid's storage.
    fn release(&self, grid: CellGrid);

    /// Present a finished frame.
    fn flush(&self, frame: &FlushFrame<'_>) -> Result<(), EngineError>;
}

/// Record of the most recent [`HeapEngine::flush`].
#[derive(Debug, Clone)]
pub struct FlushedFrame {
    pub width: u32,
    pub height: u32,
    pub full: bool,
    pub runs: Vec<DamageRun>,
    pub background: Rgba,
    pub cells_written: usize,
    pub grid: CellGrid,
}

/// Counters kept by [`HeapEngine`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Grids allocated and not yet released.
    pub live_grids: usize,
    pub allocations: u64,
    pub releases: u64,
    pub flushes: u64,
}

/// In-process engine backed by heap vectors.
///
/// Every allocated grid carries a fresh handle; `resize` and `flush` reject
/// grids whose handle was never issued or has been released.
#[derive(Debug)]
pub struct HeapEngine {
    max_cells: u64,
    next_handle: Cell<u64>,
    live: RefCell<HashSet<u64>>,
    stats: Cell<EngineStats>,
    last_flush: RefCell<Option<FlushedFrame>>,
}

impl HeapEngine {
    /// Default cell budget per grid (2048 x 2048).
    pub const DEFAULT_MAX_CELLS: u64 = 4_194_304;

    pub fn new() -> Self {
        Self::with_max_cells(Self::DEFAULT_MAX_CELLS)
    }

    /// Engine refusing grids larger than `max_cells`.
    pub fn with_max_cells(max_cells: u64) -> Self {
        Self {
            max_cells,
            next_handle: Cell::new(1),
            live: RefCell::new(HashSet::new()),
            stats: Cell::new(EngineStats::default()),
            last_flush: RefCell::new(None),
        }
    }

    #[inline]
    pub fn max_cells(&self) -> u64 {
        self.max_cells
    }

    #[inline]
    pub fn stats(&self) -> EngineStats {
        self.stats.get()
    }

    /// Clone of the last flushed frame, if any.
    pub fn last_flush(&self) -> Option<FlushedFrame> {
        self.last_flush.borrow().clone()
    }

    /// Take the last flushed frame, leaving `None`.
    pub fn take_last_flush(&self) -> Option<FlushedFrame> {
        self.last_flush.borrow_mut().take()
    }

    fn check_size(&self, width: u32, height: u32) -> Result<(), EngineError> {
        if u64::from(width) * u64::from(height) > self.max_cells {
            return Err(EngineError::AllocationTooLarge {
                width,
                height,
                limit: self.max_cells,
            });
        }
        Ok(())
    }

    fn check_live(&self, grid: &CellGrid) -> Result<(), EngineError> {
        if self.live.borrow().contains(&grid.handle()) {
            Ok(())
        } else {
            Err(EngineError::Released)
        }
    }

    fn update(&self, f: impl FnOnce(&mut EngineStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }
}

impl Default for HeapEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderEngine for HeapEngine {
    fn name(&self) -> &'static str {
        "heap"
    }

    fn allocate(
        &self,
        width: u32,
        height: u32,
        respect_alpha: bool,
    ) -> Result<CellGrid, EngineError> {
        self.check_size(width, height)?;
        let handle = self.next_handle.get();
        self.next_handle.set(handle + 1);
        self.live.borrow_mut().insert(handle);
        self.update(|s| {
            s.live_grids += 1;
            s.allocations += 1;
        });
        tracing::debug!(handle, width, height, respect_alpha, "engine allocated grid");
        Ok(CellGrid::new(width, height, respect_alpha).with_handle(handle))
    }

    fn resize(&self, grid: &mut CellGrid, width: u32, height: u32) -> Result<(), EngineError> {
        self.check_live(grid)?;
        self.check_size(width, height)?;
        grid.resize(width, height);
        tracing::debug!(width, height, "engine resized grid");
        Ok(())
    }

    fn release(&self, grid: CellGrid) {
        if !self.live.borrow_mut().remove(&grid.handle()) {
            tracing::warn!(handle = grid.handle(), "release of unknown grid ignored");
            return;
        }
        self.update(|s| {
            s.live_grids = s.live_grids.saturating_sub(1);
            s.releases += 1;
        });
        tracing::debug!(
            handle = grid.handle(),
            width = grid.width(),
            height = grid.height(),
            "engine released grid"
        );
    }

    fn flush(&self, frame: &FlushFrame<'_>) -> Result<(), EngineError> {
        self.check_live(frame.grid)?;
        let cells_written = frame.cells_to_write();
        self.update(|s| s.flushes += 1);
        tracing::debug!(
            width = frame.grid.width(),
            height = frame.grid.height(),
            full = frame.full,
            runs = frame.runs.len(),
            cells_written,
            "frame flushed"
        );
        *self.last_flush.borrow_mut() = Some(FlushedFrame {
            width: frame.grid.width(),
            height: frame.grid.height(),
            full: frame.full,
            runs: frame.runs.to_vec(),
            background: frame.background,
            cells_written,
            grid: frame.grid.clone(),
        });
        Ok(())
    }
}
