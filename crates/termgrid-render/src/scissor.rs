#![forbid(unsafe_code)]

//! Per-buffer scissor stack.

use smallvec::SmallVec;
use termgrid_core::geometry::Rect;

/// Stack of clip rectangles. Each entry is already intersected with the one
/// below it, so the top is the effective clip.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScissorStack {
    stack: SmallVec<[Rect; 4]>,
}

impl ScissorStack {
    /// Push `rect`, intersected with the current top (or `bounds` when empty).
    pub(crate) fn push(&mut self, rect: Rect, bounds: Rect) {
        let current = self.top().unwrap_or(bounds);
        self.stack.push(current.intersection(&rect));
    }

    /// Pop the top entry. No-op on an empty stack.
    pub(crate) fn pop(&mut self) -> Option<Rect> {
        self.stack.pop()
    }

    pub(crate) fn clear(&mut self) {
        self.stack.clear();
    }

    #[inline]
    pub(crate) fn top(&self) -> Option<Rect> {
        self.stack.last().copied()
    }

    #[inline]
    pub(crate) fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Effective drawable region: `bounds` intersected with the top entry.
    #[inline]
    pub(crate) fn clip(&self, bounds: Rect) -> Rect {
        match self.top() {
            Some(top) => top.intersection(&bounds),
            None => bounds,
        }
    }
}
