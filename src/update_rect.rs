//! Dirty-rectangle accumulator handed to an external renderer.

/// Axis-aligned union of all cells mutated since the last reset.
///
/// The renderer collaborator polls this after each tick batch to learn which
/// region of its world texture needs a redraw. An all-zero rect means "no
/// change", so a lone mutation of the top-left cell is indistinguishable
/// from no mutation at all and gets dropped. Consumers treat the rect as a
/// redraw hint, not a change log, so the encoding stays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateRect {
    pub left: usize,
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
}

impl UpdateRect {
    pub fn new(left: usize, top: usize, right: usize, bottom: usize) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.left + self.top + self.right + self.bottom == 0
    }

    /// Grow the rect to include `(x, y)`.
    pub fn add(&mut self, x: usize, y: usize) {
        if self.is_empty() {
            self.left = x;
            self.top = y;
            self.right = x;
            self.bottom = y;
        } else {
            self.left = self.left.min(x);
            self.top = self.top.min(y);
            self.right = self.right.max(x);
            self.bottom = self.bottom.max(y);
        }
    }

    pub fn width(&self) -> usize {
        self.right - self.left + 1
    }

    pub fn height(&self) -> usize {
        self.bottom - self.top + 1
    }
}
