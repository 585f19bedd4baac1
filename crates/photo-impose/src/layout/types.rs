//! Layout data types
//!
//! A grid is derived from paper and slot settings and never persisted.
//! Rectangles are in PDF points with the origin at the bottom-left corner.

use serde::Serialize;

/// Rows and columns of slots that fit on one sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GridLayout {
    /// Number of slot rows
    pub rows: usize,
    /// Number of slot columns
    pub cols: usize,
    /// rows × cols, saturating
    pub total_slots: usize,
}

impl GridLayout {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            total_slots: rows.saturating_mul(cols),
        }
    }

    /// True when not a single slot fits on the sheet
    pub fn is_empty(&self) -> bool {
        self.total_slots == 0
    }

    /// Grid position of the slot at a sheet-local index
    pub fn position(&self, index: usize) -> Option<GridPosition> {
        if index < self.total_slots {
            Some(GridPosition::from_index(index, self.cols))
        } else {
            None
        }
    }
}

/// Position within the grid (row, column)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPosition {
    /// Row index (0 = top row)
    pub row: usize,
    /// Column index (0 = leftmost column)
    pub col: usize,
}

impl GridPosition {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Row-major position of a flat index in a grid `cols` wide
    pub fn from_index(index: usize, cols: usize) -> Self {
        if cols == 0 {
            return Self::new(0, 0);
        }
        Self::new(index / cols, index % cols)
    }
}

/// A rectangular area in points
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// X position (left edge)
    pub x: f32,
    /// Y position (bottom edge)
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge x coordinate
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Top edge y coordinate
    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    /// Shrink by per-side insets; width and height never go below zero
    pub fn inset(&self, left: f32, bottom: f32, right: f32, top: f32) -> Rect {
        Rect {
            x: self.x + left,
            y: self.y + bottom,
            width: (self.width - left - right).max(0.0),
            height: (self.height - bottom - top).max(0.0),
        }
    }
}

/// Where one slot lands on the sheet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotBounds {
    /// Full slot area; registration marks sit on its corners
    pub outer: Rect,
    /// Image area after the slot's own margins
    pub inner: Rect,
}
