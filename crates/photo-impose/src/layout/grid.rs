//! Grid layout calculation
//!
//! How many slots fit on a sheet, and where each one is placed.

use crate::constants::mm_to_pt;
use crate::types::{Gap, PaperConfig, SlotConfig};

use super::{GridLayout, GridPosition, Rect, SlotBounds};

// =============================================================================
// Grid Creation
// =============================================================================

/// Count how many slots fit on the paper.
///
/// Never fails: degenerate inputs (slot larger than the usable area,
/// zero-size slots, non-finite values) produce zero rows or columns.
pub fn calculate_grid_layout(paper: &PaperConfig, slot: &SlotConfig) -> GridLayout {
    let cols = fit_count(
        paper.usable_width_mm(),
        slot.width_mm,
        paper.gap.horizontal_mm,
    );
    let rows = fit_count(
        paper.usable_height_mm(),
        slot.height_mm,
        paper.gap.vertical_mm,
    );

    log::debug!(
        "grid for {}x{}mm slots on {}x{}mm paper: {} cols x {} rows",
        slot.width_mm,
        slot.height_mm,
        paper.width_mm,
        paper.height_mm,
        cols,
        rows
    );

    GridLayout::new(rows, cols)
}

/// floor((usable + gap) / (slot + gap)), clamped to zero
fn fit_count(usable_mm: f32, slot_mm: f32, gap_mm: f32) -> usize {
    let denominator = slot_mm as f64 + gap_mm as f64;
    if !denominator.is_finite() || denominator <= 0.0 {
        return 0;
    }

    let quotient = (usable_mm as f64 + gap_mm as f64) / denominator;
    if !quotient.is_finite() || quotient <= 0.0 {
        return 0;
    }

    quotient.floor() as usize
}

/// Length of `count` slots laid side by side with `gap_mm` between them
pub fn grid_extent_mm(count: usize, slot_mm: f32, gap_mm: f32) -> f32 {
    if count == 0 {
        return 0.0;
    }
    count as f32 * slot_mm + (count - 1) as f32 * gap_mm
}

// =============================================================================
// Slot Placement
// =============================================================================

/// Slot positions for one grid, centered inside the paper margins
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPlacement {
    layout: GridLayout,
    paper_height_mm: f32,
    slot: SlotConfig,
    gap: Gap,
    /// Left edge of the grid, from the paper's left edge
    offset_x_mm: f32,
    /// Top edge of the grid, from the paper's top edge
    offset_top_mm: f32,
}

impl GridPlacement {
    pub fn new(paper: &PaperConfig, slot: &SlotConfig, layout: GridLayout) -> Self {
        let grid_w = grid_extent_mm(layout.cols, slot.width_mm, paper.gap.horizontal_mm);
        let grid_h = grid_extent_mm(layout.rows, slot.height_mm, paper.gap.vertical_mm);

        let offset_x_mm = paper.margins.left_mm + (paper.usable_width_mm() - grid_w) / 2.0;
        let offset_top_mm = paper.margins.top_mm + (paper.usable_height_mm() - grid_h) / 2.0;

        Self {
            layout,
            paper_height_mm: paper.height_mm,
            slot: *slot,
            gap: paper.gap,
            offset_x_mm,
            offset_top_mm,
        }
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    /// Outer and inner rectangles of the slot at `pos`, in PDF points
    pub fn slot_bounds(&self, pos: GridPosition) -> SlotBounds {
        let w = self.slot.width_mm;
        let h = self.slot.height_mm;

        let x_mm = self.offset_x_mm + pos.col as f32 * (w + self.gap.horizontal_mm);
        let bottom_from_top_mm =
            self.offset_top_mm + (pos.row + 1) as f32 * h + pos.row as f32 * self.gap.vertical_mm;
        let y_mm = self.paper_height_mm - bottom_from_top_mm;

        let outer = Rect::new(mm_to_pt(x_mm), mm_to_pt(y_mm), mm_to_pt(w), mm_to_pt(h));
        let m = &self.slot.margins;
        let inner = outer.inset(
            mm_to_pt(m.left_mm),
            mm_to_pt(m.bottom_mm),
            mm_to_pt(m.right_mm),
            mm_to_pt(m.top_mm),
        );

        SlotBounds { outer, inner }
    }

    /// Bounds of the slot at a sheet-local index
    pub fn slot_bounds_at(&self, index: usize) -> Option<SlotBounds> {
        self.layout.position(index).map(|pos| self.slot_bounds(pos))
    }
}
