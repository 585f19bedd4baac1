use serde::Serialize;

use crate::layout::{GridLayout, grid_extent_mm};
use crate::options::ImpositionOptions;

/// Summary of how a job uses the paper
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutStatistics {
    pub grid: GridLayout,
    /// Width of the slot grid as printed (mm)
    pub printed_width_mm: f32,
    /// Height of the slot grid as printed (mm)
    pub printed_height_mm: f32,
    /// Share of the paper area covered by slots, 0-100
    pub paper_usage_percent: f32,
    pub images: usize,
    pub sheets: usize,
    /// Unused slots across all sheets
    pub empty_slots: usize,
}

/// Calculate statistics for `images` photos with the given options
pub fn calculate_statistics(options: &ImpositionOptions, images: usize) -> LayoutStatistics {
    let grid = options.grid();
    let paper = &options.paper;
    let slot = &options.slot;

    let printed_width_mm = grid_extent_mm(grid.cols, slot.width_mm, paper.gap.horizontal_mm);
    let printed_height_mm = grid_extent_mm(grid.rows, slot.height_mm, paper.gap.vertical_mm);

    let paper_area = paper.width_mm * paper.height_mm;
    let slot_area = grid.total_slots as f32 * slot.width_mm * slot.height_mm;
    let paper_usage_percent = if paper_area > 0.0 {
        slot_area / paper_area * 100.0
    } else {
        0.0
    };

    let (sheets, empty_slots) = if grid.total_slots == 0 {
        (0, 0)
    } else {
        let sheets = images.div_ceil(grid.total_slots).max(1);
        (sheets, sheets * grid.total_slots - images)
    };

    LayoutStatistics {
        grid,
        printed_width_mm,
        printed_height_mm,
        paper_usage_percent,
        images,
        sheets,
        empty_slots,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Gap, Margins, PaperConfig, SlotConfig};

    fn options() -> ImpositionOptions {
        ImpositionOptions {
            paper: PaperConfig {
                width_mm: 210.0,
                height_mm: 297.0,
                margins: Margins::uniform(10.0),
                gap: Gap::uniform(5.0),
            },
            slot: SlotConfig::new(50.0, 50.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_statistics() {
        let stats = calculate_statistics(&options(), 20);
        assert_eq!(stats.grid.total_slots, 15);
        assert_eq!(stats.printed_width_mm, 160.0);
        assert_eq!(stats.printed_height_mm, 270.0);
        assert_eq!(stats.sheets, 2);
        assert_eq!(stats.empty_slots, 10);
        let expected = 15.0 * 2500.0 / (210.0 * 297.0) * 100.0;
        assert!((stats.paper_usage_percent - expected).abs() < 0.01);
    }

    #[test]
    fn test_no_images_still_one_sheet() {
        let stats = calculate_statistics(&options(), 0);
        assert_eq!(stats.sheets, 1);
        assert_eq!(stats.empty_slots, 15);
    }

    #[test]
    fn test_nothing_fits() {
        let mut opts = options();
        opts.slot = SlotConfig::new(500.0, 500.0);
        let stats = calculate_statistics(&opts, 3);
        assert_eq!(stats.sheets, 0);
        assert_eq!(stats.paper_usage_percent, 0.0);
    }
}
