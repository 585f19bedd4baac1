use photo_impose::*;
use proptest::prelude::*;

fn paper(width_mm: f32, height_mm: f32, margin: f32, gap: f32) -> PaperConfig {
    PaperConfig {
        width_mm,
        height_mm,
        margins: Margins::uniform(margin),
        gap: Gap::uniform(gap),
    }
}

#[test]
fn test_a4_portrait_square_slots() {
    let grid = calculate_grid_layout(&paper(210.0, 297.0, 10.0, 5.0), &SlotConfig::new(50.0, 50.0));
    assert_eq!(grid.cols, 3);
    assert_eq!(grid.rows, 5);
    assert_eq!(grid.total_slots, 15);
}

#[test]
fn test_default_options_grid() {
    // 297 x 210 landscape, margins 10, gap 3, 30 x 40 slots
    let grid = ImpositionOptions::default().grid();
    assert_eq!(grid.cols, 8);
    assert_eq!(grid.rows, 4);
}

#[test]
fn test_zero_gap_exact_fit() {
    let grid = calculate_grid_layout(&paper(100.0, 100.0, 0.0, 0.0), &SlotConfig::new(25.0, 50.0));
    assert_eq!(grid, GridLayout::new(2, 4));
}

#[test]
fn test_paper_presets() {
    assert_eq!(PaperSize::A4.dimensions_mm(), (210.0, 297.0));
    assert_eq!(
        PaperSize::A4.dimensions_with_orientation(Orientation::Landscape),
        (297.0, 210.0)
    );
    assert_eq!(
        PaperSize::Custom {
            width_mm: 300.0,
            height_mm: 100.0
        }
        .dimensions_with_orientation(Orientation::Portrait),
        (100.0, 300.0)
    );
}

#[test]
fn test_length_units() {
    assert_eq!(LengthUnit::Centimeters.to_mm(3.5), 35.0);
    assert!((LengthUnit::Inches.to_mm(1.0) - 25.4).abs() < 1e-5);
    assert!((LengthUnit::Inches.from_mm(50.8) - 2.0).abs() < 1e-5);
    assert_eq!(LengthUnit::Millimeters.name(), "mm");
}

#[test]
fn test_microscopic_slot_saturates() {
    let options = ImpositionOptions {
        paper: paper(210.0, 297.0, 0.0, 0.0),
        slot: SlotConfig::new(1e-20, 1e-20),
        ..Default::default()
    };
    let grid = options.grid();
    assert_eq!(grid.cols, usize::MAX);
    assert_eq!(grid.total_slots, usize::MAX);

    let stats = calculate_statistics(&options, 3);
    assert_eq!(stats.sheets, 1);
    assert_eq!(stats.empty_slots, usize::MAX - 3);
}

#[test]
fn test_grid_position_from_index() {
    assert_eq!(GridPosition::from_index(7, 3), GridPosition::new(2, 1));
    let grid = GridLayout::new(2, 3);
    assert_eq!(grid.position(5), Some(GridPosition::new(1, 2)));
    assert_eq!(grid.position(6), None);
}

proptest! {
    /// Property: rows and cols never go negative and never overflow the paper.
    #[test]
    fn prop_grid_fits_on_paper(
        paper_w in 1.0f32..1000.0,
        paper_h in 1.0f32..1000.0,
        margin in 0.0f32..100.0,
        gap in 0.0f32..20.0,
        slot_w in 0.5f32..300.0,
        slot_h in 0.5f32..300.0,
    ) {
        let paper = paper(paper_w, paper_h, margin, gap);
        let slot = SlotConfig::new(slot_w, slot_h);
        let grid = calculate_grid_layout(&paper, &slot);

        prop_assert_eq!(grid.total_slots, grid.rows * grid.cols);

        let usable_w = paper_w - 2.0 * margin;
        let usable_h = paper_h - 2.0 * margin;
        if slot_w > usable_w {
            prop_assert_eq!(grid.cols, 0);
        }
        if slot_h > usable_h {
            prop_assert_eq!(grid.rows, 0);
        }

        let used_w = grid.cols as f32 * slot_w + grid.cols.saturating_sub(1) as f32 * gap;
        prop_assert!(used_w <= usable_w.max(0.0) + 1e-2);
        let used_h = grid.rows as f32 * slot_h + grid.rows.saturating_sub(1) as f32 * gap;
        prop_assert!(used_h <= usable_h.max(0.0) + 1e-2);
    }

    /// Property: non-finite input never panics and yields an empty grid axis.
    #[test]
    fn prop_non_finite_slot_is_empty(slot_h in 1.0f32..100.0) {
        let grid = calculate_grid_layout(
            &paper(210.0, 297.0, 10.0, 5.0),
            &SlotConfig::new(f32::INFINITY, slot_h),
        );
        prop_assert_eq!(grid.cols, 0);
        prop_assert_eq!(grid.total_slots, 0);
    }
}
