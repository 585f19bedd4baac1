//! Registration mark rendering
//!
//! Generates PDF content stream operations for the L-shaped cut marks drawn
//! at the four corners of every occupied slot.

use crate::constants::mm_to_pt;
use crate::layout::Rect;
use crate::types::RegistrationMarks;

/// Corner marks around `outer` as content stream operations.
///
/// Each corner is shifted diagonally by the configured offset (positive moves
/// it away from the slot) and both arms point away from the slot.
pub fn generate_registration_marks(outer: &Rect, marks: &RegistrationMarks) -> String {
    if !marks.enabled {
        return String::new();
    }

    let len = mm_to_pt(marks.length_mm);
    let offset = mm_to_pt(marks.corner_offset_mm);
    let (r, g, b) = marks.color.unit_components();

    let left = outer.x - offset;
    let right = outer.right() + offset;
    let bottom = outer.y - offset;
    let top = outer.top() + offset;

    let mut ops = String::new();

    // Save graphics state
    ops.push_str("q\n");
    ops.push_str(&format!("{} {} {} RG\n", r, g, b));
    ops.push_str(&format!("{} w\n", marks.thickness_pt));
    ops.push_str("[] 0 d\n");

    // (corner x, corner y, horizontal direction, vertical direction)
    let corners = [
        (left, top, -1.0, 1.0),
        (right, top, 1.0, 1.0),
        (left, bottom, -1.0, -1.0),
        (right, bottom, 1.0, -1.0),
    ];
    for (x, y, dx, dy) in corners {
        ops.push_str(&draw_corner(x, y, dx * len, dy * len));
    }

    // Restore graphics state
    ops.push_str("Q\n");

    ops
}

/// One L: a horizontal arm and a vertical arm meeting at (x, y)
fn draw_corner(x: f32, y: f32, arm_x: f32, arm_y: f32) -> String {
    format!(
        "{} {} m {} {} l S\n{} {} m {} {} l S\n",
        x + arm_x,
        y,
        x,
        y,
        x,
        y,
        x,
        y + arm_y
    )
}
