//! Layout calculation for photo sheets
//!
//! - Grid sizing (how many slots fit on the paper)
//! - Slot placement (outer and inner rectangles in PDF points)

mod grid;
mod types;

pub use grid::*;
pub use types::*;
