pub mod board;
pub mod compose;
pub mod constants;
pub mod editor;
pub mod layout;
mod marks;
pub mod normalize;
mod options;
pub mod paginate;
pub mod queue;
mod render;
mod stats;
mod types;

pub use board::SlotBoard;
pub use compose::{compose_document, compose_pdf, compose_pdf_bytes, count_pages, save_pdf};
pub use editor::{CropSession, SlotState};
pub use layout::{GridLayout, GridPosition, Rect, SlotBounds, calculate_grid_layout};
pub use normalize::{
    BatchOutcome, CropRecord, EncodedRaster, NormalizeFailure, SlotImage, SourceImage,
    TargetArea, normalize_batch, normalize_image,
};
pub use options::*;
pub use paginate::{Sheet, paginate};
pub use queue::{ExportQueue, MoveDirection, QueueRecord};
pub use stats::{LayoutStatistics, calculate_statistics};
pub use types::*;
