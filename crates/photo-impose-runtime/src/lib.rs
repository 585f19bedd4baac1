use std::path::PathBuf;

mod session;

pub use session::{Session, session_task};

// Re-export types from the library crate
pub use photo_impose::{
    CropRecord, GridLayout, ImpositionOptions, LayoutStatistics, MoveDirection, QueueRecord,
    SourceImage,
};

/// Commands sent from the caller to the session worker
#[derive(Debug)]
pub enum SessionCommand {
    /// Replace the options; settled images are re-cropped when the target changes
    SetOptions {
        options: ImpositionOptions,
    },
    AddImages {
        sources: Vec<SourceImage>,
    },
    FillSlot {
        index: usize,
        source: SourceImage,
    },
    RemoveSlot {
        index: usize,
    },
    ClearSlots,
    OpenEditor {
        index: usize,
    },
    EditCrop {
        index: usize,
        edit: CropEdit,
    },
    ConfirmCrop {
        index: usize,
    },
    CancelCrop {
        index: usize,
    },
    CalculateStats,
    /// Compose the current board and write it to disk
    Export {
        output_path: PathBuf,
    },
    /// Compose the current board and append it to the export queue
    AddToQueue {
        name: String,
    },
    QueueRemove {
        id: String,
    },
    QueueMove {
        id: String,
        direction: MoveDirection,
    },
    QueueClear,
    QueueExportAll {
        output_path: PathBuf,
    },
}

/// One adjustment inside the crop editor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropEdit {
    RotateLeft,
    RotateRight,
    FlipHorizontal,
    FlipVertical,
    SetZoom(f64),
    ZoomBy(f64),
    /// Move the crop window, in source pixels
    Pan { dx: f64, dy: f64 },
    Reset,
}

/// Updates sent from the session worker to the caller
#[derive(Debug, Clone)]
pub enum SessionUpdate {
    Ready {
        queue: Vec<QueueRecord>,
    },
    Progress {
        operation: String,
        current: usize,
        total: usize,
    },
    OptionsApplied {
        grid: GridLayout,
    },
    ImagesAdded {
        placed: Vec<usize>,
        /// File name and reason for every file that was skipped
        failures: Vec<(String, String)>,
    },
    SlotsChanged {
        slot_count: usize,
        image_count: usize,
    },
    EditorOpened {
        index: usize,
    },
    CropAdjusted {
        index: usize,
        record: CropRecord,
        zoom: f64,
    },
    CropConfirmed {
        index: usize,
        record: CropRecord,
    },
    EditorClosed {
        index: usize,
    },
    StatsCalculated {
        stats: LayoutStatistics,
    },
    ExportComplete {
        path: PathBuf,
        page_count: usize,
    },
    Queued {
        record: QueueRecord,
    },
    QueueChanged {
        items: Vec<QueueRecord>,
    },
    QueueExported {
        path: PathBuf,
        page_count: usize,
    },
    /// Nothing to merge
    QueueEmpty,
    Error {
        message: String,
    },
}
