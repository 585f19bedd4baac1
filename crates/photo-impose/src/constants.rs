//! Shared constants for photo imposition
//!
//! Unit conversions and the fixed defaults used by layout, normalization
//! and PDF output.

// =============================================================================
// Unit Conversion
// =============================================================================

/// Points per millimeter, fixed so output coordinates are reproducible
pub const POINTS_PER_MM: f32 = 2.83465;

/// Millimeters per inch
pub const MM_PER_INCH: f64 = 25.4;

/// Convert millimeters to points
#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

/// Convert a physical length to pixels at `dpi`, never below one pixel
#[inline]
pub fn mm_to_px(mm: f64, dpi: u32) -> u32 {
    let px = (mm / MM_PER_INCH * dpi as f64).round();
    if px.is_finite() && px >= 1.0 {
        px as u32
    } else {
        1
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// Default raster resolution for working images
pub const DEFAULT_DPI: u32 = 300;

/// Smallest inner slot dimension used for pixel targets
pub const MIN_INNER_MM: f64 = 0.1;

/// Default JPEG quality for lossy working rasters
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

// =============================================================================
// Crop Editor
// =============================================================================

/// Zoom factor of the default cover-fit view
pub const MIN_ZOOM: f64 = 1.0;

/// Upper zoom bound
pub const MAX_ZOOM: f64 = 10.0;

// =============================================================================
// Registration Marks
// =============================================================================

/// Default arm length of each corner mark (mm)
pub const DEFAULT_MARK_LENGTH_MM: f32 = 6.0;

/// Default stroke width of corner marks (points)
pub const DEFAULT_MARK_THICKNESS_PT: f32 = 0.7;

// =============================================================================
// Footer
// =============================================================================

/// Footer font size (points)
pub const FOOTER_FONT_SIZE: f32 = 15.0;

/// Footer baseline position from the left edge (mm)
pub const FOOTER_X_MM: f32 = 10.0;

/// Footer baseline position from the bottom edge (mm)
pub const FOOTER_Y_MM: f32 = 7.0;

// =============================================================================
// Export Queue
// =============================================================================

/// Subdirectory holding one JSON metadata file per queued job
pub const QUEUE_META_DIR: &str = "queue-meta";

/// Subdirectory holding one PDF payload per queued job
pub const QUEUE_BLOB_DIR: &str = "queue-blobs";
