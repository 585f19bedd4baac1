//! Image normalization
//!
//! Turns arbitrary uploaded photos into working rasters that match a slot:
//! - Step A: rotate a quarter turn clockwise when the photo's orientation
//!   disagrees with the slot's
//! - Step B: centered cover-fit crop, resampled to the slot's pixel size
//!
//! The oriented photo is kept as the slot's original so later crops start
//! from full quality.

mod crop;
mod encode;

pub use crop::*;
pub use encode::*;

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, GenericImageView, ImageReader};

use crate::types::{ImposeError, Orientation, RasterFormat, Result, SlotConfig};

// =============================================================================
// Types
// =============================================================================

/// Raw uploaded file
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Display name, usually the file name
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceImage {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// A photo placed in a slot
#[derive(Debug, Clone)]
pub struct SlotImage {
    pub name: String,
    /// Oriented source at full resolution, never modified
    pub original: Arc<DynamicImage>,
    /// `original` is the upload turned a quarter clockwise
    pub quarter_turned: bool,
    /// What gets printed
    pub working: EncodedRaster,
    /// How `working` was derived from `original`
    pub crop: CropRecord,
}

/// A file from a batch that could not be normalized
#[derive(Debug)]
pub struct NormalizeFailure {
    pub name: String,
    pub error: ImposeError,
}

/// Result of normalizing a batch, both lists in input order
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub images: Vec<SlotImage>,
    pub failures: Vec<NormalizeFailure>,
}

// =============================================================================
// Single Image
// =============================================================================

/// Decode PNG/JPEG (or any format the `image` crate recognizes) from memory
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImposeError::Decode(e.to_string()))?;
    if reader.format().is_none() {
        return Err(ImposeError::Decode("unrecognized image data".to_string()));
    }
    reader
        .decode()
        .map_err(|e| ImposeError::Decode(e.to_string()))
}

/// Rotate 90° clockwise when the image and slot orientations differ.
///
/// A square image counts as landscape, so it turns for a portrait slot.
pub fn orient_to_slot(image: DynamicImage, slot: &SlotConfig) -> (DynamicImage, bool) {
    if needs_quarter_turn(image.dimensions(), slot) {
        (image.rotate90(), true)
    } else {
        (image, false)
    }
}

fn needs_quarter_turn((w, h): (u32, u32), slot: &SlotConfig) -> bool {
    Orientation::of(w as f64, h as f64) != slot.orientation()
}

/// Orient an already placed image for a different slot.
///
/// Gives the same raster a fresh upload would get, without decoding again.
pub fn reorient_for_slot(
    original: &Arc<DynamicImage>,
    quarter_turned: bool,
    slot: &SlotConfig,
) -> (Arc<DynamicImage>, bool) {
    let (w, h) = original.dimensions();
    let upload_dims = if quarter_turned { (h, w) } else { (w, h) };
    let turn = needs_quarter_turn(upload_dims, slot);

    match (quarter_turned, turn) {
        (false, false) | (true, true) => (original.clone(), quarter_turned),
        (true, false) => (Arc::new(original.rotate270()), false),
        (false, true) => (Arc::new(original.rotate90()), true),
    }
}

/// Cover-fit an already oriented image into `target`
pub fn auto_crop(
    original: Arc<DynamicImage>,
    quarter_turned: bool,
    name: String,
    target: TargetArea,
    format: RasterFormat,
) -> Result<SlotImage> {
    let (w, h) = original.dimensions();
    let crop = CropRecord::cover(w, h, target);
    let working = render_crop(&original, &crop, target, format)?;
    Ok(SlotImage {
        name,
        original,
        quarter_turned,
        working,
        crop,
    })
}

/// Decode, orient and cover-fit one photo for `slot` at `dpi`.
pub fn normalize_image(
    source: &SourceImage,
    slot: &SlotConfig,
    dpi: u32,
    format: RasterFormat,
) -> Result<SlotImage> {
    let decoded = decode_image(&source.bytes)?;
    let (oriented, rotated) = orient_to_slot(decoded, slot);
    let target = TargetArea::for_slot(slot, dpi);

    log::debug!(
        "normalizing {} ({}x{}, rotated: {}) to {}x{} px",
        source.name,
        oriented.width(),
        oriented.height(),
        rotated,
        target.width_px,
        target.height_px
    );

    auto_crop(Arc::new(oriented), rotated, source.name.clone(), target, format)
}

// =============================================================================
// Batch
// =============================================================================

/// Normalize every file in parallel on blocking tasks.
///
/// A failing file does not stop the rest; it is reported in
/// [`BatchOutcome::failures`] and produces no image.
pub async fn normalize_batch(
    sources: Vec<SourceImage>,
    slot: SlotConfig,
    dpi: u32,
    format: RasterFormat,
) -> BatchOutcome {
    let handles: Vec<_> = sources
        .into_iter()
        .map(|source| {
            let name = source.name.clone();
            let handle = tokio::task::spawn_blocking(move || {
                normalize_image(&source, &slot, dpi, format)
            });
            (name, handle)
        })
        .collect();

    let mut outcome = BatchOutcome::default();
    for (name, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(ImposeError::from(e)),
        };
        match result {
            Ok(image) => outcome.images.push(image),
            Err(error) => {
                log::warn!("skipping {}: {}", name, error);
                outcome.failures.push(NormalizeFailure { name, error });
            }
        }
    }

    log::info!(
        "normalized {} image(s), {} failure(s)",
        outcome.images.len(),
        outcome.failures.len()
    );
    outcome
}
