//! Cover-fit cropping and crop-record replay.
//!
//! Pixel coordinates have their origin at the top-left corner of the image.
//! A crop record always describes a rectangle in the space of the oriented
//! source *after* the record's own rotation and flips have been applied.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};

use crate::constants::{MIN_INNER_MM, mm_to_px};
use crate::types::{ImposeError, RasterFormat, Result, SlotConfig};

use super::encode::{EncodedRaster, encode_raster};

/// Resampling filter for working rasters
const RESAMPLE_FILTER: FilterType = FilterType::CatmullRom;

// =============================================================================
// Target Area
// =============================================================================

/// Pixel size of a slot's image area at a given resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetArea {
    pub width_px: u32,
    pub height_px: u32,
}

impl TargetArea {
    /// Inner slot size (slot minus its margins, at least 0.1 mm per axis)
    /// converted to pixels at `dpi`.
    pub fn for_slot(slot: &SlotConfig, dpi: u32) -> Self {
        let inner_w = (slot.width_mm as f64 - slot.margins.horizontal() as f64).max(MIN_INNER_MM);
        let inner_h = (slot.height_mm as f64 - slot.margins.vertical() as f64).max(MIN_INNER_MM);
        Self {
            width_px: mm_to_px(sanitize(inner_w), dpi),
            height_px: mm_to_px(sanitize(inner_h), dpi),
        }
    }

    pub fn new(width_px: u32, height_px: u32) -> Self {
        Self {
            width_px: width_px.max(1),
            height_px: height_px.max(1),
        }
    }

    /// width / height
    pub fn aspect(&self) -> f64 {
        self.width_px as f64 / self.height_px as f64
    }
}

fn sanitize(mm: f64) -> f64 {
    if mm.is_finite() { mm } else { MIN_INNER_MM }
}

// =============================================================================
// Crop Record
// =============================================================================

/// Everything needed to regenerate a working raster from its original
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRecord {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Clockwise rotation in degrees, a multiple of 90
    pub rotation: i32,
    /// -1 mirrors horizontally
    pub scale_x: f32,
    /// -1 mirrors vertically
    pub scale_y: f32,
    /// Oriented source width before the record's own rotation
    pub natural_width: u32,
    /// Oriented source height before the record's own rotation
    pub natural_height: u32,
}

impl CropRecord {
    /// Centered cover-fit crop of a `src_w` × `src_h` image, no rotation or flips
    pub fn cover(src_w: u32, src_h: u32, target: TargetArea) -> Self {
        let (x, y, width, height) = cover_crop_rect(src_w, src_h, target.aspect());
        Self {
            x,
            y,
            width,
            height,
            rotation: 0,
            scale_x: 1.0,
            scale_y: 1.0,
            natural_width: src_w,
            natural_height: src_h,
        }
    }

    /// Rotation reduced to 0, 90, 180 or 270
    pub fn normalized_rotation(&self) -> Result<u32> {
        if self.rotation % 90 != 0 {
            return Err(ImposeError::Validation(format!(
                "crop rotation must be a multiple of 90 degrees (got {})",
                self.rotation
            )));
        }
        Ok(self.rotation.rem_euclid(360) as u32)
    }

    pub fn flip_horizontal(&self) -> bool {
        self.scale_x < 0.0
    }

    pub fn flip_vertical(&self) -> bool {
        self.scale_y < 0.0
    }
}

/// Largest centered rectangle of aspect `target_aspect` inside the source.
///
/// Returns `(x, y, width, height)`, always at least 1×1 and within bounds.
pub fn cover_crop_rect(src_w: u32, src_h: u32, target_aspect: f64) -> (u32, u32, u32, u32) {
    let src_w = src_w.max(1);
    let src_h = src_h.max(1);
    let source_aspect = src_w as f64 / src_h as f64;

    if source_aspect > target_aspect {
        let width = ((src_h as f64 * target_aspect).round() as u32).clamp(1, src_w);
        let x = ((src_w - width) as f64 / 2.0).round() as u32;
        (x.min(src_w - width), 0, width, src_h)
    } else {
        let height = ((src_w as f64 / target_aspect).round() as u32).clamp(1, src_h);
        let y = ((src_h - height) as f64 / 2.0).round() as u32;
        (0, y.min(src_h - height), src_w, height)
    }
}

// =============================================================================
// Transform and Replay
// =============================================================================

/// Apply a quarter-turn rotation (clockwise) then the requested flips
pub fn transform_image(
    image: &DynamicImage,
    rotation: u32,
    flip_h: bool,
    flip_v: bool,
) -> DynamicImage {
    let mut out = match rotation {
        90 => image.rotate90(),
        180 => image.rotate180(),
        270 => image.rotate270(),
        _ => image.clone(),
    };
    if flip_h {
        out = out.fliph();
    }
    if flip_v {
        out = out.flipv();
    }
    out
}

/// Cut `(x, y, width, height)` out of `image` and resample it to the target size
pub fn render_crop(
    image: &DynamicImage,
    record: &CropRecord,
    target: TargetArea,
    format: RasterFormat,
) -> Result<EncodedRaster> {
    let cropped = image.crop_imm(record.x, record.y, record.width, record.height);
    let resized = cropped.resize_exact(target.width_px, target.height_px, RESAMPLE_FILTER);
    encode_raster(&resized, format)
}

/// Regenerate a working raster from the oriented original and a crop record.
///
/// Fails with a validation error when the record does not fit the original.
pub fn apply_crop_record(
    original: &DynamicImage,
    record: &CropRecord,
    target: TargetArea,
    format: RasterFormat,
) -> Result<EncodedRaster> {
    let rotation = record.normalized_rotation()?;

    let (natural_w, natural_h) = original.dimensions();
    if (natural_w, natural_h) != (record.natural_width, record.natural_height) {
        return Err(ImposeError::Validation(format!(
            "crop record was made for a {}x{} image, got {}x{}",
            record.natural_width, record.natural_height, natural_w, natural_h
        )));
    }

    let (space_w, space_h) = if rotation % 180 == 0 {
        (natural_w, natural_h)
    } else {
        (natural_h, natural_w)
    };
    let fits = record.width > 0
        && record.height > 0
        && record.x as u64 + record.width as u64 <= space_w as u64
        && record.y as u64 + record.height as u64 <= space_h as u64;
    if !fits {
        return Err(ImposeError::Validation(format!(
            "crop {}x{}+{}+{} falls outside the {}x{} image",
            record.width, record.height, record.x, record.y, space_w, space_h
        )));
    }

    let transformed = transform_image(
        original,
        rotation,
        record.flip_horizontal(),
        record.flip_vertical(),
    );
    render_crop(&transformed, record, target, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Margins;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_target_area_at_300_dpi() {
        let target = TargetArea::for_slot(&SlotConfig::new(100.0, 60.0), 300);
        assert_eq!(target.width_px, 1181);
        assert_eq!(target.height_px, 709);
    }

    #[test]
    fn test_target_area_respects_margins_and_floor() {
        let mut slot = SlotConfig::new(10.0, 10.0);
        slot.margins = Margins::uniform(6.0);
        let target = TargetArea::for_slot(&slot, 300);
        // Both axes clamp to 0.1 mm, which rounds to 1 px at 300 dpi
        assert_eq!(target.width_px, 1);
        assert_eq!(target.height_px, 1);
    }

    #[test]
    fn test_cover_crop_wide_source() {
        // 2:1 source into a square target: crop the middle
        assert_eq!(cover_crop_rect(200, 100, 1.0), (50, 0, 100, 100));
    }

    #[test]
    fn test_cover_crop_tall_source() {
        assert_eq!(cover_crop_rect(100, 300, 1.0), (0, 100, 100, 100));
    }

    #[test]
    fn test_cover_crop_same_aspect() {
        assert_eq!(cover_crop_rect(300, 200, 1.5), (0, 0, 300, 200));
    }

    #[test]
    fn test_rotation_must_be_quarter_turn() {
        let mut record = CropRecord::cover(10, 10, TargetArea::new(1, 1));
        record.rotation = 45;
        assert!(matches!(
            record.normalized_rotation(),
            Err(ImposeError::Validation(_))
        ));
        record.rotation = -90;
        assert_eq!(record.normalized_rotation().unwrap(), 270);
    }

    #[test]
    fn test_replay_rejects_out_of_bounds() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 20, Rgb([1, 2, 3])));
        let mut record = CropRecord::cover(40, 20, TargetArea::new(10, 10));
        record.x = 35;
        let result = apply_crop_record(&image, &record, TargetArea::new(10, 10), RasterFormat::Png);
        assert!(matches!(result, Err(ImposeError::Validation(_))));
    }

    #[test]
    fn test_replay_in_rotated_space() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 20, Rgb([1, 2, 3])));
        let mut record = CropRecord::cover(40, 20, TargetArea::new(10, 10));
        record.rotation = 90;
        record.x = 0;
        record.y = 20;
        record.width = 20;
        record.height = 20;
        let raster =
            apply_crop_record(&image, &record, TargetArea::new(10, 10), RasterFormat::Png).unwrap();
        assert_eq!((raster.width, raster.height), (10, 10));
    }
}
