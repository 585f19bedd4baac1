//! Interactive crop state per slot.
//!
//! ```text
//! Empty -> AutoNormalized -> Editing -> UserCropped
//!                 ^             |  ^         |
//!                 +-- cancel ---+  +-- open -+
//! ```
//!
//! The editor always works from the slot's original raster, so repeated
//! edits never re-crop an already resampled image.

use std::mem;
use std::sync::Arc;

use image::{DynamicImage, GenericImageView};

use crate::constants::{MAX_ZOOM, MIN_ZOOM};
use crate::normalize::{
    CropRecord, EncodedRaster, SlotImage, TargetArea, cover_crop_rect, render_crop,
    transform_image,
};
use crate::types::{ImposeError, RasterFormat, Result};

// =============================================================================
// Crop Session
// =============================================================================

/// Live view of the crop editor: rotation, flips, zoom and pan over the original
#[derive(Debug, Clone)]
pub struct CropSession {
    original: Arc<DynamicImage>,
    target: TargetArea,
    format: RasterFormat,
    /// Clockwise quarter turns, 0..=3
    quarter_turns: u32,
    flip_h: bool,
    flip_v: bool,
    /// 1.0 shows the full cover-fit crop
    zoom: f64,
    /// Crop center in the rotated/flipped image space
    center_x: f64,
    center_y: f64,
}

impl CropSession {
    /// Start from the default cover-fit view of `original`
    pub fn new(original: Arc<DynamicImage>, target: TargetArea, format: RasterFormat) -> Self {
        let mut session = Self {
            original,
            target,
            format,
            quarter_turns: 0,
            flip_h: false,
            flip_v: false,
            zoom: MIN_ZOOM,
            center_x: 0.0,
            center_y: 0.0,
        };
        session.recenter();
        session
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn rotation_degrees(&self) -> i32 {
        (self.quarter_turns * 90) as i32
    }

    pub fn target(&self) -> TargetArea {
        self.target
    }

    /// Back to the default view
    pub fn reset(&mut self) {
        self.quarter_turns = 0;
        self.flip_h = false;
        self.flip_v = false;
        self.zoom = MIN_ZOOM;
        self.recenter();
    }

    pub fn rotate_right(&mut self) {
        self.quarter_turns = (self.quarter_turns + 1) % 4;
        self.recenter();
    }

    pub fn rotate_left(&mut self) {
        self.quarter_turns = (self.quarter_turns + 3) % 4;
        self.recenter();
    }

    pub fn flip_horizontal(&mut self) {
        let (w, _) = self.space_dims();
        self.flip_h = !self.flip_h;
        self.center_x = w as f64 - self.center_x;
        self.clamp_center();
    }

    pub fn flip_vertical(&mut self) {
        let (_, h) = self.space_dims();
        self.flip_v = !self.flip_v;
        self.center_y = h as f64 - self.center_y;
        self.clamp_center();
    }

    /// Set the zoom factor, clamped to the allowed range
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
            self.clamp_center();
        }
    }

    /// Multiply the zoom factor
    pub fn zoom_by(&mut self, factor: f64) {
        self.set_zoom(self.zoom * factor);
    }

    /// Move the crop by source pixels; the crop never leaves the image
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if dx.is_finite() && dy.is_finite() {
            self.center_x += dx;
            self.center_y += dy;
            self.clamp_center();
        }
    }

    /// Crop record for the current view
    pub fn crop_record(&self) -> CropRecord {
        let (space_w, space_h) = self.space_dims();
        let (crop_w, crop_h) = self.crop_size();
        let x = (self.center_x - crop_w as f64 / 2.0)
            .round()
            .clamp(0.0, (space_w - crop_w) as f64) as u32;
        let y = (self.center_y - crop_h as f64 / 2.0)
            .round()
            .clamp(0.0, (space_h - crop_h) as f64) as u32;
        let (natural_width, natural_height) = self.original.dimensions();

        CropRecord {
            x,
            y,
            width: crop_w,
            height: crop_h,
            rotation: self.rotation_degrees(),
            scale_x: if self.flip_h { -1.0 } else { 1.0 },
            scale_y: if self.flip_v { -1.0 } else { 1.0 },
            natural_width,
            natural_height,
        }
    }

    /// Resample the current view into a working raster
    pub fn render(&self) -> Result<(EncodedRaster, CropRecord)> {
        let record = self.crop_record();
        let transformed = transform_image(
            &self.original,
            self.rotation_degrees() as u32,
            self.flip_h,
            self.flip_v,
        );
        let raster = render_crop(&transformed, &record, self.target, self.format)?;
        Ok((raster, record))
    }

    fn space_dims(&self) -> (u32, u32) {
        let (w, h) = self.original.dimensions();
        let (w, h) = (w.max(1), h.max(1));
        if self.quarter_turns % 2 == 0 {
            (w, h)
        } else {
            (h, w)
        }
    }

    fn crop_size(&self) -> (u32, u32) {
        let (space_w, space_h) = self.space_dims();
        let (_, _, base_w, base_h) = cover_crop_rect(space_w, space_h, self.target.aspect());
        let w = ((base_w as f64 / self.zoom).round() as u32).clamp(1, space_w);
        let h = ((base_h as f64 / self.zoom).round() as u32).clamp(1, space_h);
        (w, h)
    }

    fn recenter(&mut self) {
        let (w, h) = self.space_dims();
        self.center_x = w as f64 / 2.0;
        self.center_y = h as f64 / 2.0;
        self.clamp_center();
    }

    fn clamp_center(&mut self) {
        let (space_w, space_h) = self.space_dims();
        let (crop_w, crop_h) = self.crop_size();
        let half_w = crop_w as f64 / 2.0;
        let half_h = crop_h as f64 / 2.0;
        self.center_x = self.center_x.clamp(half_w, space_w as f64 - half_w);
        self.center_y = self.center_y.clamp(half_h, space_h as f64 - half_h);
    }
}

// =============================================================================
// Slot State
// =============================================================================

/// What a slot currently holds
#[derive(Debug, Clone, Default)]
pub enum SlotState {
    #[default]
    Empty,
    /// Filled with the automatic cover-fit crop
    AutoNormalized(SlotImage),
    /// Crop editor open; `image` is the settled state to return to on cancel
    Editing {
        image: SlotImage,
        session: Box<CropSession>,
        was_user_cropped: bool,
    },
    /// Filled with a crop the user confirmed
    UserCropped(SlotImage),
}

impl SlotState {
    pub fn is_empty(&self) -> bool {
        matches!(self, SlotState::Empty)
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, SlotState::Editing { .. })
    }

    /// The settled image, also while editing
    pub fn image(&self) -> Option<&SlotImage> {
        match self {
            SlotState::Empty => None,
            SlotState::AutoNormalized(image) | SlotState::UserCropped(image) => Some(image),
            SlotState::Editing { image, .. } => Some(image),
        }
    }

    /// Open the crop editor on a filled slot
    pub fn open_editor(&mut self, target: TargetArea, format: RasterFormat) -> Result<()> {
        let was_user_cropped = match self {
            SlotState::AutoNormalized(_) => false,
            SlotState::UserCropped(_) => true,
            SlotState::Empty => {
                return Err(ImposeError::InvalidTransition("cannot edit an empty slot"));
            }
            SlotState::Editing { .. } => {
                return Err(ImposeError::InvalidTransition("editor is already open"));
            }
        };

        if let SlotState::AutoNormalized(image) | SlotState::UserCropped(image) =
            mem::take(self)
        {
            let session = CropSession::new(image.original.clone(), target, format);
            *self = SlotState::Editing {
                image,
                session: Box::new(session),
                was_user_cropped,
            };
        }
        Ok(())
    }

    /// The live session, only while editing
    pub fn session_mut(&mut self) -> Result<&mut CropSession> {
        match self {
            SlotState::Editing { session, .. } => Ok(session.as_mut()),
            _ => Err(ImposeError::InvalidTransition("editor is not open")),
        }
    }

    /// Replace the working raster with the edited crop
    pub fn confirm(&mut self) -> Result<()> {
        let (raster, record) = match self {
            SlotState::Editing { session, .. } => session.render()?,
            _ => return Err(ImposeError::InvalidTransition("editor is not open")),
        };

        if let SlotState::Editing { mut image, .. } = mem::take(self) {
            image.working = raster;
            image.crop = record;
            *self = SlotState::UserCropped(image);
        }
        Ok(())
    }

    /// Close the editor without changes
    pub fn cancel(&mut self) -> Result<()> {
        if !self.is_editing() {
            return Err(ImposeError::InvalidTransition("editor is not open"));
        }

        if let SlotState::Editing {
            image,
            was_user_cropped,
            ..
        } = mem::take(self)
        {
            *self = if was_user_cropped {
                SlotState::UserCropped(image)
            } else {
                SlotState::AutoNormalized(image)
            };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::auto_crop;
    use image::{Rgb, RgbImage};

    fn filled(w: u32, h: u32) -> SlotState {
        let original = Arc::new(DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 0])
        })));
        let image = auto_crop(original, false, "test".into(), TargetArea::new(20, 10), RasterFormat::Png)
            .unwrap();
        SlotState::AutoNormalized(image)
    }

    fn session(w: u32, h: u32) -> CropSession {
        let original = Arc::new(DynamicImage::ImageRgb8(RgbImage::new(w, h)));
        CropSession::new(original, TargetArea::new(20, 10), RasterFormat::Png)
    }

    #[test]
    fn test_default_view_is_cover_fit() {
        let record = session(100, 100).crop_record();
        assert_eq!((record.x, record.y, record.width, record.height), (0, 25, 100, 50));
        assert_eq!(record.rotation, 0);
    }

    #[test]
    fn test_zoom_is_bounded() {
        let mut s = session(100, 100);
        s.zoom_by(0.1);
        assert_eq!(s.zoom(), MIN_ZOOM);
        s.set_zoom(1000.0);
        assert_eq!(s.zoom(), MAX_ZOOM);
        let record = s.crop_record();
        assert_eq!((record.width, record.height), (10, 5));
    }

    #[test]
    fn test_pan_stays_inside() {
        let mut s = session(100, 100);
        s.set_zoom(2.0);
        s.pan_by(-1000.0, 1000.0);
        let record = s.crop_record();
        assert_eq!(record.x, 0);
        assert_eq!(record.y + record.height, 100);
    }

    #[test]
    fn test_rotation_swaps_space() {
        let mut s = session(200, 100);
        s.rotate_right();
        let record = s.crop_record();
        assert_eq!(record.rotation, 90);
        assert!(record.x + record.width <= 100);
        assert!(record.y + record.height <= 200);
        s.rotate_left();
        assert_eq!(s.crop_record().rotation, 0);
    }

    #[test]
    fn test_flip_sets_scale() {
        let mut s = session(100, 100);
        s.flip_horizontal();
        assert_eq!(s.crop_record().scale_x, -1.0);
        s.flip_vertical();
        assert_eq!(s.crop_record().scale_y, -1.0);
        s.reset();
        let record = s.crop_record();
        assert_eq!((record.scale_x, record.scale_y), (1.0, 1.0));
    }

    #[test]
    fn test_confirm_replaces_working_only() {
        let mut state = filled(60, 40);
        let original = state.image().unwrap().original.clone();
        state
            .open_editor(TargetArea::new(20, 10), RasterFormat::Png)
            .unwrap();
        state.session_mut().unwrap().set_zoom(2.0);
        state.confirm().unwrap();

        match &state {
            SlotState::UserCropped(image) => {
                assert!(Arc::ptr_eq(&image.original, &original));
                assert_eq!(image.crop.width, 30);
                assert_eq!((image.working.width, image.working.height), (20, 10));
            }
            other => panic!("Expected UserCropped, got {:?}", other),
        }
    }

    #[test]
    fn test_cancel_restores_prior_state() {
        let mut state = filled(60, 40);
        let before = state.image().unwrap().working.clone();
        state
            .open_editor(TargetArea::new(20, 10), RasterFormat::Png)
            .unwrap();
        state.session_mut().unwrap().rotate_right();
        state.cancel().unwrap();
        assert!(matches!(state, SlotState::AutoNormalized(_)));
        assert_eq!(state.image().unwrap().working, before);
    }

    #[test]
    fn test_reopen_from_user_cropped() {
        let mut state = filled(60, 40);
        let target = TargetArea::new(20, 10);
        state.open_editor(target, RasterFormat::Png).unwrap();
        state.confirm().unwrap();
        state.open_editor(target, RasterFormat::Png).unwrap();
        state.cancel().unwrap();
        assert!(matches!(state, SlotState::UserCropped(_)));
    }

    #[test]
    fn test_invalid_transitions() {
        let mut empty = SlotState::Empty;
        assert!(matches!(
            empty.open_editor(TargetArea::new(1, 1), RasterFormat::Png),
            Err(ImposeError::InvalidTransition(_))
        ));
        assert!(matches!(empty.confirm(), Err(ImposeError::InvalidTransition(_))));
        assert!(matches!(empty.cancel(), Err(ImposeError::InvalidTransition(_))));
        assert!(empty.is_empty());

        let mut state = filled(60, 40);
        assert!(state.cancel().is_err());
        assert!(matches!(state, SlotState::AutoNormalized(_)));
        state.open_editor(TargetArea::new(20, 10), RasterFormat::Png).unwrap();
        assert!(state.open_editor(TargetArea::new(20, 10), RasterFormat::Png).is_err());
        assert!(state.is_editing());
    }
}
