//! Slot board: the indexed arena of slot states.
//!
//! Indices are stable. Removing an image leaves a hole, and new images fill
//! the lowest hole before the arena grows.

use crate::editor::{CropSession, SlotState};
use crate::normalize::{EncodedRaster, SlotImage, TargetArea, auto_crop, reorient_for_slot};
use crate::paginate::{Sheet, paginate};
use crate::types::{ImposeError, RasterFormat, Result, SlotConfig};

#[derive(Debug, Clone, Default)]
pub struct SlotBoard {
    slots: Vec<SlotState>,
}

impl SlotBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arena length, holes included
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[SlotState] {
        &self.slots
    }

    pub fn state(&self, index: usize) -> Option<&SlotState> {
        self.slots.get(index)
    }

    /// Number of filled slots
    pub fn image_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_empty()).count()
    }

    pub fn has_any_image(&self) -> bool {
        self.slots.iter().any(|s| !s.is_empty())
    }

    /// Place a batch of images, each into the first empty index, else appended.
    ///
    /// Returns the index each image landed at, in input order.
    pub fn merge_batch(&mut self, images: Vec<SlotImage>) -> Vec<usize> {
        let mut placed = Vec::with_capacity(images.len());
        let mut search_from = 0;

        for image in images {
            let hole = self.slots[search_from.min(self.slots.len())..]
                .iter()
                .position(SlotState::is_empty)
                .map(|offset| search_from + offset);

            let index = match hole {
                Some(index) => {
                    self.slots[index] = SlotState::AutoNormalized(image);
                    index
                }
                None => {
                    self.slots.push(SlotState::AutoNormalized(image));
                    self.slots.len() - 1
                }
            };
            search_from = index + 1;
            placed.push(index);
        }

        log::debug!("merged {} image(s) at {:?}", placed.len(), placed);
        placed
    }

    /// Put `image` at `index`, growing the arena with empty slots if needed
    pub fn fill_slot(&mut self, index: usize, image: SlotImage) {
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, SlotState::default);
        }
        self.slots[index] = SlotState::AutoNormalized(image);
    }

    /// Empty the slot at `index`; later slots keep their indices
    pub fn remove(&mut self, index: usize) -> Result<()> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(ImposeError::SlotOutOfRange(index))?;
        *slot = SlotState::Empty;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn open_editor(
        &mut self,
        index: usize,
        target: TargetArea,
        format: RasterFormat,
    ) -> Result<()> {
        self.slot_mut(index)?.open_editor(target, format)
    }

    pub fn editor_mut(&mut self, index: usize) -> Result<&mut CropSession> {
        self.slot_mut(index)?.session_mut()
    }

    pub fn confirm_edit(&mut self, index: usize) -> Result<()> {
        self.slot_mut(index)?.confirm()
    }

    pub fn cancel_edit(&mut self, index: usize) -> Result<()> {
        self.slot_mut(index)?.cancel()
    }

    /// Re-orient and re-crop every settled image for a new slot or resolution.
    ///
    /// Open editors are cancelled and user crops are discarded.
    pub fn retarget(&mut self, slot: &SlotConfig, dpi: u32, format: RasterFormat) -> Result<()> {
        let target = TargetArea::for_slot(slot, dpi);
        let mut refreshed = Vec::with_capacity(self.slots.len());
        for state in &self.slots {
            let next = match state.image() {
                Some(image) => {
                    let (original, quarter_turned) =
                        reorient_for_slot(&image.original, image.quarter_turned, slot);
                    SlotState::AutoNormalized(auto_crop(
                        original,
                        quarter_turned,
                        image.name.clone(),
                        target,
                        format,
                    )?)
                }
                None => SlotState::Empty,
            };
            refreshed.push(next);
        }
        self.slots = refreshed;
        Ok(())
    }

    /// Working rasters in slot order, `None` for holes
    pub fn working_rasters(&self) -> Vec<Option<EncodedRaster>> {
        self.slots
            .iter()
            .map(|s| s.image().map(|image| image.working.clone()))
            .collect()
    }

    /// Working rasters split into printable sheets
    pub fn sheets(&self, slots_per_sheet: usize) -> Result<Vec<Sheet<EncodedRaster>>> {
        paginate(self.working_rasters(), slots_per_sheet)
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut SlotState> {
        self.slots
            .get_mut(index)
            .ok_or(ImposeError::SlotOutOfRange(index))
    }
}
