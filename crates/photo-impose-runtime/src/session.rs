use std::path::{Path, PathBuf};

use photo_impose::{
    CropRecord, ExportQueue, GridLayout, ImposeError, ImpositionOptions, LayoutStatistics,
    MoveDirection, QueueRecord, Result, SlotBoard, SourceImage, TargetArea, calculate_statistics,
    compose_pdf, normalize_batch, normalize_image, save_pdf,
};
use lopdf::Document;
use tokio::sync::mpsc;

use crate::{CropEdit, SessionCommand, SessionUpdate};

// =============================================================================
// Session State
// =============================================================================

/// Everything one imposition workflow owns: options, slots and the export queue
#[derive(Debug)]
pub struct Session {
    options: ImpositionOptions,
    board: SlotBoard,
    queue: ExportQueue,
}

impl Session {
    /// Session with an empty board. The queue is loaded by [`Session::hydrate`].
    pub fn new(options: ImpositionOptions, queue_root: impl Into<PathBuf>) -> Self {
        Self {
            options,
            board: SlotBoard::new(),
            queue: ExportQueue::new(queue_root),
        }
    }

    pub fn options(&self) -> &ImpositionOptions {
        &self.options
    }

    pub fn board(&self) -> &SlotBoard {
        &self.board
    }

    pub fn queue(&self) -> &ExportQueue {
        &self.queue
    }

    pub async fn hydrate(&mut self) -> Result<()> {
        self.queue.hydrate().await
    }

    fn target(&self) -> TargetArea {
        TargetArea::for_slot(&self.options.slot, self.options.dpi)
    }

    /// Apply new options, re-cropping settled images if the target raster changed
    pub async fn set_options(&mut self, options: ImpositionOptions) -> Result<GridLayout> {
        options.validate()?;

        let retarget = options.slot != self.options.slot
            || options.dpi != self.options.dpi
            || options.raster_format != self.options.raster_format;

        if retarget && self.board.has_any_image() {
            let slot = options.slot;
            let dpi = options.dpi;
            let format = options.raster_format;
            // Originals are shared by the copy; the board is only replaced
            // once every image has been re-cropped
            let mut board = self.board.clone();
            self.board = tokio::task::spawn_blocking(move || {
                board.retarget(&slot, dpi, format)?;
                Ok::<_, ImposeError>(board)
            })
            .await??;
            log::info!("re-cropped {} image(s) for the new slot", self.board.image_count());
        }

        self.options = options;
        Ok(self.options.grid())
    }

    /// Normalize a batch and merge it into the board.
    ///
    /// Returns the slot each image landed in, plus the files that failed.
    pub async fn add_images(
        &mut self,
        sources: Vec<SourceImage>,
    ) -> (Vec<usize>, Vec<(String, String)>) {
        let outcome = normalize_batch(
            sources,
            self.options.slot,
            self.options.dpi,
            self.options.raster_format,
        )
        .await;

        let placed = self.board.merge_batch(outcome.images);
        let failures = outcome
            .failures
            .into_iter()
            .map(|f| (f.name, f.error.to_string()))
            .collect();
        (placed, failures)
    }

    pub async fn fill_slot(&mut self, index: usize, source: SourceImage) -> Result<()> {
        let slot = self.options.slot;
        let dpi = self.options.dpi;
        let format = self.options.raster_format;
        let image =
            tokio::task::spawn_blocking(move || normalize_image(&source, &slot, dpi, format))
                .await??;
        self.board.fill_slot(index, image);
        Ok(())
    }

    pub fn remove_slot(&mut self, index: usize) -> Result<()> {
        self.board.remove(index)
    }

    pub fn clear_slots(&mut self) {
        self.board.clear();
    }

    pub fn open_editor(&mut self, index: usize) -> Result<()> {
        let target = self.target();
        self.board
            .open_editor(index, target, self.options.raster_format)
    }

    /// Apply one editor adjustment; returns the crop it now describes and the zoom
    pub fn edit_crop(&mut self, index: usize, edit: CropEdit) -> Result<(CropRecord, f64)> {
        let session = self.board.editor_mut(index)?;
        match edit {
            CropEdit::RotateLeft => session.rotate_left(),
            CropEdit::RotateRight => session.rotate_right(),
            CropEdit::FlipHorizontal => session.flip_horizontal(),
            CropEdit::FlipVertical => session.flip_vertical(),
            CropEdit::SetZoom(zoom) => session.set_zoom(zoom),
            CropEdit::ZoomBy(factor) => session.zoom_by(factor),
            CropEdit::Pan { dx, dy } => session.pan_by(dx, dy),
            CropEdit::Reset => session.reset(),
        }
        Ok((session.crop_record(), session.zoom()))
    }

    pub fn confirm_crop(&mut self, index: usize) -> Result<CropRecord> {
        self.board.confirm_edit(index)?;
        self.board
            .state(index)
            .and_then(|s| s.image())
            .map(|image| image.crop)
            .ok_or(ImposeError::SlotOutOfRange(index))
    }

    pub fn cancel_crop(&mut self, index: usize) -> Result<()> {
        self.board.cancel_edit(index)
    }

    pub fn statistics(&self) -> LayoutStatistics {
        calculate_statistics(&self.options, self.board.image_count())
    }

    /// Compose the board into a document; also returns its page count
    pub async fn compose_current(&self) -> Result<(Document, usize)> {
        if !self.board.has_any_image() {
            return Err(ImposeError::Validation("no images to export".to_string()));
        }
        self.options.validate()?;

        let layout = self.options.grid();
        let sheets = self.board.sheets(layout.total_slots)?;
        let page_count = sheets.len();
        let doc = compose_pdf(self.options.clone(), layout, sheets).await?;
        Ok((doc, page_count))
    }

    async fn compose_bytes(&self) -> Result<(Vec<u8>, usize)> {
        let (mut doc, page_count) = self.compose_current().await?;
        let bytes = tokio::task::spawn_blocking(move || {
            let mut bytes = Vec::new();
            doc.save_to(&mut bytes)?;
            Ok::<_, ImposeError>(bytes)
        })
        .await??;
        Ok((bytes, page_count))
    }

    pub async fn export(&self, output_path: &Path) -> Result<usize> {
        let (bytes, page_count) = self.compose_bytes().await?;
        tokio::fs::write(output_path, bytes).await?;
        Ok(page_count)
    }

    pub async fn add_to_queue(&mut self, name: &str) -> Result<QueueRecord> {
        let (bytes, page_count) = self.compose_bytes().await?;
        self.queue.add(name, page_count, &bytes).await
    }

    /// Write the board to `output_path` and queue the very same document
    pub async fn export_and_queue(
        &mut self,
        output_path: &Path,
        name: &str,
    ) -> Result<(usize, QueueRecord)> {
        let (bytes, page_count) = self.compose_bytes().await?;
        tokio::fs::write(output_path, &bytes).await?;
        let record = self.queue.add(name, page_count, &bytes).await?;
        Ok((page_count, record))
    }

    pub async fn queue_remove(&mut self, id: &str) -> Result<()> {
        if self.queue.remove(id).await? {
            Ok(())
        } else {
            Err(ImposeError::Validation(format!("no queued job with id {}", id)))
        }
    }

    pub async fn queue_move(&mut self, id: &str, direction: MoveDirection) -> Result<bool> {
        self.queue.move_item(id, direction).await
    }

    pub async fn queue_clear(&mut self) -> Result<()> {
        self.queue.clear().await
    }

    /// Merge the queue into `output_path`; `None` when the queue is empty
    pub async fn queue_export_all(&self, output_path: &Path) -> Result<Option<usize>> {
        let Some(doc) = self.queue.export_all().await? else {
            return Ok(None);
        };
        let page_count = doc.get_pages().len();
        save_pdf(doc, output_path).await?;
        Ok(Some(page_count))
    }
}

// =============================================================================
// Worker
// =============================================================================

/// Async worker that owns a [`Session`] and applies commands one at a time
pub async fn session_task(
    mut session: Session,
    mut command_rx: mpsc::UnboundedReceiver<SessionCommand>,
    update_tx: mpsc::UnboundedSender<SessionUpdate>,
) {
    match session.hydrate().await {
        Ok(()) => {
            let _ = update_tx.send(SessionUpdate::Ready {
                queue: session.queue().items().to_vec(),
            });
        }
        Err(e) => {
            let _ = update_tx.send(SessionUpdate::Error {
                message: format!("Failed to load export queue: {e}"),
            });
        }
    }

    while let Some(cmd) = command_rx.recv().await {
        process_command(cmd, &mut session, &mut command_rx, &update_tx).await;
    }
}

async fn process_command(
    cmd: SessionCommand,
    session: &mut Session,
    command_rx: &mut mpsc::UnboundedReceiver<SessionCommand>,
    update_tx: &mpsc::UnboundedSender<SessionUpdate>,
) {
    match cmd {
        SessionCommand::SetOptions { mut options } => {
            // Only the most recent of several queued option changes is applied
            let mut deferred = None;
            while let Ok(next_cmd) = command_rx.try_recv() {
                if let SessionCommand::SetOptions {
                    options: new_options,
                } = next_cmd
                {
                    log::debug!("Discarding queued options, using newer request");
                    options = new_options;
                } else {
                    deferred = Some(next_cmd);
                    break;
                }
            }

            let result = session.set_options(options).await;
            if let Some(grid) = report(update_tx, "Failed to apply options", result) {
                let _ = update_tx.send(SessionUpdate::OptionsApplied { grid });
            }

            if let Some(next_cmd) = deferred {
                Box::pin(process_command(next_cmd, session, command_rx, update_tx)).await;
            }
        }
        SessionCommand::AddImages { sources } => {
            let _ = update_tx.send(SessionUpdate::Progress {
                operation: "Normalizing images".to_string(),
                current: 0,
                total: sources.len(),
            });
            let (placed, failures) = session.add_images(sources).await;
            let _ = update_tx.send(SessionUpdate::ImagesAdded { placed, failures });
            send_slots_changed(session, update_tx);
        }
        SessionCommand::FillSlot { index, source } => {
            let result = session.fill_slot(index, source).await;
            if report(update_tx, "Failed to load image", result).is_some() {
                send_slots_changed(session, update_tx);
            }
        }
        SessionCommand::RemoveSlot { index } => {
            let result = session.remove_slot(index);
            if report(update_tx, "Failed to remove image", result).is_some() {
                send_slots_changed(session, update_tx);
            }
        }
        SessionCommand::ClearSlots => {
            session.clear_slots();
            send_slots_changed(session, update_tx);
        }
        SessionCommand::OpenEditor { index } => {
            let result = session.open_editor(index);
            if report(update_tx, "Failed to open editor", result).is_some() {
                let _ = update_tx.send(SessionUpdate::EditorOpened { index });
            }
        }
        SessionCommand::EditCrop { index, edit } => {
            let result = session.edit_crop(index, edit);
            if let Some((record, zoom)) = report(update_tx, "Failed to edit crop", result) {
                let _ = update_tx.send(SessionUpdate::CropAdjusted {
                    index,
                    record,
                    zoom,
                });
            }
        }
        SessionCommand::ConfirmCrop { index } => {
            let result = session.confirm_crop(index);
            if let Some(record) = report(update_tx, "Failed to apply crop", result) {
                let _ = update_tx.send(SessionUpdate::CropConfirmed { index, record });
            }
        }
        SessionCommand::CancelCrop { index } => {
            let result = session.cancel_crop(index);
            if report(update_tx, "Failed to close editor", result).is_some() {
                let _ = update_tx.send(SessionUpdate::EditorClosed { index });
            }
        }
        SessionCommand::CalculateStats => {
            let _ = update_tx.send(SessionUpdate::StatsCalculated {
                stats: session.statistics(),
            });
        }
        SessionCommand::Export { output_path } => {
            let _ = update_tx.send(SessionUpdate::Progress {
                operation: "Composing PDF".to_string(),
                current: 0,
                total: 1,
            });
            let result = session.export(&output_path).await;
            if let Some(page_count) = report(update_tx, "Failed to export PDF", result) {
                log::info!("Exported {} page(s) to {}", page_count, output_path.display());
                let _ = update_tx.send(SessionUpdate::ExportComplete {
                    path: output_path,
                    page_count,
                });
            }
        }
        SessionCommand::AddToQueue { name } => {
            let result = session.add_to_queue(&name).await;
            if let Some(record) = report(update_tx, "Failed to queue document", result) {
                let _ = update_tx.send(SessionUpdate::Queued { record });
                send_queue_changed(session, update_tx);
            }
        }
        SessionCommand::QueueRemove { id } => {
            let result = session.queue_remove(&id).await;
            if report(update_tx, "Failed to remove queued job", result).is_some() {
                send_queue_changed(session, update_tx);
            }
        }
        SessionCommand::QueueMove { id, direction } => {
            let result = session.queue_move(&id, direction).await;
            if let Some(true) = report(update_tx, "Failed to move queued job", result) {
                send_queue_changed(session, update_tx);
            }
        }
        SessionCommand::QueueClear => {
            let result = session.queue_clear().await;
            if report(update_tx, "Failed to clear queue", result).is_some() {
                send_queue_changed(session, update_tx);
            }
        }
        SessionCommand::QueueExportAll { output_path } => {
            let result = session.queue_export_all(&output_path).await;
            match report(update_tx, "Failed to export queue", result) {
                Some(Some(page_count)) => {
                    let _ = update_tx.send(SessionUpdate::QueueExported {
                        path: output_path,
                        page_count,
                    });
                }
                Some(None) => {
                    let _ = update_tx.send(SessionUpdate::QueueEmpty);
                }
                None => {}
            }
        }
    }
}

/// Forward an error to the caller, keeping the value on success
fn report<T>(
    update_tx: &mpsc::UnboundedSender<SessionUpdate>,
    context: &str,
    result: Result<T>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("{context}: {e}");
            let _ = update_tx.send(SessionUpdate::Error {
                message: format!("{context}: {e}"),
            });
            None
        }
    }
}

fn send_slots_changed(session: &Session, update_tx: &mpsc::UnboundedSender<SessionUpdate>) {
    let _ = update_tx.send(SessionUpdate::SlotsChanged {
        slot_count: session.board().len(),
        image_count: session.board().image_count(),
    });
}

fn send_queue_changed(session: &Session, update_tx: &mpsc::UnboundedSender<SessionUpdate>) {
    let _ = update_tx.send(SessionUpdate::QueueChanged {
        items: session.queue().items().to_vec(),
    });
}
