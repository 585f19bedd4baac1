//! The export queue: finished documents waiting to be printed together.
//!
//! Records keep a contiguous `order` (0..N-1) after every successful
//! mutation. One writer at a time; concurrent processes sharing a root
//! directory are not supported.

use std::path::PathBuf;

use chrono::Utc;
use lopdf::Document;
use uuid::Uuid;

use crate::compose::count_pages;
use crate::types::{ImposeError, Result};

use super::db::QueueDb;
use super::merge::merge_documents;
use super::{MoveDirection, QueueRecord};

#[derive(Debug)]
pub struct ExportQueue {
    db: QueueDb,
    items: Vec<QueueRecord>,
    ready: bool,
}

impl ExportQueue {
    /// Queue stored under `root`. Call [`ExportQueue::hydrate`] before use.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            db: QueueDb::with_root(root),
            items: Vec::new(),
            ready: false,
        }
    }

    pub fn root(&self) -> &std::path::Path {
        self.db.root()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Records sorted by order
    pub fn items(&self) -> &[QueueRecord] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&QueueRecord> {
        self.items.iter().find(|r| r.id == id)
    }

    pub fn total_pages(&self) -> usize {
        self.items.iter().map(|r| r.page_count).sum()
    }

    /// Load every stored record and repair the ordering if needed.
    pub async fn hydrate(&mut self) -> Result<()> {
        self.db.ensure_persistence().await?;

        let mut items = self.db.list_meta().await?;
        items.sort_by(|a, b| {
            a.order
                .cmp(&b.order)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });

        let changed = renumber(&mut items);
        for record in &changed {
            self.db.update_meta(record).await?;
        }
        if !changed.is_empty() {
            log::warn!("repaired order of {} queued job(s)", changed.len());
        }

        log::debug!("queue hydrated with {} job(s)", items.len());
        self.items = items;
        self.ready = true;
        Ok(())
    }

    /// Append a finished document. A blank name becomes `Job <n>`.
    pub async fn add(
        &mut self,
        name: &str,
        page_count: usize,
        payload: &[u8],
    ) -> Result<QueueRecord> {
        self.ensure_ready()?;

        let order = self.items.len();
        let name = match name.trim() {
            "" => format!("Job {}", order + 1),
            trimmed => trimmed.to_string(),
        };
        let record = QueueRecord {
            id: Uuid::new_v4().to_string(),
            name,
            page_count,
            created_at: Utc::now(),
            order,
        };

        self.db.put(&record, payload).await?;
        self.items.push(record.clone());

        log::info!(
            "queued \"{}\" ({} page(s)) at position {}",
            record.name,
            record.page_count,
            record.order
        );
        Ok(record)
    }

    /// Append a document, counting its pages first
    pub async fn add_document(&mut self, name: &str, payload: Vec<u8>) -> Result<QueueRecord> {
        self.ensure_ready()?;
        let (payload, page_count) = tokio::task::spawn_blocking(move || {
            let count = count_pages(&payload)?;
            Ok::<_, ImposeError>((payload, count))
        })
        .await??;
        self.add(name, page_count, &payload).await
    }

    /// Drop a record and close the gap it leaves. Returns false for an unknown id.
    pub async fn remove(&mut self, id: &str) -> Result<bool> {
        self.ensure_ready()?;
        let Some(index) = self.items.iter().position(|r| r.id == id) else {
            return Ok(false);
        };

        let mut remaining = self.items.clone();
        let removed = remaining.remove(index);
        for record in renumber(&mut remaining) {
            self.db.update_meta(&record).await?;
        }
        self.db.delete(&removed.id).await?;
        self.items = remaining;

        log::info!("removed \"{}\" from the queue", removed.name);
        Ok(true)
    }

    /// Swap a record with its neighbor. Returns false when nothing moved.
    pub async fn move_item(&mut self, id: &str, direction: MoveDirection) -> Result<bool> {
        self.ensure_ready()?;
        let Some(index) = self.items.iter().position(|r| r.id == id) else {
            return Ok(false);
        };
        let neighbor = match direction {
            MoveDirection::Up if index > 0 => index - 1,
            MoveDirection::Down if index + 1 < self.items.len() => index + 1,
            _ => return Ok(false),
        };

        let mut a = self.items[index].clone();
        let mut b = self.items[neighbor].clone();
        std::mem::swap(&mut a.order, &mut b.order);
        self.db.update_meta(&a).await?;
        self.db.update_meta(&b).await?;

        self.items[index] = a;
        self.items[neighbor] = b;
        self.items.swap(index, neighbor);
        Ok(true)
    }

    /// Delete every record and document
    pub async fn clear(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.db.clear().await?;
        let count = self.items.len();
        self.items.clear();
        log::info!("cleared {} job(s) from the queue", count);
        Ok(())
    }

    /// One document with every queued page, in queue order.
    ///
    /// `None` when the queue is empty. Missing or unreadable payloads are
    /// skipped with a warning.
    pub async fn export_all(&self) -> Result<Option<Document>> {
        self.ensure_ready()?;
        if self.items.is_empty() {
            return Ok(None);
        }

        let mut payloads = Vec::with_capacity(self.items.len());
        for record in &self.items {
            match self.db.get_blob(&record.id).await? {
                Some(bytes) => payloads.push((record.name.clone(), bytes)),
                None => log::warn!("skipping \"{}\": document is missing", record.name),
            }
        }

        let merged = tokio::task::spawn_blocking(move || {
            let documents = payloads
                .into_iter()
                .filter_map(|(name, bytes)| match Document::load_mem(&bytes) {
                    Ok(doc) => Some(doc),
                    Err(e) => {
                        log::warn!("skipping \"{}\": {}", name, e);
                        None
                    }
                })
                .collect();
            merge_documents(documents)
        })
        .await??;

        log::info!("exported {} page(s) from the queue", merged.get_pages().len());
        Ok(Some(merged))
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.ready {
            Ok(())
        } else {
            Err(ImposeError::InvalidTransition("queue has not been hydrated"))
        }
    }
}

/// Set `order` to each record's position; returns the records that changed
fn renumber(items: &mut [QueueRecord]) -> Vec<QueueRecord> {
    let mut changed = Vec::new();
    for (position, record) in items.iter_mut().enumerate() {
        if record.order != position {
            record.order = position;
            changed.push(record.clone());
        }
    }
    changed
}
