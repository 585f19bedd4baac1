//! On-disk storage for queued jobs
//!
//! Two directories under one root, joined by record id:
//! `queue-meta/<id>.json` holds the record, `queue-blobs/<id>.pdf` the
//! document. Every write goes to a temporary file first and is then renamed
//! into place.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::constants::{QUEUE_BLOB_DIR, QUEUE_META_DIR};
use crate::types::{ImposeError, Result};

use super::QueueRecord;

#[derive(Debug, Clone)]
pub struct QueueDb {
    root: PathBuf,
}

impl QueueDb {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the storage directories if they are missing
    pub async fn ensure_persistence(&self) -> Result<()> {
        for dir in [self.meta_dir(), self.blob_dir()] {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| storage_error("create", &dir, e))?;
        }
        Ok(())
    }

    /// Store a new record and its document. The payload lands first, so a
    /// record on disk always had a payload at some point.
    pub async fn put(&self, record: &QueueRecord, payload: &[u8]) -> Result<()> {
        write_atomic(&self.blob_path(&record.id), payload).await?;
        self.update_meta(record).await
    }

    pub async fn update_meta(&self, record: &QueueRecord) -> Result<()> {
        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| ImposeError::Storage(format!("failed to serialize record: {}", e)))?;
        write_atomic(&self.meta_path(&record.id), &json).await
    }

    /// Every readable record, in no particular order
    pub async fn list_meta(&self) -> Result<Vec<QueueRecord>> {
        let dir = self.meta_dir();
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| storage_error("list", &dir, e))?;

        let mut records = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| storage_error("list", &dir, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| storage_error("read", &path, e))?;
            match serde_json::from_slice::<QueueRecord>(&bytes) {
                Ok(record) if path.file_stem().and_then(|s| s.to_str()) == Some(record.id.as_str()) => {
                    records.push(record)
                }
                Ok(record) => {
                    log::warn!("ignoring {}: id {} does not match", path.display(), record.id)
                }
                Err(e) => log::warn!("ignoring unreadable record {}: {}", path.display(), e),
            }
        }
        Ok(records)
    }

    /// The stored document, `None` if it is missing
    pub async fn get_blob(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let path = self.blob_path(id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error("read", &path, e)),
        }
    }

    /// Remove a record and its document; missing files are not an error
    pub async fn delete(&self, id: &str) -> Result<()> {
        remove_if_exists(&self.meta_path(id)).await?;
        remove_if_exists(&self.blob_path(id)).await
    }

    /// Remove every stored record and document
    pub async fn clear(&self) -> Result<()> {
        for dir in [self.meta_dir(), self.blob_dir()] {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(storage_error("list", &dir, e)),
            };
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| storage_error("list", &dir, e))?
            {
                remove_if_exists(&entry.path()).await?;
            }
        }
        Ok(())
    }

    fn meta_dir(&self) -> PathBuf {
        self.root.join(QUEUE_META_DIR)
    }

    fn blob_dir(&self) -> PathBuf {
        self.root.join(QUEUE_BLOB_DIR)
    }

    fn meta_path(&self, id: &str) -> PathBuf {
        self.meta_dir().join(format!("{}.json", id))
    }

    fn blob_path(&self, id: &str) -> PathBuf {
        self.blob_dir().join(format!("{}.pdf", id))
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| storage_error("write", &tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| storage_error("rename", path, e))
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(storage_error("remove", path, e)),
    }
}

fn storage_error(action: &str, path: &Path, e: std::io::Error) -> ImposeError {
    ImposeError::Storage(format!("failed to {} {}: {}", action, path.display(), e))
}
