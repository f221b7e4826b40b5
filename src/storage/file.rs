//! # File Backend
//!
//! All keys live in one JSON document, `<dir>/store.json`:
//!
//! ```json
//! { "trailguide.auth_token": "\"eyJhbGci...\"", "trailguide.user_data": "{\"id\":...}" }
//! ```
//!
//! Values are the raw JSON strings handed down by [`Storage`](super::Storage).
//! Every write rewrites the document via a `.tmp` file and `rename()` so a
//! crash mid-write leaves the previous version intact.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;
use tokio::sync::Mutex;

use super::{StorageBackend, StorageError};

const STORE_FILE: &str = "store.json";

type Document = BTreeMap<String, String>;

pub struct FileBackend {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileBackend {
    /// Opens (or creates) the store in `dir`.
    ///
    /// Fails if the directory can't be created, an existing store isn't
    /// valid JSON, or a fresh store can't be written.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(STORE_FILE);

        if path.exists() {
            let json = fs::read_to_string(&path)?;
            let doc: Document = serde_json::from_str(&json)?;
            debug!("Opened store at {} ({} keys)", path.display(), doc.len());
        } else {
            write_document(&path, &Document::new())?;
            debug!("Created empty store at {}", path.display());
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Document, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Document::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn persist(&self, doc: &Document) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(doc)?;
        // Unique tmp name so two processes sharing a directory don't clobber each other's tmp.
        let tmp_path = self
            .path
            .with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        let result = async {
            tokio::fs::write(&tmp_path, json).await?;
            tokio::fs::rename(&tmp_path, &self.path).await
        }
        .await;
        if let Err(e) = result {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn modify<F>(&self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut Document),
    {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;
        f(&mut doc);
        self.persist(&doc).await
    }
}

/// Synchronous atomic write, used once while opening.
fn write_document(path: &Path, doc: &Document) -> Result<(), StorageError> {
    let tmp_path = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(doc)?;
    if let Err(e) = fs::write(&tmp_path, json).and_then(|()| fs::rename(&tmp_path, path)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

#[async_trait]
impl StorageBackend for FileBackend {
    fn name(&self) -> &str {
        "file"
    }

    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load().await?.remove(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.modify(|doc| {
            doc.insert(key.to_string(), value.to_string());
        })
        .await
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.modify(|doc| {
            doc.remove(key);
        })
        .await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        self.persist(&Document::new()).await
    }
}
