//! Meme library storage.
//!
//! [`MemeLibrary`] validates save requests and builds [`MemeRecord`]s; the
//! records themselves live behind an injected [`DocumentStore`]. Two backends
//! are provided: [`MemoryDocumentStore`] for tests and embedding, and
//! [`JsonDirStore`] which keeps one JSON file per record.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CanvasDocument;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The save request was rejected before anything was stored.
    #[error("{0}")]
    Validation(String),
    /// The backend could not complete the operation.
    #[error("Storage error: {0}")]
    Storage(String),
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// No record with the given id.
    #[error("Meme not found: {0}")]
    NotFound(String),
}

/// A saved meme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemeRecord {
    /// Record identifier (`meme-<uuid>`).
    pub id: String,
    /// Title, never empty.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Trimmed, non-empty tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Whether other users may see the meme.
    #[serde(default)]
    pub is_public: bool,
    /// The canvas document.
    pub document: CanvasDocument,
    /// Opaque owner identity.
    pub owner_id: String,
    /// Creation time, Unix milliseconds.
    pub created_at: u64,
}

/// Persistence capability for meme records.
pub trait DocumentStore: Send + Sync + fmt::Debug {
    /// Insert or replace a record.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend cannot persist the record.
    fn put(&self, record: MemeRecord) -> Result<(), StoreError>;

    /// All records owned by `owner_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend cannot be read.
    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<MemeRecord>, StoreError>;

    /// Look up a record by id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend cannot be read.
    fn get(&self, id: &str) -> Result<Option<MemeRecord>, StoreError>;

    /// Remove a record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no record has this id.
    fn delete(&self, id: &str) -> Result<(), StoreError>;
}

fn newest_first(records: &mut [MemeRecord]) {
    records.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// In-memory record store.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    records: Arc<RwLock<HashMap<String, MemeRecord>>>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn put(&self, record: MemeRecord) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        records.insert(record.id.clone(), record);
        Ok(())
    }

    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<MemeRecord>, StoreError> {
        let records = self
            .records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut owned: Vec<MemeRecord> = records
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        newest_first(&mut owned);
        Ok(owned)
    }

    fn get(&self, id: &str) -> Result<Option<MemeRecord>, StoreError> {
        let records = self
            .records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(records.get(id).cloned())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        records
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

/// Record store keeping one pretty-printed JSON file per record.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    data_dir: PathBuf,
}

impl JsonDirStore {
    /// Open a store rooted at `data_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    /// Directory holding the record files.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", sanitize_filename(id)))
    }

    fn read_record(path: &Path) -> Result<MemeRecord, StoreError> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

impl DocumentStore for JsonDirStore {
    fn put(&self, record: MemeRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let path = self.record_path(&record.id);
        std::fs::write(&path, json).map_err(|e| {
            tracing::warn!("Failed to persist meme {} to {}: {e}", record.id, path.display());
            StoreError::Io(e)
        })
    }

    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<MemeRecord>, StoreError> {
        let mut owned = Vec::new();
        for entry in std::fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            match Self::read_record(&path) {
                Ok(record) if record.owner_id == owner_id => owned.push(record),
                Ok(_) => {}
                Err(e) => tracing::warn!("Skipping unreadable record {}: {e}", path.display()),
            }
        }
        newest_first(&mut owned);
        Ok(owned)
    }

    fn get(&self, id: &str) -> Result<Option<MemeRecord>, StoreError> {
        let path = self.record_path(id);
        match Self::read_record(&path) {
            Ok(record) => Ok(Some(record)),
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let path = self.record_path(id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(id.to_string()))
            }
            Err(e) => {
                tracing::warn!("Failed to delete meme file {}: {e}", path.display());
                Err(StoreError::Io(e))
            }
        }
    }
}

/// User input from the save dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRequest {
    /// Title; must contain a non-whitespace character.
    pub title: String,
    /// Optional description.
    #[serde(default)]
    pub description: String,
    /// Comma-separated tags.
    #[serde(default)]
    pub tags: String,
    /// Whether the meme is public.
    #[serde(default)]
    pub is_public: bool,
}

impl SaveRequest {
    /// Request with only a title.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Tags split on commas, trimmed, empties dropped.
    #[must_use]
    pub fn parsed_tags(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Validating front end over a [`DocumentStore`].
#[derive(Debug, Clone)]
pub struct MemeLibrary {
    store: Arc<dyn DocumentStore>,
}

impl MemeLibrary {
    /// Wrap a store.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Library over a fresh in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryDocumentStore::new()))
    }

    /// Save `document` for `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for a blank title or owner, in which
    /// case nothing is stored, or the backend's error if the put fails.
    pub fn save(
        &self,
        owner_id: &str,
        document: &CanvasDocument,
        request: &SaveRequest,
    ) -> Result<MemeRecord, StoreError> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(StoreError::Validation("Please enter a title".to_string()));
        }
        if owner_id.trim().is_empty() {
            return Err(StoreError::Validation("Missing owner id".to_string()));
        }

        let record = MemeRecord {
            id: format!("meme-{}", Uuid::new_v4().simple()),
            title: title.to_string(),
            description: request.description.trim().to_string(),
            tags: request.parsed_tags(),
            is_public: request.is_public,
            document: document.clone(),
            owner_id: owner_id.to_string(),
            created_at: current_timestamp_ms(),
        };
        self.store.put(record.clone())?;
        tracing::info!(id = %record.id, owner = owner_id, "meme saved");
        Ok(record)
    }

    /// The owner's memes, newest first.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if it cannot be read.
    pub fn list(&self, owner_id: &str) -> Result<Vec<MemeRecord>, StoreError> {
        self.store.list_by_owner(owner_id)
    }

    /// Fetch a meme by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no record has this id.
    pub fn get(&self, id: &str) -> Result<MemeRecord, StoreError> {
        self.store
            .get(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Delete a meme by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no record has this id.
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(id)?;
        tracing::info!(id, "meme deleted");
        Ok(())
    }
}

/// Sanitize a record ID for use as a filename.
///
/// Replaces any character that is not alphanumeric, `-`, or `_` with `_`.
fn sanitize_filename(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Get the current Unix timestamp in milliseconds.
fn current_timestamp_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| {
        // Timestamp will not exceed u64 max for millennia
        #[allow(clippy::cast_possible_truncation)]
        {
            d.as_millis() as u64
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ShapeKind;

    fn sample_document() -> CanvasDocument {
        let doc = CanvasDocument::default();
        doc.with_element(doc.create_shape(ShapeKind::Circle))
    }

    fn request(title: &str, tags: &str) -> SaveRequest {
        SaveRequest {
            title: title.to_string(),
            description: "  about  ".to_string(),
            tags: tags.to_string(),
            is_public: true,
        }
    }

    #[test]
    fn test_parsed_tags_trims_and_drops_empties() {
        let req = request("t", " funny, ,cats ,, ");
        assert_eq!(req.parsed_tags(), vec!["funny", "cats"]);
        assert!(SaveRequest::titled("t").parsed_tags().is_empty());
    }

    #[test]
    fn test_save_builds_record() {
        let store = Arc::new(MemoryDocumentStore::new());
        let library = MemeLibrary::new(store.clone());
        let doc = sample_document();

        let record = library
            .save("user-1", &doc, &request("  Monday  ", "a,b"))
            .expect("save");

        assert!(record.id.starts_with("meme-"));
        assert_eq!(record.title, "Monday");
        assert_eq!(record.description, "about");
        assert_eq!(record.tags, vec!["a", "b"]);
        assert!(record.is_public);
        assert_eq!(record.document, doc);
        assert_eq!(record.owner_id, "user-1");
        assert!(record.created_at > 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_blank_title_stores_nothing() {
        let store = Arc::new(MemoryDocumentStore::new());
        let library = MemeLibrary::new(store.clone());

        for title in ["", "   ", "\t\n"] {
            let err = library
                .save("user-1", &sample_document(), &request(title, ""))
                .expect_err("blank title");
            assert!(matches!(err, StoreError::Validation(ref m) if m == "Please enter a title"));
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_list_filters_by_owner() {
        let library = MemeLibrary::in_memory();
        let doc = sample_document();
        library.save("alice", &doc, &SaveRequest::titled("one")).expect("save");
        library.save("alice", &doc, &SaveRequest::titled("two")).expect("save");
        library.save("bob", &doc, &SaveRequest::titled("three")).expect("save");

        assert_eq!(library.list("alice").expect("list").len(), 2);
        assert_eq!(library.list("bob").expect("list").len(), 1);
        assert!(library.list("carol").expect("list").is_empty());
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let library = MemeLibrary::in_memory();
        let record = library
            .save("alice", &sample_document(), &SaveRequest::titled("x"))
            .expect("save");
        library.delete(&record.id).expect("delete");
        assert!(matches!(library.delete(&record.id), Err(StoreError::NotFound(_))));
        assert!(matches!(library.get(&record.id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_json_dir_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonDirStore::open(dir.path().join("memes")).expect("open");
        let library = MemeLibrary::new(Arc::new(store.clone()));
        let doc = sample_document();

        let record = library
            .save("alice", &doc, &request("Saved", "x"))
            .expect("save");
        assert!(store
            .data_dir()
            .join(format!("{}.json", record.id))
            .exists());

        let loaded = library.get(&record.id).expect("get");
        assert_eq!(loaded, record);

        // A second handle on the same directory sees the record.
        let reopened = JsonDirStore::open(store.data_dir()).expect("reopen");
        assert_eq!(reopened.list_by_owner("alice").expect("list").len(), 1);

        library.delete(&record.id).expect("delete");
        assert!(reopened.get(&record.id).expect("get").is_none());
    }

    #[test]
    fn test_json_dir_skips_corrupt_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonDirStore::open(dir.path()).expect("open");
        std::fs::write(dir.path().join("broken.json"), "{not json").expect("write");
        std::fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

        let library = MemeLibrary::new(Arc::new(store.clone()));
        library
            .save("alice", &sample_document(), &SaveRequest::titled("ok"))
            .expect("save");

        let listed = store.list_by_owner("alice").expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "ok");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("meme-abc_1"), "meme-abc_1");
        assert_eq!(sanitize_filename("../etc/passwd"), "___etc_passwd");
    }
}
