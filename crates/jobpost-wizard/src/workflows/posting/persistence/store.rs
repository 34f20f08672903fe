use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Fixed key of the single draft slot.
pub const DRAFT_STORAGE_KEY: &str = "job-posting-draft";

/// Read, write or parse failure on the persisted snapshot. Never surfaced to the user.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("snapshot storage io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot exceeds storage quota ({size} > {quota} bytes)")]
    QuotaExceeded { size: usize, quota: usize },
    #[error("snapshot could not be parsed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("snapshot storage unavailable: {0}")]
    Unavailable(String),
}

/// Single-slot storage for the serialized draft snapshot.
pub trait SnapshotStore: Send + Sync {
    fn read(&self) -> Result<Option<String>, StorageError>;
    fn write(&self, record: &str) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

/// Stores the slot as `<dir>/job-posting-draft.json`, replacing it atomically.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{DRAFT_STORAGE_KEY}.json")),
        }
    }

    /// Slot for a single editor beneath a shared drafts directory.
    pub fn for_editor(root: impl AsRef<Path>, editor_id: &str) -> Self {
        Self::new(root.as_ref().join(sanitize_segment(editor_id)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn read(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, record: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, record)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-process slot with an optional byte quota, mirroring browser storage limits.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    slot: Mutex<Option<String>>,
    quota: Option<usize>,
    writes: Mutex<usize>,
}

impl MemorySnapshotStore {
    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    pub fn seeded(record: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(record.into())),
            ..Self::default()
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.slot.lock().expect("snapshot slot poisoned").clone()
    }

    /// Number of successful writes since creation.
    pub fn write_count(&self) -> usize {
        *self.writes.lock().expect("snapshot counter poisoned")
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn read(&self) -> Result<Option<String>, StorageError> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| StorageError::Unavailable("snapshot slot poisoned".to_string()))?;
        Ok(slot.clone())
    }

    fn write(&self, record: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            if record.len() > quota {
                return Err(StorageError::QuotaExceeded {
                    size: record.len(),
                    quota,
                });
            }
        }
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| StorageError::Unavailable("snapshot slot poisoned".to_string()))?;
        *slot = Some(record.to_string());
        if let Ok(mut writes) = self.writes.lock() {
            *writes += 1;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| StorageError::Unavailable("snapshot slot poisoned".to_string()))?;
        *slot = None;
        Ok(())
    }
}

fn sanitize_segment(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "anonymous".to_string()
    } else {
        cleaned
    }
}
