/// Storage for pre-generated stretches of dialogue, so a bulk-generated
/// conversation is produced once and replayed identically afterwards.

use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::schema::dialogue::DialogueRecord;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid batch key '{0}': must be a plain file name")]
    InvalidKey(String),
}

pub trait BatchStore {
    /// `Ok(None)` when nothing has been stored under `key` yet.
    fn load(&self, key: &str) -> Result<Option<Vec<DialogueRecord>>, BatchError>;
    fn save(&mut self, key: &str, records: &[DialogueRecord]) -> Result<(), BatchError>;
}

/// One pretty-printed JSON file per batch, `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonBatchStore {
    dir: PathBuf,
}

impl JsonBatchStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<dir>/<key>.json`. Keys that could name a path outside `dir` are refused.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, BatchError> {
        let plain = !key.is_empty() && !key.contains(['/', '\\', ':']) && !key.contains("..");
        if !plain {
            return Err(BatchError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl BatchStore for JsonBatchStore {
    fn load(&self, key: &str) -> Result<Option<Vec<DialogueRecord>>, BatchError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&mut self, key: &str, records: &[DialogueRecord]) -> Result<(), BatchError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(records)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBatchStore {
    batches: FxHashMap<String, Vec<DialogueRecord>>,
}

impl MemoryBatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch(mut self, key: impl Into<String>, records: Vec<DialogueRecord>) -> Self {
        self.batches.insert(key.into(), records);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.batches.contains_key(key)
    }
}

impl BatchStore for MemoryBatchStore {
    fn load(&self, key: &str) -> Result<Option<Vec<DialogueRecord>>, BatchError> {
        Ok(self.batches.get(key).cloned())
    }

    fn save(&mut self, key: &str, records: &[DialogueRecord]) -> Result<(), BatchError> {
        self.batches.insert(key.to_string(), records.to_vec());
        Ok(())
    }
}

/// Read a batch file directly, for tools that inspect write-ahead output.
pub fn read_batch_file(path: &Path) -> Result<Vec<DialogueRecord>, BatchError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::actor::ActorId;
    use crate::schema::emotion::Emotion;

    fn records() -> Vec<DialogueRecord> {
        vec![
            DialogueRecord::new(ActorId::from("UGLI 666"), "Who ordered the pizza?", Emotion::Curious, None),
            DialogueRecord::new(
                ActorId::from("Monstradamus"),
                "I foresaw it.",
                Emotion::Proud,
                Some(ActorId::from("UGLI 666")),
            ),
        ]
    }

    #[test]
    fn json_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonBatchStore::new(dir.path().join("batches"));
        assert!(store.load("day-01-party").unwrap().is_none());

        let records = records();
        store.save("day-01-party", &records).unwrap();
        let loaded = store.load("day-01-party").unwrap().unwrap();
        // Timestamps included.
        assert_eq!(loaded, records);
        let path = store.path_for("day-01-party").unwrap();
        assert_eq!(read_batch_file(&path).unwrap(), records);
    }

    #[test]
    fn json_store_refuses_keys_outside_its_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonBatchStore::new(dir.path().join("batches"));
        for key in ["../day-01", "..", "nested/key", "nested\\key", "", "C:evil"] {
            assert!(matches!(store.path_for(key), Err(BatchError::InvalidKey(_))), "{key}");
            assert!(matches!(store.load(key), Err(BatchError::InvalidKey(_))));
            assert!(matches!(store.save(key, &records()), Err(BatchError::InvalidKey(_))));
        }
        assert!(!dir.path().join("day-01.json").exists());
        assert!(store.path_for("day-01-party").is_ok());
    }

    #[test]
    fn json_store_reports_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonBatchStore::new(dir.path());
        std::fs::write(store.path_for("broken").unwrap(), "{not json").unwrap();
        assert!(matches!(store.load("broken"), Err(BatchError::Json(_))));
    }

    #[test]
    fn memory_store() {
        let mut store = MemoryBatchStore::new();
        assert!(store.load("k").unwrap().is_none());
        store.save("k", &records()).unwrap();
        assert!(store.contains("k"));
        assert_eq!(store.load("k").unwrap().unwrap().len(), 2);
    }
}
