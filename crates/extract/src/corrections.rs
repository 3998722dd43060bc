//! Remembered reviewer decisions: group name → state.
//!
//! Loaded once when a run starts and saved once when it ends. Stored as a
//! flat JSON object so it can be edited by hand.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ExtractError;

#[derive(Debug, Clone, Default)]
pub struct CorrectionStore {
    entries: BTreeMap<String, String>,
    dirty: bool,
}

impl CorrectionStore {
    /// Load from `path`. A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self, ExtractError> {
        let err = |message: String| ExtractError::Corrections {
            path: path.to_path_buf(),
            message,
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|e| err(e.to_string()))?;
        let entries: BTreeMap<String, String> = if text.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_json::from_str(&text).map_err(|e| err(e.to_string()))?
        };
        tracing::debug!(corrections = entries.len(), path = %path.display(), "loaded corrections");
        Ok(Self { entries, dirty: false })
    }

    /// Write to `path` if anything changed since load. Returns whether a
    /// write happened.
    pub fn save(&mut self, path: &Path) -> Result<bool, ExtractError> {
        if !self.dirty {
            return Ok(false);
        }
        let err = |message: String| ExtractError::Corrections {
            path: PathBuf::from(path),
            message,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| err(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(&self.entries).map_err(|e| err(e.to_string()))?;
        fs::write(path, json + "\n").map_err(|e| err(e.to_string()))?;
        self.dirty = false;
        tracing::info!(corrections = self.entries.len(), path = %path.display(), "saved corrections");
        Ok(true)
    }

    pub fn get(&self, group_name: &str) -> Option<&str> {
        self.entries.get(group_name).map(String::as_str)
    }

    pub fn remember(&mut self, group_name: &str, state: &str) {
        let previous = self.entries.insert(group_name.to_string(), state.to_string());
        if previous.as_deref() != Some(state) {
            self.dirty = true;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CorrectionStore::load(&dir.path().join("corrections.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn remember_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("corrections.json");

        let mut store = CorrectionStore::default();
        store.remember("Acme Corporation", "CA");
        assert!(store.save(&path).unwrap());
        // Nothing new to write.
        assert!(!store.save(&path).unwrap());

        let reloaded = CorrectionStore::load(&path).unwrap();
        assert_eq!(reloaded.get("Acme Corporation"), Some("CA"));
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn same_value_does_not_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.json");
        fs::write(&path, r#"{"Acme": "CA"}"#).unwrap();

        let mut store = CorrectionStore::load(&path).unwrap();
        store.remember("Acme", "CA");
        assert!(!store.save(&path).unwrap());
        store.remember("Acme", "NV");
        assert!(store.save(&path).unwrap());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            CorrectionStore::load(&path),
            Err(ExtractError::Corrections { .. })
        ));
    }
}
