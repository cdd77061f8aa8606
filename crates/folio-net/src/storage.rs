//! Web Storage
//!
//! `localStorage` / `sessionStorage` semantics: string keys and values,
//! synchronous access, and two failure modes callers must tolerate. The
//! area may be unavailable altogether (private browsing, disabled cookies)
//! or full (quota exceeded).

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Storage failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("storage quota exceeded ({needed} bytes needed, quota is {quota})")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("storage is unavailable")]
    Unavailable,

    #[error("storage persistence failed: {0}")]
    Io(String),
}

/// A key/value storage area
pub trait StorageArea {
    /// Get item
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Set item
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove item
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;

    /// All keys currently stored
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// In-memory storage area, optionally mirrored to a JSON file
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: BTreeMap<String, String>,
    quota: Option<usize>,
    available: bool,
    path: Option<PathBuf>,
}

impl MemoryStorage {
    /// Create in-memory storage (sessionStorage)
    pub fn session() -> Self {
        Self {
            data: BTreeMap::new(),
            quota: None,
            available: true,
            path: None,
        }
    }

    /// Create storage persisted to `path` (localStorage)
    pub fn persistent(path: PathBuf) -> Self {
        let mut storage = Self {
            path: Some(path.clone()),
            ..Self::session()
        };

        // A missing or unreadable file just means an empty area
        if let Ok(contents) = fs::read_to_string(&path) {
            match serde_json::from_str::<BTreeMap<String, String>>(&contents) {
                Ok(data) => storage.data = data,
                Err(e) => tracing::warn!("Ignoring corrupt storage file {}: {}", path.display(), e),
            }
        }

        storage
    }

    /// Storage that rejects every operation
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::session()
        }
    }

    /// Limit the total size of keys plus values, in bytes
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// Bytes currently used by keys plus values
    pub fn used_bytes(&self) -> usize {
        self.data.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.available {
            Ok(())
        } else {
            Err(StorageError::Unavailable)
        }
    }

    /// Persist to disk if persistent
    fn persist(&self) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let contents = serde_json::to_string(&self.data)
            .map_err(|e| StorageError::Io(e.to_string()))?;
        fs::write(path, contents).map_err(|e| StorageError::Io(e.to_string()))
    }
}

impl StorageArea for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_available()?;
        Ok(self.data.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_available()?;

        if let Some(quota) = self.quota {
            let existing = self.data.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
            let needed = self.used_bytes() - existing + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }

        self.data.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.check_available()?;
        if self.data.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.check_available()?;
        Ok(self.data.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_storage() {
        let mut storage = MemoryStorage::session();

        storage.set_item("key1", "value1").unwrap();
        assert_eq!(storage.get_item("key1").unwrap(), Some("value1".to_string()));

        storage.set_item("key2", "value2").unwrap();
        assert_eq!(storage.len(), 2);

        storage.remove_item("key1").unwrap();
        assert_eq!(storage.get_item("key1").unwrap(), None);
        assert_eq!(storage.keys().unwrap(), vec!["key2".to_string()]);
    }

    #[test]
    fn test_quota() {
        let mut storage = MemoryStorage::session().with_quota(10);
        storage.set_item("a", "12345").unwrap();
        assert_eq!(storage.used_bytes(), 6);

        // Overwriting an entry only counts the difference
        storage.set_item("a", "123456789").unwrap();

        let err = storage.set_item("b", "x").unwrap_err();
        assert_eq!(err, StorageError::QuotaExceeded { needed: 12, quota: 10 });
        assert_eq!(storage.get_item("b").unwrap(), None);
    }

    #[test]
    fn test_unavailable() {
        let mut storage = MemoryStorage::unavailable();
        assert_eq!(storage.get_item("a"), Err(StorageError::Unavailable));
        assert_eq!(storage.set_item("a", "b"), Err(StorageError::Unavailable));
        assert_eq!(storage.keys(), Err(StorageError::Unavailable));
    }

    #[test]
    fn test_persistent_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.json");

        {
            let mut storage = MemoryStorage::persistent(path.clone());
            storage.set_item("page", "<main>\n\tmulti-line\n</main>").unwrap();
        }

        let reloaded = MemoryStorage::persistent(path);
        assert_eq!(
            reloaded.get_item("page").unwrap().as_deref(),
            Some("<main>\n\tmulti-line\n</main>")
        );
    }
}
