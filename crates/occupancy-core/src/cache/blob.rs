use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use tempfile::NamedTempFile;

use crate::error::CacheError;

/// Key-value blob storage used to persist cache entries.
///
/// Keys are plain, human-inspectable names such as `facility3_latest_cache`.
/// `write` replaces any existing blob for the key; concurrent writers to the
/// same key must resolve as last-writer-wins.
pub trait BlobStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;
    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError>;
    fn delete(&self, key: &str) -> Result<(), CacheError>;
    fn keys(&self) -> Result<Vec<String>, CacheError>;
}

fn io_failure(key: &str, source: std::io::Error) -> CacheError {
    CacheError::IoFailure {
        key: key.to_string(),
        source,
    }
}

/// One `<key>.json` file per key inside a directory.
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: PathBuf) -> Result<Self, CacheError> {
        std::fs::create_dir_all(&dir).map_err(|e| io_failure(&dir.display().to_string(), e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl BlobStore for FileBlobStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match std::fs::read(self.blob_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_failure(key, e)),
        }
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError> {
        // Each write gets its own temp file; the last rename wins
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| io_failure(key, e))?;
        tmp.write_all(bytes).map_err(|e| io_failure(key, e))?;
        tmp.persist(self.blob_path(key)).map_err(|e| io_failure(key, e.error))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        match std::fs::remove_file(self.blob_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_failure(key, e)),
        }
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        let dir_key = self.dir.display().to_string();
        let entries = std::fs::read_dir(&self.dir).map_err(|e| io_failure(&dir_key, e))?;

        let mut keys = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| io_failure(&dir_key, e))?.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// In-process blob store, for tests and embedding.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A panic while holding the lock cannot leave a half-written blob
        self.blobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl BlobStore for MemoryBlobStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.lock().get(key).cloned())
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError> {
        self.lock().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

impl<T: BlobStore + ?Sized> BlobStore for std::sync::Arc<T> {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError> {
        (**self).write(key, bytes)
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        (**self).delete(key)
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        (**self).keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_roundtrip() {
        let temp_dir = TempDir::new().expect("TempDir creation should succeed");
        let store = FileBlobStore::new(temp_dir.path().join("cache")).unwrap();

        assert_eq!(store.read("facility1_latest_cache").unwrap(), None);
        store.write("facility1_latest_cache", b"{}").unwrap();
        assert_eq!(store.read("facility1_latest_cache").unwrap(), Some(b"{}".to_vec()));
        assert!(temp_dir.path().join("cache/facility1_latest_cache.json").exists());

        store.write("facility1_latest_cache", b"[]").unwrap();
        assert_eq!(store.read("facility1_latest_cache").unwrap(), Some(b"[]".to_vec()));
    }

    #[test]
    fn test_file_store_keys_and_delete() {
        let temp_dir = TempDir::new().expect("TempDir creation should succeed");
        let store = FileBlobStore::new(temp_dir.path().to_path_buf()).unwrap();
        store.write("b", b"1").unwrap();
        store.write("a", b"2").unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), "ignored").unwrap();

        assert_eq!(store.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);

        store.delete("a").unwrap();
        store.delete("missing").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["b".to_string()]);
    }

    #[test]
    fn test_file_store_concurrent_writers_same_key() {
        let temp_dir = TempDir::new().expect("TempDir creation should succeed");
        let store = std::sync::Arc::new(FileBlobStore::new(temp_dir.path().to_path_buf()).unwrap());
        let payloads: Vec<Vec<u8>> = (0..4)
            .map(|t| format!("{{\"writer\":{}}}", t).into_bytes())
            .collect();

        let handles: Vec<_> = payloads
            .iter()
            .cloned()
            .map(|payload| {
                let store = store.clone();
                std::thread::spawn(move || {
                    (0..100)
                        .filter(|_| store.write("facility1_latest_cache", &payload).is_err())
                        .count()
                })
            })
            .collect();

        let failures: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(failures, 0);

        let last = store.read("facility1_latest_cache").unwrap().unwrap();
        assert!(payloads.contains(&last));
        // No temp files left behind
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
        assert_eq!(store.keys().unwrap(), vec!["facility1_latest_cache".to_string()]);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryBlobStore::new();
        store.write("k", b"v").unwrap();
        assert_eq!(store.read("k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.keys().unwrap(), vec!["k".to_string()]);
        store.delete("k").unwrap();
        assert_eq!(store.read("k").unwrap(), None);
    }
}
