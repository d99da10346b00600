//! File-backed storage implementation
//!
//! One regular file per key inside a base directory. The file name is the key
//! and the file contents are the value, verbatim.

use super::{StorageError, StorageResult, Store};
use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Prefix shared by temporary files and any other hidden entry
const HIDDEN_PREFIX: char = '.';

/// File-backed key-value store
pub struct FileStore {
    base_dir: PathBuf,
    /// Makes temporary file names unique within this process
    temp_counter: AtomicU64,
}

impl FileStore {
    /// Open a store rooted at an existing directory.
    ///
    /// The directory is not created: a missing path or a path that is not a
    /// directory is a configuration error.
    pub fn open(base_dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_dir = base_dir.into();

        let metadata = match std::fs::metadata(&base_dir) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::DirectoryNotFound(base_dir))
            }
            Err(e) => return Err(StorageError::DirectoryCheck(e)),
        };

        if !metadata.is_dir() {
            return Err(StorageError::NotADirectory(base_dir));
        }

        Ok(FileStore {
            base_dir,
            temp_counter: AtomicU64::new(0),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of the file holding `key`, after checking the key names exactly
    /// one plain entry inside the base directory.
    fn key_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::invalid_key(key, "key is empty"));
        }
        if key.contains('/') || key.contains('\\') {
            return Err(StorageError::invalid_key(key, "key contains a path separator"));
        }
        if key.contains('\0') {
            return Err(StorageError::invalid_key(key, "key contains a NUL byte"));
        }
        if key.starts_with(HIDDEN_PREFIX) {
            return Err(StorageError::invalid_key(key, "key starts with a dot"));
        }
        Ok(self.base_dir.join(key))
    }

    /// Temporary name independent of the key, so any key the filesystem
    /// accepts as a name also fits while staged.
    fn temp_path(&self) -> PathBuf {
        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        self.base_dir
            .join(format!("{}tmp.{}.{}", HIDDEN_PREFIX, std::process::id(), n))
    }
}

/// Write `data` to a fresh file and flush it to disk
async fn write_synced(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    Ok(())
}

#[async_trait]
impl Store for FileStore {
    /// Regular, non-hidden files in directory order.
    async fn list(&self) -> StorageResult<Vec<String>> {
        let mut entries = fs::read_dir(&self.base_dir)
            .await
            .map_err(|e| StorageError::file_io(&self.base_dir, e))?;

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::file_io(&self.base_dir, e))?
        {
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    warn!(
                        "Skipping non UTF-8 entry {:?} in {}",
                        raw,
                        self.base_dir.display()
                    );
                    continue;
                }
            };
            if name.starts_with(HIDDEN_PREFIX) {
                continue;
            }

            let file_type = entry
                .file_type()
                .await
                .map_err(|e| StorageError::file_io(entry.path(), e))?;
            if !file_type.is_file() {
                debug!("Skipping non-file entry {}", name);
                continue;
            }

            keys.push(name);
        }

        Ok(keys)
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Bytes>> {
        let path = self.key_path(key)?;

        match fs::read(&path).await {
            Ok(content) => Ok(Some(Bytes::from(content))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                // Directories are never keys
                if let Ok(metadata) = fs::metadata(&path).await {
                    if metadata.is_dir() {
                        return Ok(None);
                    }
                }
                Err(StorageError::file_io(&path, e))
            }
        }
    }

    async fn put(&self, key: &str, value: Bytes) -> StorageResult<()> {
        let path = self.key_path(key)?;
        let temp_path = self.temp_path();

        // Write to temp file first
        if let Err(e) = write_synced(&temp_path, &value).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::file_io(&temp_path, e));
        }

        // Atomic rename
        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::file_io(&path, e));
        }

        debug!("file put {} ({} bytes)", key, value.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn new_store() -> (TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist");

        let err = FileStore::open(&path).err().unwrap();
        assert_eq!(
            err.to_string(),
            format!("directory does not exist: {}", path.display())
        );
    }

    #[test]
    fn test_open_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file");
        std::fs::write(&path, "content").unwrap();

        let err = FileStore::open(&path).err().unwrap();
        assert_eq!(err.to_string(), format!("not a directory: {}", path.display()));
    }

    #[tokio::test]
    async fn test_list_empty() {
        let (_dir, store) = new_store();
        assert_eq!(store.list().await.unwrap(), Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_list_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("key1"), "value1").unwrap();

        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.list().await.unwrap(), vec!["key1"]);
        assert_eq!(
            store.get("key1").await.unwrap(),
            Some(Bytes::from("value1"))
        );
    }

    #[tokio::test]
    async fn test_list_skips_directories_and_hidden_files() {
        let (dir, store) = new_store();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join(".hidden"), "x").unwrap();
        store.put("key1", Bytes::from("value1")).await.unwrap();

        assert_eq!(store.list().await.unwrap(), vec!["key1"]);
        assert_eq!(store.get("nested").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let (_dir, store) = new_store();
        assert_eq!(store.get("not-found").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_get() {
        let (dir, store) = new_store();
        store.put("key1", Bytes::from("value1")).await.unwrap();

        assert_eq!(store.get("key1").await.unwrap(), Some(Bytes::from("value1")));
        assert_eq!(std::fs::read(dir.path().join("key1")).unwrap(), b"value1");
    }

    #[tokio::test]
    async fn test_overwrite_leaves_no_temp_files() {
        let (dir, store) = new_store();
        store.put("key", Bytes::from("a longer first value")).await.unwrap();
        store.put("key", Bytes::from("short")).await.unwrap();

        assert_eq!(store.get("key").await.unwrap(), Some(Bytes::from("short")));

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec!["key"]);
    }

    #[tokio::test]
    async fn test_long_key_round_trip() {
        let (dir, store) = new_store();
        let key = "k".repeat(250);

        store.put(&key, Bytes::from("v")).await.unwrap();

        assert_eq!(store.get(&key).await.unwrap(), Some(Bytes::from("v")));
        assert_eq!(store.list().await.unwrap(), vec![key.clone()]);
        assert!(dir.path().join(&key).is_file());
    }

    #[tokio::test]
    async fn test_io_fault_is_reported() {
        let (dir, store) = new_store();
        store.put("key", Bytes::from("value")).await.unwrap();

        // Base directory replaced by a plain file after opening
        let base = dir.path().to_path_buf();
        std::fs::remove_dir_all(&base).unwrap();
        std::fs::write(&base, "not a directory").unwrap();

        let err = store.list().await.err().unwrap();
        assert!(matches!(err, StorageError::FileIo { .. }), "got {:?}", err);

        let err = store.get("key").await.err().unwrap();
        assert!(matches!(err, StorageError::FileIo { .. }), "got {:?}", err);

        let err = store.put("key", Bytes::from("v2")).await.err().unwrap();
        assert!(matches!(err, StorageError::FileIo { .. }), "got {:?}", err);

        std::fs::remove_file(&base).unwrap();
    }

    #[tokio::test]
    async fn test_empty_value() {
        let (_dir, store) = new_store();
        store.put("empty", Bytes::new()).await.unwrap();
        assert_eq!(store.get("empty").await.unwrap(), Some(Bytes::new()));
    }

    #[tokio::test]
    async fn test_invalid_keys() {
        let (_dir, store) = new_store();

        for key in ["../escape", "a/b", "a\\b", ".", "..", ".hidden", "nul\0"] {
            let err = store.put(key, Bytes::from("x")).await.err().unwrap();
            assert!(
                matches!(err, StorageError::InvalidKey { .. }),
                "key {:?} gave {:?}",
                key,
                err
            );
        }

        let err = store.get("../escape").await.err().unwrap();
        assert!(matches!(err, StorageError::InvalidKey { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_readers_never_see_partial_writes() {
        let (_dir, store) = new_store();
        let store = Arc::new(store);
        const SIZE: usize = 256 * 1024;

        store.put("key", Bytes::from(vec![b'a'; SIZE])).await.unwrap();

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for i in 0..20 {
                    let byte = if i % 2 == 0 { b'b' } else { b'a' };
                    store.put("key", Bytes::from(vec![byte; SIZE])).await.unwrap();
                }
            })
        };

        let reader = {
            let store = store.clone();
            tokio::spawn(async move {
                for _ in 0..50 {
                    let value = store.get("key").await.unwrap().unwrap();
                    assert_eq!(value.len(), SIZE);
                    assert!(value.iter().all(|b| *b == value[0]));
                }
            })
        };

        writer.await.unwrap();
        reader.await.unwrap();
    }
}
