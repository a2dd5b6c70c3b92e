//! Key-value persistence for the session marker and onboarding flag

use anyhow::{Context, Result};
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Minimal string key-value store, read at startup and written on
/// login, logout and onboarding dismissal
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Volatile store, used in tests
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: BTreeMap<String, String>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// JSON file of string entries with file locking so two shells do not
/// clobber each other's writes
pub struct FileKeyValueStore {
    file_path: PathBuf,
    lock_file_path: PathBuf,
}

impl FileKeyValueStore {
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        let file_path = file_path.as_ref().to_path_buf();
        let lock_file_path = file_path.with_extension("json.lock");
        Self {
            file_path,
            lock_file_path,
        }
    }

    /// Returns the path to the storage file
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Acquire an exclusive lock for a read-modify-write cycle
    /// Returns the lock file handle which must be held during the operation
    fn acquire_write_lock(&self) -> Result<File> {
        if let Some(parent) = self.lock_file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to create lock file: {:?}", self.lock_file_path))?;

        let start = std::time::Instant::now();
        let timeout = Duration::from_secs(5);

        loop {
            match lock_file.try_lock_exclusive() {
                Ok(()) => return Ok(lock_file),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() > timeout {
                        anyhow::bail!(
                            "Timeout waiting for lock on session file: {:?}",
                            self.file_path
                        );
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to acquire lock on {:?}", self.lock_file_path)
                    })
                }
            }
        }
    }

    /// Acquire a shared lock for reading
    /// Returns None when no writer has ever created the lock file
    fn acquire_read_lock(&self) -> Result<Option<File>> {
        if !self.lock_file_path.exists() {
            return Ok(None);
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to open lock file: {:?}", self.lock_file_path))?;

        let start = std::time::Instant::now();
        let timeout = Duration::from_secs(5);

        loop {
            match FileExt::try_lock_shared(&lock_file) {
                Ok(()) => return Ok(Some(lock_file)),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() > timeout {
                        anyhow::bail!(
                            "Timeout waiting for lock on session file: {:?}",
                            self.file_path
                        );
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to acquire lock on {:?}", self.lock_file_path)
                    })
                }
            }
        }
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        if !self.file_path.exists() {
            return Ok(BTreeMap::new());
        }

        let file = File::open(&self.file_path)
            .with_context(|| format!("Failed to open file: {:?}", self.file_path))?;
        let reader = BufReader::new(file);

        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse JSON from {:?}", self.file_path))
    }

    /// Reload, apply, save under one exclusive lock
    fn update_atomically<F>(&self, update_fn: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut lock_file = self.acquire_write_lock()?;
        let _ = writeln!(
            lock_file,
            "Locked by PID {} at {}",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        );

        let mut entries = self.read_entries()?;
        update_fn(&mut entries);

        let json = serde_json::to_string_pretty(&entries)?;
        fs::write(&self.file_path, json)
            .with_context(|| format!("Failed to write {:?}", self.file_path))?;

        // Lock is released when lock_file is dropped
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _lock = self.acquire_read_lock()?;
        Ok(self.read_entries()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.update_atomically(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if !self.file_path.exists() {
            return Ok(());
        }
        self.update_atomically(|entries| {
            entries.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_store_roundtrip() -> Result<()> {
        let mut store = MemoryKeyValueStore::new();
        assert_eq!(store.get("user")?, None);

        store.set("user", "{}")?;
        assert_eq!(store.get("user")?, Some("{}".to_string()));

        store.remove("user")?;
        store.remove("user")?;
        assert_eq!(store.get("user")?, None);
        Ok(())
    }

    #[test]
    fn test_file_store_persists_between_instances() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("session.json");

        let mut store = FileKeyValueStore::new(&path);
        store.set("has_seen_onboarding", "true")?;
        store.set("user", r#"{"email":"user@example.com"}"#)?;

        let reopened = FileKeyValueStore::new(&path);
        assert_eq!(
            reopened.get("has_seen_onboarding")?,
            Some("true".to_string())
        );
        assert!(reopened.get("user")?.unwrap().contains("user@example.com"));
        Ok(())
    }

    #[test]
    fn test_file_store_remove_keeps_other_keys() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("session.json");

        let mut store = FileKeyValueStore::new(&path);
        store.set("user", "marker")?;
        store.set("has_seen_onboarding", "true")?;
        store.remove("user")?;

        assert_eq!(store.get("user")?, None);
        assert_eq!(store.get("has_seen_onboarding")?, Some("true".to_string()));
        Ok(())
    }

    #[test]
    fn test_file_store_missing_file_reads_empty() -> Result<()> {
        let dir = tempdir()?;
        let mut store = FileKeyValueStore::new(dir.path().join("absent.json"));
        assert_eq!(store.get("user")?, None);
        store.remove("user")?;
        assert!(!store.path().exists());
        Ok(())
    }

    #[test]
    fn test_file_store_read_waits_for_writer() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("session.json");
        let mut store = FileKeyValueStore::new(&path);
        store.set("user", "marker")?;

        let writer = store.acquire_write_lock()?;
        let reader = FileKeyValueStore::new(&path);
        let handle = std::thread::spawn(move || reader.get("user"));

        std::thread::sleep(Duration::from_millis(300));
        assert!(!handle.is_finished());
        drop(writer);

        let value = handle.join().expect("reader thread panicked")?;
        assert_eq!(value, Some("marker".to_string()));
        Ok(())
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("session.json");
        fs::write(&path, "not json")?;

        let store = FileKeyValueStore::new(&path);
        assert!(store.get("user").is_err());
        Ok(())
    }
}
