//! Durable scheduler config storage.
//!
//! Configs are opaque bytes keyed by scheduler name. [`FileStorage`] writes
//! each config to its own file with the write-to-temp + rename pattern so a
//! crash never leaves a torn config behind.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use crate::error::StorageError;

const CONFIG_EXTENSION: &str = "json";

/// Save/load raw scheduler configs by scheduler name.
pub trait ConfigStorage: Send + Sync {
    fn save_scheduler_config(&self, name: &str, data: &[u8]) -> Result<(), StorageError>;

    fn load_scheduler_config(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError>;

    fn remove_scheduler_config(&self, name: &str) -> Result<(), StorageError>;

    /// Every stored `(name, config)` pair, ordered by name.
    fn load_all_scheduler_configs(&self) -> Result<Vec<(String, Vec<u8>)>, StorageError>;
}

/// In-memory config storage.
#[derive(Default)]
pub struct MemoryStorage {
    configs: RwLock<BTreeMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent save and remove fail until switched off.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

impl ConfigStorage for MemoryStorage {
    fn save_scheduler_config(&self, name: &str, data: &[u8]) -> Result<(), StorageError> {
        self.check_writable()?;
        self.configs.write().insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn load_scheduler_config(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.configs.read().get(name).cloned())
    }

    fn remove_scheduler_config(&self, name: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        self.configs.write().remove(name);
        Ok(())
    }

    fn load_all_scheduler_configs(&self) -> Result<Vec<(String, Vec<u8>)>, StorageError> {
        Ok(self
            .configs
            .read()
            .iter()
            .map(|(name, data)| (name.clone(), data.clone()))
            .collect())
    }
}

/// Directory-backed config storage, one `<name>.json` file per scheduler.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn config_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{CONFIG_EXTENSION}"))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl ConfigStorage for FileStorage {
    fn save_scheduler_config(&self, name: &str, data: &[u8]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;

        let path = self.config_path(name);
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, data).map_err(|e| io_error(&tmp_path, e))?;
        fs::rename(&tmp_path, &path).map_err(|e| io_error(&path, e))?;

        debug!(path = %path.display(), bytes = data.len(), "Saved scheduler config");
        Ok(())
    }

    fn load_scheduler_config(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.config_path(name);
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    fn remove_scheduler_config(&self, name: &str) -> Result<(), StorageError> {
        let path = self.config_path(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    fn load_all_scheduler_configs(&self) -> Result<Vec<(String, Vec<u8>)>, StorageError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&self.dir, e)),
        };

        let mut configs = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| io_error(&self.dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(CONFIG_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let data = fs::read(&path).map_err(|e| io_error(&path, e))?;
            configs.push((name.to_string(), data));
        }
        configs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(configs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_fault_injection() {
        let storage = MemoryStorage::new();
        storage.save_scheduler_config("s", b"1").unwrap();

        storage.set_fail_writes(true);
        assert!(storage.save_scheduler_config("s", b"2").is_err());
        assert!(storage.remove_scheduler_config("s").is_err());
        assert_eq!(storage.load_scheduler_config("s").unwrap(), Some(b"1".to_vec()));

        storage.set_fail_writes(false);
        storage.remove_scheduler_config("s").unwrap();
        assert_eq!(storage.load_scheduler_config("s").unwrap(), None);
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("schedulers"));

        assert!(storage.load_all_scheduler_configs().unwrap().is_empty());
        assert_eq!(storage.load_scheduler_config("a").unwrap(), None);

        storage.save_scheduler_config("b", br#"{"x":1}"#).unwrap();
        storage.save_scheduler_config("a", b"{}").unwrap();
        storage.save_scheduler_config("a", br#"{"y":2}"#).unwrap();

        let all = storage.load_all_scheduler_configs().unwrap();
        let names: Vec<_> = all.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(all[0].1, br#"{"y":2}"#.to_vec());

        storage.remove_scheduler_config("a").unwrap();
        storage.remove_scheduler_config("a").unwrap();
        assert_eq!(storage.load_all_scheduler_configs().unwrap().len(), 1);
    }
}
