//! Key/value persistence for portal state.
//!
//! Each logical key is a single JSON document, read and written whole, with
//! one writer per data directory. Stores receive a `Storage` implementation
//! rather than touching the filesystem themselves, so the login and guard
//! logic can be exercised against an in-memory fake.

use anyhow::Result;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Key holding the current session record.
pub const SESSION_KEY: &str = "current_user";

/// Key holding the managed user directory.
pub const USERS_KEY: &str = "app_users";

pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// File-backed storage: one `<key>.json` document per key under a data
/// directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.key_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        std::fs::write(self.key_path(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::HashMap;

    /// In-memory stand-in for a data directory.
    #[derive(Debug, Default)]
    pub struct MemStorage {
        entries: HashMap<String, String>,
    }

    impl MemStorage {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(key: &str, value: &str) -> Self {
            let mut storage = Self::default();
            storage.entries.insert(key.to_string(), value.to_string());
            storage
        }

        pub fn contains(&self, key: &str) -> bool {
            self.entries.contains_key(key)
        }
    }

    impl Storage for MemStorage {
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
}

#[cfg(test)]
mod tests {
    use super::testing::MemStorage;
    use super::*;

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path()).unwrap();

        assert_eq!(storage.get("current_user").unwrap(), None);
        storage.set("current_user", "{\"username\":\"bob\"}").unwrap();
        assert_eq!(
            storage.get("current_user").unwrap().as_deref(),
            Some("{\"username\":\"bob\"}")
        );
        assert!(dir.path().join("current_user.json").exists());
    }

    #[test]
    fn test_file_storage_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path()).unwrap();

        storage.set("app_users", "[]").unwrap();
        storage.remove("app_users").unwrap();
        assert_eq!(storage.get("app_users").unwrap(), None);

        // Removing a missing key is not an error.
        storage.remove("app_users").unwrap();
    }

    #[test]
    fn test_keys_map_to_separate_documents() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path()).unwrap();

        storage.set(SESSION_KEY, "a").unwrap();
        storage.set(USERS_KEY, "b").unwrap();
        storage.remove(SESSION_KEY).unwrap();
        assert_eq!(storage.get(USERS_KEY).unwrap().as_deref(), Some("b"));
    }

    #[test]
    fn test_mem_storage_round_trip() {
        let mut storage = MemStorage::new();
        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }
}
