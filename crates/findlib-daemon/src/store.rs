//! In-memory cache state.
//!
//! Two independent maps: discovery results keyed by query, and the last
//! observed modification time of every file a client has asked about. Both
//! live for exactly one daemon process and are never persisted.

use findlib_proto::{DiscoveryQuery, FileChange};
use findlib_util::fs::modified_time;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;
use tracing::debug;

/// Thread-safe store behind the cache handler.
#[derive(Debug, Default)]
pub struct CacheStore {
    /// query -> last stored file list
    data: RwLock<HashMap<DiscoveryQuery, Vec<String>>>,
    /// path -> newest modification time seen so far
    mtimes: RwLock<HashMap<String, SystemTime>>,
}

impl CacheStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `path` against its recorded modification time.
    ///
    /// A file never seen before counts as changed (its recorded time starts
    /// at the epoch). Only a strictly newer time is recorded and reported as
    /// a change.
    pub fn file_changed(&self, path: &str) -> FileChange {
        let Some(current) = modified_time(Path::new(path)) else {
            debug!(path, "not a regular file");
            return FileChange::Unknown;
        };

        let mut mtimes = self.mtimes.write().unwrap_or_else(PoisonError::into_inner);
        let last = mtimes
            .get(path)
            .copied()
            .unwrap_or(SystemTime::UNIX_EPOCH);

        if current > last {
            mtimes.insert(path.to_string(), current);
            FileChange::Changed
        } else {
            FileChange::Unchanged
        }
    }

    /// Overwrite the stored list for `key`.
    pub fn set(&self, key: DiscoveryQuery, files: Vec<String>) {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.insert(key, files);
    }

    /// The stored list for `key`, if it was ever set.
    pub fn get(&self, key: &DiscoveryQuery) -> Option<Vec<String>> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.get(key).cloned()
    }

    /// Number of stored queries.
    pub fn len(&self) -> usize {
        self.data.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no query has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of files with a recorded modification time.
    pub fn tracked_files(&self) -> usize {
        self.mtimes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::Duration;

    fn path_str(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_first_observation_is_changed_then_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("libz.so");
        fs::write(&file, b"x").unwrap();
        let file = path_str(&file);

        let store = CacheStore::new();
        assert_eq!(store.file_changed(&file), FileChange::Changed);
        assert_eq!(store.file_changed(&file), FileChange::Unchanged);
        assert_eq!(store.file_changed(&file), FileChange::Unchanged);
        assert_eq!(store.tracked_files(), 1);
    }

    #[test]
    fn test_newer_mtime_is_changed_older_is_not() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("libz.so");
        fs::write(&path, b"x").unwrap();
        let file = path_str(&path);

        let store = CacheStore::new();
        store.file_changed(&file);

        let handle = File::options().write(true).open(&path).unwrap();
        let now = SystemTime::now() + Duration::from_secs(60);
        handle.set_modified(now).unwrap();
        assert_eq!(store.file_changed(&file), FileChange::Changed);

        // Going backwards in time is not a change and is not recorded.
        handle
            .set_modified(now - Duration::from_secs(3600))
            .unwrap();
        assert_eq!(store.file_changed(&file), FileChange::Unchanged);
        handle.set_modified(now).unwrap();
        assert_eq!(store.file_changed(&file), FileChange::Unchanged);
    }

    #[test]
    fn test_missing_or_directory_is_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new();
        assert_eq!(
            store.file_changed(&path_str(&dir.path().join("missing"))),
            FileChange::Unknown
        );
        assert_eq!(store.file_changed(&path_str(dir.path())), FileChange::Unknown);
        assert_eq!(store.tracked_files(), 0);
    }

    #[test]
    fn test_set_overwrites_and_get_distinguishes_keys() {
        let store = CacheStore::new();
        let bare = DiscoveryQuery::new("pcre", None);
        let empty = DiscoveryQuery::new("pcre", Some(""));

        assert!(store.is_empty());
        assert_eq!(store.get(&bare), None);

        store.set(bare.clone(), vec!["/a".into()]);
        store.set(bare.clone(), vec!["/b".into()]);
        assert_eq!(store.get(&bare), Some(vec!["/b".to_string()]));
        assert_eq!(store.get(&empty), None);

        store.set(empty.clone(), Vec::new());
        assert_eq!(store.get(&empty), Some(Vec::new()));
        assert_eq!(store.len(), 2);
    }
}
