//! The discovery orchestrator.
//!
//! A query first consults the result cache. On a miss the package backends
//! run in their fixed order and the first non-empty answer wins; without a
//! version constraint the filesystem scan is the last resort. Fresh results
//! are written back to the cache.

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::backend::{default_backends, Backend, CandidateFile, FsScan, SearchContext};
use crate::constraint::Constraint;
use crate::error::{CacheError, Error};
use crate::exec::{CommandRunner, ShellRunner};
use crate::select::{select_best, shared_library_extension};
use findlib_proto::{DiscoveryQuery, FileChange};

/// A store of previous discovery results, invalidated by file mtimes.
pub trait ResultCache: Send + Sync {
    /// The stored file list for `query`, if any.
    fn get(&self, query: &DiscoveryQuery) -> Result<Option<Vec<String>>, CacheError>;

    /// Overwrite the stored file list for `query`.
    fn set(&self, query: &DiscoveryQuery, files: &[String]) -> Result<(), CacheError>;

    /// Compare `path` against its last recorded modification time.
    fn file_changed(&self, path: &str) -> Result<FileChange, CacheError>;

    /// A stored list that is still trustworthy.
    ///
    /// Every file is checked, even after one has changed, so that all of
    /// their recorded times stay current. Any `Changed` or `Unknown` result
    /// invalidates the whole list.
    fn lookup(&self, query: &DiscoveryQuery) -> Result<Option<Vec<String>>, CacheError> {
        let Some(files) = self.get(query)? else {
            return Ok(None);
        };
        if files.is_empty() {
            return Ok(None);
        }

        let mut valid = true;
        for file in &files {
            let change = self.file_changed(file)?;
            if change != FileChange::Unchanged {
                debug!(%file, ?change, "cached file no longer trusted");
                valid = false;
            }
        }
        Ok(valid.then_some(files))
    }

    /// Write `files` for `query`, then record each file's current mtime so
    /// the next lookup of the same unchanged result is a hit.
    fn store(&self, query: &DiscoveryQuery, files: &[String]) -> Result<(), CacheError> {
        self.set(query, files)?;
        for file in files {
            self.file_changed(file)?;
        }
        Ok(())
    }
}

/// No-op cache implementation (always misses).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl ResultCache for NoCache {
    fn get(&self, _query: &DiscoveryQuery) -> Result<Option<Vec<String>>, CacheError> {
        Ok(None)
    }

    fn set(&self, _query: &DiscoveryQuery, _files: &[String]) -> Result<(), CacheError> {
        Ok(())
    }

    fn file_changed(&self, _path: &str) -> Result<FileChange, CacheError> {
        Ok(FileChange::Unknown)
    }
}

/// Where a discovery result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Backend(&'static str),
    Filesystem,
    /// Nothing matched anywhere.
    None,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache => f.write_str("cache"),
            Self::Backend(name) => f.write_str(name),
            Self::Filesystem => f.write_str("filesystem"),
            Self::None => f.write_str("none"),
        }
    }
}

/// The full file list for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOutcome {
    pub files: Vec<PathBuf>,
    pub source: Source,
}

impl DiscoveryOutcome {
    fn from_candidates(candidates: Vec<CandidateFile>, source: Source) -> Self {
        Self {
            files: candidates.into_iter().map(|c| c.path).collect(),
            source,
        }
    }

    /// Apply the best-match selector to this outcome.
    pub fn best(&self, library: &str, extension: &str) -> Option<PathBuf> {
        select_best(&self.files, library, extension)
    }
}

/// Runs queries against the cache, the backends and the filesystem.
pub struct Discoverer {
    runner: Box<dyn CommandRunner>,
    cache: Box<dyn ResultCache>,
    backends: Vec<Box<dyn Backend>>,
    fs_scan: Option<FsScan>,
}

impl Default for Discoverer {
    fn default() -> Self {
        Self::new(Box::new(ShellRunner), Box::new(NoCache))
    }
}

impl Discoverer {
    /// A discoverer with the standard backend chain and filesystem scan.
    pub fn new(runner: Box<dyn CommandRunner>, cache: Box<dyn ResultCache>) -> Self {
        Self {
            runner,
            cache,
            backends: default_backends(),
            fs_scan: Some(FsScan::default()),
        }
    }

    /// Replace the backend chain.
    #[must_use]
    pub fn with_backends(mut self, backends: Vec<Box<dyn Backend>>) -> Self {
        self.backends = backends;
        self
    }

    /// Replace (or disable, with `None`) the filesystem fallback.
    #[must_use]
    pub fn with_fs_scan(mut self, fs_scan: Option<FsScan>) -> Self {
        self.fs_scan = fs_scan;
        self
    }

    /// Every file belonging to `library`, filtered by `constraint`.
    ///
    /// # Errors
    /// Only an invalid constraint is an error. Cache failures degrade to an
    /// uncached search and "nothing found" is an empty outcome.
    pub fn discover(
        &self,
        library: &str,
        constraint: Option<&str>,
    ) -> Result<DiscoveryOutcome, Error> {
        let compiled = Constraint::compile_opt(constraint)?;
        let query = DiscoveryQuery::new(library, constraint);

        let mut cache_reachable = true;
        match self.cache.lookup(&query) {
            Ok(Some(files)) => {
                debug!(%query, count = files.len(), "cache hit");
                return Ok(DiscoveryOutcome {
                    files: files.into_iter().map(PathBuf::from).collect(),
                    source: Source::Cache,
                });
            }
            Ok(None) => debug!(%query, "cache miss"),
            Err(e) => {
                warn!(%query, error = %e, "cache unavailable, searching without it");
                cache_reachable = false;
            }
        }

        let outcome = self.search(library, compiled.as_ref());

        if cache_reachable && !outcome.files.is_empty() {
            let files: Vec<String> = outcome
                .files
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
            if let Err(e) = self.cache.store(&query, &files) {
                warn!(%query, error = %e, "failed to store discovery result");
            }
        }

        Ok(outcome)
    }

    /// The backend chain and filesystem fallback, without the cache.
    pub fn search(&self, library: &str, constraint: Option<&Constraint>) -> DiscoveryOutcome {
        let ctx = SearchContext {
            runner: self.runner.as_ref(),
            constraint,
        };

        for backend in &self.backends {
            if !backend.is_available(ctx.runner) {
                debug!(backend = backend.name(), "backend unavailable");
                continue;
            }
            let files = backend.find(&ctx, library);
            debug!(backend = backend.name(), library, count = files.len(), "backend searched");
            if !files.is_empty() {
                return DiscoveryOutcome::from_candidates(files, Source::Backend(backend.name()));
            }
        }

        if constraint.is_none() {
            if let Some(scan) = &self.fs_scan {
                let files = scan.find(library);
                debug!(library, count = files.len(), "filesystem scanned");
                if !files.is_empty() {
                    return DiscoveryOutcome::from_candidates(files, Source::Filesystem);
                }
            }
        }

        DiscoveryOutcome {
            files: Vec::new(),
            source: Source::None,
        }
    }

    fn find_with_extension(
        &self,
        name: &str,
        constraint: Option<&str>,
        extension: &str,
    ) -> Result<Option<PathBuf>, Error> {
        let found = self.discover(name, constraint)?.best(name, extension);
        if found.is_none() {
            debug!(name, constraint, extension, "no match");
        }
        Ok(found)
    }

    /// The `{name}.h` header.
    pub fn header_file(&self, name: &str, constraint: Option<&str>) -> Result<Option<PathBuf>, Error> {
        self.find_with_extension(name, constraint, ".h")
    }

    /// The `{name}.a` static library.
    pub fn static_library(
        &self,
        name: &str,
        constraint: Option<&str>,
    ) -> Result<Option<PathBuf>, Error> {
        self.find_with_extension(name, constraint, ".a")
    }

    /// The shared library, with the platform's extension.
    pub fn shared_library(
        &self,
        name: &str,
        constraint: Option<&str>,
    ) -> Result<Option<PathBuf>, Error> {
        self.find_with_extension(name, constraint, shared_library_extension())
    }

    /// The static library if there is one, else the shared library.
    pub fn static_or_shared_library(
        &self,
        name: &str,
        constraint: Option<&str>,
    ) -> Result<Option<PathBuf>, Error> {
        match self.static_library(name, constraint)? {
            Some(path) => Ok(Some(path)),
            None => self.shared_library(name, constraint),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{touch, FakeRunner};
    use crate::backend::{Dpkg, Rpm};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory cache with scripted file-change answers.
    #[derive(Default)]
    struct MemoryCache {
        data: Mutex<HashMap<DiscoveryQuery, Vec<String>>>,
        changes: Mutex<HashMap<String, FileChange>>,
        checked: Mutex<Vec<String>>,
        fail: bool,
    }

    impl ResultCache for MemoryCache {
        fn get(&self, query: &DiscoveryQuery) -> Result<Option<Vec<String>>, CacheError> {
            if self.fail {
                return Err(CacheError::Protocol("down".into()));
            }
            Ok(self.data.lock().unwrap().get(query).cloned())
        }

        fn set(&self, query: &DiscoveryQuery, files: &[String]) -> Result<(), CacheError> {
            self.data.lock().unwrap().insert(query.clone(), files.to_vec());
            Ok(())
        }

        fn file_changed(&self, path: &str) -> Result<FileChange, CacheError> {
            self.checked.lock().unwrap().push(path.to_string());
            Ok(self
                .changes
                .lock()
                .unwrap()
                .get(path)
                .copied()
                .unwrap_or(FileChange::Unchanged))
        }
    }

    #[test]
    fn test_lookup_is_all_or_nothing() {
        let cache = MemoryCache::default();
        let query = DiscoveryQuery::new("pcre", Some("8"));
        let files = vec!["/a".to_string(), "/b".to_string(), "/c".to_string()];
        cache.set(&query, &files).unwrap();

        assert_eq!(cache.lookup(&query).unwrap(), Some(files.clone()));

        cache
            .changes
            .lock()
            .unwrap()
            .insert("/a".to_string(), FileChange::Changed);
        cache.checked.lock().unwrap().clear();
        assert_eq!(cache.lookup(&query).unwrap(), None);
        // No short-circuit: every file was checked.
        assert_eq!(*cache.checked.lock().unwrap(), files);

        cache
            .changes
            .lock()
            .unwrap()
            .insert("/a".to_string(), FileChange::Unknown);
        assert_eq!(cache.lookup(&query).unwrap(), None);
    }

    #[test]
    fn test_lookup_empty_or_absent_is_miss() {
        let cache = MemoryCache::default();
        let query = DiscoveryQuery::new("pcre", None);
        assert_eq!(cache.lookup(&query).unwrap(), None);
        cache.set(&query, &[]).unwrap();
        assert_eq!(cache.lookup(&query).unwrap(), None);
    }

    #[test]
    fn test_cache_hit_skips_backends() {
        let cache = MemoryCache::default();
        let query = DiscoveryQuery::new("pcre", None);
        cache.set(&query, &["/l/libpcre.so".to_string()]).unwrap();

        let runner = FakeRunner::new().program("dpkg");
        let discoverer = Discoverer::new(Box::new(runner), Box::new(cache))
            .with_backends(vec![Box::new(Dpkg)])
            .with_fs_scan(None);

        let outcome = discoverer.discover("pcre", None).unwrap();
        assert_eq!(outcome.source, Source::Cache);
        assert_eq!(outcome.files, vec![PathBuf::from("/l/libpcre.so")]);
    }

    #[test]
    fn test_first_non_empty_backend_wins() {
        let dir = tempfile::tempdir().unwrap();
        let files = touch(dir.path(), &["libpcre.so", "libpcre.so.1"]);
        let runner = FakeRunner::new()
            .program("dpkg")
            .program("rpm")
            .output("dpkg --list | grep -i pcre", "ii  pcre  8.45-1  amd64  x")
            .output("dpkg -L pcre", &files[0])
            .output("rpm -qa | grep -i pcre", "pcre-8.45")
            .output("rpm -qi pcre-8.45", "Name : pcre\nVersion : 8.45")
            .output("rpm -ql pcre-8.45", &files[1]);

        let discoverer = Discoverer::new(Box::new(runner), Box::new(NoCache))
            .with_backends(vec![Box::new(Dpkg), Box::new(Rpm)])
            .with_fs_scan(None);

        let outcome = discoverer.discover("pcre", None).unwrap();
        assert_eq!(outcome.source, Source::Backend("dpkg"));
        assert_eq!(outcome.files, vec![PathBuf::from(&files[0])]);
    }

    #[test]
    fn test_fs_scan_only_without_constraint() {
        let root = tempfile::tempdir().unwrap();
        touch(root.path(), &["libpcre.so"]);
        let scan = FsScan::new(vec![root.path().to_path_buf()], "/nonexistent/ld.so.conf.d");
        let discoverer = Discoverer::new(Box::new(FakeRunner::new()), Box::new(NoCache))
            .with_backends(vec![Box::new(Dpkg)])
            .with_fs_scan(Some(scan));

        let outcome = discoverer.discover("pcre", None).unwrap();
        assert_eq!(outcome.source, Source::Filesystem);
        assert_eq!(outcome.files.len(), 1);

        let outcome = discoverer.discover("pcre", Some("ver.major > 0")).unwrap();
        assert_eq!(outcome.source, Source::None);
        assert!(outcome.files.is_empty());
    }

    #[test]
    fn test_invalid_constraint_is_fatal() {
        let discoverer = Discoverer::new(Box::new(FakeRunner::new()), Box::new(NoCache))
            .with_fs_scan(None);
        let err = discoverer
            .discover("pcre", Some("__import__('os').system('x')"))
            .unwrap_err();
        assert!(matches!(err, Error::Constraint { .. }));
    }

    #[test]
    fn test_unreachable_cache_degrades() {
        let root = tempfile::tempdir().unwrap();
        touch(root.path(), &["libpcre.so"]);
        let scan = FsScan::new(vec![root.path().to_path_buf()], "/nonexistent/ld.so.conf.d");
        let cache = MemoryCache {
            fail: true,
            ..MemoryCache::default()
        };
        let discoverer = Discoverer::new(Box::new(FakeRunner::new()), Box::new(cache))
            .with_backends(Vec::new())
            .with_fs_scan(Some(scan));

        let outcome = discoverer.discover("pcre", None).unwrap();
        assert_eq!(outcome.source, Source::Filesystem);
    }

    #[test]
    fn test_entry_points_select_by_extension() {
        let root = tempfile::tempdir().unwrap();
        let shared = format!("lib/libpcre{}", shared_library_extension());
        let files = touch(root.path(), &["include/pcre.h", "lib/libpcre.a", shared.as_str()]);
        let scan = FsScan::new(vec![root.path().to_path_buf()], "/nonexistent/ld.so.conf.d");
        let discoverer = Discoverer::new(Box::new(FakeRunner::new()), Box::new(NoCache))
            .with_backends(Vec::new())
            .with_fs_scan(Some(scan));

        assert_eq!(
            discoverer.header_file("pcre", None).unwrap(),
            Some(PathBuf::from(&files[0]))
        );
        assert_eq!(
            discoverer.static_library("libpcre", None).unwrap(),
            Some(PathBuf::from(&files[1]))
        );
        assert_eq!(
            discoverer.shared_library("libpcre", None).unwrap(),
            Some(PathBuf::from(&files[2]))
        );
        assert_eq!(
            discoverer.static_or_shared_library("pcre", None).unwrap(),
            Some(PathBuf::from(&files[1]))
        );
        assert_eq!(discoverer.header_file("zlib", None).unwrap(), None);
    }
}
