//! Discovery through the public API with fake backends and a counting cache.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use findlib_core::backend::{Backend, CandidateFile, SearchContext};
use findlib_core::exec::{CommandOutput, CommandRunner};
use findlib_core::{
    CacheError, DiscoveryQuery, Discoverer, FileChange, ResultCache, Source, VersionTuple,
};

struct NoCommands;

impl CommandRunner for NoCommands {
    fn run(&self, _command: &str) -> io::Result<CommandOutput> {
        Err(io::Error::new(io::ErrorKind::NotFound, "no shell in tests"))
    }

    fn program_exists(&self, _program: &str) -> bool {
        false
    }
}

/// A backend that owns a fixed set of files at one version.
struct Canned {
    name: &'static str,
    available: bool,
    version: VersionTuple,
    files: Vec<PathBuf>,
    calls: Arc<AtomicUsize>,
}

impl Canned {
    fn new(name: &'static str, version: VersionTuple, files: &[&str]) -> Self {
        Self {
            name,
            available: true,
            version,
            files: files.iter().map(PathBuf::from).collect(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Backend for Canned {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_available(&self, _runner: &dyn CommandRunner) -> bool {
        self.available
    }

    fn find(&self, ctx: &SearchContext<'_>, _library: &str) -> Vec<CandidateFile> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !ctx.accepts(self.version) {
            return Vec::new();
        }
        self.files
            .iter()
            .map(|p| CandidateFile::new(p.clone(), Some(self.version)))
            .collect()
    }
}

#[derive(Default)]
struct CountingCache {
    entries: Mutex<HashMap<DiscoveryQuery, Vec<String>>>,
    gets: AtomicUsize,
    sets: AtomicUsize,
}

struct Shared(Arc<CountingCache>);

impl ResultCache for Shared {
    fn get(&self, query: &DiscoveryQuery) -> Result<Option<Vec<String>>, CacheError> {
        self.0.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.0.entries.lock().unwrap().get(query).cloned())
    }

    fn set(&self, query: &DiscoveryQuery, files: &[String]) -> Result<(), CacheError> {
        self.0.sets.fetch_add(1, Ordering::SeqCst);
        self.0
            .entries
            .lock()
            .unwrap()
            .insert(query.clone(), files.to_vec());
        Ok(())
    }

    fn file_changed(&self, _path: &str) -> Result<FileChange, CacheError> {
        Ok(FileChange::Unchanged)
    }
}

#[test]
fn unavailable_and_empty_backends_are_skipped() {
    let mut offline = Canned::new("offline", VersionTuple::new(9, 0, 0), &["/x/libpcre.so"]);
    offline.available = false;
    let offline_calls = Arc::clone(&offline.calls);
    let old = Canned::new("old", VersionTuple::new(7, 0, 0), &["/old/libpcre.so"]);
    let new = Canned::new("new", VersionTuple::new(8, 45, 0), &["/new/libpcre.so"]);
    let never = Canned::new("never", VersionTuple::new(8, 0, 0), &["/never/libpcre.so"]);
    let never_calls = Arc::clone(&never.calls);

    let discoverer = Discoverer::new(Box::new(NoCommands), Box::new(findlib_core::NoCache))
        .with_backends(vec![
            Box::new(offline),
            Box::new(old),
            Box::new(new),
            Box::new(never),
        ])
        .with_fs_scan(None);

    let outcome = discoverer
        .discover("pcre", Some("ver.major >= 8"))
        .unwrap();
    assert_eq!(outcome.source, Source::Backend("new"));
    assert_eq!(outcome.files, vec![PathBuf::from("/new/libpcre.so")]);
    assert_eq!(offline_calls.load(Ordering::SeqCst), 0);
    assert_eq!(never_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn second_query_is_served_from_cache() {
    let cache = Arc::new(CountingCache::default());
    let backend = Canned::new("canned", VersionTuple::new(8, 45, 0), &["/l/libpcre.so"]);
    let backend_calls = Arc::clone(&backend.calls);

    let discoverer = Discoverer::new(Box::new(NoCommands), Box::new(Shared(Arc::clone(&cache))))
        .with_backends(vec![Box::new(backend)])
        .with_fs_scan(None);

    let first = discoverer.shared_library("libpcre", Some("ver.major == 8")).unwrap();
    let second = discoverer.shared_library("libpcre", Some("ver.major == 8")).unwrap();

    assert_eq!(first, second);
    assert_eq!(backend_calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.sets.load(Ordering::SeqCst), 1);
    assert_eq!(cache.gets.load(Ordering::SeqCst), 2);

    // A different constraint string is a different key.
    discoverer.shared_library("libpcre", Some("ver.major==8")).unwrap();
    assert_eq!(backend_calls.load(Ordering::SeqCst), 2);
}

#[test]
fn empty_results_are_not_cached() {
    let cache = Arc::new(CountingCache::default());
    let discoverer = Discoverer::new(Box::new(NoCommands), Box::new(Shared(Arc::clone(&cache))))
        .with_backends(Vec::new())
        .with_fs_scan(None);

    assert_eq!(discoverer.header_file("nothing", None).unwrap(), None);
    assert_eq!(cache.sets.load(Ordering::SeqCst), 0);
}

#[test]
fn invalid_constraint_runs_nothing() {
    let cache = Arc::new(CountingCache::default());
    let backend = Canned::new("canned", VersionTuple::new(8, 45, 0), &["/l/libpcre.so"]);
    let backend_calls = Arc::clone(&backend.calls);
    let discoverer = Discoverer::new(Box::new(NoCommands), Box::new(Shared(Arc::clone(&cache))))
        .with_backends(vec![Box::new(backend)])
        .with_fs_scan(None);

    let err = discoverer
        .header_file("pcre", Some("[x for x in range(10)]"))
        .unwrap_err();
    assert!(err.to_string().contains("invalid version constraint"));
    assert_eq!(backend_calls.load(Ordering::SeqCst), 0);
    assert_eq!(cache.gets.load(Ordering::SeqCst), 0);
}
