use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::{strip_lib_prefix, CandidateFile};
use findlib_util::fs::{read_to_string_lossy, walk_files};

/// Directories always scanned by the filesystem fallback.
pub const DEFAULT_LIBRARY_DIRS: [&str; 4] =
    ["/usr/lib", "/usr/local/lib", "/usr/include", "/usr/local/include"];

/// Dynamic-linker configuration fragments naming extra library directories.
pub const DEFAULT_LD_CONF_DIR: &str = "/etc/ld.so.conf.d";

/// Last-resort search: walk well-known library directories.
#[derive(Debug, Clone)]
pub struct FsScan {
    roots: Vec<PathBuf>,
    ld_conf_dir: PathBuf,
}

impl Default for FsScan {
    fn default() -> Self {
        Self::new(
            DEFAULT_LIBRARY_DIRS.iter().map(PathBuf::from).collect(),
            DEFAULT_LD_CONF_DIR,
        )
    }
}

impl FsScan {
    pub fn new(roots: Vec<PathBuf>, ld_conf_dir: impl Into<PathBuf>) -> Self {
        Self {
            roots,
            ld_conf_dir: ld_conf_dir.into(),
        }
    }

    /// The fixed roots followed by every existing directory listed in the
    /// linker configuration, without duplicates.
    pub fn library_paths(&self) -> Vec<PathBuf> {
        let mut seen: HashSet<PathBuf> = self.roots.iter().cloned().collect();
        let mut paths = self.roots.clone();

        for dir in ld_conf_dirs(&self.ld_conf_dir) {
            if dir.is_dir() && seen.insert(dir.clone()) {
                paths.push(dir);
            }
        }
        paths
    }

    /// Every regular file whose full path contains the library name.
    pub fn find(&self, library: &str) -> Vec<CandidateFile> {
        let library = strip_lib_prefix(library);
        let mut files = Vec::new();
        for root in self.library_paths() {
            tracing::trace!(root = %root.display(), "scanning");
            files.extend(
                walk_files(&root)
                    .into_iter()
                    .filter(|path| path.to_string_lossy().contains(library))
                    .map(|path| CandidateFile::new(path, None)),
            );
        }
        files
    }
}

/// Directory lines from every file in `conf_dir`, sorted by file name.
fn ld_conf_dirs(conf_dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(conf_dir) else {
        return Vec::new();
    };
    let mut conf_files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .collect();
    conf_files.sort();

    let mut dirs = Vec::new();
    for file in conf_files {
        let Ok(text) = read_to_string_lossy(&file) else {
            continue;
        };
        for line in text.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() || line.starts_with("include ") {
                continue;
            }
            dirs.push(PathBuf::from(line));
        }
    }
    dirs
}
