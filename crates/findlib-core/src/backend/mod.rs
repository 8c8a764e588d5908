//! Package-manager backends.
//!
//! Each backend asks one package database for packages whose name contains
//! the library name, keeps those whose version satisfies the constraint, and
//! returns the regular files those packages own. Backends never fail: a
//! missing program means "no results", and a malformed line skips only that
//! package.

mod dpkg;
mod fs;
mod pacman;
mod pkg_config;
mod pkg_info;
mod portage;
mod ports;
mod rpm;
mod slackware;

pub use dpkg::Dpkg;
pub use fs::{FsScan, DEFAULT_LD_CONF_DIR, DEFAULT_LIBRARY_DIRS};
pub use pacman::Pacman;
pub use pkg_config::PkgConfig;
pub use pkg_info::PkgInfo;
pub use portage::Portage;
pub use ports::Ports;
pub use rpm::Rpm;
pub use slackware::{Slackware, DEFAULT_PACKAGES_DIR};

use std::path::PathBuf;

use crate::constraint::Constraint;
use crate::exec::{shell_quote, CommandRunner};
use crate::version::{parse_version, VersionTuple};
use findlib_util::fs::is_regular_file;

/// A file owned by an installed package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    /// Version of the owning package, when a package database supplied it.
    pub version: Option<VersionTuple>,
}

impl CandidateFile {
    pub fn new(path: impl Into<PathBuf>, version: Option<VersionTuple>) -> Self {
        Self {
            path: path.into(),
            version,
        }
    }
}

/// What a backend needs to answer one query.
pub struct SearchContext<'a> {
    pub runner: &'a dyn CommandRunner,
    pub constraint: Option<&'a Constraint>,
}

impl SearchContext<'_> {
    /// Whether a package at `version` survives the constraint.
    pub fn accepts(&self, version: VersionTuple) -> bool {
        self.constraint.map_or(true, |c| c.accepts(version))
    }

    /// Parse `raw` leniently and apply the constraint.
    pub fn accepted_version(&self, raw: &str) -> Option<VersionTuple> {
        let version = parse_version(raw).version;
        self.accepts(version).then_some(version)
    }

    /// Run `command` and return its non-empty stdout lines.
    pub fn lines(&self, command: &str) -> Vec<String> {
        self.runner
            .stdout(command)
            .map(|out| {
                out.lines()
                    .filter(|l| !l.trim().is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `<list command> | grep -i <name>`, one line per package.
    pub fn grep_packages(&self, list_command: &str, name: &str) -> Vec<String> {
        self.lines(&format!("{list_command} | grep -i {}", shell_quote(name)))
    }
}

/// One package database.
pub trait Backend: Send + Sync {
    /// Short name used in logs and discovery results.
    fn name(&self) -> &'static str;

    /// Whether the controlling program (or database) is present.
    fn is_available(&self, runner: &dyn CommandRunner) -> bool;

    /// Files of matching packages. Must not be called when unavailable.
    fn find(&self, ctx: &SearchContext<'_>, library: &str) -> Vec<CandidateFile>;
}

/// The package backends in the order they are consulted.
pub fn default_backends() -> Vec<Box<dyn Backend>> {
    vec![
        Box::new(Dpkg),
        Box::new(Rpm),
        Box::new(Pacman),
        Box::new(Slackware::default()),
        Box::new(Portage),
        Box::new(PkgInfo),
        Box::new(Ports),
        Box::new(PkgConfig),
    ]
}

/// Drop one leading `lib` from a library name.
pub fn strip_lib_prefix(name: &str) -> &str {
    match name.strip_prefix("lib") {
        Some(rest) if !rest.is_empty() => rest,
        _ => name,
    }
}

/// Case-insensitive substring test used for package names.
pub fn name_matches(library: &str, package: &str) -> bool {
    package.to_lowercase().contains(&library.to_lowercase())
}

/// Turn a file listing into candidates, keeping only regular files.
pub(crate) fn owned_files<'a>(
    entries: impl IntoIterator<Item = &'a str>,
    version: VersionTuple,
) -> Vec<CandidateFile> {
    entries
        .into_iter()
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(PathBuf::from)
        .filter(|path| is_regular_file(path))
        .map(|path| CandidateFile::new(path, Some(version)))
        .collect()
}

// Small text helpers for package listings. Each returns the whole input when
// the separator is missing.

pub(crate) fn before<'a>(s: &'a str, sep: &str) -> &'a str {
    s.find(sep).map_or(s, |i| &s[..i])
}

pub(crate) fn before_last<'a>(s: &'a str, sep: &str) -> &'a str {
    s.rfind(sep).map_or(s, |i| &s[..i])
}

pub(crate) fn after<'a>(s: &'a str, sep: &str) -> &'a str {
    s.find(sep).map_or(s, |i| &s[i + sep.len()..])
}

/// Split `name-1.2.3-x86_64-1` style identifiers into the name (dash
/// segments before the first all-digits-and-dots segment) and that segment.
pub(crate) fn split_name_version(package: &str) -> (String, Option<&str>) {
    let is_version =
        |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit() || b == b'.');

    let mut name = Vec::new();
    for segment in package.split('-') {
        if is_version(segment) {
            return (name.join("-"), Some(segment));
        }
        name.push(segment);
    }
    (name.join("-"), None)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_lib_prefix() {
        assert_eq!(strip_lib_prefix("libpcre"), "pcre");
        assert_eq!(strip_lib_prefix("libbz2"), "bz2");
        assert_eq!(strip_lib_prefix("pcre"), "pcre");
        assert_eq!(strip_lib_prefix("lib"), "lib");
    }

    #[test]
    fn test_name_matches() {
        assert!(name_matches("pcre", "libPCRE3-dev"));
        assert!(!name_matches("pcre", "zlib1g"));
    }

    #[test]
    fn test_text_helpers() {
        assert_eq!(before("libpcre3:amd64", ":"), "libpcre3");
        assert_eq!(before("libpcre3", ":"), "libpcre3");
        assert_eq!(before_last(after("2:8.39-13", ":"), "-"), "8.39");
        assert_eq!(before_last(after("8.39-13", ":"), "-"), "8.39");
        assert_eq!(after("a=b", "="), "b");
    }

    #[test]
    fn test_split_name_version() {
        assert_eq!(
            split_name_version("pcre-8.45-x86_64-1"),
            ("pcre".to_string(), Some("8.45"))
        );
        assert_eq!(
            split_name_version("dev-libs/libpcre-8.45"),
            ("dev-libs/libpcre".to_string(), Some("8.45"))
        );
        assert_eq!(
            split_name_version("gtk-doc-tools"),
            ("gtk-doc-tools".to_string(), None)
        );
        assert_eq!(
            split_name_version("foo--1.2"),
            ("foo-".to_string(), Some("1.2"))
        );
        assert_eq!(
            split_name_version("libx-1a.2-3"),
            ("libx-1a.2".to_string(), Some("3"))
        );
    }

    #[test]
    fn test_default_backend_order() {
        let names: Vec<_> = default_backends().iter().map(|b| b.name()).collect();
        assert_eq!(
            names,
            ["dpkg", "rpm", "pacman", "slackware", "portage", "pkg_info", "ports", "pkg-config"]
        );
    }
}
