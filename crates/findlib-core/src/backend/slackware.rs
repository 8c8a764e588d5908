use std::fs;
use std::path::PathBuf;

use tracing::debug;

use super::{
    after, name_matches, owned_files, split_name_version, strip_lib_prefix, Backend,
    CandidateFile, SearchContext,
};
use crate::exec::CommandRunner;
use findlib_util::fs::read_to_string_lossy;

/// Where Slackware keeps one metadata file per installed package.
pub const DEFAULT_PACKAGES_DIR: &str = "/var/log/packages";

const FILE_LIST_MARKER: &str = "FILE LIST:";

/// Slackware's package log directory. No program is involved; the database
/// is read directly.
#[derive(Debug, Clone)]
pub struct Slackware {
    packages_dir: PathBuf,
}

impl Default for Slackware {
    fn default() -> Self {
        Self::new(DEFAULT_PACKAGES_DIR)
    }
}

impl Slackware {
    pub fn new(packages_dir: impl Into<PathBuf>) -> Self {
        Self {
            packages_dir: packages_dir.into(),
        }
    }

    fn package_entries(&self, library: &str) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.packages_dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name_matches(library, name))
            .collect();
        names.sort();
        names
    }
}

impl Backend for Slackware {
    fn name(&self) -> &'static str {
        "slackware"
    }

    fn is_available(&self, _runner: &dyn CommandRunner) -> bool {
        self.packages_dir.is_dir()
    }

    fn find(&self, ctx: &SearchContext<'_>, library: &str) -> Vec<CandidateFile> {
        let library = strip_lib_prefix(library);
        let mut files = Vec::new();

        // pcre-8.45-x86_64-1
        for package in self.package_entries(library) {
            let (name, raw_version) = split_name_version(&package);
            let Some(version) = ctx.accepted_version(raw_version.unwrap_or_default()) else {
                continue;
            };
            if !name_matches(library, &name) {
                continue;
            }

            let metadata = match read_to_string_lossy(&self.packages_dir.join(&package)) {
                Ok(text) => text,
                Err(e) => {
                    debug!(package = %package, error = %e, "slackware: unreadable package entry");
                    continue;
                }
            };
            if !metadata.contains(FILE_LIST_MARKER) {
                continue;
            }
            let listing: Vec<String> = after(&metadata, FILE_LIST_MARKER)
                .lines()
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(|entry| format!("/{}", entry.trim_start_matches('/')))
                .collect();
            files.extend(owned_files(listing.iter().map(String::as_str), version));
        }

        files
    }
}
