use std::path::Path;

use tracing::debug;

use super::{name_matches, strip_lib_prefix, Backend, CandidateFile, SearchContext};
use crate::exec::{shell_quote, CommandRunner};
use findlib_util::fs::walk_files;

/// `pkg-config` modules. Files come from walking the module's `libdir` and
/// `includedir` rather than from a package file list.
#[derive(Debug, Clone, Copy, Default)]
pub struct PkgConfig;

impl PkgConfig {
    fn query(ctx: &SearchContext<'_>, args: &str, module: &str) -> Option<String> {
        ctx.runner
            .stdout(&format!("pkg-config {args} {}", shell_quote(module)))
            .map(|out| out.trim().to_string())
            .filter(|out| !out.is_empty())
    }
}

/// Files below `dir` that belong to `library`: everything in a directory
/// whose path names the library, plus `lib<library>*` files elsewhere.
fn library_files_under(dir: &Path, library: &str) -> Vec<std::path::PathBuf> {
    let library = library.to_lowercase();
    let prefixed = format!("lib{library}");
    walk_files(dir)
        .into_iter()
        .filter(|path| {
            let parent = path
                .parent()
                .map(|p| p.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            parent.contains(&library) || file_name.contains(&prefixed)
        })
        .collect()
}

impl Backend for PkgConfig {
    fn name(&self) -> &'static str {
        "pkg-config"
    }

    fn is_available(&self, runner: &dyn CommandRunner) -> bool {
        runner.program_exists("pkg-config")
    }

    fn find(&self, ctx: &SearchContext<'_>, library: &str) -> Vec<CandidateFile> {
        let library = strip_lib_prefix(library);
        let mut files = Vec::new();

        // libpcre    libpcre - PCRE - Perl compatible regular expressions C library
        for line in ctx.grep_packages("pkg-config --list-all", library) {
            let Some(module) = line.split_whitespace().next() else {
                continue;
            };
            if !name_matches(library, module) {
                continue;
            }

            let (Some(raw_version), Some(libdir), Some(includedir)) = (
                Self::query(ctx, "--modversion", module),
                Self::query(ctx, "--variable=libdir", module),
                Self::query(ctx, "--variable=includedir", module),
            ) else {
                debug!(module, "pkg-config: incomplete module metadata");
                continue;
            };
            let Some(version) = ctx.accepted_version(&raw_version) else {
                continue;
            };

            for dir in [libdir, includedir] {
                files.extend(
                    library_files_under(Path::new(&dir), library)
                        .into_iter()
                        .map(|path| CandidateFile::new(path, Some(version))),
                );
            }
        }

        files
    }
}
