use tracing::debug;

use super::{name_matches, owned_files, strip_lib_prefix, Backend, CandidateFile, SearchContext};
use crate::exec::{shell_quote, CommandRunner};
use crate::select::best_name;

/// Arch Linux `pacman`. Only the best matching package name is considered.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pacman;

impl Backend for Pacman {
    fn name(&self) -> &'static str {
        "pacman"
    }

    fn is_available(&self, runner: &dyn CommandRunner) -> bool {
        runner.program_exists("pacman")
    }

    fn find(&self, ctx: &SearchContext<'_>, library: &str) -> Vec<CandidateFile> {
        let library = strip_lib_prefix(library);
        let mut files = Vec::new();

        // core pcre 8.45-4 [installed]
        let listing = ctx.grep_packages("pacman -Sl", library);
        let rows: Vec<Vec<&str>> = listing
            .iter()
            .map(|line| line.split_whitespace().collect::<Vec<_>>())
            .filter(|columns| {
                let ok = columns.len() >= 3;
                if !ok {
                    debug!(?columns, "pacman: skipping malformed line");
                }
                ok
            })
            .collect();

        let names: Vec<&str> = rows.iter().map(|columns| columns[1]).collect();
        let Some(best) = best_name(&names, library) else {
            return files;
        };

        for columns in &rows {
            let name = columns[1];
            if name != best || !name_matches(library, name) {
                continue;
            }
            let raw_version = columns[2].split('-').next().unwrap_or_default();
            let Some(version) = ctx.accepted_version(raw_version) else {
                continue;
            };

            // pcre /usr/lib/libpcre.so
            let owned = ctx.lines(&format!("pacman -Ql {}", shell_quote(name)));
            files.extend(owned_files(
                owned.iter().filter_map(|line| line.split_whitespace().nth(1)),
                version,
            ));
        }

        files
    }
}
