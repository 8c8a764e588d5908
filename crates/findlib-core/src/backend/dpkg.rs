use tracing::debug;

use super::{after, before, before_last, name_matches, owned_files, Backend, CandidateFile, SearchContext};
use crate::exec::{shell_quote, CommandRunner};

/// Debian's `dpkg`. Matches the library name as given, `lib` prefix included.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dpkg;

impl Backend for Dpkg {
    fn name(&self) -> &'static str {
        "dpkg"
    }

    fn is_available(&self, runner: &dyn CommandRunner) -> bool {
        runner.program_exists("dpkg")
    }

    fn find(&self, ctx: &SearchContext<'_>, library: &str) -> Vec<CandidateFile> {
        let mut files = Vec::new();

        // ii  libpcre3:amd64  2:8.39-13ubuntu0.22.04.1  amd64  Old Perl 5 ...
        for line in ctx.grep_packages("dpkg --list", library) {
            let columns: Vec<&str> = line.split_whitespace().collect();
            let (Some(package), Some(raw_version)) = (columns.get(1), columns.get(2)) else {
                debug!(line = %line, "dpkg: skipping malformed line");
                continue;
            };
            let name = before(package, ":");
            if !name_matches(library, name) {
                continue;
            }
            let Some(version) = ctx.accepted_version(before_last(after(raw_version, ":"), "-"))
            else {
                continue;
            };

            let listing = ctx.lines(&format!("dpkg -L {}", shell_quote(name)));
            files.extend(owned_files(listing.iter().map(String::as_str), version));
        }

        files
    }
}
