use tracing::debug;

use super::{name_matches, owned_files, strip_lib_prefix, Backend, CandidateFile, SearchContext};
use crate::exec::{shell_quote, CommandRunner};

/// MacPorts. Only `devel/` ports are considered.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ports;

impl Backend for Ports {
    fn name(&self) -> &'static str {
        "ports"
    }

    fn is_available(&self, runner: &dyn CommandRunner) -> bool {
        runner.program_exists("port")
    }

    fn find(&self, ctx: &SearchContext<'_>, library: &str) -> Vec<CandidateFile> {
        let library = strip_lib_prefix(library);
        let mut files = Vec::new();

        // pcre                           @8.45           devel/pcre
        for line in ctx.grep_packages("port list", library) {
            let columns: Vec<&str> = line.split_whitespace().collect();
            let [name, raw_version, category, ..] = columns.as_slice() else {
                debug!(line = %line, "ports: skipping malformed line");
                continue;
            };
            if !name_matches(library, name) || !category.starts_with("devel/") {
                continue;
            }
            let raw_version = raw_version.trim_start_matches('@');
            if raw_version.is_empty() {
                continue;
            }
            let Some(version) = ctx.accepted_version(raw_version) else {
                continue;
            };

            let listing = ctx.lines(&format!("port contents {}", shell_quote(name)));
            files.extend(owned_files(listing.iter().map(String::as_str), version));
        }

        files
    }
}
