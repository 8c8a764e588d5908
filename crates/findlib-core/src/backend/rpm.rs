use tracing::debug;

use super::{name_matches, owned_files, strip_lib_prefix, Backend, CandidateFile, SearchContext};
use crate::exec::{shell_quote, CommandRunner};

/// RPM based distributions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rpm;

/// Value of a `Key : value` line in `rpm -qi` output.
fn info_field<'a>(info: &'a str, key: &str) -> Option<&'a str> {
    info.lines().find_map(|line| {
        let (k, v) = line.split_once(':')?;
        (k.trim() == key).then(|| v.trim())
    })
}

impl Backend for Rpm {
    fn name(&self) -> &'static str {
        "rpm"
    }

    fn is_available(&self, runner: &dyn CommandRunner) -> bool {
        runner.program_exists("rpm")
    }

    fn find(&self, ctx: &SearchContext<'_>, library: &str) -> Vec<CandidateFile> {
        let library = strip_lib_prefix(library);
        let mut files = Vec::new();

        for package in ctx.grep_packages("rpm -qa", library) {
            let package = package.trim();
            let Some(info) = ctx.runner.stdout(&format!("rpm -qi {}", shell_quote(package))) else {
                continue;
            };
            let (Some(name), Some(raw_version)) =
                (info_field(&info, "Name"), info_field(&info, "Version"))
            else {
                debug!(package, "rpm: no Name/Version in package info");
                continue;
            };
            if !name_matches(library, name) {
                continue;
            }
            let Some(version) = ctx.accepted_version(raw_version) else {
                continue;
            };

            let listing = ctx.lines(&format!("rpm -ql {}", shell_quote(package)));
            files.extend(owned_files(listing.iter().map(String::as_str), version));
        }

        files
    }
}
