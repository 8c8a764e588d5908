use tracing::debug;

use super::{before, name_matches, owned_files, strip_lib_prefix, Backend, CandidateFile, SearchContext};
use crate::exec::{shell_quote, CommandRunner};

/// BSD `pkg_info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PkgInfo;

impl Backend for PkgInfo {
    fn name(&self) -> &'static str {
        "pkg_info"
    }

    fn is_available(&self, runner: &dyn CommandRunner) -> bool {
        runner.program_exists("pkg_info")
    }

    fn find(&self, ctx: &SearchContext<'_>, library: &str) -> Vec<CandidateFile> {
        let library = strip_lib_prefix(library);
        let mut files = Vec::new();

        // pcre-8.45_3    Perl Compatible Regular Expressions library
        for line in ctx.grep_packages("pkg_info", library) {
            let Some(name) = line.split_whitespace().next() else {
                debug!(line = %line, "pkg_info: skipping malformed line");
                continue;
            };
            let last = name.rsplit('-').next().unwrap_or_default();
            let Some(version) = ctx.accepted_version(before(last, "_")) else {
                continue;
            };
            if !name_matches(library, name) {
                continue;
            }

            let listing = ctx.lines(&format!("pkg_info -L {}", shell_quote(name)));
            files.extend(owned_files(listing.iter().map(String::as_str), version));
        }

        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{ctx, paths, touch, FakeRunner};
    use crate::constraint::Constraint;

    #[test]
    fn test_pkg_info_find() {
        let dir = tempfile::tempdir().unwrap();
        let files = touch(dir.path(), &["lib/libpcre.a"]);
        let runner = FakeRunner::new()
            .program("pkg_info")
            .output("pkg_info | grep -i pcre", "pcre-8.45_3    Perl Compatible Regular Expressions")
            .output(
                "pkg_info -L pcre-8.45_3",
                &format!("Information for pcre-8.45_3:\n\nFiles:\n{}", files[0]),
            );

        let found = PkgInfo.find(&ctx(&runner, None), "pcre");
        assert_eq!(paths(&found), files);

        let constraint = Constraint::compile("ver.minor == 45").unwrap();
        assert_eq!(PkgInfo.find(&ctx(&runner, Some(&constraint)), "pcre").len(), 1);
    }
}
