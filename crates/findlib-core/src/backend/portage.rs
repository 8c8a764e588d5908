use super::{after, name_matches, owned_files, split_name_version, Backend, CandidateFile, SearchContext};
use crate::exec::{shell_quote, CommandRunner};

/// Gentoo's portage, queried through `qlist`. Matches the library name as
/// given, `lib` prefix included.
#[derive(Debug, Clone, Copy, Default)]
pub struct Portage;

impl Backend for Portage {
    fn name(&self) -> &'static str {
        "portage"
    }

    fn is_available(&self, runner: &dyn CommandRunner) -> bool {
        runner.program_exists("qlist")
    }

    fn find(&self, ctx: &SearchContext<'_>, library: &str) -> Vec<CandidateFile> {
        let mut files = Vec::new();

        // dev-libs/libpcre-8.45-r1
        for package in ctx.grep_packages("qlist -C -I -v", library) {
            let (qualified, raw_version) = split_name_version(package.trim());
            let Some(version) = ctx.accepted_version(raw_version.unwrap_or_default()) else {
                continue;
            };
            let name = after(&qualified, "/");
            if !name_matches(library, name) {
                continue;
            }

            let listing = ctx.lines(&format!("qlist -C {}", shell_quote(name)));
            files.extend(owned_files(listing.iter().map(String::as_str), version));
        }

        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{ctx, paths, touch, FakeRunner};

    #[test]
    fn test_portage_find() {
        let dir = tempfile::tempdir().unwrap();
        let files = touch(dir.path(), &["libpcre.so.1", "pcre.h"]);
        let runner = FakeRunner::new()
            .program("qlist")
            .output("qlist -C -I -v | grep -i libpcre", "dev-libs/libpcre-8.45-r1")
            .output("qlist -C libpcre", &files.join("\n"));

        let found = Portage.find(&ctx(&runner, None), "libpcre");
        assert_eq!(paths(&found), files);
        assert_eq!(found[0].version, Some(crate::VersionTuple::new(8, 45, 0)));
    }
}
