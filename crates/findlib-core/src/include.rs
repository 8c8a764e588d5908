//! Locating include directories for a header.

use std::path::{Path, PathBuf};

use findlib_util::fs::walk_files;

/// Roots searched by [`header_dir`].
pub const DEFAULT_INCLUDE_DIRS: [&str; 2] = ["/usr/include", "/usr/local/include"];

/// Path fragments that mark a directory as belonging to this host.
fn arch_markers() -> Vec<&'static str> {
    let width = if cfg!(target_pointer_width = "64") {
        "lib64"
    } else {
        "lib32"
    };
    vec![width, std::env::consts::ARCH]
}

/// Directory containing `header_name` under the default include roots.
pub fn header_dir(header_name: &str) -> Option<PathBuf> {
    let roots: Vec<PathBuf> = DEFAULT_INCLUDE_DIRS.iter().map(PathBuf::from).collect();
    header_dir_in(&roots, header_name)
}

/// Directory containing `header_name` under `roots`.
///
/// The last match whose path mentions the host architecture wins over the
/// first match found.
pub fn header_dir_in(roots: &[PathBuf], header_name: &str) -> Option<PathBuf> {
    let matches: Vec<PathBuf> = roots
        .iter()
        .flat_map(|root| walk_files(root))
        .filter(|path| path.to_string_lossy().ends_with(header_name))
        .collect();

    let markers = arch_markers();
    let preferred = matches.iter().rfind(|path| {
        let text = path.to_string_lossy();
        markers.iter().any(|marker| text.contains(marker))
    });

    preferred
        .or_else(|| matches.first())
        .and_then(|path| path.parent())
        .map(Path::to_path_buf)
}

/// `-I<dir>` for the directory containing `header_name`.
pub fn include_flag(header_name: &str) -> Option<String> {
    header_dir(header_name).map(|dir| format!("-I{}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_first_match_without_arch_hint() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("a/pcre.h"));
        touch(&root.path().join("b/pcre.h"));

        let dir = header_dir_in(&[root.path().to_path_buf()], "pcre.h").unwrap();
        assert_eq!(dir, root.path().join("a"));
    }

    #[test]
    fn test_arch_match_preferred() {
        let root = tempfile::tempdir().unwrap();
        let arch_dir = format!("{}-linux-gnu", std::env::consts::ARCH);
        touch(&root.path().join("a/pcre.h"));
        touch(&root.path().join(&arch_dir).join("pcre.h"));

        let dir = header_dir_in(&[root.path().to_path_buf()], "pcre.h").unwrap();
        assert_eq!(dir, root.path().join(arch_dir));
    }

    #[test]
    fn test_last_arch_match_wins() {
        let root = tempfile::tempdir().unwrap();
        let arch_dir = format!("{}-linux-gnu", std::env::consts::ARCH);
        touch(&root.path().join("a").join(&arch_dir).join("pcre.h"));
        touch(&root.path().join("b").join(&arch_dir).join("pcre.h"));
        touch(&root.path().join("c/pcre.h"));

        let dir = header_dir_in(&[root.path().to_path_buf()], "pcre.h").unwrap();
        assert_eq!(dir, root.path().join("b").join(arch_dir));
    }

    #[test]
    fn test_missing_header() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("zlib.h"));
        assert_eq!(header_dir_in(&[root.path().to_path_buf()], "pcre.h"), None);
        assert_eq!(header_dir_in(&[], "pcre.h"), None);
        assert_eq!(include_flag("findlib-no-such-header-9f3b.h"), None);
    }
}
