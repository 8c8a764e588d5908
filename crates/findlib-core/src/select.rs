//! Deterministic best-match selection.

use std::path::{Path, PathBuf};

use crate::backend::strip_lib_prefix;

/// Extension of shared libraries on the build target.
pub const fn shared_library_extension() -> &'static str {
    if cfg!(target_os = "macos") {
        ".dylib"
    } else if cfg!(windows) {
        ".dll"
    } else {
        ".so"
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Pick the file that best matches `{library}{extension}`.
///
/// A leading `lib` is removed from `library` first. Tiers, first hit wins:
/// exact file name, exact ignoring case, file name ending with the target,
/// and ending with it ignoring case. Within a tier the earliest candidate
/// wins.
pub fn select_best<P: AsRef<Path>>(
    candidates: &[P],
    library: &str,
    extension: &str,
) -> Option<PathBuf> {
    let desired = format!("{}{extension}", strip_lib_prefix(library));
    let desired_lower = desired.to_lowercase();
    let names: Vec<String> = candidates.iter().map(|c| file_name(c.as_ref())).collect();

    let tiers: [&dyn Fn(&str) -> bool; 4] = [
        &|name: &str| name == desired,
        &|name: &str| name.to_lowercase() == desired_lower,
        &|name: &str| name.ends_with(&desired),
        &|name: &str| name.to_lowercase().ends_with(&desired_lower),
    ];

    tiers.iter().find_map(|matches| {
        names
            .iter()
            .position(|name| matches(name.as_str()))
            .map(|i| candidates[i].as_ref().to_path_buf())
    })
}

/// Pick the package name that best matches `desired`.
///
/// Tiers: exact, exact ignoring case, starts or ends with `desired`, and
/// starts or ends with it ignoring case.
pub fn best_name<'a>(names: &[&'a str], desired: &str) -> Option<&'a str> {
    let lower = desired.to_lowercase();

    let tiers: [&dyn Fn(&str) -> bool; 4] = [
        &|name: &str| name == desired,
        &|name: &str| name.to_lowercase() == lower,
        &|name: &str| name.starts_with(desired) || name.ends_with(desired),
        &|name: &str| {
            let name = name.to_lowercase();
            name.starts_with(&lower) || name.ends_with(&lower)
        },
    ];

    tiers
        .iter()
        .find_map(|matches| names.iter().copied().find(|name| matches(*name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_best_independent_of_order() {
        let candidates = ["/l/libpcre.so.3", "/l/libpcre.so", "/l/other.so"];
        assert_eq!(
            select_best(&candidates, "libpcre", ".so"),
            Some(PathBuf::from("/l/libpcre.so"))
        );

        let reversed = ["/l/other.so", "/l/libpcre.so", "/l/libpcre.so.3"];
        assert_eq!(
            select_best(&reversed, "libpcre", ".so"),
            Some(PathBuf::from("/l/libpcre.so"))
        );
    }

    #[test]
    fn test_select_best_tier_order() {
        // Exact beats a case-insensitive exact and a suffix match.
        let candidates = ["/a/libPCRE.h", "/b/PCRE.h", "/c/pcre.h"];
        assert_eq!(
            select_best(&candidates, "pcre", ".h"),
            Some(PathBuf::from("/c/pcre.h"))
        );

        // Case-insensitive exact beats a case-sensitive suffix match.
        let candidates = ["/a/libpcre.h", "/b/PCRE.h"];
        assert_eq!(
            select_best(&candidates, "pcre", ".h"),
            Some(PathBuf::from("/b/PCRE.h"))
        );

        // Only a case-insensitive suffix match.
        let candidates = ["/a/libPCRE.a"];
        assert_eq!(
            select_best(&candidates, "pcre", ".a"),
            Some(PathBuf::from("/a/libPCRE.a"))
        );
    }

    #[test]
    fn test_select_best_matches_basename_only() {
        let candidates = ["/pcre.h/readme.txt"];
        assert_eq!(select_best(&candidates, "pcre", ".h"), None);
        assert_eq!(select_best::<&str>(&[], "pcre", ".h"), None);
    }

    #[test]
    fn test_best_name() {
        let names = ["pcre2", "pcre", "PCRE"];
        assert_eq!(best_name(&names, "pcre"), Some("pcre"));
        assert_eq!(best_name(&["PCRE", "pcre2"], "pcre"), Some("PCRE"));
        assert_eq!(best_name(&["xpcre", "pcre2"], "pcre"), Some("xpcre"));
        assert_eq!(best_name(&["PCRE-tools"], "pcre"), Some("PCRE-tools"));
        assert_eq!(best_name(&["zlib"], "pcre"), None);
    }

    #[test]
    fn test_shared_extension() {
        assert!(shared_library_extension().starts_with('.'));
    }
}
