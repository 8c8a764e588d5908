use std::fmt::Write;

pub use findlib_expr::{VersionTuple, SMOKE_TEST_VERSION};

/// The current version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns a formatted version string including build metadata if available.
#[must_use]
pub fn version_string() -> String {
    let mut s = format!("findlib {VERSION}");

    if let Some(hash) = option_env!("FINDLIB_BUILD_GIT_HASH") {
        let _ = write!(s, " ({hash})");
    }

    s
}

/// How much of a package version string made it into the tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionParse {
    /// Every segment was numeric and there were at most three.
    Exact,
    /// Leading numeric segments were used; the rest was dropped.
    Truncated,
    /// Nothing numeric was found; the version is 0.0.0.
    Defaulted,
}

/// A leniently parsed package version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedVersion {
    pub version: VersionTuple,
    pub outcome: VersionParse,
}

impl ParsedVersion {
    /// True when the version is not exactly what the string said.
    pub fn is_fallback(&self) -> bool {
        self.outcome != VersionParse::Exact
    }
}

/// Parse a package version string such as `8.31`, `2.4.1-3` or `1.2.3a`.
///
/// Never fails: segments are split on `.` and `-`, and parsing stops at the
/// first segment that is not a plain number or after three numbers.
/// Components that were not found are 0.
pub fn parse_version(raw: &str) -> ParsedVersion {
    let trimmed = raw.trim();
    let mut fields = [0u32; 3];
    let mut found = 0;
    let mut truncated = false;

    for segment in trimmed.split(['.', '-']) {
        if found == fields.len() {
            truncated = true;
            break;
        }
        match segment.parse::<u32>() {
            Ok(n) if segment.bytes().all(|b| b.is_ascii_digit()) => {
                fields[found] = n;
                found += 1;
            }
            _ => {
                truncated = true;
                break;
            }
        }
    }

    let outcome = if found == 0 {
        VersionParse::Defaulted
    } else if truncated {
        VersionParse::Truncated
    } else {
        VersionParse::Exact
    };
    let version = VersionTuple::new(fields[0], fields[1], fields[2]);

    if outcome != VersionParse::Exact {
        tracing::debug!(raw, %version, ?outcome, "lenient version parse");
    }

    ParsedVersion { version, outcome }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_not_empty() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_version_string_contains_version() {
        let vs = version_string();
        assert!(vs.contains(VERSION));
        assert!(vs.starts_with("findlib "));
    }

    #[test]
    fn test_parse_exact() {
        let parsed = parse_version("8.31");
        assert_eq!(parsed.version, VersionTuple::new(8, 31, 0));
        assert_eq!(parsed.outcome, VersionParse::Exact);
        assert!(!parsed.is_fallback());

        assert_eq!(parse_version("1.2.3").version, VersionTuple::new(1, 2, 3));
        assert_eq!(parse_version("2.4-1").version, VersionTuple::new(2, 4, 1));
    }

    #[test]
    fn test_parse_truncated() {
        let parsed = parse_version("1.2.3a");
        assert_eq!(parsed.version, VersionTuple::new(1, 2, 0));
        assert_eq!(parsed.outcome, VersionParse::Truncated);

        let parsed = parse_version("1.2.3.4");
        assert_eq!(parsed.version, VersionTuple::new(1, 2, 3));
        assert_eq!(parsed.outcome, VersionParse::Truncated);
    }

    #[test]
    fn test_parse_defaulted() {
        for raw in ["", "git", "+1.0", "-1"] {
            let parsed = parse_version(raw);
            assert_eq!(parsed.version, VersionTuple::default(), "{raw:?}");
            assert_eq!(parsed.outcome, VersionParse::Defaulted, "{raw:?}");
        }
    }

    #[test]
    fn test_parse_overflowing_segment() {
        let parsed = parse_version("1.99999999999");
        assert_eq!(parsed.version, VersionTuple::new(1, 0, 0));
        assert!(parsed.is_fallback());
    }
}
