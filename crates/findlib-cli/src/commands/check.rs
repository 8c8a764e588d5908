use super::print_json;
use findlib_core::version::{parse_version, SMOKE_TEST_VERSION};
use findlib_core::Constraint;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

#[derive(Serialize)]
struct CheckResult<'a> {
    constraint: &'a str,
    version: String,
    accepted: bool,
}

/// Compile `expr` and evaluate it. Exits with status 1 when the version is
/// rejected; an invalid constraint is reported as an error.
pub fn run(expr: &str, ver: Option<&str>, json: bool) -> Result<()> {
    let constraint = Constraint::compile(expr).into_diagnostic()?;

    let version = match ver {
        Some(raw) => {
            let parsed = parse_version(raw);
            if parsed.is_fallback() {
                tracing::warn!(raw, version = %parsed.version, "version only partially parsed");
            }
            parsed.version
        }
        None => SMOKE_TEST_VERSION,
    };
    let accepted = constraint.accepts(version);

    if json {
        print_json(&CheckResult {
            constraint: expr,
            version: version.to_string(),
            accepted,
        })?;
    } else {
        println!("{accepted}");
    }

    if !accepted {
        std::process::exit(1);
    }
    Ok(())
}
