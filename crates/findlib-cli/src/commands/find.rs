use super::{discoverer, print_json};
use findlib_core::Config;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

/// Which entry point to use.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// `NAME.h`
    Header,
    /// `NAME.a`
    Static,
    /// `NAME.so` / `.dylib` / `.dll`
    Shared,
    /// Static if present, else shared
    Any,
}

#[derive(Serialize)]
struct FindResult<'a> {
    ok: bool,
    name: &'a str,
    constraint: Option<&'a str>,
    path: Option<String>,
}

/// Run the find command. Exits with status 1 when nothing matched.
pub fn run(
    config: &Config,
    kind: Kind,
    name: &str,
    constraint: Option<&str>,
    json: bool,
) -> Result<()> {
    let discoverer = discoverer(config);
    let found = match kind {
        Kind::Header => discoverer.header_file(name, constraint),
        Kind::Static => discoverer.static_library(name, constraint),
        Kind::Shared => discoverer.shared_library(name, constraint),
        Kind::Any => discoverer.static_or_shared_library(name, constraint),
    }
    .into_diagnostic()?;

    if json {
        print_json(&FindResult {
            ok: found.is_some(),
            name,
            constraint,
            path: found.as_ref().map(|p| p.display().to_string()),
        })?;
    } else if let Some(path) = &found {
        println!("{}", path.display());
    } else {
        eprintln!("error: no match for {name}");
    }

    if found.is_none() {
        std::process::exit(1);
    }
    Ok(())
}
