use super::{discoverer, print_json};
use findlib_core::Config;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

#[derive(Serialize)]
struct FilesResult<'a> {
    name: &'a str,
    constraint: Option<&'a str>,
    source: String,
    files: Vec<String>,
}

/// List every discovered file, one per line. Exits with status 1 when the
/// list is empty.
pub fn run(config: &Config, name: &str, constraint: Option<&str>, json: bool) -> Result<()> {
    let outcome = discoverer(config)
        .discover(name, constraint)
        .into_diagnostic()?;
    let files: Vec<String> = outcome
        .files
        .iter()
        .map(|p| p.display().to_string())
        .collect();

    if json {
        print_json(&FilesResult {
            name,
            constraint,
            source: outcome.source.to_string(),
            files: files.clone(),
        })?;
    } else {
        for file in &files {
            println!("{file}");
        }
        if files.is_empty() {
            eprintln!("error: no files found for {name}");
        } else {
            eprintln!("{} file(s) from {}", files.len(), outcome.source);
        }
    }

    if files.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}
