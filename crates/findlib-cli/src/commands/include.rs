use super::print_json;
use findlib_core::header_dir;
use miette::Result;
use serde::Serialize;

#[derive(Serialize)]
struct IncludeResult<'a> {
    ok: bool,
    header: &'a str,
    dir: Option<String>,
    flag: Option<String>,
}

/// Print `-I<dir>` for the directory holding `header`.
pub fn run(header: &str, json: bool) -> Result<()> {
    let dir = header_dir(header).map(|d| d.display().to_string());
    let flag = dir.as_ref().map(|d| format!("-I{d}"));

    if json {
        print_json(&IncludeResult {
            ok: dir.is_some(),
            header,
            dir: dir.clone(),
            flag: flag.clone(),
        })?;
    } else if let Some(flag) = &flag {
        println!("{flag}");
    } else {
        eprintln!("error: {header} not found under the system include directories");
    }

    if dir.is_none() {
        std::process::exit(1);
    }
    Ok(())
}
