use super::print_json;
use findlib_core::exec::program_paths;
use miette::Result;

/// Print every matching executable on `PATH`. Exits with status 1 when
/// nothing was found.
pub fn run(programs: &[String], json: bool) -> Result<()> {
    let names: Vec<&str> = programs.iter().map(String::as_str).collect();
    let paths: Vec<String> = program_paths(&names)
        .iter()
        .map(|p| p.display().to_string())
        .collect();

    if json {
        print_json(&paths)?;
    } else {
        for path in &paths {
            println!("{path}");
        }
    }

    if paths.is_empty() {
        if !json {
            eprintln!("error: none of {} found on PATH", names.join(", "));
        }
        std::process::exit(1);
    }
    Ok(())
}
