use super::print_json;
use findlib_core::Config;
use findlib_daemon::CacheClient;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

#[derive(Serialize)]
struct StatsResult {
    entries: usize,
    tracked_files: usize,
}

pub fn run(config: &Config, json: bool) -> Result<()> {
    let stats = CacheClient::from_config(config).stats().into_diagnostic()?;
    if json {
        print_json(&StatsResult {
            entries: stats.entries,
            tracked_files: stats.tracked_files,
        })
    } else {
        println!("entries: {}", stats.entries);
        println!("tracked files: {}", stats.tracked_files);
        Ok(())
    }
}
