pub mod check;
pub mod daemon;
pub mod files;
pub mod find;
pub mod include;
pub mod ping;
pub mod stats;
pub mod stop;
pub mod version;
pub mod which;

use findlib_core::{Config, Discoverer, NoCache, ShellRunner};
use findlib_daemon::CacheClient;

/// A discoverer wired to the cache daemon unless caching is disabled.
pub fn discoverer(config: &Config) -> Discoverer {
    if config.no_cache {
        Discoverer::new(Box::new(ShellRunner), Box::new(NoCache))
    } else {
        Discoverer::new(Box::new(ShellRunner), Box::new(CacheClient::from_config(config)))
    }
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> miette::Result<()> {
    use miette::IntoDiagnostic;
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}
