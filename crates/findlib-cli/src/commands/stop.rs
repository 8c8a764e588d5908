use findlib_core::Config;
use findlib_daemon::CacheClient;
use miette::Result;

/// Stop the running cache daemon by sending a shutdown request.
pub fn run(config: &Config) -> Result<()> {
    match CacheClient::from_config(config).shutdown() {
        Ok(()) => {
            eprintln!("daemon stopped");
            Ok(())
        }
        Err(e) => {
            eprintln!("error: daemon not running ({e})");
            std::process::exit(1);
        }
    }
}
