use findlib_core::Config;
use findlib_daemon::{run_server, CacheHandler, DaemonConfig};
use miette::{IntoDiagnostic, Result};
use std::io::Write;
use std::sync::Arc;

/// Run the cache daemon in the foreground until a `stop` request arrives.
pub fn run(config: &Config) -> Result<()> {
    let daemon_config = DaemonConfig {
        addr: config.cache_addr,
    };

    eprintln!("cache daemon listening at {}", daemon_config.addr);
    std::io::stderr().flush().into_diagnostic()?;

    let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
    runtime.block_on(async {
        run_server(daemon_config, Arc::new(CacheHandler::default()))
            .await
            .into_diagnostic()
    })
}
