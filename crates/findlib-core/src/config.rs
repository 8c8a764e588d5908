use std::net::SocketAddr;
use std::time::Duration;

use crate::error::Error;

/// Default cache service address.
pub const DEFAULT_CACHE_ADDR: &str = "127.0.0.1:9000";

/// Default per-call cache timeout in milliseconds.
pub const DEFAULT_CACHE_TIMEOUT_MS: u64 = 500;

pub const ENV_CACHE_ADDR: &str = "FINDLIB_CACHE_ADDR";
pub const ENV_CACHE_TIMEOUT_MS: &str = "FINDLIB_CACHE_TIMEOUT_MS";
pub const ENV_NO_CACHE: &str = "FINDLIB_NO_CACHE";

/// Runtime configuration shared by the CLI, the cache client and the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where the cache service listens.
    pub cache_addr: SocketAddr,

    /// Connect/read/write timeout for one cache call.
    pub cache_timeout: Duration,

    /// Skip the cache entirely.
    pub no_cache: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_addr: SocketAddr::from(([127, 0, 0, 1], 9000)),
            cache_timeout: Duration::from_millis(DEFAULT_CACHE_TIMEOUT_MS),
            no_cache: false,
        }
    }
}

impl Config {
    /// Build a config from defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from defaults overridden by `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = Self::default();

        if let Some(addr) = lookup(ENV_CACHE_ADDR) {
            config.cache_addr = parse_addr(ENV_CACHE_ADDR, &addr)?;
        }

        if let Some(ms) = lookup(ENV_CACHE_TIMEOUT_MS) {
            let ms: u64 = ms.trim().parse().map_err(|e| Error::Config {
                name: ENV_CACHE_TIMEOUT_MS,
                message: format!("{ms:?}: {e}"),
            })?;
            if ms == 0 {
                return Err(Error::Config {
                    name: ENV_CACHE_TIMEOUT_MS,
                    message: "timeout must be positive".to_string(),
                });
            }
            config.cache_timeout = Duration::from_millis(ms);
        }

        if let Some(flag) = lookup(ENV_NO_CACHE) {
            config.no_cache = parse_flag(ENV_NO_CACHE, &flag)?;
        }

        Ok(config)
    }

    /// Set the cache address.
    #[must_use]
    pub fn with_cache_addr(mut self, addr: SocketAddr) -> Self {
        self.cache_addr = addr;
        self
    }

    /// Set the cache timeout.
    #[must_use]
    pub fn with_cache_timeout(mut self, timeout: Duration) -> Self {
        self.cache_timeout = timeout;
        self
    }

    /// Disable or enable the cache.
    #[must_use]
    pub fn with_no_cache(mut self, no_cache: bool) -> Self {
        self.no_cache = no_cache;
        self
    }
}

/// Parse a `host:port` cache address.
pub fn parse_addr(name: &'static str, value: &str) -> Result<SocketAddr, Error> {
    value.trim().parse().map_err(|e| Error::Config {
        name,
        message: format!("{value:?}: {e}"),
    })
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config {
            name,
            message: format!("expected a boolean, got {other:?}"),
        }),
    }
}
