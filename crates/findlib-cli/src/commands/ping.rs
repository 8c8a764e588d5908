use super::print_json;
use findlib_core::Config;
use findlib_daemon::CacheClient;
use miette::Result;
use serde::Serialize;

/// Ping response for JSON output.
#[derive(Serialize)]
struct PingResult {
    ok: bool,
    nonce: u64,
    server_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Ping the cache daemon. Exits with status 1 when it does not answer.
pub fn run(config: &Config, json: bool) -> Result<()> {
    // Truncation is fine for nonce purposes
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);

    let client = CacheClient::from_config(config);
    match client.ping(nonce) {
        Ok(server_version) => {
            if json {
                print_json(&PingResult {
                    ok: true,
                    nonce,
                    server_version,
                    error: None,
                })?;
            } else {
                println!("pong");
            }
            Ok(())
        }
        Err(e) => {
            if json {
                print_json(&PingResult {
                    ok: false,
                    nonce,
                    server_version: String::new(),
                    error: Some(e.to_string()),
                })?;
            } else {
                eprintln!("error: cache daemon not running at {} ({e})", client.addr());
                eprintln!("hint: start with `findlib daemon`");
            }
            std::process::exit(1);
        }
    }
}
