//! Request handlers plugged into the server loop.

use crate::store::CacheStore;
use findlib_proto::{codes, Request, Response, Status, PROTO_SCHEMA_VERSION};
use std::sync::Arc;
use tracing::debug;

/// Turns one request into one response.
///
/// The returned flag asks the server loop to stop accepting connections.
pub trait Handler: Send + Sync {
    fn handle(&self, request: &Request) -> (Response, bool);
}

/// Reject frames from clients speaking another protocol version.
pub fn check_version(client_proto_version: u32) -> Result<(), Response> {
    if client_proto_version == PROTO_SCHEMA_VERSION {
        return Ok(());
    }
    Err(Response::fail(
        codes::PROTO_VERSION_MISMATCH,
        format!(
            "Protocol version mismatch: client={client_proto_version}, server={PROTO_SCHEMA_VERSION}"
        ),
    ))
}

/// Serves the discovery cache from a [`CacheStore`].
#[derive(Debug, Clone, Default)]
pub struct CacheHandler {
    store: Arc<CacheStore>,
}

impl CacheHandler {
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }
}

impl Handler for CacheHandler {
    fn handle(&self, request: &Request) -> (Response, bool) {
        debug!(request = request.name(), "handling request");
        match request {
            Request::CacheFile { file } => {
                let change = self.store.file_changed(file);
                (
                    Response::CacheFile {
                        status: Status::Ok,
                        has_changed: change.to_wire(),
                        file: file.clone(),
                    },
                    false,
                )
            }
            Request::SetData { key, value } => {
                self.store.set(key.clone(), value.clone());
                (
                    Response::SetData {
                        status: Status::Ok,
                        key: key.clone(),
                    },
                    false,
                )
            }
            Request::GetData { key } => (
                Response::GetData {
                    status: Status::Ok,
                    key: key.clone(),
                    value: self.store.get(key),
                },
                false,
            ),
            Request::Ping { nonce } => (Response::pong(*nonce), false),
            Request::Stats => (
                Response::Stats {
                    status: Status::Ok,
                    entries: self.store.len(),
                    tracked_files: self.store.tracked_files(),
                },
                false,
            ),
            Request::Shutdown => (Response::ShutdownAck { status: Status::Ok }, true),
            Request::Unknown { name } => (Response::unknown_request(name), false),
        }
    }
}
