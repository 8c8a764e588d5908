//! TCP server loop.
//!
//! Each connection carries one request frame and receives one response
//! frame. What a request means is entirely up to the injected [`Handler`].

use crate::handler::{check_version, Handler};
use findlib_core::VERSION;
use findlib_proto::{
    codes, decode_request_frame, encode_frame, FrameResponse, Response, MAX_FRAME_SIZE,
};
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

/// How often the accept loop wakes up to look at the shutdown flag.
const ACCEPT_POLL: Duration = Duration::from_secs(1);

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Address to listen on.
    pub addr: SocketAddr,
}

/// Wrap a response with this server's hello.
pub fn make_response_frame(response: Response) -> FrameResponse {
    FrameResponse::new(VERSION, response)
}

/// A bound listener plus its shutdown flag.
pub struct Server {
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
}

impl Server {
    /// Bind to `addr`. Port 0 picks a free port; see [`Server::local_addr`].
    ///
    /// # Errors
    /// Returns an error if the address cannot be bound.
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The address actually bound.
    ///
    /// # Errors
    /// Returns an error if the socket cannot report its address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Flag that stops the accept loop when set.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Accept connections until a handler asks to stop or the shutdown
    /// flag is set.
    ///
    /// # Errors
    /// Currently never fails; accept errors are logged and skipped.
    pub async fn run(self, handler: Arc<dyn Handler>) -> io::Result<()> {
        info!(addr = ?self.listener.local_addr().ok(), "daemon listening");

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                info!("shutdown requested, exiting");
                break;
            }

            match tokio::time::timeout(ACCEPT_POLL, self.listener.accept()).await {
                Ok(Ok((stream, peer))) => {
                    debug!(%peer, "accepted connection");
                    let shutdown = Arc::clone(&self.shutdown);
                    let handler = Arc::clone(&handler);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, handler, shutdown).await {
                            warn!(error = %e, "connection handler error");
                        }
                    });
                }
                Ok(Err(e)) => {
                    error!(error = %e, "accept failed");
                }
                Err(_) => {
                    // Timeout, check shutdown flag and continue
                }
            }
        }

        Ok(())
    }
}

/// Bind `config.addr` and serve `handler` until shut down.
///
/// # Errors
/// Returns an error if the server cannot start.
pub async fn run_server(config: DaemonConfig, handler: Arc<dyn Handler>) -> io::Result<()> {
    let server = Server::bind(config.addr).await?;
    server.run(handler).await
}

async fn send(stream: &mut TcpStream, response: Response) -> io::Result<()> {
    let encoded = encode_frame(&make_response_frame(response))?;
    stream.write_all(&encoded).await?;
    stream.flush().await
}

async fn handle_connection(
    mut stream: TcpStream,
    handler: Arc<dyn Handler>,
    shutdown: Arc<AtomicBool>,
) -> io::Result<()> {
    // Read length prefix
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await?;
    let len = u32::from_le_bytes(len_buf) as usize;

    if len > MAX_FRAME_SIZE {
        return send(
            &mut stream,
            Response::fail(codes::INVALID_REQUEST, format!("frame too large: {len} bytes")),
        )
        .await;
    }

    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).await?;

    let frame = match decode_request_frame(&buf) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, "invalid frame");
            return send(
                &mut stream,
                Response::fail(codes::INVALID_REQUEST, format!("invalid frame: {e}")),
            )
            .await;
        }
    };

    debug!(
        client_version = %frame.hello.client_version,
        proto_version = frame.hello.proto_schema_version,
        request = frame.request.name(),
        "handling request"
    );

    let (response, should_shutdown) = match check_version(frame.hello.proto_schema_version) {
        Ok(()) => handler.handle(&frame.request),
        Err(response) => (response, false),
    };

    send(&mut stream, response).await?;

    if should_shutdown {
        shutdown.store(true, Ordering::Relaxed);
    }

    Ok(())
}
