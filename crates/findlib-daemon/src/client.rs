//! Client for the cache daemon.
//!
//! Discovery is synchronous, so each request drives a current-thread tokio
//! runtime to completion. Connect, write and read each run under the
//! configured timeout. One connection per request.

use findlib_core::{CacheError, Config, ResultCache, VERSION};
use findlib_proto::{
    decode_frame, encode_frame, DiscoveryQuery, FileChange, Frame, FrameResponse, Request,
    Response, MAX_FRAME_SIZE,
};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::trace;

/// Entry and tracked-file counts reported by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub tracked_files: usize,
}

/// Talks to a cache daemon at a fixed address.
#[derive(Debug, Clone)]
pub struct CacheClient {
    addr: SocketAddr,
    timeout: Duration,
}

impl CacheClient {
    pub fn new(addr: SocketAddr, timeout: Duration) -> Self {
        Self { addr, timeout }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cache_addr, config.cache_timeout)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Send one request and return the daemon's response with its version.
    ///
    /// A `fail` response becomes [`CacheError::Rejected`].
    pub fn request(&self, request: Request) -> Result<(Response, String), CacheError> {
        trace!(addr = %self.addr, request = request.name(), "cache request");
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let reply = runtime.block_on(self.exchange(&Frame::new(VERSION, request)))?;

        match reply.response {
            Response::Fail { code, message, .. } => Err(CacheError::Rejected { code, message }),
            response => Ok((response, reply.hello.server_version)),
        }
    }

    async fn exchange(&self, frame: &Frame) -> Result<FrameResponse, CacheError> {
        let encoded = encode_frame(frame)?;

        let mut stream = self.bounded("connect", TcpStream::connect(self.addr)).await?;
        stream.set_nodelay(true)?;
        self.bounded("write", stream.write_all(&encoded)).await?;
        let payload = self.bounded("read", read_payload(&mut stream)).await?;
        let _ = stream.shutdown().await;

        Ok(decode_frame(&payload)?)
    }

    /// Run one I/O step under the client timeout.
    async fn bounded<T>(
        &self,
        step: &str,
        fut: impl Future<Output = io::Result<T>>,
    ) -> Result<T, CacheError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(CacheError::Io(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("cache {step} timed out after {:?}", self.timeout),
            ))),
        }
    }

    /// Round-trip a nonce; returns the server version.
    pub fn ping(&self, nonce: u64) -> Result<String, CacheError> {
        match self.request(Request::Ping { nonce })? {
            (Response::Pong { nonce: echoed, .. }, version) if echoed == nonce => Ok(version),
            (Response::Pong { nonce: echoed, .. }, _) => Err(CacheError::Protocol(format!(
                "nonce mismatch: expected {nonce}, got {echoed}"
            ))),
            (other, _) => Err(unexpected(&other)),
        }
    }

    pub fn stats(&self) -> Result<CacheStats, CacheError> {
        match self.request(Request::Stats)?.0 {
            Response::Stats {
                entries,
                tracked_files,
                ..
            } => Ok(CacheStats {
                entries,
                tracked_files,
            }),
            other => Err(unexpected(&other)),
        }
    }

    /// Ask the daemon to exit.
    pub fn shutdown(&self) -> Result<(), CacheError> {
        match self.request(Request::Shutdown)?.0 {
            Response::ShutdownAck { .. } => Ok(()),
            other => Err(unexpected(&other)),
        }
    }
}

async fn read_payload(stream: &mut TcpStream) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await?;
    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame too large: {len} bytes"),
        ));
    }

    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).await?;
    Ok(buf)
}

fn unexpected(response: &Response) -> CacheError {
    CacheError::Protocol(format!("unexpected response: {response:?}"))
}

impl ResultCache for CacheClient {
    fn get(&self, query: &DiscoveryQuery) -> Result<Option<Vec<String>>, CacheError> {
        match self.request(Request::GetData { key: query.clone() })?.0 {
            Response::GetData { value, .. } => Ok(value),
            other => Err(unexpected(&other)),
        }
    }

    fn set(&self, query: &DiscoveryQuery, files: &[String]) -> Result<(), CacheError> {
        let request = Request::SetData {
            key: query.clone(),
            value: files.to_vec(),
        };
        match self.request(request)?.0 {
            Response::SetData { .. } => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    fn file_changed(&self, path: &str) -> Result<FileChange, CacheError> {
        let request = Request::CacheFile {
            file: path.to_string(),
        };
        match self.request(request)?.0 {
            Response::CacheFile { has_changed, .. } => Ok(FileChange::from_wire(has_changed)),
            other => Err(unexpected(&other)),
        }
    }
}
