#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Protocol types for the findlib cache service.
//!
//! This crate defines the request/response types exchanged between discovery
//! clients and the cache daemon.
//!
//! ## Wire format
//! Messages use length-prefixed JSON:
//! - 4-byte little-endian u32 length prefix
//! - JSON payload bytes
//!
//! Each connection carries exactly one request frame and one response frame.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::io::{self, Read, Write};

/// Protocol schema version. Bump when changing message format.
pub const PROTO_SCHEMA_VERSION: u32 = 1;

/// Maximum frame size for sanity checking (16 MiB).
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Error codes carried by `fail` responses.
pub mod codes {
    pub const PROTO_VERSION_MISMATCH: &str = "PROTO_VERSION_MISMATCH";
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const UNKNOWN_REQUEST: &str = "UNKNOWN_REQUEST";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// The cache key: a library name plus the raw constraint string.
///
/// An absent constraint is distinct from every string, including `""`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscoveryQuery {
    pub library: String,
    pub constraint: Option<String>,
}

impl DiscoveryQuery {
    #[must_use]
    pub fn new(library: impl Into<String>, constraint: Option<&str>) -> Self {
        Self {
            library: library.into(),
            constraint: constraint.map(str::to_string),
        }
    }
}

impl fmt::Display for DiscoveryQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.constraint {
            Some(c) => write!(f, "{} ({c})", self.library),
            None => f.write_str(&self.library),
        }
    }
}

/// Result of checking one file against its last recorded modification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChange {
    /// Newer than the last recorded time (or never seen before).
    Changed,
    /// Not newer than the last recorded time.
    Unchanged,
    /// Not a regular file.
    Unknown,
}

impl FileChange {
    /// The `has_changed` field of a `cache_file` response.
    #[must_use]
    pub fn to_wire(self) -> Option<bool> {
        match self {
            Self::Changed => Some(true),
            Self::Unchanged => Some(false),
            Self::Unknown => None,
        }
    }

    #[must_use]
    pub fn from_wire(has_changed: Option<bool>) -> Self {
        match has_changed {
            Some(true) => Self::Changed,
            Some(false) => Self::Unchanged,
            None => Self::Unknown,
        }
    }
}

/// Client hello sent with every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientHello {
    pub proto_schema_version: u32,
    pub client_version: String,
}

impl ClientHello {
    #[must_use]
    pub fn new(client_version: impl Into<String>) -> Self {
        Self {
            proto_schema_version: PROTO_SCHEMA_VERSION,
            client_version: client_version.into(),
        }
    }
}

/// Server hello sent with every response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerHello {
    pub proto_schema_version: u32,
    pub server_version: String,
}

impl ServerHello {
    #[must_use]
    pub fn new(server_version: impl Into<String>) -> Self {
        Self {
            proto_schema_version: PROTO_SCHEMA_VERSION,
            server_version: server_version.into(),
        }
    }
}

/// A request from client to cache daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "request", rename_all = "snake_case")]
pub enum Request {
    /// Report whether a file changed since it was last observed.
    CacheFile { file: String },

    /// Overwrite the stored file list for a query.
    SetData {
        key: DiscoveryQuery,
        value: Vec<String>,
    },

    /// Fetch the stored file list for a query.
    GetData { key: DiscoveryQuery },

    /// Liveness check.
    Ping { nonce: u64 },

    /// Entry and tracked-file counts.
    Stats,

    /// Ask the daemon to stop.
    Shutdown,

    /// A request whose discriminator this server does not know.
    ///
    /// Never produced by serde; built by [`decode_request_frame`].
    #[serde(skip)]
    Unknown { name: String },
}

impl Request {
    /// Discriminators this protocol version understands.
    pub const KNOWN: &'static [&'static str] = &[
        "cache_file",
        "set_data",
        "get_data",
        "ping",
        "stats",
        "shutdown",
    ];

    /// The wire discriminator of this request.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::CacheFile { .. } => "cache_file",
            Self::SetData { .. } => "set_data",
            Self::GetData { .. } => "get_data",
            Self::Ping { .. } => "ping",
            Self::Stats => "stats",
            Self::Shutdown => "shutdown",
            Self::Unknown { name } => name,
        }
    }
}

/// Outcome marker carried by every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Fail,
}

/// A response from the cache daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "response", rename_all = "snake_case")]
pub enum Response {
    /// `has_changed` is `None` when the path is not a regular file.
    CacheFile {
        status: Status,
        has_changed: Option<bool>,
        file: String,
    },

    SetData {
        status: Status,
        key: DiscoveryQuery,
    },

    GetData {
        status: Status,
        key: DiscoveryQuery,
        value: Option<Vec<String>>,
    },

    Pong {
        status: Status,
        nonce: u64,
    },

    Stats {
        status: Status,
        entries: usize,
        tracked_files: usize,
    },

    ShutdownAck {
        status: Status,
    },

    Fail {
        status: Status,
        code: String,
        message: String,
    },
}

impl Response {
    #[must_use]
    pub fn fail(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fail {
            status: Status::Fail,
            code: code.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unknown_request(name: &str) -> Self {
        Self::fail(codes::UNKNOWN_REQUEST, format!("Unknown request: {name}"))
    }

    #[must_use]
    pub fn pong(nonce: u64) -> Self {
        Self::Pong {
            status: Status::Ok,
            nonce,
        }
    }

    #[must_use]
    pub fn status(&self) -> Status {
        match self {
            Self::CacheFile { status, .. }
            | Self::SetData { status, .. }
            | Self::GetData { status, .. }
            | Self::Pong { status, .. }
            | Self::Stats { status, .. }
            | Self::ShutdownAck { status }
            | Self::Fail { status, .. } => *status,
        }
    }
}

/// A request frame: hello plus request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub hello: ClientHello,
    pub request: Request,
}

impl Frame {
    #[must_use]
    pub fn new(client_version: impl Into<String>, request: Request) -> Self {
        Self {
            hello: ClientHello::new(client_version),
            request,
        }
    }
}

/// A response frame: hello plus response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameResponse {
    pub hello: ServerHello,
    pub response: Response,
}

impl FrameResponse {
    #[must_use]
    pub fn new(server_version: impl Into<String>, response: Response) -> Self {
        Self {
            hello: ServerHello::new(server_version),
            response,
        }
    }
}

/// Encode a frame to bytes with length prefix.
///
/// Format: 4-byte little-endian length + JSON bytes
///
/// # Errors
/// Returns an error if serialization fails.
pub fn encode_frame<T: Serialize>(frame: &T) -> io::Result<Vec<u8>> {
    let json =
        serde_json::to_vec(frame).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let len = u32::try_from(json.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "frame too large"))?;

    let mut buf = Vec::with_capacity(4 + json.len());
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(&json);

    Ok(buf)
}

/// Decode a frame from bytes (without length prefix).
///
/// # Errors
/// Returns an error if deserialization fails.
pub fn decode_frame<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> io::Result<T> {
    serde_json::from_slice(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Decode a request frame, mapping unrecognised discriminators to
/// [`Request::Unknown`] instead of failing.
///
/// # Errors
/// Returns an error if the payload is not JSON, lacks a `hello`, lacks a
/// string `request` discriminator, or a known request has malformed fields.
pub fn decode_request_frame(bytes: &[u8]) -> io::Result<Frame> {
    let mut value: Value = decode_frame(bytes)?;

    let name = value
        .get("request")
        .and_then(|r| r.get("request"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| invalid_data("missing request discriminator"))?;

    if Request::KNOWN.contains(&name.as_str()) {
        return serde_json::from_value(value).map_err(invalid_data);
    }

    let hello = value
        .get_mut("hello")
        .map(Value::take)
        .ok_or_else(|| invalid_data("missing hello"))?;
    let hello: ClientHello = serde_json::from_value(hello).map_err(invalid_data)?;

    Ok(Frame {
        hello,
        request: Request::Unknown { name },
    })
}

/// Write a length-prefixed frame to a writer.
///
/// # Errors
/// Returns an error if encoding or writing fails.
pub fn write_frame<W: Write, T: Serialize>(writer: &mut W, frame: &T) -> io::Result<()> {
    let encoded = encode_frame(frame)?;
    writer.write_all(&encoded)?;
    writer.flush()
}

/// Read the raw payload of one length-prefixed frame.
///
/// # Errors
/// Returns an error on short reads or if the declared length exceeds
/// [`MAX_FRAME_SIZE`].
pub fn read_frame_bytes<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;

    if len > MAX_FRAME_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame too large: {len} bytes"),
        ));
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Read a length-prefixed frame from a reader.
///
/// # Errors
/// Returns an error if reading or decoding fails.
pub fn read_frame<R: Read, T: for<'de> Deserialize<'de>>(reader: &mut R) -> io::Result<T> {
    let buf = read_frame_bytes(reader)?;
    decode_frame(&buf)
}

fn invalid_data<E: Into<Box<dyn std::error::Error + Send + Sync>>>(e: E) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_proto_schema_version_is_stable() {
        assert_eq!(PROTO_SCHEMA_VERSION, 1);
    }

    #[test]
    fn test_file_change_wire_mapping() {
        for change in [FileChange::Changed, FileChange::Unchanged, FileChange::Unknown] {
            assert_eq!(FileChange::from_wire(change.to_wire()), change);
        }
        assert_eq!(FileChange::Unknown.to_wire(), None);
    }

    #[test]
    fn test_cache_file_request_shape() {
        let req = Request::CacheFile {
            file: "/l/libpcre.so".to_string(),
        };
        let json: Value = serde_json::to_value(&req).unwrap();
        assert_eq!(json["request"], "cache_file");
        assert_eq!(json["file"], "/l/libpcre.so");
    }

    #[test]
    fn test_get_data_request_shape() {
        let req = Request::GetData {
            key: DiscoveryQuery::new("pcre", Some("ver.major == 8")),
        };
        let json: Value = serde_json::to_value(&req).unwrap();
        assert_eq!(json["request"], "get_data");
        assert_eq!(json["key"]["library"], "pcre");
        assert_eq!(json["key"]["constraint"], "ver.major == 8");
    }

    #[test]
    fn test_absent_constraint_is_distinct_key() {
        let none = DiscoveryQuery::new("pcre", None);
        let empty = DiscoveryQuery::new("pcre", Some(""));
        assert_ne!(none, empty);
    }

    #[test]
    fn test_cache_file_unknown_serializes_null() {
        let resp = Response::CacheFile {
            status: Status::Ok,
            has_changed: None,
            file: "/gone".to_string(),
        };
        let json: Value = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "ok");
        assert!(json["has_changed"].is_null());
    }

    #[test]
    fn test_unknown_request_message() {
        let resp = Response::unknown_request("frobnicate");
        assert_eq!(resp.status(), Status::Fail);
        match resp {
            Response::Fail { message, code, .. } => {
                assert_eq!(message, "Unknown request: frobnicate");
                assert_eq!(code, codes::UNKNOWN_REQUEST);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn test_encode_frame_prefix() {
        let frame = Frame::new("0.3.0", Request::Ping { nonce: 7 });
        let encoded = encode_frame(&frame).unwrap();

        let len = u32::from_le_bytes([encoded[0], encoded[1], encoded[2], encoded[3]]) as usize;
        assert_eq!(len, encoded.len() - 4);
    }

    #[test]
    fn test_read_frame_over_split_reads() {
        // A reader that hands out one byte per read call.
        struct Trickle(Cursor<Vec<u8>>);
        impl Read for Trickle {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                let n = buf.len().min(1);
                self.0.read(&mut buf[..n])
            }
        }

        let frame = Frame::new(
            "0.3.0",
            Request::SetData {
                key: DiscoveryQuery::new("pcre", Some("8")),
                value: vec!["/l/libpcre.so".to_string(); 200],
            },
        );
        let bytes = encode_frame(&frame).unwrap();
        let mut reader = Trickle(Cursor::new(bytes));

        let decoded: Frame = read_frame(&mut reader).unwrap();
        assert_eq!(decoded.request, frame.request);
    }

    #[test]
    fn test_read_frame_rejects_oversized() {
        let mut bytes = u32::MAX.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"{}");
        let err = read_frame::<_, Frame>(&mut Cursor::new(bytes)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_decode_request_frame_unknown() {
        let raw = br#"{"hello":{"proto_schema_version":1,"client_version":"x"},"request":{"request":"frobnicate"}}"#;
        let frame = decode_request_frame(raw).unwrap();
        assert_eq!(
            frame.request,
            Request::Unknown {
                name: "frobnicate".to_string()
            }
        );
    }

    #[test]
    fn test_decode_request_frame_known() {
        let frame = Frame::new("x", Request::Stats);
        let bytes = serde_json::to_vec(&frame).unwrap();
        let decoded = decode_request_frame(&bytes).unwrap();
        assert_eq!(decoded.request, Request::Stats);
    }

    #[test]
    fn test_decode_request_frame_missing_discriminator() {
        let raw = br#"{"hello":{"proto_schema_version":1,"client_version":"x"},"request":{}}"#;
        assert!(decode_request_frame(raw).is_err());
    }

    #[test]
    fn test_decode_request_frame_malformed_known() {
        let raw = br#"{"hello":{"proto_schema_version":1,"client_version":"x"},"request":{"request":"cache_file"}}"#;
        assert!(decode_request_frame(raw).is_err());
    }
}
