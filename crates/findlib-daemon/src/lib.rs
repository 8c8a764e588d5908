#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]

//! Cache daemon for findlib.
//!
//! The daemon remembers discovery results across CLI invocations and tracks
//! file modification times so clients can tell whether a remembered result
//! is still valid.
//!
//! ## Wire protocol
//! Communication uses length-prefixed JSON frames over TCP on localhost.
//! See `findlib-proto` for message types.

pub mod client;
pub mod handler;
mod server;
pub mod store;

pub use client::{CacheClient, CacheStats};
pub use handler::{check_version, CacheHandler, Handler};
pub use server::{make_response_frame, run_server, DaemonConfig, Server};
pub use store::CacheStore;
