#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

pub mod backend;
pub mod config;
pub mod constraint;
pub mod discovery;
pub mod error;
pub mod exec;
pub mod include;
pub mod select;
pub mod version;

pub use backend::{default_backends, Backend, CandidateFile, FsScan, SearchContext};
pub use config::Config;
pub use constraint::Constraint;
pub use discovery::{DiscoveryOutcome, Discoverer, NoCache, ResultCache, Source};
pub use error::{CacheError, Error};
pub use exec::{CommandOutput, CommandRunner, ShellRunner};
pub use include::{header_dir, include_flag};
pub use select::{select_best, shared_library_extension};
pub use version::{parse_version, version_string, VersionTuple, VERSION};
pub use findlib_proto::{DiscoveryQuery, FileChange};
