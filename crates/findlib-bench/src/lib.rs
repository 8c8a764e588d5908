#![deny(clippy::all)]
#![warn(clippy::pedantic)]

//! Benchmark harness for findlib.
//!
//! Run benchmarks with: `cargo bench -p findlib-bench`
//!
//! Covers constraint compilation and evaluation, best-match selection and
//! the filesystem walk used by the fallback scan.
