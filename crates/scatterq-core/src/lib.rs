#![forbid(unsafe_code)]
//! scatterq-core: data model, format configuration, cost model, and hooks.
//!
//! Nothing here performs I/O or spawns threads. The collaborator seams live in
//! `scatterq-io`; dispatch and aggregation live in `scatterq-exec`.

pub mod config;
pub mod cost;
pub mod error;
pub mod format;
pub mod hook;
pub mod prelude;
pub mod types;

pub use error::{Error, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
