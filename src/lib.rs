#![forbid(unsafe_code)]
//! scatterq: run one S3 Select style query over every object under a prefix
//! and merge the per-object results.
//!
//! ```no_run
//! use scatterq::prelude::*;
//! use scatterq::{MemoryStore, SelectOptions, Session};
//!
//! # fn main() -> scatterq::Result<()> {
//! let store = MemoryStore::new();
//! store.insert("logs/a.json", 30, "{\"id\":1}\n", ScanStats::new(30, 30, 10));
//!
//! let session = Session::new(store, EngineConfig::new(Scope::new("bucket", "logs/")));
//! let estimate = session.estimate_cost()?;
//! let result = session.select("SELECT * FROM s3object s", SelectOptions::new())?;
//! assert_eq!(result.stats.files_processed, 1);
//! # let _ = estimate;
//! # Ok(())
//! # }
//! ```

pub use scatterq_core::{config, cost, error, format, hook, types};
pub use scatterq_core::{Error, Result};

pub use scatterq_io::{
    assemble, Catalog, ChunkAssembler, Connector, ListingBuilder, MemoryStore, QueryClient,
    RetryConfig, SelectEvent,
};
#[cfg(feature = "s3")]
pub use scatterq_io::S3Connector;

pub use scatterq_exec::{
    aggregate, aggregate_outcomes, aggregate_with, DispatchOptions, DispatchPlan, Parallel,
    SelectOptions, Sequential, Session, Strategy, StrategyKind, UnitOutcome,
};

pub mod prelude {
    pub use scatterq_core::prelude::*;
}
