#![forbid(unsafe_code)]
//! scatterq-io: collaborator seams for listing a scope and querying one object.
//!
//! - `memory`: in-process fixture backend (always available).
//! - `s3`: `object_store` listing plus AWS SDK select (behind the `s3` feature).

pub mod connector;
pub mod events;
pub mod listing;
pub mod memory;
pub mod retry;

#[cfg(feature = "s3")]
pub mod s3;

pub use connector::{Catalog, Connector, QueryClient};
pub use events::{assemble, ChunkAssembler, SelectEvent};
pub use listing::ListingBuilder;
pub use memory::MemoryStore;
pub use retry::RetryConfig;

#[cfg(feature = "s3")]
pub use s3::S3Connector;
