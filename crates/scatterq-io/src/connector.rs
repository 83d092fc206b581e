//! Collaborator seams: listing a scope and querying one object.
//!
//! A [`Connector`] is the only thing shared across workers. It hands out a
//! catalog for listing and a fresh [`QueryClient`] per caller; clients are never
//! shared, so they need not be `Send` or `Sync`.

use scatterq_core::config::Scope;
use scatterq_core::error::Result;
use scatterq_core::types::{ChunkResult, Listing, QueryRequest};

/// Lists the objects under a scope, in a stable order.
pub trait Catalog {
    /// Must return `Error::EmptyScope` when nothing matches, `Error::Catalog` on failure.
    fn list(&self, scope: &Scope) -> Result<Listing>;
}

/// Runs one query against one object.
pub trait QueryClient {
    /// Failures are reported as `Error::Query` for this key.
    fn query(&self, scope: &Scope, key: &str, request: &QueryRequest) -> Result<ChunkResult>;
}

/// Factory for catalogs and per-worker query clients.
pub trait Connector: Send + Sync {
    fn catalog(&self) -> Result<Box<dyn Catalog>>;

    /// Open a new, independent query client.
    fn connect(&self) -> Result<Box<dyn QueryClient>>;
}

impl<C: Connector + ?Sized> Connector for std::sync::Arc<C> {
    fn catalog(&self) -> Result<Box<dyn Catalog>> {
        (**self).catalog()
    }

    fn connect(&self) -> Result<Box<dyn QueryClient>> {
        (**self).connect()
    }
}
