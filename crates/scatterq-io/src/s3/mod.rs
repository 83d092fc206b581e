//! S3-backed collaborators.
//!
//! - `catalog`: listing through `object_store`'s `AmazonS3`.
//! - `select`: per-object S3 Select through the AWS SDK (one client per worker).
//!
//! Both are synchronous facades over a private tokio runtime.

mod catalog;
mod client;
mod select;

pub use catalog::S3Catalog;
pub use client::{create_s3_client, S3Config};
pub use select::{input_serialization, output_serialization, S3SelectClient};

use scatterq_core::config::ConnectionConfig;
use scatterq_core::error::{Error, Result};
use tokio::runtime::{Builder, Runtime};

use crate::connector::{Catalog, Connector, QueryClient};

/// Connector that builds S3 catalogs and select clients from one connection snapshot.
#[derive(Debug, Clone)]
pub struct S3Connector {
    config: S3Config,
}

impl S3Connector {
    pub fn new(conn: &ConnectionConfig) -> Self {
        Self {
            config: S3Config::from_connection(conn),
        }
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }
}

impl Connector for S3Connector {
    fn catalog(&self) -> Result<Box<dyn Catalog>> {
        Ok(Box::new(S3Catalog::new(self.config.clone())?))
    }

    fn connect(&self) -> Result<Box<dyn QueryClient>> {
        Ok(Box::new(S3SelectClient::new(&self.config)?))
    }
}

pub(crate) fn runtime() -> Result<Runtime> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Config(format!("failed to initialize async runtime: {e}")))
}
