use std::sync::Arc;

use futures::StreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{Error as ObjectStoreError, ObjectStore};
use scatterq_core::config::Scope;
use scatterq_core::error::{Error, Result};
use scatterq_core::types::{Listing, ObjectDescriptor};
use tokio::runtime::Runtime;
use tracing::debug;

use super::client::S3Config;
use crate::connector::Catalog;
use crate::listing::ListingBuilder;
use crate::retry::RetryConfig;

/// Lists a bucket through `object_store`.
///
/// Scope prefixes are raw key prefixes (`test` matches `test-key/x`), while
/// `object_store` lists by path segment. The catalog lists the prefix's parent
/// segment and filters with `starts_with`.
pub struct S3Catalog {
    runtime: Runtime,
    config: S3Config,
    retry: RetryConfig,
}

impl S3Catalog {
    pub fn new(config: S3Config) -> Result<Self> {
        Ok(Self {
            runtime: super::runtime()?,
            retry: config.retry(),
            config,
        })
    }

    fn store(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(bucket)
            .with_retry(single_attempt());
        if let Some(region) = &self.config.region {
            builder = builder.with_region(region.clone());
        }
        if let Some(endpoint) = &self.config.endpoint {
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(true)
                .with_virtual_hosted_style_request(false);
        }
        if let Some(access_key) = &self.config.access_key {
            builder = builder.with_access_key_id(access_key.clone());
        }
        if let Some(secret_key) = &self.config.secret_key {
            builder = builder.with_secret_access_key(secret_key.clone());
        }
        if let Some(token) = &self.config.session_token {
            builder = builder.with_token(token.clone());
        }
        let store = builder
            .build()
            .map_err(|e| Error::Config(format!("object_store builder error: {e}")))?;
        Ok(Arc::new(store))
    }

    fn list_once(
        &self,
        store: &Arc<dyn ObjectStore>,
        scope: &Scope,
    ) -> object_store::Result<Vec<ObjectDescriptor>> {
        let parent = list_root(&scope.prefix).map(ObjectPath::from);
        let store = Arc::clone(store);
        self.runtime.block_on(async move {
            let mut stream = store.list(parent.as_ref());
            let mut out = Vec::new();
            while let Some(item) = stream.next().await {
                let meta = item?;
                let key = meta.location.as_ref();
                if key.starts_with(&scope.prefix) {
                    out.push(ObjectDescriptor::new(key, meta.size as u64));
                }
            }
            Ok(out)
        })
    }
}

impl Catalog for S3Catalog {
    fn list(&self, scope: &Scope) -> Result<Listing> {
        let store = self.store(&scope.bucket)?;
        let mut objects = self
            .retry
            .run("list", || self.list_once(&store, scope), is_retryable)
            .map_err(|e| Error::Catalog(format!("{scope}: {e}")))?;
        objects.sort_by(|a, b| a.key.cmp(&b.key));

        let mut builder = ListingBuilder::new();
        builder.push_page(objects);
        let listing = builder.finish(scope)?;
        debug!(
            scope = %scope,
            objects = listing.total_objects,
            bytes = listing.total_bytes,
            "listed scope"
        );
        Ok(listing)
    }
}

/// Segment-aligned parent of a raw prefix, `None` for the bucket root.
fn list_root(prefix: &str) -> Option<String> {
    match prefix.rfind('/') {
        Some(idx) if idx > 0 => Some(prefix[..idx].to_string()),
        _ => None,
    }
}

fn is_retryable(err: &ObjectStoreError) -> bool {
    !matches!(
        err,
        ObjectStoreError::NotFound { .. } | ObjectStoreError::AlreadyExists { .. }
    )
}

/// Listings are retried whole by [`RetryConfig::run`]; each HTTP request gets one attempt.
fn single_attempt() -> object_store::RetryConfig {
    object_store::RetryConfig {
        max_retries: 0,
        ..Default::default()
    }
}
