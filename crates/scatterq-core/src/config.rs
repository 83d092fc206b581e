//! Engine configuration that downstream crates can serialize/deserialize.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Bucket + prefix boundary that a listing call covers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub bucket: String,
    #[serde(default)]
    pub prefix: String,
}

impl Scope {
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    /// Parse `s3://bucket/prefix`. The prefix is everything after the first `/`
    /// following the bucket, taken verbatim: no percent-decoding, no query or
    /// fragment splitting, no trailing-slash normalization. Listing matches it as
    /// a raw key prefix.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let parsed =
            Url::parse(uri).map_err(|e| Error::Config(format!("invalid scope URI '{uri}': {e}")))?;
        if parsed.scheme() != "s3" {
            return Err(Error::Config(format!(
                "unsupported scope scheme '{}' in '{uri}'",
                parsed.scheme()
            )));
        }
        let rest = uri
            .split_once("://")
            .map(|(_, rest)| rest)
            .ok_or_else(|| Error::Config(format!("scope URI '{uri}' missing bucket")))?;
        let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(Error::Config(format!("scope URI '{uri}' missing bucket")));
        }
        if parsed.host_str() != Some(bucket) {
            return Err(Error::Config(format!(
                "invalid bucket '{bucket}' in scope URI '{uri}'"
            )));
        }
        Ok(Self::new(bucket, prefix))
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.prefix)
    }
}

impl FromStr for Scope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Scope::from_uri(s)
    }
}

/// What happens when a single object's query or hook fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// First failure aborts the whole batch.
    #[default]
    Abort,
    /// Record the failure and keep going.
    Isolate,
}

impl FromStr for FailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "isolate" => Ok(FailurePolicy::Isolate),
            other => Err(Error::Config(format!("unknown failure policy '{other}'"))),
        }
    }
}

pub const DEFAULT_STRATEGY: &str = "parallel";

/// Host core count, at least 1.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub scope: Scope,

    /// Width of the bounded worker pool. Ignored by the sequential strategy.
    pub concurrency: usize,

    /// Log per-object progress at info level instead of debug.
    pub verbose: bool,

    /// Strategy name, resolved when a query is dispatched.
    pub strategy: String,

    pub failure_policy: FailurePolicy,

    /// Connection hints / overrides.
    pub aws_region: Option<String>,
    pub aws_endpoint: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_session_token: Option<String>,

    /// Retry policy for catalog listing. Queries are never retried.
    pub list_retry_max_retries: usize,
    pub list_retry_initial_backoff_ms: u64,
    pub list_retry_max_backoff_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scope: Scope::default(),
            concurrency: default_concurrency(),
            verbose: false,
            strategy: DEFAULT_STRATEGY.to_string(),
            failure_policy: FailurePolicy::Abort,
            aws_region: None,
            aws_endpoint: None,
            aws_access_key_id: None,
            aws_secret_access_key: None,
            aws_session_token: None,
            list_retry_max_retries: 3,
            list_retry_initial_backoff_ms: 200,
            list_retry_max_backoff_ms: 5_000,
        }
    }
}

/// Connection snapshot handed to the IO layer. Every worker builds its own
/// client from a copy of this.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub retry_max_retries: usize,
    pub retry_initial_backoff_ms: u64,
    pub retry_max_backoff_ms: u64,
}

impl EngineConfig {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            ..Default::default()
        }
    }

    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `SCATTERQ_SCOPE`: `s3://bucket/prefix`
    /// - `SCATTERQ_CONCURRENCY`: worker pool width
    /// - `SCATTERQ_VERBOSE`: `1`/`true` for per-object progress
    /// - `SCATTERQ_STRATEGY`: `sequential` or `parallel`
    /// - `SCATTERQ_FAILURE_POLICY`: `abort` or `isolate`
    /// - `SCATTERQ_AWS_REGION`, `SCATTERQ_AWS_ENDPOINT`, `SCATTERQ_AWS_ACCESS_KEY_ID`,
    ///   `SCATTERQ_AWS_SECRET_ACCESS_KEY`, `SCATTERQ_AWS_SESSION_TOKEN`
    /// - `SCATTERQ_LIST_RETRY_MAX_RETRIES`, `SCATTERQ_LIST_RETRY_INITIAL_MS`, `SCATTERQ_LIST_RETRY_MAX_MS`
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("SCATTERQ_SCOPE") {
            if let Ok(scope) = Scope::from_uri(&s) {
                cfg.scope = scope;
            }
        }

        if let Ok(s) = std::env::var("SCATTERQ_CONCURRENCY") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.concurrency = v;
            }
        }

        if let Ok(s) = std::env::var("SCATTERQ_VERBOSE") {
            cfg.verbose = matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }

        if let Ok(s) = std::env::var("SCATTERQ_STRATEGY") {
            cfg.strategy = s;
        }

        if let Ok(s) = std::env::var("SCATTERQ_FAILURE_POLICY") {
            if let Ok(p) = s.parse::<FailurePolicy>() {
                cfg.failure_policy = p;
            }
        }

        if let Ok(s) = std::env::var("SCATTERQ_AWS_REGION") {
            cfg.aws_region = Some(s);
        }

        if let Ok(s) = std::env::var("SCATTERQ_AWS_ENDPOINT") {
            cfg.aws_endpoint = Some(s);
        }

        if let Ok(s) = std::env::var("SCATTERQ_AWS_ACCESS_KEY_ID") {
            cfg.aws_access_key_id = Some(s);
        }

        if let Ok(s) = std::env::var("SCATTERQ_AWS_SECRET_ACCESS_KEY") {
            cfg.aws_secret_access_key = Some(s);
        }

        if let Ok(s) = std::env::var("SCATTERQ_AWS_SESSION_TOKEN") {
            cfg.aws_session_token = Some(s);
        }

        if let Ok(s) = std::env::var("SCATTERQ_LIST_RETRY_MAX_RETRIES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.list_retry_max_retries = v;
            }
        }

        if let Ok(s) = std::env::var("SCATTERQ_LIST_RETRY_INITIAL_MS") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.list_retry_initial_backoff_ms = v;
            }
        }

        if let Ok(s) = std::env::var("SCATTERQ_LIST_RETRY_MAX_MS") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.list_retry_max_backoff_ms = v;
            }
        }

        cfg
    }

    /// Produce a connection configuration snapshot used by the IO layer.
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            region: self.aws_region.clone(),
            endpoint: self.aws_endpoint.clone(),
            access_key_id: self.aws_access_key_id.clone(),
            secret_access_key: self.aws_secret_access_key.clone(),
            session_token: self.aws_session_token.clone(),
            retry_max_retries: self.list_retry_max_retries,
            retry_initial_backoff_ms: self.list_retry_initial_backoff_ms,
            retry_max_backoff_ms: self.list_retry_max_backoff_ms,
        }
    }
}
