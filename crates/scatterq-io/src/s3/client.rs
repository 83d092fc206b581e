//! S3 connection settings and SDK client creation.

use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use scatterq_core::config::ConnectionConfig;
use serde::{Deserialize, Serialize};

use crate::retry::RetryConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Config {
    pub region: Option<String>,

    /// Custom endpoint URL (LocalStack, MinIO). Switches to path-style addressing.
    pub endpoint: Option<String>,

    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub session_token: Option<String>,

    pub list_retry_max_retries: usize,
    pub list_retry_initial_backoff_ms: u64,
    pub list_retry_max_backoff_ms: u64,
}

impl S3Config {
    pub fn from_connection(conn: &ConnectionConfig) -> Self {
        Self {
            region: conn.region.clone(),
            endpoint: conn.endpoint.clone(),
            access_key: conn.access_key_id.clone(),
            secret_key: conn.secret_access_key.clone(),
            session_token: conn.session_token.clone(),
            list_retry_max_retries: conn.retry_max_retries,
            list_retry_initial_backoff_ms: conn.retry_initial_backoff_ms,
            list_retry_max_backoff_ms: conn.retry_max_backoff_ms,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self.session_token = session_token;
        self
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.list_retry_max_retries,
            initial_backoff: std::time::Duration::from_millis(self.list_retry_initial_backoff_ms),
            max_backoff: std::time::Duration::from_millis(self.list_retry_max_backoff_ms),
        }
    }
}

/// Create an SDK client. Credentials fall back to the default provider chain.
pub async fn create_s3_client(config: &S3Config) -> Client {
    use aws_config::Region;

    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }

    if let Some(endpoint) = &config.endpoint {
        loader = loader.endpoint_url(endpoint);
    }

    if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
        let credentials = aws_sdk_s3::config::Credentials::new(
            access_key,
            secret_key,
            config.session_token.clone(),
            None,
            "scatterq",
        );
        loader = loader.credentials_provider(credentials);
    }

    let sdk_config = loader.load().await;
    let builder = aws_sdk_s3::config::Builder::from(&sdk_config);
    let s3_config = if config.endpoint.is_some() {
        builder.force_path_style(true).build()
    } else {
        builder.build()
    };

    Client::from_conf(s3_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_connection_snapshot() {
        let conn = ConnectionConfig {
            region: Some("us-east-1".into()),
            endpoint: Some("http://localhost:4566".into()),
            retry_max_retries: 4,
            retry_initial_backoff_ms: 50,
            retry_max_backoff_ms: 500,
            ..Default::default()
        };
        let cfg = S3Config::from_connection(&conn);
        assert_eq!(cfg.region.as_deref(), Some("us-east-1"));
        assert_eq!(cfg.retry().max_retries, 4);
        assert_eq!(cfg.retry().initial_backoff.as_millis(), 50);
    }

    #[test]
    fn builder_methods() {
        let cfg = S3Config::default()
            .with_region("eu-west-1")
            .with_endpoint("http://minio:9000")
            .with_credentials("access", "secret", None);
        assert_eq!(cfg.endpoint.as_deref(), Some("http://minio:9000"));
        assert_eq!(cfg.access_key.as_deref(), Some("access"));
        assert!(cfg.session_token.is_none());
    }
}
