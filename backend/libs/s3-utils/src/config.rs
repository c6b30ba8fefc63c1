/// Media bucket configuration
use crate::S3Error;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,
    /// AWS region
    pub region: String,
    /// Base URL objects are publicly served from (CDN domain or bucket URL)
    pub base_url: String,
    /// Custom endpoint for S3-compatible hosts (MinIO, R2, ...)
    pub endpoint_url: Option<String>,
    /// Whether to use path-style addressing
    pub path_style: bool,
    /// Prefix for every object key
    pub key_prefix: String,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: "post-media".to_string(),
            region: "us-east-1".to_string(),
            base_url: "https://post-media.s3.amazonaws.com".to_string(),
            endpoint_url: None,
            path_style: false,
            key_prefix: "uploads".to_string(),
        }
    }
}

impl S3Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, S3Error> {
        let defaults = Self::default();
        let bucket = std::env::var("S3_BUCKET").unwrap_or(defaults.bucket);

        let path_style = match std::env::var("S3_PATH_STYLE") {
            Ok(v) => v
                .parse()
                .map_err(|_| S3Error::Config(format!("S3_PATH_STYLE must be true/false, got '{v}'")))?,
            Err(_) => false,
        };

        let config = Self {
            base_url: std::env::var("S3_BASE_URL")
                .unwrap_or_else(|_| format!("https://{bucket}.s3.amazonaws.com")),
            bucket,
            region: std::env::var("AWS_REGION").unwrap_or(defaults.region),
            endpoint_url: std::env::var("S3_ENDPOINT_URL").ok(),
            path_style,
            key_prefix: std::env::var("S3_KEY_PREFIX").unwrap_or(defaults.key_prefix),
        };

        if config.bucket.trim().is_empty() {
            return Err(S3Error::Config("S3_BUCKET must not be empty".to_string()));
        }

        Ok(config)
    }

    /// Public URL an object key is served from
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    /// Build `{prefix}/{owner}/{uuid}.{ext}`
    pub fn object_key(&self, owner: &str, object_id: &str, extension: &str) -> String {
        let prefix = self.key_prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("{owner}/{object_id}.{extension}")
        } else {
            format!("{prefix}/{owner}/{object_id}.{extension}")
        }
    }
}
