/// Upload and delete operations against the media bucket
use crate::config::S3Config;
use crate::S3Error;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::sync::Arc;

#[derive(Clone)]
pub struct S3Operations {
    client: Arc<Client>,
    config: S3Config,
}

impl S3Operations {
    pub fn new(client: Arc<Client>, config: S3Config) -> Self {
        Self { client, config }
    }

    /// Build a client from the ambient AWS credentials chain
    pub async fn connect(config: S3Config) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }
        builder = builder.force_path_style(config.path_style);

        Self::new(Arc::new(Client::from_conf(builder.build())), config)
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Upload an object, returning its public URL
    pub async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, S3Error> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| S3Error::Request(DisplayErrorContext(&e).to_string()))?;

        tracing::debug!(key = %key, size, "Uploaded object");
        Ok(self.config.public_url(key))
    }

    /// Delete an object; deleting a missing key is not an error on S3
    pub async fn delete_object(&self, key: &str) -> Result<(), S3Error> {
        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| S3Error::Request(DisplayErrorContext(&e).to_string()))?;

        tracing::debug!(key = %key, "Deleted object");
        Ok(())
    }

    /// Check the bucket is reachable with the configured credentials
    pub async fn health_check(&self) -> Result<(), S3Error> {
        self.client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
            .map_err(|e| S3Error::Request(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}
