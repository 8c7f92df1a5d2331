use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use aws_sdk_cloudfront::Client;
use aws_sdk_cloudfront::error::DisplayErrorContext;
use aws_sdk_cloudfront::types::{InvalidationBatch, Paths};
use log::info;
use uuid::Uuid;

use super::CdnInvalidator;

pub struct CloudFrontInvalidator {
    client: Client,
}

impl CloudFrontInvalidator {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CdnInvalidator for CloudFrontInvalidator {
    async fn create_invalidation(&self, distribution_id: &str, path: &str) -> Result<()> {
        let paths = Paths::builder()
            .quantity(1)
            .items(path)
            .build()
            .context("failed to build invalidation paths")?;
        // Must be unique per request, or CloudFront treats it as a replay.
        let batch = InvalidationBatch::builder()
            .paths(paths)
            .caller_reference(Uuid::new_v4().to_string())
            .build()
            .context("failed to build invalidation batch")?;

        let output = self
            .client
            .create_invalidation()
            .distribution_id(distribution_id)
            .invalidation_batch(batch)
            .send()
            .await
            .map_err(|err| anyhow!("{}", DisplayErrorContext(&err)))
            .with_context(|| format!("CreateInvalidation {} on {}", path, distribution_id))?;

        if let Some(invalidation) = output.invalidation() {
            info!(
                "Invalidation {} created for {} ({})",
                invalidation.id(),
                path,
                invalidation.status()
            );
        }
        Ok(())
    }
}
