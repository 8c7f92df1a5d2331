use log::{error, info};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::spawn_blocking;

use crate::collaborators::{CdnInvalidator, Notifier, ObjectStore};
use crate::common::errors::PipelineError;
use crate::common::{DEFAULT_CONTENT_TYPE, TAG_CONVERSION_TIME, TAG_PROCESSED, TAG_RGB_PROCESSED};
use crate::config::AppConfig;
use crate::workflow::processors::alert::{AlertPayload, Alerter};
use crate::workflow::processors::guard::{GuardDecision, check_processed};
use crate::workflow::processors::image::{ColorMode, ImageCodec};
use crate::workflow::types::{ObjectEvent, ProcessingOutcome};

/// One pass of the normalization pipeline over a single object.
pub struct Pipeline<'a> {
    config: &'a AppConfig,
    store: &'a dyn ObjectStore,
    codec: Arc<dyn ImageCodec>,
    cdn: &'a dyn CdnInvalidator,
    alerter: Alerter<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a AppConfig,
        store: &'a dyn ObjectStore,
        codec: Arc<dyn ImageCodec>,
        cdn: &'a dyn CdnInvalidator,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            config,
            store,
            codec,
            cdn,
            alerter: Alerter::new(notifier),
        }
    }

    /// Run every stage for `event`. Failures are alerted here and returned as
    /// `ProcessingOutcome::Failed`; this never returns an error.
    pub async fn run(&self, event: &ObjectEvent) -> ProcessingOutcome {
        // Step 1: Event filter
        if !self.config.is_in_scope(&event.key) {
            info!(
                "Skipping file {}: not in {}",
                event.key, self.config.scope_prefix
            );
            return ProcessingOutcome::SkippedNotInScope;
        }

        info!("Processing file: {}", event.key);
        let mut retry_count = event.retry_count;

        match self.process(event, &mut retry_count).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(
                    "Error processing {} at stage {}: {} ({})",
                    event.key,
                    err.stage(),
                    err,
                    err.system_detail().unwrap_or_default()
                );
                let payload = AlertPayload::from_error(
                    event,
                    self.config.cdn_url(&event.key),
                    retry_count,
                    &err,
                );
                self.alerter.send(&payload).await;
                ProcessingOutcome::Failed {
                    stage: err.stage(),
                    reason: err.to_string(),
                    retry_count,
                }
            }
        }
    }

    async fn process(
        &self,
        event: &ObjectEvent,
        retry_count: &mut u32,
    ) -> Result<ProcessingOutcome, PipelineError> {
        let key = &event.key;

        // Step 2: Idempotency guard
        let mut tags = self
            .store
            .get_object_tags(key)
            .await
            .map_err(|source| PipelineError::Metadata {
                key: key.clone(),
                source,
            })?;

        if check_processed(&tags) == GuardDecision::AlreadyProcessed {
            info!("Skipping file {}: already processed", key);
            return Ok(ProcessingOutcome::SkippedAlreadyProcessed);
        }

        *retry_count = (*retry_count).max(tags.retry_count());
        if *retry_count >= self.config.max_retries {
            return Err(PipelineError::RetryBudgetExceeded {
                file_name: event.file_name().to_string(),
                retry_count: *retry_count,
            });
        }

        let start_time = Instant::now();

        // Step 3: Retrieval
        info!("Downloading {} from bucket {}", key, self.config.bucket_name);
        let object = self
            .store
            .get_object(key)
            .await
            .map_err(|source| PipelineError::Retrieval {
                key: key.clone(),
                source,
            })?;

        // Step 4 + 5: Inspect and convert
        let Some(rgb_bytes) = self.convert(key, object.body).await? else {
            info!("File {} is not CMYK, no conversion needed", key);
            return Ok(ProcessingOutcome::SkippedNotCmyk);
        };

        // Step 6: Writer
        let content_type = object
            .content_type
            .as_deref()
            .unwrap_or(DEFAULT_CONTENT_TYPE);
        info!("Uploading converted file to {}", key);
        self.store
            .put_object(key, rgb_bytes, content_type)
            .await
            .map_err(|source| PipelineError::Upload {
                key: key.clone(),
                source,
            })?;

        let elapsed = start_time.elapsed();
        let conversion_secs = elapsed.as_secs_f64().max(1e-6);
        info!(duration = &*format!("{:?}", elapsed); "Converted and uploaded {}", key);

        // Step 7: Tagger
        tags.insert(TAG_PROCESSED, "true");
        tags.insert(TAG_RGB_PROCESSED, "true");
        tags.insert(TAG_CONVERSION_TIME, format!("{:.6}", conversion_secs));
        tags.raise_retry_count(*retry_count);
        self.store
            .put_object_tags(key, &tags)
            .await
            .map_err(|source| PipelineError::Tagging {
                key: key.clone(),
                source,
            })?;

        // Step 8: Cache invalidation
        let path = self.config.invalidation_path(key);
        self.cdn
            .create_invalidation(&self.config.cdn_distribution_id, &path)
            .await
            .map_err(|source| PipelineError::Invalidation {
                path: path.clone(),
                source,
            })?;
        info!("Requested CDN invalidation of {}", path);

        Ok(ProcessingOutcome::Succeeded { conversion_secs })
    }

    /// Decode off the async runtime; `None` when the image is not CMYK.
    async fn convert(&self, key: &str, body: Vec<u8>) -> Result<Option<Vec<u8>>, PipelineError> {
        let codec = Arc::clone(&self.codec);
        let key = key.to_string();

        spawn_blocking(move || -> Result<Option<Vec<u8>>, PipelineError> {
            let decoded = codec
                .decode(&body)
                .map_err(|source| PipelineError::Decode {
                    key: key.clone(),
                    source,
                })?;
            info!("Image mode of {}: {:?}", key, decoded.mode);

            if decoded.mode != ColorMode::Cmyk {
                return Ok(None);
            }

            info!("Converting {} to RGB", key);
            codec
                .to_rgb(decoded)
                .map(Some)
                .map_err(|source| PipelineError::Conversion { key, source })
        })
        .await
        .map_err(|err| {
            PipelineError::Unexpected(anyhow::Error::new(err).context("conversion task panicked"))
        })?
    }
}
