//! Invocation layer - turns one S3 notification into pipeline runs
//!
//! Owns the persisted retry counter: the pipeline only reads it, this layer
//! raises it after a failure that a re-delivery could fix.

use anyhow::{Context, Result};
use aws_lambda_events::event::s3::S3Event;
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;

use crate::collaborators::{CdnInvalidator, Notifier, ObjectStore};
use crate::common::errors::handle_error;
use crate::config::AppConfig;
use crate::workflow::processors::filter::decode_event_key;
use crate::workflow::processors::image::ImageCodec;
use crate::workflow::{ObjectEvent, Pipeline, ProcessingOutcome};

/// Collaborators and configuration shared by every invocation of the process.
pub struct Services {
    pub config: AppConfig,
    pub store: Arc<dyn ObjectStore>,
    pub codec: Arc<dyn ImageCodec>,
    pub cdn: Arc<dyn CdnInvalidator>,
    pub notifier: Arc<dyn Notifier>,
}

impl Services {
    pub fn pipeline(&self) -> Pipeline<'_> {
        Pipeline::new(
            &self.config,
            self.store.as_ref(),
            Arc::clone(&self.codec),
            self.cdn.as_ref(),
            self.notifier.as_ref(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub file: String,
    pub status: String,
    pub reason: String,
    #[serde(skip)]
    pub redeliver: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationReport {
    pub status: String,
    pub processed_files: Vec<FileReport>,
}

impl InvocationReport {
    /// True when a record failed at a stage that a re-delivery could fix.
    pub fn needs_redelivery(&self) -> bool {
        self.processed_files.iter().any(|file| file.redeliver)
    }
}

/// Process every record of the event in order.
pub async fn handle_event(services: &Services, event: &S3Event) -> InvocationReport {
    let mut processed_files = Vec::with_capacity(event.records.len());

    for record in &event.records {
        let Some(raw_key) = record.s3.object.key.as_deref() else {
            warn!("Skipping record without object key");
            continue;
        };
        let key = decode_event_key(raw_key);

        if let Some(bucket) = record.s3.bucket.name.as_deref() {
            if bucket != services.config.bucket_name {
                info!("Skipping file {}: bucket {} is not configured", key, bucket);
                processed_files.push(FileReport {
                    file: key,
                    status: "skipped".to_string(),
                    reason: format!("Bucket {} is not configured", bucket),
                    redeliver: false,
                });
                continue;
            }
        }

        processed_files.push(handle_key(services, key).await);
    }

    let failed = processed_files.iter().any(|f| f.status == "failed");
    let report = InvocationReport {
        status: if failed { "error" } else { "success" }.to_string(),
        processed_files,
    };
    info!(
        "Returning result: {}",
        serde_json::to_string(&report).unwrap_or_default()
    );
    report
}

/// Run the pipeline for one key, then bump the retry counter if worth retrying.
pub async fn handle_key(services: &Services, key: String) -> FileReport {
    // S3 notifications carry no attempt count; the persisted tag is the source of truth.
    let event = ObjectEvent::new(key, 0);
    let outcome = services.pipeline().run(&event).await;

    let mut redeliver = false;
    if let ProcessingOutcome::Failed {
        stage, retry_count, ..
    } = &outcome
    {
        if stage.is_retryable() {
            redeliver = true;
            if let Err(err) =
                record_failed_attempt(services.store.as_ref(), &event.key, *retry_count).await
            {
                handle_error(err);
            }
        }
    }

    FileReport {
        file: event.key,
        status: outcome.status().to_string(),
        reason: outcome.reason(),
        redeliver,
    }
}

/// Persist `retry_count + 1`, keeping every other tag and never lowering the count.
pub async fn record_failed_attempt(
    store: &dyn ObjectStore,
    key: &str,
    retry_count: u32,
) -> Result<()> {
    let mut tags = store
        .get_object_tags(key)
        .await
        .with_context(|| format!("failed to read tags of {} to record a retry", key))?;
    tags.raise_retry_count(retry_count.saturating_add(1));
    store
        .put_object_tags(key, &tags)
        .await
        .with_context(|| format!("failed to record retry {} for {}", tags.retry_count(), key))?;
    info!("Recorded retry {} for {}", tags.retry_count(), key);
    Ok(())
}
