use log::{error, info};
use serde::Serialize;

use crate::collaborators::Notifier;
use crate::common::errors::PipelineError;
use crate::workflow::types::{ObjectEvent, Stage};

/// Everything a human needs to act on a failed conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPayload {
    pub file_name: String,
    pub cdn_url: String,
    pub retry_count: u32,
    pub stage: Stage,
    pub error: String,
    pub system_error: Option<String>,
}

impl AlertPayload {
    pub fn from_error(
        event: &ObjectEvent,
        cdn_url: String,
        retry_count: u32,
        error: &PipelineError,
    ) -> Self {
        Self {
            file_name: event.file_name().to_string(),
            cdn_url,
            retry_count,
            stage: error.stage(),
            error: error.to_string(),
            system_error: error.system_detail(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self.stage {
            Stage::Retry => "Max retries reached for CMYK conversion",
            Stage::Invalidation => "CMYK conversion done, CDN invalidation failed",
            _ => "CMYK to RGB conversion failed",
        }
    }

    /// Slack mrkdwn body
    pub fn render(&self) -> String {
        let mut text = format!(
            ":rotating_light: *{}*\n*File:* {}\n*CDN URL:* {}\n*Retry count:* {}\n*Stage:* {}\n*Error:* {}",
            self.title(),
            self.file_name,
            self.cdn_url,
            self.retry_count,
            self.stage,
            self.error
        );
        if let Some(detail) = &self.system_error {
            text.push_str(&format!("\n*System error:* ```{}```", detail));
        }
        text
    }
}

/// Delivers alerts; never fails past itself.
pub struct Alerter<'a> {
    notifier: &'a dyn Notifier,
}

impl<'a> Alerter<'a> {
    pub fn new(notifier: &'a dyn Notifier) -> Self {
        Self { notifier }
    }

    pub async fn send(&self, payload: &AlertPayload) {
        match self.notifier.notify(payload).await {
            Ok(()) => info!(
                "Alert sent for {} (stage: {})",
                payload.file_name, payload.stage
            ),
            Err(err) => error!(
                "Failed to deliver alert for {} (stage: {}): {:#}",
                payload.file_name, payload.stage, err
            ),
        }
    }
}
