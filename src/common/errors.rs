use log::error;
use thiserror::Error;

use crate::workflow::types::Stage;

/// Failures of the image codec, raised while inspecting or converting.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unrecognized image format")]
    UnknownFormat,

    #[error("image data is corrupt: {0}")]
    Corrupt(String),

    #[error("malformed pixel data: expected {expected} bytes, got {actual}")]
    MalformedPixels { expected: usize, actual: usize },

    #[error("failed to encode RGB image: {0}")]
    Encode(String),
}

/// Every failure that ends an invocation with an alert.
///
/// Silent skips are not errors; they are `ProcessingOutcome` values.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read tags of {key}")]
    Metadata {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to download {key}")]
    Retrieval {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to decode {key}")]
    Decode {
        key: String,
        #[source]
        source: DecodeError,
    },

    #[error("failed to convert {key} to RGB")]
    Conversion {
        key: String,
        #[source]
        source: DecodeError,
    },

    #[error("failed to upload converted {key}")]
    Upload {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("uploaded {key} but failed to tag it as processed")]
    Tagging {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to invalidate CDN path {path}")]
    Invalidation {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Max retries reached for file: {file_name}")]
    RetryBudgetExceeded { file_name: String, retry_count: u32 },

    #[error("unexpected failure: {0}")]
    Unexpected(anyhow::Error),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Metadata { .. } => Stage::Metadata,
            PipelineError::Retrieval { .. } => Stage::Download,
            PipelineError::Decode { .. } => Stage::Decode,
            PipelineError::Conversion { .. } => Stage::Conversion,
            PipelineError::Upload { .. } => Stage::Upload,
            PipelineError::Tagging { .. } => Stage::Tagging,
            PipelineError::Invalidation { .. } => Stage::Invalidation,
            PipelineError::RetryBudgetExceeded { .. } => Stage::Retry,
            PipelineError::Unexpected(_) => Stage::Unexpected,
        }
    }

    /// The collaborator's own error text, if the failure came from one
    pub fn system_detail(&self) -> Option<String> {
        match self {
            PipelineError::Metadata { source, .. }
            | PipelineError::Retrieval { source, .. }
            | PipelineError::Upload { source, .. }
            | PipelineError::Tagging { source, .. }
            | PipelineError::Invalidation { source, .. } => Some(format!("{source:#}")),
            PipelineError::Decode { source, .. } | PipelineError::Conversion { source, .. } => {
                Some(source.to_string())
            }
            PipelineError::Unexpected(error) => Some(format!("{error:#}")),
            PipelineError::RetryBudgetExceeded { .. } => None,
        }
    }
}

/// Log an error with its full context chain and hand it back.
pub fn handle_error(error: anyhow::Error) -> anyhow::Error {
    error!("{:?}", error);
    error
}
