use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::common::{TAG_PROCESSED, TAG_RETRY_COUNT};

// ────────────────────────────────────────────────────────────────
// ObjectEvent - the single input of one pipeline run
// ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEvent {
    pub key: String,
    /// Attempts already made, as counted by the invocation layer
    pub retry_count: u32,
}

impl ObjectEvent {
    pub fn new(key: impl Into<String>, retry_count: u32) -> Self {
        Self {
            key: key.into(),
            retry_count,
        }
    }

    /// Last path segment of the key, used in alerts
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

// ────────────────────────────────────────────────────────────────
// Stage
// ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Metadata,
    Retry,
    Download,
    Decode,
    Conversion,
    Upload,
    Tagging,
    Invalidation,
    Unexpected,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Metadata => "metadata",
            Stage::Retry => "retry",
            Stage::Download => "download",
            Stage::Decode => "decode",
            Stage::Conversion => "conversion",
            Stage::Upload => "upload",
            Stage::Tagging => "tagging",
            Stage::Invalidation => "invalidation",
            Stage::Unexpected => "unexpected",
        }
    }

    /// Whether a re-delivery of the same event can succeed where this stage failed.
    ///
    /// Corrupt images stay corrupt, and after an invalidation failure the
    /// object is already tagged processed, so both are terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Stage::Metadata | Stage::Download | Stage::Upload | Stage::Tagging | Stage::Unexpected
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ────────────────────────────────────────────────────────────────
// ProcessingOutcome
// ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ProcessingOutcome {
    SkippedNotInScope,
    SkippedAlreadyProcessed,
    SkippedNotCmyk,
    Succeeded {
        conversion_secs: f64,
    },
    Failed {
        stage: Stage,
        reason: String,
        retry_count: u32,
    },
}

impl ProcessingOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            ProcessingOutcome::SkippedNotInScope
            | ProcessingOutcome::SkippedAlreadyProcessed
            | ProcessingOutcome::SkippedNotCmyk => "skipped",
            ProcessingOutcome::Succeeded { .. } => "converted",
            ProcessingOutcome::Failed { .. } => "failed",
        }
    }

    pub fn reason(&self) -> String {
        match self {
            ProcessingOutcome::SkippedNotInScope => "Not in scope".to_string(),
            ProcessingOutcome::SkippedAlreadyProcessed => "Already processed".to_string(),
            ProcessingOutcome::SkippedNotCmyk => "Not CMYK".to_string(),
            ProcessingOutcome::Succeeded { .. } => "Converted to RGB".to_string(),
            ProcessingOutcome::Failed { stage, reason, .. } => format!("{stage}: {reason}"),
        }
    }
}

// ────────────────────────────────────────────────────────────────
// ObjectTags - metadata persisted on the stored object
// ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectTags(BTreeMap<String, String>);

impl ObjectTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_processed(&self) -> bool {
        self.get(TAG_PROCESSED)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    /// Persisted retry count; unparsable values count as zero
    pub fn retry_count(&self) -> u32 {
        self.get(TAG_RETRY_COUNT)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Store `count` unless a higher count is already recorded.
    pub fn raise_retry_count(&mut self, count: u32) {
        let count = count.max(self.retry_count());
        self.insert(TAG_RETRY_COUNT, count.to_string());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ObjectTags {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
