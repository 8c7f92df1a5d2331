//! Interfaces to the systems the pipeline talks to, plus their AWS/Slack implementations.

pub mod cloudfront;
pub mod s3;
pub mod secrets;
pub mod slack;

use anyhow::Result;
use async_trait::async_trait;

use crate::workflow::processors::alert::AlertPayload;
use crate::workflow::types::ObjectTags;

pub use cloudfront::CloudFrontInvalidator;
pub use s3::S3ObjectStore;
pub use secrets::SecretsManagerSource;
pub use slack::SlackNotifier;

/// Object content as fetched from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

/// Storage operations, scoped to the configured bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_object(&self, key: &str) -> Result<StoredObject>;

    /// Overwrite the object at `key`.
    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()>;

    /// Tags of the object; empty when it has none or no longer exists.
    async fn get_object_tags(&self, key: &str) -> Result<ObjectTags>;

    /// Replace the whole tag set of the object.
    async fn put_object_tags(&self, key: &str, tags: &ObjectTags) -> Result<()>;
}

#[async_trait]
pub trait CdnInvalidator: Send + Sync {
    async fn create_invalidation(&self, distribution_id: &str, path: &str) -> Result<()>;
}

#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Raw secret string for `secret_id`
    async fn secret_string(&self, secret_id: &str) -> Result<String>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, payload: &AlertPayload) -> Result<()>;
}
