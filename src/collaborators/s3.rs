use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Tag, Tagging};

use super::{ObjectStore, StoredObject};
use crate::workflow::types::ObjectTags;

pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, key: &str) -> Result<StoredObject> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| anyhow!("{}", DisplayErrorContext(&err)))
            .with_context(|| format!("GetObject s3://{}/{}", self.bucket, key))?;

        let content_type = output.content_type().map(str::to_string);
        let body = output
            .body
            .collect()
            .await
            .with_context(|| format!("failed to read body of s3://{}/{}", self.bucket, key))?
            .into_bytes()
            .to_vec();

        Ok(StoredObject { body, content_type })
    }

    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| anyhow!("{}", DisplayErrorContext(&err)))
            .with_context(|| format!("PutObject s3://{}/{}", self.bucket, key))?;
        Ok(())
    }

    async fn get_object_tags(&self, key: &str) -> Result<ObjectTags> {
        let result = self
            .client
            .get_object_tagging()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            // The object is gone or was never there; the download will report it.
            Err(err)
                if err
                    .raw_response()
                    .is_some_and(|raw| raw.status().as_u16() == 404) =>
            {
                return Ok(ObjectTags::new());
            }
            Err(err) => {
                return Err(anyhow!("{}", DisplayErrorContext(&err)))
                    .with_context(|| format!("GetObjectTagging s3://{}/{}", self.bucket, key));
            }
        };

        Ok(output
            .tag_set()
            .iter()
            .map(|tag| (tag.key(), tag.value()))
            .collect())
    }

    async fn put_object_tags(&self, key: &str, tags: &ObjectTags) -> Result<()> {
        let tag_set = tags
            .iter()
            .map(|(k, v)| Tag::builder().key(k).value(v).build())
            .collect::<Result<Vec<_>, _>>()
            .context("failed to build S3 tag set")?;
        let tagging = Tagging::builder()
            .set_tag_set(Some(tag_set))
            .build()
            .context("failed to build S3 tagging")?;

        self.client
            .put_object_tagging()
            .bucket(&self.bucket)
            .key(key)
            .tagging(tagging)
            .send()
            .await
            .map_err(|err| anyhow!("{}", DisplayErrorContext(&err)))
            .with_context(|| format!("PutObjectTagging s3://{}/{}", self.bucket, key))?;
        Ok(())
    }
}
