//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::{Value, json};

use cmyk_normalizer::collaborators::{CdnInvalidator, Notifier, ObjectStore, StoredObject};
use cmyk_normalizer::common::errors::DecodeError;
use cmyk_normalizer::config::AppConfig;
use cmyk_normalizer::handler::Services;
use cmyk_normalizer::workflow::ObjectTags;
use cmyk_normalizer::workflow::processors::alert::AlertPayload;
use cmyk_normalizer::workflow::processors::image::{
    ColorMode, DecodedImage, ImageCodec, PixelLayout, cmyk_to_rgb,
};

pub const KEY: &str = "smartsell/pages_1/abc123.jpg";

pub fn config() -> AppConfig {
    AppConfig::from_vars(vec![
        ("BUCKET_NAME".to_string(), "ss-au-bank-preprod".to_string()),
        (
            "CDN_BASE_URL".to_string(),
            "https://cdn.example.com".to_string(),
        ),
        ("CDN_DISTRIBUTION_ID".to_string(), "E2EXAMPLE".to_string()),
    ])
    .unwrap()
}

// ────────────────────────────────────────────────────────────────
// Object store
// ────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, (StoredObject, ObjectTags)>>,
    calls: Mutex<Vec<String>>,
    pub fail_get: bool,
    pub fail_get_tags: bool,
    pub fail_put: bool,
    pub fail_put_tags: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, body: Vec<u8>, tags: ObjectTags) {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            (
                StoredObject {
                    body,
                    content_type: Some("image/jpeg".to_string()),
                },
                tags,
            ),
        );
    }

    pub fn body(&self, key: &str) -> Vec<u8> {
        self.objects.lock().unwrap()[key].0.body.clone()
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects.lock().unwrap()[key].0.content_type.clone()
    }

    pub fn tags(&self, key: &str) -> ObjectTags {
        self.objects.lock().unwrap()[key].1.clone()
    }

    pub fn set_tags(&self, key: &str, tags: ObjectTags) {
        self.objects.lock().unwrap().get_mut(key).unwrap().1 = tags;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that change the stored object
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("put"))
            .collect()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get_object(&self, key: &str) -> Result<StoredObject> {
        self.record("get_object");
        if self.fail_get {
            bail!("connection reset by peer");
        }
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(object, _)| object.clone())
            .ok_or_else(|| anyhow!("NoSuchKey: {}", key))
    }

    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        self.record("put_object");
        if self.fail_put {
            bail!("access denied");
        }
        let object = StoredObject {
            body,
            content_type: Some(content_type.to_string()),
        };
        // S3 replaces the tag set on a PutObject without a Tagging header
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (object, ObjectTags::new()));
        Ok(())
    }

    async fn get_object_tags(&self, key: &str) -> Result<ObjectTags> {
        self.record("get_object_tags");
        if self.fail_get_tags {
            bail!("throttled");
        }
        Ok(self
            .objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(_, tags)| tags.clone())
            .unwrap_or_default())
    }

    async fn put_object_tags(&self, key: &str, tags: &ObjectTags) -> Result<()> {
        self.record("put_object_tags");
        if self.fail_put_tags {
            bail!("tagging quota exceeded");
        }
        let mut objects = self.objects.lock().unwrap();
        let (_, stored_tags) = objects
            .get_mut(key)
            .ok_or_else(|| anyhow!("NoSuchKey: {}", key))?;
        *stored_tags = tags.clone();
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────
// CDN and notifier
// ────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingCdn {
    pub invalidations: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

#[async_trait]
impl CdnInvalidator for RecordingCdn {
    async fn create_invalidation(&self, distribution_id: &str, path: &str) -> Result<()> {
        self.invalidations
            .lock()
            .unwrap()
            .push((distribution_id.to_string(), path.to_string()));
        if self.fail {
            bail!("TooManyInvalidationsInProgress");
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub alerts: Mutex<Vec<AlertPayload>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn alerts(&self) -> Vec<AlertPayload> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, payload: &AlertPayload) -> Result<()> {
        self.alerts.lock().unwrap().push(payload.clone());
        if self.fail {
            bail!("invalid_auth");
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────
// Codec
// ────────────────────────────────────────────────────────────────

/// Understands `CMYK` + packed pixels and `RGB` + packed pixels; nothing else.
#[derive(Debug, Default)]
pub struct FakeCodec;

pub fn fake_cmyk(pixels: &[u8]) -> Vec<u8> {
    [b"CMYK".as_slice(), pixels].concat()
}

impl ImageCodec for FakeCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
        let (mode, layout, pixels) = if let Some(rest) = bytes.strip_prefix(b"CMYK") {
            (ColorMode::Cmyk, PixelLayout::Cmyk, rest)
        } else if let Some(rest) = bytes.strip_prefix(b"RGB") {
            (ColorMode::Rgb, PixelLayout::Rgb, rest)
        } else {
            return Err(DecodeError::UnknownFormat);
        };
        Ok(DecodedImage {
            mode,
            format: ImageFormat::Jpeg,
            width: (pixels.len() / layout.channels()) as u32,
            height: 1,
            layout,
            pixels: pixels.to_vec(),
        })
    }

    fn to_rgb(&self, image: DecodedImage) -> Result<Vec<u8>, DecodeError> {
        let rgb = match image.layout {
            PixelLayout::Cmyk => cmyk_to_rgb(&image.pixels),
            PixelLayout::Rgb => image.pixels,
        };
        Ok([b"RGB".as_slice(), &rgb].concat())
    }
}

/// A Photoshop-style CMYK JPEG (Adobe marker, inverted samples) of pure cyan.
pub fn cmyk_jpeg() -> Vec<u8> {
    let mut bytes = Vec::new();
    jpeg_encoder::Encoder::new(&mut bytes, 95)
        .encode(
            &[255, 0, 0, 0].repeat(16 * 16),
            16,
            16,
            jpeg_encoder::ColorType::Cmyk,
        )
        .unwrap();
    bytes
}

pub fn rgb_jpeg() -> Vec<u8> {
    let image = RgbImage::from_pixel(8, 8, Rgb([12, 150, 220]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .unwrap();
    bytes
}

// ────────────────────────────────────────────────────────────────
// Harness
// ────────────────────────────────────────────────────────────────

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub cdn: Arc<RecordingCdn>,
    pub notifier: Arc<RecordingNotifier>,
    pub codec: Arc<dyn ImageCodec>,
}

impl Harness {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store: Arc::new(store),
            cdn: Arc::new(RecordingCdn::default()),
            notifier: Arc::new(RecordingNotifier::default()),
            codec: Arc::new(FakeCodec),
        }
    }

    pub fn with_cdn(mut self, cdn: RecordingCdn) -> Self {
        self.cdn = Arc::new(cdn);
        self
    }

    pub fn with_notifier(mut self, notifier: RecordingNotifier) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    pub fn with_codec(mut self, codec: Arc<dyn ImageCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn services(&self) -> Services {
        Services {
            config: config(),
            store: self.store.clone(),
            codec: self.codec.clone(),
            cdn: self.cdn.clone(),
            notifier: self.notifier.clone(),
        }
    }

    pub fn invalidations(&self) -> Vec<(String, String)> {
        self.cdn.invalidations.lock().unwrap().clone()
    }
}

/// An S3 put notification shaped like the ones S3 delivers.
pub fn s3_event(bucket: &str, key: &str) -> Value {
    json!({
        "Records": [{
            "eventVersion": "2.1",
            "eventSource": "aws:s3",
            "awsRegion": "ap-south-1",
            "eventTime": "2025-06-03T04:45:09.042Z",
            "eventName": "ObjectCreated:Put",
            "userIdentity": { "principalId": "AWS:EXAMPLE" },
            "requestParameters": { "sourceIPAddress": "43.224.159.17" },
            "responseElements": {
                "x-amz-request-id": "236FD4DC5XG8D600",
                "x-amz-id-2": "example"
            },
            "s3": {
                "s3SchemaVersion": "1.0",
                "configurationId": "cmyk-upload-trigger",
                "bucket": {
                    "name": bucket,
                    "ownerIdentity": { "principalId": "A147FBF2EKRJEQ" },
                    "arn": format!("arn:aws:s3:::{}", bucket)
                },
                "object": {
                    "key": key,
                    "size": 3459760,
                    "eTag": "3231172aceb791c7116f87cff763ac4f",
                    "sequencer": "00683E7DD4E0520BCA"
                }
            }
        }]
    })
}
