pub mod errors;

pub const DEFAULT_SCOPE_PREFIX: &str = "smartsell/pages_1/";

pub const MAX_RETRIES: u32 = 3;

pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// Quality used when re-encoding converted JPEGs
pub const JPEG_QUALITY: u8 = 95;

pub const TAG_PROCESSED: &str = "processed";

pub const TAG_RGB_PROCESSED: &str = "isRGBProcessed";

pub const TAG_CONVERSION_TIME: &str = "conversionTimeSec";

pub const TAG_RETRY_COUNT: &str = "retryCount";
