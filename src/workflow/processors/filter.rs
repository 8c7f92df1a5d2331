use percent_encoding::percent_decode_str;
use std::borrow::Cow;

/// Whether `key` lives under the configured scope prefix.
pub fn is_in_scope(key: &str, prefix: &str) -> bool {
    !prefix.is_empty() && key.starts_with(prefix) && key.len() > prefix.len()
}

/// Undo the form-urlencoding S3 applies to object keys in event payloads.
///
/// `+` becomes a space and `%XX` escapes are decoded. Malformed escapes are
/// kept verbatim, and a result that is not UTF-8 falls back to the raw key.
pub fn decode_event_key(raw: &str) -> String {
    percent_decode_str(&raw.replace('+', " "))
        .decode_utf8()
        .map(Cow::into_owned)
        .unwrap_or_else(|_| raw.to_string())
}
