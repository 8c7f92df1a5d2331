//! Converts CMYK images uploaded to S3 into RGB in place, tags them as
//! processed, invalidates their CloudFront path and alerts Slack on failure.

pub mod collaborators;
pub mod common;
pub mod config;
pub mod handler;
pub mod workflow;
