//! Processors module - one submodule per pipeline stage
//!
//! - `filter`: Event filter and event key decoding
//! - `guard`: Idempotency guard over the object's tags
//! - `image`: Color-space inspection and CMYK to RGB conversion
//! - `alert`: Alert payload formatting and delivery
//! - `setup`: Logger initialization

pub mod alert;
pub mod filter;
pub mod guard;
pub mod image;
pub mod setup;
