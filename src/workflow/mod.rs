//! Workflow module - the per-object normalization pipeline
//!
//! - `types`: Event, outcome, stage and tag types
//! - `processors`: One submodule per stage
//! - `flows`: The pipeline that drives the stages in order

pub mod flows;
pub mod processors;
pub mod types;

pub use flows::Pipeline;
pub use types::{ObjectEvent, ObjectTags, ProcessingOutcome, Stage};
