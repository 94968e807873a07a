//! cw-pipeline - Stage orchestration for the campus warehouse
//!
//! Runs Extract, Transform and Load in sequence, optionally audits the
//! loaded warehouse, and records the outcome in a run report written after
//! every run.

pub mod error;
pub mod pipeline;

pub use error::{PipelineError, PipelineResult};
pub use pipeline::{Pipeline, PipelineOptions};
