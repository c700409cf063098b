//! Image pipeline contract
//!
//! Resizing, encoding and SVG tracing are delegated to an external pipeline.
//! This module defines the boundary:
//!
//! - **[`ImagePipeline`]**: trait the host implements (e.g. a sharp or
//!   libvips service)
//! - **[`TransformResult`]**: the pipeline's opaque result record
//! - **[`PipelineError`]**: error types for pipeline calls

mod error;
mod result;
mod traits;

pub use error::PipelineError;
pub use result::TransformResult;
pub use traits::{ImagePipeline, TraceRequest, TransformRequest};
