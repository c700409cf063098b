//! Pipeline trait definition

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{PipelineError, TransformResult};
use crate::host::{FileNode, HostHandles};
use crate::options::ImageOptions;

/// One call to a transform function
#[derive(Debug, Clone, Copy)]
pub struct TransformRequest<'a> {
    /// The project file to process
    pub file: &'a FileNode,
    /// Effective options; unknown keys are in `args.extra`
    pub args: &'a ImageOptions,
    pub handles: &'a HostHandles,
}

/// One call to the SVG tracer
#[derive(Debug, Clone, Copy)]
pub struct TraceRequest<'a> {
    pub file: &'a FileNode,
    /// Tracer options with named constants already translated
    pub args: &'a Map<String, Value>,
    /// Options used to derive the traced file's name
    pub file_args: &'a Map<String, Value>,
    pub handles: &'a HostHandles,
}

/// An external image processing pipeline
///
/// Implementations own the actual resizing, encoding and tracing. The plugin
/// only decides which files to send and how to merge the answers.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use fob_images::pipeline::{
///     ImagePipeline, PipelineError, TraceRequest, TransformRequest, TransformResult,
/// };
///
/// struct VipsPipeline { /* ... */ }
///
/// #[async_trait]
/// impl ImagePipeline for VipsPipeline {
///     async fn transform(
///         &self,
///         function: &str,
///         request: TransformRequest<'_>,
///     ) -> Result<Option<TransformResult>, PipelineError> {
///         match function {
///             "fluid" => self.fluid(request).await,
///             "fixed" => self.fixed(request).await,
///             other => Err(PipelineError::unknown_function(other)),
///         }
///     }
///
///     async fn trace_svg(&self, request: TraceRequest<'_>) -> Result<String, PipelineError> {
///         self.potrace(request).await
///     }
/// }
/// ```
#[async_trait]
pub trait ImagePipeline: Send + Sync {
    /// Run the transform function named `function` (e.g. "fluid", "fixed")
    ///
    /// `Ok(None)` means the pipeline produced nothing for this file; the
    /// element is then left untouched.
    async fn transform(
        &self,
        function: &str,
        request: TransformRequest<'_>,
    ) -> Result<Option<TransformResult>, PipelineError>;

    /// Trace the file into an SVG placeholder, returned as a data URI
    async fn trace_svg(&self, request: TraceRequest<'_>) -> Result<String, PipelineError>;

    /// Value of a named tracer constant (e.g. `TURNPOLICY_LEFT`)
    ///
    /// Option values equal to a known constant name are replaced by the
    /// constant before tracing. The default knows no constants.
    fn trace_constant(&self, name: &str) -> Option<Value> {
        let _ = name;
        None
    }
}
