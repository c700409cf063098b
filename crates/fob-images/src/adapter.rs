//! Bridge between attribute values and the image pipeline
//!
//! Resolves an attribute value to a project file, runs the configured
//! transform function, and decorates the result with webp and traced SVG
//! variants when asked to.

use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::error::Result;
use crate::host::{DocumentContext, FileNode};
use crate::options::ImageOptions;
use crate::pipeline::{ImagePipeline, TraceRequest, TransformRequest, TransformResult};
use crate::url::{join_image_path, normalize_path};

/// Runs pipeline calls for one markdown document
pub struct ImageAdapter<'a> {
    pipeline: &'a dyn ImagePipeline,
    options: &'a ImageOptions,
    ctx: &'a DocumentContext<'a>,
}

impl<'a> ImageAdapter<'a> {
    pub fn new(
        pipeline: &'a dyn ImagePipeline,
        options: &'a ImageOptions,
        ctx: &'a DocumentContext<'a>,
    ) -> Self {
        Self {
            pipeline,
            options,
            ctx,
        }
    }

    /// Generate image metadata for an attribute value
    ///
    /// Returns `Ok(None)` when the document has no directory or no project
    /// file matches the value. Pipeline failures are returned as errors.
    pub async fn generate(
        &self,
        source: &str,
        overrides: Option<&Map<String, Value>>,
    ) -> Result<Option<TransformResult>> {
        let Some(dir) = self.ctx.parent_dir() else {
            tracing::debug!(source, "No parent directory for markdown node, skipping");
            return Ok(None);
        };

        let image_path = join_image_path(&dir, source);
        let Some(file) = self.find_file(&image_path) else {
            tracing::debug!(
                source,
                path = %image_path.display(),
                "No project file matches image, skipping"
            );
            return Ok(None);
        };

        let options = match overrides {
            Some(overrides) => Cow::Owned(self.options.with_override(overrides)?),
            None => Cow::Borrowed(self.options),
        };
        let function = options.sharp_function.as_str();
        let handles = &self.ctx.handles;

        let request = TransformRequest {
            file,
            args: &options,
            handles,
        };
        let Some(mut result) = self.pipeline.transform(function, request).await? else {
            tracing::debug!(source, function, "Pipeline returned no result");
            return Ok(None);
        };

        if options.with_webp {
            let webp_options = options.to_webp();
            let request = TransformRequest {
                file,
                args: &webp_options,
                handles,
            };
            if let Some(webp) = self.pipeline.transform(function, request).await? {
                result.set_webp(&webp);
            }
        }

        if let Some(traced) = &options.traced_svg {
            let args = self.translate_constants(traced.args());
            let request = TraceRequest {
                file,
                args: &args,
                file_args: &args,
                handles,
            };
            let svg = self.pipeline.trace_svg(request).await?;

            // Safe inside single-quoted inline styles
            result.set_traced_svg(svg.replace('\'', "\\'"));

            if !options.preserve_base64 {
                result.clear_base64();
            }
        }

        Ok(Some(result))
    }

    fn find_file(&self, image_path: &std::path::Path) -> Option<&'a FileNode> {
        self.ctx.files.iter().find(|file| {
            file.absolute_path()
                .is_some_and(|path| normalize_path(path) == image_path)
        })
    }

    /// Replace option values that name a tracer constant with its value
    fn translate_constants(&self, args: Map<String, Value>) -> Map<String, Value> {
        args.into_iter()
            .map(|(key, value)| {
                let translated = value
                    .as_str()
                    .and_then(|name| self.pipeline.trace_constant(name))
                    .unwrap_or(value);
                (key, translated)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::host::{HostNode, MarkdownNode};
    use crate::options::{PluginOptions, TracedSvg};
    use crate::pipeline::PipelineError;

    /// Records every call and answers from fixed results
    #[derive(Default)]
    struct RecordingPipeline {
        primary: Option<TransformResult>,
        webp: Option<TransformResult>,
        svg: String,
        calls: Mutex<Vec<(String, Value)>>,
        trace_args: Mutex<Vec<Map<String, Value>>>,
    }

    #[async_trait]
    impl ImagePipeline for RecordingPipeline {
        async fn transform(
            &self,
            function: &str,
            request: TransformRequest<'_>,
        ) -> std::result::Result<Option<TransformResult>, PipelineError> {
            self.calls.lock().unwrap().push((
                function.to_string(),
                serde_json::to_value(request.args).unwrap(),
            ));
            if request.args.to_format.as_deref() == Some("WEBP") {
                Ok(self.webp.clone())
            } else {
                Ok(self.primary.clone())
            }
        }

        async fn trace_svg(
            &self,
            request: TraceRequest<'_>,
        ) -> std::result::Result<String, PipelineError> {
            self.trace_args.lock().unwrap().push(request.args.clone());
            Ok(self.svg.clone())
        }

        fn trace_constant(&self, name: &str) -> Option<Value> {
            match name {
                "TURNPOLICY_LEFT" => Some(json!("left")),
                "COLOR_AUTO" => Some(json!("auto")),
                _ => None,
            }
        }
    }

    struct Fixture {
        markdown_node: MarkdownNode,
        nodes: HashMap<String, HostNode>,
        files: Vec<FileNode>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                markdown_node: MarkdownNode::new("md", "file"),
                nodes: HashMap::from([(
                    "file".to_string(),
                    HostNode::with_dir("file", "/site/posts"),
                )]),
                files: vec![
                    FileNode::new("a", "/site/posts/a.png"),
                    FileNode::new("b", "/site/shared/b.jpg"),
                ],
            }
        }

        fn ctx(&self) -> DocumentContext<'_> {
            DocumentContext::new(&self.markdown_node, &self.nodes, &self.files)
        }
    }

    fn primary() -> TransformResult {
        TransformResult::new()
            .with("src", "a-400.png")
            .with("srcSet", "a-200.png 200w, a-400.png 400w")
            .with("base64", "data:image/png;base64,AAAA")
    }

    #[tokio::test]
    async fn test_generates_for_matching_file() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let pipeline = RecordingPipeline {
            primary: Some(primary()),
            ..Default::default()
        };
        let options = ImageOptions::default();
        let adapter = ImageAdapter::new(&pipeline, &options, &ctx);

        let result = adapter.generate("./a.png", None).await.unwrap().unwrap();

        assert_eq!(result, primary());
        let calls = pipeline.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "fluid");
    }

    #[tokio::test]
    async fn test_resolves_parent_relative_paths() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let pipeline = RecordingPipeline {
            primary: Some(primary()),
            ..Default::default()
        };
        let options = ImageOptions::default();
        let adapter = ImageAdapter::new(&pipeline, &options, &ctx);

        assert!(adapter.generate("../shared/b.jpg", None).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_file_is_not_an_error() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let pipeline = RecordingPipeline {
            primary: Some(primary()),
            ..Default::default()
        };
        let options = ImageOptions::default();
        let adapter = ImageAdapter::new(&pipeline, &options, &ctx);

        assert!(adapter.generate("./missing.png", None).await.unwrap().is_none());
        assert!(pipeline.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_parent_dir_is_not_an_error() {
        let fixture = Fixture::new();
        let orphan = MarkdownNode::new("md", "unknown");
        let ctx = DocumentContext::new(&orphan, &fixture.nodes, &fixture.files);
        let pipeline = RecordingPipeline::default();
        let options = ImageOptions::default();
        let adapter = ImageAdapter::new(&pipeline, &options, &ctx);

        assert!(adapter.generate("./a.png", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_override_merges_over_global_options() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let pipeline = RecordingPipeline {
            primary: Some(primary()),
            ..Default::default()
        };
        let options = PluginOptions::resolve(json!({ "maxWidth": 800, "quality": 50 }))
            .unwrap()
            .image;
        let adapter = ImageAdapter::new(&pipeline, &options, &ctx);
        let overrides = json!({ "sharpFunction": "fixed", "maxWidth": 300 });

        adapter
            .generate("./a.png", overrides.as_object())
            .await
            .unwrap();

        let calls = pipeline.calls.lock().unwrap();
        assert_eq!(calls[0].0, "fixed");
        assert_eq!(calls[0].1["maxWidth"], json!(300));
        assert_eq!(calls[0].1["quality"], json!(50));
    }

    #[tokio::test]
    async fn test_webp_variant_is_attached() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let pipeline = RecordingPipeline {
            primary: Some(primary()),
            webp: Some(
                TransformResult::new()
                    .with("src", "a-400.webp")
                    .with("srcSet", "a-200.webp 200w, a-400.webp 400w"),
            ),
            ..Default::default()
        };
        let options = ImageOptions {
            with_webp: true,
            ..ImageOptions::default()
        };
        let adapter = ImageAdapter::new(&pipeline, &options, &ctx);

        let result = adapter.generate("./a.png", None).await.unwrap().unwrap();

        assert_eq!(result.get("srcWebp"), Some(&json!("a-400.webp")));
        assert_eq!(
            result.get("srcSetWebp"),
            Some(&json!("a-200.webp 200w, a-400.webp 400w"))
        );
        let calls = pipeline.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].1["toFormat"], json!("WEBP"));
    }

    #[tokio::test]
    async fn test_missing_webp_variant_leaves_fields_absent() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let pipeline = RecordingPipeline {
            primary: Some(primary()),
            webp: None,
            ..Default::default()
        };
        let options = ImageOptions {
            with_webp: true,
            ..ImageOptions::default()
        };
        let adapter = ImageAdapter::new(&pipeline, &options, &ctx);

        let result = adapter.generate("./a.png", None).await.unwrap().unwrap();

        assert!(result.get("srcWebp").is_none());
        assert!(result.get("srcSetWebp").is_none());
    }

    #[tokio::test]
    async fn test_traced_svg_is_escaped_and_replaces_base64() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let pipeline = RecordingPipeline {
            primary: Some(primary()),
            svg: "data:image/svg+xml,<svg fill='#ccc'><path d='M0 0'/></svg>".to_string(),
            ..Default::default()
        };
        let options = ImageOptions {
            traced_svg: Some(TracedSvg::Enabled),
            ..ImageOptions::default()
        };
        let adapter = ImageAdapter::new(&pipeline, &options, &ctx);

        let result = adapter.generate("./a.png", None).await.unwrap().unwrap();

        let traced = result.get("tracedSVG").and_then(Value::as_str).unwrap();
        assert_eq!(
            traced,
            r"data:image/svg+xml,<svg fill=\'#ccc\'><path d=\'M0 0\'/></svg>"
        );
        assert!(
            !traced.replace("\\'", "").contains('\''),
            "every single quote must be escaped"
        );
        assert_eq!(result.get("base64"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_preserve_base64() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let pipeline = RecordingPipeline {
            primary: Some(primary()),
            svg: "<svg/>".to_string(),
            ..Default::default()
        };
        let options = ImageOptions {
            traced_svg: Some(TracedSvg::Enabled),
            preserve_base64: true,
            ..ImageOptions::default()
        };
        let adapter = ImageAdapter::new(&pipeline, &options, &ctx);

        let result = adapter.generate("./a.png", None).await.unwrap().unwrap();

        assert_eq!(
            result.get("base64"),
            Some(&json!("data:image/png;base64,AAAA"))
        );
    }

    #[tokio::test]
    async fn test_trace_constants_are_translated() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let pipeline = RecordingPipeline {
            primary: Some(primary()),
            svg: "<svg/>".to_string(),
            ..Default::default()
        };
        let args = json!({ "turnPolicy": "TURNPOLICY_LEFT", "color": "#333", "threshold": 100 });
        let options = ImageOptions {
            traced_svg: Some(TracedSvg::Options(args.as_object().unwrap().clone())),
            ..ImageOptions::default()
        };
        let adapter = ImageAdapter::new(&pipeline, &options, &ctx);

        adapter.generate("./a.png", None).await.unwrap();

        let trace_args = pipeline.trace_args.lock().unwrap();
        assert_eq!(trace_args[0].get("turnPolicy"), Some(&json!("left")));
        assert_eq!(trace_args[0].get("color"), Some(&json!("#333")));
        assert_eq!(trace_args[0].get("threshold"), Some(&json!(100)));
    }

    #[tokio::test]
    async fn test_pipeline_errors_propagate() {
        struct FailingPipeline;

        #[async_trait]
        impl ImagePipeline for FailingPipeline {
            async fn transform(
                &self,
                function: &str,
                _request: TransformRequest<'_>,
            ) -> std::result::Result<Option<TransformResult>, PipelineError> {
                Err(PipelineError::unknown_function(function))
            }

            async fn trace_svg(
                &self,
                _request: TraceRequest<'_>,
            ) -> std::result::Result<String, PipelineError> {
                unreachable!()
            }
        }

        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let options = ImageOptions {
            sharp_function: "blurry".to_string(),
            ..ImageOptions::default()
        };
        let adapter = ImageAdapter::new(&FailingPipeline, &options, &ctx);

        let err = adapter.generate("./a.png", None).await.unwrap_err();
        assert!(err.to_string().contains("blurry"));
    }
}
