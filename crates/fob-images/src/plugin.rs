//! Document-level orchestration
//!
//! Collects every raw HTML node of a markdown tree, rewrites them
//! concurrently and writes the results back in document order.

use std::sync::Arc;

use bon::Builder;
use futures::stream::{self, StreamExt, TryStreamExt};
use markdown::mdast::{Html, Node};

use crate::adapter::ImageAdapter;
use crate::error::Result;
use crate::fragment::FragmentProcessor;
use crate::host::DocumentContext;
use crate::options::PluginOptions;
use crate::pipeline::ImagePipeline;
use crate::scanner::collect_html_nodes;

/// Rewrites image component tags found in raw HTML
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use fob_images::{DocumentContext, ImagesPlugin, PluginOptions};
///
/// let plugin = ImagesPlugin::builder()
///     .pipeline(Arc::new(MyPipeline::new()))
///     .options(PluginOptions::resolve(serde_json::json!({ "withWebp": true }))?)
///     .max_concurrency(8)
///     .build();
///
/// let mut ast = markdown::to_mdast(source, &markdown::ParseOptions::default())?;
/// let ctx = DocumentContext::new(&markdown_node, &nodes, &files);
/// plugin.transform(&mut ast, &ctx).await?;
/// ```
#[derive(Builder)]
pub struct ImagesPlugin {
    /// Image processing backend
    pipeline: Arc<dyn ImagePipeline>,

    /// Resolved options
    #[builder(default)]
    options: PluginOptions,

    /// Maximum number of fragments in flight at once.
    /// Unbounded when unset.
    max_concurrency: Option<usize>,
}

impl std::fmt::Debug for ImagesPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagesPlugin")
            .field("options", &self.options)
            .field("max_concurrency", &self.max_concurrency)
            .finish_non_exhaustive()
    }
}

impl ImagesPlugin {
    /// Plugin name for logging
    pub const NAME: &'static str = "images";

    pub fn options(&self) -> &PluginOptions {
        &self.options
    }

    /// Rewrite every raw HTML node of `root` in place
    ///
    /// Returns the raw HTML nodes in document order, rewritten or not. When
    /// any node fails, the error is returned and the tree is left untouched.
    ///
    /// The returned future holds parsed HTML fragments across await points
    /// and is not `Send`: drive it on the calling task, not through
    /// `tokio::spawn`.
    pub async fn transform(&self, root: &mut Node, ctx: &DocumentContext<'_>) -> Result<Vec<Html>> {
        let mut nodes = collect_html_nodes(root);
        self.rewrite_in_place(&mut nodes, ctx).await?;

        Ok(nodes.into_iter().map(|node| node.clone()).collect())
    }

    /// Rewrite an owned list of raw HTML nodes
    ///
    /// Same semantics as [`ImagesPlugin::transform`], for hosts that collect
    /// the nodes themselves. The future is not `Send` either.
    pub async fn process_nodes(
        &self,
        mut nodes: Vec<Html>,
        ctx: &DocumentContext<'_>,
    ) -> Result<Vec<Html>> {
        {
            let mut refs: Vec<&mut Html> = nodes.iter_mut().collect();
            self.rewrite_in_place(&mut refs, ctx).await?;
        }

        Ok(nodes)
    }

    /// Replace node values only once every node has been processed
    async fn rewrite_in_place(
        &self,
        nodes: &mut [&mut Html],
        ctx: &DocumentContext<'_>,
    ) -> Result<()> {
        let values: Vec<String> = nodes.iter().map(|node| node.value.clone()).collect();

        let rewritten = self.rewrite_all(&values, ctx).await?;
        for (node, value) in nodes.iter_mut().zip(rewritten) {
            if let Some(value) = value {
                node.value = value;
            }
        }

        Ok(())
    }

    /// New value per input, `None` where the node stays as it is.
    /// Output order matches input order.
    async fn rewrite_all(
        &self,
        values: &[String],
        ctx: &DocumentContext<'_>,
    ) -> Result<Vec<Option<String>>> {
        if values.is_empty() {
            return Ok(Vec::new());
        }

        let adapter = ImageAdapter::new(self.pipeline.as_ref(), &self.options.image, ctx);
        let processor = FragmentProcessor::new(
            &self.options.components,
            &self.options.image.sharp_function,
            adapter,
        );
        let limit = self.max_concurrency.unwrap_or(values.len()).max(1);

        let rewritten: Vec<Option<String>> = stream::iter(values)
            .map(|value| processor.process(value))
            .buffered(limit)
            .try_collect()
            .await
            .inspect_err(|e| {
                tracing::debug!(plugin = Self::NAME, error = %e, "Image rewrite failed");
            })?;

        tracing::info!(
            plugin = Self::NAME,
            nodes = values.len(),
            rewritten = rewritten.iter().filter(|value| value.is_some()).count(),
            "Rewrote raw HTML nodes"
        );

        Ok(rewritten)
    }
}
