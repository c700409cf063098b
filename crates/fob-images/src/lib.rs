//! # fob-images
//!
//! Responsive image rewriting for markdown content.
//!
//! Markdown authors embed image components as raw HTML, for example
//! `<component-image src="./photo.png">`. This crate finds those tags in the
//! markdown AST, resolves the source against the document's directory, asks
//! an external [`ImagePipeline`] for responsive variants (fluid or fixed
//! sizes, optional webp, optional traced SVG placeholder) and stores the
//! result as JSON in a sibling attribute such as `fluidsrc`. The front-end
//! component can then render a responsive image without a separate query.
//!
//! Non-relative URLs, gif and svg files, and sources that match no project
//! file are left alone.

pub mod adapter;
pub mod config;
pub mod error;
pub mod fragment;
pub mod host;
pub mod options;
pub mod pipeline;
pub mod plugin;
pub mod scanner;
mod url;

// Re-export public types
pub use config::OptionsDiscovery;
pub use error::{ConfigError, ImagesError, Result};
pub use host::{
    Cache, DocumentContext, FileNode, HostHandles, HostNode, MarkdownNode, NodeLookup, NullCache,
    Reporter, TracingReporter,
};
pub use options::{AttributeSpec, ComponentDefinition, ImageOptions, PluginOptions, TracedSvg};
pub use pipeline::{ImagePipeline, PipelineError, TransformResult};
pub use plugin::ImagesPlugin;
