//! Host build-system contract
//!
//! The host supplies everything the plugin knows about the project: the
//! markdown node being transformed, a lookup from node id to node, the flat
//! list of project files, and opaque cache/reporter handles that are handed to
//! the image pipeline untouched.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// The markdown node whose syntax tree is being transformed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownNode {
    pub id: String,
    /// Id of the file node this markdown was parsed from
    #[serde(default)]
    pub parent: Option<String>,
}

impl MarkdownNode {
    pub fn new(id: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent: Some(parent.into()),
        }
    }
}

/// A node resolved through [`NodeLookup`]
///
/// Only file-system backed nodes carry a `dir`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostNode {
    pub id: String,
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl HostNode {
    pub fn with_dir(id: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            dir: Some(dir.into()),
        }
    }
}

/// A project file known to the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub id: String,
    #[serde(default)]
    pub absolute_path: Option<PathBuf>,
    #[serde(default)]
    pub extension: Option<String>,
}

impl FileNode {
    pub fn new(id: impl Into<String>, absolute_path: impl Into<PathBuf>) -> Self {
        let absolute_path = absolute_path.into();
        let extension = absolute_path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned());

        Self {
            id: id.into(),
            absolute_path: Some(absolute_path),
            extension,
        }
    }

    pub fn absolute_path(&self) -> Option<&Path> {
        self.absolute_path.as_deref()
    }
}

/// Resolves node ids to nodes
pub trait NodeLookup: Send + Sync {
    fn get_node(&self, id: &str) -> Option<HostNode>;
}

impl NodeLookup for HashMap<String, HostNode> {
    fn get_node(&self, id: &str) -> Option<HostNode> {
        self.get(id).cloned()
    }
}

impl<F> NodeLookup for F
where
    F: Fn(&str) -> Option<HostNode> + Send + Sync,
{
    fn get_node(&self, id: &str) -> Option<HostNode> {
        self(id)
    }
}

/// Host reporting facility
///
/// The plugin never reports on its own; the handle is passed to the image
/// pipeline so its diagnostics end up wherever the host wants them.
pub trait Reporter: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// [`Reporter`] that forwards to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn info(&self, message: &str) {
        tracing::info!(target: "fob_images::reporter", "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "fob_images::reporter", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "fob_images::reporter", "{message}");
    }
}

/// Host cache handle used by the image pipeline
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<u8>>;
    fn set(&self, key: &str, value: &[u8]);
}

/// No-op [`Cache`]: every `get` misses, every `set` is discarded
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

impl Cache for NullCache {
    fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _value: &[u8]) {}
}

/// Opaque handles forwarded to every pipeline call
#[derive(Clone)]
pub struct HostHandles {
    pub reporter: Arc<dyn Reporter>,
    pub cache: Arc<dyn Cache>,
}

impl Default for HostHandles {
    fn default() -> Self {
        Self {
            reporter: Arc::new(TracingReporter),
            cache: Arc::new(NullCache),
        }
    }
}

impl std::fmt::Debug for HostHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostHandles").finish_non_exhaustive()
    }
}

/// Everything the plugin needs to know about one markdown document
pub struct DocumentContext<'a> {
    pub markdown_node: &'a MarkdownNode,
    pub nodes: &'a dyn NodeLookup,
    pub files: &'a [FileNode],
    pub handles: HostHandles,
}

impl<'a> DocumentContext<'a> {
    pub fn new(
        markdown_node: &'a MarkdownNode,
        nodes: &'a dyn NodeLookup,
        files: &'a [FileNode],
    ) -> Self {
        Self {
            markdown_node,
            nodes,
            files,
            handles: HostHandles::default(),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.handles.reporter = reporter;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.handles.cache = cache;
        self
    }

    /// Directory of the file node the markdown was parsed from
    pub fn parent_dir(&self) -> Option<PathBuf> {
        let parent_id = self.markdown_node.parent.as_deref()?;
        self.nodes.get_node(parent_id)?.dir
    }
}
