//! Transform result record

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Asset metadata returned by [`ImagePipeline::transform`]
///
/// The record is opaque to the plugin apart from a handful of well-known
/// fields it reads (`src`, `srcSet`) or decorates (`srcWebp`, `srcSetWebp`,
/// `tracedSVG`, `base64`). Keys keep their insertion order so the attribute
/// written into the HTML reads like the pipeline produced it.
///
/// [`ImagePipeline::transform`]: super::ImagePipeline::transform
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransformResult(Map<String, Value>);

impl TransformResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Primary image URL
    pub fn src(&self) -> Option<&Value> {
        self.get("src")
    }

    /// Responsive `srcset` string
    pub fn src_set(&self) -> Option<&Value> {
        self.get("srcSet")
    }

    /// Copy `src`/`srcSet` of a webp variant into `srcWebp`/`srcSetWebp`
    ///
    /// Fields the variant lacks stay absent.
    pub fn set_webp(&mut self, webp: &TransformResult) {
        if let Some(src) = webp.src() {
            self.insert("srcWebp", src.clone());
        }
        if let Some(src_set) = webp.src_set() {
            self.insert("srcSetWebp", src_set.clone());
        }
    }

    pub fn set_traced_svg(&mut self, svg: impl Into<String>) {
        self.insert("tracedSVG", svg.into());
    }

    /// Drop the blur-up placeholder in favour of the traced SVG
    pub fn clear_base64(&mut self) {
        self.insert("base64", Value::Null);
    }
}

impl From<Map<String, Value>> for TransformResult {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
