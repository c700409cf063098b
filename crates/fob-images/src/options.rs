//! Plugin options and their resolution against defaults
//!
//! Options arrive as loosely-typed JSON (from `fob.toml`, `package.json` or
//! code). Resolution is a shallow merge: every top-level key the user sets
//! wins, every key they leave out falls back to the default, and keys the
//! plugin does not understand are kept in [`ImageOptions::extra`] so the image
//! pipeline still sees them.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ImagesError, Result};

/// Tag scanned when the user configures no components
pub const DEFAULT_TAG_NAME: &str = "component-image";

/// Attribute read on [`DEFAULT_TAG_NAME`]
pub const DEFAULT_SOURCE_ATTRIBUTE: &str = "src";

/// Transform function used when none is configured
pub const DEFAULT_SHARP_FUNCTION: &str = "fluid";

/// `toFormat` value forced for the webp variant
pub const WEBP_FORMAT: &str = "WEBP";

/// Fully resolved plugin configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginOptions {
    /// Tags to scan, in order
    pub components: Vec<ComponentDefinition>,

    /// Global image options (flattened: `sharpFunction`, `withWebp`, ...)
    #[serde(flatten)]
    pub image: ImageOptions,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            components: vec![ComponentDefinition::default()],
            image: ImageOptions::default(),
        }
    }
}

impl PluginOptions {
    /// Merge user configuration over the defaults
    ///
    /// `null` yields the defaults. Any other non-object value is rejected.
    ///
    /// # Example
    ///
    /// ```
    /// use fob_images::PluginOptions;
    /// use serde_json::json;
    ///
    /// let options = PluginOptions::resolve(json!({ "withWebp": true })).unwrap();
    /// assert!(options.image.with_webp);
    /// assert_eq!(options.image.sharp_function, "fluid");
    /// assert_eq!(options.components[0].tag_name, "component-image");
    /// ```
    pub fn resolve(user: Value) -> Result<Self> {
        let defaults = serde_json::to_value(Self::default())?;
        let merged = merge_defaults(user, defaults)?;
        serde_json::from_value(merged).map_err(|e| ImagesError::invalid_options(e.to_string()))
    }
}

/// Options forwarded to the image pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageOptions {
    /// Transform function to call (e.g. "fluid", "fixed")
    #[serde(rename = "sharpFunction")]
    pub sharp_function: String,

    /// Also generate a webp variant
    #[serde(rename = "withWebp", default, deserialize_with = "truthy")]
    pub with_webp: bool,

    /// Generate a traced SVG placeholder
    #[serde(
        rename = "tracedSVG",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "traced_svg"
    )]
    pub traced_svg: Option<TracedSvg>,

    /// Keep the base64 placeholder even when a traced SVG is generated
    #[serde(rename = "preserveBase64", default, deserialize_with = "truthy")]
    pub preserve_base64: bool,

    /// Output format override understood by the pipeline
    #[serde(rename = "toFormat", default, skip_serializing_if = "Option::is_none")]
    pub to_format: Option<String>,

    /// Everything else, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            sharp_function: DEFAULT_SHARP_FUNCTION.to_string(),
            with_webp: false,
            traced_svg: None,
            preserve_base64: false,
            to_format: None,
            extra: Map::new(),
        }
    }
}

impl ImageOptions {
    /// Merge a per-attribute override over these options
    ///
    /// Same rules as [`PluginOptions::resolve`]: keys in `overrides` win.
    pub fn with_override(&self, overrides: &Map<String, Value>) -> Result<Self> {
        let base = serde_json::to_value(self)?;
        let merged = merge_defaults(Value::Object(overrides.clone()), base)?;
        serde_json::from_value(merged).map_err(|e| ImagesError::invalid_options(e.to_string()))
    }

    /// Copy of these options producing a webp variant
    pub fn to_webp(&self) -> Self {
        Self {
            to_format: Some(WEBP_FORMAT.to_string()),
            ..self.clone()
        }
    }
}

/// `tracedSVG` option: `true` or an object of tracer options
#[derive(Debug, Clone, PartialEq)]
pub enum TracedSvg {
    Enabled,
    Options(Map<String, Value>),
}

impl TracedSvg {
    /// Tracer options, empty for [`TracedSvg::Enabled`]
    pub fn args(&self) -> Map<String, Value> {
        match self {
            Self::Enabled => Map::new(),
            Self::Options(args) => args.clone(),
        }
    }
}

impl Serialize for TracedSvg {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Enabled => serializer.serialize_bool(true),
            Self::Options(args) => args.serialize(serializer),
        }
    }
}

/// A component tag and the attributes to scan on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDefinition {
    #[serde(rename = "tagName")]
    pub tag_name: String,
    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,
}

impl Default for ComponentDefinition {
    fn default() -> Self {
        Self {
            tag_name: DEFAULT_TAG_NAME.to_string(),
            attributes: vec![AttributeSpec::Detailed(DetailedAttribute {
                source: DEFAULT_SOURCE_ATTRIBUTE.to_string(),
                target: Some(String::new()),
                options: None,
            })],
        }
    }
}

/// One attribute to scan: a bare name or a detailed record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeSpec {
    Bare(String),
    Detailed(DetailedAttribute),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedAttribute {
    /// Attribute holding the image path
    pub source: String,
    /// Attribute receiving the JSON result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Per-attribute option overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
}

/// An [`AttributeSpec`] with its target name decided
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAttribute {
    pub source: String,
    pub target: String,
    pub options_override: Option<Map<String, Value>>,
}

impl AttributeSpec {
    /// Normalize to a [`ResolvedAttribute`]
    ///
    /// The target is the explicit `target` when non-empty, otherwise the
    /// override's `sharpFunction` followed by the source name, otherwise
    /// `global_function` followed by the source name.
    pub fn resolve(&self, global_function: &str) -> ResolvedAttribute {
        match self {
            Self::Bare(source) => ResolvedAttribute {
                source: source.clone(),
                target: format!("{global_function}{source}"),
                options_override: None,
            },
            Self::Detailed(detailed) => {
                let source = &detailed.source;
                let target = match detailed.target.as_deref() {
                    Some(target) if !target.is_empty() => target.to_string(),
                    _ => {
                        let function = detailed
                            .options
                            .as_ref()
                            .and_then(|o| o.get("sharpFunction"))
                            .and_then(Value::as_str)
                            .filter(|f| !f.is_empty())
                            .unwrap_or(global_function);
                        format!("{function}{source}")
                    }
                };

                ResolvedAttribute {
                    source: source.clone(),
                    target,
                    options_override: detailed.options.clone(),
                }
            }
        }
    }
}

/// Shallow merge: keys of `user` win over keys of `defaults`
fn merge_defaults(user: Value, defaults: Value) -> Result<Value> {
    let Value::Object(mut merged) = defaults else {
        return Err(ImagesError::invalid_options("defaults must be an object"));
    };

    match user {
        Value::Null => {}
        Value::Object(user) => {
            for (key, value) in user {
                merged.insert(key, value);
            }
        }
        other => {
            return Err(ImagesError::invalid_options(format!(
                "expected an object, got {other}"
            )));
        }
    }

    Ok(Value::Object(merged))
}

/// Loose boolean: `null`, `false`, `0` and `""` are off, anything else is on
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    Value::deserialize(deserializer).map(|value| is_truthy(&value))
}

fn traced_svg<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<TracedSvg>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Object(args) => Some(TracedSvg::Options(args)),
        other if is_truthy(&other) => Some(TracedSvg::Enabled),
        _ => None,
    })
}
