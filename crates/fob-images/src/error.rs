//! Error types for image rewriting
//!
//! Only hard failures live here. Skips (no matching tag, missing file,
//! external URL, ...) are not errors and never surface as `ImagesError`.

use thiserror::Error;

use crate::pipeline::PipelineError;

pub type Result<T> = std::result::Result<T, ImagesError>;

/// Errors that abort processing of a raw HTML node
#[derive(Debug, Error)]
pub enum ImagesError {
    /// User configuration could not be merged or deserialized
    #[error("invalid image options: {0}")]
    InvalidOptions(String),

    /// A configured tag name is not a valid CSS type selector
    #[error("invalid component tag name '{tag_name}'")]
    InvalidSelector { tag_name: String },

    /// The image pipeline rejected a transform or trace call
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// A transform result could not be serialized into the target attribute
    #[error("failed to serialize transform result: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The rewritten fragment could not be written back out
    #[error("failed to serialize HTML fragment: {0}")]
    Io(#[from] std::io::Error),
}

impl ImagesError {
    /// Create an invalid options error
    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::InvalidOptions(message.into())
    }

    /// Create an invalid selector error
    pub fn invalid_selector(tag_name: impl Into<String>) -> Self {
        Self::InvalidSelector {
            tag_name: tag_name.into(),
        }
    }
}

/// Errors from locating and loading options files
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("image options not found")]
    NotFound,

    #[error("invalid config value for '{field}'{}", format_hint(.hint))]
    InvalidValue {
        field: String,
        hint: Option<String>,
    },

    #[error(transparent)]
    Options(#[from] ImagesError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn invalid_value(field: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            hint: Some(hint.into()),
        }
    }
}

fn format_hint(hint: &Option<String>) -> String {
    hint.as_deref().map(|h| format!(": {h}")).unwrap_or_default()
}
