//! Pipeline error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during image pipeline calls
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The configured transform function does not exist
    #[error("Unknown transform function: {0}")]
    UnknownFunction(String),

    /// The requested output format cannot be produced
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// The pipeline failed while processing a file
    #[error("Failed to process '{}': {message}", .file.display())]
    Processing { file: PathBuf, message: String },

    /// I/O error while reading the source or writing derived assets
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Create an unknown function error
    pub fn unknown_function(name: impl Into<String>) -> Self {
        Self::UnknownFunction(name.into())
    }

    /// Create an unsupported format error
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat(format.into())
    }

    /// Create a processing error for the given file
    pub fn processing(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Processing {
            file: file.into(),
            message: message.into(),
        }
    }
}
