//! Helpers for classifying attribute values

use std::path::{Path, PathBuf};

use path_clean::PathClean;

/// Extensions the pipeline cannot process
const SKIPPED_EXTENSIONS: &[&str] = &["gif", "svg"];

/// Text after the final `.`, or the whole value when there is none
pub(crate) fn file_extension(value: &str) -> &str {
    value.rsplit('.').next().unwrap_or(value)
}

/// Whether the pipeline should never be asked to process this value
pub(crate) fn is_skipped_extension(value: &str) -> bool {
    SKIPPED_EXTENSIONS.contains(&file_extension(value))
}

/// Whether `url` points into the project rather than at another origin
///
/// Anything with a scheme (`https:`, `data:`, `mailto:`) or a
/// protocol-relative `//host` prefix is not relative. Windows drive paths
/// (`C:\img.png`) have a scheme-like prefix but are treated as relative.
pub(crate) fn is_relative_url(url: &str) -> bool {
    if url.starts_with("//") {
        return false;
    }
    !has_scheme(url) || is_windows_drive_path(url)
}

fn has_scheme(url: &str) -> bool {
    let Some((scheme, _)) = url.split_once(':') else {
        return false;
    };

    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn is_windows_drive_path(url: &str) -> bool {
    let bytes = url.as_bytes();
    bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'\\'
}

/// Join an attribute value onto a directory the way a URL path would be
///
/// A leading `/` does not escape `dir`, backslashes count as separators, and
/// the result is normalized (`.` and `..` resolved lexically).
pub(crate) fn join_image_path(dir: &Path, source: &str) -> PathBuf {
    let source = source.replace('\\', "/");
    let mut joined = dir.to_path_buf();
    for segment in source.split('/').filter(|s| !s.is_empty()) {
        joined.push(segment);
    }
    joined.clean()
}

/// Normalize a host path for equality checks
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    path.clean()
}
