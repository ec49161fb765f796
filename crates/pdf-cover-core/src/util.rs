//! Utility functions shared across the crate.

use std::path::{Path, PathBuf};

/// Get the user's config directory following XDG conventions.
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise `$HOME/.config`.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

/// Reduce an uploaded file name to its last path component.
///
/// Browsers and shells may hand over names with directories attached
/// (`C:\Users\me\report.pdf`, `../report.pdf`); only the final segment is
/// used for output names and archive entries.
pub fn file_name_only(name: &str) -> &str {
    let trimmed = name.trim();
    let last = trimmed
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(trimmed);
    if last.is_empty() || last == "." || last == ".." {
        "document.pdf"
    } else {
        last
    }
}

/// Split a file name into base name and extension (without the dot).
///
/// A leading dot (`.hidden`) is part of the base name, not an extension.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    let path = Path::new(name);
    match (path.file_stem().and_then(|s| s.to_str()), path.extension().and_then(|e| e.to_str())) {
        (Some(stem), Some(ext)) => (stem, Some(ext)),
        _ => (name, None),
    }
}
