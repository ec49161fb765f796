use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for pdf-cover-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - Static assets (covers and logo) missing or unreadable
/// - Input documents that cannot be parsed
/// - Page geometry and page tree problems while stamping or assembling
/// - Serialization of PDFs and archives
/// - Configuration loading and validation
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Asset Errors
    // ==========================================================================
    /// One or more of the static assets could not be found
    #[error("required asset(s) missing: {}", display_paths(paths))]
    AssetMissing { paths: Vec<PathBuf> },

    /// A static asset exists but could not be read or decoded
    #[error("failed to load asset: {0}")]
    Asset(String),

    /// A cover document has no pages
    #[error("{which} cover has no pages")]
    EmptyCover { which: &'static str },

    // ==========================================================================
    // PDF Errors
    // ==========================================================================
    /// An input document could not be parsed
    #[error("failed to parse PDF '{name}': {reason}")]
    CorruptDocument { name: String, reason: String },

    /// Page dimensions are not usable for placing a watermark
    #[error("invalid page geometry {width}x{height}: dimensions must be positive")]
    InvalidGeometry { width: f32, height: f32 },

    /// The page tree or a page dictionary is malformed
    #[error("malformed PDF structure: {0}")]
    PdfStructure(String),

    /// Failed to save a PDF
    #[error("failed to save PDF: {0}")]
    PdfSave(String),

    // ==========================================================================
    // Archive Errors
    // ==========================================================================
    /// Failed to write a zip archive
    #[error("failed to write archive: {0}")]
    Archive(String),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error concerns the shared assets rather than one input.
    ///
    /// Asset errors abort a whole run; everything else is scoped to the
    /// document being processed.
    pub const fn is_asset_error(&self) -> bool {
        matches!(
            self,
            Self::AssetMissing { .. } | Self::Asset(_) | Self::EmptyCover { .. }
        )
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, Error>;
