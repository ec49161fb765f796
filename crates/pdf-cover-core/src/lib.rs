//! PDF Cover Core Library
//!
//! This library wraps uploaded PDF documents in fixed covers:
//! - Loading the front cover, back cover and logo assets
//! - Stamping a translucent, centered logo watermark on every page
//! - Assembling front cover + watermarked document + back cover
//! - Batch processing with output naming and zip archives

pub mod assets;
pub mod batch;
pub mod config;
pub mod error;
pub mod pdf;
pub mod util;

#[cfg(test)]
mod testing;

pub use assets::CoverAssets;
pub use batch::{
    BatchReport, FailedFile, NamingScheme, ProcessedFile, ProgressCallback, Upload,
    unique_names, write_archive,
};
pub use config::{
    AppConfig, AssetConfig, BatchConfig, FailurePolicy, OutputConfig, WatermarkOptions,
    DEFAULT_ARCHIVE_NAME, DEFAULT_OUTPUT_SUFFIX,
};
pub use error::{Error, Result};
pub use pdf::{
    AssembledDocument, LogoImage, MediaBox, Overlay, PageStamper, PdfDocument, apply_watermark,
    assemble, render_overlay,
};

use tracing::info;

/// High-level entry point: loaded assets plus the options to apply them with.
///
/// Assets are loaded (and checked for existence) once, when the stamper is
/// built; every document processed afterwards borrows them read-only.
#[derive(Debug, Clone)]
pub struct CoverStamper {
    assets: CoverAssets,
    config: AppConfig,
}

impl CoverStamper {
    /// Validate the configuration and load the assets it points at.
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let assets = CoverAssets::load(&config.assets)?;
        Ok(Self { assets, config })
    }

    /// Create with assets that are already loaded
    pub fn with_assets(assets: CoverAssets, config: AppConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { assets, config })
    }

    /// Cover and watermark a single upload.
    pub fn process(&self, upload: &Upload, naming: &NamingScheme) -> Result<ProcessedFile> {
        batch::process_upload(&self.assets, &self.config.watermark, upload, naming)
    }

    /// Cover and watermark several uploads in order, following the
    /// configured failure policy.
    pub fn process_batch(
        &self,
        uploads: &[Upload],
        naming: &NamingScheme,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<BatchReport> {
        info!(
            "Processing batch of {} file(s) ({:?} on error)",
            uploads.len(),
            self.config.batch.on_error
        );
        batch::run_batch(
            &self.assets,
            &self.config.watermark,
            uploads,
            naming,
            self.config.batch.on_error,
            progress,
        )
    }

    /// Per-file naming for batch outputs written individually:
    /// the prefix when one is given, the configured suffix otherwise.
    pub fn batch_naming(&self, prefix: Option<&str>) -> NamingScheme {
        match NamingScheme::prefix_or_original(prefix) {
            NamingScheme::Original => NamingScheme::Suffix(self.config.output.suffix.clone()),
            scheme => scheme,
        }
    }

    /// File name for the batch archive.
    pub fn archive_name(&self) -> &str {
        &self.config.output.archive_name
    }

    pub const fn assets(&self) -> &CoverAssets {
        &self.assets
    }

    pub const fn config(&self) -> &AppConfig {
        &self.config
    }
}
