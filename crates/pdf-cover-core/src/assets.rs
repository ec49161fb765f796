//! Loading the static assets shared by every document of a run.

use std::path::PathBuf;

use tracing::info;

use crate::config::AssetConfig;
use crate::error::{Error, Result};
use crate::pdf::{LogoImage, PdfDocument};

/// Front cover, back cover and logo, loaded once and lent to every assembly.
#[derive(Debug, Clone)]
pub struct CoverAssets {
    front: PdfDocument,
    back: PdfDocument,
    logo: LogoImage,
}

impl CoverAssets {
    /// Locate and load all three assets.
    ///
    /// Existence of every asset is checked before anything is parsed, and
    /// all missing paths are reported together.
    pub fn load(config: &AssetConfig) -> Result<Self> {
        let front_path = config.front_cover_path();
        let back_path = config.back_cover_path();
        let logo_path = config.logo_path();

        let missing: Vec<PathBuf> = [&front_path, &back_path, &logo_path]
            .into_iter()
            .filter(|p| !p.is_file())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(Error::AssetMissing { paths: missing });
        }

        let front = PdfDocument::from_file(&front_path).map_err(as_asset_error)?;
        let back = PdfDocument::from_file(&back_path).map_err(as_asset_error)?;
        let logo = LogoImage::from_file(&logo_path)?;

        let assets = Self::new(front, back, logo)?;
        info!(
            "Loaded assets from {} (front {} page(s), back {} page(s), logo {}x{} px)",
            config.dir.display(),
            assets.front.page_count(),
            assets.back.page_count(),
            assets.logo.width_px(),
            assets.logo.height_px()
        );
        Ok(assets)
    }

    /// Build from already loaded parts.
    ///
    /// Both covers must have at least one page.
    pub fn new(front: PdfDocument, back: PdfDocument, logo: LogoImage) -> Result<Self> {
        if front.is_empty() {
            return Err(Error::EmptyCover { which: "front" });
        }
        if back.is_empty() {
            return Err(Error::EmptyCover { which: "back" });
        }
        Ok(Self { front, back, logo })
    }

    pub const fn front(&self) -> &PdfDocument {
        &self.front
    }

    pub const fn back(&self) -> &PdfDocument {
        &self.back
    }

    pub const fn logo(&self) -> &LogoImage {
        &self.logo
    }
}

/// A cover that fails to parse is a broken asset, not a broken upload.
fn as_asset_error(err: Error) -> Error {
    match err {
        Error::CorruptDocument { name, reason } => Error::Asset(format!("{name}: {reason}")),
        other => other,
    }
}
