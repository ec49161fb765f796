use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default directory holding the cover PDFs and the logo
pub const DEFAULT_ASSETS_DIR: &str = "assets";
/// Default front cover file name inside the assets directory
pub const DEFAULT_FRONT_COVER: &str = "front_cover.pdf";
/// Default back cover file name inside the assets directory
pub const DEFAULT_BACK_COVER: &str = "back_cover.pdf";
/// Default logo file name inside the assets directory
pub const DEFAULT_LOGO: &str = "logo.png";
/// Default suffix for per-file batch outputs (`report.pdf` -> `report_CS.pdf`)
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_CS";
/// Default file name of the batch archive
pub const DEFAULT_ARCHIVE_NAME: &str = "processed_pdfs.zip";

/// Location of the static assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Directory the file names below are resolved against
    #[serde(default = "default_assets_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_front_cover")]
    pub front_cover: PathBuf,

    #[serde(default = "default_back_cover")]
    pub back_cover: PathBuf,

    #[serde(default = "default_logo")]
    pub logo: PathBuf,
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from(DEFAULT_ASSETS_DIR)
}

fn default_front_cover() -> PathBuf {
    PathBuf::from(DEFAULT_FRONT_COVER)
}

fn default_back_cover() -> PathBuf {
    PathBuf::from(DEFAULT_BACK_COVER)
}

fn default_logo() -> PathBuf {
    PathBuf::from(DEFAULT_LOGO)
}

impl AssetConfig {
    /// Asset configuration rooted at `dir` with the default file names.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    pub fn front_cover_path(&self) -> PathBuf {
        self.dir.join(&self.front_cover)
    }

    pub fn back_cover_path(&self) -> PathBuf {
        self.dir.join(&self.back_cover)
    }

    pub fn logo_path(&self) -> PathBuf {
        self.dir.join(&self.logo)
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            dir: default_assets_dir(),
            front_cover: default_front_cover(),
            back_cover: default_back_cover(),
            logo: default_logo(),
        }
    }
}

/// Watermark appearance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WatermarkOptions {
    /// Logo width as a fraction of the page width
    #[serde(default = "default_scale")]
    pub scale: f32,

    /// Fill opacity of the logo (0 = invisible, 1 = opaque)
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

const fn default_scale() -> f32 {
    0.3
}

const fn default_opacity() -> f32 {
    0.1
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            opacity: default_opacity(),
        }
    }
}

impl WatermarkOptions {
    pub fn validate(&self) -> Result<()> {
        if !(self.scale.is_finite() && self.scale > 0.0 && self.scale <= 1.0) {
            return Err(Error::ConfigInvalid {
                field: "watermark.scale".to_string(),
                reason: format!("{} is outside (0, 1]", self.scale),
            });
        }
        if !(self.opacity.is_finite() && (0.0..=1.0).contains(&self.opacity)) {
            return Err(Error::ConfigInvalid {
                field: "watermark.opacity".to_string(),
                reason: format!("{} is outside [0, 1]", self.opacity),
            });
        }
        Ok(())
    }
}

/// Output naming configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Appended to the base name of per-file batch outputs
    #[serde(default = "default_output_suffix")]
    pub suffix: String,

    /// File name of the batch archive
    #[serde(default = "default_archive_name")]
    pub archive_name: String,
}

fn default_output_suffix() -> String {
    DEFAULT_OUTPUT_SUFFIX.to_string()
}

fn default_archive_name() -> String {
    DEFAULT_ARCHIVE_NAME.to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            suffix: default_output_suffix(),
            archive_name: default_archive_name(),
        }
    }
}

/// What a batch does when one of its documents fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failing document and return its error
    #[default]
    Abort,
    /// Log the failure, record it in the report and continue
    Skip,
}

/// Batch processing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub on_error: FailurePolicy,
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub assets: AssetConfig,

    #[serde(default)]
    pub watermark: WatermarkOptions,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub batch: BatchConfig,
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations (~/.config/pdf-cover/config.toml, ./config.toml)
    pub fn load() -> Self {
        // Try user config
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("pdf-cover").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // Try local config
        let local_config = PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        self.watermark.validate()?;
        if self.output.archive_name.trim().is_empty() {
            return Err(Error::ConfigInvalid {
                field: "output.archive_name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
