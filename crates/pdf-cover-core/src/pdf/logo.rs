//! Decoded watermark logo and its embedding as a PDF image XObject.

use std::path::Path;

use lopdf::{Document, ObjectId, Stream, dictionary};

use crate::error::{Error, Result};

/// A raster logo decoded once and shared by reference for every overlay.
///
/// Samples are kept as 8-bit RGB plus an optional 8-bit alpha plane. The
/// alpha plane is only kept when the source image has an alpha channel that
/// is not fully opaque ("auto" masking).
#[derive(Clone)]
pub struct LogoImage {
    width_px: u32,
    height_px: u32,
    rgb: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

impl LogoImage {
    /// Decode a logo from encoded image bytes (PNG, JPEG, ...).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| Error::Asset(format!("failed to decode logo: {e}")))?;

        let (width_px, height_px) = (image.width(), image.height());
        if width_px == 0 || height_px == 0 {
            return Err(Error::Asset(format!(
                "logo has empty dimensions {width_px}x{height_px}"
            )));
        }

        let (rgb, alpha) = if image.color().has_alpha() {
            let rgba = image.to_rgba8();
            let pixels = rgba.as_raw();
            let mut rgb = Vec::with_capacity(pixels.len() / 4 * 3);
            let mut alpha = Vec::with_capacity(pixels.len() / 4);
            for px in pixels.chunks_exact(4) {
                rgb.extend_from_slice(&px[..3]);
                alpha.push(px[3]);
            }
            let opaque = alpha.iter().all(|&a| a == u8::MAX);
            (rgb, (!opaque).then_some(alpha))
        } else {
            (image.to_rgb8().into_raw(), None)
        };

        Ok(Self {
            width_px,
            height_px,
            rgb,
            alpha,
        })
    }

    /// Read and decode a logo file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| Error::Asset(format!("failed to read {}: {e}", path.display())))?;
        Self::from_bytes(&bytes)
    }

    pub const fn width_px(&self) -> u32 {
        self.width_px
    }

    pub const fn height_px(&self) -> u32 {
        self.height_px
    }

    /// Height over width; multiplies a rendered width into a rendered height.
    #[allow(clippy::cast_precision_loss)]
    pub fn aspect_ratio(&self) -> f32 {
        self.height_px as f32 / self.width_px as f32
    }

    /// Whether the logo will be embedded with a soft mask.
    pub const fn has_transparency(&self) -> bool {
        self.alpha.is_some()
    }

    /// Add the logo to `doc` as an image XObject and return its id.
    ///
    /// Translucent logos get a `DeviceGray` soft mask built from the alpha
    /// plane. Streams are left uncompressed; `Document::compress` takes care
    /// of them when the output is saved.
    pub fn embed(&self, doc: &mut Document) -> ObjectId {
        let width = i64::from(self.width_px);
        let height = i64::from(self.height_px);

        let mut image_dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        };

        if let Some(alpha) = &self.alpha {
            let smask_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width,
                    "Height" => height,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                alpha.clone(),
            ));
            image_dict.set("SMask", smask_id);
        }

        doc.add_object(Stream::new(image_dict, self.rgb.clone()))
    }
}

impl std::fmt::Debug for LogoImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogoImage")
            .field("width_px", &self.width_px)
            .field("height_px", &self.height_px)
            .field("has_transparency", &self.has_transparency())
            .finish_non_exhaustive()
    }
}
