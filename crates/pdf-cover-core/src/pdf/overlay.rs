//! Watermark overlay geometry and rendering.
//!
//! # Coordinate System
//!
//! PDF uses a **bottom-left origin** coordinate system where:
//! - (0, 0) is at the bottom-left corner of the page
//! - X increases to the right
//! - Y increases upward
//!
//! An overlay is computed in the page's own frame, i.e. relative to the
//! lower-left corner of its media box. The logo is scaled to a fraction of
//! the page width, keeps its aspect ratio, and is centered on both axes:
//! ```text
//! logo_w = page_w * scale
//! logo_h = logo_w * (px_h / px_w)
//! x = (page_w - logo_w) / 2
//! y = (page_h - logo_h) / 2
//! ```
//!
//! # Drawing
//!
//! The logo is painted through an `/ExtGState` whose `/ca` (fill alpha) is
//! the configured opacity. Image XObjects are painted in a unit square, so
//! the content stream scales and translates with a single `cm`.

use lopdf::{Document, Object, ObjectId, Stream, dictionary};

use super::logo::LogoImage;
use crate::config::WatermarkOptions;
use crate::error::{Error, Result};

/// Resource name base for the logo image XObject.
pub const LOGO_RESOURCE: &str = "WmLogo";

/// Resource name base for the opacity graphics state.
pub const OPACITY_RESOURCE: &str = "WmGs";

/// Axis-aligned rectangle in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// The watermark for one target page.
///
/// Overlays are cheap values: they are recomputed for every page, since
/// pages in the same document may have different sizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlay {
    /// Width of the page the overlay was computed for
    pub width: f32,
    /// Height of the page the overlay was computed for
    pub height: f32,
    /// Where the logo is drawn, relative to the page's lower-left corner
    pub logo: Rect,
    /// Fill alpha the logo is drawn with
    pub opacity: f32,
}

/// Compute the overlay for a page of `width` x `height` points.
///
/// Fails with [`Error::InvalidGeometry`] unless both dimensions are positive
/// and finite.
pub fn render_overlay(
    width: f32,
    height: f32,
    logo: &LogoImage,
    options: &WatermarkOptions,
) -> Result<Overlay> {
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(Error::InvalidGeometry { width, height });
    }

    let logo_width = width * options.scale;
    let logo_height = logo_width * logo.aspect_ratio();

    Ok(Overlay {
        width,
        height,
        logo: Rect {
            x: (width - logo_width) / 2.0,
            y: (height - logo_height) / 2.0,
            width: logo_width,
            height: logo_height,
        },
        opacity: options.opacity,
    })
}

impl Overlay {
    /// Content stream drawing the logo.
    ///
    /// `origin` is the lower-left corner of the target media box; `image`
    /// and `state` are the resource names the logo XObject and the opacity
    /// graphics state are registered under on the target page.
    pub fn content_stream(&self, origin: (f32, f32), image: &str, state: &str) -> Vec<u8> {
        let Rect { x, y, width, height } = self.logo;

        // Leading newline keeps the operators apart from a preceding stream
        format!(
            "\nq\n/{state} gs\n{} 0 0 {} {} {} cm\n/{image} Do\nQ\n",
            num(width),
            num(height),
            num(origin.0 + x),
            num(origin.1 + y)
        )
        .into_bytes()
    }

    /// Render the overlay as a standalone one-page PDF.
    ///
    /// The page's media box is exactly `[0 0 width height]` and its only
    /// content is the logo.
    pub fn to_document(&self, logo: &LogoImage) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let image_id = logo.embed(&mut doc);
        let state_id = embed_opacity_state(&mut doc, self.opacity);

        let content = self.content_stream((0.0, 0.0), LOGO_RESOURCE, OPACITY_RESOURCE);
        let content_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), content));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(self.width), Object::Real(self.height)],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { LOGO_RESOURCE => image_id },
                "ExtGState" => dictionary! { OPACITY_RESOURCE => state_id },
            },
        });

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        doc
    }
}

/// Add a graphics state setting the fill alpha to `opacity`.
pub fn embed_opacity_state(doc: &mut Document, opacity: f32) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "ExtGState",
        "ca" => Object::Real(opacity),
    })
}

/// Format a coordinate for a content stream: fixed precision, no trailing zeros.
fn num(value: f32) -> String {
    let s = format!("{value:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}
