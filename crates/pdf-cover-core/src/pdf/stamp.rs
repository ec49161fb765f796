//! Merging watermark overlays onto existing pages.

use lopdf::{Document, ObjectId};
use tracing::debug;

use super::logo::LogoImage;
use super::overlay::{LOGO_RESOURCE, OPACITY_RESOURCE, embed_opacity_state, render_overlay};
use super::page::{media_box, owned_resources, page_dict_mut, register_resource, wrap_content};
use crate::config::WatermarkOptions;
use crate::error::Result;

/// Stamps the logo watermark onto pages of one document.
///
/// The logo image and the opacity graphics state are added to the document
/// the first time a page is stamped and shared by every later page.
pub struct PageStamper<'a> {
    doc: &'a mut Document,
    logo: &'a LogoImage,
    options: &'a WatermarkOptions,
    shared: Option<SharedObjects>,
}

#[derive(Clone, Copy)]
struct SharedObjects {
    image: ObjectId,
    state: ObjectId,
}

impl<'a> PageStamper<'a> {
    pub const fn new(doc: &'a mut Document, logo: &'a LogoImage, options: &'a WatermarkOptions) -> Self {
        Self {
            doc,
            logo,
            options,
            shared: None,
        }
    }

    /// Merge the watermark on top of the page's existing content.
    ///
    /// The existing content is wrapped in `q`/`Q` so whatever graphics state
    /// it leaves behind cannot distort the logo. Stamping the same page twice
    /// draws the logo twice.
    pub fn apply_watermark(&mut self, page_id: ObjectId) -> Result<ObjectId> {
        let mb = media_box(self.doc, page_id);
        let overlay = render_overlay(mb.width(), mb.height(), self.logo, self.options)?;

        let shared = self.shared_objects();

        let mut resources = owned_resources(self.doc, page_id);
        let image_name = register_resource(&mut resources, b"XObject", LOGO_RESOURCE, shared.image);
        let state_name = register_resource(&mut resources, b"ExtGState", OPACITY_RESOURCE, shared.state);

        let content = overlay.content_stream((mb.llx, mb.lly), &image_name, &state_name);
        let mut after = b"\nQ".to_vec();
        after.extend_from_slice(&content);
        wrap_content(self.doc, page_id, b"q\n", &after)?;

        // Set only after the content is wrapped
        page_dict_mut(self.doc, page_id)?.set("Resources", resources);

        debug!(
            "Stamped page {:?} ({}x{} pt, logo {}x{} at {},{})",
            page_id,
            overlay.width,
            overlay.height,
            overlay.logo.width,
            overlay.logo.height,
            overlay.logo.x,
            overlay.logo.y
        );

        Ok(page_id)
    }

    fn shared_objects(&mut self) -> SharedObjects {
        if let Some(shared) = self.shared {
            return shared;
        }
        let shared = SharedObjects {
            image: self.logo.embed(self.doc),
            state: embed_opacity_state(self.doc, self.options.opacity),
        };
        self.shared = Some(shared);
        shared
    }
}

/// Stamp a single page.
///
/// Convenience wrapper around [`PageStamper`]; each call embeds its own copy
/// of the logo, so prefer a `PageStamper` when stamping several pages of the
/// same document.
pub fn apply_watermark(
    doc: &mut Document,
    page_id: ObjectId,
    logo: &LogoImage,
    options: &WatermarkOptions,
) -> Result<ObjectId> {
    PageStamper::new(doc, logo, options).apply_watermark(page_id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::{logo_png, page_operations, sample_pdf, sample_pdf_inherited, xobject_draws};
    use lopdf::Object;

    fn logo() -> LogoImage {
        LogoImage::from_bytes(&logo_png(20, 10, true)).unwrap()
    }

    fn reload(mut doc: Document) -> Document {
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        Document::load_mem(&bytes).unwrap()
    }

    #[test]
    fn test_stamp_draws_logo_on_top() {
        let mut doc = Document::load_mem(&sample_pdf(&["hello"])).unwrap();
        let page_id = doc.get_pages()[&1];
        let logo = logo();

        let returned = apply_watermark(&mut doc, page_id, &logo, &WatermarkOptions::default()).unwrap();
        assert_eq!(returned, page_id);

        let doc = reload(doc);
        let ops = page_operations(&doc, 1);
        let text_at = ops.iter().position(|op| op.operator == "Tj").unwrap();
        let logo_at = ops.iter().position(|op| op.operator == "Do").unwrap();
        assert!(logo_at > text_at, "logo must be drawn after the original content");
        assert_eq!(ops.first().unwrap().operator, "q");
        assert_eq!(xobject_draws(&doc, 1, LOGO_RESOURCE.as_bytes()), 1);
    }

    #[test]
    fn test_stamp_keeps_content_behind_referenced_array() {
        let mut doc = Document::load_mem(&sample_pdf(&["hello"])).unwrap();
        let page_id = doc.get_pages()[&1];
        let stream = doc.get_dictionary(page_id).unwrap().get(b"Contents").unwrap().clone();
        let array_id = doc.add_object(Object::Array(vec![stream]));
        doc.get_dictionary_mut(page_id).unwrap().set("Contents", array_id);

        apply_watermark(&mut doc, page_id, &logo(), &WatermarkOptions::default()).unwrap();

        let doc = reload(doc);
        let ops = page_operations(&doc, 1);
        let text_at = ops.iter().position(|op| op.operator == "Tj").unwrap();
        let logo_at = ops.iter().position(|op| op.operator == "Do").unwrap();
        assert!(logo_at > text_at);
        assert_eq!(xobject_draws(&doc, 1, LOGO_RESOURCE.as_bytes()), 1);
    }

    #[test]
    fn test_stamp_sets_fill_opacity() {
        let mut doc = Document::load_mem(&sample_pdf(&["hello"])).unwrap();
        let page_id = doc.get_pages()[&1];
        let options = WatermarkOptions { opacity: 0.25, ..Default::default() };
        apply_watermark(&mut doc, page_id, &logo(), &options).unwrap();

        let resources = owned_resources(&doc, page_id);
        let states = resources.get(b"ExtGState").unwrap().as_dict().unwrap();
        let state_id = states.get(OPACITY_RESOURCE.as_bytes()).unwrap().as_reference().unwrap();
        let state = doc.get_dictionary(state_id).unwrap();
        assert!(matches!(state.get(b"ca").unwrap(), Object::Real(ca) if (*ca - 0.25).abs() < 1e-6));
    }

    #[test]
    fn test_stamping_twice_draws_twice() {
        let mut doc = Document::load_mem(&sample_pdf(&["hello"])).unwrap();
        let page_id = doc.get_pages()[&1];
        let logo = logo();
        let options = WatermarkOptions::default();

        let mut stamper = PageStamper::new(&mut doc, &logo, &options);
        stamper.apply_watermark(page_id).unwrap();
        stamper.apply_watermark(page_id).unwrap();

        let doc = reload(doc);
        assert_eq!(xobject_draws(&doc, 1, LOGO_RESOURCE.as_bytes()), 2);
    }

    #[test]
    fn test_stamper_embeds_logo_once() {
        let mut doc = Document::load_mem(&sample_pdf(&["a", "b", "c"])).unwrap();
        let pages: Vec<_> = doc.get_pages().into_values().collect();
        let logo = logo();
        let options = WatermarkOptions::default();

        let mut stamper = PageStamper::new(&mut doc, &logo, &options);
        for page_id in &pages {
            stamper.apply_watermark(*page_id).unwrap();
        }

        let image_ids: Vec<_> = pages
            .iter()
            .map(|id| {
                let resources = owned_resources(&doc, *id);
                resources
                    .get(b"XObject")
                    .unwrap()
                    .as_dict()
                    .unwrap()
                    .get(LOGO_RESOURCE.as_bytes())
                    .unwrap()
                    .as_reference()
                    .unwrap()
            })
            .collect();
        assert!(image_ids.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_inherited_resources_are_not_shared_after_stamping() {
        let mut doc = Document::load_mem(&sample_pdf_inherited(&["a", "b"])).unwrap();
        let pages = doc.get_pages();
        apply_watermark(&mut doc, pages[&1], &logo(), &WatermarkOptions::default()).unwrap();

        // Second page still sees only the inherited font resources
        let second = owned_resources(&doc, pages[&2]);
        assert!(second.get(b"XObject").is_err());
        assert!(second.get(b"Font").is_ok());

        // First page keeps its font next to the logo
        let first = owned_resources(&doc, pages[&1]);
        assert!(first.get(b"Font").is_ok());
        assert!(first.get(b"XObject").is_ok());
    }

    #[test]
    fn test_existing_resource_name_is_not_clobbered() {
        let mut doc = Document::load_mem(&sample_pdf(&["a"])).unwrap();
        let page_id = doc.get_pages()[&1];

        let mut resources = owned_resources(&doc, page_id);
        register_resource(&mut resources, b"XObject", LOGO_RESOURCE, (9999, 0));
        doc.get_dictionary_mut(page_id).unwrap().set("Resources", resources);

        apply_watermark(&mut doc, page_id, &logo(), &WatermarkOptions::default()).unwrap();

        let resources = owned_resources(&doc, page_id);
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        assert_eq!(xobjects.get(LOGO_RESOURCE.as_bytes()).unwrap().as_reference().unwrap(), (9999, 0));
        assert!(xobjects.has(b"WmLogo1"));
    }

    #[test]
    fn test_failed_stamp_leaves_target_unchanged() {
        let mut doc = Document::load_mem(&sample_pdf(&["a"])).unwrap();
        let not_a_page = doc.add_object(Object::Integer(7));

        let err = apply_watermark(&mut doc, not_a_page, &logo(), &WatermarkOptions::default()).unwrap_err();
        assert!(matches!(err, Error::PdfStructure(_)));
        assert!(matches!(doc.get_object(not_a_page).unwrap(), Object::Integer(7)));
    }

    #[test]
    fn test_degenerate_page_is_invalid_geometry() {
        let mut doc = Document::load_mem(&sample_pdf(&["a"])).unwrap();
        let page_id = doc.get_pages()[&1];
        doc.get_dictionary_mut(page_id)
            .unwrap()
            .set("MediaBox", Object::Array(vec![0.into(), 0.into(), 0.into(), 792.into()]));

        let err = apply_watermark(&mut doc, page_id, &logo(), &WatermarkOptions::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidGeometry { .. }));
    }
}
