//! Page-level helpers on top of lopdf: geometry, inherited attributes,
//! resource dictionaries and content streams.
//!
//! # Inheritance
//!
//! `MediaBox`, `CropBox`, `Resources` and `Rotate` may be declared on any
//! `/Pages` ancestor instead of the page itself. Readers here walk the
//! `Parent` chain; writers always put a private copy on the page so that
//! edits never leak into sibling pages sharing the ancestor's value.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::warn;

use crate::error::{Error, Result};

/// Page attributes a page may inherit from its `/Pages` ancestors.
pub const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Guards against cyclic `Parent` chains in broken files.
const MAX_TREE_DEPTH: usize = 64;

/// US Letter, used when a page declares no media box anywhere in its tree.
const FALLBACK_MEDIA_BOX: MediaBox = MediaBox {
    llx: 0.0,
    lly: 0.0,
    urx: 612.0,
    ury: 792.0,
};

/// A page's media box in points (PDF user space, bottom-left origin).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaBox {
    pub llx: f32,
    pub lly: f32,
    pub urx: f32,
    pub ury: f32,
}

impl MediaBox {
    pub const fn new(llx: f32, lly: f32, urx: f32, ury: f32) -> Self {
        Self { llx, lly, urx, ury }
    }

    pub fn width(&self) -> f32 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f32 {
        self.ury - self.lly
    }

    fn from_object(doc: &Document, obj: &Object) -> Option<Self> {
        let Object::Array(arr) = resolve(doc, obj) else {
            return None;
        };
        if arr.len() != 4 {
            return None;
        }

        let values: Vec<f32> = arr
            .iter()
            .filter_map(|o| match resolve(doc, o) {
                #[allow(clippy::cast_precision_loss)]
                Object::Integer(i) => Some(*i as f32),
                Object::Real(r) => Some(*r),
                _ => None,
            })
            .collect();

        // Corners may come in any order
        (values.len() == 4).then(|| Self {
            llx: values[0].min(values[2]),
            lly: values[1].min(values[3]),
            urx: values[0].max(values[2]),
            ury: values[1].max(values[3]),
        })
    }
}

/// Follow a reference to the object it points at; other objects pass through.
pub fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Look up `key` on the page, then on each `/Pages` ancestor.
pub fn inherited_attribute<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;

    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value);
        }
        let parent_id = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_dictionary(parent_id).ok()?;
    }

    None
}

/// Effective media box of a page.
///
/// Falls back to US Letter when no media box is declared anywhere in the
/// page's ancestry.
pub fn media_box(doc: &Document, page_id: ObjectId) -> MediaBox {
    inherited_attribute(doc, page_id, b"MediaBox")
        .and_then(|obj| MediaBox::from_object(doc, obj))
        .unwrap_or_else(|| {
            warn!("Page {:?} declares no usable MediaBox, assuming US Letter", page_id);
            FALLBACK_MEDIA_BOX
        })
}

/// Copy every inherited attribute onto the page itself.
///
/// Run before a page is moved to a different page tree, where the old
/// ancestors no longer apply.
pub fn materialize_inherited_attributes(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let mut inherited = Vec::new();
    {
        let page = page_dict(doc, page_id)?;
        for key in INHERITABLE_ATTRIBUTES {
            if page.has(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(doc, page_id, key) {
                inherited.push((key, value.clone()));
            }
        }
    }

    let page = page_dict_mut(doc, page_id)?;
    for (key, value) in inherited {
        page.set(key.to_vec(), value);
    }
    Ok(())
}

/// The page's effective resources as an owned dictionary.
///
/// References to the resource dictionary and to its `XObject` and
/// `ExtGState` sub-dictionaries are resolved, so the result can be edited
/// and stored back on the page without touching shared objects.
pub fn owned_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    let mut resources = inherited_attribute(doc, page_id, b"Resources")
        .and_then(|obj| resolve(doc, obj).as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);

    for key in [b"XObject".as_slice(), b"ExtGState".as_slice()] {
        let owned = resources
            .get(key)
            .ok()
            .and_then(|obj| resolve(doc, obj).as_dict().ok())
            .cloned();
        if let Some(sub) = owned {
            resources.set(key.to_vec(), Object::Dictionary(sub));
        }
    }

    resources
}

/// Register `target` under `category` (e.g. `XObject`) in a resource
/// dictionary and return the name it is reachable by.
///
/// Reuses an existing entry already pointing at `target`; otherwise picks
/// `base`, `base1`, `base2`, ... whichever is free.
pub fn register_resource(resources: &mut Dictionary, category: &[u8], base: &str, target: ObjectId) -> String {
    let mut entries = match resources.get(category) {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };

    let existing = entries.iter().find_map(|(name, value)| match value {
        Object::Reference(id) if *id == target => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    });

    let name = existing.unwrap_or_else(|| {
        let mut candidate = base.to_string();
        let mut n = 1;
        while entries.has(candidate.as_bytes()) {
            candidate = format!("{base}{n}");
            n += 1;
        }
        entries.set(candidate.clone(), Object::Reference(target));
        candidate
    });

    resources.set(category.to_vec(), Object::Dictionary(entries));
    name
}

/// Add content streams before and after the page's existing content.
///
/// `before` is drawn first (under the existing content), `after` last (on
/// top of it). Either may be empty, in which case no stream is added.
///
/// `/Contents` may be a stream, an array of streams, or a reference to
/// either; a referenced array is spliced in, since arrays cannot nest.
pub fn wrap_content(doc: &mut Document, page_id: ObjectId, before: &[u8], after: &[u8]) -> Result<()> {
    let existing: Vec<Object> = match page_dict(doc, page_id)?.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(arr)) => arr.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(arr)) => arr.clone(),
        _ => Vec::new(),
    };

    let mut contents = Vec::with_capacity(existing.len() + 2);
    if !before.is_empty() {
        let id = doc.add_object(Stream::new(Dictionary::new(), before.to_vec()));
        contents.push(Object::Reference(id));
    }
    contents.extend(existing);
    if !after.is_empty() {
        let id = doc.add_object(Stream::new(Dictionary::new(), after.to_vec()));
        contents.push(Object::Reference(id));
    }

    page_dict_mut(doc, page_id)?.set("Contents", Object::Array(contents));
    Ok(())
}

pub(crate) fn page_dict(doc: &Document, page_id: ObjectId) -> Result<&Dictionary> {
    doc.get_dictionary(page_id)
        .map_err(|e| Error::PdfStructure(format!("page {page_id:?} is not a dictionary: {e}")))
}

pub(crate) fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary> {
    doc.get_dictionary_mut(page_id)
        .map_err(|e| Error::PdfStructure(format!("page {page_id:?} is not a dictionary: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{sample_pdf, sample_pdf_inherited};

    fn first_page(doc: &Document) -> ObjectId {
        doc.get_pages()[&1]
    }

    #[test]
    fn test_media_box_on_page() {
        let doc = Document::load_mem(&sample_pdf(&["x"])).unwrap();
        let mb = media_box(&doc, first_page(&doc));
        assert!((mb.width() - 612.0).abs() < f32::EPSILON);
        assert!((mb.height() - 792.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_media_box_inherited_from_pages_node() {
        let doc = Document::load_mem(&sample_pdf_inherited(&["x"])).unwrap();
        let page_id = first_page(&doc);
        assert!(!doc.get_dictionary(page_id).unwrap().has(b"MediaBox"));
        assert_eq!(media_box(&doc, page_id), MediaBox::new(0.0, 0.0, 612.0, 792.0));
    }

    #[test]
    fn test_media_box_normalizes_corner_order() {
        let mut doc = Document::load_mem(&sample_pdf(&["x"])).unwrap();
        let page_id = first_page(&doc);
        doc.get_dictionary_mut(page_id).unwrap().set(
            "MediaBox",
            Object::Array(vec![300.into(), 400.into(), 0.into(), 0.into()]),
        );
        assert_eq!(media_box(&doc, page_id), MediaBox::new(0.0, 0.0, 300.0, 400.0));
    }

    #[test]
    fn test_missing_media_box_falls_back_to_letter() {
        let mut doc = Document::load_mem(&sample_pdf(&["x"])).unwrap();
        let page_id = first_page(&doc);
        doc.get_dictionary_mut(page_id).unwrap().remove(b"MediaBox");
        assert_eq!(media_box(&doc, page_id), FALLBACK_MEDIA_BOX);
    }

    #[test]
    fn test_materialize_copies_inherited_attributes() {
        let mut doc = Document::load_mem(&sample_pdf_inherited(&["x", "y"])).unwrap();
        let page_id = first_page(&doc);
        materialize_inherited_attributes(&mut doc, page_id).unwrap();

        let page = doc.get_dictionary(page_id).unwrap();
        assert!(page.has(b"MediaBox"));
        assert!(page.has(b"Resources"));
        assert!(!page.has(b"Rotate"));
    }

    #[test]
    fn test_register_resource_avoids_collisions() {
        let mut resources = Dictionary::new();
        let a = register_resource(&mut resources, b"XObject", "Wm", (10, 0));
        let b = register_resource(&mut resources, b"XObject", "Wm", (11, 0));
        let again = register_resource(&mut resources, b"XObject", "Wm", (10, 0));

        assert_eq!(a, "Wm");
        assert_eq!(b, "Wm1");
        assert_eq!(again, "Wm");
    }

    #[test]
    fn test_owned_resources_does_not_alias_shared_dictionary() {
        let mut doc = Document::load_mem(&sample_pdf(&["a", "b"])).unwrap();
        let pages = doc.get_pages();
        let (first, second) = (pages[&1], pages[&2]);

        let mut resources = owned_resources(&doc, first);
        register_resource(&mut resources, b"XObject", "Wm", (999, 0));
        page_dict_mut(&mut doc, first).unwrap().set("Resources", resources);

        let untouched = owned_resources(&doc, second);
        assert!(untouched.get(b"XObject").is_err());
        assert!(untouched.get(b"Font").is_ok());
    }

    #[test]
    fn test_wrap_content_orders_streams() {
        let mut doc = Document::load_mem(&sample_pdf(&["body"])).unwrap();
        let page_id = first_page(&doc);
        wrap_content(&mut doc, page_id, b"q\n", b"\nQ\n").unwrap();

        let content = doc.get_page_content(page_id).unwrap();
        assert!(content.starts_with(b"q\n"));
        assert!(content.ends_with(b"\nQ\n"));
        assert!(content.windows(4).any(|w| w == b"body"));
    }

    #[test]
    fn test_wrap_content_splices_referenced_array() {
        let mut doc = Document::load_mem(&sample_pdf(&["body"])).unwrap();
        let page_id = first_page(&doc);
        let stream = doc.get_dictionary(page_id).unwrap().get(b"Contents").unwrap().clone();
        let array_id = doc.add_object(Object::Array(vec![stream.clone()]));
        page_dict_mut(&mut doc, page_id).unwrap().set("Contents", array_id);

        wrap_content(&mut doc, page_id, b"q\n", b"\nQ\n").unwrap();

        let contents = doc.get_dictionary(page_id).unwrap().get(b"Contents").unwrap().as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1].as_reference().unwrap(), stream.as_reference().unwrap());
        let content = doc.get_page_content(page_id).unwrap();
        assert!(content.windows(4).any(|w| w == b"body"));
    }
}
