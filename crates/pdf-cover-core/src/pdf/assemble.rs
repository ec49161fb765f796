//! Concatenating documents and assembling covered, watermarked outputs.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;

use super::document::PdfDocument;
use super::logo::LogoImage;
use super::page::materialize_inherited_attributes;
use super::stamp::PageStamper;
use crate::config::WatermarkOptions;
use crate::error::{Error, Result};

/// Page counts of the three segments of an assembled document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segments {
    pub front: usize,
    pub main: usize,
    pub back: usize,
}

impl Segments {
    pub const fn total(&self) -> usize {
        self.front + self.main + self.back
    }

    /// Zero-based page indices holding the watermarked main document.
    pub const fn main_range(&self) -> std::ops::Range<usize> {
        self.front..self.front + self.main
    }
}

/// Front cover + watermarked main document + back cover, ready to serialize.
pub struct AssembledDocument {
    document: Document,
    segments: Segments,
}

impl AssembledDocument {
    pub const fn segments(&self) -> Segments {
        self.segments
    }

    pub const fn page_count(&self) -> usize {
        self.segments.total()
    }

    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Compress streams and serialize the document.
    pub fn to_bytes(mut self) -> Result<Vec<u8>> {
        self.document.compress();

        let mut output = Vec::new();
        self.document
            .save_to(&mut output)
            .map_err(|e| Error::PdfSave(format!("Failed to save assembled PDF: {e}")))?;

        Ok(output)
    }
}

impl std::fmt::Debug for AssembledDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssembledDocument")
            .field("segments", &self.segments)
            .finish_non_exhaustive()
    }
}

/// Build the output document for one upload.
///
/// Pages come out as: every page of `front` unchanged, every page of `main`
/// with the logo watermark, every page of `back` unchanged. The covers are
/// only read; `main` may be empty.
pub fn assemble(
    front: &PdfDocument,
    main: &PdfDocument,
    back: &PdfDocument,
    logo: &LogoImage,
    options: &WatermarkOptions,
) -> Result<AssembledDocument> {
    if front.is_empty() {
        return Err(Error::EmptyCover { which: "front" });
    }
    if back.is_empty() {
        return Err(Error::EmptyCover { which: "back" });
    }

    let mut stamped = main.to_lopdf();
    {
        let mut stamper = PageStamper::new(&mut stamped, logo, options);
        for page_id in main.page_ids() {
            stamper.apply_watermark(page_id)?;
        }
    }
    debug!("Watermarked {} page(s) of {}", main.page_count(), main.name());

    let document = combine_documents(vec![front.to_lopdf(), stamped, back.to_lopdf()])?;

    let segments = Segments {
        front: front.page_count(),
        main: main.page_count(),
        back: back.page_count(),
    };

    Ok(AssembledDocument { document, segments })
}

/// Concatenate documents into one.
///
/// Pages keep their order within each document, and documents follow each
/// other in the order given. Document-level structures (outlines, forms,
/// name trees) are not carried over.
pub fn combine_documents(documents: Vec<Document>) -> Result<Document> {
    let mut max_id: u32 = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut documents_pages: BTreeMap<ObjectId, Dictionary> = BTreeMap::new();
    let mut documents_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut document = Document::with_version("1.5");

    for mut doc in documents {
        for page_id in doc.get_pages().into_values() {
            materialize_inherited_attributes(&mut doc, page_id)?;
        }

        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for page_id in doc.get_pages().into_values() {
            let page = doc
                .get_dictionary(page_id)
                .map_err(|e| Error::PdfStructure(format!("page {page_id:?}: {e}")))?;
            page_ids.push(page_id);
            documents_pages.insert(page_id, page.clone());
        }

        for (object_id, object) in doc.objects {
            match object.type_name().unwrap_or(b"") {
                b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline" => {}
                _ => {
                    documents_objects.insert(object_id, object);
                }
            }
        }
    }

    document.objects.extend(documents_objects);
    document.max_id = max_id;

    let pages_id = document.new_object_id();

    for (obj_id, mut page) in documents_pages {
        page.set("Parent", Object::Reference(pages_id));
        document.objects.insert(obj_id, Object::Dictionary(page));
    }

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();
    let count = i64::try_from(kids.len())
        .map_err(|_| Error::PdfStructure("too many pages".to_string()))?;

    let pages_dict_obj = Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(count)),
    ]);
    document.objects.insert(pages_id, Object::Dictionary(pages_dict_obj));

    let catalog_id = document.new_object_id();
    let catalog_dict_obj = Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    document.objects.insert(catalog_id, Object::Dictionary(catalog_dict_obj));

    document.trailer.set("Root", Object::Reference(catalog_id));
    document.renumber_objects();

    Ok(document)
}
