//! Fixtures shared by the unit tests.

#![allow(clippy::unwrap_used)]

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};

/// Build a PDF with one US Letter page per entry, each showing its text.
pub fn sample_pdf(page_texts: &[&str]) -> Vec<u8> {
    build_pdf(page_texts, false)
}

/// Like [`sample_pdf`], but `MediaBox` and `Resources` live on the `/Pages`
/// node and are inherited by the pages.
pub fn sample_pdf_inherited(page_texts: &[&str]) -> Vec<u8> {
    build_pdf(page_texts, true)
}

fn build_pdf(page_texts: &[&str], inherit: bool) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let media_box = Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]);

    let mut kids = Vec::with_capacity(page_texts.len());
    for text in page_texts {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        if !inherit {
            page.set("Resources", resources_id);
            page.set("MediaBox", media_box.clone());
        }
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let count = i64::try_from(kids.len()).unwrap();
    let mut pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
    };
    if inherit {
        pages.set("Resources", resources_id);
        pages.set("MediaBox", media_box);
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut output = Vec::new();
    doc.save_to(&mut output).unwrap();
    output
}

/// Encode a solid-colour PNG of the given size.
///
/// With `translucent`, the left half of the image is fully transparent.
pub fn logo_png(width: u32, height: u32, translucent: bool) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, _| {
        if translucent && x < width / 2 {
            Rgba([200, 30, 30, 0])
        } else {
            Rgba([200, 30, 30, 255])
        }
    });

    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Decoded content operations of a page.
pub fn page_operations(doc: &Document, page_number: u32) -> Vec<Operation> {
    let page_id = doc.get_pages()[&page_number];
    let content = doc.get_page_content(page_id).unwrap();
    Content::decode(&content).unwrap().operations
}

/// Number of `Do` operations painting an XObject whose name starts with `prefix`.
pub fn xobject_draws(doc: &Document, page_number: u32, prefix: &[u8]) -> usize {
    page_operations(doc, page_number)
        .iter()
        .filter(|op| op.operator == "Do")
        .filter(|op| matches!(op.operands.first(), Some(Object::Name(name)) if name.starts_with(prefix)))
        .count()
}
