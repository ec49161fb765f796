use std::path::Path;
use std::sync::Arc;

use lopdf::{Document, ObjectId};

use crate::error::{Error, Result};

/// A parsed PDF document with the name it was supplied under.
///
/// The parsed `lopdf::Document` sits behind an `Arc`: cloning a
/// `PdfDocument` is O(1), and consumers that need to mutate pages take their
/// own deep copy via [`PdfDocument::to_lopdf`].
pub struct PdfDocument {
    name: String,
    inner: Arc<Document>,
    page_count: usize,
}

impl PdfDocument {
    /// Parse a PDF from bytes.
    ///
    /// `name` is used in error messages and for deriving output names.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let name = name.into();

        let inner = Document::load_mem(bytes).map_err(|e| Error::CorruptDocument {
            name: name.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self::from_lopdf(name, inner))
    }

    /// Open a PDF from a file path
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

        let bytes = std::fs::read(path).map_err(|e| Error::CorruptDocument {
            name: name.clone(),
            reason: format!("failed to read {}: {e}", path.display()),
        })?;

        Self::from_bytes(name, &bytes)
    }

    /// Wrap an already parsed document.
    pub fn from_lopdf(name: impl Into<String>, document: Document) -> Self {
        let page_count = document.get_pages().len();
        Self {
            name: name.into(),
            inner: Arc::new(document),
            page_count,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get number of pages
    pub const fn page_count(&self) -> usize {
        self.page_count
    }

    pub const fn is_empty(&self) -> bool {
        self.page_count == 0
    }

    /// Borrow the parsed document.
    pub fn document(&self) -> &Document {
        &self.inner
    }

    /// Page object ids in page order.
    pub fn page_ids(&self) -> Vec<ObjectId> {
        self.inner.get_pages().into_values().collect()
    }

    /// Deep copy of the parsed document, free to be mutated.
    pub fn to_lopdf(&self) -> Document {
        Document::clone(&self.inner)
    }
}

impl Clone for PdfDocument {
    /// Clone the document efficiently.
    ///
    /// This is O(1) - it only clones the `Arc` pointer to the parsed document.
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            inner: Arc::clone(&self.inner),
            page_count: self.page_count,
        }
    }
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("name", &self.name)
            .field("page_count", &self.page_count)
            .finish_non_exhaustive()
    }
}
