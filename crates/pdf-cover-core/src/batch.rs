//! Sequential processing of several uploads, output naming and archives.

use std::collections::HashMap;
use std::io::{Cursor, Write};

use tracing::{info, warn};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::assets::CoverAssets;
use crate::config::{DEFAULT_OUTPUT_SUFFIX, FailurePolicy, WatermarkOptions};
use crate::error::{Error, Result};
use crate::pdf::{PdfDocument, assemble};
use crate::util::{file_name_only, split_extension};

/// Progress callback invoked as `(done, total)` after each upload.
pub type ProgressCallback<'a> = &'a dyn Fn(usize, usize);

/// An uploaded PDF as handed over by a front-end.
#[derive(Debug, Clone)]
pub struct Upload {
    /// File name as supplied by the user
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// One finished output document.
#[derive(Debug, Clone)]
pub struct ProcessedFile {
    /// Name the output should be offered under
    pub name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// An upload that could not be processed under [`FailurePolicy::Skip`].
#[derive(Debug)]
pub struct FailedFile {
    pub name: String,
    pub error: Error,
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Outputs in upload order
    pub processed: Vec<ProcessedFile>,
    /// Skipped uploads in upload order
    pub failures: Vec<FailedFile>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// How output files are named after their upload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NamingScheme {
    /// The upload's own file name
    #[default]
    Original,
    /// A user-supplied name; `.pdf` is appended when missing
    Explicit(String),
    /// `<basename><suffix>.<ext>`, e.g. `report_CS.pdf`
    Suffix(String),
    /// `<prefix>_<name>`, e.g. `simplified_report.pdf`
    Prefix(String),
}

impl NamingScheme {
    /// `Explicit`, or `Original` when the name is blank.
    pub fn explicit_or_original(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            Some(n) if !n.is_empty() => Self::Explicit(n.to_string()),
            _ => Self::Original,
        }
    }

    /// `Prefix`, or `Original` when the prefix is blank.
    pub fn prefix_or_original(prefix: Option<&str>) -> Self {
        match prefix.map(str::trim) {
            Some(p) if !p.is_empty() => Self::Prefix(p.to_string()),
            _ => Self::Original,
        }
    }

    /// The default per-file batch naming (`_CS` suffix).
    pub fn default_suffix() -> Self {
        Self::Suffix(DEFAULT_OUTPUT_SUFFIX.to_string())
    }

    /// Output file name for an upload called `upload_name`.
    pub fn output_name(&self, upload_name: &str) -> String {
        let original = file_name_only(upload_name);
        match self {
            Self::Original => original.to_string(),
            Self::Explicit(name) => {
                let name = name.trim();
                if name.is_empty() {
                    original.to_string()
                } else if name.to_ascii_lowercase().ends_with(".pdf") {
                    name.to_string()
                } else {
                    format!("{name}.pdf")
                }
            }
            Self::Suffix(suffix) => {
                let (base, ext) = split_extension(original);
                format!("{base}{suffix}.{}", ext.unwrap_or("pdf"))
            }
            Self::Prefix(prefix) => {
                let prefix = prefix.trim();
                if prefix.is_empty() {
                    original.to_string()
                } else {
                    format!("{prefix}_{original}")
                }
            }
        }
    }
}

/// Cover and watermark one upload.
pub fn process_upload(
    assets: &CoverAssets,
    options: &WatermarkOptions,
    upload: &Upload,
    naming: &NamingScheme,
) -> Result<ProcessedFile> {
    let main = PdfDocument::from_bytes(file_name_only(&upload.name), &upload.bytes)?;
    let assembled = assemble(assets.front(), &main, assets.back(), assets.logo(), options)?;
    let page_count = assembled.page_count();
    let bytes = assembled.to_bytes()?;
    let name = naming.output_name(&upload.name);

    info!(
        "Processed {} -> {} ({} page(s), {} bytes)",
        upload.name,
        name,
        page_count,
        bytes.len()
    );

    Ok(ProcessedFile {
        name,
        bytes,
        page_count,
    })
}

/// Process uploads one after the other, in upload order.
///
/// Under [`FailurePolicy::Abort`] the first failure is returned and nothing
/// else is produced. Under [`FailurePolicy::Skip`] failures are logged and
/// collected in the report, except asset errors, which always abort.
pub fn run_batch(
    assets: &CoverAssets,
    options: &WatermarkOptions,
    uploads: &[Upload],
    naming: &NamingScheme,
    policy: FailurePolicy,
    progress: Option<ProgressCallback<'_>>,
) -> Result<BatchReport> {
    let total = uploads.len();
    let mut report = BatchReport::default();

    for (index, upload) in uploads.iter().enumerate() {
        match process_upload(assets, options, upload, naming) {
            Ok(file) => report.processed.push(file),
            Err(error) if policy == FailurePolicy::Skip && !error.is_asset_error() => {
                warn!("Skipping {}: {}", upload.name, error);
                report.failures.push(FailedFile {
                    name: upload.name.clone(),
                    error,
                });
            }
            Err(error) => return Err(error),
        }

        if let Some(callback) = progress {
            callback(index + 1, total);
        }
    }

    Ok(report)
}

/// Pack outputs into a deflated zip archive, one entry per file in order.
///
/// Repeated names get a counter before the extension: `a.pdf`,
/// `a (2).pdf`, `a (3).pdf`.
pub fn write_archive(files: &[ProcessedFile]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let entries = unique_names(files.iter().map(|f| f.name.as_str()));

    for (file, entry) in files.iter().zip(entries) {
        writer
            .start_file(entry.as_str(), options)
            .map_err(|e| Error::Archive(format!("failed to add {entry}: {e}")))?;
        writer.write_all(&file.bytes)?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| Error::Archive(format!("failed to finish archive: {e}")))?;
    Ok(cursor.into_inner())
}

/// Disambiguate repeated names in order: `a.pdf`, `a (2).pdf`, `a (3).pdf`.
///
/// Shared by archives and by front-ends writing loose files to one
/// directory, so no output silently replaces another.
pub fn unique_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    names
        .into_iter()
        .map(|name| unique_entry_name(&mut seen, name))
        .collect()
}

fn unique_entry_name(seen: &mut HashMap<String, usize>, name: &str) -> String {
    let count = seen.entry(name.to_string()).or_insert(0);
    *count += 1;
    if *count == 1 {
        return name.to_string();
    }

    let n = *count;
    let candidate = match split_extension(name) {
        (base, Some(ext)) => format!("{base} ({n}).{ext}"),
        (base, None) => format!("{base} ({n})"),
    };
    // The generated name could itself collide with a later upload
    seen.insert(candidate.clone(), 1);
    candidate
}
