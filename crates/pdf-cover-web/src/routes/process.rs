//! Processing route - multipart upload in, covered PDF or zip archive out.

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::Response,
};
use axum_extra::extract::{Multipart, multipart::MultipartError};
use pdf_cover_core::{CoverStamper, NamingScheme, Upload, write_archive};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::helpers::{RouteResult, SKIPPED_HEADER, attachment, processing_error};
use crate::state::AppState;

/// Fields of a processing request.
#[derive(Debug, Default)]
struct ProcessForm {
    uploads: Vec<Upload>,
    output_name: Option<String>,
    prefix: Option<String>,
}

enum Download {
    Pdf {
        name: String,
        bytes: Vec<u8>,
    },
    Archive {
        name: String,
        bytes: Vec<u8>,
        skipped: usize,
    },
}

fn multipart_error(err: MultipartError) -> (StatusCode, String) {
    (err.status(), err.body_text())
}

async fn read_form(mut multipart: Multipart) -> RouteResult<ProcessForm> {
    let mut form = ProcessForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await.map_err(multipart_error)?;

                // Browsers send an empty part when no file was chosen
                if filename.is_empty() && data.is_empty() {
                    continue;
                }
                let filename = if filename.is_empty() {
                    "document.pdf".to_string()
                } else {
                    filename
                };
                form.uploads.push(Upload::new(filename, data.to_vec()));
            }
            "output_name" => form.output_name = Some(field.text().await.map_err(multipart_error)?),
            "prefix" => form.prefix = Some(field.text().await.map_err(multipart_error)?),
            other => warn!("Ignoring unknown form field: {}", other),
        }
    }

    Ok(form)
}

/// One upload comes back as a PDF, several as an archive.
fn process_form(stamper: &CoverStamper, form: &ProcessForm) -> pdf_cover_core::Result<Download> {
    let prefix = form.prefix.as_deref();

    if let [upload] = form.uploads.as_slice() {
        let naming = match NamingScheme::explicit_or_original(form.output_name.as_deref()) {
            NamingScheme::Original => NamingScheme::prefix_or_original(prefix),
            explicit => explicit,
        };
        let file = stamper.process(upload, &naming)?;
        return Ok(Download::Pdf {
            name: file.name,
            bytes: file.bytes,
        });
    }

    let naming = NamingScheme::prefix_or_original(prefix);
    let report = stamper.process_batch(&form.uploads, &naming, None)?;
    let skipped = report.failures.len();

    // Nothing to pack: report the first failure instead of an empty archive
    if report.processed.is_empty()
        && let Some(failure) = report.failures.into_iter().next()
    {
        return Err(failure.error);
    }

    let bytes = write_archive(&report.processed)?;
    Ok(Download::Archive {
        name: stamper.archive_name().to_string(),
        bytes,
        skipped,
    })
}

/// Cover and watermark uploaded PDFs.
///
/// Multipart fields: `file` (one or more), optional `output_name` (single
/// file only) and optional `prefix`.
pub async fn process_pdfs(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> RouteResult<Response> {
    let form = read_form(multipart).await?;
    if form.uploads.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No file uploaded".to_string()));
    }
    info!("Received {} file(s) for processing", form.uploads.len());

    // Assembly is CPU-bound; keep it off the async runtime
    let worker_state = Arc::clone(&state);
    let download = tokio::task::spawn_blocking(move || process_form(worker_state.stamper(), &form))
        .await
        .map_err(|e| {
            error!("Processing task panicked: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Processing failed".to_string(),
            )
        })?
        .map_err(|e| processing_error(&e))?;

    match download {
        Download::Pdf { name, bytes } => attachment(bytes, "application/pdf", &name),
        Download::Archive {
            name,
            bytes,
            skipped,
        } => {
            let mut response = attachment(bytes, "application/zip", &name)?;
            if skipped > 0 {
                warn!("Archive {} is missing {} skipped file(s)", name, skipped);
                response
                    .headers_mut()
                    .insert(SKIPPED_HEADER, HeaderValue::from(skipped));
            }
            Ok(response)
        }
    }
}
