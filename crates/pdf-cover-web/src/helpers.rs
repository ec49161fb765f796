//! Helper types and traits for cleaner route handlers.
//!
//! Provides an extension trait for converting `Result` types into
//! HTTP-appropriate error responses, plus response builders shared by routes.

use axum::{
    body::Body,
    http::{StatusCode, header},
    response::Response,
};
use pdf_cover_core::Error;
use tracing::error;

/// Response header carrying the number of uploads left out of an archive.
pub const SKIPPED_HEADER: &str = "x-skipped-files";

/// Standard result type for route handlers.
pub type RouteResult<T> = Result<T, (StatusCode, String)>;

/// Extension trait for converting `Result<T, E>` to `RouteResult<T>`.
pub trait ResultExt<T, E: std::fmt::Display> {
    /// Converts the error to 500 Internal Server Error.
    fn or_internal_error(self) -> RouteResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T, E> for Result<T, E> {
    fn or_internal_error(self) -> RouteResult<T> {
        self.map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
    }
}

/// Map a processing error to a status code and client-facing message.
///
/// Problems with the uploaded document are the client's; anything else
/// (assets, serialization) is ours and is logged.
pub fn processing_error(err: &Error) -> (StatusCode, String) {
    match err {
        Error::CorruptDocument { .. } => (StatusCode::BAD_REQUEST, format!("Invalid PDF: {err}")),
        Error::InvalidGeometry { .. } => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        _ => {
            error!("Processing failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Processing failed".to_string(),
            )
        }
    }
}

/// Build a download response with `Content-Disposition: attachment`.
pub fn attachment(bytes: Vec<u8>, content_type: &str, filename: &str) -> RouteResult<Response> {
    let filename = filename.replace(['"', '\r', '\n'], "_");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from(bytes))
        .or_internal_error()
}
