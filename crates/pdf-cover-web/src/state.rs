use pdf_cover_core::CoverStamper;

/// Global application state
pub struct AppState {
    /// Loaded covers, logo and options; shared read-only by every request
    stamper: CoverStamper,
    /// Upload limit, shown on the landing page
    pub max_upload_mb: usize,
}

impl AppState {
    pub const fn new(stamper: CoverStamper, max_upload_mb: usize) -> Self {
        Self {
            stamper,
            max_upload_mb,
        }
    }

    pub const fn stamper(&self) -> &CoverStamper {
        &self.stamper
    }

    /// Request body limit in bytes.
    pub const fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}
