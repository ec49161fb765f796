//! Askama templates.
//!
//! - `base.html` - Common layout with CSS
//! - `index.html` - Landing page with upload form

use askama::Template;
use askama_web::WebTemplate;

/// Landing page with upload form.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub max_upload_mb: usize,
    /// Name of the zip returned for several files
    pub archive_name: String,
    /// Placeholder for the prefix input
    pub prefix_example: &'static str,
}

impl IndexTemplate {
    pub fn new(max_upload_mb: usize, archive_name: impl Into<String>) -> Self {
        Self {
            max_upload_mb,
            archive_name: archive_name.into(),
            prefix_example: "simplified",
        }
    }
}
