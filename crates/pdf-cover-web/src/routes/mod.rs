//! HTTP route handlers for the PDF cover web application.
//!
//! Pages are rendered with Askama templates from the `templates` module;
//! processing returns the finished PDF or zip as an attachment.

mod pages;
mod process;

pub use pages::{health, index};
pub use process::process_pdfs;
