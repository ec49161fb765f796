mod document;
mod logo;
pub mod assemble;
pub mod overlay;
pub mod page;
pub mod stamp;

pub use assemble::{AssembledDocument, Segments, assemble, combine_documents};
pub use document::PdfDocument;
pub use logo::LogoImage;
pub use overlay::{Overlay, Rect, render_overlay};
pub use page::MediaBox;
pub use stamp::{PageStamper, apply_watermark};
