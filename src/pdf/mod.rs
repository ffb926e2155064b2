//! PDF assembly: overlay drawing, document compositing, rasterization
//! and size control.

pub mod compress;
pub mod merge;
pub mod metadata;
pub mod overlay;
pub mod raster;

// Re-export commonly used items
pub use compress::{images_to_pdf, prepare_multi_page, recompress_pdf};
pub use merge::{append_documents, stamp_overlay};
pub use metadata::page_count;
pub use overlay::{Font, OverlayPage};
pub use raster::{pdfium_available, rasterize_pdf};

use lopdf::Document;

use crate::error::Result;

/// Parse a PDF held in memory
pub fn load_document(bytes: &[u8]) -> Result<Document> {
    Ok(Document::load_mem(bytes)?)
}

/// Compress and serialize a document
pub fn document_to_bytes(doc: &mut Document) -> Result<Vec<u8>> {
    doc.compress();
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}
