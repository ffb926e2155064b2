//! Upload normalization
//!
//! Incoming multipart file parts are either images or PDFs; both reduce to
//! RGB raster pages before any layout work happens. Unreadable parts are
//! skipped so one bad upload cannot sink the whole request.

use std::io::Cursor;

use image::{DynamicImage, ImageDecoder, ImageReader, RgbImage};
use tracing::warn;

use crate::error::Result;
use crate::pdf::raster;

/// DPI used when expanding an uploaded PDF into page images
pub const PDF_UPLOAD_DPI: u32 = 150;

/// A decoded raster page in RGB
pub type PageImage = RgbImage;

/// One uploaded file part
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// PDF parts are recognized by extension or by the %PDF magic prefix
    pub fn is_pdf(&self) -> bool {
        self.filename.to_ascii_lowercase().ends_with(".pdf") || self.bytes.starts_with(b"%PDF")
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Decode an image upload, honoring its EXIF orientation
pub fn decode_image(bytes: &[u8]) -> Result<PageImage> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let mut decoder = reader.into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);
    Ok(image.to_rgb8())
}

/// Expand one upload into raster pages.
///
/// Images decode to a single page; PDFs rasterize to one page per document
/// page at 150 DPI.
pub fn load_pages(upload: &Upload) -> Result<Vec<PageImage>> {
    if upload.is_pdf() {
        raster::rasterize_pdf(&upload.bytes, PDF_UPLOAD_DPI)
    } else {
        Ok(vec![decode_image(&upload.bytes)?])
    }
}

/// Expand many uploads, skipping any part that fails to decode
pub fn load_pages_lossy(uploads: &[Upload]) -> Vec<PageImage> {
    let mut pages = Vec::new();
    for upload in uploads {
        match load_pages(upload) {
            Ok(mut loaded) => pages.append(&mut loaded),
            Err(e) => warn!("Skipping unreadable upload {}: {}", upload.filename, e),
        }
    }
    pages
}

/// Decode a document-slot upload.
///
/// Slots hold single photographs. A PDF in a slot, or a file that fails to
/// decode, leaves the slot empty.
pub fn decode_slot(upload: Option<&Upload>) -> Option<PageImage> {
    let upload = upload?;
    if upload.is_pdf() {
        warn!("Ignoring PDF {} in an image slot", upload.filename);
        return None;
    }
    match decode_image(&upload.bytes) {
        Ok(image) => Some(image),
        Err(e) => {
            warn!("Ignoring unreadable image {}: {}", upload.filename, e);
            None
        }
    }
}
