//! PDF page rasterization
//!
//! pdfium wraps a C++ library with thread-local state and blocks while
//! rendering; async callers must route through `spawn_blocking` (the HTTP
//! layer does).

use image::RgbImage;
use pdfium_render::prelude::*;
use tracing::debug;

use crate::error::{Error, Result};

/// Render every page of a PDF to an RGB raster at the given DPI.
///
/// PDF points are 1/72 inch, so a page renders at `dpi / 72` times its
/// point dimensions. Pages come back in document order.
pub fn rasterize_pdf(bytes: &[u8], dpi: u32) -> Result<Vec<RgbImage>> {
    let bindings = Pdfium::bind_to_system_library()
        .map_err(|e| Error::Raster(format!("pdfium library unavailable: {:?}", e)))?;
    let pdfium = Pdfium::new(bindings);

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| Error::Raster(format!("failed to load PDF: {:?}", e)))?;

    let scale = dpi as f64 / 72.0;
    let mut rendered = Vec::new();

    for (index, page) in document.pages().iter().enumerate() {
        // Width drives the render size; height follows from the aspect ratio
        let target_width = (page.width().value as f64 * scale).round().max(1.0) as i32;
        let config = PdfRenderConfig::new().set_target_width(target_width);

        let bitmap = page.render_with_config(&config).map_err(|e| {
            Error::Raster(format!("failed to render page {}: {:?}", index + 1, e))
        })?;

        let image = bitmap.as_image().to_rgb8();
        debug!(
            "Rasterized page {} at {} DPI → {}x{} px",
            index + 1,
            dpi,
            image.width(),
            image.height()
        );
        rendered.push(image);
    }

    if rendered.is_empty() {
        return Err(Error::EmptyPdf);
    }

    Ok(rendered)
}

/// True when a pdfium system library can be bound.
///
/// Lets tests and callers degrade gracefully on machines without pdfium
/// installed.
pub fn pdfium_available() -> bool {
    Pdfium::bind_to_system_library().is_ok()
}
