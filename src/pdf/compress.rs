//! Output size control: photo downscaling and whole-document recompression.
//!
//! Scanned uploads routinely arrive as multi-megabyte camera captures, so
//! everything here trades resolution for size to keep generated documents
//! mailable.

use image::imageops::FilterType;
use image::RgbImage;
use lopdf::Document;
use tracing::debug;

use crate::error::{Error, Result};
use crate::input::{load_pages_lossy, Upload};
use crate::layout::{fit_to_page, PageSize};
use crate::pdf::document_to_bytes;
use crate::pdf::merge::append_documents;
use crate::pdf::overlay::OverlayPage;
use crate::pdf::raster::rasterize_pdf;

/// Width cap applied to photos before they are embedded
pub const MAX_IMAGE_WIDTH: u32 = 1200;

/// JPEG quality for pages rebuilt from uploaded images
pub const CONVERT_JPEG_QUALITY: u8 = 75;

/// Rasterization density for whole-document recompression
pub const RECOMPRESS_DPI: u32 = 100;

/// JPEG quality for recompressed pages
pub const RECOMPRESS_JPEG_QUALITY: u8 = 60;

/// Attachments above this size get rebuilt at lower fidelity
pub const MAX_PDF_BYTES: usize = 5 * 1024 * 1024;

/// Downscale an image to at most `max_width` pixels wide, preserving
/// aspect ratio. Narrower images pass through untouched.
pub fn downscale_to_width(image: RgbImage, max_width: u32) -> RgbImage {
    if image.width() <= max_width {
        return image;
    }
    let ratio = max_width as f64 / image.width() as f64;
    let height = ((image.height() as f64 * ratio).round() as u32).max(1);
    image::imageops::resize(&image, max_width, height, FilterType::Lanczos3)
}

/// Build a PDF from uploaded pages, one A4 page per image.
///
/// Image parts decode directly; PDF parts are rasterized page by page.
/// Unreadable parts are skipped. Each page image is centered and scaled
/// to fill its page. With `force_compress` the images are also capped at
/// [`MAX_IMAGE_WIDTH`] pixels before encoding, which is the second-pass
/// fallback when the plain build comes out over the size limit.
pub fn images_to_pdf(uploads: &[Upload], force_compress: bool) -> Result<Vec<u8>> {
    if uploads.is_empty() {
        return Err(Error::InvalidInput("No files to convert".to_string()));
    }

    let mut images = load_pages_lossy(uploads);
    if images.is_empty() {
        return Err(Error::InvalidInput("No readable pages in upload".to_string()));
    }
    if force_compress {
        images = images
            .into_iter()
            .map(|image| downscale_to_width(image, MAX_IMAGE_WIDTH))
            .collect();
    }

    let mut doc = full_page_document(&images, CONVERT_JPEG_QUALITY)?;
    document_to_bytes(&mut doc)
}

/// Rebuild a PDF as JPEG page images at reduced density.
///
/// Every page is rasterized at [`RECOMPRESS_DPI`] and re-embedded on a
/// fresh A4 page. Text becomes pixels, which is acceptable for the
/// scanned documents this handles and cuts the size dramatically.
pub fn recompress_pdf(bytes: &[u8]) -> Result<Vec<u8>> {
    let images = rasterize_pdf(bytes, RECOMPRESS_DPI)?;
    let mut doc = full_page_document(&images, RECOMPRESS_JPEG_QUALITY)?;
    document_to_bytes(&mut doc)
}

/// Normalize the multi-page upload parts into at most one PDF.
///
/// A lone PDF part passes through untouched unless it exceeds
/// [`MAX_PDF_BYTES`], in which case it is rasterized and rebuilt. Any
/// other mix of parts is treated as scanned page images and converted,
/// with a forced second pass when the first build is still too large.
pub fn prepare_multi_page(uploads: &[Upload]) -> Result<Option<Vec<u8>>> {
    if uploads.is_empty() {
        return Ok(None);
    }

    if uploads.len() == 1 && uploads[0].is_pdf() {
        let bytes = &uploads[0].bytes;
        if bytes.len() > MAX_PDF_BYTES {
            debug!("Attachment is {} bytes, recompressing", bytes.len());
            return recompress_pdf(bytes).map(Some);
        }
        return Ok(Some(bytes.clone()));
    }

    let bytes = images_to_pdf(uploads, false)?;
    if bytes.len() > MAX_PDF_BYTES {
        debug!("Converted attachment is {} bytes, rebuilding compressed", bytes.len());
        return images_to_pdf(uploads, true).map(Some);
    }
    Ok(Some(bytes))
}

fn full_page_document(images: &[RgbImage], quality: u8) -> Result<Document> {
    let mut pages = Vec::new();
    for image in images {
        let page = PageSize::a4();
        let mut overlay = OverlayPage::new(page);
        let (x, y, width, height) = fit_to_page(page, image.width(), image.height());
        overlay.draw_image_jpeg(image, x, y, width, height, quality)?;
        pages.push(overlay.build()?);
    }
    append_documents(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::raster::pdfium_available;
    use image::{ImageFormat, Rgb};
    use lopdf::{Dictionary, Object, Stream};
    use std::io::Cursor;

    fn png_upload(name: &str, width: u32, height: u32) -> Upload {
        let img = RgbImage::from_pixel(width, height, Rgb([90, 120, 200]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        Upload::new(name, bytes)
    }

    /// Noise fills every pixel, so the JPEG pages built from these stay
    /// large no matter the quality setting
    fn noise_upload(name: &str, width: u32, height: u32, seed: u64) -> Upload {
        let mut state = seed;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state as u8
        };
        let img = RgbImage::from_fn(width, height, |_, _| Rgb([next(), next(), next()]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        Upload::new(name, bytes)
    }

    fn first_image_width(bytes: &[u8]) -> i64 {
        let doc = Document::load_mem(bytes).unwrap();
        let pages = doc.get_pages();
        let page_id = pages[&1];
        let page_dict = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let resources = match page_dict.get(b"Resources").unwrap() {
            Object::Reference(id) => doc.get_object(*id).unwrap().as_dict().unwrap(),
            Object::Dictionary(dict) => dict,
            other => panic!("unexpected resources: {:?}", other),
        };
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        let (_, first) = xobjects.iter().next().unwrap();
        let stream_id = first.as_reference().unwrap();
        let stream = doc.get_object(stream_id).unwrap();
        match stream {
            Object::Stream(s) => s.dict.get(b"Width").unwrap().as_i64().unwrap(),
            other => panic!("unexpected xobject: {:?}", other),
        }
    }

    #[test]
    fn test_downscale_caps_wide_images() {
        let img = RgbImage::new(2400, 1200);
        let capped = downscale_to_width(img, MAX_IMAGE_WIDTH);
        assert_eq!(capped.width(), 1200);
        assert_eq!(capped.height(), 600);
    }

    #[test]
    fn test_downscale_leaves_narrow_images_alone() {
        let img = RgbImage::new(800, 600);
        let same = downscale_to_width(img, MAX_IMAGE_WIDTH);
        assert_eq!((same.width(), same.height()), (800, 600));
    }

    #[test]
    fn test_images_to_pdf_one_page_per_image() {
        let uploads = vec![png_upload("a.png", 60, 40), png_upload("b.png", 40, 60)];
        let bytes = images_to_pdf(&uploads, false).unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_images_to_pdf_rejects_empty_input() {
        assert!(images_to_pdf(&[], false).is_err());
    }

    #[test]
    fn test_images_to_pdf_force_caps_resolution() {
        let uploads = vec![png_upload("wide.png", 1600, 200)];

        let plain = images_to_pdf(&uploads, false).unwrap();
        assert_eq!(first_image_width(&plain), 1600);

        let forced = images_to_pdf(&uploads, true).unwrap();
        assert_eq!(first_image_width(&forced), 1200);
    }

    #[test]
    fn test_prepare_multi_page_empty_is_none() {
        assert!(prepare_multi_page(&[]).unwrap().is_none());
    }

    #[test]
    fn test_prepare_multi_page_passes_small_pdf_through() {
        let uploads = vec![png_upload("scan.png", 30, 30)];
        let pdf_bytes = images_to_pdf(&uploads, false).unwrap();

        let parts = vec![Upload::new("pages.pdf", pdf_bytes.clone())];
        let prepared = prepare_multi_page(&parts).unwrap().unwrap();
        assert_eq!(prepared, pdf_bytes);
    }

    #[test]
    fn test_prepare_multi_page_converts_images() {
        let parts = vec![png_upload("p1.png", 30, 30), png_upload("p2.png", 30, 30)];
        let prepared = prepare_multi_page(&parts).unwrap().unwrap();

        let doc = Document::load_mem(&prepared).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_prepare_multi_page_recompresses_large_pdf() {
        if !pdfium_available() {
            println!("SKIP test_prepare_multi_page_recompresses_large_pdf: pdfium not installed");
            return;
        }

        let uploads = vec![png_upload("a.png", 80, 60), png_upload("b.png", 60, 80)];
        let small = images_to_pdf(&uploads, false).unwrap();

        // Pad past the size limit with an unreferenced stream object;
        // save_to applies no stream compression, so the zero fill
        // survives verbatim
        let mut doc = Document::load_mem(&small).unwrap();
        doc.add_object(Object::Stream(Stream::new(
            Dictionary::new(),
            vec![0u8; MAX_PDF_BYTES + 1024],
        )));
        let mut oversized = Vec::new();
        doc.save_to(&mut oversized).unwrap();
        assert!(oversized.len() > MAX_PDF_BYTES);

        let parts = vec![Upload::new("big.pdf", oversized.clone())];
        let prepared = prepare_multi_page(&parts).unwrap().unwrap();

        // Rebuilt rather than passed through, and far smaller
        assert_ne!(prepared, oversized);
        assert!(prepared.len() < oversized.len());
        let rebuilt = Document::load_mem(&prepared).unwrap();
        assert_eq!(rebuilt.get_pages().len(), 2);
    }

    #[test]
    fn test_prepare_multi_page_forces_second_pass_on_large_conversion() {
        let parts = vec![
            noise_upload("p1.png", 2400, 1600, 0x9E3779B97F4A7C15),
            noise_upload("p2.png", 2400, 1600, 0xC2B2AE3D27D4EB4F),
            noise_upload("p3.png", 2400, 1600, 0x165667B19E3779F9),
        ];
        let prepared = prepare_multi_page(&parts).unwrap().unwrap();

        // The plain conversion of three noise pages lands over the size
        // limit, so the rebuild capped each page image
        assert_eq!(first_image_width(&prepared), 1200);
        let doc = Document::load_mem(&prepared).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_recompress_rebuilds_rasterized_pages() {
        if !pdfium_available() {
            println!("SKIP test_recompress_rebuilds_rasterized_pages: pdfium not installed");
            return;
        }

        let uploads = vec![png_upload("a.png", 80, 60), png_upload("b.png", 60, 80)];
        let bytes = images_to_pdf(&uploads, false).unwrap();

        let recompressed = recompress_pdf(&bytes).unwrap();
        let doc = Document::load_mem(&recompressed).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }
}
