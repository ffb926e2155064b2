//! Request model, layout dispatch and the six composition variants.
//!
//! Every variant builds an overlay page, optionally stamps it onto a
//! template, optionally appends an uploaded multi-page document, and
//! serializes the result with its layout-determined download filename.

use std::path::Path;

use lopdf::Document;
use tracing::warn;

use crate::date::{certificate_date, parse_schedule_date};
use crate::error::{Error, Result};
use crate::input::{decode_slot, PageImage, Upload};
use crate::layout::{fit_within, Band, PageSize, IMAGE_GAP, PAGE_MARGIN};
use crate::pdf::compress::{downscale_to_width, MAX_IMAGE_WIDTH};
use crate::pdf::overlay::{Font, OverlayPage};
use crate::pdf::{
    append_documents, document_to_bytes, load_document, page_count, prepare_multi_page,
    recompress_pdf, stamp_overlay,
};
use crate::qr::render_qr;

/// JPEG quality for photos embedded in document slots
const SLOT_JPEG_QUALITY: u8 = 80;

/// QR code placement, points from the bottom-left corner
const QR_X: f64 = 20.0;
const QR_Y: f64 = 10.0;
const QR_SIZE: f64 = 70.0;

/// Certification paragraph wrap width and font size
const PARAGRAPH_WRAP: usize = 80;
const PARAGRAPH_FONT_SIZE: f64 = 10.0;

const ONE_NOTARY_TEMPLATE: &str = "output_1.pdf";
const US_MULTI_PAGE_TEMPLATE: &str = "US_MultiPage_format.pdf";

/// Named page arrangements. Parsed case-sensitively from the form's
/// layout field; unknown names fall back to [`Layout::Standard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    OneNotary,
    Uk88,
    Uk88MultiPage,
    UsMultiPage,
    NonMultiPage,
    #[default]
    Standard,
}

impl Layout {
    pub fn from_name(name: &str) -> Self {
        match name {
            "ONENOTARY" => Layout::OneNotary,
            "UK88" => Layout::Uk88,
            "UK88_MULTIPAGE" => Layout::Uk88MultiPage,
            "us_multipage" => Layout::UsMultiPage,
            "non_multipage" => Layout::NonMultiPage,
            _ => Layout::Standard,
        }
    }

    /// Download filename for documents generated with this layout
    pub fn filename(&self) -> &'static str {
        match self {
            Layout::Uk88MultiPage => "UK88_Multi_Page_Pdf.pdf",
            Layout::UsMultiPage => "Multi_Page_Pdf.pdf",
            Layout::NonMultiPage => "multi_Format_document.pdf",
            _ => "Notary_Format_document.pdf",
        }
    }
}

/// Everything extracted from one generation request
#[derive(Debug, Default)]
pub struct GenerateRequest {
    pub front_image: Option<Upload>,
    pub back_image: Option<Upload>,
    pub front_image2: Option<Upload>,
    pub back_image2: Option<Upload>,
    pub multi_page_pdf: Vec<Upload>,
    pub document_type: String,
    pub customer_name: String,
    pub qr_text: String,
    pub schedule_date: Option<String>,
    pub layout: Layout,
}

/// Finished document plus its download filename
#[derive(Debug)]
pub struct GeneratedPdf {
    pub bytes: Vec<u8>,
    pub filename: &'static str,
}

/// The four decoded document slots, width-capped and ready to draw
struct Slots {
    front: Option<PageImage>,
    back: Option<PageImage>,
    front2: Option<PageImage>,
    back2: Option<PageImage>,
}

impl Slots {
    fn decode(req: &GenerateRequest) -> Self {
        Self {
            front: decode_slot(req.front_image.as_ref()).map(cap),
            back: decode_slot(req.back_image.as_ref()).map(cap),
            front2: decode_slot(req.front_image2.as_ref()).map(cap),
            back2: decode_slot(req.back_image2.as_ref()).map(cap),
        }
    }
}

fn cap(image: PageImage) -> PageImage {
    downscale_to_width(image, MAX_IMAGE_WIDTH)
}

/// Compose the document for a request. `template_dir` holds the base
/// PDFs the OneNotary and UsMultiPage layouts stamp onto.
pub fn generate_document(req: &GenerateRequest, template_dir: &Path) -> Result<GeneratedPdf> {
    let slots = Slots::decode(req);
    let multi_page = prepare_multi_page(&req.multi_page_pdf)?;

    let bytes = match req.layout {
        Layout::OneNotary => one_notary(req, &slots, template_dir)?,
        Layout::Uk88 => uk88(req, &slots)?,
        Layout::Uk88MultiPage => uk88_multi_page(req, multi_page)?,
        Layout::UsMultiPage => us_multi_page(req, multi_page, template_dir)?,
        Layout::NonMultiPage => non_multi_page(req, multi_page)?,
        Layout::Standard => standard(req, &slots)?,
    };

    Ok(GeneratedPdf {
        bytes,
        filename: req.layout.filename(),
    })
}

/// Fixed certification text with the request's variable pieces spliced in
fn certification_paragraph(document_type: &str, customer_name: &str, date: &str) -> String {
    format!(
        "I, JOHN OLATUNJI OF ONE LONDON SQUARE, CROSS LANES, GUILDFORD, GU1 1UN, \
         A DULY AUTHORISED NOTARY PUBLIC OF ENGLAND AND WALES CERTIFY THAT THIS IS A TRUE COPY OF THE DOCUMENT \
         {document_type} OF {customer_name} PRODUCED TO ME THIS {date} \
         AND I FURTHER CERTIFY THAT THE INDIVIDUAL THAT APPEARED BEFORE ME VIA VIDEO CONFERENCE CALL IS INDEED \
         AND BEARS THE TRUE LIKENESS OF {customer_name}."
    )
}

/// Words drawn in bold: the document type, the customer name and the
/// formatted date, tokenized and uppercased
fn bold_words(document_type: &str, customer_name: &str, date: &str) -> Vec<String> {
    document_type
        .split_whitespace()
        .chain(customer_name.split_whitespace())
        .chain(date.split_whitespace())
        .map(|word| word.to_uppercase())
        .collect()
}

fn add_certification(overlay: &mut OverlayPage, req: &GenerateRequest, x: f64, y: f64) {
    let date = certificate_date(&parse_schedule_date(req.schedule_date.as_deref()));
    let paragraph = certification_paragraph(&req.document_type, &req.customer_name, &date);
    let bold = bold_words(&req.document_type, &req.customer_name, &date);
    overlay.draw_paragraph(x, y, &paragraph, PARAGRAPH_WRAP, PARAGRAPH_FONT_SIZE, &bold);
}

fn add_qr(overlay: &mut OverlayPage, qr_text: &str) -> Result<()> {
    let qr = render_qr(qr_text)?;
    overlay.draw_qr(&qr, QR_X, QR_Y, QR_SIZE);
    Ok(())
}

/// Best-effort template load; a missing or unreadable file means the
/// overlay ships alone
fn optional_template(path: &Path) -> Option<Document> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Template {} missing, using overlay alone: {}", path.display(), e);
            return None;
        }
    };
    match load_document(&bytes) {
        Ok(doc) => Some(doc),
        Err(e) => {
            warn!("Template {} unreadable, using overlay alone: {}", path.display(), e);
            None
        }
    }
}

fn required_template(path: &Path) -> Result<Document> {
    let bytes = std::fs::read(path).map_err(|_| Error::MissingTemplate(path.to_path_buf()))?;
    load_document(&bytes)
}

/// ONENOTARY: document type and images over the notary house template,
/// QR bottom-left
fn one_notary(req: &GenerateRequest, slots: &Slots, template_dir: &Path) -> Result<Vec<u8>> {
    let page = PageSize::a4();
    let mut overlay = OverlayPage::new(page);

    overlay.draw_text(200.0, 428.0, &req.document_type, Font::Helvetica, 12.0);

    // Keep clear of the template's header and footer text
    let band = Band::new(
        page.height - 160.0,
        PAGE_MARGIN + 60.0,
        page.width - 2.0 * PAGE_MARGIN,
    );
    match (&slots.front, &slots.back) {
        (Some(front), Some(back)) => {
            let width_each = (band.width - IMAGE_GAP) / 2.0;
            let (mut w1, mut h1) =
                fit_within(front.width(), front.height(), width_each, band.height());
            let (mut w2, mut h2) =
                fit_within(back.width(), back.height(), width_each, band.height());
            if h1.max(h2) > 230.0 {
                let refit_w = width_each.min(180.0);
                (w1, h1) = fit_within(front.width(), front.height(), refit_w, 220.0);
                (w2, h2) = fit_within(back.width(), back.height(), refit_w, 220.0);
            }

            let image_y = page.height - 250.0;
            let start_x = (page.width - (w1 + w2 + IMAGE_GAP)) / 2.0;
            overlay.draw_image_jpeg(front, start_x, image_y, w1, h1, SLOT_JPEG_QUALITY)?;
            overlay.draw_image_jpeg(
                back,
                start_x + w1 + IMAGE_GAP,
                image_y,
                w2,
                h2,
                SLOT_JPEG_QUALITY,
            )?;
        }
        (Some(image), None) | (None, Some(image)) => {
            let (mut w, mut h) =
                fit_within(image.width(), image.height(), band.width, band.height());
            if h > 230.0 {
                (w, h) = fit_within(image.width(), image.height(), band.width.min(380.0), 220.0);
            }
            overlay.draw_image_jpeg(
                image,
                (page.width - w) / 2.0,
                page.height - 250.0,
                w,
                h,
                SLOT_JPEG_QUALITY,
            )?;
        }
        (None, None) => {}
    }

    add_qr(&mut overlay, &req.qr_text)?;

    match optional_template(&template_dir.join(ONE_NOTARY_TEMPLATE)) {
        Some(mut base) => {
            stamp_overlay(&mut base, &overlay.build()?, 1)?;
            document_to_bytes(&mut base)
        }
        None => overlay.into_bytes(),
    }
}

/// UK88: images stacked near the top, certification paragraph and QR below
fn uk88(req: &GenerateRequest, slots: &Slots) -> Result<Vec<u8>> {
    let page = PageSize::a4();
    let mut overlay = OverlayPage::new(page);
    let max_w = page.width - 2.0 * PAGE_MARGIN;

    match (&slots.front, &slots.back) {
        (Some(front), Some(back)) => {
            let (mut w1, mut h1) =
                fit_within(front.width(), front.height(), max_w, page.height * 0.35);
            let (mut w2, mut h2) =
                fit_within(back.width(), back.height(), max_w, page.height * 0.35);
            if h1.max(h2) > 290.0 {
                let refit_w = max_w.min(400.0);
                (w1, h1) = fit_within(front.width(), front.height(), refit_w, 290.0);
                (w2, h2) = fit_within(back.width(), back.height(), refit_w, 290.0);
            }

            let top_y = page.height - h1 - 15.0;
            overlay.draw_image_jpeg(
                front,
                (page.width - w1) / 2.0,
                top_y,
                w1,
                h1,
                SLOT_JPEG_QUALITY,
            )?;
            let second_y = top_y - h2 - 25.0;
            overlay.draw_image_jpeg(
                back,
                (page.width - w2) / 2.0,
                second_y,
                w2,
                h2,
                SLOT_JPEG_QUALITY,
            )?;
        }
        (Some(front), None) => {
            let (mut w, mut h) =
                fit_within(front.width(), front.height(), max_w, page.height * 0.6);
            if h > 355.0 {
                (w, h) = fit_within(front.width(), front.height(), max_w.min(400.0), 355.0);
            }
            overlay.draw_image_jpeg(
                front,
                (page.width - w) / 2.0,
                page.height - PAGE_MARGIN - h,
                w,
                h,
                SLOT_JPEG_QUALITY,
            )?;
        }
        _ => {}
    }

    add_certification(&mut overlay, req, 50.0, 200.0);
    add_qr(&mut overlay, &req.qr_text)?;
    overlay.into_bytes()
}

/// UK88_MULTIPAGE: certification cover page, then the uploaded document,
/// recompressed as a whole
fn uk88_multi_page(req: &GenerateRequest, multi_page: Option<Vec<u8>>) -> Result<Vec<u8>> {
    let mut overlay = OverlayPage::new(PageSize::a4());
    add_certification(&mut overlay, req, 50.0, 800.0);
    add_qr(&mut overlay, &req.qr_text)?;

    let mut documents = vec![overlay.build()?];
    if let Some(bytes) = multi_page.filter(|bytes| !bytes.is_empty()) {
        documents.push(load_document(&bytes)?);
    }
    let mut merged = append_documents(documents)?;
    let merged_bytes = document_to_bytes(&mut merged)?;
    recompress_pdf(&merged_bytes)
}

/// us_multipage: document type stamped on the US template page, then the
/// uploaded document, recompressed as a whole. No QR on this layout.
fn us_multi_page(
    req: &GenerateRequest,
    multi_page: Option<Vec<u8>>,
    template_dir: &Path,
) -> Result<Vec<u8>> {
    let mut base = required_template(&template_dir.join(US_MULTI_PAGE_TEMPLATE))?;

    let mut overlay = OverlayPage::new(PageSize::a4());
    overlay.draw_text(205.0, 594.0, &req.document_type, Font::Helvetica, 12.0);
    stamp_overlay(&mut base, &overlay.build()?, 1)?;

    let mut documents = vec![base];
    if let Some(bytes) = multi_page.filter(|bytes| !bytes.is_empty()) {
        documents.push(load_document(&bytes)?);
    }
    let mut merged = append_documents(documents)?;
    let merged_bytes = document_to_bytes(&mut merged)?;
    recompress_pdf(&merged_bytes)
}

/// non_multipage: QR stamped onto the last page of the uploaded document
fn non_multi_page(req: &GenerateRequest, multi_page: Option<Vec<u8>>) -> Result<Vec<u8>> {
    let bytes = multi_page
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| {
            Error::InvalidInput("non_multipage requires a multi-page PDF upload".to_string())
        })?;
    let mut base = load_document(&bytes)?;
    let pages = page_count(&base)?;

    let mut overlay = OverlayPage::new(PageSize::a4());
    add_qr(&mut overlay, &req.qr_text)?;
    stamp_overlay(&mut base, &overlay.build()?, pages as u32)?;

    document_to_bytes(&mut base)
}

/// Standard: adaptive arrangement of however many slots arrived, QR
/// bottom-left
fn standard(req: &GenerateRequest, slots: &Slots) -> Result<Vec<u8>> {
    let page = PageSize::a4();
    let mut overlay = OverlayPage::new(page);
    let band = Band::new(
        page.height - PAGE_MARGIN,
        PAGE_MARGIN + 40.0,
        page.width - 2.0 * PAGE_MARGIN,
    );

    if let (Some(front), Some(back), Some(front2), Some(back2)) =
        (&slots.front, &slots.back, &slots.front2, &slots.back2)
    {
        // Four images: 2x2 grid, each centered in its cell
        let col_w = (band.width - IMAGE_GAP) / 2.0;
        let cell_h = (band.height() - IMAGE_GAP) / 2.0;

        let (w1, h1) = fit_within(front.width(), front.height(), col_w, cell_h);
        let (w2, h2) = fit_within(back.width(), back.height(), col_w, cell_h);
        let (w3, h3) = fit_within(front2.width(), front2.height(), col_w, cell_h);
        let (w4, h4) = fit_within(back2.width(), back2.height(), col_w, cell_h);

        let top_y = band.bottom + cell_h + IMAGE_GAP;
        let left_x = PAGE_MARGIN;
        let right_x = PAGE_MARGIN + col_w + IMAGE_GAP;

        overlay.draw_image_jpeg(
            front,
            left_x + (col_w - w1) / 2.0,
            top_y + (cell_h - h1) / 2.0,
            w1,
            h1,
            SLOT_JPEG_QUALITY,
        )?;
        overlay.draw_image_jpeg(
            back,
            right_x + (col_w - w2) / 2.0,
            top_y + (cell_h - h2) / 2.0,
            w2,
            h2,
            SLOT_JPEG_QUALITY,
        )?;
        overlay.draw_image_jpeg(
            front2,
            left_x + (col_w - w3) / 2.0,
            band.bottom + (cell_h - h3) / 2.0,
            w3,
            h3,
            SLOT_JPEG_QUALITY,
        )?;
        overlay.draw_image_jpeg(
            back2,
            right_x + (col_w - w4) / 2.0,
            band.bottom + (cell_h - h4) / 2.0,
            w4,
            h4,
            SLOT_JPEG_QUALITY,
        )?;
    } else if let (Some(front), Some(front2), Some(back2)) =
        (&slots.front, &slots.front2, &slots.back2)
    {
        // One wide on top, two side-by-side below
        let col_w = (band.width - IMAGE_GAP) / 2.0;
        let (w1, h1) = fit_within(front.width(), front.height(), band.width, band.height() * 0.55);
        let (w2, h2) =
            fit_within(front2.width(), front2.height(), col_w, band.height() * 0.4);
        let (w3, h3) = fit_within(back2.width(), back2.height(), col_w, band.height() * 0.4);
        let row_h = h2.max(h3);

        let top_y =
            band.bottom + (band.height() - (h1 + IMAGE_GAP + row_h)) / 2.0 + row_h;
        overlay.draw_image_jpeg(
            front,
            (page.width - w1) / 2.0,
            top_y,
            w1,
            h1,
            SLOT_JPEG_QUALITY,
        )?;

        let bottom_y = top_y - IMAGE_GAP - row_h;
        overlay.draw_image_jpeg(
            front2,
            PAGE_MARGIN,
            bottom_y + (row_h - h2) / 2.0,
            w2,
            h2,
            SLOT_JPEG_QUALITY,
        )?;
        overlay.draw_image_jpeg(
            back2,
            PAGE_MARGIN + col_w + IMAGE_GAP,
            bottom_y + (row_h - h3) / 2.0,
            w3,
            h3,
            SLOT_JPEG_QUALITY,
        )?;
    } else if let (Some(front), Some(back), Some(front2)) =
        (&slots.front, &slots.back, &slots.front2)
    {
        // Two side-by-side on top at fixed height, one centered below
        let col_w = (band.width - IMAGE_GAP) / 2.0;
        let (w1, h1) = fit_within(front.width(), front.height(), col_w, band.height() * 0.55);
        let (w2, h2) = fit_within(back.width(), back.height(), col_w, band.height() * 0.55);
        let (w3, h3) = fit_within(front2.width(), front2.height(), band.width, 255.0);

        overlay.draw_image_jpeg(front, 40.0, 550.0, w1, h1, SLOT_JPEG_QUALITY)?;
        overlay.draw_image_jpeg(back, w1 + 70.0, 550.0, w2, h2, SLOT_JPEG_QUALITY)?;
        overlay.draw_image_jpeg(
            front2,
            (page.width - w3) / 2.0,
            250.0,
            w3,
            h3,
            SLOT_JPEG_QUALITY,
        )?;
    } else if let (Some(front), Some(back)) = (&slots.front, &slots.back) {
        draw_stacked(&mut overlay, &band, page, front, back)?;
    } else if let (Some(front), Some(front2)) = (&slots.front, &slots.front2) {
        draw_stacked(&mut overlay, &band, page, front, front2)?;
    } else if let Some(front) = &slots.front {
        let (w, h) = fit_within(front.width(), front.height(), band.width, band.height());
        overlay.draw_image_jpeg(
            front,
            (page.width - w) / 2.0,
            band.bottom + (band.height() - h) / 2.0,
            w,
            h,
            SLOT_JPEG_QUALITY,
        )?;
    }

    add_qr(&mut overlay, &req.qr_text)?;
    overlay.into_bytes()
}

/// Two images stacked and vertically centered, scaled down together when
/// they overflow the band
fn draw_stacked(
    overlay: &mut OverlayPage,
    band: &Band,
    page: PageSize,
    top: &PageImage,
    bottom: &PageImage,
) -> Result<()> {
    let (mut w1, mut h1) = fit_within(top.width(), top.height(), band.width, band.height() * 0.6);
    let (mut w2, mut h2) =
        fit_within(bottom.width(), bottom.height(), band.width, band.height() * 0.6);

    let mut total = h1 + h2 + IMAGE_GAP;
    if total > band.height() {
        let scale = band.height() / total;
        w1 = (w1 * scale).round();
        h1 = (h1 * scale).round();
        w2 = (w2 * scale).round();
        h2 = (h2 * scale).round();
        total = h1 + h2 + IMAGE_GAP;
    }

    let start_y = band.bottom + (band.height() - total) / 2.0;
    overlay.draw_image_jpeg(
        top,
        (page.width - w1) / 2.0,
        start_y + h2 + IMAGE_GAP,
        w1,
        h1,
        SLOT_JPEG_QUALITY,
    )?;
    overlay.draw_image_jpeg(
        bottom,
        (page.width - w2) / 2.0,
        start_y,
        w2,
        h2,
        SLOT_JPEG_QUALITY,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::pdfium_available;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_upload(name: &str, width: u32, height: u32) -> Upload {
        let img = RgbImage::from_pixel(width, height, Rgb([40, 90, 160]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        Upload::new(name, bytes)
    }

    fn page_text(doc: &Document, page_number: u32) -> String {
        let pages = doc.get_pages();
        let page_id = pages[&page_number];
        String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned()
    }

    fn two_page_pdf() -> Vec<u8> {
        let mut first = OverlayPage::new(PageSize::a4());
        first.draw_text(100.0, 700.0, "page one", Font::Helvetica, 12.0);
        let mut second = OverlayPage::new(PageSize::a4());
        second.draw_text(100.0, 700.0, "page two", Font::Helvetica, 12.0);

        let mut merged =
            append_documents(vec![first.build().unwrap(), second.build().unwrap()]).unwrap();
        document_to_bytes(&mut merged).unwrap()
    }

    #[test]
    fn test_layout_parsing_is_case_sensitive() {
        assert_eq!(Layout::from_name("ONENOTARY"), Layout::OneNotary);
        assert_eq!(Layout::from_name("UK88"), Layout::Uk88);
        assert_eq!(Layout::from_name("UK88_MULTIPAGE"), Layout::Uk88MultiPage);
        assert_eq!(Layout::from_name("us_multipage"), Layout::UsMultiPage);
        assert_eq!(Layout::from_name("non_multipage"), Layout::NonMultiPage);
        assert_eq!(Layout::from_name("STANDARD"), Layout::Standard);
        // Unknown or wrong-case names fall back to the default arrangement
        assert_eq!(Layout::from_name("uk88"), Layout::Standard);
        assert_eq!(Layout::from_name(""), Layout::Standard);
    }

    #[test]
    fn test_layout_filenames() {
        assert_eq!(Layout::Standard.filename(), "Notary_Format_document.pdf");
        assert_eq!(Layout::OneNotary.filename(), "Notary_Format_document.pdf");
        assert_eq!(Layout::Uk88.filename(), "Notary_Format_document.pdf");
        assert_eq!(Layout::Uk88MultiPage.filename(), "UK88_Multi_Page_Pdf.pdf");
        assert_eq!(Layout::UsMultiPage.filename(), "Multi_Page_Pdf.pdf");
        assert_eq!(Layout::NonMultiPage.filename(), "multi_Format_document.pdf");
    }

    #[test]
    fn test_certification_paragraph_splices_fields() {
        let p = certification_paragraph("Passport", "John Smith", "6TH MARCH 2025");
        assert!(p.starts_with("I, JOHN OLATUNJI OF ONE LONDON SQUARE"));
        assert!(p.contains(
            "THE DOCUMENT Passport OF John Smith PRODUCED TO ME THIS 6TH MARCH 2025 AND"
        ));
        assert!(p.ends_with("THE TRUE LIKENESS OF John Smith."));
    }

    #[test]
    fn test_bold_words_cover_all_fields() {
        let words = bold_words("Drivers Licence", "John Smith", "6TH MARCH 2025");
        assert_eq!(
            words,
            vec!["DRIVERS", "LICENCE", "JOHN", "SMITH", "6TH", "MARCH", "2025"]
        );
    }

    #[test]
    fn test_bold_words_without_date() {
        let words = bold_words("Passport", "Ann", "");
        assert_eq!(words, vec!["PASSPORT", "ANN"]);
    }

    #[test]
    fn test_standard_no_images_is_qr_only() {
        let req = GenerateRequest {
            qr_text: "verify me".to_string(),
            ..Default::default()
        };
        let result = generate_document(&req, Path::new("/nonexistent")).unwrap();
        assert_eq!(result.filename, "Notary_Format_document.pdf");

        let doc = Document::load_mem(&result.bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        let content = page_text(&doc, 1);
        assert!(content.contains("/OvIm1 Do"));
        assert!(!content.contains("/OvIm2 Do"));
    }

    #[test]
    fn test_standard_single_image_draws_image_and_qr() {
        let req = GenerateRequest {
            front_image: Some(png_upload("front.png", 120, 80)),
            qr_text: "verify me".to_string(),
            ..Default::default()
        };
        let result = generate_document(&req, Path::new("/nonexistent")).unwrap();

        let doc = Document::load_mem(&result.bytes).unwrap();
        let content = page_text(&doc, 1);
        assert!(content.contains("/OvIm1 Do"));
        assert!(content.contains("/OvIm2 Do"));
    }

    #[test]
    fn test_standard_four_images_draws_grid_and_qr() {
        let req = GenerateRequest {
            front_image: Some(png_upload("a.png", 100, 60)),
            back_image: Some(png_upload("b.png", 100, 60)),
            front_image2: Some(png_upload("c.png", 60, 100)),
            back_image2: Some(png_upload("d.png", 60, 100)),
            qr_text: "verify me".to_string(),
            ..Default::default()
        };
        let result = generate_document(&req, Path::new("/nonexistent")).unwrap();

        let doc = Document::load_mem(&result.bytes).unwrap();
        let content = page_text(&doc, 1);
        for name in ["/OvIm1 Do", "/OvIm2 Do", "/OvIm3 Do", "/OvIm4 Do", "/OvIm5 Do"] {
            assert!(content.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn test_uk88_renders_certification_with_bold_fields() {
        let req = GenerateRequest {
            front_image: Some(png_upload("front.png", 120, 80)),
            document_type: "Passport".to_string(),
            customer_name: "John Smith".to_string(),
            qr_text: "verify me".to_string(),
            layout: Layout::Uk88,
            ..Default::default()
        };
        let result = generate_document(&req, Path::new("/nonexistent")).unwrap();

        let doc = Document::load_mem(&result.bytes).unwrap();
        let content = page_text(&doc, 1);
        // The spliced field keeps its case but switches to the bold face
        assert!(content.contains("(Passport ) Tj"));
        assert!(content.contains("/OvF2 10 Tf"));
        assert!(content.contains("(NOTARY ) Tj"));
    }

    #[test]
    fn test_one_notary_without_template_returns_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let req = GenerateRequest {
            front_image: Some(png_upload("front.png", 120, 80)),
            document_type: "Passport".to_string(),
            qr_text: "verify me".to_string(),
            layout: Layout::OneNotary,
            ..Default::default()
        };
        let result = generate_document(&req, dir.path()).unwrap();

        let doc = Document::load_mem(&result.bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        let content = page_text(&doc, 1);
        assert!(content.contains("1 0 0 1 200 428 Tm"));
        assert!(content.contains("(Passport)"));
    }

    #[test]
    fn test_one_notary_stamps_template_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let mut template = OverlayPage::new(PageSize::a4());
        template.draw_text(72.0, 780.0, "TEMPLATE HEADER", Font::Helvetica, 12.0);
        let mut template_doc = template.build().unwrap();
        template_doc.save(dir.path().join(ONE_NOTARY_TEMPLATE)).unwrap();

        let req = GenerateRequest {
            document_type: "Passport".to_string(),
            qr_text: "verify me".to_string(),
            layout: Layout::OneNotary,
            ..Default::default()
        };
        let result = generate_document(&req, dir.path()).unwrap();

        let doc = Document::load_mem(&result.bytes).unwrap();
        let content = page_text(&doc, 1);
        assert!(content.contains("(TEMPLATE HEADER)"));
        assert!(content.contains("(Passport)"));
    }

    #[test]
    fn test_us_multipage_missing_template_is_typed_error() {
        let dir = tempfile::tempdir().unwrap();
        let req = GenerateRequest {
            layout: Layout::UsMultiPage,
            ..Default::default()
        };
        let err = generate_document(&req, dir.path()).unwrap_err();
        assert!(matches!(err, Error::MissingTemplate(_)));
    }

    #[test]
    fn test_us_multipage_stamps_and_appends() {
        if !pdfium_available() {
            println!("SKIP test_us_multipage_stamps_and_appends: pdfium not installed");
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let mut template = OverlayPage::new(PageSize::a4());
        template.draw_text(72.0, 780.0, "US TEMPLATE", Font::Helvetica, 12.0);
        let mut template_doc = template.build().unwrap();
        template_doc
            .save(dir.path().join(US_MULTI_PAGE_TEMPLATE))
            .unwrap();

        let req = GenerateRequest {
            document_type: "Deed".to_string(),
            layout: Layout::UsMultiPage,
            multi_page_pdf: vec![Upload::new("pages.pdf", two_page_pdf())],
            ..Default::default()
        };
        let result = generate_document(&req, dir.path()).unwrap();
        assert_eq!(result.filename, "Multi_Page_Pdf.pdf");

        // Template page plus the two appended, all rasterized
        let doc = Document::load_mem(&result.bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_uk88_multipage_builds_cover_and_appends() {
        if !pdfium_available() {
            println!("SKIP test_uk88_multipage_builds_cover_and_appends: pdfium not installed");
            return;
        }

        let req = GenerateRequest {
            document_type: "Contract".to_string(),
            customer_name: "Jane Doe".to_string(),
            qr_text: "verify me".to_string(),
            layout: Layout::Uk88MultiPage,
            multi_page_pdf: vec![Upload::new("pages.pdf", two_page_pdf())],
            ..Default::default()
        };
        let result = generate_document(&req, Path::new("/nonexistent")).unwrap();
        assert_eq!(result.filename, "UK88_Multi_Page_Pdf.pdf");

        let doc = Document::load_mem(&result.bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_non_multipage_requires_upload() {
        let req = GenerateRequest {
            layout: Layout::NonMultiPage,
            ..Default::default()
        };
        let err = generate_document(&req, Path::new("/nonexistent")).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_non_multipage_stamps_only_last_page() {
        let req = GenerateRequest {
            qr_text: "verify me".to_string(),
            layout: Layout::NonMultiPage,
            multi_page_pdf: vec![Upload::new("scan.pdf", two_page_pdf())],
            ..Default::default()
        };
        let result = generate_document(&req, Path::new("/nonexistent")).unwrap();
        assert_eq!(result.filename, "multi_Format_document.pdf");

        let doc = Document::load_mem(&result.bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
        assert!(!page_text(&doc, 1).contains("/OvIm1 Do"));
        assert!(page_text(&doc, 2).contains("/OvIm1 Do"));
    }
}
