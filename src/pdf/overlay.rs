//! Overlay page construction
//!
//! Builds the transient A4 page that carries drawn content (document type
//! text, the certification paragraph, photographs and the QR code) as a
//! lopdf content stream. The finished page is either returned alone or
//! stamped onto a template page by the merge module.

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

use crate::error::Result;
use crate::layout::PageSize;

/// The two standard fonts the overlay text uses
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Font {
    Helvetica,
    HelveticaBold,
}

impl Font {
    // Names are prefixed so stamping cannot clobber a template's own
    // /F1-style resources
    fn resource_name(&self) -> &'static str {
        match self {
            Font::Helvetica => "OvF1",
            Font::HelveticaBold => "OvF2",
        }
    }

    fn base_font(&self) -> &'static str {
        match self {
            Font::Helvetica => "Helvetica",
            Font::HelveticaBold => "Helvetica-Bold",
        }
    }
}

/// A single page being drawn, assembled into a one-page document on build
pub struct OverlayPage {
    page: PageSize,
    ops: String,
    xobjects: Vec<(String, Stream)>,
}

impl OverlayPage {
    pub fn new(page: PageSize) -> Self {
        Self {
            page,
            ops: String::new(),
            xobjects: Vec::new(),
        }
    }

    /// Draw a single line of text with its baseline at `(x, y)`
    pub fn draw_text(&mut self, x: f64, y: f64, text: &str, font: Font, size: f64) {
        self.ops.push_str("BT\n");
        self.ops
            .push_str(&format!("/{} {} Tf\n", font.resource_name(), size));
        self.ops.push_str(&format!("1 0 0 1 {} {} Tm\n", x, y));
        self.ops
            .push_str(&format!("({}) Tj\n", escape_pdf_string(text)));
        self.ops.push_str("ET\n");
    }

    /// Draw a paragraph wrapped at `wrap_width` characters, emboldening
    /// listed words.
    ///
    /// A word is bold when its uppercased form, stripped of leading and
    /// trailing `,`/`.`, appears in `bold_words`. Lines step down by
    /// `font_size * 1.2`.
    pub fn draw_paragraph(
        &mut self,
        x: f64,
        y: f64,
        paragraph: &str,
        wrap_width: usize,
        font_size: f64,
        bold_words: &[String],
    ) {
        let line_height = font_size * 1.2;
        let mut cursor_y = y;

        for line in wrap_text(paragraph, wrap_width) {
            let mut cursor_x = x;
            for word in line.split(' ') {
                let bare = word
                    .trim_matches(|ch| ch == ',' || ch == '.')
                    .to_uppercase();
                let font = if bold_words.contains(&bare) {
                    Font::HelveticaBold
                } else {
                    Font::Helvetica
                };

                let chunk = format!("{} ", word);
                self.draw_text(cursor_x, cursor_y, &chunk, font, font_size);
                cursor_x += estimate_text_width(&chunk, font_size);
            }
            cursor_y -= line_height;
        }
    }

    /// Draw an image as a JPEG XObject at the given quality
    pub fn draw_image_jpeg(
        &mut self,
        image: &RgbImage,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        quality: u8,
    ) -> Result<()> {
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, quality).encode_image(image)?;

        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width() as i64,
                "Height" => image.height() as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        );
        self.place_image(stream, x, y, width, height);
        Ok(())
    }

    /// Draw an image as a raw RGB XObject.
    ///
    /// No DCT filter means no ringing artifacts; document compression
    /// flate-encodes the samples on save. Used for QR codes, which need
    /// their edges sharp.
    pub fn draw_image_lossless(
        &mut self,
        image: &RgbImage,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) {
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width() as i64,
                "Height" => image.height() as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            image.as_raw().clone(),
        );
        self.place_image(stream, x, y, width, height);
    }

    /// Place a QR raster at `(x, y)` scaled to `size` points square
    pub fn draw_qr(&mut self, qr: &RgbImage, x: f64, y: f64, size: f64) {
        self.draw_image_lossless(qr, x, y, size, size);
    }

    fn place_image(&mut self, stream: Stream, x: f64, y: f64, width: f64, height: f64) {
        let name = format!("OvIm{}", self.xobjects.len() + 1);
        self.ops.push_str(&format!(
            "q\n{} 0 0 {} {} {} cm\n/{} Do\nQ\n",
            width, height, x, y, name
        ));
        self.xobjects.push((name, stream));
    }

    /// Assemble the drawn page into a one-page document
    pub fn build(self) -> Result<Document> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut fonts = Dictionary::new();
        for font in [Font::Helvetica, Font::HelveticaBold] {
            let font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_font(),
            });
            fonts.set(font.resource_name(), Object::Reference(font_id));
        }

        let has_images = !self.xobjects.is_empty();
        let mut xobjects = Dictionary::new();
        for (name, stream) in self.xobjects {
            let id = doc.add_object(Object::Stream(stream));
            xobjects.set(name, Object::Reference(id));
        }

        let mut resources = Dictionary::new();
        resources.set("Font", Object::Dictionary(fonts));
        if has_images {
            resources.set("XObject", Object::Dictionary(xobjects));
        }
        let resources_id = doc.add_object(Object::Dictionary(resources));

        let content_id = doc.add_object(Stream::new(Dictionary::new(), self.ops.into_bytes()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(self.page.width as f32),
                Object::Real(self.page.height as f32),
            ],
            "Contents" => content_id,
            "Resources" => resources_id,
        });

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        Ok(doc)
    }

    /// Build, compress and serialize the page
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        let mut doc = self.build()?;
        super::document_to_bytes(&mut doc)
    }
}

/// Greedy word wrap at a character-count width
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.len() + 1 + word.len() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Escape special characters in PDF strings
fn escape_pdf_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
        .replace('\r', "\\r")
        .replace('\n', "\\n")
}

/// Estimate drawn text width from an average glyph width of 0.48 em
fn estimate_text_width(text: &str, font_size: f64) -> f64 {
    text.len() as f64 * font_size * 0.48
}
