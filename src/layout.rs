//! Page layout calculations
//!
//! All placement arithmetic works in PDF points (1/72 inch) with the
//! origin at the bottom-left of the page, matching the coordinate space
//! of the generated content streams.

/// Convert millimeters to points
pub fn mm_to_pt(mm: f64) -> f64 {
    mm * 72.0 / 25.4
}

/// Standard page margin in points
pub const PAGE_MARGIN: f64 = 50.0;

/// Gap between adjacent images in points
pub const IMAGE_GAP: f64 = 20.0;

/// Smallest width an image is ever drawn at
pub const MIN_IMAGE_WIDTH: f64 = 50.0;

/// Smallest height an image is ever drawn at
pub const MIN_IMAGE_HEIGHT: f64 = 50.0;

/// Page dimensions in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// A4 portrait (210mm × 297mm)
    pub fn a4() -> Self {
        Self {
            width: mm_to_pt(210.0),
            height: mm_to_pt(297.0),
        }
    }
}

/// Fit an image into a bounding box, preserving its aspect ratio.
///
/// Images are never upscaled past their pixel dimensions, and never shrink
/// below a 50×50 pt floor so small uploads stay legible. Returns the drawn
/// size rounded to whole points.
pub fn fit_within(orig_w: u32, orig_h: u32, max_w: f64, max_h: f64) -> (f64, f64) {
    if orig_w == 0 || orig_h == 0 {
        return (MIN_IMAGE_WIDTH, MIN_IMAGE_HEIGHT);
    }

    let aspect_ratio = orig_w as f64 / orig_h as f64;
    let mut width;
    let mut height;

    if aspect_ratio >= 1.0 {
        // Landscape: constrain by width first
        width = max_w.min(orig_w as f64);
        height = width / aspect_ratio;
        if height > max_h {
            height = max_h;
            width = height * aspect_ratio;
        }
    } else {
        // Portrait: constrain by height first
        height = max_h.min(orig_h as f64);
        width = height * aspect_ratio;
        if width > max_w {
            width = max_w;
            height = width / aspect_ratio;
        }
    }

    if width < MIN_IMAGE_WIDTH {
        width = MIN_IMAGE_WIDTH;
        height = (width / aspect_ratio.max(0.0001)).max(MIN_IMAGE_HEIGHT);
    }
    if height < MIN_IMAGE_HEIGHT {
        height = MIN_IMAGE_HEIGHT;
        width = (height * aspect_ratio).max(MIN_IMAGE_WIDTH);
    }

    (width.round(), height.round())
}

/// Scale and center an image on a full page.
///
/// Returns `(x, y, width, height)` for the largest placement that fits the
/// page while preserving aspect ratio, centered both ways.
pub fn fit_to_page(page: PageSize, img_w: u32, img_h: u32) -> (f64, f64, f64, f64) {
    if img_w == 0 || img_h == 0 {
        return (0.0, 0.0, page.width, page.height);
    }
    let ratio = (page.width / img_w as f64).min(page.height / img_h as f64);
    let width = img_w as f64 * ratio;
    let height = img_h as f64 * ratio;
    let x = (page.width - width) / 2.0;
    let y = (page.height - height) / 2.0;
    (x, y, width, height)
}

/// Vertical region of a page available for image placement
#[derive(Debug, Clone, Copy)]
pub struct Band {
    pub top: f64,
    pub bottom: f64,
    pub width: f64,
}

impl Band {
    pub fn new(top: f64, bottom: f64, width: f64) -> Self {
        Self { top, bottom, width }
    }

    /// Usable height, clamped to at least 100 pt
    pub fn height(&self) -> f64 {
        (self.top - self.bottom).max(100.0)
    }
}
