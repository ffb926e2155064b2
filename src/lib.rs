//! Notary PDF Library
//!
//! Generates notarized documents: customer images, certification text and
//! QR codes composed onto A4 pages, optionally stamped over PDF templates,
//! with multi-page appending and size-aware recompression. This library
//! provides functionality to:
//! - Decode uploaded images and PDFs into a common raster form
//! - Arrange document images per named layout variant
//! - Stamp overlays onto template pages and append multi-page documents
//! - Recompress oversized results by rasterizing at a lower resolution
//! - Serve the pipeline over HTTP as a multipart endpoint
//!
//! # Example
//!
//! ```no_run
//! use notary_pdf::generate::{generate_document, GenerateRequest, Layout};
//! use notary_pdf::input::Upload;
//! use std::path::Path;
//!
//! let request = GenerateRequest {
//!     front_image: Some(Upload::new("passport.jpg", std::fs::read("passport.jpg")?)),
//!     document_type: "Passport".to_string(),
//!     customer_name: "Jane Doe".to_string(),
//!     qr_text: "https://example.com/verify/123".to_string(),
//!     layout: Layout::Standard,
//!     ..Default::default()
//! };
//!
//! let generated = generate_document(&request, Path::new("templates"))?;
//! std::fs::write(generated.filename, &generated.bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod api;
pub mod date;
pub mod error;
pub mod generate;
pub mod input;
pub mod layout;
pub mod pdf;
pub mod qr;

// Re-export commonly used items
pub use error::{Error, Result};
pub use generate::{generate_document, GeneratedPdf, GenerateRequest, Layout};
