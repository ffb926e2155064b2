//! Error types for the notary PDF library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the notary PDF library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Request is missing or misuses an input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Layout template file is missing or unreadable
    #[error("Template not found: {}", .0.display())]
    MissingTemplate(PathBuf),

    /// Invalid PDF (no pages)
    #[error("PDF has no pages")]
    EmptyPdf,

    /// PDF rasterization error
    #[error("Rasterization error: {0}")]
    Raster(String),

    /// QR code generation error
    #[error("QR code error: {0}")]
    QrCode(String),

    /// General error
    #[error("{0}")]
    General(String),
}
