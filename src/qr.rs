//! QR code rendering

use image::{DynamicImage, Luma, RgbImage};
use qrcode::{EcLevel, QrCode, Version};

use crate::error::{Error, Result};

/// Pixel edge length QR codes are rendered at before page placement
const RENDER_SIZE: u32 = 280;

/// Render QR payload text as a black-on-white RGB raster.
///
/// Codes are generated at version 5 with error-correction level M; a
/// payload too large for version 5 falls back to the smallest version
/// that fits it. The quiet zone is included.
pub fn render_qr(data: &str) -> Result<RgbImage> {
    let code = match QrCode::with_version(data, Version::Normal(5), EcLevel::M) {
        Ok(code) => code,
        Err(_) => QrCode::with_error_correction_level(data, EcLevel::M)
            .map_err(|e| Error::QrCode(e.to_string()))?,
    };

    let luma = code
        .render::<Luma<u8>>()
        .quiet_zone(true)
        .min_dimensions(RENDER_SIZE, RENDER_SIZE)
        .build();

    Ok(DynamicImage::ImageLuma8(luma).to_rgb8())
}
