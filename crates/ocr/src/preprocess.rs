use image::{DynamicImage, GrayImage, ImageFormat};
use std::io::Cursor;
use thiserror::Error;

/// Longest edge kept before recognition; Tesseract does best around 300 DPI.
pub const MAX_OCR_DIMENSION: u32 = 2800;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

/// Decode any supported image (JPEG / PNG / WEBP / …), normalize it for OCR,
/// and return PNG bytes.
pub fn prepare_for_ocr_from_bytes(data: &[u8]) -> Result<Vec<u8>, PreprocessError> {
    let img = image::load_from_memory(data)?;
    encode_png(&DynamicImage::ImageLuma8(normalize(img)))
}

/// Down-scale oversized photos, convert to grayscale, and stretch contrast so
/// the darkest pixel maps to 0 and the brightest to 255.
fn normalize(img: DynamicImage) -> GrayImage {
    let img = if img.width() > MAX_OCR_DIMENSION || img.height() > MAX_OCR_DIMENSION {
        img.resize(MAX_OCR_DIMENSION, MAX_OCR_DIMENSION, image::imageops::FilterType::Triangle)
    } else {
        img
    };

    let mut gray = img.to_luma8();
    let (lo, hi) = gray
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));

    if hi > lo {
        let span = u32::from(hi - lo);
        for p in gray.pixels_mut() {
            p[0] = (u32::from(p[0] - lo) * 255 / span) as u8;
        }
    }
    gray
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}
