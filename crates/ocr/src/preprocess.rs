use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image: {0}")]
    Load(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Longest side kept when shrinking an oversized upload.
const MAX_DIMENSION: u32 = 2800;
const START_QUALITY: u8 = 85;
const QUALITY_STEP: u8 = 10;
const MIN_QUALITY: u8 = 25;
/// Grey level above which a pixel turns white when binarizing.
const BINARIZE_THRESHOLD: u8 = 160;

/// Shrink the image at `path` in place until it fits in `max_size_bytes`.
///
/// Files already under the limit are not touched. Otherwise the image is
/// downscaled to [`MAX_DIMENSION`] and re-encoded as JPEG at falling quality
/// until it fits or the quality floor is reached; the last attempt is kept
/// either way.
pub fn compress(path: &Path, max_size_bytes: u64) -> Result<(), PreprocessError> {
    let size = std::fs::metadata(path)?.len();
    if size <= max_size_bytes {
        return Ok(());
    }

    // Sniff the content: the extension comes from the client and may lie.
    let img = image::ImageReader::open(path)?.with_guessed_format()?.decode()?;
    let img = if img.width() > MAX_DIMENSION || img.height() > MAX_DIMENSION {
        img.resize(MAX_DIMENSION, MAX_DIMENSION, image::imageops::FilterType::Lanczos3)
    } else {
        img
    };
    // JPEG has no alpha channel.
    let img = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut quality = START_QUALITY;
    let encoded = loop {
        let buf = encode_as_jpeg(&img, quality)?;
        if buf.len() as u64 <= max_size_bytes || quality <= MIN_QUALITY {
            break buf;
        }
        quality = quality.saturating_sub(QUALITY_STEP).max(MIN_QUALITY);
    };

    if encoded.len() as u64 > max_size_bytes {
        tracing::warn!(
            path = %path.display(),
            bytes = encoded.len(),
            limit = max_size_bytes,
            "Image still over size limit at minimum quality"
        );
    } else {
        tracing::debug!(from = size, to = encoded.len(), quality, "Image compressed");
    }

    std::fs::write(path, encoded)?;
    Ok(())
}

/// Process raw image bytes (JPEG / PNG / WEBP / …) and return black-and-white
/// PNG bytes ready for a local OCR engine.
pub fn prepare_for_ocr_from_bytes(data: &[u8]) -> Result<Vec<u8>, PreprocessError> {
    let img = image::load_from_memory(data)?;
    encode_as_png(binarize(normalize(img)))
}

/// Grayscale + contrast stretch.
fn normalize(img: DynamicImage) -> DynamicImage {
    let img = if img.width() > MAX_DIMENSION || img.height() > MAX_DIMENSION {
        img.resize(MAX_DIMENSION, MAX_DIMENSION, image::imageops::FilterType::Lanczos3)
    } else {
        img
    };

    let gray: GrayImage = img.to_luma8();

    let (min_px, max_px) = gray
        .pixels()
        .fold((255u8, 0u8), |(mn, mx), p| (mn.min(p[0]), mx.max(p[0])));

    if max_px == min_px {
        // Uniform image, nothing to stretch.
        return DynamicImage::ImageLuma8(gray);
    }

    let range = (max_px - min_px) as u32;
    let stretched: GrayImage = ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        let p = gray.get_pixel(x, y)[0];
        let v = ((p - min_px) as u32 * 255 / range) as u8;
        Luma([v])
    });

    DynamicImage::ImageLuma8(stretched)
}

fn binarize(img: DynamicImage) -> DynamicImage {
    let mut gray = img.to_luma8();
    for p in gray.pixels_mut() {
        p[0] = if p[0] > BINARIZE_THRESHOLD { 255 } else { 0 };
    }
    DynamicImage::ImageLuma8(gray)
}

fn encode_as_png(img: DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}

fn encode_as_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    img.write_with_encoder(encoder)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}
