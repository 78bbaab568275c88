//! Publish-time image preparation.
//!
//! Camera uploads are small JPEGs. Before posting they are scaled to a fixed
//! width with nearest-neighbour sampling, keeping the blocky pixel look
//! instead of smearing it, and re-encoded as JPEG.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ImageFormat, RgbImage};

use crate::error::ImageError;

/// Width uploads are scaled to before publishing.
pub const DEFAULT_PUBLISH_WIDTH: u32 = 1280;

const JPEG_QUALITY: u8 = 75;

/// Longest side a baseline JPEG can hold.
pub const MAX_DIMENSION: u32 = 65_535;

/// Largest output image, in pixels.
pub const MAX_OUTPUT_PIXELS: u64 = 40_000_000;

/// Scale a JPEG to `width` pixels wide, keeping its aspect ratio.
///
/// The target size is checked before any pixel buffer is allocated; an
/// output over [`MAX_DIMENSION`] on either side or over
/// [`MAX_OUTPUT_PIXELS`] in total is rejected as [`ImageError::TooLarge`].
pub fn upscale(data: &[u8], width: u32) -> Result<Vec<u8>, ImageError> {
    let img = image::load_from_memory_with_format(data, ImageFormat::Jpeg)
        .map_err(|e| ImageError::Decode(e.to_string()))?;

    let height = scaled_height(img.width(), img.height(), width);
    check_output_size(width, height)?;
    let resized: RgbImage = img
        .resize_exact(width, height, FilterType::Nearest)
        .to_rgb8();

    encode_jpeg(&resized)
}

/// Run [`upscale`] off the async runtime. A width of 0 returns the input
/// unchanged.
pub async fn prepare(data: Bytes, width: u32) -> Result<Bytes, ImageError> {
    if width == 0 {
        return Ok(data);
    }
    tokio::task::spawn_blocking(move || upscale(&data, width))
        .await
        .map_err(|e| ImageError::Worker(e.to_string()))?
        .map(Bytes::from)
}

pub(crate) fn encode_jpeg(img: &RgbImage) -> Result<Vec<u8>, ImageError> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode_image(img)
        .map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(out)
}

fn check_output_size(width: u32, height: u32) -> Result<(), ImageError> {
    let pixels = u64::from(width) * u64::from(height);
    if width > MAX_DIMENSION || height > MAX_DIMENSION || pixels > MAX_OUTPUT_PIXELS {
        return Err(ImageError::TooLarge { width, height });
    }
    Ok(())
}

fn scaled_height(src_width: u32, src_height: u32, width: u32) -> u32 {
    if src_width == 0 {
        return 1;
    }
    let scaled = (u64::from(src_height) * u64::from(width) + u64::from(src_width) / 2)
        / u64::from(src_width);
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}
