use image::{imageops::FilterType, DynamicImage, GenericImageView};
use tracing::debug;

use crate::{GarmentError, GarmentResult};

pub const DEFAULT_MAX_DIMENSION: u32 = 640;

pub fn decode_image(bytes: &[u8]) -> GarmentResult<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| {
        debug!("prepare: decode failed: {}", e);
        GarmentError::InvalidImage
    })
}

/// Shrink so the longer side is at most `max_dimension`, keeping aspect.
/// Never upscales.
pub fn downscale(img: &DynamicImage, max_dimension: u32) -> DynamicImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return img.clone();
    }
    let max = max_dimension as f64;
    let scale = (max / w as f64).min(max / h as f64).min(1.0);
    if scale >= 1.0 {
        return img.clone();
    }
    let nw = ((w as f64 * scale).round() as u32).max(1);
    let nh = ((h as f64 * scale).round() as u32).max(1);
    debug!("prepare: downscale {}x{} -> {}x{}", w, h, nw, nh);
    img.resize_exact(nw, nh, FilterType::Triangle)
}

/// Decode then downscale, the way a freshly picked photo is readied for detection.
pub fn load_for_detection(bytes: &[u8], max_dimension: u32) -> GarmentResult<DynamicImage> {
    let img = decode_image(bytes)?;
    Ok(downscale(&img, max_dimension))
}
