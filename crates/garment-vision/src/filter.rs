use std::time::Instant;

use tracing::debug;

use crate::{
    ClothingItem, Detection, DetectionResult, Detector, Extent, GarmentError, GarmentResult, ImageProcessingRequest,
};

/// Keep detections scoring strictly above `threshold`, in input order.
/// NaN scores never pass.
pub fn retain_confident(dets: &[Detection], threshold: f32) -> Vec<Detection> {
    dets.iter().filter(|d| d.confidence > threshold).cloned().collect()
}

pub fn to_items(dets: &[Detection], image_size: Extent) -> Vec<ClothingItem> {
    dets.iter().map(|d| ClothingItem::from_detection(d, image_size)).collect()
}

/// Threshold then map; each item gets a fresh id.
pub fn filter_detections(dets: &[Detection], threshold: f32, image_size: Extent) -> Vec<ClothingItem> {
    to_items(&retain_confident(dets, threshold), image_size)
}

/// Run the detector on the request image and keep what clears the threshold.
/// Detector errors pass through untouched.
pub fn detect_clothing<D: Detector + ?Sized>(
    detector: &D,
    request: &ImageProcessingRequest<'_>,
) -> GarmentResult<DetectionResult> {
    let t = request.confidence_threshold;
    if !(0.0..=1.0).contains(&t) {
        return Err(GarmentError::DetectionFailed(format!("confidence threshold {} outside 0..1", t)));
    }

    let started = Instant::now();
    let image_size = Extent::of_image(request.image);
    let raw = detector.detect(request.image)?;
    let items = filter_detections(&raw, request.confidence_threshold, image_size);
    let processing_time = started.elapsed();

    debug!(
        "detect: raw={} kept={} threshold={} took={:?}",
        raw.len(),
        items.len(),
        request.confidence_threshold,
        processing_time
    );
    Ok(DetectionResult { items, processing_time, image_size })
}
