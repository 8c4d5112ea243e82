use std::time::Duration;

use image::DynamicImage;
use uuid::Uuid;

use crate::{Detection, Extent, NormalizedRect};

pub const DEFAULT_CONF_THRESHOLD: f32 = 0.4;

/// A detection that passed the confidence filter, tied to the image it came
/// from. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ClothingItem {
    id: Uuid,
    label: String,
    confidence: f32,
    bbox: NormalizedRect,
    image_size: Extent,
}

impl ClothingItem {
    pub fn from_detection(det: &Detection, image_size: Extent) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: det.label.clone(),
            confidence: det.confidence,
            bbox: det.bbox.clamp01(),
            image_size,
        }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn label(&self) -> &str { &self.label }
    pub fn confidence(&self) -> f32 { self.confidence }
    pub fn bbox(&self) -> NormalizedRect { self.bbox }
    pub fn image_size(&self) -> Extent { self.image_size }
}

#[derive(Debug, Clone, Copy)]
pub struct ImageProcessingRequest<'a> {
    pub image: &'a DynamicImage,
    pub confidence_threshold: f32,
}

impl<'a> ImageProcessingRequest<'a> {
    pub fn new(image: &'a DynamicImage) -> Self {
        Self { image, confidence_threshold: DEFAULT_CONF_THRESHOLD }
    }

    pub fn with_threshold(mut self, t: f32) -> Self {
        self.confidence_threshold = t;
        self
    }
}

#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub items: Vec<ClothingItem>,
    pub processing_time: Duration,
    pub image_size: Extent,
}
