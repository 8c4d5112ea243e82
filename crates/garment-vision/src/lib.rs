pub mod crop;
pub mod detector;
pub mod doctor;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod item;
pub mod prepare;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

pub use error::{GarmentError, GarmentResult};
pub use geometry::{Extent, NormalizedRect, PixelRect};
pub use item::{ClothingItem, DetectionResult, ImageProcessingRequest};

/// Raw output of one inference step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(default = "unknown_label")]
    pub label: String,
    pub confidence: f32,
    // normalized 0..1, origin bottom-left
    pub bbox: NormalizedRect,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: NormalizedRect) -> Self {
        Self { label: label.into(), confidence, bbox }
    }
}

fn unknown_label() -> String {
    "Unknown".to_string()
}

/// Opaque inference step. Implementations may be slow; callers keep them off
/// latency-sensitive paths.
pub trait Detector: Send + Sync {
    fn detect(&self, image: &DynamicImage) -> GarmentResult<Vec<Detection>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_label_deserializes_as_unknown() {
        let det: Detection =
            serde_json::from_str(r#"{"confidence":0.7,"bbox":{"x":0.1,"y":0.2,"w":0.3,"h":0.4}}"#).unwrap();
        assert_eq!(det.label, "Unknown");
        assert_eq!(det.bbox, NormalizedRect::new(0.1, 0.2, 0.3, 0.4));
    }
}
