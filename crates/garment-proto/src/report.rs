use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRecord {
    pub index: usize,
    pub id: Uuid,
    pub label: String,
    pub confidence: f32,
    // normalized, origin bottom-left
    pub bbox: Rect,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    pub ts_unix_ms: i64,
    pub image: String,
    pub image_width: u32,
    pub image_height: u32,
    pub confidence_threshold: f32,
    pub processing_ms: u64,
    pub items: Vec<ItemRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropRecord {
    pub item_id: Uuid,
    pub label: String,
    // pixels, origin top-left, clamped to the image
    pub rect: Rect,
    pub width: u32,
    pub height: u32,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureRecord {
    pub index: usize,
    pub item_id: Uuid,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropReport {
    pub ts_unix_ms: i64,
    pub image: String,
    /// "best-effort" or "all-or-nothing"
    pub policy: String,
    pub requested: usize,
    pub cropped: Vec<CropRecord>,
    pub failures: Vec<FailureRecord>,
}
