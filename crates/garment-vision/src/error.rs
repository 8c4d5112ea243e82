use thiserror::Error;

/// Failure kinds surfaced by detection and cropping. Nothing here is retried
/// internally; the caller decides whether to run the pipeline again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GarmentError {
    #[error("Failed to load the clothing detection model")]
    ModelLoadingFailed,
    #[error("Failed to process the image")]
    ProcessingFailed,
    #[error("Detection failed: {0}")]
    DetectionFailed(String),
    #[error("Invalid image provided")]
    InvalidImage,
}

pub type GarmentResult<T> = Result<T, GarmentError>;
