use garment_vision::{ClothingItem, DetectionResult, GarmentError, GarmentResult};
use tracing::warn;

/// What the presentation layer should be showing.
///
/// Transitions consume the old value and return the next one:
/// `Idle -> Loading -> Loaded | Error`, with `Loading` reachable again from
/// any state for a new or retried detection.
#[derive(Debug, Clone, Default)]
pub enum ViewState {
    #[default]
    Idle,
    Loading,
    Loaded(DetectionResult),
    Error(GarmentError),
}

impl ViewState {
    pub fn begin_loading(self) -> Self {
        ViewState::Loading
    }

    /// Settle a pending detection. A result arriving while not loading is
    /// stale and dropped.
    pub fn finish(self, outcome: GarmentResult<DetectionResult>) -> Self {
        match self {
            ViewState::Loading => match outcome {
                Ok(res) => ViewState::Loaded(res),
                Err(e) => ViewState::Error(e),
            },
            other => {
                warn!("state: dropping detection result, not loading (state={})", other.name());
                other
            }
        }
    }

    pub fn fail(self, e: GarmentError) -> Self {
        ViewState::Error(e)
    }

    pub fn reset(self) -> Self {
        ViewState::Idle
    }

    pub fn items(&self) -> &[ClothingItem] {
        match self {
            ViewState::Loaded(res) => &res.items,
            _ => &[],
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn error_message(&self) -> Option<String> {
        match self {
            ViewState::Error(e) => Some(e.to_string()),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ViewState::Idle => "idle",
            ViewState::Loading => "loading",
            ViewState::Loaded(_) => "loaded",
            ViewState::Error(_) => "error",
        }
    }
}
