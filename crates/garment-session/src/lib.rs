pub mod state;

use garment_vision::crop::{crop_batch, BatchPolicy, CropFailure, CropRequest, CroppedImage, Cropper, DEFAULT_PADDING};
use garment_vision::filter::detect_clothing;
use garment_vision::item::DEFAULT_CONF_THRESHOLD;
use garment_vision::prepare::{decode_image, downscale, DEFAULT_MAX_DIMENSION};
use garment_vision::{ClothingItem, Detector, GarmentResult, ImageProcessingRequest};
use image::DynamicImage;
use tracing::{info, warn};
use uuid::Uuid;

pub use state::ViewState;

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub confidence_threshold: f32,
    pub padding: f64,
    pub max_dimension: u32,
    pub batch_policy: BatchPolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONF_THRESHOLD,
            padding: DEFAULT_PADDING,
            max_dimension: DEFAULT_MAX_DIMENSION,
            batch_policy: BatchPolicy::default(),
        }
    }
}

/// Result of cropping every detected item.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub policy: BatchPolicy,
    pub requested: usize,
    pub added: Vec<Uuid>,
    pub failures: Vec<CropFailure>,
}

/// One user's detect-and-crop workflow over a single selected photo.
///
/// The detector and cropper are handed in once at construction; every user
/// intent is a direct method call that moves `state` forward.
pub struct Session<D, C> {
    detector: D,
    cropper: C,
    settings: SessionSettings,

    state: ViewState,
    image: Option<DynamicImage>,
    selected: Option<ClothingItem>,
    cropped: Vec<CroppedImage>,
}

impl<D: Detector, C: Cropper> Session<D, C> {
    pub fn new(detector: D, cropper: C, settings: SessionSettings) -> Self {
        Self {
            detector,
            cropper,
            settings,
            state: ViewState::Idle,
            image: None,
            selected: None,
            cropped: Vec::new(),
        }
    }

    pub fn settings(&self) -> &SessionSettings { &self.settings }
    pub fn state(&self) -> &ViewState { &self.state }
    pub fn image(&self) -> Option<&DynamicImage> { self.image.as_ref() }
    pub fn items(&self) -> &[ClothingItem] { self.state.items() }
    pub fn selected_item(&self) -> Option<&ClothingItem> { self.selected.as_ref() }
    pub fn cropped_images(&self) -> &[CroppedImage] { &self.cropped }

    /// Decode a picked photo, then hand it to [`Session::select_image`].
    pub fn select_image_bytes(&mut self, bytes: &[u8]) -> &ViewState {
        match decode_image(bytes) {
            Ok(img) => self.select_image(img),
            Err(e) => {
                self.image = None;
                self.selected = None;
                self.transition(|s| s.fail(e));
                &self.state
            }
        }
    }

    /// Downscale, keep the image, and run detection on it.
    pub fn select_image(&mut self, img: DynamicImage) -> &ViewState {
        self.image = Some(downscale(&img, self.settings.max_dimension));
        self.selected = None;
        self.run_detection()
    }

    /// Detect again on the held image. No-op without one.
    pub fn retry_detection(&mut self) -> &ViewState {
        if self.image.is_none() {
            return &self.state;
        }
        self.run_detection()
    }

    fn run_detection(&mut self) -> &ViewState {
        self.transition(ViewState::begin_loading);
        let outcome = match self.image.as_ref() {
            Some(img) => {
                let req = ImageProcessingRequest::new(img).with_threshold(self.settings.confidence_threshold);
                detect_clothing(&self.detector, &req)
            }
            None => return &self.state,
        };
        match &outcome {
            Ok(res) => info!("session: {} items in {:?}", res.items.len(), res.processing_time),
            Err(e) => warn!("session: detection failed: {}", e),
        }
        self.transition(|s| s.finish(outcome));
        &self.state
    }

    /// Mark one of the current items as the crop target.
    pub fn select_item(&mut self, id: Uuid) -> bool {
        self.selected = self.items().iter().find(|i| i.id() == id).cloned();
        self.selected.is_some()
    }

    /// Crop the selected item. `Ok(None)` when there is no image or selection.
    /// A failure moves the session into the error state.
    pub fn crop_selected(&mut self) -> GarmentResult<Option<Uuid>> {
        let (Some(img), Some(item)) = (self.image.as_ref(), self.selected.as_ref()) else {
            return Ok(None);
        };
        let req = CropRequest::new(img, item).with_padding(self.settings.padding);
        match self.cropper.crop(&req) {
            Ok(c) => {
                let id = c.id();
                self.cropped.push(c);
                self.selected = None;
                Ok(Some(id))
            }
            Err(e) => {
                self.transition(|s| s.fail(e.clone()));
                Err(e)
            }
        }
    }

    /// Crop every detected item under the configured batch policy.
    pub fn crop_all(&mut self) -> GarmentResult<BatchReport> {
        let policy = self.settings.batch_policy;
        let Some(img) = self.image.as_ref() else {
            return Ok(BatchReport { policy, requested: 0, added: vec![], failures: vec![] });
        };
        let items = self.state.items();
        let reqs: Vec<_> = items
            .iter()
            .map(|i| CropRequest::new(img, i).with_padding(self.settings.padding))
            .collect();
        let requested = reqs.len();

        match crop_batch(&self.cropper, &reqs, policy) {
            Ok(outcome) => {
                let added = outcome.cropped.iter().map(|c| c.id()).collect();
                self.cropped.extend(outcome.cropped);
                if !outcome.failures.is_empty() {
                    warn!("session: {} of {} crops failed ({:?})", outcome.failures.len(), requested, policy);
                }
                Ok(BatchReport { policy, requested, added, failures: outcome.failures })
            }
            Err(e) => {
                self.transition(|s| s.fail(e.clone()));
                Err(e)
            }
        }
    }

    pub fn remove_cropped(&mut self, id: Uuid) -> bool {
        let before = self.cropped.len();
        self.cropped.retain(|c| c.id() != id);
        self.cropped.len() != before
    }

    pub fn clear_cropped(&mut self) {
        self.cropped.clear();
    }

    /// Back to a fresh session: no image, no results, no crops.
    pub fn clear_results(&mut self) {
        self.transition(ViewState::reset);
        self.image = None;
        self.selected = None;
        self.cropped.clear();
    }

    fn transition(&mut self, f: impl FnOnce(ViewState) -> ViewState) {
        let prev = std::mem::take(&mut self.state);
        self.state = f(prev);
    }
}
