use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::geometry::crop_rect;
use crate::{ClothingItem, Extent, GarmentError, GarmentResult, PixelRect};

pub const DEFAULT_PADDING: f64 = 10.0;

/// One crop to perform. Lives only for the call that consumes it.
#[derive(Debug, Clone, Copy)]
pub struct CropRequest<'a> {
    pub image: &'a DynamicImage,
    pub item: &'a ClothingItem,
    pub padding: f64,
}

impl<'a> CropRequest<'a> {
    pub fn new(image: &'a DynamicImage, item: &'a ClothingItem) -> Self {
        Self { image, item, padding: DEFAULT_PADDING }
    }

    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }
}

#[derive(Debug, Clone)]
pub struct CroppedImage {
    id: Uuid,
    image: DynamicImage,
    source_item: ClothingItem,
    crop_rect: PixelRect,
}

impl CroppedImage {
    pub fn id(&self) -> Uuid { self.id }
    pub fn image(&self) -> &DynamicImage { &self.image }
    pub fn source_item(&self) -> &ClothingItem { &self.source_item }
    /// Clamped rectangle the pixels were taken from, before whole-pixel rounding.
    pub fn crop_rect(&self) -> PixelRect { self.crop_rect }
}

pub trait Cropper: Send + Sync {
    fn crop(&self, req: &CropRequest<'_>) -> GarmentResult<CroppedImage>;
}

/// Cuts regions out of in-memory images with the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCropper;

impl Cropper for ImageCropper {
    fn crop(&self, req: &CropRequest<'_>) -> GarmentResult<CroppedImage> {
        let (w, h) = req.image.dimensions();
        if w == 0 || h == 0 {
            return Err(GarmentError::InvalidImage);
        }

        let rect = crop_rect(req.item.bbox(), Extent::of_image(req.image), req.padding);
        let Some(bounds) = rect.to_bounds(w, h) else {
            warn!("crop: item {} ({}) has no area inside the image: {:?}", req.item.id(), req.item.label(), rect);
            return Err(GarmentError::ProcessingFailed);
        };

        debug!("crop: item {} -> {:?}", req.item.id(), bounds);
        let image = req.image.crop_imm(bounds.x, bounds.y, bounds.width, bounds.height);
        Ok(CroppedImage {
            id: Uuid::new_v4(),
            image,
            source_item: req.item.clone(),
            crop_rect: rect,
        })
    }
}

/// What to do when one request in a batch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchPolicy {
    /// Keep every crop that worked, report the rest.
    #[default]
    BestEffort,
    /// First failure fails the whole batch.
    AllOrNothing,
}

#[derive(Debug, Clone)]
pub struct CropFailure {
    pub index: usize,
    pub item_id: Uuid,
    pub error: GarmentError,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub policy: BatchPolicy,
    pub cropped: Vec<CroppedImage>,
    pub failures: Vec<CropFailure>,
}

/// Crop each request in order. Requests share nothing, so results line up
/// with the input (minus failures under [`BatchPolicy::BestEffort`]).
pub fn crop_batch<C: Cropper + ?Sized>(
    cropper: &C,
    requests: &[CropRequest<'_>],
    policy: BatchPolicy,
) -> GarmentResult<BatchOutcome> {
    let mut cropped = Vec::with_capacity(requests.len());
    let mut failures = Vec::new();

    for (index, req) in requests.iter().enumerate() {
        match cropper.crop(req) {
            Ok(c) => cropped.push(c),
            Err(e) if policy == BatchPolicy::AllOrNothing => return Err(e),
            Err(error) => failures.push(CropFailure { index, item_id: req.item.id(), error }),
        }
    }

    Ok(BatchOutcome { policy, cropped, failures })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Detection, NormalizedRect};
    use image::{Rgb, RgbImage};

    fn item(bbox: NormalizedRect, size: Extent) -> ClothingItem {
        ClothingItem::from_detection(&Detection::new("dress", 0.8, bbox), size)
    }

    fn assert_close(got: PixelRect, want: PixelRect) {
        let d = (got.x - want.x).abs() + (got.y - want.y).abs() + (got.w - want.w).abs() + (got.h - want.h).abs();
        assert!(d < 1e-9, "got {:?}, want {:?}", got, want);
    }

    fn gradient(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| Rgb([x as u8, y as u8, 0])))
    }

    #[test]
    fn crops_padded_region_and_records_rect() {
        let img = gradient(200, 100);
        let it = item(NormalizedRect::new(0.5, 0.5, 0.2, 0.1), Extent::of_image(&img));
        let out = ImageCropper.crop(&CropRequest::new(&img, &it)).unwrap();

        // {100,40,40,10} padded by 10
        assert_close(out.crop_rect(), PixelRect::new(90.0, 30.0, 60.0, 30.0));
        assert_eq!(out.image().dimensions(), (60, 30));
        assert_eq!(out.image().to_rgb8().get_pixel(0, 0), &Rgb([90, 30, 0]));
        assert_eq!(out.source_item().id(), it.id());
    }

    #[test]
    fn clamps_at_image_corner() {
        let img = gradient(100, 100);
        // top-left 50x50 block in bottom-left-origin space
        let it = item(NormalizedRect::new(0.0, 0.5, 0.5, 0.5), Extent::of_image(&img));
        let out = ImageCropper.crop(&CropRequest::new(&img, &it)).unwrap();
        assert_close(out.crop_rect(), PixelRect::new(0.0, 0.0, 70.0, 70.0));
        assert_eq!(out.image().dimensions(), (70, 70));
    }

    #[test]
    fn zero_padding_keeps_exact_box() {
        let img = gradient(100, 100);
        let it = item(NormalizedRect::new(0.25, 0.25, 0.5, 0.5), Extent::of_image(&img));
        let out = ImageCropper.crop(&CropRequest::new(&img, &it).with_padding(0.0)).unwrap();
        assert_eq!(out.image().dimensions(), (50, 50));
    }

    #[test]
    fn empty_image_is_invalid() {
        let img = DynamicImage::new_rgb8(0, 0);
        let it = item(NormalizedRect::new(0.1, 0.1, 0.2, 0.2), Extent::new(100.0, 100.0));
        let err = ImageCropper.crop(&CropRequest::new(&img, &it)).unwrap_err();
        assert_eq!(err, GarmentError::InvalidImage);
    }

    #[test]
    fn degenerate_box_without_padding_fails() {
        let img = gradient(50, 50);
        let it = item(NormalizedRect::new(0.2, 0.2, 0.0, 0.3), Extent::of_image(&img));
        let err = ImageCropper.crop(&CropRequest::new(&img, &it).with_padding(0.0)).unwrap_err();
        assert_eq!(err, GarmentError::ProcessingFailed);
    }

    #[test]
    fn batch_keeps_order_and_reports_failures() {
        let img = gradient(100, 100);
        let size = Extent::of_image(&img);
        let good_a = item(NormalizedRect::new(0.1, 0.1, 0.2, 0.2), size);
        let bad = item(NormalizedRect::new(0.5, 0.5, 0.0, 0.0), size);
        let good_b = item(NormalizedRect::new(0.6, 0.6, 0.3, 0.3), size);
        let reqs: Vec<_> = [&good_a, &bad, &good_b]
            .into_iter()
            .map(|i| CropRequest::new(&img, i).with_padding(0.0))
            .collect();

        let out = crop_batch(&ImageCropper, &reqs, BatchPolicy::BestEffort).unwrap();
        let ids: Vec<_> = out.cropped.iter().map(|c| c.source_item().id()).collect();
        assert_eq!(ids, vec![good_a.id(), good_b.id()]);
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].index, 1);
        assert_eq!(out.failures[0].item_id, bad.id());
        assert_eq!(out.failures[0].error, GarmentError::ProcessingFailed);
    }

    #[test]
    fn all_or_nothing_aborts_on_first_failure() {
        let img = gradient(100, 100);
        let size = Extent::of_image(&img);
        let good = item(NormalizedRect::new(0.1, 0.1, 0.2, 0.2), size);
        let bad = item(NormalizedRect::new(0.5, 0.5, 0.0, 0.0), size);
        let reqs = [
            CropRequest::new(&img, &good).with_padding(0.0),
            CropRequest::new(&img, &bad).with_padding(0.0),
        ];
        let err = crop_batch(&ImageCropper, &reqs, BatchPolicy::AllOrNothing).unwrap_err();
        assert_eq!(err, GarmentError::ProcessingFailed);
    }

    #[test]
    fn policy_reads_kebab_case() {
        #[derive(Deserialize)]
        struct Wrap {
            policy: BatchPolicy,
        }
        let w: Wrap = serde_json::from_str(r#"{"policy":"all-or-nothing"}"#).unwrap();
        assert_eq!(w.policy, BatchPolicy::AllOrNothing);
    }
}
