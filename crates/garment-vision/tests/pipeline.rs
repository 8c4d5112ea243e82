use garment_vision::crop::{crop_batch, BatchPolicy, CropRequest, ImageCropper};
use garment_vision::detector::ReplayDetector;
use garment_vision::filter::detect_clothing;
use garment_vision::{Detection, Extent, ImageProcessingRequest, NormalizedRect};
use image::{DynamicImage, GenericImageView};

fn recorded() -> ReplayDetector {
    ReplayDetector::new(vec![
        Detection::new("pants", 0.3, NormalizedRect::new(0.2, 0.0, 0.3, 0.5)),
        Detection::new("shirt", 0.5, NormalizedRect::new(0.5, 0.5, 0.2, 0.1)),
        Detection::new("jacket", 0.9, NormalizedRect::new(0.0, 0.5, 0.25, 0.5)),
        // lies on the right edge with zero width: only padding gives it area
        Detection::new("sock", 0.95, NormalizedRect::new(1.0, 0.25, 0.0, 0.25)),
    ])
}

#[test]
fn detect_then_crop_every_item() {
    let img = DynamicImage::new_rgb8(200, 100);
    let result = detect_clothing(&recorded(), &ImageProcessingRequest::new(&img)).unwrap();

    let labels: Vec<_> = result.items.iter().map(|i| i.label().to_string()).collect();
    assert_eq!(labels, vec!["shirt", "jacket", "sock"]);
    assert!(result.items.iter().all(|i| i.image_size() == Extent::new(200.0, 100.0)));

    let reqs: Vec<_> = result.items.iter().map(|i| CropRequest::new(&img, i)).collect();
    let out = crop_batch(&ImageCropper, &reqs, BatchPolicy::BestEffort).unwrap();
    assert!(out.failures.is_empty());
    assert_eq!(out.cropped.len(), 3);

    for c in &out.cropped {
        let r = c.crop_rect();
        assert!(r.x >= 0.0 && r.y >= 0.0);
        assert!(r.max_x() <= 200.0 + 1e-9 && r.max_y() <= 100.0 + 1e-9);
        let (w, h) = c.image().dimensions();
        assert!(w > 0 && h > 0);
    }

    // shirt: {100,40,40,10} + 10px padding
    assert_eq!(out.cropped[0].image().dimensions(), (60, 30));
    // sock: x=200 pulled back to 190 by padding, cut at the right edge
    assert_eq!(out.cropped[2].image().dimensions(), (10, 45));
}

#[test]
fn stricter_threshold_drops_more() {
    let img = DynamicImage::new_rgb8(64, 64);
    let loose = detect_clothing(&recorded(), &ImageProcessingRequest::new(&img).with_threshold(0.2)).unwrap();
    let strict = detect_clothing(&recorded(), &ImageProcessingRequest::new(&img).with_threshold(0.9)).unwrap();
    assert_eq!(loose.items.len(), 4);
    assert_eq!(strict.items.len(), 1);
    assert_eq!(strict.items[0].label(), "sock");
}
