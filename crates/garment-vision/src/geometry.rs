use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};

/// Box in fractions of the image size, origin bottom-left, y growing upward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl NormalizedRect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn clamp01(self) -> Self {
        Self {
            x: self.x.clamp(0.0, 1.0),
            y: self.y.clamp(0.0, 1.0),
            w: self.w.clamp(0.0, 1.0),
            h: self.h.clamp(0.0, 1.0),
        }
    }

    /// Flip into top-left-origin pixel space of `extent`. Zero width or height
    /// gives a zero-area rect, not an error.
    pub fn to_pixels(self, extent: Extent) -> PixelRect {
        PixelRect {
            x: self.x * extent.width,
            y: (1.0 - self.y - self.h) * extent.height,
            w: self.w * extent.width,
            h: self.h * extent.height,
        }
    }
}

/// Image size in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub width: f64,
    pub height: f64,
}

impl Extent {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn of_image(img: &DynamicImage) -> Self {
        let (w, h) = img.dimensions();
        Self { width: w as f64, height: h as f64 }
    }
}

/// Pixel rectangle, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Whole-pixel region ready for extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.w
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.h
    }

    /// True unless both sides are strictly positive (NaN counts as empty).
    pub fn is_empty(&self) -> bool {
        !(self.w > 0.0 && self.h > 0.0)
    }

    /// Grow by `padding` on every side.
    pub fn expand(self, padding: f64) -> Self {
        Self {
            x: self.x - padding,
            y: self.y - padding,
            w: self.w + padding * 2.0,
            h: self.h + padding * 2.0,
        }
    }

    /// Pull the origin inside the image and cut the far edges at the extent.
    ///
    /// A rect that starts past the right or bottom edge comes out with a
    /// negative side; check [`PixelRect::is_empty`] before using it.
    pub fn clamp_to(self, extent: Extent) -> Self {
        let x = self.x.max(0.0);
        let y = self.y.max(0.0);
        Self {
            x,
            y,
            w: self.w.min(extent.width - x),
            h: self.h.min(extent.height - y),
        }
    }

    /// Round outward to whole pixels and intersect with a `width` x `height`
    /// image. `None` when nothing is left to extract.
    pub fn to_bounds(self, width: u32, height: u32) -> Option<PixelBounds> {
        if self.is_empty() {
            return None;
        }
        let x0 = self.x.floor().max(0.0);
        let y0 = self.y.floor().max(0.0);
        let x1 = self.max_x().ceil().min(width as f64);
        let y1 = self.max_y().ceil().min(height as f64);
        if !(x1 > x0 && y1 > y0) {
            return None;
        }
        Some(PixelBounds {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }
}

/// Normalized box -> padded, clamped crop rectangle in pixels.
pub fn crop_rect(bbox: NormalizedRect, extent: Extent, padding: f64) -> PixelRect {
    bbox.to_pixels(extent).expand(padding).clamp_to(extent)
}
