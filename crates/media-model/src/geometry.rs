//! Pixel and normalized geometry.
//!
//! Overlays are authored in editor-canvas pixels; compiled operations use
//! fractions of the media frame so they replay at any output resolution.

use serde::{Deserialize, Serialize};

/// Media frame size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both dimensions non-zero.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height.max(1) as f64
    }
}

/// A rectangle in normalized frame space.
///
/// `(0.0, 0.0)` is the top-left and `(1.0, 1.0)` the bottom-right of the
/// frame. Values are not clamped: an overlay hanging off the edge of the
/// canvas keeps its true extent and the renderer crops it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    /// Left edge (normalized).
    pub x: f64,
    /// Top edge (normalized).
    pub y: f64,
    /// Width (normalized).
    pub w: f64,
    /// Height (normalized).
    pub h: f64,
}

impl NormalizedRect {
    /// The full frame.
    pub const FULL: NormalizedRect = NormalizedRect {
        x: 0.0,
        y: 0.0,
        w: 1.0,
        h: 1.0,
    };

    /// Normalize a pixel-space rectangle against `resolution`.
    pub fn from_pixels(x: f64, y: f64, width: f64, height: f64, resolution: Resolution) -> Self {
        let rw = resolution.width.max(1) as f64;
        let rh = resolution.height.max(1) as f64;
        Self {
            x: x / rw,
            y: y / rh,
            w: width / rw,
            h: height / rh,
        }
    }

    /// Scale back into pixel space for a concrete output resolution.
    pub fn to_pixels(&self, resolution: Resolution) -> (f64, f64, f64, f64) {
        let rw = resolution.width as f64;
        let rh = resolution.height as f64;
        (self.x * rw, self.y * rh, self.w * rw, self.h * rh)
    }

    /// The center point of this rectangle.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Whether any part of the rectangle lies inside the frame.
    pub fn intersects_frame(&self) -> bool {
        self.x < 1.0 && self.y < 1.0 && self.x + self.w > 0.0 && self.y + self.h > 0.0
    }

    /// Area (1.0 = whole frame).
    pub fn area(&self) -> f64 {
        self.w * self.h
    }
}

impl Default for NormalizedRect {
    fn default() -> Self {
        Self::FULL
    }
}

/// Normalize a rotation in degrees into `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let r = degrees.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs due to rounding
    if r >= 360.0 {
        0.0
    } else {
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pixels_normalizes_against_resolution() {
        let rect = NormalizedRect::from_pixels(192.0, 108.0, 960.0, 540.0, Resolution::new(1920, 1080));
        assert!((rect.x - 0.1).abs() < 1e-9);
        assert!((rect.y - 0.1).abs() < 1e-9);
        assert!((rect.w - 0.5).abs() < 1e-9);
        assert!((rect.h - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_resolution_independent_replay() {
        let rect = NormalizedRect::from_pixels(100.0, 50.0, 200.0, 100.0, Resolution::new(1000, 500));
        let (x, y, w, h) = rect.to_pixels(Resolution::new(4000, 2000));
        assert!((x - 400.0).abs() < 1e-9);
        assert!((y - 200.0).abs() < 1e-9);
        assert!((w - 800.0).abs() < 1e-9);
        assert!((h - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_off_canvas_rect_is_not_clamped() {
        let rect = NormalizedRect::from_pixels(-50.0, 0.0, 100.0, 100.0, Resolution::new(100, 100));
        assert!((rect.x + 0.5).abs() < 1e-9);
        assert!(rect.intersects_frame());

        let outside = NormalizedRect::from_pixels(150.0, 0.0, 10.0, 10.0, Resolution::new(100, 100));
        assert!(!outside.intersects_frame());
    }

    #[test]
    fn test_normalize_degrees() {
        assert!((normalize_degrees(-90.0) - 270.0).abs() < 1e-9);
        assert!((normalize_degrees(720.0)).abs() < 1e-9);
        assert!((normalize_degrees(45.0) - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_resolution_validity() {
        assert!(Resolution::new(1920, 1080).is_valid());
        assert!(!Resolution::new(0, 1080).is_valid());
        assert!((Resolution::new(1920, 1080).aspect_ratio() - 16.0 / 9.0).abs() < 1e-9);
    }
}
