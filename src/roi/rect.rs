use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// A point in normalized coordinates (0.0 to 1.0 on each axis).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A rectangle in normalized display coordinates (0.0 to 1.0).
/// This is the ROI as drawn on screen, independent of the frame resolution.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    /// X position of top-left corner (0.0 = left edge, 1.0 = right edge)
    pub x: f32,
    /// Y position of top-left corner (0.0 = top edge, 1.0 = bottom edge)
    pub y: f32,
    /// Width as fraction of display width
    pub width: f32,
    /// Height as fraction of display height
    pub height: f32,
}

impl Default for NormalizedRect {
    /// Full-width horizontal band through the middle of the preview.
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.3,
            width: 1.0,
            height: 0.4,
        }
    }
}

impl NormalizedRect {
    /// Creates a rect, rejecting anything outside `[0,1] x [0,1]`.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Result<Self> {
        let rect = Self {
            x,
            y,
            width,
            height,
        };
        if !rect.is_valid() {
            return Err(anyhow!(
                "ROI ({}, {}, {}x{}) is outside the unit square",
                x,
                y,
                width,
                height
            ));
        }
        Ok(rect)
    }

    /// Checks `0 <= x <= x + width <= 1` and the same for y/height.
    pub fn is_valid(&self) -> bool {
        let axis_ok = |start: f32, len: f32| {
            start.is_finite()
                && len.is_finite()
                && start >= 0.0
                && len >= 0.0
                && start + len <= 1.0 + f32::EPSILON
        };
        axis_ok(self.x, self.width) && axis_ok(self.y, self.height)
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn bottom_right(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height)
    }
}

/// An integer rectangle in raw-frame pixel space.
///
/// Always lies within the frame it was computed for. A zero width or height
/// is a legal (empty) result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}
