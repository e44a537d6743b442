//! Display-space ROI to pixel-space crop.

use crate::capture::Frame;

use super::rect::{NormalizedRect, PixelRect, Point};

/// Maps a point in normalized display coordinates to raw-frame-normalized
/// coordinates. Supplied by the preview surface for its current layout.
pub trait DisplayToFrame {
    fn to_frame(&self, point: Point) -> Point;
}

impl<F> DisplayToFrame for F
where
    F: Fn(Point) -> Point,
{
    fn to_frame(&self, point: Point) -> Point {
        self(point)
    }
}

/// Converts a display-space ROI into clamped pixel bounds on a frame.
///
/// The two corners are converted independently so that letterboxing or
/// aspect-fill cropping in the preview is reflected in the result. Corners
/// are re-ordered if the conversion flips an axis.
pub fn to_pixel_rect<C>(
    rect: &NormalizedRect,
    frame_width: u32,
    frame_height: u32,
    convert: &C,
) -> PixelRect
where
    C: DisplayToFrame + ?Sized,
{
    let a = convert.to_frame(rect.top_left());
    let b = convert.to_frame(rect.bottom_right());

    let left = to_pixel(a.x.min(b.x), frame_width);
    let right = to_pixel(a.x.max(b.x), frame_width);
    let top = to_pixel(a.y.min(b.y), frame_height);
    let bottom = to_pixel(a.y.max(b.y), frame_height);

    PixelRect {
        x: left,
        y: top,
        width: right.saturating_sub(left),
        height: bottom.saturating_sub(top),
    }
}

/// Scales a normalized coordinate to pixels, rounds, and clamps to `[0, dim]`.
/// NaN maps to 0.
fn to_pixel(value: f32, dim: u32) -> u32 {
    let scaled = (value as f64 * dim as f64).round();
    if scaled.is_nan() || scaled <= 0.0 {
        0
    } else if scaled >= dim as f64 {
        dim
    } else {
        scaled as u32
    }
}

/// Crops the ROI out of a frame.
///
/// Returns `None` when the clamped region has no area; callers treat that as
/// "nothing recognized", never as a failure.
pub fn crop<C>(frame: &Frame, rect: &NormalizedRect, convert: &C) -> Option<Frame>
where
    C: DisplayToFrame + ?Sized,
{
    let bounds = to_pixel_rect(rect, frame.width(), frame.height(), convert);
    if bounds.is_empty() {
        return None;
    }
    Some(frame.crop(&bounds))
}
