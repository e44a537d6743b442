//! Aspect-fill preview geometry.
//!
//! A live preview that fills its view (scale to cover, then centre-crop)
//! hides part of the raw frame. Converting an on-screen point back to the
//! frame has to undo that scale and offset.

use serde::{Deserialize, Serialize};

use super::rect::Point;
use super::transform::DisplayToFrame;

/// Size of the on-screen preview, in display points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreviewLayout {
    pub width: f32,
    pub height: f32,
}

/// Display-to-frame conversion for an aspect-fill preview of a given frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AspectFillPreview {
    /// Frame-normalized offset of the visible area's top-left corner
    origin: Point,
    /// Fraction of the frame that is visible on each axis
    visible: Point,
}

impl AspectFillPreview {
    /// Builds the conversion for a frame of `frame_width` x `frame_height`
    /// pixels shown in `layout`. Degenerate sizes fall back to identity.
    pub fn new(layout: PreviewLayout, frame_width: u32, frame_height: u32) -> Self {
        let (fw, fh) = (frame_width as f32, frame_height as f32);
        if layout.width <= 0.0 || layout.height <= 0.0 || fw <= 0.0 || fh <= 0.0 {
            return Self::identity();
        }

        let scale = (layout.width / fw).max(layout.height / fh);
        let visible = Point::new(layout.width / (fw * scale), layout.height / (fh * scale));
        let origin = Point::new((1.0 - visible.x) / 2.0, (1.0 - visible.y) / 2.0);

        Self { origin, visible }
    }

    pub fn identity() -> Self {
        Self {
            origin: Point::new(0.0, 0.0),
            visible: Point::new(1.0, 1.0),
        }
    }
}

impl DisplayToFrame for AspectFillPreview {
    fn to_frame(&self, point: Point) -> Point {
        Point::new(
            self.origin.x + point.x * self.visible.x,
            self.origin.y + point.y * self.visible.y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roi::{to_pixel_rect, NormalizedRect};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_landscape_frame_in_square_view_crops_sides() {
        let layout = PreviewLayout { width: 1080.0, height: 1080.0 };
        let preview = AspectFillPreview::new(layout, 1920, 1080);

        let left = preview.to_frame(Point::new(0.0, 0.0));
        let right = preview.to_frame(Point::new(1.0, 1.0));
        assert!(approx(left.x, 420.0 / 1920.0));
        assert!(approx(right.x, 1500.0 / 1920.0));
        assert!(approx(left.y, 0.0));
        assert!(approx(right.y, 1.0));
    }

    #[test]
    fn test_portrait_frame_in_wide_view_crops_top_and_bottom() {
        // 1080x1920 frame scaled to 390 wide is 693.3 tall; 300 of it is shown
        let layout = PreviewLayout { width: 390.0, height: 300.0 };
        let preview = AspectFillPreview::new(layout, 1080, 1920);

        let rect = NormalizedRect { x: 0.0, y: 0.0, width: 1.0, height: 1.0 };
        let px = to_pixel_rect(&rect, 1080, 1920, &preview);
        assert_eq!(px.width, 1080);
        assert_eq!(px.x, 0);
        // visible height = 300 / (1920 * 390 / 1080) of the frame
        let expected = (1920.0_f64 * 300.0 / (1920.0 * 390.0 / 1080.0)).round() as i64;
        assert!((px.height as i64 - expected).abs() <= 1);
        assert!((px.y as i64 - (1920 - expected) / 2).abs() <= 1);
    }

    #[test]
    fn test_matching_aspect_is_identity() {
        let layout = PreviewLayout { width: 320.0, height: 180.0 };
        let preview = AspectFillPreview::new(layout, 1920, 1080);
        let p = preview.to_frame(Point::new(0.3, 0.7));
        assert!(approx(p.x, 0.3));
        assert!(approx(p.y, 0.7));
    }

    #[test]
    fn test_degenerate_layout_falls_back_to_identity() {
        let layout = PreviewLayout { width: 0.0, height: 100.0 };
        assert_eq!(AspectFillPreview::new(layout, 640, 480), AspectFillPreview::identity());
    }
}
