//! Region-of-interest handling.
//!
//! The ROI is drawn in normalized display space; the preview surface supplies
//! a conversion into raw-frame-normalized space, and the transform turns that
//! into clamped pixel bounds on the captured frame.

pub mod preview;
pub mod rect;
pub mod transform;

pub use preview::{AspectFillPreview, PreviewLayout};
pub use rect::{NormalizedRect, PixelRect, Point};
pub use transform::{crop, to_pixel_rect, DisplayToFrame};
