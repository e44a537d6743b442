use image::RgbaImage;
use std::sync::{Arc, Mutex};

use crate::roi::PixelRect;

/// An immutable raster frame. Cloning shares the pixel buffer.
#[derive(Clone, Debug)]
pub struct Frame {
    image: Arc<RgbaImage>,
}

impl Frame {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Copies the given pixel region into a new frame.
    /// `bounds` must lie within this frame (see `roi::to_pixel_rect`).
    pub fn crop(&self, bounds: &PixelRect) -> Frame {
        let sub = image::imageops::crop_imm(
            &*self.image,
            bounds.x,
            bounds.y,
            bounds.width,
            bounds.height,
        );
        Frame::new(sub.to_image())
    }
}

/// Single-slot holder for the most recently captured still.
#[derive(Debug, Default)]
pub struct FrameStore {
    slot: Mutex<Option<Frame>>,
}

impl FrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a frame, replacing whatever was held.
    pub fn put(&self, frame: Frame) {
        *self.lock() = Some(frame);
    }

    /// Returns the held frame without removing it.
    pub fn peek(&self) -> Option<Frame> {
        self.lock().clone()
    }

    /// Removes and returns the held frame.
    pub fn take(&self) -> Option<Frame> {
        self.lock().take()
    }

    pub fn clear(&self) {
        self.lock().take();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Frame>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}
