use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::frame::Frame;

/// Something that can hand over the current frame of a feed.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Frame>;
}

/// Serves a still image from disk as the feed. Used by the CLI.
pub struct ImageFileSource {
    path: PathBuf,
}

impl ImageFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl FrameSource for ImageFileSource {
    fn next_frame(&mut self) -> Result<Frame> {
        let img = image::open(&self.path)
            .with_context(|| format!("Failed to load image {}", self.path.display()))?;
        crate::log(&format!(
            "Loaded frame {}x{} from {}",
            img.width(),
            img.height(),
            self.path.display()
        ));
        Ok(Frame::new(img.to_rgba8()))
    }
}
