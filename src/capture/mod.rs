//! Frame capture.
//!
//! This module provides:
//! - The immutable `Frame` handed from the video feed to the pipeline
//! - A single-slot `FrameStore` holding the captured still
//! - `FrameSource` with a file-backed implementation

pub mod frame;
pub mod source;

pub use frame::{Frame, FrameStore};
pub use source::{FrameSource, ImageFileSource};
