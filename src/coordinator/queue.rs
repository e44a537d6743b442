//! Work queue between frame delivery and the recognition worker.
//!
//! Frame delivery sends one job per captured frame; the worker receives and
//! processes them in order. Every job carries the trigger epoch it belongs to.

use chrono::{DateTime, Local};
use std::sync::mpsc::{channel, Receiver, Sender};

use crate::capture::Frame;
use crate::roi::PixelRect;

/// A captured frame waiting for recognition.
#[derive(Debug, Clone)]
pub struct RecognitionJob {
    /// Trigger epoch active when the frame was captured
    pub epoch: u64,
    /// The full captured frame
    pub frame: Frame,
    /// ROI in frame pixels; may be empty
    pub bounds: PixelRect,
    /// Timestamp when the frame was captured
    pub captured_at: DateTime<Local>,
}

impl RecognitionJob {
    pub fn new(epoch: u64, frame: Frame, bounds: PixelRect) -> Self {
        Self {
            epoch,
            frame,
            bounds,
            captured_at: Local::now(),
        }
    }
}

/// Recognizer output for one job. Failures arrive as empty `lines`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionResult {
    pub epoch: u64,
    pub lines: Vec<String>,
}

/// Creates a new job queue.
///
/// The channel is unbounded; at most one job per trigger is ever sent.
pub fn create_job_queue() -> (Sender<RecognitionJob>, Receiver<RecognitionJob>) {
    channel()
}
