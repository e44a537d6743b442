//! Snippet Scan
//!
//! Grabs a single still from a live video feed, crops the region the user
//! aimed at, runs text recognition on the crop and keeps the cleaned result
//! as a tagged snippet with an optional source.

pub mod capture;
pub mod config;
pub mod coordinator;
pub mod ocr;
pub mod paths;
pub mod roi;
pub mod store;

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;

pub use capture::{Frame, FrameStore};
pub use coordinator::{CaptureState, Coordinator};
pub use roi::{DisplayToFrame, NormalizedRect, PixelRect, Point};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, Snippet, SnippetStore, SourceHistory};

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join("snippet_scan.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}
