//! Recognition worker thread.
//!
//! Receives captured frames from the job queue, crops them and runs the
//! recognizer. The coordinator never waits on this thread; results are
//! applied (or dropped as stale) when they arrive.

use anyhow::{anyhow, Result};
use chrono::Local;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::queue::{RecognitionJob, RecognitionResult};
use super::Shared;
use crate::capture::Frame;
use crate::ocr::Recognizer;

/// How often a pending recognizer call checks whether its epoch was superseded.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Runs the recognition loop until the job channel closes.
///
/// Jobs whose epoch was superseded before they were picked up are skipped
/// without calling the recognizer.
pub(super) fn run_recognition_worker(
    receiver: Receiver<RecognitionJob>,
    recognizer: Arc<dyn Recognizer>,
    shared: Arc<Shared>,
    timeout: Duration,
) {
    crate::log("Recognition worker started");

    while let Ok(job) = receiver.recv() {
        if !shared.is_current(job.epoch) {
            crate::log(&format!(
                "Recognition worker: skipping superseded epoch {}",
                job.epoch
            ));
            continue;
        }

        let lines = process_job(&job, &recognizer, timeout, || shared.is_current(job.epoch));
        crate::log(&format!(
            "Epoch {}: recognition finished {}ms after capture",
            job.epoch,
            (Local::now() - job.captured_at).num_milliseconds()
        ));
        shared.complete(RecognitionResult {
            epoch: job.epoch,
            lines,
        });
    }

    crate::log("Recognition worker finished");
}

/// Crops and recognizes one job. Empty crops and failures yield no lines.
///
/// `still_wanted` is polled while the recognizer runs; once it returns false
/// the call is abandoned.
fn process_job<F>(
    job: &RecognitionJob,
    recognizer: &Arc<dyn Recognizer>,
    timeout: Duration,
    still_wanted: F,
) -> Vec<String>
where
    F: Fn() -> bool,
{
    if job.bounds.is_empty() {
        crate::log(&format!(
            "Epoch {}: ROI is empty on {}x{} frame, nothing to recognize",
            job.epoch,
            job.frame.width(),
            job.frame.height()
        ));
        return Vec::new();
    }

    let crop = job.frame.crop(&job.bounds);
    crate::log(&format!(
        "Epoch {}: recognizing {}x{} crop at ({}, {})",
        job.epoch, job.bounds.width, job.bounds.height, job.bounds.x, job.bounds.y
    ));

    match recognize_with_timeout(recognizer, crop, timeout, still_wanted) {
        Ok(lines) => lines,
        Err(e) => {
            crate::log(&format!("Epoch {}: recognition failed: {:#}", job.epoch, e));
            Vec::new()
        }
    }
}

/// Runs the recognizer on its own thread and waits at most `timeout`, or
/// until `still_wanted` turns false.
///
/// An abandoned call's thread finishes (or not) on its own and its late
/// answer is ignored.
fn recognize_with_timeout<F>(
    recognizer: &Arc<dyn Recognizer>,
    crop: Frame,
    timeout: Duration,
    still_wanted: F,
) -> Result<Vec<String>>
where
    F: Fn() -> bool,
{
    let (sender, receiver) = mpsc::channel();
    let recognizer = Arc::clone(recognizer);

    thread::Builder::new()
        .name("recognizer-call".to_string())
        .spawn(move || {
            let _ = sender.send(recognizer.recognize(crop.image()));
        })?;

    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(anyhow!("recognizer did not respond within {:?}", timeout));
        }

        match receiver.recv_timeout(remaining.min(POLL_INTERVAL)) {
            Ok(result) => return result,
            Err(RecvTimeoutError::Timeout) => {
                if !still_wanted() {
                    return Err(anyhow!("epoch superseded while recognizing"));
                }
            }
            Err(RecvTimeoutError::Disconnected) => return Err(anyhow!("recognizer call panicked")),
        }
    }
}
