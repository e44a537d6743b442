//! Capture coordinator.
//!
//! Drives one scan: `trigger` arms capture of the next frame, the frame is
//! handed to the recognition worker, the cleaned result becomes the review
//! text, and `save`/`discard` end the session.
//!
//! State machine: Idle → (frame) → Recognizing → (result) → Reviewing → Idle.
//! Every trigger starts a new epoch; results from an older epoch are dropped.

pub mod queue;
pub mod state;
mod worker;

pub use queue::{RecognitionJob, RecognitionResult};
pub use state::CaptureState;

use anyhow::{bail, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::capture::{Frame, FrameStore};
use crate::config::ScanConfig;
use crate::ocr::{clean_lines, clean_text, Recognizer};
use crate::roi::{to_pixel_rect, AspectFillPreview, DisplayToFrame};
use crate::store::snippets::{normalize_source, normalize_tags};
use crate::store::{Snippet, SnippetStore, SourceHistory};
use queue::create_job_queue;
use worker::run_recognition_worker;

/// Defaults offered to the user when a review starts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Suggestion {
    /// Last used source, if still inside the auto-fill window
    pub source: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Default)]
struct Session {
    state: CaptureState,
    epoch: u64,
    review_text: Option<String>,
}

/// State shared with the recognition worker.
struct Shared {
    session: Mutex<Session>,
    changed: Condvar,
    /// Epoch waiting for its frame; 0 when capture is not armed
    armed: AtomicU64,
    frames: FrameStore,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_current(&self, epoch: u64) -> bool {
        let session = self.lock();
        session.epoch == epoch && session.state == CaptureState::Recognizing
    }

    /// Applies a recognition result if it still belongs to the live session.
    fn complete(&self, result: RecognitionResult) -> bool {
        let mut session = self.lock();
        if session.epoch != result.epoch || session.state != CaptureState::Recognizing {
            crate::log(&format!(
                "Dropping stale result for epoch {} (current epoch {}, {})",
                result.epoch, session.epoch, session.state
            ));
            return false;
        }

        let text = clean_lines(&result.lines);
        crate::log(&format!(
            "Epoch {}: {} line(s) recognized, {} chars after cleanup",
            result.epoch,
            result.lines.len(),
            text.chars().count()
        ));
        session.review_text = Some(text);
        session.state = CaptureState::Reviewing;
        self.changed.notify_all();
        true
    }
}

/// Orchestrates capture, recognition, review and save.
pub struct Coordinator {
    shared: Arc<Shared>,
    jobs: Option<Sender<RecognitionJob>>,
    worker: Option<JoinHandle<()>>,
    snippets: Arc<SnippetStore>,
    history: Arc<SourceHistory>,
    config: ScanConfig,
}

impl Coordinator {
    /// Creates the coordinator and starts its recognition worker thread.
    pub fn new(
        config: ScanConfig,
        recognizer: Arc<dyn Recognizer>,
        snippets: Arc<SnippetStore>,
        history: Arc<SourceHistory>,
    ) -> Self {
        let shared = Arc::new(Shared {
            session: Mutex::new(Session::default()),
            changed: Condvar::new(),
            armed: AtomicU64::new(0),
            frames: FrameStore::new(),
        });

        let (sender, receiver) = create_job_queue();
        let worker_shared = Arc::clone(&shared);
        let timeout = config.recognition_timeout();
        let worker = thread::Builder::new()
            .name("recognition-worker".to_string())
            .spawn(move || run_recognition_worker(receiver, recognizer, worker_shared, timeout));

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                // without a worker every capture resolves to empty text
                crate::log(&format!("Failed to start recognition worker: {}", e));
                None
            }
        };

        Self {
            shared,
            jobs: worker.as_ref().map(|_| sender),
            worker,
            snippets,
            history,
            config,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn snippets(&self) -> &Arc<SnippetStore> {
        &self.snippets
    }

    pub fn history(&self) -> &Arc<SourceHistory> {
        &self.history
    }

    pub fn state(&self) -> CaptureState {
        self.shared.lock().state
    }

    pub fn epoch(&self) -> u64 {
        self.shared.lock().epoch
    }

    /// Whether the next frame will be captured.
    pub fn is_armed(&self) -> bool {
        self.shared.armed.load(Ordering::SeqCst) != 0
    }

    /// Text under review; `None` unless reviewing.
    pub fn review_text(&self) -> Option<String> {
        self.shared.lock().review_text.clone()
    }

    /// The still that produced the current session, if any.
    pub fn captured_frame(&self) -> Option<Frame> {
        self.shared.frames.peek()
    }

    /// Starts a new scan: drops any current review or pending recognition
    /// and arms capture of exactly one upcoming frame. Returns the new epoch.
    pub fn trigger(&self) -> u64 {
        let mut session = self.shared.lock();
        if session.state != CaptureState::Idle {
            crate::log(&format!(
                "Trigger while {}: abandoning epoch {}",
                session.state, session.epoch
            ));
        }

        session.epoch += 1;
        session.state = CaptureState::Idle;
        session.review_text = None;
        self.shared.frames.clear();
        self.shared.armed.store(session.epoch, Ordering::SeqCst);
        self.shared.changed.notify_all();

        crate::log(&format!("Capture armed for epoch {}", session.epoch));
        session.epoch
    }

    /// Offers a frame from the feed, converting the ROI with `convert`.
    ///
    /// Only the first frame after a trigger is taken; all others are ignored.
    /// Returns whether this frame was captured. Never waits on recognition.
    pub fn on_frame<C>(&self, frame: Frame, convert: &C) -> bool
    where
        C: DisplayToFrame + ?Sized,
    {
        let epoch = self.shared.armed.swap(0, Ordering::SeqCst);
        if epoch == 0 {
            return false;
        }

        let bounds = to_pixel_rect(&self.config.roi, frame.width(), frame.height(), convert);

        {
            let mut session = self.shared.lock();
            if session.epoch != epoch {
                // a newer trigger re-armed capture after we claimed this frame
                return false;
            }
            session.state = CaptureState::Recognizing;
            self.shared.frames.put(frame.clone());
            self.shared.changed.notify_all();
        }

        crate::log(&format!(
            "Epoch {}: captured {}x{} frame, ROI {:?}",
            epoch,
            frame.width(),
            frame.height(),
            bounds
        ));

        let job = RecognitionJob::new(epoch, frame, bounds);
        let sent = self.jobs.as_ref().map(|jobs| jobs.send(job).is_ok());
        if sent != Some(true) {
            crate::log("Recognition worker unavailable, reviewing empty text");
            self.shared.complete(RecognitionResult {
                epoch,
                lines: Vec::new(),
            });
        }
        true
    }

    /// Offers a frame using the configured preview layout for ROI conversion
    /// (identity when no preview is configured).
    pub fn deliver_frame(&self, frame: Frame) -> bool {
        let convert = match self.config.preview {
            Some(layout) => AspectFillPreview::new(layout, frame.width(), frame.height()),
            None => AspectFillPreview::identity(),
        };
        self.on_frame(frame, &convert)
    }

    /// Blocks until a review is ready or `timeout` passes. Returns the review text.
    pub fn wait_for_review(&self, timeout: Duration) -> Option<String> {
        let session = self.shared.lock();
        let (session, _) = self
            .shared
            .changed
            .wait_timeout_while(session, timeout, |s| s.state != CaptureState::Reviewing)
            .unwrap_or_else(|e| e.into_inner());
        session.review_text.clone()
    }

    /// Source and tags to pre-fill for the current review.
    pub fn suggestion(&self) -> Suggestion {
        let source = self.history.autofill(self.config.autofill_window());
        let tags = match &source {
            Some(_) if !self.config.default_tag.is_empty() => vec![self.config.default_tag.clone()],
            _ => Vec::new(),
        };
        Suggestion { source, tags }
    }

    /// Saves the review text as a snippet and returns to Idle.
    pub fn save(&self, source: Option<&str>, tags: &[String]) -> Result<Snippet> {
        let text = self.finish_review("save")?;
        self.commit(text, source, tags)
    }

    /// Saves `selection` (cleaned) if it has any text, else the full review text.
    pub fn save_selection(&self, selection: &str, source: Option<&str>, tags: &[String]) -> Result<Snippet> {
        let full = self.finish_review("save")?;
        let selected = clean_text(selection);
        let text = if selected.is_empty() { full } else { selected };
        self.commit(text, source, tags)
    }

    /// Drops the review without saving. Returns false if nothing was under review.
    pub fn discard(&self) -> bool {
        self.finish_review("discard").is_ok()
    }

    /// Ends the review session and hands back its text.
    fn finish_review(&self, action: &str) -> Result<String> {
        let mut session = self.shared.lock();
        if session.state != CaptureState::Reviewing {
            bail!("Nothing to {}: coordinator is {}", action, session.state);
        }

        let text = session.review_text.take().unwrap_or_default();
        session.state = CaptureState::Idle;
        self.shared.frames.clear();
        self.shared.changed.notify_all();
        crate::log(&format!("Epoch {}: review ended ({})", session.epoch, action));
        Ok(text)
    }

    /// Writes the snippet and records the source as two independent commits.
    /// A history failure is logged only; the snippet result is what is returned.
    fn commit(&self, text: String, source: Option<&str>, tags: &[String]) -> Result<Snippet> {
        let source = normalize_source(source);
        let mut tags = normalize_tags(tags);
        if source.is_some() && tags.is_empty() && !self.config.default_tag.is_empty() {
            tags.push(self.config.default_tag.clone());
        }

        let saved = self.snippets.add(text, source.as_deref(), &tags);

        if let Some(source) = &source {
            if let Err(e) = self.history.record(source) {
                crate::log(&format!("Source history not updated: {:#}", e));
            }
        }

        saved
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        // closing the queue ends the worker loop
        self.jobs.take();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roi::{NormalizedRect, Point};
    use crate::store::{KeyValueStore, MemoryStore};
    use image::{ImageBuffer, RgbaImage};
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc::{self, Receiver};
    use tempfile::{tempdir, TempDir};

    const WAIT: Duration = Duration::from_secs(5);

    enum Reply {
        Lines(Vec<&'static str>),
        Fail,
        /// Signals `started`, then blocks until `release` yields a value
        Gated {
            started: mpsc::Sender<()>,
            release: Receiver<()>,
            lines: Vec<&'static str>,
        },
    }

    /// Replays scripted replies in order; repeats an empty reply when exhausted.
    struct Scripted {
        replies: Mutex<VecDeque<Reply>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(replies: Vec<Reply>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Recognizer for Scripted {
        fn recognize(&self, _image: &RgbaImage) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self.replies.lock().unwrap().pop_front();
            let lines = match reply {
                Some(Reply::Lines(lines)) => lines,
                Some(Reply::Fail) => bail!("scripted failure"),
                Some(Reply::Gated { started, release, lines }) => {
                    let _ = started.send(());
                    let _ = release.recv();
                    lines
                }
                None => Vec::new(),
            };
            Ok(lines.into_iter().map(str::to_string).collect())
        }
    }

    /// Key/value store whose writes always fail.
    struct FailingStore(MemoryStore);

    impl KeyValueStore for FailingStore {
        fn get(&self, key: &str) -> Option<Value> {
            self.0.get(key)
        }

        fn set(&self, key: &str, value: Value) -> Result<()> {
            self.0.set(key, value)?;
            bail!("disk full")
        }
    }

    struct Fixture {
        coordinator: Coordinator,
        _dir: TempDir,
    }

    fn fixture_with(
        config: ScanConfig,
        recognizer: Arc<dyn Recognizer>,
        kv: Arc<dyn KeyValueStore>,
    ) -> Fixture {
        let dir = tempdir().unwrap();
        let (snippets, _) = SnippetStore::open(dir.path().join("snippets.json"));
        let history = SourceHistory::open(kv);
        let coordinator = Coordinator::new(config, recognizer, Arc::new(snippets), Arc::new(history));
        Fixture {
            coordinator,
            _dir: dir,
        }
    }

    fn fixture(recognizer: Arc<dyn Recognizer>) -> Fixture {
        fixture_with(test_config(), recognizer, Arc::new(MemoryStore::new()))
    }

    fn test_config() -> ScanConfig {
        ScanConfig {
            recognition_timeout_ms: 5_000,
            ..ScanConfig::default()
        }
    }

    fn frame() -> Frame {
        Frame::new(ImageBuffer::new(64, 48))
    }

    fn identity(p: Point) -> Point {
        p
    }

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_frames_before_trigger_are_ignored() {
        let recognizer = Scripted::new(vec![]);
        let f = fixture(recognizer.clone());
        let c = &f.coordinator;

        assert!(!c.on_frame(frame(), &identity));
        assert!(!c.is_armed());
        assert_eq!(c.state(), CaptureState::Idle);
        assert!(c.captured_frame().is_none());
        assert_eq!(recognizer.calls(), 0);
    }

    #[test]
    fn test_end_to_end_scan_and_save() {
        let recognizer = Scripted::new(vec![Reply::Lines(vec!["Hello world", "  ", "second line"])]);
        let f = fixture(recognizer.clone());
        let c = &f.coordinator;

        c.trigger();
        assert!(c.is_armed());
        assert!(c.on_frame(frame(), &identity));
        assert!(!c.on_frame(frame(), &identity), "second frame must be ignored");

        let text = c.wait_for_review(WAIT);
        assert_eq!(text.as_deref(), Some("Hello world\n\nsecond line"));
        assert_eq!(c.state(), CaptureState::Reviewing);
        assert!(c.captured_frame().is_some());

        let snippet = c.save(Some("Book A"), &tags(&["quote"])).unwrap();
        assert_eq!(c.state(), CaptureState::Idle);
        assert!(c.review_text().is_none());
        assert!(c.captured_frame().is_none());

        let saved = c.snippets().list();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0], snippet);
        assert_eq!(saved[0].text, "Hello world\n\nsecond line");
        assert_eq!(saved[0].source.as_deref(), Some("Book A"));
        assert_eq!(saved[0].tags, tags(&["quote"]));
        assert_eq!(c.history().recent_sources()[0], "Book A");
        assert_eq!(recognizer.calls(), 1);
    }

    #[test]
    fn test_exactly_one_frame_per_trigger_under_concurrency() {
        let recognizer = Scripted::new(vec![Reply::Lines(vec!["x"])]);
        let f = fixture(recognizer.clone());
        let c = &f.coordinator;

        c.trigger();
        let captured = AtomicUsize::new(0);
        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..25 {
                        if c.on_frame(frame(), &identity) {
                            captured.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                });
            }
        });

        assert_eq!(captured.load(Ordering::SeqCst), 1);
        assert_eq!(c.wait_for_review(WAIT).as_deref(), Some("x"));
        assert_eq!(recognizer.calls(), 1);
    }

    #[test]
    fn test_recognizer_failure_reviews_empty_text() {
        let f = fixture(Scripted::new(vec![Reply::Fail]));
        let c = &f.coordinator;

        c.trigger();
        c.on_frame(frame(), &identity);
        assert_eq!(c.wait_for_review(WAIT).as_deref(), Some(""));
        assert_eq!(c.state(), CaptureState::Reviewing);
    }

    #[test]
    fn test_empty_crop_reviews_empty_text_without_recognizer() {
        let recognizer = Scripted::new(vec![Reply::Lines(vec!["unused"])]);
        let config = ScanConfig {
            roi: NormalizedRect { x: 0.5, y: 0.5, width: 0.0, height: 0.2 },
            ..test_config()
        };
        let f = fixture_with(config, recognizer.clone(), Arc::new(MemoryStore::new()));
        let c = &f.coordinator;

        c.trigger();
        c.on_frame(frame(), &identity);
        assert_eq!(c.wait_for_review(WAIT).as_deref(), Some(""));
        assert_eq!(recognizer.calls(), 0);
    }

    #[test]
    fn test_hung_recognizer_is_bounded() {
        let (_release_tx, release) = mpsc::channel();
        let (started, _started_rx) = mpsc::channel();
        let recognizer = Scripted::new(vec![Reply::Gated { started, release, lines: vec!["late"] }]);
        let config = ScanConfig {
            recognition_timeout_ms: 50,
            ..test_config()
        };
        let f = fixture_with(config, recognizer, Arc::new(MemoryStore::new()));
        let c = &f.coordinator;

        c.trigger();
        c.on_frame(frame(), &identity);
        assert_eq!(c.wait_for_review(WAIT).as_deref(), Some(""));
    }

    #[test]
    fn test_stale_epoch_result_is_dropped() {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let recognizer = Scripted::new(vec![
            Reply::Gated { started: started_tx, release: release_rx, lines: vec!["stale"] },
            Reply::Lines(vec!["fresh"]),
        ]);
        let f = fixture(recognizer.clone());
        let c = &f.coordinator;

        let first = c.trigger();
        assert!(c.on_frame(frame(), &identity));
        started_rx.recv_timeout(WAIT).expect("first recognition started");
        assert_eq!(c.state(), CaptureState::Recognizing);

        let second = c.trigger();
        assert!(second > first);
        assert_eq!(c.state(), CaptureState::Idle);
        assert!(c.on_frame(frame(), &identity));

        release_tx.send(()).unwrap();
        assert_eq!(c.wait_for_review(WAIT).as_deref(), Some("fresh"));
        assert_eq!(c.epoch(), second);
        assert_eq!(recognizer.calls(), 2);
    }

    #[test]
    fn test_retrigger_does_not_wait_out_hung_call() {
        let (started_tx, started_rx) = mpsc::channel();
        let (_release_tx, release_rx) = mpsc::channel();
        let recognizer = Scripted::new(vec![
            Reply::Gated { started: started_tx, release: release_rx, lines: vec!["stale"] },
            Reply::Lines(vec!["fresh"]),
        ]);
        let config = ScanConfig {
            recognition_timeout_ms: 30_000,
            ..ScanConfig::default()
        };
        let f = fixture_with(config, recognizer, Arc::new(MemoryStore::new()));
        let c = &f.coordinator;

        c.trigger();
        assert!(c.on_frame(frame(), &identity));
        started_rx.recv_timeout(WAIT).expect("first recognition started");

        let began = std::time::Instant::now();
        c.trigger();
        assert!(c.on_frame(frame(), &identity));
        assert_eq!(c.wait_for_review(WAIT).as_deref(), Some("fresh"));
        assert!(began.elapsed() < WAIT);
    }

    #[test]
    fn test_stale_result_before_new_frame_leaves_idle() {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let recognizer = Scripted::new(vec![Reply::Gated {
            started: started_tx,
            release: release_rx,
            lines: vec!["stale"],
        }]);
        let f = fixture(recognizer);
        let c = &f.coordinator;

        c.trigger();
        c.on_frame(frame(), &identity);
        started_rx.recv_timeout(WAIT).unwrap();
        c.trigger();

        release_tx.send(()).unwrap();
        assert!(c.wait_for_review(Duration::from_millis(200)).is_none());
        assert_eq!(c.state(), CaptureState::Idle);
        assert!(c.is_armed());
    }

    #[test]
    fn test_trigger_while_reviewing_discards_review() {
        let f = fixture(Scripted::new(vec![Reply::Lines(vec!["one"]), Reply::Lines(vec!["two"])]));
        let c = &f.coordinator;

        c.trigger();
        c.on_frame(frame(), &identity);
        assert_eq!(c.wait_for_review(WAIT).as_deref(), Some("one"));

        c.trigger();
        assert_eq!(c.state(), CaptureState::Idle);
        assert!(c.review_text().is_none());
        assert!(c.save(None, &[]).is_err());

        c.on_frame(frame(), &identity);
        assert_eq!(c.wait_for_review(WAIT).as_deref(), Some("two"));
        assert!(c.snippets().is_empty());
    }

    #[test]
    fn test_discard_has_no_side_effects() {
        let f = fixture(Scripted::new(vec![Reply::Lines(vec!["text"])]));
        let c = &f.coordinator;

        assert!(!c.discard());
        c.trigger();
        c.on_frame(frame(), &identity);
        c.wait_for_review(WAIT);

        assert!(c.discard());
        assert_eq!(c.state(), CaptureState::Idle);
        assert!(c.review_text().is_none());
        assert!(c.snippets().is_empty());
        assert!(c.history().recent_sources().is_empty());
    }

    #[test]
    fn test_save_outside_review_fails() {
        let f = fixture(Scripted::new(vec![]));
        let err = f.coordinator.save(Some("x"), &[]).unwrap_err();
        assert!(err.to_string().contains("Idle"));
    }

    #[test]
    fn test_save_selection_prefers_selected_text() {
        let f = fixture(Scripted::new(vec![
            Reply::Lines(vec!["first line", "second line"]),
            Reply::Lines(vec!["full text"]),
        ]));
        let c = &f.coordinator;

        c.trigger();
        c.on_frame(frame(), &identity);
        c.wait_for_review(WAIT);
        let snippet = c.save_selection("  second line \n", None, &[]).unwrap();
        assert_eq!(snippet.text, "second line");

        c.trigger();
        c.on_frame(frame(), &identity);
        c.wait_for_review(WAIT);
        let snippet = c.save_selection("   ", None, &[]).unwrap();
        assert_eq!(snippet.text, "full text");
    }

    #[test]
    fn test_source_without_tags_gets_default_tag() {
        let f = fixture(Scripted::new(vec![Reply::Lines(vec!["a"]), Reply::Lines(vec!["b"])]));
        let c = &f.coordinator;

        c.trigger();
        c.on_frame(frame(), &identity);
        c.wait_for_review(WAIT);
        let with_source = c.save(Some("  Book A "), &[]).unwrap();
        assert_eq!(with_source.source.as_deref(), Some("Book A"));
        assert_eq!(with_source.tags, tags(&["book-snippet"]));

        c.trigger();
        c.on_frame(frame(), &identity);
        c.wait_for_review(WAIT);
        let without_source = c.save(Some(""), &[]).unwrap();
        assert_eq!(without_source.source, None);
        assert!(without_source.tags.is_empty());
        assert_eq!(c.history().recent_sources(), vec!["Book A"]);
    }

    #[test]
    fn test_suggestion_uses_recent_source() {
        let f = fixture(Scripted::new(vec![Reply::Lines(vec!["a"])]));
        let c = &f.coordinator;
        assert_eq!(c.suggestion(), Suggestion::default());

        c.trigger();
        c.on_frame(frame(), &identity);
        c.wait_for_review(WAIT);
        c.save(Some("Book A"), &tags(&["quote"])).unwrap();

        let suggestion = c.suggestion();
        assert_eq!(suggestion.source.as_deref(), Some("Book A"));
        assert_eq!(suggestion.tags, tags(&["book-snippet"]));
    }

    #[test]
    fn test_history_write_failure_does_not_lose_snippet() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(FailingStore(MemoryStore::new()));
        let f = fixture_with(test_config(), Scripted::new(vec![Reply::Lines(vec!["kept"])]), kv);
        let c = &f.coordinator;

        c.trigger();
        c.on_frame(frame(), &identity);
        c.wait_for_review(WAIT);

        let snippet = c.save(Some("Book A"), &[]).unwrap();
        assert_eq!(snippet.text, "kept");
        assert!(!c.snippets().is_dirty());
        assert_eq!(c.history().recent_sources(), vec!["Book A"]);
    }

    #[test]
    fn test_deliver_frame_uses_preview_layout() {
        let recognizer = Scripted::new(vec![Reply::Lines(vec!["ok"])]);
        let config = ScanConfig {
            roi: NormalizedRect { x: 0.0, y: 0.0, width: 1.0, height: 1.0 },
            preview: Some(crate::roi::PreviewLayout { width: 100.0, height: 100.0 }),
            ..test_config()
        };
        let f = fixture_with(config, recognizer, Arc::new(MemoryStore::new()));
        let c = &f.coordinator;

        c.trigger();
        assert!(c.deliver_frame(frame()));
        assert_eq!(c.wait_for_review(WAIT).as_deref(), Some("ok"));
    }
}
