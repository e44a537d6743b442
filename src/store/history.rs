//! Recently used sources.
//!
//! Keeps the last few distinct source strings (most recent first) plus the
//! single most recent one with the time it was used, for auto-fill.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::kv::{read_value, KeyValueStore};

/// Maximum number of distinct sources kept.
pub const MAX_SOURCES: usize = 10;

const HISTORY_KEY: &str = "source_history";
const LAST_SOURCE_KEY: &str = "last_source";

/// The most recently used source and when it was used.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LastUsed {
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct HistoryState {
    recent: Vec<String>,
    last_used: Option<LastUsed>,
}

/// Bounded, deduplicated source history backed by a key/value store.
pub struct SourceHistory {
    kv: Arc<dyn KeyValueStore>,
    state: Mutex<HistoryState>,
}

impl SourceHistory {
    /// Loads history from `kv`. Missing or malformed entries start empty.
    pub fn open(kv: Arc<dyn KeyValueStore>) -> Self {
        let mut recent: Vec<String> = read_value(kv.as_ref(), HISTORY_KEY).unwrap_or_default();
        recent.truncate(MAX_SOURCES);
        let last_used = read_value(kv.as_ref(), LAST_SOURCE_KEY);

        Self {
            kv,
            state: Mutex::new(HistoryState { recent, last_used }),
        }
    }

    /// Records `source` as just used. Empty sources are ignored.
    pub fn record(&self, source: &str) -> Result<()> {
        self.record_at(source, Utc::now())
    }

    /// Records `source` as used at `now`.
    ///
    /// The in-memory history is updated even if persisting fails; both keys
    /// are attempted and the first error is returned.
    pub fn record_at(&self, source: &str, now: DateTime<Utc>) -> Result<()> {
        if source.is_empty() {
            return Ok(());
        }

        let mut state = self.lock();
        state.recent.retain(|s| s != source);
        state.recent.insert(0, source.to_string());
        state.recent.truncate(MAX_SOURCES);

        let last = LastUsed {
            source: source.to_string(),
            timestamp: now,
        };
        state.last_used = Some(last.clone());

        let list_written = self
            .kv
            .set(HISTORY_KEY, serde_json::to_value(&state.recent)?);
        let last_written = self
            .kv
            .set(LAST_SOURCE_KEY, serde_json::to_value(&last)?);

        if let Err(e) = list_written.as_ref().and(last_written.as_ref()) {
            crate::log(&format!("Failed to persist source history: {:#}", e));
        }
        list_written.and(last_written)
    }

    /// Distinct sources, most recent first.
    pub fn recent_sources(&self) -> Vec<String> {
        self.lock().recent.clone()
    }

    pub fn last_used(&self) -> Option<LastUsed> {
        self.lock().last_used.clone()
    }

    /// The last used source, if it was used within `window` of now.
    pub fn autofill(&self, window: Duration) -> Option<String> {
        self.autofill_at(window, Utc::now())
    }

    /// The last used source, if it was used within `window` of `now`.
    /// Reading does not refresh the timestamp.
    pub fn autofill_at(&self, window: Duration, now: DateTime<Utc>) -> Option<String> {
        let state = self.lock();
        let last = state.last_used.as_ref()?;

        // a timestamp in the future (clock moved back) counts as fresh
        let fresh = match now.signed_duration_since(last.timestamp).to_std() {
            Ok(age) => age <= window,
            Err(_) => true,
        };
        fresh.then(|| last.source.clone())
    }

    fn lock(&self) -> MutexGuard<'_, HistoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
