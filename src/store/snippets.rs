//! Saved snippets.
//!
//! The whole collection is one JSON document, rewritten atomically after
//! every mutation. Memory is the source of truth: a failed write leaves the
//! in-memory change in place and marks the store dirty, and the next write
//! (any mutation, or `flush`) carries the missed delta since it always
//! serializes the full collection.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::atomic::write_atomically;

/// A saved piece of recognized text.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snippet {
    pub id: Uuid,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Optional attribution, e.g. a book title
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Snippet {
    /// Creates a snippet with a fresh id and the current time.
    /// The source is trimmed (empty becomes `None`) and tags are normalized.
    pub fn new(text: impl Into<String>, source: Option<&str>, tags: &[String]) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            timestamp: Utc::now(),
            source: normalize_source(source),
            tags: normalize_tags(tags),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Tags compare as a set; display order is not part of identity.
impl PartialEq for Snippet {
    fn eq(&self, other: &Self) -> bool {
        let tags: HashSet<&str> = self.tags.iter().map(String::as_str).collect();
        let other_tags: HashSet<&str> = other.tags.iter().map(String::as_str).collect();
        self.id == other.id
            && self.text == other.text
            && self.timestamp == other.timestamp
            && self.source == other.source
            && tags == other_tags
    }
}

impl Eq for Snippet {}

/// Trims a source string; blank becomes `None`.
pub fn normalize_source(source: Option<&str>) -> Option<String> {
    source
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Trims tags, drops blanks and repeats, keeps first-seen order.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty() && seen.insert(*t))
        .map(str::to_string)
        .collect()
}

/// Returns snippets ordered newest first.
pub fn recent_first(snippets: &[Snippet]) -> Vec<Snippet> {
    let mut sorted = snippets.to_vec();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    sorted
}

#[derive(Debug, Default)]
struct StoreState {
    snippets: Vec<Snippet>,
    /// Last write failed; memory holds changes not yet on disk
    dirty: bool,
    /// The document on disk could not be read or moved aside; never overwrite it
    protected: bool,
}

/// Durable snippet collection.
#[derive(Debug)]
pub struct SnippetStore {
    path: PathBuf,
    state: Mutex<StoreState>,
}

impl SnippetStore {
    /// Opens the collection stored at `path`.
    ///
    /// A missing document starts empty. A document that cannot be decoded
    /// (bad UTF-8 or bad JSON) is moved aside to `<name>.corrupt-<timestamp>`
    /// and the store starts empty. A document that cannot be read at all is
    /// left in place and the store refuses to overwrite it. The reason is
    /// returned as a warning for the caller to surface.
    pub fn open(path: impl AsRef<Path>) -> (Self, Option<anyhow::Error>) {
        let path = path.as_ref().to_path_buf();
        let mut protected = false;
        let (snippets, warning) = match load_snippets(&path) {
            Ok(snippets) => {
                crate::log(&format!(
                    "Loaded {} snippet(s) from {}",
                    snippets.len(),
                    path.display()
                ));
                (snippets, None)
            }
            Err(e) => {
                crate::log(&format!("Snippets unreadable, starting empty: {:#}", e));
                // still there: either unreadable or could not be moved aside
                protected = path.exists();
                if protected {
                    crate::log(&format!("{} will not be overwritten", path.display()));
                }
                (Vec::new(), Some(e))
            }
        };

        let store = Self {
            path,
            state: Mutex::new(StoreState {
                snippets,
                dirty: false,
                protected,
            }),
        };
        (store, warning)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates a snippet, appends it and persists the collection.
    ///
    /// On a write failure the snippet stays in memory (see `list`) and the
    /// error is returned.
    pub fn add(&self, text: impl Into<String>, source: Option<&str>, tags: &[String]) -> Result<Snippet> {
        let snippet = Snippet::new(text, source, tags);
        let mut state = self.lock();
        state.snippets.push(snippet.clone());
        crate::log(&format!(
            "Added snippet {} ({} chars, {} tag(s))",
            snippet.id,
            snippet.text.chars().count(),
            snippet.tags.len()
        ));

        self.persist(&mut state)
            .with_context(|| format!("Snippet {} kept in memory only", snippet.id))?;
        Ok(snippet)
    }

    /// All snippets in insertion order.
    pub fn list(&self) -> Vec<Snippet> {
        self.lock().snippets.clone()
    }

    pub fn get(&self, id: Uuid) -> Option<Snippet> {
        self.lock().snippets.iter().find(|s| s.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().snippets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes the snippet with `id` if present. Returns whether one was removed.
    /// Unknown ids are not an error.
    pub fn delete(&self, id: Uuid) -> Result<bool> {
        let mut state = self.lock();
        let before = state.snippets.len();
        state.snippets.retain(|s| s.id != id);
        let removed = state.snippets.len() != before;

        if removed {
            crate::log(&format!("Deleted snippet {}", id));
        }
        if removed || state.dirty {
            self.persist(&mut state)?;
        }
        Ok(removed)
    }

    /// Writes the collection if an earlier write failed.
    pub fn flush(&self) -> Result<()> {
        let mut state = self.lock();
        if state.dirty {
            self.persist(&mut state)?;
        }
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.lock().dirty
    }

    fn persist(&self, state: &mut StoreState) -> Result<()> {
        if state.protected {
            state.dirty = true;
            bail!(
                "{} could not be loaded and is left untouched; snippets kept in memory only",
                self.path.display()
            );
        }

        let result = serde_json::to_vec_pretty(&state.snippets)
            .context("Failed to serialize snippets")
            .and_then(|bytes| write_atomically(&self.path, &bytes))
            .with_context(|| format!("Failed to write snippets to {}", self.path.display()));

        match &result {
            Ok(()) => state.dirty = false,
            Err(e) => {
                crate::log(&format!("{:#}", e));
                state.dirty = true;
            }
        }
        result
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn load_snippets(path: &Path) -> Result<Vec<Snippet>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let contents = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    serde_json::from_slice(&contents).map_err(|e| {
        let parse_error = anyhow::Error::new(e).context(format!("Failed to parse {}", path.display()));
        match move_aside(path) {
            Ok(backup) => parse_error.context(format!("moved to {}", backup.display())),
            Err(move_error) => {
                crate::log(&format!("Could not move corrupt snippets aside: {:#}", move_error));
                parse_error
            }
        }
    })
}

/// Renames an unreadable document to `<name>.corrupt-<YYYYmmdd_HHMMSS>`.
fn move_aside(path: &Path) -> Result<PathBuf> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "snippets.json".into());
    name.push(format!(".corrupt-{}", stamp));
    let backup = path.with_file_name(name);

    fs::rename(path, &backup)
        .with_context(|| format!("Failed to rename {}", path.display()))?;
    Ok(backup)
}
