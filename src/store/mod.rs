//! Durable state.
//!
//! This module provides:
//! - Atomic whole-document writes (`write_atomically`)
//! - The key/value capability used for small settings (`KeyValueStore`)
//! - The snippet collection (`SnippetStore`)
//! - The recent-source list and auto-fill slot (`SourceHistory`)

pub mod atomic;
pub mod history;
pub mod kv;
pub mod snippets;

pub use atomic::write_atomically;
pub use history::{LastUsed, SourceHistory, MAX_SOURCES};
pub use kv::{JsonFileStore, KeyValueStore, MemoryStore};
pub use snippets::{recent_first, Snippet, SnippetStore};
