//! Snippet Scan
//!
//! Command-line front end: runs a still image through the capture pipeline
//! and manages saved snippets and recent sources.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use snippet_scan::capture::{FrameSource, ImageFileSource};
use snippet_scan::config::{get_config, init_config};
use snippet_scan::ocr::{ensure_tessdata, TesseractRecognizer};
use snippet_scan::store::recent_first;
use snippet_scan::{log, paths, Coordinator, JsonFileStore, SnippetStore, SourceHistory};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "snippet-scan",
    version,
    about = "Scan text from a captured frame and keep it as tagged snippets"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recognize the text inside the configured ROI of an image
    Scan {
        /// Image standing in for the captured frame
        image: PathBuf,

        /// Attribution for the snippet; defaults to the recently used source
        #[arg(long)]
        source: Option<String>,

        /// Tag to attach (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Only print the recognized text
        #[arg(long, default_value_t = false)]
        no_save: bool,
    },
    /// List saved snippets, newest first
    List,
    /// Delete a snippet by id
    Delete { id: Uuid },
    /// Show recent sources and tag choices
    Sources,
}

fn main() -> Result<()> {
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = panic_info
            .location()
            .map(|loc| format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_default();
        log(&format!("[PANIC]{} {}", location, msg));
    }));

    let args = Args::parse();

    if let Err(e) = paths::ensure_directories() {
        eprintln!("Warning: failed to create {}: {}", paths::get_logs_dir().display(), e);
    }
    init_config();

    let (snippets, warning) = SnippetStore::open(paths::get_snippets_path());
    if let Some(e) = warning {
        eprintln!("Warning: saved snippets could not be loaded: {:#}", e);
    }
    let (settings, warning) = JsonFileStore::open(paths::get_settings_path());
    if let Some(e) = warning {
        eprintln!("Warning: source history could not be loaded: {:#}", e);
    }
    let snippets = Arc::new(snippets);
    let history = Arc::new(SourceHistory::open(Arc::new(settings)));

    match args.command {
        Command::Scan {
            image,
            source,
            tags,
            no_save,
        } => scan(image, source, tags, no_save, snippets, history),
        Command::List => {
            list(&snippets);
            Ok(())
        }
        Command::Delete { id } => {
            if snippets.delete(id)? {
                println!("Deleted {}", id);
            } else {
                println!("No snippet with id {}", id);
            }
            Ok(())
        }
        Command::Sources => {
            sources(&history);
            Ok(())
        }
    }
}

/// Runs one trigger → frame → recognize → review cycle on `image`.
fn scan(
    image: PathBuf,
    source: Option<String>,
    tags: Vec<String>,
    no_save: bool,
    snippets: Arc<SnippetStore>,
    history: Arc<SourceHistory>,
) -> Result<()> {
    let config = get_config().clone();

    if let Err(e) = ensure_tessdata(&config.ocr.language) {
        log(&format!("Warning: tessdata setup failed: {:#}", e));
        log("Recognition may fail until trained data is installed.");
    }

    let frame = ImageFileSource::new(&image)
        .next_frame()
        .with_context(|| format!("Cannot scan {}", image.display()))?;

    let wait = config.recognition_timeout() + Duration::from_secs(5);
    let recognizer = Arc::new(TesseractRecognizer::new(config.ocr.clone()));
    let coordinator = Coordinator::new(config, recognizer, snippets, history);

    let suggestion = coordinator.suggestion();
    coordinator.trigger();
    coordinator.deliver_frame(frame);

    let text = coordinator.wait_for_review(wait).unwrap_or_default();
    if text.is_empty() {
        println!("(no text recognized)");
    } else {
        println!("{}", text);
    }

    if no_save || text.is_empty() {
        coordinator.discard();
        return Ok(());
    }

    let source = source.or(suggestion.source);
    let tags = if tags.is_empty() { suggestion.tags } else { tags };
    let snippet = coordinator.save(source.as_deref(), &tags)?;
    println!();
    println!("Saved snippet {}", snippet.id);
    Ok(())
}

fn list(snippets: &SnippetStore) {
    let all = recent_first(&snippets.list());
    if all.is_empty() {
        println!("No snippets saved yet.");
        return;
    }

    for snippet in all {
        let when = snippet.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M");
        let source = snippet.source.as_deref().unwrap_or("-");
        println!("{}  {}  {}  [{}]", snippet.id, when, source, snippet.tags.join(", "));
        for line in snippet.text.lines() {
            println!("    {}", line);
        }
        println!();
    }
}

fn sources(history: &SourceHistory) {
    let config = get_config();
    match history.autofill(config.autofill_window()) {
        Some(source) => println!("Auto-fill: {}", source),
        None => println!("Auto-fill: (none)"),
    }
    for (i, source) in history.recent_sources().iter().enumerate() {
        println!("{:>2}. {}", i + 1, source);
    }
    println!("Tags: {}", config.predefined_tags.join(", "));
}
