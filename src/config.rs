//! Configuration types.
//!
//! Loads settings from config.json in the data directory at startup.
//! Every field has a default, so a partial file is fine.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use crate::roi::{NormalizedRect, PreviewLayout};

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<ScanConfig> = OnceLock::new();

/// Tesseract options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Tesseract language code
    pub language: String,
    /// Page segmentation mode (6 = single uniform block of text)
    pub psm: u8,
    /// Binarization threshold; `None` leaves binarization to Tesseract
    pub threshold: Option<u8>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            psm: 6,
            threshold: None,
        }
    }
}

/// Complete scanner configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Region of interest in normalized display coordinates
    pub roi: NormalizedRect,
    /// On-screen preview size; `None` means the display shows the whole frame
    pub preview: Option<PreviewLayout>,
    /// How long to wait for the recognizer before treating it as failed
    pub recognition_timeout_ms: u64,
    /// How long the last used source stays offered as a default
    pub autofill_window_secs: u64,
    /// Tags offered for quick selection
    pub predefined_tags: Vec<String>,
    /// Tag applied when a source is given but no tag is picked
    pub default_tag: String,
    pub ocr: OcrConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            roi: NormalizedRect::default(),
            preview: None,
            recognition_timeout_ms: 15_000,
            autofill_window_secs: 3600,
            predefined_tags: [
                "book-snippet",
                "idea",
                "quote",
                "definition",
                "reference",
                "question",
                "insight",
                "research",
            ]
            .iter()
            .map(|t| t.to_string())
            .collect(),
            default_tag: "book-snippet".to_string(),
            ocr: OcrConfig::default(),
        }
    }
}

impl ScanConfig {
    pub fn recognition_timeout(&self) -> Duration {
        Duration::from_millis(self.recognition_timeout_ms)
    }

    pub fn autofill_window(&self) -> Duration {
        Duration::from_secs(self.autofill_window_secs)
    }
}

/// Loads configuration from `path`, or returns defaults.
///
/// A missing file is normal; an unreadable or invalid one is logged and
/// replaced by defaults. An out-of-range ROI falls back to the default ROI.
pub fn load_config_from(path: &Path) -> ScanConfig {
    if !path.exists() {
        crate::log(&format!(
            "{} not found. Using default config.",
            path.display()
        ));
        return ScanConfig::default();
    }

    let mut config = match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<ScanConfig>(&contents) {
            Ok(config) => {
                crate::log(&format!("Config loaded from {}", path.display()));
                config
            }
            Err(e) => {
                crate::log(&format!(
                    "Failed to parse {}: {}. Using defaults.",
                    path.display(),
                    e
                ));
                return ScanConfig::default();
            }
        },
        Err(e) => {
            crate::log(&format!(
                "Failed to read {}: {}. Using defaults.",
                path.display(),
                e
            ));
            return ScanConfig::default();
        }
    };

    if !config.roi.is_valid() {
        crate::log(&format!(
            "Configured ROI {:?} is outside the unit square. Using default ROI.",
            config.roi
        ));
        config.roi = NormalizedRect::default();
    }

    config
}

/// Initializes the global configuration from the data directory. Call once at startup.
pub fn init_config() {
    let _ = CONFIG.set(load_config_from(&crate::paths::get_config_path()));
}

/// Returns the global configuration, or defaults if `init_config` was never called.
pub fn get_config() -> &'static ScanConfig {
    CONFIG.get_or_init(ScanConfig::default)
}
