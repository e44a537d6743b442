use std::path::PathBuf;
use std::sync::OnceLock;

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Environment variable that overrides the data directory.
pub const HOME_ENV: &str = "SNIPPET_SCAN_HOME";

/// Returns the data directory: `$SNIPPET_SCAN_HOME`, or `<local data>/snippet-scan/`
pub fn get_data_dir() -> &'static PathBuf {
    DATA_DIR.get_or_init(|| {
        std::env::var_os(HOME_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::data_local_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("snippet-scan")
            })
    })
}

/// Returns the logs directory: `<data_dir>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_data_dir().join("logs")
}

/// Returns the snippet document path: `<data_dir>/snippets.json`
pub fn get_snippets_path() -> PathBuf {
    get_data_dir().join("snippets.json")
}

/// Returns the key/value settings path: `<data_dir>/settings.json`
pub fn get_settings_path() -> PathBuf {
    get_data_dir().join("settings.json")
}

/// Returns the config path: `<data_dir>/config.json`
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.json")
}

/// Returns the local tesseract directory: `<data_dir>/tesseract/`
pub fn get_tesseract_dir() -> PathBuf {
    get_data_dir().join("tesseract")
}

/// Ensures all output directories exist. Call at startup.
pub fn ensure_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_logs_dir())?;
    Ok(())
}
