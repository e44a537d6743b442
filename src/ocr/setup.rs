use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::log;
use crate::paths::get_tesseract_dir;
use crate::store::write_atomically;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

/// Environment variable pointing at a specific tesseract executable.
pub const TESSERACT_PATH_ENV: &str = "TESSERACT_PATH";

const COMMON_EXECUTABLES: &[&str] = &[
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
];

const SYSTEM_TESSDATA_DIRS: &[&str] = &[
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    "/opt/homebrew/share/tessdata",
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
];

/// Finds the Tesseract executable: `$TESSERACT_PATH`, our local dir, PATH,
/// then common install locations.
pub fn find_tesseract_executable() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(TESSERACT_PATH_ENV).map(PathBuf::from) {
        if path.exists() {
            return Ok(path);
        }
        log(&format!(
            "{} points at {}, which does not exist",
            TESSERACT_PATH_ENV,
            path.display()
        ));
    }

    let tesseract_dir = get_tesseract_dir();
    for name in ["tesseract", "tesseract.exe"] {
        let local_exe = tesseract_dir.join(name);
        if local_exe.exists() {
            return Ok(local_exe);
        }
    }

    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    COMMON_EXECUTABLES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or_else(|| anyhow!("Tesseract not found. Please install Tesseract-OCR."))
}

/// Finds a tessdata directory containing `<language>.traineddata`.
///
/// Returns `None` when nothing is found; Tesseract then falls back to its
/// compiled-in default.
pub fn find_tessdata_dir(language: &str) -> Option<PathBuf> {
    let file_name = format!("{}.traineddata", language);
    let has_language = |dir: &Path| dir.join(&file_name).exists();

    let local_tessdata = get_tesseract_dir().join("tessdata");
    if has_language(local_tessdata.as_path()) {
        return Some(local_tessdata);
    }

    if let Some(prefix) = std::env::var_os("TESSDATA_PREFIX").map(PathBuf::from) {
        if has_language(prefix.as_path()) {
            return Some(prefix);
        }
        let nested = prefix.join("tessdata");
        if has_language(nested.as_path()) {
            return Some(nested);
        }
    }

    SYSTEM_TESSDATA_DIRS
        .iter()
        .map(PathBuf::from)
        .find(|p| has_language(p.as_path()))
}

/// Makes sure trained data for `language` is available, downloading it into
/// the local tessdata directory if no installed copy is found.
pub fn ensure_tessdata(language: &str) -> Result<PathBuf> {
    if let Some(dir) = find_tessdata_dir(language) {
        log(&format!("Tessdata for '{}' found at: {}", language, dir.display()));
        return Ok(dir);
    }

    let tessdata_dir = get_tesseract_dir().join("tessdata");
    fs::create_dir_all(&tessdata_dir)
        .with_context(|| format!("Failed to create {}", tessdata_dir.display()))?;
    download_tessdata(&tessdata_dir, language)?;
    Ok(tessdata_dir)
}

/// Downloads `<language>.traineddata` from the tessdata repository
fn download_tessdata(tessdata_dir: &Path, language: &str) -> Result<()> {
    let url = format!("{}/{}.traineddata", TESSDATA_REPO, language);
    let target = tessdata_dir.join(format!("{}.traineddata", language));

    log(&format!("Downloading {}.traineddata...", language));

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&url)
        .header("User-Agent", "snippet-scan")
        .send()?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}.traineddata: HTTP {}",
            language,
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    save_traineddata(&target, &bytes)?;

    log(&format!(
        "Downloaded {}.traineddata ({} bytes)",
        language,
        bytes.len()
    ));

    Ok(())
}

/// Installs downloaded trained data. An interrupted write leaves no file
/// under the final name.
fn save_traineddata(target: &Path, bytes: &[u8]) -> Result<()> {
    write_atomically(target, bytes)
        .with_context(|| format!("Failed to save {}", target.display()))
}
