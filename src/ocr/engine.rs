use anyhow::{anyhow, Context, Result};
use image::RgbaImage;
use std::process::Command;
use tempfile::NamedTempFile;

use super::preprocess::prepare_for_ocr;
use super::setup::{find_tessdata_dir, find_tesseract_executable};
use crate::config::OcrConfig;

/// Text recognition over a cropped frame.
///
/// Returns recognized lines in reading order; an empty vector means nothing
/// was found. Implementations may be slow and are called off the frame thread.
pub trait Recognizer: Send + Sync {
    fn recognize(&self, image: &RgbaImage) -> Result<Vec<String>>;
}

/// Represents a line of OCR text with confidence score
#[derive(Debug, Clone, PartialEq)]
pub struct OcrLine {
    pub text: String,
    pub confidence: f32,
}

/// Recognizer backed by the Tesseract command-line tool.
pub struct TesseractRecognizer {
    config: OcrConfig,
}

impl TesseractRecognizer {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    /// Runs Tesseract with TSV output and returns lines with confidence.
    pub fn recognize_lines(&self, image: &RgbaImage) -> Result<Vec<OcrLine>> {
        let tesseract_exe = find_tesseract_executable()?;
        let prepared = prepare_for_ocr(image, self.config.threshold);

        let temp_input = NamedTempFile::with_suffix(".png")?;
        prepared
            .save(temp_input.path())
            .context("Failed to write OCR input image")?;

        // Tesseract appends .tsv to the output base
        let temp_output = NamedTempFile::new()?;
        let output_base = temp_output.path().to_string_lossy().to_string();

        let mut cmd = Command::new(&tesseract_exe);
        cmd.arg(temp_input.path()).arg(&output_base);
        if let Some(tessdata_dir) = find_tessdata_dir(&self.config.language) {
            cmd.arg("--tessdata-dir").arg(tessdata_dir);
        }
        let output = cmd
            .arg("-l")
            .arg(&self.config.language)
            .arg("--psm")
            .arg(self.config.psm.to_string())
            .arg("tsv")
            .output()
            .with_context(|| format!("Failed to run {}", tesseract_exe.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr.trim()));
        }

        let tsv_path = format!("{}.tsv", output_base);
        let tsv_content = std::fs::read_to_string(&tsv_path)
            .map_err(|e| anyhow!("Failed to read Tesseract output: {}", e))?;
        let _ = std::fs::remove_file(&tsv_path);

        Ok(parse_tsv_output(&tsv_content))
    }
}

impl Recognizer for TesseractRecognizer {
    fn recognize(&self, image: &RgbaImage) -> Result<Vec<String>> {
        let lines = self.recognize_lines(image)?;
        crate::log(&format!(
            "Tesseract returned {} line(s), mean confidence {:.1}",
            lines.len(),
            mean_confidence(&lines)
        ));
        Ok(lines.into_iter().map(|l| l.text).collect())
    }
}

/// Average confidence of the non-blank lines; 0 when there are none.
pub fn mean_confidence(lines: &[OcrLine]) -> f32 {
    let scored: Vec<f32> = lines
        .iter()
        .filter(|l| !l.text.is_empty())
        .map(|l| l.confidence)
        .collect();
    if scored.is_empty() {
        0.0
    } else {
        scored.iter().sum::<f32>() / scored.len() as f32
    }
}

/// Parses Tesseract TSV output into lines.
///
/// TSV fields: level, page_num, block_num, par_num, line_num, word_num,
/// left, top, width, height, conf, text. Words (level 5) are grouped by
/// (block, paragraph, line); an empty paragraph boundary becomes a blank line
/// so the cleaner can keep paragraph breaks.
pub fn parse_tsv_output(tsv: &str) -> Vec<OcrLine> {
    let mut lines: Vec<OcrLine> = Vec::new();
    let mut current_key: Option<(i32, i32, i32)> = None;
    let mut current_words: Vec<&str> = Vec::new();
    let mut conf_sum = 0.0f32;

    for row in tsv.lines().skip(1) {
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        let level: i32 = fields[0].parse().unwrap_or(-1);
        if level != 5 {
            continue;
        }
        let text = fields[11].trim();
        let conf: f32 = fields[10].parse().unwrap_or(-1.0);
        if text.is_empty() || conf < 0.0 {
            continue;
        }

        let key: (i32, i32, i32) = (
            fields[2].parse().unwrap_or(-1),
            fields[3].parse().unwrap_or(-1),
            fields[4].parse().unwrap_or(-1),
        );

        if let Some(prev) = current_key.filter(|prev| *prev != key) {
            flush_line(&mut lines, &mut current_words, &mut conf_sum);
            if (prev.0, prev.1) != (key.0, key.1) {
                lines.push(OcrLine {
                    text: String::new(),
                    confidence: 0.0,
                });
            }
        }

        current_key = Some(key);
        current_words.push(text);
        conf_sum += conf;
    }

    flush_line(&mut lines, &mut current_words, &mut conf_sum);
    lines
}

fn flush_line(lines: &mut Vec<OcrLine>, words: &mut Vec<&str>, conf_sum: &mut f32) {
    if !words.is_empty() {
        lines.push(OcrLine {
            text: words.join(" "),
            confidence: *conf_sum / words.len() as f32,
        });
    }
    words.clear();
    *conf_sum = 0.0;
}
