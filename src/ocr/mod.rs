pub mod clean;
pub mod engine;
pub mod preprocess;
pub mod setup;

pub use clean::{clean_lines, clean_text};
pub use engine::{Recognizer, TesseractRecognizer};
pub use preprocess::prepare_for_ocr;
pub use setup::ensure_tessdata;
