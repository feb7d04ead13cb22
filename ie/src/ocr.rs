//! OCR wrapper.
//!
//! Recognition sits behind [`TextRecognizer`] so the rest of the crate never
//! touches the engine directly. The production engine is `ocr-rs` (Rust
//! PaddleOCR bindings); tests script their own recognizer.
//! Preprocessing happens before this module, see [`crate::preprocess_for_ocr`].

use std::path::Path;

use anyhow::Context;

/// One recognized text line with its confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub confidence: f32,
}

impl TextLine {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self { text: text.into(), confidence }
    }
}

/// Image in, ordered candidate lines out. An empty list means nothing was read.
pub trait TextRecognizer {
    fn recognize(&self, image: crate::Image) -> Vec<TextLine>;
}

/// Highest-confidence line, trimmed; empty if nothing was recognized.
pub fn best_text(lines: &[TextLine]) -> String {
    lines
        .iter()
        .fold(None::<&TextLine>, |best, line| match best {
            Some(b) if b.confidence >= line.confidence => Some(b),
            _ => Some(line),
        })
        .map(|line| line.text.trim().to_owned())
        .unwrap_or_default()
}

pub struct Ocr {
    engine: ocr_rs::OcrEngine,
}

impl Ocr {
    /// Initialize the OCR engine with the given model paths.
    pub fn try_new(
        detection: impl AsRef<Path>,
        recognition: impl AsRef<Path>,
        charsset: impl AsRef<Path>,
    ) -> anyhow::Result<Self> {
        let thread_count = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        let engine = ocr_rs::OcrEngine::new(
            detection,
            recognition,
            charsset,
            Some(ocr_rs::OcrEngineConfig {
                backend: ocr_rs::Backend::CPU,
                thread_count,
                // Stat labels are short, stylized and thin; High helps more than it costs.
                precision_mode: ocr_rs::PrecisionMode::High,
                enable_parallel: thread_count > 1,
                min_result_confidence: 0.5,
                ..Default::default()
            }),
        )
        .context("failed to initialize OCR engine (missing or invalid model files?)")?;

        Ok(Self { engine })
    }
}

impl TextRecognizer for Ocr {
    fn recognize(&self, image: crate::Image) -> Vec<TextLine> {
        let image = ocr_rs::preprocess::rgb_to_image(&image.get_bytes(), image.width(), image.height());

        match self.engine.recognize(&image) {
            Ok(results) => results
                .into_iter()
                .map(|v| TextLine::new(v.text, v.confidence))
                .collect(),
            Err(err) => {
                tracing::warn!(error = %err, "ocr failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_text_picks_highest_confidence() {
        let lines = vec![TextLine::new("Flow", 0.6), TextLine::new(" Assault ", 0.9), TextLine::new("Pursuit", 0.9)];
        assert_eq!(best_text(&lines), "Assault");
        assert_eq!(best_text(&[]), "");
    }
}
