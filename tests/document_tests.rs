//! # Document Processing Tests
//!
//! Image bytes through cleanup, a recognizer and correction.

use std::cell::Cell;
use std::io::Cursor;

use docnorm::config::AppConfig;
use docnorm::document::{DocumentProcessor, PrecomputedText, TextRecognizer};
use docnorm::error_correction::DocumentProfile;
use docnorm::errors::AppError;
use docnorm::preprocessing::PixelBuffer;
use image::{DynamicImage, GrayImage, ImageFormat, Luma};

/// Recognizer that records what it was handed.
struct RecordingRecognizer {
    text: &'static str,
    calls: Cell<usize>,
    last_dimensions: Cell<(u32, u32)>,
}

impl RecordingRecognizer {
    fn new(text: &'static str) -> Self {
        Self {
            text,
            calls: Cell::new(0),
            last_dimensions: Cell::new((0, 0)),
        }
    }
}

impl TextRecognizer for RecordingRecognizer {
    fn recognize(&self, image: &PixelBuffer) -> anyhow::Result<String> {
        assert!(image.is_binary(), "recognizer must receive a binary page");
        self.calls.set(self.calls.get() + 1);
        self.last_dimensions.set(image.dimensions());
        Ok(self.text.to_string())
    }
}

fn encode_png(image: GrayImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageLuma8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn text_page() -> Vec<u8> {
    encode_png(GrayImage::from_fn(96, 72, |x, y| {
        if (12..84).contains(&x) && y % 16 < 5 {
            Luma([20])
        } else {
            Luma([225])
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_flow_with_recording_recognizer() {
        let processor = DocumentProcessor::default();
        let recognizer = RecordingRecognizer::new("Tlie report arid the page.");
        let mut labels = Vec::new();

        let output = processor
            .process(&text_page(), &recognizer, |label| labels.push(label.to_string()))
            .unwrap();

        assert_eq!(recognizer.calls.get(), 1);
        assert_eq!(recognizer.last_dimensions.get(), output.cleaned.dimensions());
        assert_eq!(output.corrected_text, "The report and the page.");
        assert_eq!(labels.len(), 12);
        assert_eq!(labels[7], "Sharpening");
        assert_eq!(labels[11], "Enforcing document consistency");
        assert_eq!(output.report.pipeline.stages.len(), 8);
        assert_eq!(output.report.correction.contextual_changes, 2);
    }

    #[test]
    fn test_profile_from_config_reaches_corrector() {
        let mut config = AppConfig::default();
        config.correction.profile = DocumentProfile::Official;
        config.pipeline.parallel = false;
        let processor = DocumentProcessor::from_config(&config);

        assert!(!processor.pipeline().config().parallel);
        assert_eq!(processor.corrector().config().profile, DocumentProfile::Official);

        let output = processor
            .process(&text_page(), &PrecomputedText::new("ministiy"), |_| {})
            .unwrap();
        assert_eq!(output.corrected_text, "ministry");
    }

    #[test]
    fn test_empty_recognition_is_not_an_error() {
        let processor = DocumentProcessor::default();
        let output = processor
            .process(&text_page(), &PrecomputedText::new(""), |_| {})
            .unwrap();
        assert_eq!(output.raw_text, "");
        assert_eq!(output.corrected_text, "");
        assert_eq!(output.report.correction.total_changes(), 0);
    }

    #[test]
    fn test_undecodable_bytes_never_reach_recognizer() {
        let processor = DocumentProcessor::default();
        let recognizer = RecordingRecognizer::new("unused");
        let err = processor
            .process(&[0x89, 0x50, 0x4e, 0x47], &recognizer, |_| {})
            .unwrap_err();

        assert!(matches!(err, AppError::Image(_)));
        assert!(err.to_string().starts_with("[IMAGE]"));
        assert_eq!(recognizer.calls.get(), 0);
    }
}
