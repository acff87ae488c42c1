//! # Document Processing
//!
//! Ties the image pipeline and the text corrector together around an
//! external OCR engine. The engine sits behind [`TextRecognizer`], so any
//! backend (a Tesseract binding, a remote service, pre-recognized sidecar
//! text) can be plugged in without touching either half.

use std::time::Instant;

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error_correction::{CorrectionReport, TextCorrector};
use crate::errors::{error_logging, AppError, AppResult};
use crate::observability::{document_span, phase_span, record_document_metrics};
use crate::preprocessing::{ImagePreprocessingPipeline, PipelineReport, PixelBuffer};

/// External OCR engine seam.
///
/// Receives the cleaned binary page and returns UTF-8 text. Positional
/// metadata, if the engine has any, is not consumed.
pub trait TextRecognizer {
    fn recognize(&self, image: &PixelBuffer) -> anyhow::Result<String>;
}

/// Recognizer that returns text produced ahead of time, for example by an
/// OCR engine run outside this process.
#[derive(Debug, Clone)]
pub struct PrecomputedText {
    text: String,
}

impl PrecomputedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl TextRecognizer for PrecomputedText {
    fn recognize(&self, _image: &PixelBuffer) -> anyhow::Result<String> {
        Ok(self.text.clone())
    }
}

/// Timings and per-half reports for one document.
#[derive(Debug, Clone)]
pub struct DocumentReport {
    pub pipeline: PipelineReport,
    pub correction: CorrectionReport,
    pub recognition_time_ms: u32,
    pub total_processing_time_ms: u32,
}

/// Everything produced for one document.
#[derive(Debug, Clone)]
pub struct DocumentOutput {
    /// Binary page handed to the recognizer
    pub cleaned: PixelBuffer,
    /// Text exactly as the recognizer returned it
    pub raw_text: String,
    pub corrected_text: String,
    pub report: DocumentReport,
}

/// Image bytes in, corrected text out.
#[derive(Debug, Clone, Default)]
pub struct DocumentProcessor {
    pipeline: ImagePreprocessingPipeline,
    corrector: TextCorrector,
}

impl DocumentProcessor {
    pub fn new(pipeline: ImagePreprocessingPipeline, corrector: TextCorrector) -> Self {
        Self {
            pipeline,
            corrector,
        }
    }

    /// Builds both halves from an application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            ImagePreprocessingPipeline::new(config.pipeline.clone()),
            TextCorrector::new(config.correction.clone()),
        )
    }

    pub fn pipeline(&self) -> &ImagePreprocessingPipeline {
        &self.pipeline
    }

    pub fn corrector(&self) -> &TextCorrector {
        &self.corrector
    }

    /// Cleans the page, recognizes it and corrects the text.
    ///
    /// `progress` receives the eight preprocessing labels followed by the
    /// four correction labels.
    ///
    /// # Errors
    ///
    /// `AppError::Image` when the bytes cannot be decoded or have zero area,
    /// `AppError::Ocr` when the recognizer fails. Correction itself never
    /// fails.
    pub fn process<F>(
        &self,
        bytes: &[u8],
        recognizer: &dyn TextRecognizer,
        mut progress: F,
    ) -> AppResult<DocumentOutput>
    where
        F: FnMut(&str),
    {
        let span = document_span("bytes");
        let _enter = span.enter();
        let start_time = Instant::now();

        let buffer = PixelBuffer::decode(bytes).map_err(|e| {
            error_logging::log_image_error(&e, "decode", None, Some(bytes.len()));
            record_document_metrics(false, start_time.elapsed(), bytes.len());
            AppError::from(e)
        })?;

        let (cleaned, pipeline_report) = phase_span("preprocessing").in_scope(|| {
            self.pipeline
                .process_with_report(buffer, &mut progress)
                .map_err(|e| {
                    record_document_metrics(false, start_time.elapsed(), bytes.len());
                    AppError::from(e)
                })
        })?;

        let recognition_start = Instant::now();
        let recognized = phase_span("recognition").in_scope(|| recognizer.recognize(&cleaned));
        let raw_text = recognized.map_err(|e| {
            let elapsed = recognition_start.elapsed();
            error_logging::log_ocr_error(&e, "recognize", Some(cleaned.dimensions()), Some(elapsed));
            record_document_metrics(false, start_time.elapsed(), bytes.len());
            AppError::Ocr(format!("Text recognition failed: {}", e))
        })?;
        let recognition_time = recognition_start.elapsed();

        if raw_text.trim().is_empty() {
            warn!(
                dimensions = ?cleaned.dimensions(),
                "Recognizer returned no text"
            );
        }

        let (corrected_text, correction_report) = phase_span("correction")
            .in_scope(|| self.corrector.correct_with_progress(&raw_text, &mut progress));

        let total_time = start_time.elapsed();
        record_document_metrics(true, total_time, bytes.len());

        info!(
            input_bytes = bytes.len(),
            raw_chars = raw_text.chars().count(),
            corrections = correction_report.total_changes(),
            rotated = pipeline_report.rotation_applied,
            duration_ms = total_time.as_millis() as u64,
            "Document processed"
        );

        Ok(DocumentOutput {
            cleaned,
            raw_text,
            corrected_text,
            report: DocumentReport {
                pipeline: pipeline_report,
                correction: correction_report,
                recognition_time_ms: recognition_time.as_millis() as u32,
                total_processing_time_ms: total_time.as_millis() as u32,
            },
        })
    }
}
