//! # docnorm
//!
//! Document image normalization and OCR text correction.
//!
//! The image half turns a scanned or photographed page into a clean binary
//! image ready for an OCR engine. The text half repairs the engine's raw
//! Bengali and Latin output with glyph normalization, bidirectional
//! contextual correction and document-wide spelling consistency.

pub mod config;
pub mod document;
pub mod error_correction;
pub mod errors;
pub mod observability;
pub mod preprocessing;

// Re-export types for easier access
pub use config::AppConfig;
pub use document::{DocumentOutput, DocumentProcessor, PrecomputedText, TextRecognizer};
pub use error_correction::{CorrectionConfig, DocumentProfile, TextCorrector};
pub use errors::{AppError, AppResult};
pub use preprocessing::{ImagePreprocessingPipeline, PipelineConfig, PixelBuffer};
