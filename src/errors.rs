//! # Application Error Types
//!
//! Errors surfaced by the document-level API and the binaries. The image
//! pipeline keeps its own [`PreprocessingError`]; it converts into
//! [`AppError::Image`] at this boundary.

use std::fmt;

use crate::error_correction::UnknownProfileError;
use crate::preprocessing::PreprocessingError;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration validation errors
    Config(String),
    /// Validation errors (arguments, profile names, inputs)
    Validation(String),
    /// Image decoding and preprocessing errors
    Image(String),
    /// Errors reported by the text recognizer
    Ocr(String),
    /// File system errors
    FileSystem(String),
    /// Internal application errors
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            AppError::Validation(msg) => write!(f, "[VALIDATION] {}", msg),
            AppError::Image(msg) => write!(f, "[IMAGE] {}", msg),
            AppError::Ocr(msg) => write!(f, "[OCR] {}", msg),
            AppError::FileSystem(msg) => write!(f, "[FILESYSTEM] {}", msg),
            AppError::Internal(msg) => write!(f, "[INTERNAL] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<PreprocessingError> for AppError {
    fn from(err: PreprocessingError) -> Self {
        AppError::Image(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileSystem(err.to_string())
    }
}

impl From<UnknownProfileError> for AppError {
    fn from(err: UnknownProfileError) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities for consistent error reporting
pub mod error_logging {
    use tracing::error;

    /// Log image decoding or preprocessing errors with input context
    pub fn log_image_error(
        error: &impl std::fmt::Display,
        operation: &str,
        source: Option<&str>,
        input_size: Option<usize>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            source = ?source,
            input_size_bytes = ?input_size,
            "Image processing failed"
        );
    }

    /// Log text recognizer errors with image and processing context
    pub fn log_ocr_error(
        error: &impl std::fmt::Display,
        operation: &str,
        image_dimensions: Option<(u32, u32)>,
        processing_duration: Option<std::time::Duration>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            image_dimensions = ?image_dimensions,
            processing_duration_ms = ?processing_duration.map(|d| d.as_millis()),
            "OCR processing failed"
        );
    }

    /// Log file system errors with path and operation context
    pub fn log_filesystem_error(
        error: &impl std::fmt::Display,
        operation: &str,
        path: Option<&str>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            path = ?path,
            "File system operation failed"
        );
    }

    /// Log configuration errors during startup/initialization
    pub fn log_config_error(error: &impl std::fmt::Display, config_key: &str, operation: &str) {
        error!(
            error = %error,
            config_key = %config_key,
            operation = %operation,
            "Configuration error"
        );
    }
}
