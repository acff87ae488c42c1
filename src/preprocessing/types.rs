//! # Shared Types for Image Preprocessing
//!
//! This module contains the shared error type and the per-stage result
//! structs used across the preprocessing sub-modules.

use super::buffer::PixelBuffer;

/// Errors that can occur before the preprocessing stages run.
///
/// Every stage is total over a well-formed [`PixelBuffer`], so these are the
/// only failures the pipeline can report.
#[derive(Debug, Clone, PartialEq)]
pub enum PreprocessingError {
    /// Input bytes could not be parsed into a pixel grid
    Decode { message: String },
    /// Image has zero area or its sample count does not match its dimensions
    Dimension { width: u32, height: u32 },
}

impl std::fmt::Display for PreprocessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreprocessingError::Decode { message } => {
                write!(f, "Failed to decode image: {}", message)
            }
            PreprocessingError::Dimension { width, height } => {
                write!(
                    f,
                    "Invalid image dimensions: {}x{}. Image must have a non-zero area",
                    width, height
                )
            }
        }
    }
}

impl std::error::Error for PreprocessingError {}

impl From<image::ImageError> for PreprocessingError {
    fn from(err: image::ImageError) -> Self {
        PreprocessingError::Decode {
            message: err.to_string(),
        }
    }
}

/// Result of the binarization stage.
#[derive(Debug, Clone)]
pub struct ThresholdedImageResult {
    /// The binary image (0 = ink, 255 = background)
    pub image: PixelBuffer,
    /// Global threshold found by Otsu's method
    pub threshold: u8,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

/// Result of image quality assessment.
#[derive(Debug, Clone)]
pub struct ImageQualityResult {
    /// Overall quality classification
    pub quality: ImageQuality,
    /// Contrast ratio (0.0-1.0, higher is better)
    pub contrast_ratio: f32,
    /// Brightness level (0.0-1.0, 0.5 is optimal)
    pub brightness: f32,
    /// Sharpness score (0.0-1.0, higher is sharper)
    pub sharpness: f32,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

/// Image quality classifications.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum ImageQuality {
    /// Clean capture, little for the pipeline to fix
    High,
    /// Typical phone photo or office scan
    Medium,
    /// Dark, washed out or blurry capture
    Low,
}

/// Types of morphological operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MorphologicalOperation {
    /// Shrinks ink regions
    Erosion,
    /// Grows ink regions
    Dilation,
    /// Erosion followed by dilation (removes specks)
    Opening,
    /// Dilation followed by erosion (reconnects strokes)
    Closing,
}

/// Outcome of skew estimation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkewDecision {
    /// Estimated angle is inside the deadband
    NoRotation,
    /// Rotate the page by `-degrees` to level its text lines
    Rotate { degrees: f32 },
}

impl SkewDecision {
    /// Angle the decision corrects for, 0.0 when no rotation is needed.
    pub fn degrees(&self) -> f32 {
        match self {
            SkewDecision::NoRotation => 0.0,
            SkewDecision::Rotate { degrees } => *degrees,
        }
    }
}

/// Timing for a single pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageTiming {
    pub stage: &'static str,
    pub processing_time_ms: u32,
}
