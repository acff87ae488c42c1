//! # Image Preprocessing Module
//!
//! Turns a noisy photographed or scanned page into a clean binary image for
//! character recognition.
//!
//! The module is organized into focused sub-modules:
//! - `buffer`: The owned pixel grid every stage works on
//! - `kernel`: Gaussian kernels and histograms
//! - `denoise`: Bilateral noise reduction
//! - `contrast`: Tile-local clipped histogram equalization
//! - `deskewing`: Skew estimation and rotation correction
//! - `thresholding`: Otsu blended with Sauvola binarization
//! - `morphology`: Erosion, dilation, opening and closing
//! - `line_enhance`: Projection-profile text line enhancement
//! - `sharpen`: Unsharp mask
//! - `quality`: Informational input quality assessment
//! - `pipeline`: Fixed-order orchestration with progress reporting
//! - `types`: Shared types and error definitions

pub mod buffer;
pub mod contrast;
pub mod denoise;
pub mod deskewing;
pub mod kernel;
pub mod line_enhance;
pub mod morphology;
pub mod pipeline;
pub mod quality;
pub mod sharpen;
pub mod thresholding;
pub mod types;

pub use types::{
    ImageQuality, ImageQualityResult, MorphologicalOperation, PreprocessingError,
    SkewDecision, StageTiming, ThresholdedImageResult,
};

pub use buffer::{luminance, Channels, PixelBuffer};
pub use contrast::apply_clahe;
pub use denoise::reduce_noise;
pub use deskewing::{detect_skew_angle, rotate_image, skew_decision};
pub use kernel::{Histogram, Kernel};
pub use line_enhance::enhance_lines;
pub use morphology::{apply_morphological_operation, clean_binary, dilate, erode};
pub use pipeline::{ImagePreprocessingPipeline, PipelineConfig, PipelineReport, PipelineStage};
pub use quality::assess_image_quality;
pub use sharpen::sharpen;
pub use thresholding::{apply_threshold, find_otsu_threshold};
