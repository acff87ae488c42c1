//! # Image Preprocessing Pipeline
//!
//! Runs the cleanup stages in their fixed order and reports progress before
//! each one:
//!
//! 1. Noise reduction (bilateral)
//! 2. Contrast normalization (tile-local equalization)
//! 3. Skew estimation
//! 4. Rotation correction (no-op inside the deadband)
//! 5. Binarization (Otsu blended with Sauvola)
//! 6. Morphological cleanup (opening, then closing)
//! 7. Text line enhancement
//! 8. Sharpening
//!
//! No stage decides to skip itself based on content, apart from the rotation
//! deadband. The output of each stage is the only input of the next.

use std::time::Instant;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use super::buffer::PixelBuffer;
use super::contrast::apply_clahe;
use super::denoise::reduce_noise;
use super::deskewing::{detect_skew_angle, rotate_image, skew_decision};
use super::line_enhance::enhance_lines;
use super::morphology::clean_binary;
use super::quality::assess_image_quality;
use super::sharpen::sharpen;
use super::thresholding::apply_threshold;
use super::types::{ImageQualityResult, PreprocessingError, SkewDecision, StageTiming};
use crate::observability::record_stage_metrics;

/// Pipeline tuning knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Run row and tile loops on the rayon pool. Output is identical either way.
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// The eight stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Denoise,
    Contrast,
    SkewEstimation,
    Rotation,
    Binarization,
    Morphology,
    LineEnhancement,
    Sharpening,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 8] = [
        PipelineStage::Denoise,
        PipelineStage::Contrast,
        PipelineStage::SkewEstimation,
        PipelineStage::Rotation,
        PipelineStage::Binarization,
        PipelineStage::Morphology,
        PipelineStage::LineEnhancement,
        PipelineStage::Sharpening,
    ];

    /// Human-readable label passed to the progress callback.
    pub fn label(self) -> &'static str {
        match self {
            PipelineStage::Denoise => "Reducing noise",
            PipelineStage::Contrast => "Normalizing contrast",
            PipelineStage::SkewEstimation => "Estimating skew",
            PipelineStage::Rotation => "Correcting rotation",
            PipelineStage::Binarization => "Binarizing",
            PipelineStage::Morphology => "Cleaning specks and strokes",
            PipelineStage::LineEnhancement => "Enhancing text lines",
            PipelineStage::Sharpening => "Sharpening",
        }
    }

    /// Short name used as a metric label.
    pub fn name(self) -> &'static str {
        match self {
            PipelineStage::Denoise => "denoise",
            PipelineStage::Contrast => "contrast",
            PipelineStage::SkewEstimation => "skew_estimation",
            PipelineStage::Rotation => "rotation",
            PipelineStage::Binarization => "binarization",
            PipelineStage::Morphology => "morphology",
            PipelineStage::LineEnhancement => "line_enhancement",
            PipelineStage::Sharpening => "sharpening",
        }
    }
}

/// What happened during one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Wall time per stage, in execution order
    pub stages: Vec<StageTiming>,
    /// Global Otsu threshold chosen by the binarizer
    pub otsu_threshold: u8,
    /// Estimated skew angle in degrees
    pub skew_angle_degrees: f32,
    /// Share of edge votes behind the estimated angle
    pub skew_confidence: f32,
    /// Whether the page was actually rotated
    pub rotation_applied: bool,
    /// Quality of the input page, informational only
    pub input_quality: ImageQualityResult,
    pub input_dimensions: (u32, u32),
    pub output_dimensions: (u32, u32),
    pub total_processing_time_ms: u32,
}

/// Fixed-order document image cleanup.
#[derive(Debug, Clone, Default)]
pub struct ImagePreprocessingPipeline {
    config: PipelineConfig,
}

impl ImagePreprocessingPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Decodes raw image bytes and cleans the page.
    ///
    /// # Errors
    ///
    /// `PreprocessingError::Decode` when the bytes are not a supported image,
    /// `PreprocessingError::Dimension` when the image has zero area. Both are
    /// raised before any stage runs.
    ///
    /// # Examples
    ///
    /// ```
    /// use docnorm::preprocessing::{ImagePreprocessingPipeline, PreprocessingError};
    ///
    /// let pipeline = ImagePreprocessingPipeline::default();
    /// let result = pipeline.process_bytes(b"not an image", |_| {});
    /// assert!(matches!(result, Err(PreprocessingError::Decode { .. })));
    /// ```
    pub fn process_bytes<F>(&self, bytes: &[u8], progress: F) -> Result<PixelBuffer, PreprocessingError>
    where
        F: FnMut(&str),
    {
        let buffer = PixelBuffer::decode(bytes)?;
        self.process(buffer, progress)
    }

    /// Cleans an already decoded `image` crate image.
    pub fn process_image<F>(
        &self,
        image: &DynamicImage,
        progress: F,
    ) -> Result<PixelBuffer, PreprocessingError>
    where
        F: FnMut(&str),
    {
        let buffer = PixelBuffer::from_dynamic(image)?;
        self.process(buffer, progress)
    }

    /// Cleans a page, returning a binary grayscale buffer.
    pub fn process<F>(&self, image: PixelBuffer, progress: F) -> Result<PixelBuffer, PreprocessingError>
    where
        F: FnMut(&str),
    {
        self.process_with_report(image, progress)
            .map(|(cleaned, _)| cleaned)
    }

    /// Cleans a page and returns a [`PipelineReport`] alongside it.
    ///
    /// `progress` is called with each stage's label before the stage runs,
    /// eight times per call.
    pub fn process_with_report<F>(
        &self,
        image: PixelBuffer,
        mut progress: F,
    ) -> Result<(PixelBuffer, PipelineReport), PreprocessingError>
    where
        F: FnMut(&str),
    {
        let start_time = Instant::now();
        let parallel = self.config.parallel;
        let input_dimensions = image.dimensions();
        let input_quality = assess_image_quality(&image);

        let mut runner = StageRunner {
            progress: &mut progress,
            timings: Vec::with_capacity(PipelineStage::ALL.len()),
        };

        let denoised = runner.run(PipelineStage::Denoise, || reduce_noise(&image, parallel));
        drop(image);

        let contrasted = runner.run(PipelineStage::Contrast, || apply_clahe(&denoised, parallel));
        drop(denoised);

        let (skew_angle, skew_confidence) =
            runner.run(PipelineStage::SkewEstimation, || detect_skew_angle(&contrasted));
        let decision = skew_decision(skew_angle);

        let straightened = runner.run(PipelineStage::Rotation, || match decision {
            SkewDecision::NoRotation => contrasted,
            SkewDecision::Rotate { degrees } => rotate_image(&contrasted, degrees, parallel),
        });

        let thresholded = runner.run(PipelineStage::Binarization, || {
            apply_threshold(&straightened, parallel)
        });
        drop(straightened);
        let otsu_threshold = thresholded.threshold;
        let mut page = thresholded.image;

        runner.run(PipelineStage::Morphology, || clean_binary(&mut page, parallel));
        runner.run(PipelineStage::LineEnhancement, || enhance_lines(&mut page, parallel));
        runner.run(PipelineStage::Sharpening, || sharpen(&mut page, parallel));

        let total_time = start_time.elapsed();
        let rotation_applied = decision != SkewDecision::NoRotation;

        tracing::info!(
            target: "ocr_preprocessing",
            "Preprocessing pipeline completed in {:.2}ms: {}x{} -> {}x{}, otsu_threshold={}, skew={:.2}°, rotated={}, input_quality={:?}",
            total_time.as_millis(),
            input_dimensions.0,
            input_dimensions.1,
            page.width(),
            page.height(),
            otsu_threshold,
            skew_angle,
            rotation_applied,
            input_quality.quality
        );

        let report = PipelineReport {
            stages: runner.timings,
            otsu_threshold,
            skew_angle_degrees: skew_angle,
            skew_confidence,
            rotation_applied,
            input_quality,
            input_dimensions,
            output_dimensions: page.dimensions(),
            total_processing_time_ms: total_time.as_millis() as u32,
        };

        Ok((page, report))
    }
}

/// Reports, times and records each stage.
struct StageRunner<'a, F: FnMut(&str)> {
    progress: &'a mut F,
    timings: Vec<StageTiming>,
}

impl<F: FnMut(&str)> StageRunner<'_, F> {
    fn run<T>(&mut self, stage: PipelineStage, body: impl FnOnce() -> T) -> T {
        (self.progress)(stage.label());
        let start_time = Instant::now();
        let output = body();
        let elapsed = start_time.elapsed();

        record_stage_metrics(stage.name(), elapsed);
        self.timings.push(StageTiming {
            stage: stage.name(),
            processing_time_ms: elapsed.as_millis() as u32,
        });
        output
    }
}
