//! # Image Quality Assessment Module
//!
//! Informational contrast, brightness and sharpness measurements taken on the
//! pipeline input. The result is reported alongside the cleaned page; it never
//! changes which stages run.

use std::time::Instant;

use tracing;

use super::buffer::PixelBuffer;
use super::kernel::Histogram;
use super::types::{ImageQuality, ImageQualityResult};

/// Laplacian variance that maps to a sharpness score of 1.0.
const SHARPNESS_SATURATION: f64 = 1000.0;

/// Measures the quality of a page before preprocessing.
///
/// # Arguments
///
/// * `image` - The input page (color is measured on luminance)
///
/// # Returns
///
/// An [`ImageQualityResult`] with metrics in `0.0..=1.0` and a High/Medium/Low
/// classification.
///
/// # Examples
///
/// ```
/// use docnorm::preprocessing::{assess_image_quality, ImageQuality, PixelBuffer};
///
/// let blank = PixelBuffer::from_gray_fn(50, 50, |_, _| 0).unwrap();
/// assert_eq!(assess_image_quality(&blank).quality, ImageQuality::Low);
/// ```
pub fn assess_image_quality(image: &PixelBuffer) -> ImageQualityResult {
    let start_time = Instant::now();

    let plane = image.luminance_plane();
    let histogram = Histogram::from_samples(plane.iter().copied());

    let contrast_ratio = contrast_ratio(&histogram);
    let brightness = brightness(&histogram);
    let sharpness = sharpness(&plane, image.width() as usize, image.height() as usize);
    let quality = classify_image_quality(contrast_ratio, brightness, sharpness);

    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "ocr_preprocessing",
        "Quality assessment completed in {:.2}ms: quality={:?}, contrast={:.3}, brightness={:.3}, sharpness={:.3}",
        processing_time.as_millis(),
        quality,
        contrast_ratio,
        brightness,
        sharpness
    );

    ImageQualityResult {
        quality,
        contrast_ratio,
        brightness,
        sharpness,
        processing_time_ms: processing_time.as_millis() as u32,
    }
}

/// Spread between the 10th and 90th luminance percentiles, as a share of the
/// full range. Uniform pages score 0.0.
fn contrast_ratio(histogram: &Histogram) -> f32 {
    if histogram.total() == 0 {
        return 0.0;
    }
    let p10 = percentile(histogram, 0.1);
    let p90 = percentile(histogram, 0.9);
    (p90.saturating_sub(p10) as f32 / 255.0).min(1.0)
}

/// Smallest value whose cumulative count passes `fraction` of the pixels.
fn percentile(histogram: &Histogram, fraction: f64) -> u8 {
    let rank = (histogram.total() as f64 * fraction) as u64;
    let mut cumulative = 0u64;
    for (value, &count) in histogram.bins().iter().enumerate() {
        cumulative += count as u64;
        if cumulative > rank {
            return value as u8;
        }
    }
    255
}

/// Mean luminance scaled to `0.0..=1.0`.
fn brightness(histogram: &Histogram) -> f32 {
    if histogram.total() == 0 {
        return 0.5;
    }
    let sum: u64 = histogram
        .bins()
        .iter()
        .enumerate()
        .map(|(value, &count)| value as u64 * count as u64)
        .sum();
    (sum as f64 / histogram.total() as f64 / 255.0) as f32
}

/// Variance of the 4-neighbor Laplacian over interior pixels, saturating at
/// [`SHARPNESS_SATURATION`]. Pages smaller than 3×3 score a neutral 0.5.
fn sharpness(plane: &[u8], width: usize, height: usize) -> f32 {
    if width < 3 || height < 3 {
        return 0.5;
    }

    let at = |x: usize, y: usize| plane[y * width + x] as f64;
    let mut sum_sq = 0.0;
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let laplacian =
                at(x, y - 1) + at(x, y + 1) + at(x - 1, y) + at(x + 1, y) - 4.0 * at(x, y);
            sum_sq += laplacian * laplacian;
        }
    }
    let interior = ((width - 2) * (height - 2)) as f64;
    ((sum_sq / interior) / SHARPNESS_SATURATION).min(1.0) as f32
}

/// Weighted score: contrast 0.4, brightness closeness to mid-gray 0.2,
/// sharpness 0.4. High from 0.7, Medium from 0.4.
fn classify_image_quality(contrast_ratio: f32, brightness: f32, sharpness: f32) -> ImageQuality {
    let brightness_score = 1.0 - (brightness - 0.5).abs() * 2.0;
    let score = contrast_ratio * 0.4 + brightness_score * 0.2 + sharpness * 0.4;

    if score >= 0.7 {
        ImageQuality::High
    } else if score >= 0.4 {
        ImageQuality::Medium
    } else {
        ImageQuality::Low
    }
}
