//! # Image Thresholding Module
//!
//! This module provides binary thresholding for OCR preprocessing.
//! A global Otsu threshold is blended with a Sauvola local threshold: the
//! global term keeps near-uniform regions from turning into speckle, the
//! local term follows lighting gradients across the page.

use std::time::Instant;

use tracing;

use super::buffer::PixelBuffer;
use super::kernel::Histogram;
use super::types::ThresholdedImageResult;

/// Half-width of the Sauvola window.
pub const LOCAL_WINDOW_RADIUS: usize = 15;
/// Sauvola sensitivity `k`.
pub const SAUVOLA_K: f64 = 0.2;
/// Sauvola dynamic range `R` for 8-bit samples.
pub const SAUVOLA_R: f64 = 128.0;

/// Converts a page to black ink (0) on white background (255).
///
/// The per-pixel threshold is the mean of the global Otsu threshold and the
/// local Sauvola threshold `mean * (1 + k * (stddev / R - 1))` over a
/// `(2 * 15 + 1)²` window clamped at the borders. Pixels strictly above the
/// threshold become background. Running this on an image that is already
/// pure 0/255 returns it unchanged.
///
/// # Arguments
///
/// * `image` - The input page (color is collapsed to luminance)
/// * `parallel` - Threshold rows on the rayon pool
///
/// # Examples
///
/// ```
/// use docnorm::preprocessing::{apply_threshold, PixelBuffer};
///
/// let page = PixelBuffer::from_gray_fn(40, 40, |x, _| if x < 20 { 30 } else { 220 }).unwrap();
/// let result = apply_threshold(&page, false);
/// assert!(result.image.is_binary());
/// ```
pub fn apply_threshold(image: &PixelBuffer, parallel: bool) -> ThresholdedImageResult {
    let start_time = Instant::now();

    let mut binary = image.clone().into_grayscale();
    let (width, height) = (binary.width() as usize, binary.height() as usize);

    let histogram = Histogram::from_samples(binary.samples().iter().copied());
    let global_threshold = find_otsu_threshold(&histogram);
    let global = global_threshold as f64;

    let integrals = IntegralImages::new(binary.samples(), width, height);

    binary.for_each_row_mut(parallel, |y, row| {
        for (x, value) in row.iter_mut().enumerate() {
            let local = integrals.sauvola_threshold(x, y, LOCAL_WINDOW_RADIUS);
            let threshold = (global + local) / 2.0;
            *value = if *value as f64 > threshold { 255 } else { 0 };
        }
    });

    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "ocr_preprocessing",
        "Blended thresholding completed in {:.2}ms: otsu_threshold={}, window_radius={}, dimensions={}x{}",
        processing_time.as_millis(),
        global_threshold,
        LOCAL_WINDOW_RADIUS,
        width,
        height
    );

    ThresholdedImageResult {
        image: binary,
        threshold: global_threshold,
        processing_time_ms: processing_time.as_millis() as u32,
    }
}

/// Finds the global threshold using Otsu's method.
///
/// Every candidate `t` in 0..=255 splits the normalized histogram into
/// `[0, t]` and `(t, 255]`; the first `t` maximizing
/// `w0 * w1 * (mu0 - mu1)²` wins. A histogram with a single populated bin
/// has zero variance everywhere and yields 0.
pub fn find_otsu_threshold(histogram: &Histogram) -> u8 {
    let probabilities = histogram.normalized();
    let total_mean: f64 = probabilities
        .iter()
        .enumerate()
        .map(|(i, p)| i as f64 * p)
        .sum();

    let mut w0 = 0f64;
    let mut cumulative_mean = 0f64;
    let mut max_variance = 0f64;
    let mut optimal_threshold = 0u8;

    for (t, &p) in probabilities.iter().enumerate() {
        w0 += p;
        cumulative_mean += t as f64 * p;
        let w1 = 1.0 - w0;
        if w0 <= f64::EPSILON || w1 <= f64::EPSILON {
            continue;
        }
        let mu0 = cumulative_mean / w0;
        let mu1 = (total_mean - cumulative_mean) / w1;
        let variance = w0 * w1 * (mu0 - mu1).powi(2);
        if variance > max_variance {
            max_variance = variance;
            optimal_threshold = t as u8;
        }
    }

    optimal_threshold
}

/// Summed-area tables of values and squared values, one row/column of
/// padding so window sums need no bounds checks.
struct IntegralImages {
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
    width: usize,
    height: usize,
}

impl IntegralImages {
    fn new(samples: &[u8], width: usize, height: usize) -> Self {
        let stride = width + 1;
        let mut sum = vec![0f64; stride * (height + 1)];
        let mut sum_sq = vec![0f64; stride * (height + 1)];
        for y in 0..height {
            let mut row_sum = 0f64;
            let mut row_sum_sq = 0f64;
            for x in 0..width {
                let v = samples[y * width + x] as f64;
                row_sum += v;
                row_sum_sq += v * v;
                sum[(y + 1) * stride + x + 1] = sum[y * stride + x + 1] + row_sum;
                sum_sq[(y + 1) * stride + x + 1] = sum_sq[y * stride + x + 1] + row_sum_sq;
            }
        }
        Self {
            sum,
            sum_sq,
            width,
            height,
        }
    }

    /// Mean and standard deviation over the clamped window around `(x, y)`.
    fn window_stats(&self, x: usize, y: usize, radius: usize) -> (f64, f64) {
        let stride = self.width + 1;
        let x1 = x.saturating_sub(radius);
        let y1 = y.saturating_sub(radius);
        let x2 = (x + radius + 1).min(self.width);
        let y2 = (y + radius + 1).min(self.height);
        let area = ((x2 - x1) * (y2 - y1)) as f64;

        let rect = |table: &[f64]| {
            table[y2 * stride + x2] - table[y1 * stride + x2] - table[y2 * stride + x1]
                + table[y1 * stride + x1]
        };
        let mean = rect(&self.sum) / area;
        let variance = (rect(&self.sum_sq) / area - mean * mean).max(0.0);
        (mean, variance.sqrt())
    }

    fn sauvola_threshold(&self, x: usize, y: usize, radius: usize) -> f64 {
        let (mean, std_dev) = self.window_stats(x, y, radius);
        mean * (1.0 + SAUVOLA_K * (std_dev / SAUVOLA_R - 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::buffer::Channels;

    #[test]
    fn test_apply_threshold_two_regions() {
        let img = PixelBuffer::from_gray_fn(10, 10, |x, _| if x < 5 { 25 } else { 225 }).unwrap();
        let result = apply_threshold(&img, false);

        assert!(result.threshold >= 25 && result.threshold < 225);
        assert!(result.image.is_binary());
        assert_eq!(result.image.gray_at(1, 1), 0);
        assert_eq!(result.image.gray_at(8, 8), 255);
    }

    #[test]
    fn test_binary_input_is_unchanged() {
        let img = PixelBuffer::from_gray_fn(60, 45, |x, y| {
            if (x / 7 + y / 5) % 3 == 0 {
                0
            } else {
                255
            }
        })
        .unwrap();
        let once = apply_threshold(&img, false).image;
        let twice = apply_threshold(&once, true).image;

        assert_eq!(once, img);
        assert_eq!(twice, img);
    }

    #[test]
    fn test_uniform_image_threshold_is_zero() {
        let img = PixelBuffer::from_gray_fn(20, 20, |_, _| 128).unwrap();
        let result = apply_threshold(&img, false);
        assert_eq!(result.threshold, 0);
        assert!(result.image.samples().iter().all(|&v| v == 255));
    }

    #[test]
    fn test_otsu_between_separated_peaks() {
        let mut bins = [0u32; 256];
        for offset in 0..5 {
            bins[40 + offset] = 1000;
            bins[200 + offset] = 1000;
        }
        let threshold = find_otsu_threshold(&Histogram::from_bins(bins));
        assert!(threshold > 44 && threshold < 200, "threshold {}", threshold);
    }

    #[test]
    fn test_otsu_empty_histogram() {
        assert_eq!(find_otsu_threshold(&Histogram::from_bins([0u32; 256])), 0);
    }

    #[test]
    fn test_lighting_gradient_keeps_text() {
        // Dark strokes on a background that brightens from left to right.
        let img = PixelBuffer::from_gray_fn(120, 40, |x, y| {
            let background = 120 + (x as u32 * 100 / 120) as u8;
            if y % 10 < 2 {
                background.saturating_sub(90)
            } else {
                background
            }
        })
        .unwrap();
        let result = apply_threshold(&img, false).image;

        assert_eq!(result.gray_at(5, 0), 0);
        assert_eq!(result.gray_at(115, 0), 0);
        assert_eq!(result.gray_at(5, 5), 255);
        assert_eq!(result.gray_at(115, 5), 255);
    }

    #[test]
    fn test_rgb_becomes_grayscale() {
        let samples: Vec<u8> = (0..8 * 8).flat_map(|_| [250, 250, 250]).collect();
        let img = PixelBuffer::new(8, 8, Channels::Rgb, samples).unwrap();
        let result = apply_threshold(&img, false);
        assert_eq!(result.image.channels(), Channels::Gray);
    }

    #[test]
    fn test_window_stats_clamped_at_corner() {
        let samples = vec![10u8; 16];
        let integrals = IntegralImages::new(&samples, 4, 4);
        let (mean, std_dev) = integrals.window_stats(0, 0, 15);
        assert!((mean - 10.0).abs() < 1e-9);
        assert!(std_dev.abs() < 1e-9);
    }
}
