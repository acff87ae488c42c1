//! # Sharpening Module
//!
//! Unsharp mask used as the finishing pass of the pipeline.

use std::time::Instant;

use tracing;

use super::buffer::PixelBuffer;
use super::kernel::Kernel;

/// Blur radius of the mask (σ equals the radius).
pub const SHARPEN_RADIUS: f64 = 1.0;
/// Gain applied to the detail layer.
pub const SHARPEN_AMOUNT: f64 = 1.5;
/// Differences at or below this many gray levels are left alone.
pub const SHARPEN_THRESHOLD: f64 = 5.0;

/// Applies an unsharp mask in place.
///
/// Per sample: `orig + amount * (orig - blurred)` when
/// `|orig - blurred| > threshold`, clamped to `[0, 255]`; otherwise the
/// sample is unchanged. Flat regions are therefore never touched.
///
/// # Arguments
///
/// * `image` - The page to sharpen
/// * `parallel` - Blur and apply rows on the rayon pool
pub fn sharpen(image: &mut PixelBuffer, parallel: bool) {
    let start_time = Instant::now();

    let kernel = Kernel::for_blur_radius(SHARPEN_RADIUS);
    let blurred = kernel.convolve_separable(image, parallel);
    let blurred_samples = blurred.samples();
    let row_len = image.row_len();

    image.for_each_row_mut(parallel, |y, row| {
        let blurred_row = &blurred_samples[y * row_len..(y + 1) * row_len];
        for (value, &soft) in row.iter_mut().zip(blurred_row) {
            let detail = *value as f64 - soft as f64;
            if detail.abs() > SHARPEN_THRESHOLD {
                *value = (*value as f64 + SHARPEN_AMOUNT * detail)
                    .round()
                    .clamp(0.0, 255.0) as u8;
            }
        }
    });

    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "ocr_preprocessing",
        "Sharpening completed in {:.2}ms: radius={}, amount={}, threshold={}, kernel_taps={}",
        processing_time.as_millis(),
        SHARPEN_RADIUS,
        SHARPEN_AMOUNT,
        SHARPEN_THRESHOLD,
        kernel.weights().len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::buffer::Channels;

    #[test]
    fn test_flat_region_untouched() {
        let mut img = PixelBuffer::from_gray_fn(20, 20, |_, _| 140).unwrap();
        let before = img.clone();
        sharpen(&mut img, false);
        assert_eq!(img, before);
    }

    #[test]
    fn test_edge_contrast_increases() {
        let mut img = PixelBuffer::from_gray_fn(20, 5, |x, _| if x < 10 { 80 } else { 170 }).unwrap();
        sharpen(&mut img, false);
        assert!(img.gray_at(9, 2) < 80);
        assert!(img.gray_at(10, 2) > 170);
        assert_eq!(img.gray_at(0, 2), 80);
        assert_eq!(img.gray_at(19, 2), 170);
    }

    #[test]
    fn test_binary_page_stays_binary() {
        let mut img = PixelBuffer::from_gray_fn(30, 30, |x, y| if (x / 5 + y / 5) % 2 == 0 { 0 } else { 255 })
            .unwrap();
        sharpen(&mut img, true);
        assert!(img.is_binary());
    }

    #[test]
    fn test_rgb_channels_sharpened_independently() {
        let samples: Vec<u8> = (0..10 * 4)
            .flat_map(|i| if i % 10 < 5 { [100, 100, 100] } else { [100, 200, 100] })
            .collect();
        let mut img = PixelBuffer::new(10, 4, Channels::Rgb, samples).unwrap();
        sharpen(&mut img, false);
        // Red and blue are flat across the edge.
        assert_eq!(img.samples()[4 * 3], 100);
        assert!(img.samples()[5 * 3 + 1] > 200);
    }
}
