//! # Contrast Normalization Module
//!
//! Tile-local histogram equalization with clipping (CLAHE-style). Each tile
//! gets its own intensity mapping, so a shadowed corner is lifted without
//! blowing out an evenly lit region elsewhere on the page.

use std::time::Instant;

use rayon::prelude::*;
use tracing;

use super::buffer::{luminance, Channels, PixelBuffer};
use super::kernel::Histogram;

/// Tile edge length in pixels. Tiles on the right and bottom edge may be smaller.
pub const TILE_SIZE: u32 = 64;
/// Histogram bins are clipped at `CLIP_LIMIT * tile_pixels / 256`.
pub const CLIP_LIMIT: f64 = 3.0;

/// Applies tile-local clipped histogram equalization.
///
/// Per tile: build a 256-bin histogram, clip bins above the clip level,
/// spread half of the clipped mass uniformly over all bins, and map every
/// pixel through `round(cdf[v] / tile_pixels * 255)`.
///
/// Color pages are equalized on luminance; the ratio between the new and the
/// old gray value then scales every channel so hue is preserved.
///
/// # Arguments
///
/// * `image` - The input page
/// * `parallel` - Compute tile mappings and apply rows on the rayon pool
///
/// # Examples
///
/// ```
/// use docnorm::preprocessing::{apply_clahe, PixelBuffer};
///
/// let dim = PixelBuffer::from_gray_fn(100, 80, |x, _| 100 + (x % 8) as u8).unwrap();
/// let enhanced = apply_clahe(&dim, false);
/// assert_eq!(enhanced.dimensions(), (100, 80));
/// ```
pub fn apply_clahe(image: &PixelBuffer, parallel: bool) -> PixelBuffer {
    let start_time = Instant::now();

    let (width, height) = image.dimensions();
    let luma = image.luminance_plane();

    let tiles_x = width.div_ceil(TILE_SIZE) as usize;
    let tiles_y = height.div_ceil(TILE_SIZE) as usize;

    let build = |tile_index: usize| {
        let tile_x = (tile_index % tiles_x) as u32;
        let tile_y = (tile_index / tiles_x) as u32;
        tile_mapping(&luma, width, height, tile_x, tile_y)
    };
    let mappings: Vec<[u8; 256]> = if parallel {
        (0..tiles_x * tiles_y).into_par_iter().map(build).collect()
    } else {
        (0..tiles_x * tiles_y).map(build).collect()
    };

    let channels = image.channels();
    let mut output = image.clone();
    output.for_each_row_mut(parallel, |y, row| {
        let tile_row = y / TILE_SIZE as usize;
        for x in 0..width as usize {
            let mapping = &mappings[tile_row * tiles_x + x / TILE_SIZE as usize];
            match channels {
                Channels::Gray => {
                    row[x] = mapping[row[x] as usize];
                }
                Channels::Rgb => {
                    let px = &mut row[x * 3..x * 3 + 3];
                    let old_gray = luminance(px[0], px[1], px[2]);
                    let new_gray = mapping[old_gray as usize];
                    scale_channels(px, old_gray, new_gray);
                }
            }
        }
    });

    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "ocr_preprocessing",
        "CLAHE applied in {:.2}ms: clip_limit={}, tile_size={}, tiles={}x{}",
        processing_time.as_millis(),
        CLIP_LIMIT,
        TILE_SIZE,
        tiles_x,
        tiles_y
    );

    output
}

/// Builds the gray-level mapping for one tile.
fn tile_mapping(luma: &[u8], width: u32, height: u32, tile_x: u32, tile_y: u32) -> [u8; 256] {
    let start_x = tile_x * TILE_SIZE;
    let start_y = tile_y * TILE_SIZE;
    let end_x = (start_x + TILE_SIZE).min(width);
    let end_y = (start_y + TILE_SIZE).min(height);

    let histogram = Histogram::from_samples((start_y..end_y).flat_map(|y| {
        let row = y as usize * width as usize;
        luma[row + start_x as usize..row + end_x as usize].iter().copied()
    }));

    equalization_mapping(&histogram)
}

/// Clips the histogram, redistributes half of the excess and returns the
/// cumulative mapping.
fn equalization_mapping(histogram: &Histogram) -> [u8; 256] {
    let total_pixels = histogram.total() as f64;
    let clip_level = CLIP_LIMIT * total_pixels / 256.0;

    let mut bins = [0f64; 256];
    let mut clipped_mass = 0.0;
    for (bin, &count) in bins.iter_mut().zip(histogram.bins().iter()) {
        let count = count as f64;
        if count > clip_level {
            clipped_mass += count - clip_level;
            *bin = clip_level;
        } else {
            *bin = count;
        }
    }

    let increment = clipped_mass * 0.5 / 256.0;
    let mut mapping = [0u8; 256];
    let mut cumulative = 0.0;
    for (value, bin) in bins.iter().enumerate() {
        cumulative += bin + increment;
        mapping[value] = (cumulative / total_pixels * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    mapping
}

fn scale_channels(px: &mut [u8], old_gray: u8, new_gray: u8) {
    if old_gray == 0 {
        px.iter_mut().for_each(|c| *c = new_gray);
        return;
    }
    let ratio = new_gray as f64 / old_gray as f64;
    for c in px.iter_mut() {
        *c = (*c as f64 * ratio).round().clamp(0.0, 255.0) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_clahe_preserves_dimensions() {
        let img = PixelBuffer::from_gray_fn(150, 70, |x, y| ((x + y) % 256) as u8).unwrap();
        let result = apply_clahe(&img, false);
        assert_eq!(result.dimensions(), (150, 70));
    }

    #[test]
    fn test_equalization_stretches_low_contrast_tile() {
        let img = PixelBuffer::from_gray_fn(64, 64, |x, y| 100 + ((x + y) % 8) as u8).unwrap();
        let result = apply_clahe(&img, false);
        let plane = result.luminance_plane();
        let min = *plane.iter().min().unwrap();
        let max = *plane.iter().max().unwrap();
        assert!(max - min > 7, "spread should grow beyond the input's 7 levels");
    }

    #[test]
    fn test_clip_limits_amplification() {
        // One dominant bin: without clipping it would map to 255.
        let mut bins = [0u32; 256];
        bins[128] = 4096;
        let mapping = equalization_mapping(&Histogram::from_bins(bins));
        // Clip level = 48, excess = 4048, half spread = 7.90625 per bin.
        let expected = ((48.0 + 129.0 * 7.90625) / 4096.0 * 255.0_f64).round() as u8;
        assert_eq!(mapping[128], expected);
        assert!(mapping[128] < 128);
    }

    #[test]
    fn test_mapping_is_monotonic() {
        let histogram = Histogram::from_samples((0..4096u32).map(|i| (i % 37) as u8 * 5));
        let mapping = equalization_mapping(&histogram);
        for pair in mapping.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn test_rgb_hue_ratio_preserved() {
        let samples: Vec<u8> = (0..64 * 64)
            .flat_map(|i| if i % 2 == 0 { [120, 60, 30] } else { [100, 50, 25] })
            .collect();
        let img = PixelBuffer::new(64, 64, Channels::Rgb, samples).unwrap();
        let result = apply_clahe(&img, true);
        let px = &result.samples()[0..3];
        let ratio_in = 120.0 / 60.0;
        let ratio_out = px[0] as f64 / px[1].max(1) as f64;
        assert!((ratio_in - ratio_out).abs() < 0.1, "got {:?}", px);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let img = PixelBuffer::from_gray_fn(130, 90, |x, y| ((x * 3 + y * 5) % 256) as u8).unwrap();
        assert_eq!(apply_clahe(&img, false), apply_clahe(&img, true));
    }

    #[test]
    fn test_scale_channels_black_pixel() {
        let mut px = [0u8, 0, 0];
        scale_channels(&mut px, 0, 40);
        assert_eq!(px, [40, 40, 40]);
    }
}
