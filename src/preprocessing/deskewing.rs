//! # Image Deskewing Module
//!
//! Skew estimation by edge-direction voting, and rotation correction.
//!
//! The estimator runs Sobel over the luminance plane and lets every strong
//! edge pixel vote once for the text-line angle implied by its gradient
//! direction. Votes are indexed by angle only, not by (angle, offset) as a
//! full Hough transform would be, so strong non-text edges such as
//! photographed page borders can outvote the text. Known approximation.

use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use tracing;

use super::buffer::PixelBuffer;
use super::types::SkewDecision;

/// Largest skew magnitude considered, in degrees.
pub const MAX_SKEW_DEGREES: f32 = 45.0;
/// Accumulator resolution, in degrees.
pub const ANGLE_STEP_DEGREES: f32 = 0.5;
/// Estimated angles with a magnitude at or below this are left alone.
pub const ROTATION_DEADBAND_DEGREES: f32 = 0.5;
/// Minimum Sobel gradient magnitude for a pixel to vote.
pub const EDGE_MAGNITUDE_THRESHOLD: f32 = 128.0;

const BACKGROUND: u8 = 255;

/// Maps an estimated angle to a rotation decision.
///
/// Angles inside the deadband leave the page as it is, which avoids
/// resampling artifacts on pages that are already straight.
///
/// # Examples
///
/// ```
/// use docnorm::preprocessing::{detect_skew_angle, skew_decision, PixelBuffer, SkewDecision};
///
/// let straight = PixelBuffer::from_gray_fn(120, 120, |_, y| if y % 20 < 6 { 0 } else { 255 }).unwrap();
/// let (angle, _) = detect_skew_angle(&straight);
/// assert_eq!(skew_decision(angle), SkewDecision::NoRotation);
/// ```
pub fn skew_decision(angle_degrees: f32) -> SkewDecision {
    if angle_degrees.abs() > ROTATION_DEADBAND_DEGREES {
        SkewDecision::Rotate {
            degrees: angle_degrees,
        }
    } else {
        tracing::debug!(
            target: "ocr_preprocessing",
            "Skew angle {:.2}° is inside the deadband, skipping rotation",
            angle_degrees
        );
        SkewDecision::NoRotation
    }
}

/// Estimates the dominant text-line angle in degrees.
///
/// Positive angles mean lines descend to the right (image y grows downward).
/// Returns `(angle, confidence)` where confidence is the share of all votes
/// that landed in the winning bin. An image without strong edges yields
/// `(0.0, 0.0)`.
pub fn detect_skew_angle(image: &PixelBuffer) -> (f32, f32) {
    let gray = image.to_gray_image();
    let gx = horizontal_sobel(&gray);
    let gy = vertical_sobel(&gray);

    let bins = (2.0 * MAX_SKEW_DEGREES / ANGLE_STEP_DEGREES).round() as usize + 1;
    let mut accumulator = vec![0u32; bins];
    let mut total_votes = 0u32;

    for (gx_px, gy_px) in gx.pixels().zip(gy.pixels()) {
        let dx = gx_px[0] as f32;
        let dy = gy_px[0] as f32;
        if (dx * dx + dy * dy).sqrt() <= EDGE_MAGNITUDE_THRESHOLD {
            continue;
        }
        let line_angle = fold_half_turn(dy.atan2(dx).to_degrees() - 90.0);
        if line_angle.abs() > MAX_SKEW_DEGREES {
            continue;
        }
        let bin = ((line_angle + MAX_SKEW_DEGREES) / ANGLE_STEP_DEGREES).round() as usize;
        accumulator[bin.min(bins - 1)] += 1;
        total_votes += 1;
    }

    if total_votes == 0 {
        return (0.0, 0.0);
    }

    let angle_of = |bin: usize| bin as f32 * ANGLE_STEP_DEGREES - MAX_SKEW_DEGREES;
    let mut best_bin = 0usize;
    for bin in 1..bins {
        let better = accumulator[bin] > accumulator[best_bin]
            || (accumulator[bin] == accumulator[best_bin]
                && angle_of(bin).abs() < angle_of(best_bin).abs());
        if better {
            best_bin = bin;
        }
    }

    (
        angle_of(best_bin),
        accumulator[best_bin] as f32 / total_votes as f32,
    )
}

/// Folds an angle into (-90°, 90°].
fn fold_half_turn(mut degrees: f32) -> f32 {
    while degrees <= -90.0 {
        degrees += 180.0;
    }
    while degrees > 90.0 {
        degrees -= 180.0;
    }
    degrees
}

/// Rotates the page by `-angle_degrees`, so lines at `angle_degrees` become
/// horizontal.
///
/// The canvas grows to the bounding box of the rotated rectangle, uncovered
/// area is filled with white, and samples are interpolated bilinearly.
pub fn rotate_image(image: &PixelBuffer, angle_degrees: f32, parallel: bool) -> PixelBuffer {
    let (width, height) = image.dimensions();
    let angle = (angle_degrees as f64).to_radians();
    let (sin_a, cos_a) = angle.sin_cos();

    let new_width = (width as f64 * cos_a.abs() + height as f64 * sin_a.abs()).ceil() as u32;
    let new_height = (width as f64 * sin_a.abs() + height as f64 * cos_a.abs()).ceil() as u32;
    let new_width = new_width.max(1);
    let new_height = new_height.max(1);

    let channels = image.channels();
    let mut output = match PixelBuffer::filled(new_width, new_height, channels, BACKGROUND) {
        Ok(buffer) => buffer,
        Err(_) => return image.clone(),
    };

    let src_cx = width as f64 / 2.0;
    let src_cy = height as f64 / 2.0;
    let dst_cx = new_width as f64 / 2.0;
    let dst_cy = new_height as f64 / 2.0;

    output.for_each_row_mut(parallel, |y, row| {
        let oy = y as f64 + 0.5 - dst_cy;
        for x in 0..new_width as usize {
            let ox = x as f64 + 0.5 - dst_cx;
            let sx = cos_a * ox - sin_a * oy + src_cx - 0.5;
            let sy = sin_a * ox + cos_a * oy + src_cy - 0.5;
            let count = channels.count();
            for c in 0..count {
                row[x * count + c] = sample_bilinear(image, sx, sy, c);
            }
        }
    });

    output
}

/// Bilinear sample of channel `c`; taps outside the image read as white.
fn sample_bilinear(image: &PixelBuffer, sx: f64, sy: f64, c: usize) -> u8 {
    let (width, height) = image.dimensions();
    if sx <= -1.0 || sy <= -1.0 || sx >= width as f64 || sy >= height as f64 {
        return BACKGROUND;
    }
    let x0 = sx.floor();
    let y0 = sy.floor();
    let fx = sx - x0;
    let fy = sy - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let count = image.channels().count();
    let samples = image.samples();
    let tap = |x: i64, y: i64| -> f64 {
        if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
            BACKGROUND as f64
        } else {
            samples[(y as usize * width as usize + x as usize) * count + c] as f64
        }
    };

    let top = tap(x0, y0) * (1.0 - fx) + tap(x0 + 1, y0) * fx;
    let bottom = tap(x0, y0 + 1) * (1.0 - fx) + tap(x0 + 1, y0 + 1) * fx;
    (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::buffer::Channels;

    /// Dark bars with linear anti-aliased flanks, inside a white margin.
    /// `angle` is the direction of the bars in degrees.
    fn create_bars_image(size: u32, angle: f32) -> PixelBuffer {
        let (s, c) = (angle as f64).to_radians().sin_cos();
        let center = size as f64 / 2.0;
        let margin = 30.0;
        PixelBuffer::from_gray_fn(size, size, |x, y| {
            let (px, py) = (x as f64, y as f64);
            if px < margin || py < margin || px > size as f64 - margin || py > size as f64 - margin {
                return 255;
            }
            let (dx, dy) = (px - center, py - center);
            let normal = -s * dx + c * dy;
            let d = normal.rem_euclid(40.0) - 20.0;
            (255.0 * (d.abs() - 4.0) / 8.0).clamp(0.0, 255.0) as u8
        })
        .unwrap()
    }

    fn create_uniform_image(width: u32, height: u32, intensity: u8) -> PixelBuffer {
        PixelBuffer::from_gray_fn(width, height, |_, _| intensity).unwrap()
    }

    #[test]
    fn test_axis_aligned_bars_need_no_rotation() {
        let img = PixelBuffer::from_gray_fn(200, 200, |_, y| if (y / 10) % 2 == 0 { 0 } else { 255 })
            .unwrap();
        let (angle, _) = detect_skew_angle(&img);

        assert_eq!(angle, 0.0);
        assert_eq!(skew_decision(angle), SkewDecision::NoRotation);
    }

    #[test]
    fn test_uniform_image_has_no_votes() {
        let img = create_uniform_image(100, 100, 128);
        let (angle, confidence) = detect_skew_angle(&img);
        assert_eq!(angle, 0.0);
        assert_eq!(confidence, 0.0);
    }

    #[test]
    fn test_vertical_lines_cast_no_votes() {
        let img = PixelBuffer::from_gray_fn(100, 100, |x, _| if (x / 10) % 2 == 0 { 0 } else { 255 })
            .unwrap();
        let (angle, _) = detect_skew_angle(&img);
        assert_eq!(angle, 0.0);
    }

    #[test]
    fn test_detects_positive_skew() {
        let img = create_bars_image(240, 5.0);
        let (angle, confidence) = detect_skew_angle(&img);
        assert!((angle - 5.0).abs() <= 0.5, "detected {}", angle);
        assert!(confidence > 0.0 && confidence <= 1.0);
    }

    #[test]
    fn test_detects_negative_skew() {
        let img = create_bars_image(240, -3.0);
        let (angle, _) = detect_skew_angle(&img);
        assert!((angle + 3.0).abs() <= 0.5, "detected {}", angle);
    }

    #[test]
    fn test_rotation_levels_lines() {
        let img = create_bars_image(240, 5.0);
        let (angle, _) = detect_skew_angle(&img);
        let degrees = match skew_decision(angle) {
            SkewDecision::Rotate { degrees } => degrees,
            SkewDecision::NoRotation => panic!("5° skew left unrotated"),
        };

        let rotated = rotate_image(&img, degrees, true);
        let (residual, _) = detect_skew_angle(&rotated);
        assert!(residual.abs() <= ROTATION_DEADBAND_DEGREES, "residual {}", residual);
    }

    #[test]
    fn test_rotation_grows_canvas_with_white_fill() {
        let img = create_uniform_image(100, 50, 0);
        let rotated = rotate_image(&img, 10.0, false);

        assert!(rotated.width() > 100);
        assert!(rotated.height() > 50);
        assert_eq!(rotated.gray_at(0, 0), 255);
        let (cx, cy) = (rotated.width() / 2, rotated.height() / 2);
        assert_eq!(rotated.gray_at(cx, cy), 0);
    }

    #[test]
    fn test_rotation_keeps_rgb_layout() {
        let samples: Vec<u8> = (0..30 * 20).flat_map(|_| [200, 10, 10]).collect();
        let img = PixelBuffer::new(30, 20, Channels::Rgb, samples).unwrap();
        let rotated = rotate_image(&img, -7.5, false);
        assert_eq!(rotated.channels(), Channels::Rgb);
        assert_eq!(rotated.samples().len(), rotated.row_len() * rotated.height() as usize);
    }

    #[test]
    fn test_skew_decision_deadband() {
        assert_eq!(skew_decision(0.5), SkewDecision::NoRotation);
        assert_eq!(skew_decision(-0.5), SkewDecision::NoRotation);
        assert_eq!(skew_decision(1.0), SkewDecision::Rotate { degrees: 1.0 });
    }

    #[test]
    fn test_fold_half_turn() {
        assert_eq!(fold_half_turn(-180.0), 0.0);
        assert_eq!(fold_half_turn(95.0), -85.0);
        assert_eq!(fold_half_turn(-90.0), 90.0);
    }
}
