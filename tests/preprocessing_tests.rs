//! # Image Preprocessing Tests
//!
//! Stage-level behavior checked through the public preprocessing API.

use docnorm::preprocessing::{
    apply_clahe, apply_threshold, clean_binary, detect_skew_angle, find_otsu_threshold,
    rotate_image, sharpen, skew_decision, Channels, Histogram, PixelBuffer, SkewDecision,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otsu_threshold_between_peaks() {
        let samples = std::iter::repeat(40u8)
            .take(500)
            .chain(std::iter::repeat(200u8).take(500));
        let threshold = find_otsu_threshold(&Histogram::from_samples(samples));
        assert!((40..200).contains(&threshold), "threshold was {}", threshold);
    }

    #[test]
    fn test_otsu_threshold_of_uniform_image_is_zero() {
        let threshold = find_otsu_threshold(&Histogram::from_samples(vec![128u8; 100]));
        assert_eq!(threshold, 0);
    }

    #[test]
    fn test_binarizer_is_idempotent_on_binary_input() {
        let page = PixelBuffer::from_gray_fn(60, 40, |x, y| {
            if (x / 7 + y / 5) % 2 == 0 {
                0
            } else {
                255
            }
        })
        .unwrap();

        let once = apply_threshold(&page, false).image;
        let twice = apply_threshold(&once, false).image;
        assert_eq!(once, page);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_opening_removes_speck_and_keeps_block() {
        let mut page = PixelBuffer::from_gray_fn(40, 40, |x, y| {
            let speck = x == 5 && y == 5;
            let block = (15..35).contains(&x) && (15..35).contains(&y);
            if speck || block {
                0
            } else {
                255
            }
        })
        .unwrap();

        clean_binary(&mut page, false);

        assert_eq!(page.gray_at(5, 5), 255);
        assert_eq!(page.gray_at(25, 25), 0);
        assert_eq!(page.gray_at(16, 25), 0);
        assert_eq!(page.gray_at(2, 2), 255);
    }

    #[test]
    fn test_straight_lines_inside_deadband() {
        let page = PixelBuffer::from_gray_fn(160, 160, |_, y| if y % 24 < 8 { 0 } else { 255 })
            .unwrap();
        let (angle, _) = detect_skew_angle(&page);

        assert_eq!(angle, 0.0);
        assert_eq!(skew_decision(angle), SkewDecision::NoRotation);
        assert_eq!(skew_decision(0.4), SkewDecision::NoRotation);
        assert_eq!(skew_decision(-0.6), SkewDecision::Rotate { degrees: -0.6 });
    }

    #[test]
    fn test_rotation_grows_canvas_with_white_fill() {
        let page = PixelBuffer::filled(100, 50, Channels::Gray, 0).unwrap();
        let rotated = rotate_image(&page, 10.0, false);

        assert_eq!(rotated.dimensions(), (108, 67));
        assert_eq!(rotated.gray_at(0, 0), 255);
        assert_eq!(rotated.gray_at(107, 66), 255);
        assert_eq!(rotated.gray_at(54, 33), 0);
    }

    #[test]
    fn test_clahe_keeps_odd_dimensions() {
        let page = PixelBuffer::from_gray_fn(131, 77, |x, y| ((x * 3 + y) % 200) as u8).unwrap();
        let enhanced = apply_clahe(&page, true);
        assert_eq!(enhanced.dimensions(), (131, 77));
        assert_eq!(enhanced.channels(), Channels::Gray);
    }

    #[test]
    fn test_sharpen_leaves_flat_page_alone() {
        let mut page = PixelBuffer::filled(48, 48, Channels::Rgb, 180).unwrap();
        let before = page.clone();
        sharpen(&mut page, true);
        assert_eq!(page, before);
    }

    #[test]
    fn test_sharpen_keeps_binary_page_binary() {
        let mut page =
            PixelBuffer::from_gray_fn(30, 30, |x, _| if x < 15 { 0 } else { 255 }).unwrap();
        sharpen(&mut page, false);
        assert!(page.is_binary());
        assert_eq!(page.gray_at(14, 10), 0);
        assert_eq!(page.gray_at(15, 10), 255);
    }
}
