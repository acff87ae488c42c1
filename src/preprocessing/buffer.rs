//! # Pixel Buffer
//!
//! The owned sample grid every preprocessing stage reads and writes.
//! Samples are stored row-major and interleaved (`RGBRGB...` for color).

use image::{DynamicImage, GrayImage, RgbImage};
use rayon::prelude::*;

use super::types::PreprocessingError;

/// Sample layout of a [`PixelBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channels {
    Gray,
    Rgb,
}

impl Channels {
    /// Number of interleaved samples per pixel.
    pub fn count(self) -> usize {
        match self {
            Channels::Gray => 1,
            Channels::Rgb => 3,
        }
    }
}

/// A width×height grid of 8-bit samples.
///
/// Invariant: `samples.len() == width * height * channels.count()` and the
/// area is non-zero. Both are checked by every constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: Channels,
    samples: Vec<u8>,
}

/// BT.601 luma with integer weights.
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32 + 500) / 1000) as u8
}

impl PixelBuffer {
    /// Creates a buffer from raw interleaved samples.
    ///
    /// # Errors
    ///
    /// Returns `PreprocessingError::Dimension` for a zero-area image or when
    /// the sample count does not match `width * height * channels`.
    pub fn new(
        width: u32,
        height: u32,
        channels: Channels,
        samples: Vec<u8>,
    ) -> Result<Self, PreprocessingError> {
        let expected = width as usize * height as usize * channels.count();
        if width == 0 || height == 0 || samples.len() != expected {
            return Err(PreprocessingError::Dimension { width, height });
        }
        Ok(Self {
            width,
            height,
            channels,
            samples,
        })
    }

    /// Creates a buffer with every sample set to `value`.
    pub fn filled(
        width: u32,
        height: u32,
        channels: Channels,
        value: u8,
    ) -> Result<Self, PreprocessingError> {
        let len = width as usize * height as usize * channels.count();
        Self::new(width, height, channels, vec![value; len])
    }

    /// Creates a grayscale buffer by evaluating `f(x, y)` for every pixel.
    pub fn from_gray_fn<F>(width: u32, height: u32, f: F) -> Result<Self, PreprocessingError>
    where
        F: Fn(u32, u32) -> u8,
    {
        let mut samples = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                samples.push(f(x, y));
            }
        }
        Self::new(width, height, Channels::Gray, samples)
    }

    /// Decodes raw image bytes (any format the `image` crate understands).
    ///
    /// # Errors
    ///
    /// Returns `PreprocessingError::Decode` when the bytes are not a
    /// supported raster image, `PreprocessingError::Dimension` for an empty one.
    pub fn decode(bytes: &[u8]) -> Result<Self, PreprocessingError> {
        let image = image::load_from_memory(bytes)?;
        Self::from_dynamic(&image)
    }

    /// Converts a decoded image. Grayscale variants stay single-channel,
    /// everything else becomes RGB; alpha is dropped.
    pub fn from_dynamic(image: &DynamicImage) -> Result<Self, PreprocessingError> {
        let (width, height) = (image.width(), image.height());
        match image {
            DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_) => {
                Self::new(width, height, Channels::Gray, image.to_luma8().into_raw())
            }
            _ => Self::new(width, height, Channels::Rgb, image.to_rgb8().into_raw()),
        }
    }

    /// Converts back into an `image` crate value for encoding.
    pub fn to_dynamic(&self) -> DynamicImage {
        let converted = match self.channels {
            Channels::Gray => GrayImage::from_raw(self.width, self.height, self.samples.clone())
                .map(DynamicImage::ImageLuma8),
            Channels::Rgb => RgbImage::from_raw(self.width, self.height, self.samples.clone())
                .map(DynamicImage::ImageRgb8),
        };
        // The constructor invariant guarantees the raw length matches.
        converted.unwrap_or_else(|| DynamicImage::new_luma8(self.width, self.height))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [u8] {
        &mut self.samples
    }

    /// Number of samples in one row.
    pub fn row_len(&self) -> usize {
        self.width as usize * self.channels.count()
    }

    /// Luminance of the pixel at `(x, y)`.
    pub fn gray_at(&self, x: u32, y: u32) -> u8 {
        let idx = (y as usize * self.width as usize + x as usize) * self.channels.count();
        match self.channels {
            Channels::Gray => self.samples[idx],
            Channels::Rgb => luminance(
                self.samples[idx],
                self.samples[idx + 1],
                self.samples[idx + 2],
            ),
        }
    }

    /// One luminance sample per pixel, row-major.
    pub fn luminance_plane(&self) -> Vec<u8> {
        match self.channels {
            Channels::Gray => self.samples.clone(),
            Channels::Rgb => self
                .samples
                .chunks_exact(3)
                .map(|px| luminance(px[0], px[1], px[2]))
                .collect(),
        }
    }

    /// Luminance plane as an `image::GrayImage` (for imageproc operators).
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_raw(self.width, self.height, self.luminance_plane())
            .unwrap_or_else(|| GrayImage::new(self.width, self.height))
    }

    /// Collapses color to a single luminance channel.
    pub fn into_grayscale(self) -> Self {
        match self.channels {
            Channels::Gray => self,
            Channels::Rgb => {
                let samples = self.luminance_plane();
                Self {
                    width: self.width,
                    height: self.height,
                    channels: Channels::Gray,
                    samples,
                }
            }
        }
    }

    /// Fraction of pixels whose luminance is below mid-gray.
    pub fn foreground_ratio(&self) -> f64 {
        let plane = self.luminance_plane();
        let dark = plane.iter().filter(|&&v| v < 128).count();
        dark as f64 / plane.len() as f64
    }

    /// Whether every sample is either 0 or 255.
    pub fn is_binary(&self) -> bool {
        self.samples.iter().all(|&v| v == 0 || v == 255)
    }

    /// Runs `f(y, row)` over every row, on the rayon pool when `parallel`.
    ///
    /// Callers that need neighbor data must read it from a separate source
    /// buffer; rows handed to `f` are disjoint.
    pub fn for_each_row_mut<F>(&mut self, parallel: bool, f: F)
    where
        F: Fn(usize, &mut [u8]) + Send + Sync,
    {
        let row_len = self.row_len();
        if parallel {
            self.samples
                .par_chunks_mut(row_len)
                .enumerate()
                .for_each(|(y, row)| f(y, row));
        } else {
            self.samples
                .chunks_mut(row_len)
                .enumerate()
                .for_each(|(y, row)| f(y, row));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_zero_area() {
        let result = PixelBuffer::new(0, 10, Channels::Gray, Vec::new());
        assert_eq!(
            result,
            Err(PreprocessingError::Dimension {
                width: 0,
                height: 10
            })
        );
    }

    #[test]
    fn test_new_rejects_mismatched_sample_count() {
        let result = PixelBuffer::new(4, 4, Channels::Rgb, vec![0; 16]);
        assert!(matches!(result, Err(PreprocessingError::Dimension { .. })));
    }

    #[test]
    fn test_decode_garbage_bytes() {
        let result = PixelBuffer::decode(b"definitely not an image");
        assert!(matches!(result, Err(PreprocessingError::Decode { .. })));
    }

    #[test]
    fn test_dynamic_round_trip_keeps_layout() {
        let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30])));
        let buffer = PixelBuffer::from_dynamic(&rgb).unwrap();
        assert_eq!(buffer.channels(), Channels::Rgb);
        assert_eq!(buffer.samples().len(), 18);

        let back = buffer.to_dynamic();
        assert_eq!(back.to_rgb8().get_pixel(2, 1).0, [10, 20, 30]);
    }

    #[test]
    fn test_luminance_weights() {
        assert_eq!(luminance(255, 255, 255), 255);
        assert_eq!(luminance(0, 0, 0), 0);
        assert_eq!(luminance(255, 0, 0), 76);
    }

    #[test]
    fn test_foreground_ratio() {
        let buffer = PixelBuffer::from_gray_fn(10, 10, |x, _| if x < 3 { 0 } else { 255 }).unwrap();
        assert!((buffer.foreground_ratio() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_for_each_row_mut_parallel_matches_sequential() {
        let base = PixelBuffer::from_gray_fn(17, 9, |x, y| (x * 7 + y * 3) as u8).unwrap();

        let mut seq = base.clone();
        seq.for_each_row_mut(false, |y, row| {
            for v in row.iter_mut() {
                *v = v.wrapping_add(y as u8);
            }
        });
        let mut par = base;
        par.for_each_row_mut(true, |y, row| {
            for v in row.iter_mut() {
                *v = v.wrapping_add(y as u8);
            }
        });

        assert_eq!(seq, par);
    }
}
