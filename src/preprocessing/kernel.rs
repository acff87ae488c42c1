//! # Kernels and Histograms
//!
//! Small numeric building blocks shared by the filtering stages: Gaussian
//! weight vectors with separable convolution, and 256-bin histograms.

use super::buffer::PixelBuffer;

/// Unnormalized Gaussian `exp(-x² / 2σ²)`.
#[inline]
pub fn gaussian(x: f64, sigma: f64) -> f64 {
    (-(x * x) / (2.0 * sigma * sigma)).exp()
}

/// Immutable 1-D Gaussian weight vector, normalized to sum to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    weights: Vec<f64>,
    radius: usize,
}

impl Kernel {
    /// Builds a normalized kernel with `2 * radius + 1` taps.
    pub fn gaussian(sigma: f64, radius: usize) -> Self {
        let sigma = sigma.max(f64::EPSILON);
        let mut weights: Vec<f64> = (0..=2 * radius)
            .map(|i| gaussian(i as f64 - radius as f64, sigma))
            .collect();
        let sum: f64 = weights.iter().sum();
        for w in &mut weights {
            *w /= sum;
        }
        Self { weights, radius }
    }

    /// Kernel for a blur "radius" in the photo-editor sense: σ equals the
    /// radius and the taps cover ±3σ.
    pub fn for_blur_radius(blur_radius: f64) -> Self {
        let sigma = blur_radius.max(0.1);
        Self::gaussian(sigma, (3.0 * sigma).ceil() as usize)
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Horizontal then vertical pass; out-of-range taps clamp to the edge.
    /// Returns a new buffer with the same layout.
    pub fn convolve_separable(&self, buffer: &PixelBuffer, parallel: bool) -> PixelBuffer {
        let width = buffer.width() as usize;
        let height = buffer.height() as usize;
        let channels = buffer.channels().count();
        let row_len = buffer.row_len();
        let radius = self.radius as isize;

        // Horizontal pass into f64 to avoid double rounding.
        let src = buffer.samples();
        let mut horizontal = vec![0f64; src.len()];
        for y in 0..height {
            let row = &src[y * row_len..(y + 1) * row_len];
            for x in 0..width {
                for c in 0..channels {
                    let mut acc = 0.0;
                    for (k, w) in self.weights.iter().enumerate() {
                        let sx = (x as isize + k as isize - radius).clamp(0, width as isize - 1);
                        acc += w * row[sx as usize * channels + c] as f64;
                    }
                    horizontal[y * row_len + x * channels + c] = acc;
                }
            }
        }

        let mut output = buffer.clone();
        output.for_each_row_mut(parallel, |y, row| {
            for x in 0..width {
                for c in 0..channels {
                    let mut acc = 0.0;
                    for (k, w) in self.weights.iter().enumerate() {
                        let sy = (y as isize + k as isize - radius).clamp(0, height as isize - 1);
                        acc += w * horizontal[sy as usize * row_len + x * channels + c];
                    }
                    row[x * channels + c] = acc.round().clamp(0.0, 255.0) as u8;
                }
            }
        });
        output
    }
}

/// 256-bin intensity histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    bins: [u32; 256],
    total: u64,
}

impl Histogram {
    pub fn from_samples<I>(samples: I) -> Self
    where
        I: IntoIterator<Item = u8>,
    {
        let mut bins = [0u32; 256];
        let mut total = 0u64;
        for value in samples {
            bins[value as usize] += 1;
            total += 1;
        }
        Self { bins, total }
    }

    pub fn from_bins(bins: [u32; 256]) -> Self {
        let total = bins.iter().map(|&c| c as u64).sum();
        Self { bins, total }
    }

    pub fn bins(&self) -> &[u32; 256] {
        &self.bins
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Bin probabilities; all zeros for an empty histogram.
    pub fn normalized(&self) -> [f64; 256] {
        let mut probabilities = [0f64; 256];
        if self.total == 0 {
            return probabilities;
        }
        for (p, &count) in probabilities.iter_mut().zip(self.bins.iter()) {
            *p = count as f64 / self.total as f64;
        }
        probabilities
    }
}
