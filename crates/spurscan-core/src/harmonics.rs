//! Odd-harmonic level extraction from a measurement capture.
//!
//! ## Algorithm overview
//!
//! 1. Apply a Hann window to the measurement-interval samples.
//! 2. Compute the FFT and convert every bin to power in dB.
//! 3. Apply the scaling correction `-20*log10(N) + 6.02` dB so a full-scale
//!    input tone reads ≈0 dB after the window's amplitude loss.
//! 4. Read out the bins where the odd harmonics of the transmit LO land.
//!
//! ## Bin selection
//!
//! Only odd harmonics are analyzed: a quadrature mixer driven by a
//! square-wave LO has no response at even multiples of its drive frequency.
//! For every second odd harmonic the mixer's 90° phase relationship becomes
//! -90°, which mirrors the spectrum, so the true bins alternate sign:
//!
//! | harmonic | true bin      | image bin     |
//! |----------|---------------|---------------|
//! | 1        | `+offset`     | `-offset`     |
//! | 3        | `-3 * offset` | `+3 * offset` |
//! | 5        | `+5 * offset` | `-5 * offset` |
//! | 7        | `-7 * offset` | `+7 * offset` |
//!
//! The image bin is always the sign-opposite of the true bin; energy there
//! indicates imperfect quadrature balance rather than pure harmonic level.
//!
//! ## Example
//!
//! ```rust
//! use spurscan_core::harmonics::HarmonicAnalyzer;
//! use spurscan_core::types::IQSample;
//! use std::f64::consts::PI;
//!
//! let n = 1024;
//! let offset = 10;
//! let mut analyzer = HarmonicAnalyzer::new(n, offset);
//!
//! // Full-scale tone at +offset bins: pure harmonic 1.
//! let samples: Vec<IQSample> = (0..n)
//!     .map(|i| {
//!         let phase = 2.0 * PI * offset as f64 * i as f64 / n as f64;
//!         IQSample::new(phase.cos(), phase.sin())
//!     })
//!     .collect();
//!
//! let result = analyzer.analyze(&samples);
//! assert_eq!(result.harmonics[0], 1);
//! assert!(result.levels_db[0].abs() < 0.5);
//! ```

use serde::{Deserialize, Serialize};

use crate::fft::{hann_window, FftProcessor};
use crate::types::{power_db, IQSample};

/// Per-harmonic spectrum levels from one measurement.
///
/// Three parallel arrays of equal length, ordered by increasing harmonic
/// number. Levels for empty bins (e.g. an all-zero capture) are `-inf` dB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonicResult {
    /// Odd harmonic numbers: 1, 3, 5, ...
    pub harmonics: Vec<u32>,
    /// Measured level at each harmonic's true bin, in dB
    pub levels_db: Vec<f64>,
    /// Measured level at each harmonic's image bin, in dB
    pub image_levels_db: Vec<f64>,
}

impl HarmonicResult {
    /// Number of harmonics in this result.
    pub fn len(&self) -> usize {
        self.harmonics.len()
    }

    /// True when no harmonic fit in the analyzed spectrum.
    pub fn is_empty(&self) -> bool {
        self.harmonics.is_empty()
    }
}

/// Spectrum analyzer for odd-harmonic measurements.
///
/// Owns a preplanned FFT and the window coefficients so a sweep reuses them
/// across every frequency.
#[derive(Debug)]
pub struct HarmonicAnalyzer {
    fft: FftProcessor,
    window: Vec<f64>,
    offset_bins: usize,
    /// Scaling applied to every bin so a full-scale tone reads ~0 dB
    scaling_db: f64,
}

impl HarmonicAnalyzer {
    /// Create an analyzer for measurement intervals of `fft_size` samples
    /// with the TX LO `offset_bins` bins away from the RX LO.
    ///
    /// # Panics
    ///
    /// Panics if `fft_size < 2` or `offset_bins == 0`; both are caller
    /// errors (an offset of zero would put every harmonic on the DC bin and
    /// make the harmonic count undefined).
    pub fn new(fft_size: usize, offset_bins: usize) -> Self {
        assert!(fft_size >= 2, "fft_size must be at least 2");
        assert!(offset_bins >= 1, "offset_bins must be at least 1");

        Self {
            fft: FftProcessor::new(fft_size),
            window: hann_window(fft_size),
            offset_bins,
            // -20*log10(N) undoes the FFT gain, +6.02 dB undoes the Hann
            // window's amplitude loss (its coefficients sum to N/2).
            scaling_db: -20.0 * (fft_size as f64).log10() + 6.02,
        }
    }

    /// FFT size (= measurement-interval length in samples).
    pub fn fft_size(&self) -> usize {
        self.fft.size()
    }

    /// TX-to-RX LO offset in bins.
    pub fn offset_bins(&self) -> usize {
        self.offset_bins
    }

    /// Measure the odd-harmonic levels of one capture.
    ///
    /// Deterministic: the same buffer always produces bit-identical output.
    ///
    /// # Panics
    ///
    /// Panics if `samples.len()` differs from the configured FFT size.
    pub fn analyze(&mut self, samples: &[IQSample]) -> HarmonicResult {
        let n = self.fft.size();
        assert_eq!(
            samples.len(),
            n,
            "capture length must equal the configured FFT size"
        );

        let windowed: Vec<IQSample> = samples
            .iter()
            .zip(self.window.iter())
            .map(|(&s, &w)| s * w)
            .collect();
        let spectrum = self.fft.fft(&windowed);

        let levels: Vec<f64> = spectrum
            .iter()
            .map(|&bin| power_db(bin) + self.scaling_db)
            .collect();

        // Only the first half of the spectrum is addressable; the highest
        // usable harmonic stays strictly below maxbin / offset.
        let maxbin = n / 2;
        let limit = maxbin / self.offset_bins;

        let mut harmonics = Vec::new();
        let mut levels_db = Vec::new();
        let mut image_levels_db = Vec::new();

        for (i, h) in (1..limit).step_by(2).enumerate() {
            // True bins alternate sign: +o, -3o, +5o, -7o, ...
            let magnitude = (h * self.offset_bins) as i64;
            let true_bin = if i % 2 == 0 { magnitude } else { -magnitude };

            harmonics.push(h as u32);
            levels_db.push(levels[Self::bin_index(true_bin, n)]);
            image_levels_db.push(levels[Self::bin_index(-true_bin, n)]);
        }

        HarmonicResult {
            harmonics,
            levels_db,
            image_levels_db,
        }
    }

    /// Map a signed bin number to an FFT array index (negative bins count
    /// down from the top of the spectrum).
    fn bin_index(bin: i64, n: usize) -> usize {
        if bin >= 0 {
            bin as usize
        } else {
            (n as i64 + bin) as usize
        }
    }
}

/// One-shot convenience wrapper around [`HarmonicAnalyzer`].
///
/// The FFT size is taken from the sample count. Prefer holding a
/// `HarmonicAnalyzer` when analyzing many captures of the same length.
pub fn analyze(samples: &[IQSample], offset_bins: usize) -> HarmonicResult {
    HarmonicAnalyzer::new(samples.len(), offset_bins).analyze(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    /// Complex exponential completing `cycles` periods over `n` samples.
    fn tone(n: usize, cycles: f64, amplitude: f64) -> Vec<IQSample> {
        (0..n)
            .map(|i| {
                let phase = 2.0 * PI * cycles * i as f64 / n as f64;
                IQSample::new(amplitude * phase.cos(), amplitude * phase.sin())
            })
            .collect()
    }

    #[test]
    fn test_full_scale_tone_reads_zero_db() {
        // Must hold for any window length and any offset >= 1.
        for (n, offset) in [(1024, 10), (2048, 20), (512, 7), (4096, 1), (300, 3)] {
            let samples = tone(n, offset as f64, 1.0);
            let result = analyze(&samples, offset);
            assert_eq!(result.harmonics[0], 1, "n={n} offset={offset}");
            assert!(
                result.levels_db[0].abs() < 0.5,
                "n={n} offset={offset}: harmonic 1 read {} dB",
                result.levels_db[0]
            );
        }
    }

    #[test]
    fn test_amplitude_maps_to_db() {
        // Half-scale tone should read ~-6 dB.
        let samples = tone(2048, 20.0, 0.5);
        let result = analyze(&samples, 20);
        assert_abs_diff_eq!(result.levels_db[0], -6.02, epsilon = 0.5);
    }

    #[test]
    fn test_deterministic() {
        let samples = tone(1024, 10.0, 0.8);
        let a = analyze(&samples, 10);
        let b = analyze(&samples, 10);
        assert_eq!(a, b);
    }

    #[test]
    fn test_harmonic_numbers_odd_increasing_bounded() {
        for (n, offset) in [(2048, 20), (1024, 3), (512, 1)] {
            let samples = tone(n, offset as f64, 1.0);
            let result = analyze(&samples, offset);
            assert!(!result.is_empty());
            assert_eq!(result.levels_db.len(), result.len());
            assert_eq!(result.image_levels_db.len(), result.len());

            let mut prev = 0;
            for &h in &result.harmonics {
                assert_eq!(h % 2, 1, "harmonic {h} is not odd");
                assert!(h > prev, "harmonics not strictly increasing");
                assert!(
                    h as usize * offset <= n / 2,
                    "harmonic {h} * offset {offset} exceeds maxbin {}",
                    n / 2
                );
                prev = h;
            }
        }
    }

    #[test]
    fn test_sign_alternation_of_true_bins() {
        let n = 2048;
        let offset = 20;

        // Harmonic 3's true bin is -3*offset: a tone there must show up as
        // the harmonic 3 level, while its mirror reads as the image.
        let samples = tone(n, -3.0 * offset as f64, 1.0);
        let result = analyze(&samples, offset);
        let h3 = result.harmonics.iter().position(|&h| h == 3).unwrap();
        assert!(
            result.levels_db[h3].abs() < 0.5,
            "tone at -3*offset should read ~0 dB on harmonic 3, got {}",
            result.levels_db[h3]
        );

        // Harmonic 5's true bin is back on the positive side.
        let samples = tone(n, 5.0 * offset as f64, 1.0);
        let result = analyze(&samples, offset);
        let h5 = result.harmonics.iter().position(|&h| h == 5).unwrap();
        assert!(result.levels_db[h5].abs() < 0.5);
    }

    #[test]
    fn test_image_level_reads_mirror_bin() {
        let n = 2048;
        let offset = 20;

        // A tone at -offset bins sits on harmonic 1's *image*.
        let samples = tone(n, -(offset as f64), 1.0);
        let result = analyze(&samples, offset);
        assert!(
            result.image_levels_db[0].abs() < 0.5,
            "image bin should read ~0 dB, got {}",
            result.image_levels_db[0]
        );
        // The true bin sees only window leakage, far below the tone.
        assert!(result.levels_db[0] < -40.0);
    }

    #[test]
    fn test_image_bin_never_equals_true_bin() {
        for (n, offset) in [(2048, 20), (1024, 255), (64, 1)] {
            let mut analyzer = HarmonicAnalyzer::new(n, offset);
            let samples = tone(n, offset as f64, 1.0);
            let result = analyzer.analyze(&samples);
            for (i, &h) in result.harmonics.iter().enumerate() {
                let magnitude = (h as usize * offset) as i64;
                let true_bin = if i % 2 == 0 { magnitude } else { -magnitude };
                assert_ne!(
                    HarmonicAnalyzer::bin_index(true_bin, n),
                    HarmonicAnalyzer::bin_index(-true_bin, n),
                    "n={n} offset={offset} harmonic {h}"
                );
            }
        }
    }

    #[test]
    fn test_zero_capture_yields_neg_infinity() {
        let samples = vec![IQSample::new(0.0, 0.0); 2048];
        let result = analyze(&samples, 20);
        assert!(!result.is_empty());
        for (&level, &image) in result.levels_db.iter().zip(&result.image_levels_db) {
            assert_eq!(level, f64::NEG_INFINITY);
            assert_eq!(image, f64::NEG_INFINITY);
        }
    }

    #[test]
    fn test_large_offset_yields_empty_result() {
        // offset > maxbin leaves no usable harmonic; not a panic.
        let samples = tone(64, 1.0, 1.0);
        let result = analyze(&samples, 40);
        assert!(result.is_empty());
    }

    #[test]
    #[should_panic(expected = "offset_bins must be at least 1")]
    fn test_zero_offset_rejected() {
        HarmonicAnalyzer::new(1024, 0);
    }

    #[test]
    #[should_panic(expected = "capture length must equal")]
    fn test_wrong_length_rejected() {
        let mut analyzer = HarmonicAnalyzer::new(1024, 10);
        analyzer.analyze(&tone(512, 10.0, 1.0));
    }
}
