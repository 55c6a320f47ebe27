//! FFT and window helpers for spectrum measurements.
//!
//! The analyzer runs one FFT per measurement at a fixed size (the
//! measurement-interval length), so the transform plan is built once and
//! reused across a whole frequency sweep.
//!
//! A Hann window is applied before the transform. Rectangular would be
//! numerically exact here — every harmonic has an integer number of cycles
//! over the measurement interval — but Hann rejects interference from
//! frequencies that do *not* fall on exact bins, which matters on a live
//! antenna port. The ~6 dB amplitude loss is corrected in the analyzer.

use rustfft::{num_complex::Complex64, Fft, FftPlanner};
use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use crate::types::IQSample;

/// Forward-FFT processor with a preplanned transform and scratch buffer.
pub struct FftProcessor {
    /// FFT size
    size: usize,
    /// Forward FFT instance
    fft_forward: Arc<dyn Fft<f64>>,
    /// Scratch buffer for FFT operations
    scratch: Vec<Complex64>,
}

impl fmt::Debug for FftProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftProcessor")
            .field("size", &self.size)
            .finish()
    }
}

impl FftProcessor {
    /// Create a new FFT processor for the given size.
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft_forward = planner.plan_fft_forward(size);
        let scratch = vec![Complex64::new(0.0, 0.0); fft_forward.get_inplace_scratch_len()];

        Self {
            size,
            fft_forward,
            scratch,
        }
    }

    /// Get the FFT size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Compute the forward FFT in-place.
    pub fn fft_inplace(&mut self, buffer: &mut [Complex64]) {
        assert_eq!(buffer.len(), self.size);
        self.fft_forward
            .process_with_scratch(buffer, &mut self.scratch);
    }

    /// Compute the forward FFT, returning a new buffer.
    ///
    /// Input shorter than the FFT size is zero-padded.
    pub fn fft(&mut self, input: &[IQSample]) -> Vec<Complex64> {
        let mut buffer: Vec<Complex64> = input.to_vec();
        buffer.resize(self.size, Complex64::new(0.0, 0.0));
        self.fft_inplace(&mut buffer);
        buffer
    }
}

/// Periodic Hann window coefficients: `0.5 * (1 - cos(2πi/n))`.
///
/// The coefficients sum to exactly `n/2`, which is where the analyzer's
/// +6.02 dB scaling correction comes from.
pub fn hann_window(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / n as f64).cos()))
        .collect()
}
