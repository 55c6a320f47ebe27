//! Core types for harmonic distortion measurements.
//!
//! Captures and bursts are complex baseband I/Q samples throughout; `f64`
//! precision keeps the dB arithmetic exact enough that scaling corrections
//! in the analyzer stay well below the measurement tolerance.

use num_complex::Complex64;

/// A single I/Q sample point
pub type IQSample = Complex64;

/// A buffer of I/Q samples
pub type IQBuffer = Vec<IQSample>;

/// Power of a complex sample in dB: `10*log10(re² + im²)`.
///
/// A zero sample yields `-inf`, which is the documented floor for empty
/// bins; no clamping is applied.
#[inline]
pub fn power_db(sample: IQSample) -> f64 {
    10.0 * (sample.re * sample.re + sample.im * sample.im).log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_db_unit_sample() {
        assert_eq!(power_db(IQSample::new(1.0, 0.0)), 0.0);
    }

    #[test]
    fn test_power_db_zero_is_neg_infinity() {
        assert_eq!(power_db(IQSample::new(0.0, 0.0)), f64::NEG_INFINITY);
    }

    #[test]
    fn test_power_db_uses_both_components() {
        // |1+1j|² = 2 → ~3.01 dB
        let db = power_db(IQSample::new(1.0, 1.0));
        assert!((db - 3.0103).abs() < 1e-3);
    }
}
