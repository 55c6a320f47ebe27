//! Locating the settled measurement interval inside a capture.
//!
//! The burst is scheduled on the hardware clock and the receive stream
//! reports the hardware timestamp of its first captured sample, so the
//! burst's position in the capture buffer is pure timestamp arithmetic:
//!
//! ```text
//! capture:  [............|settle|== measurement ==|settle|....]
//!           ^            ^      ^
//!           capture      burst  window start = burst offset
//!           timestamp    lands    + settle samples
//! ```
//!
//! All nanosecond-to-sample conversion goes through [`ns_to_samples`]; the
//! margins involved are tight enough that a second, slightly different
//! conversion would be a rounding bug waiting to happen.

use crate::types::IQSample;

/// Failure to place the measurement interval inside the capture.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    /// The burst landed before the capture began; the scheduling margin was
    /// insufficient or the hardware clock skewed.
    #[error("measurement window starts {0} samples before the capture")]
    TooEarly(i64),

    /// The capture ended before the measurement interval did; the receive
    /// buffer was too small for the burst timing.
    #[error("measurement window ends at sample {end} but only {filled} samples were captured")]
    TooShort { end: usize, filled: usize },
}

/// A half-open sample-index range `[start, end)` into a capture buffer.
///
/// Only produced by [`extract_window`], which guarantees the range lies
/// entirely within the captured samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementWindow {
    start: usize,
    end: usize,
}

impl MeasurementWindow {
    /// First sample index of the window.
    pub fn start(&self) -> usize {
        self.start
    }

    /// One past the last sample index of the window.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Window length in samples.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True for a zero-length window.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Borrow the windowed samples out of a capture buffer.
    pub fn slice<'a>(&self, capture: &'a [IQSample]) -> &'a [IQSample] {
        &capture[self.start..self.end]
    }
}

/// Convert a signed nanosecond interval to samples, rounded to nearest.
#[inline]
pub fn ns_to_samples(interval_ns: i64, sample_rate_hz: f64) -> i64 {
    let samples_per_ns = sample_rate_hz * 1e-9;
    (interval_ns as f64 * samples_per_ns).round() as i64
}

/// Compute the sample range of the settled measurement interval.
///
/// `burst_time_ns` is the hardware timestamp the burst was scheduled for,
/// `capture_time_ns` the timestamp of the first captured sample, and
/// `samples_filled` how many samples the blocking read actually produced.
/// On success the returned window lies entirely within `[0, samples_filled)`.
pub fn extract_window(
    burst_time_ns: i64,
    capture_time_ns: i64,
    sample_rate_hz: f64,
    settle_samples: usize,
    measurement_samples: usize,
    samples_filled: usize,
) -> Result<MeasurementWindow, WindowError> {
    let burst_offset = ns_to_samples(burst_time_ns - capture_time_ns, sample_rate_hz);
    let start = burst_offset + settle_samples as i64;
    if start < 0 {
        return Err(WindowError::TooEarly(-start));
    }

    let start = start as usize;
    let end = start + measurement_samples;
    if end > samples_filled {
        return Err(WindowError::TooShort {
            end,
            filled: samples_filled,
        });
    }

    Ok(MeasurementWindow { start, end })
}
