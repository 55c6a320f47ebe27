//! Frequency sweep orchestration.
//!
//! The front end is a single shared resource, so frequencies are measured
//! strictly one after another. Each frequency is independent: a failure is
//! recorded in its slot and the sweep moves on, so a bad frequency can
//! never masquerade as a measured result.

use crate::frontend::FrontEnd;
use crate::measure::{MeasureError, Measurer};
use spurscan_core::harmonics::HarmonicResult;

/// The outcome at one sweep frequency.
#[derive(Debug, Clone)]
pub struct SweepPoint {
    /// Target frequency in Hz
    pub frequency_hz: f64,
    /// Harmonic levels, or why this frequency could not be measured
    pub result: Result<HarmonicResult, MeasureError>,
}

/// Measure every frequency in order, one `SweepPoint` per input frequency.
pub fn sweep<D: FrontEnd>(measurer: &mut Measurer<D>, frequencies: &[f64]) -> Vec<SweepPoint> {
    frequencies
        .iter()
        .map(|&frequency_hz| {
            let result = measurer.measure_harmonics(frequency_hz);
            if let Err(error) = &result {
                tracing::warn!(frequency_hz, %error, "measurement failed, continuing sweep");
            }
            SweepPoint {
                frequency_hz,
                result,
            }
        })
        .collect()
}

/// Evenly spaced sweep frequencies from `start_hz` to `stop_hz` inclusive.
pub fn frequency_steps(start_hz: f64, stop_hz: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start_hz],
        _ => {
            let step = (stop_hz - start_hz) / (count - 1) as f64;
            (0..count).map(|i| start_hz + step * i as f64).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MeasurementConfig;
    use crate::sim::SimFrontEnd;
    use spurscan_core::window::WindowError;

    fn sim_config() -> MeasurementConfig {
        MeasurementConfig {
            sample_rate_hz: 1_000_000.0,
            scheduling_margin_ns: 1_000_000,
            rx_buffer_samples: 8192,
            ..Default::default()
        }
    }

    #[test]
    fn test_sweep_preserves_order_and_isolates_failures() {
        let config = sim_config();
        let tone_hz = 20.0 * config.sample_rate_hz / config.measurement_samples as f64;
        let mut sim = SimFrontEnd::new().with_tone(tone_hz, 1.0);
        // Second capture comes up short; first and third are fine.
        sim.queue_read_limit(None);
        sim.queue_read_limit(Some(3000));
        sim.queue_read_limit(None);

        let mut measurer = Measurer::new(sim, config).unwrap();
        let freqs = [2.40e9, 2.41e9, 2.42e9];
        let points = sweep(&mut measurer, &freqs);

        assert_eq!(points.len(), 3);
        for (point, freq) in points.iter().zip(freqs) {
            assert_eq!(point.frequency_hz, freq);
        }

        assert!(points[0].result.is_ok());
        assert!(matches!(
            points[1].result,
            Err(MeasureError::Window(WindowError::TooShort { .. }))
        ));
        assert!(points[2].result.is_ok());

        // Successful points carry real levels, not fabricated ones.
        let first = points[0].result.as_ref().unwrap();
        assert!(first.levels_db[0].abs() < 0.5);
    }

    #[test]
    fn test_sweep_of_nothing_is_empty() {
        let mut measurer = Measurer::new(SimFrontEnd::new(), sim_config()).unwrap();
        assert!(sweep(&mut measurer, &[]).is_empty());
    }

    #[test]
    fn test_frequency_steps() {
        let steps = frequency_steps(2.4e9, 2.45e9, 6);
        assert_eq!(steps.len(), 6);
        assert_eq!(steps[0], 2.4e9);
        assert_eq!(steps[5], 2.45e9);
        assert!((steps[1] - 2.41e9).abs() < 1.0);

        assert_eq!(frequency_steps(1.0, 2.0, 1), vec![1.0]);
        assert!(frequency_steps(1.0, 2.0, 0).is_empty());
    }
}
