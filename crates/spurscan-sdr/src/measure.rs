//! Burst/capture coordinator.
//!
//! One measurement cycle drives the front end through a fixed sequence:
//! tune both LOs, activate both streams, schedule a timed burst a safe
//! margin into the future, block on the receive capture, deactivate the
//! streams, then cut the settled measurement window out of the capture.
//!
//! The burst is scheduled into the near future because the hardware
//! pipeline has nonzero and variable latency between the write request and
//! the signal actually leaving the antenna; scheduling too close to "now"
//! risks the burst missing the transmit window entirely.
//!
//! The `Measurer` owns the front end exclusively. Tuning, gain and stream
//! state are only ever mutated through it, and both streams are returned to
//! idle before any measurement call returns, on failure paths included.

use spurscan_core::harmonics::{HarmonicAnalyzer, HarmonicResult};
use spurscan_core::types::{IQBuffer, IQSample};
use spurscan_core::window::{extract_window, WindowError};

use crate::config::{ConfigError, MeasurementConfig};
use crate::frontend::{Direction, FrontEnd, FrontEndError, SampleFormat, StreamId};

/// Failure of a single measurement. Nothing in here is retried by the
/// coordinator; sweep callers decide whether to continue.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeasureError {
    /// Invalid parameter set, rejected at construction.
    #[error("invalid measurement configuration: {0}")]
    Config(#[from] ConfigError),

    /// The front end signaled a failure; propagated unchanged.
    #[error("front-end error: {0}")]
    Hardware(#[from] FrontEndError),

    /// The capture did not contain the settled measurement interval.
    #[error(transparent)]
    Window(#[from] WindowError),
}

/// The transmit burst: a constant-amplitude complex sample sequence covering
/// the settling intervals and the measurement interval. Built once and
/// reused for every frequency in a sweep.
#[derive(Debug, Clone)]
pub struct TxBurst {
    samples: IQBuffer,
}

impl TxBurst {
    fn from_config(config: &MeasurementConfig) -> Self {
        Self {
            samples: vec![IQSample::new(config.tx_amplitude, 0.0); config.burst_samples()],
        }
    }

    /// The burst samples.
    pub fn samples(&self) -> &[IQSample] {
        &self.samples
    }

    /// Burst length in samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// A burst is never empty for a valid configuration.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// One receive capture and the scalars the hardware returned with it.
/// Created fresh per measurement; dropped once the window is cut out.
struct RxCapture {
    samples: IQBuffer,
    filled: usize,
    start_time_ns: i64,
    burst_time_ns: i64,
}

/// Burst/capture coordinator: performs single-shot harmonic measurements
/// against a radio front end.
#[derive(Debug)]
pub struct Measurer<D: FrontEnd> {
    device: D,
    config: MeasurementConfig,
    burst: TxBurst,
    analyzer: HarmonicAnalyzer,
    rx_stream: StreamId,
    tx_stream: StreamId,
}

impl<D: FrontEnd> Measurer<D> {
    /// Validate the configuration, apply the static device state (sample
    /// rates, antennas, gains) and open both streams.
    ///
    /// Streams are left inactive; they only run for the duration of a
    /// measurement.
    pub fn new(mut device: D, config: MeasurementConfig) -> Result<Self, MeasureError> {
        config.validate()?;

        for direction in [Direction::Rx, Direction::Tx] {
            let channel = match direction {
                Direction::Rx => config.rx_channel,
                Direction::Tx => config.tx_channel,
            };
            device.set_sample_rate(direction, channel, config.sample_rate_hz)?;
        }
        device.set_antenna(Direction::Rx, config.rx_channel, &config.rx_antenna)?;
        device.set_antenna(Direction::Tx, config.tx_channel, &config.tx_antenna)?;
        for gain in &config.rx_gains {
            device.set_gain(
                Direction::Rx,
                config.rx_channel,
                gain.stage.as_deref(),
                gain.gain_db,
            )?;
        }
        for gain in &config.tx_gains {
            device.set_gain(
                Direction::Tx,
                config.tx_channel,
                gain.stage.as_deref(),
                gain.gain_db,
            )?;
        }

        let rx_stream = device.setup_stream(Direction::Rx, SampleFormat::ComplexFloat32)?;
        let tx_stream = device.setup_stream(Direction::Tx, SampleFormat::ComplexFloat32)?;

        let burst = TxBurst::from_config(&config);
        let analyzer = HarmonicAnalyzer::new(config.measurement_samples, config.offset_bins);

        tracing::info!(
            sample_rate_hz = config.sample_rate_hz,
            burst_samples = burst.len(),
            offset_bins = config.offset_bins,
            "measurer initialized"
        );

        Ok(Self {
            device,
            config,
            burst,
            analyzer,
            rx_stream,
            tx_stream,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &MeasurementConfig {
        &self.config
    }

    /// The owned front end, for inspection.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Release the front end.
    pub fn into_device(self) -> D {
        self.device
    }

    /// Perform one measurement at the given target frequency and return the
    /// samples of the settled measurement interval.
    ///
    /// The receive LO is tuned a fixed bin offset away from the target and
    /// the transmit LO to the configured ratio of it, so each odd harmonic
    /// of the transmitted tone lands on its own receive bin.
    pub fn measure(&mut self, target_freq_hz: f64) -> Result<IQBuffer, MeasureError> {
        let rx_freq = target_freq_hz + self.config.rx_lo_offset_hz();
        let tx_freq = self.config.tx_frequency_hz(target_freq_hz);
        self.device
            .set_frequency(Direction::Rx, self.config.rx_channel, rx_freq)?;
        self.device
            .set_frequency(Direction::Tx, self.config.tx_channel, tx_freq)?;
        tracing::debug!(target_freq_hz, rx_freq, tx_freq, "tuned");

        self.device.activate_stream(self.tx_stream)?;
        if let Err(e) = self.device.activate_stream(self.rx_stream) {
            let _ = self.device.deactivate_stream(self.tx_stream);
            return Err(e.into());
        }

        let outcome = self.burst_and_capture();

        // Both streams go back to idle no matter how the cycle went; the
        // front end must never be left streaming between measurements.
        let tx_idle = self.device.deactivate_stream(self.tx_stream);
        let rx_idle = self.device.deactivate_stream(self.rx_stream);

        let capture = outcome?;
        tx_idle?;
        rx_idle?;

        let window = extract_window(
            capture.burst_time_ns,
            capture.start_time_ns,
            self.config.sample_rate_hz,
            self.config.settle_before,
            self.config.measurement_samples,
            capture.filled,
        )?;
        Ok(window.slice(&capture.samples).to_vec())
    }

    /// Perform one measurement and analyze it into per-harmonic levels.
    pub fn measure_harmonics(
        &mut self,
        target_freq_hz: f64,
    ) -> Result<HarmonicResult, MeasureError> {
        let windowed = self.measure(target_freq_hz)?;
        Ok(self.analyzer.analyze(&windowed))
    }

    /// Schedule the burst a margin into the future and block on the capture.
    /// Runs with both streams active; the caller handles deactivation.
    fn burst_and_capture(&mut self) -> Result<RxCapture, FrontEndError> {
        let now_ns = self.device.hardware_time_ns();
        let burst_time_ns = now_ns + self.config.scheduling_margin_ns;

        let written = self.device.write_timed_burst(
            self.tx_stream,
            self.burst.samples(),
            burst_time_ns,
            true,
        )?;
        tracing::debug!(written, burst_time_ns, "burst scheduled");

        let mut samples = vec![IQSample::new(0.0, 0.0); self.config.rx_buffer_samples];
        let status = self.device.read_blocking(self.rx_stream, &mut samples)?;
        tracing::debug!(
            samples_read = status.samples_read,
            start_time_ns = status.start_time_ns,
            "capture complete"
        );

        Ok(RxCapture {
            samples,
            filled: status.samples_read,
            start_time_ns: status.start_time_ns,
            burst_time_ns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimFrontEnd;

    /// A config sized for fast simulation: 1 MS/s, 1 ms scheduling margin
    /// (1000 samples), the reference 500/2048/500 burst shape.
    fn sim_config() -> MeasurementConfig {
        MeasurementConfig {
            sample_rate_hz: 1_000_000.0,
            scheduling_margin_ns: 1_000_000,
            rx_buffer_samples: 8192,
            ..Default::default()
        }
    }

    /// Frequency of the bin where harmonic 1 lands, relative to the RX LO.
    fn bin_freq(config: &MeasurementConfig, bins: f64) -> f64 {
        bins * config.sample_rate_hz / config.measurement_samples as f64
    }

    #[test]
    fn test_measure_returns_measurement_interval() {
        let config = sim_config();
        let sim = SimFrontEnd::new().with_tone(bin_freq(&config, 20.0), 1.0);
        let mut measurer = Measurer::new(sim, config.clone()).unwrap();

        let windowed = measurer.measure(2.4e9).unwrap();
        assert_eq!(windowed.len(), config.measurement_samples);
    }

    #[test]
    fn test_measure_tunes_both_los() {
        let config = sim_config();
        let mut measurer = Measurer::new(SimFrontEnd::new(), config.clone()).unwrap();
        measurer.measure(2.4e9).unwrap();

        let rx = measurer.device().rx_frequency_hz();
        let tx = measurer.device().tx_frequency_hz();
        assert!((rx - (2.4e9 + config.rx_lo_offset_hz())).abs() < 1e-3);
        assert!((tx - 2.4e9 * 3.0 / 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_measure_harmonics_full_scale_fundamental() {
        let config = sim_config();
        // Fundamental at +offset bins, a -40 dB third harmonic on its true
        // (negative) bin, and some -60 dB image leakage of the fundamental.
        let sim = SimFrontEnd::new()
            .with_tone(bin_freq(&config, 20.0), 1.0)
            .with_tone(bin_freq(&config, -60.0), 0.01)
            .with_tone(bin_freq(&config, -20.0), 0.001);
        let mut measurer = Measurer::new(sim, config).unwrap();

        let result = measurer.measure_harmonics(2.4e9).unwrap();
        assert_eq!(result.harmonics[0], 1);
        assert!(result.levels_db[0].abs() < 0.5, "h1 = {}", result.levels_db[0]);

        let h3 = result.harmonics.iter().position(|&h| h == 3).unwrap();
        assert!(
            (result.levels_db[h3] + 40.0).abs() < 0.5,
            "h3 = {}",
            result.levels_db[h3]
        );
        assert!(
            (result.image_levels_db[0] + 60.0).abs() < 0.5,
            "h1 image = {}",
            result.image_levels_db[0]
        );
    }

    #[test]
    fn test_short_capture_fails_distinguishably() {
        let config = sim_config();
        let mut sim = SimFrontEnd::new();
        // Burst lands 1000 samples in, window ends at 3548; 3000 captured
        // samples are not enough.
        sim.queue_read_limit(Some(3000));
        let mut measurer = Measurer::new(sim, config).unwrap();

        let err = measurer.measure(2.4e9).unwrap_err();
        assert_eq!(
            err,
            MeasureError::Window(WindowError::TooShort {
                end: 3548,
                filled: 3000
            })
        );
    }

    #[test]
    fn test_late_capture_fails_too_early() {
        let config = sim_config();
        let mut sim = SimFrontEnd::new();
        // Capture starts 2 ms after activation, 1 ms after the burst.
        sim.set_capture_delay_ns(2_000_000);
        let mut measurer = Measurer::new(sim, config).unwrap();

        let err = measurer.measure(2.4e9).unwrap_err();
        assert!(matches!(
            err,
            MeasureError::Window(WindowError::TooEarly(_))
        ));
    }

    #[test]
    fn test_streams_idle_after_success_and_failure() {
        let config = sim_config();
        let mut sim = SimFrontEnd::new();
        sim.queue_read_limit(Some(100)); // first measurement fails
        let mut measurer = Measurer::new(sim, config).unwrap();

        assert!(measurer.measure(2.4e9).is_err());
        assert!(!measurer.device().is_stream_active(measurer.rx_stream));
        assert!(!measurer.device().is_stream_active(measurer.tx_stream));

        assert!(measurer.measure(2.4e9).is_ok());
        assert!(!measurer.device().is_stream_active(measurer.rx_stream));
        assert!(!measurer.device().is_stream_active(measurer.tx_stream));
    }

    #[test]
    fn test_hardware_error_propagates() {
        let config = sim_config();
        let mut sim = SimFrontEnd::new();
        sim.fail_next_tune();
        let mut measurer = Measurer::new(sim, config).unwrap();

        let err = measurer.measure(2.4e9).unwrap_err();
        assert!(matches!(err, MeasureError::Hardware(_)));
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let config = MeasurementConfig {
            offset_bins: 0,
            ..sim_config()
        };
        let err = Measurer::new(SimFrontEnd::new(), config).unwrap_err();
        assert_eq!(err, MeasureError::Config(ConfigError::ZeroOffset));
    }

    #[test]
    fn test_burst_shape() {
        let config = sim_config();
        let burst = TxBurst::from_config(&config);
        assert_eq!(burst.len(), 3048);
        assert!(burst
            .samples()
            .iter()
            .all(|s| s.re == config.tx_amplitude && s.im == 0.0));
    }
}
