//! # SDR Harmonic Distortion Measurer
//!
//! Single-shot characterization of a radio front end's nonlinearity: a
//! timed carrier burst is transmitted at a candidate frequency while the
//! receiver listens a known bin offset away, and the spurious odd harmonics
//! (plus their image-frequency mirrors) are read out of the capture's
//! spectrum.
//!
//! ## Measurement cycle
//!
//! ```text
//! tune RX/TX LOs → activate streams → schedule burst at now + margin
//!      → blocking capture → deactivate streams
//!      → locate settled window via timestamps → FFT harmonic levels
//! ```
//!
//! The hardware is reached only through the [`frontend::FrontEnd`]
//! capability trait; [`sim::SimFrontEnd`] stands in for it in tests and
//! offline runs. All the DSP lives in `spurscan-core`.
//!
//! ## Example
//!
//! ```rust
//! use spurscan_sdr::config::MeasurementConfig;
//! use spurscan_sdr::measure::Measurer;
//! use spurscan_sdr::sim::SimFrontEnd;
//! use spurscan_sdr::sweep::{frequency_steps, sweep};
//!
//! let config = MeasurementConfig {
//!     sample_rate_hz: 1_000_000.0,
//!     scheduling_margin_ns: 1_000_000,
//!     rx_buffer_samples: 8192,
//!     ..Default::default()
//! };
//!
//! // Simulated front end that "hears" a full-scale fundamental at the
//! // configured bin offset while the burst is on the air.
//! let tone_hz = config.offset_bins as f64 * config.sample_rate_hz
//!     / config.measurement_samples as f64;
//! let device = SimFrontEnd::new().with_tone(tone_hz, 1.0);
//!
//! let mut measurer = Measurer::new(device, config).unwrap();
//! let points = sweep(&mut measurer, &frequency_steps(2.40e9, 2.45e9, 5));
//!
//! assert_eq!(points.len(), 5);
//! let levels = points[0].result.as_ref().unwrap();
//! assert_eq!(levels.harmonics[0], 1);
//! assert!(levels.levels_db[0].abs() < 0.5);
//! ```

pub mod config;
pub mod frontend;
pub mod measure;
pub mod sim;
pub mod sweep;

pub use config::{ConfigError, GainSetting, MeasurementConfig};
pub use frontend::{Direction, FrontEnd, FrontEndError, ReadStatus, SampleFormat, StreamId};
pub use measure::{MeasureError, Measurer, TxBurst};
pub use sim::SimFrontEnd;
pub use sweep::{frequency_steps, sweep, SweepPoint};

pub use spurscan_core::harmonics::{HarmonicAnalyzer, HarmonicResult};
pub use spurscan_core::window::{MeasurementWindow, WindowError};
