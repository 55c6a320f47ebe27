//! # Harmonic Distortion DSP Core
//!
//! This crate provides the signal-processing half of a transceiver
//! nonlinearity test bench: given a baseband capture taken while a known
//! carrier burst was on the air, it locates the settled measurement interval
//! inside the capture and extracts the levels of the spurious odd harmonics
//! (and their image-frequency mirrors) from its spectrum.
//!
//! ## Measurement principle
//!
//! The transmitter sends a constant tone while the receiver LO sits a known
//! number of FFT bins away. Each odd harmonic of the transmit LO then lands
//! on its own, predictable bin of the receive spectrum:
//!
//! ```text
//!   bin:   -5o  -3o  -o   0   +o  +3o  +5o        (o = offset in bins)
//!           │    █    │   │   █    │    █
//!           │    │    │   │   │    │    │
//!         image  h3 image  DC  h1 image  h5
//! ```
//!
//! A quadrature mixer driven by a square-wave LO responds only to *odd*
//! harmonics, and its image response flips orientation every second odd
//! harmonic, so the true bins alternate sign: `+o, -3o, +5o, -7o, ...`
//!
//! ## Example
//!
//! ```rust
//! use spurscan_core::harmonics::analyze;
//! use spurscan_core::types::IQSample;
//! use std::f64::consts::PI;
//!
//! // Full-scale complex tone, exactly 20 cycles over the window:
//! // this is what harmonic 1 of a clean front end looks like.
//! let n = 2048;
//! let samples: Vec<IQSample> = (0..n)
//!     .map(|i| {
//!         let phase = 2.0 * PI * 20.0 * i as f64 / n as f64;
//!         IQSample::new(phase.cos(), phase.sin())
//!     })
//!     .collect();
//!
//! let result = analyze(&samples, 20);
//! assert_eq!(result.harmonics[0], 1);
//! assert!(result.levels_db[0].abs() < 0.5, "full-scale tone should read ~0 dB");
//! ```
//!
//! This crate has no hardware dependency; the companion `spurscan-sdr` crate
//! drives a front end and feeds captures into it.

pub mod fft;
pub mod harmonics;
pub mod types;
pub mod window;

pub use harmonics::{analyze, HarmonicAnalyzer, HarmonicResult};
pub use types::{IQBuffer, IQSample};
pub use window::{extract_window, MeasurementWindow, WindowError};
