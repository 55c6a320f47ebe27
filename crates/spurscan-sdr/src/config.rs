//! Measurement configuration.
//!
//! A flat, fully resolved parameter set; loading it from files or CLI flags
//! is the caller's concern. Validated once when the measurer is built, not
//! re-validated per measurement.

use serde::{Deserialize, Serialize};

/// One gain setting: a named amplifier stage, or the combined gain when
/// `stage` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GainSetting {
    /// Amplifier stage name (e.g. "LNA", "PAD"), or None for combined gain
    pub stage: Option<String>,
    /// Gain in dB
    pub gain_db: f64,
}

impl GainSetting {
    /// Gain for a named amplifier stage.
    pub fn stage(name: impl Into<String>, gain_db: f64) -> Self {
        Self {
            stage: Some(name.into()),
            gain_db,
        }
    }
}

/// Immutable parameter set for one measurement campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementConfig {
    /// ADC/DAC sample rate in Hz, both directions
    pub sample_rate_hz: f64,
    /// Receive channel index
    pub rx_channel: usize,
    /// Transmit channel index
    pub tx_channel: usize,
    /// Receive antenna port name
    pub rx_antenna: String,
    /// Transmit antenna port name
    pub tx_antenna: String,
    /// Receive gain stages, applied in order
    pub rx_gains: Vec<GainSetting>,
    /// Transmit gain stages, applied in order
    pub tx_gains: Vec<GainSetting>,

    /// Value of the I samples written to TX during the burst
    pub tx_amplitude: f64,
    /// How far into the future the burst is scheduled, in nanoseconds.
    /// Covers the variable latency between the write call and the signal
    /// actually leaving the antenna.
    pub scheduling_margin_ns: i64,

    /// Length of the measurement interval in samples; also the FFT size
    pub measurement_samples: usize,
    /// Extra samples transmitted before the measurement interval, letting
    /// the analog filters settle
    pub settle_before: usize,
    /// Extra samples transmitted after the measurement interval
    pub settle_after: usize,
    /// Receive buffer capacity in samples; must fit the whole burst plus
    /// the scheduling margin
    pub rx_buffer_samples: usize,

    /// How many FFT bins the TX LO is offset from the RX LO
    pub offset_bins: usize,
    /// TX LO frequency as a ratio of the target frequency, so the
    /// transmitted tone's harmonics fall at predictable offsets
    pub tx_freq_ratio: (u32, u32),
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 0.96e6,
            rx_channel: 0,
            tx_channel: 0,
            rx_antenna: "LNAH".to_string(),
            tx_antenna: "BAND2".to_string(),
            rx_gains: vec![
                GainSetting::stage("LNA", 20.0), // 0 to 30
                GainSetting::stage("TIA", 9.0),  // 0 to 12
                GainSetting::stage("PGA", 12.0), // -12 to 19
            ],
            tx_gains: vec![
                GainSetting::stage("PAD", 40.0),  // 0 to 52
                GainSetting::stage("IAMP", 12.0), // -12 to 12
            ],
            tx_amplitude: 1.0,
            scheduling_margin_ns: 15_000_000, // 15 ms of pipeline latency headroom
            measurement_samples: 2048,
            settle_before: 500,
            settle_after: 500,
            rx_buffer_samples: 200_000,
            offset_bins: 20,
            tx_freq_ratio: (3, 5),
        }
    }
}

/// Invalid or inconsistent measurement parameters. Detected once at
/// construction; fatal, never retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("sample rate must be positive, got {0} Hz")]
    InvalidSampleRate(f64),

    #[error("measurement interval must be at least 2 samples, got {0}")]
    MeasurementTooShort(usize),

    #[error("TX/RX offset must be at least 1 bin")]
    ZeroOffset,

    #[error("offset of {offset_bins} bins leaves no odd harmonic below bin {maxbin}")]
    NoUsableHarmonics { offset_bins: usize, maxbin: usize },

    #[error(
        "receive buffer of {actual} samples cannot contain the burst; \
         at least {required} needed for the scheduling margin plus burst length"
    )]
    RxBufferTooSmall { required: usize, actual: usize },

    #[error("TX amplitude must be positive, got {0}")]
    InvalidAmplitude(f64),

    #[error("TX frequency ratio must have nonzero terms, got {0}/{1}")]
    InvalidFreqRatio(u32, u32),
}

impl MeasurementConfig {
    /// Total burst length: settling samples on both sides of the
    /// measurement interval.
    pub fn burst_samples(&self) -> usize {
        self.settle_before + self.measurement_samples + self.settle_after
    }

    /// RX LO offset from the target frequency in Hz. Negative, so the
    /// transmitted tone appears at `+offset_bins` in the receive spectrum.
    pub fn rx_lo_offset_hz(&self) -> f64 {
        -(self.sample_rate_hz * self.offset_bins as f64 / self.measurement_samples as f64)
    }

    /// TX LO frequency for a given target frequency.
    pub fn tx_frequency_hz(&self, target_freq_hz: f64) -> f64 {
        target_freq_hz * self.tx_freq_ratio.0 as f64 / self.tx_freq_ratio.1 as f64
    }

    /// Scheduling margin converted to samples, rounded up.
    pub fn scheduling_margin_samples(&self) -> usize {
        (self.scheduling_margin_ns as f64 * 1e-9 * self.sample_rate_hz).ceil() as usize
    }

    /// Check the parameter set for consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_rate_hz > 0.0) {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate_hz));
        }
        if self.measurement_samples < 2 {
            return Err(ConfigError::MeasurementTooShort(self.measurement_samples));
        }
        if self.offset_bins == 0 {
            return Err(ConfigError::ZeroOffset);
        }

        // Harmonic 1 exists only when offset < maxbin/2 (see analyzer bin
        // selection); an emptier spectrum means every measurement would
        // return nothing.
        let maxbin = self.measurement_samples / 2;
        if maxbin / self.offset_bins < 2 {
            return Err(ConfigError::NoUsableHarmonics {
                offset_bins: self.offset_bins,
                maxbin,
            });
        }

        if !(self.tx_amplitude > 0.0) {
            return Err(ConfigError::InvalidAmplitude(self.tx_amplitude));
        }
        if self.tx_freq_ratio.0 == 0 || self.tx_freq_ratio.1 == 0 {
            return Err(ConfigError::InvalidFreqRatio(
                self.tx_freq_ratio.0,
                self.tx_freq_ratio.1,
            ));
        }

        // The capture starts roughly when the streams activate, so it must
        // hold the scheduling margin plus the whole burst or every
        // measurement ends in WindowTooShort.
        let required = self.scheduling_margin_samples() + self.burst_samples();
        if self.rx_buffer_samples < required {
            return Err(ConfigError::RxBufferTooSmall {
                required,
                actual: self.rx_buffer_samples,
            });
        }

        Ok(())
    }
}
