//! Radio front-end capability set.
//!
//! The measurement core drives the hardware through this one trait and never
//! depends on a specific driver. The surface mirrors what vendor-neutral SDR
//! APIs expose: per-direction configuration, stream handles, a monotonic
//! hardware clock, timestamped burst writes and blocking timed reads.
//!
//! Implementations wrap real hardware; [`crate::sim::SimFrontEnd`] provides
//! an in-process model for tests and offline runs.

use spurscan_core::types::IQSample;

/// Stream/configuration direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Receive path
    Rx,
    /// Transmit path
    Tx,
}

/// Sample format for a streaming channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleFormat {
    /// 32-bit float I/Q (our native format)
    #[default]
    ComplexFloat32,
}

/// Opaque handle to a streaming channel, valid for the device that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(pub u32);

/// Outcome of a blocking read: how much of the buffer was filled and the
/// hardware timestamp of the first sample.
#[derive(Debug, Clone, Copy)]
pub struct ReadStatus {
    /// Number of samples written into the buffer
    pub samples_read: usize,
    /// Hardware time of the first sample, in nanoseconds
    pub start_time_ns: i64,
}

/// Result type for front-end operations.
pub type FrontEndResult<T> = Result<T, FrontEndError>;

/// Failure signaled by the hardware front end.
///
/// These are never retried by the measurement core; the sweep caller decides
/// whether to continue with the next frequency.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrontEndError {
    #[error("unsupported sample format: {0:?}")]
    UnsupportedFormat(SampleFormat),

    #[error("unknown stream handle {0:?}")]
    UnknownStream(StreamId),

    #[error("stream {0:?} is not active")]
    StreamNotActive(StreamId),

    #[error("stream {0:?} is already active")]
    StreamAlreadyActive(StreamId),

    #[error("timeout waiting for {0}")]
    Timeout(String),

    #[error("hardware error: {0}")]
    Hardware(String),
}

/// Capability set of a full-duplex radio front end.
///
/// The front end is a single shared mutable resource (tuning, gain and
/// stream-activation state); exactly one owner is expected to mutate it.
pub trait FrontEnd: Send {
    /// Set the ADC/DAC sample rate for one direction.
    fn set_sample_rate(&mut self, direction: Direction, channel: usize, rate_hz: f64)
        -> FrontEndResult<()>;

    /// Select an antenna port by name.
    fn set_antenna(&mut self, direction: Direction, channel: usize, name: &str)
        -> FrontEndResult<()>;

    /// Set a gain value, either for a named amplifier stage or (with
    /// `stage = None`) the combined gain.
    fn set_gain(
        &mut self,
        direction: Direction,
        channel: usize,
        stage: Option<&str>,
        gain_db: f64,
    ) -> FrontEndResult<()>;

    /// Tune the local oscillator for one direction.
    fn set_frequency(&mut self, direction: Direction, channel: usize, freq_hz: f64)
        -> FrontEndResult<()>;

    /// Open a streaming channel. The stream starts inactive.
    fn setup_stream(&mut self, direction: Direction, format: SampleFormat)
        -> FrontEndResult<StreamId>;

    /// Start streaming on a channel.
    fn activate_stream(&mut self, stream: StreamId) -> FrontEndResult<()>;

    /// Stop streaming on a channel. Deactivating an idle stream reports
    /// [`FrontEndError::StreamNotActive`]; implementations must not panic,
    /// as this is also called on failure paths.
    fn deactivate_stream(&mut self, stream: StreamId) -> FrontEndResult<()>;

    /// Read the monotonic hardware clock, in nanoseconds.
    fn hardware_time_ns(&self) -> i64;

    /// Queue samples for transmission at a hardware timestamp.
    ///
    /// `end_of_burst` marks the last write of the burst so the hardware can
    /// flush its pipeline afterwards. Returns the number of samples queued.
    fn write_timed_burst(
        &mut self,
        stream: StreamId,
        samples: &[IQSample],
        time_ns: i64,
        end_of_burst: bool,
    ) -> FrontEndResult<usize>;

    /// Block until the buffer is filled (or the stream runs dry) and report
    /// the hardware timestamp of the first sample.
    fn read_blocking(
        &mut self,
        stream: StreamId,
        buffer: &mut [IQSample],
    ) -> FrontEndResult<ReadStatus>;
}
