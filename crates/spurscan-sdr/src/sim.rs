//! In-process simulated front end.
//!
//! `SimFrontEnd` implements the full [`FrontEnd`] capability set with a
//! deterministic timing model, so the burst/capture coordinator and the
//! whole analysis pipeline can be exercised without hardware.
//!
//! The RF channel is modeled as a black box: while the scheduled burst is
//! "on the air", the receiver hears a configurable set of baseband tones
//! (e.g. the fundamental at the bin offset plus weaker odd harmonics and
//! image leakage). Outside the burst span the capture is silent.
//!
//! Test knobs:
//! - [`queue_read_limit`](SimFrontEnd::queue_read_limit) truncates upcoming
//!   captures, forcing the window-too-short path.
//! - [`set_capture_delay_ns`](SimFrontEnd::set_capture_delay_ns) delays the
//!   capture start past the burst, forcing the window-too-early path.
//! - [`fail_next_tune`](SimFrontEnd::fail_next_tune) injects a hardware
//!   error on the next `set_frequency` call.

use std::collections::VecDeque;
use std::f64::consts::PI;

use spurscan_core::types::IQSample;
use spurscan_core::window::ns_to_samples;

use crate::frontend::{
    Direction, FrontEnd, FrontEndError, FrontEndResult, ReadStatus, SampleFormat, StreamId,
};

/// A baseband tone the simulated receiver hears during the burst.
#[derive(Debug, Clone, Copy)]
pub struct SimTone {
    /// Frequency in Hz relative to the RX LO (may be negative)
    pub freq_hz: f64,
    /// Linear amplitude (1.0 = full scale = 0 dB)
    pub amplitude: f64,
}

#[derive(Debug, Clone)]
struct SimStream {
    direction: Direction,
    active: bool,
    activated_at_ns: i64,
}

#[derive(Debug, Clone, Copy)]
struct PendingBurst {
    time_ns: i64,
    len: usize,
}

/// Simulated full-duplex front end with a monotonic hardware clock.
#[derive(Debug)]
pub struct SimFrontEnd {
    sample_rate_hz: f64,
    now_ns: i64,
    streams: Vec<SimStream>,
    pending_burst: Option<PendingBurst>,
    tones: Vec<SimTone>,
    read_limits: VecDeque<Option<usize>>,
    capture_delay_ns: i64,
    fail_next_tune: bool,
    rx_frequency_hz: f64,
    tx_frequency_hz: f64,
}

impl SimFrontEnd {
    /// Create a simulator. The sample rate is a fallback; the coordinator
    /// overwrites it through [`FrontEnd::set_sample_rate`].
    pub fn new() -> Self {
        Self {
            sample_rate_hz: 1_000_000.0,
            // Nonzero epoch so nothing can get away with assuming the
            // hardware clock starts at zero.
            now_ns: 1_000_000_000,
            streams: Vec::new(),
            pending_burst: None,
            tones: Vec::new(),
            read_limits: VecDeque::new(),
            capture_delay_ns: 0,
            fail_next_tune: false,
            rx_frequency_hz: 0.0,
            tx_frequency_hz: 0.0,
        }
    }

    /// Add a tone the receiver hears during the burst.
    pub fn with_tone(mut self, freq_hz: f64, amplitude: f64) -> Self {
        self.tones.push(SimTone { freq_hz, amplitude });
        self
    }

    /// Replace the received tone set.
    pub fn set_tones(&mut self, tones: Vec<SimTone>) {
        self.tones = tones;
    }

    /// Cap the next blocking read at `limit` samples (`None` = fill the
    /// whole buffer). Limits queue up, one per read.
    pub fn queue_read_limit(&mut self, limit: Option<usize>) {
        self.read_limits.push_back(limit);
    }

    /// Delay the reported capture-start timestamp relative to stream
    /// activation, emulating a slow-to-start receive chain.
    pub fn set_capture_delay_ns(&mut self, delay_ns: i64) {
        self.capture_delay_ns = delay_ns;
    }

    /// Make the next `set_frequency` call fail with a hardware error.
    pub fn fail_next_tune(&mut self) {
        self.fail_next_tune = true;
    }

    /// Whether a stream is currently active.
    pub fn is_stream_active(&self, stream: StreamId) -> bool {
        self.streams
            .get(stream.0 as usize)
            .map(|s| s.active)
            .unwrap_or(false)
    }

    /// Last tuned RX LO frequency.
    pub fn rx_frequency_hz(&self) -> f64 {
        self.rx_frequency_hz
    }

    /// Last tuned TX LO frequency.
    pub fn tx_frequency_hz(&self) -> f64 {
        self.tx_frequency_hz
    }

    fn stream(&self, stream: StreamId) -> FrontEndResult<&SimStream> {
        self.streams
            .get(stream.0 as usize)
            .ok_or(FrontEndError::UnknownStream(stream))
    }

    fn stream_mut(&mut self, stream: StreamId) -> FrontEndResult<&mut SimStream> {
        self.streams
            .get_mut(stream.0 as usize)
            .ok_or(FrontEndError::UnknownStream(stream))
    }

    /// Sum of the configured tones at sample `k` of the burst.
    fn channel_sample(&self, k: usize) -> IQSample {
        let t = k as f64 / self.sample_rate_hz;
        self.tones
            .iter()
            .map(|tone| {
                let phase = 2.0 * PI * tone.freq_hz * t;
                IQSample::new(tone.amplitude * phase.cos(), tone.amplitude * phase.sin())
            })
            .sum()
    }
}

impl Default for SimFrontEnd {
    fn default() -> Self {
        Self::new()
    }
}

impl FrontEnd for SimFrontEnd {
    fn set_sample_rate(
        &mut self,
        _direction: Direction,
        _channel: usize,
        rate_hz: f64,
    ) -> FrontEndResult<()> {
        self.sample_rate_hz = rate_hz;
        Ok(())
    }

    fn set_antenna(
        &mut self,
        _direction: Direction,
        _channel: usize,
        _name: &str,
    ) -> FrontEndResult<()> {
        Ok(())
    }

    fn set_gain(
        &mut self,
        _direction: Direction,
        _channel: usize,
        _stage: Option<&str>,
        _gain_db: f64,
    ) -> FrontEndResult<()> {
        Ok(())
    }

    fn set_frequency(
        &mut self,
        direction: Direction,
        _channel: usize,
        freq_hz: f64,
    ) -> FrontEndResult<()> {
        if self.fail_next_tune {
            self.fail_next_tune = false;
            return Err(FrontEndError::Hardware("injected tune failure".to_string()));
        }
        match direction {
            Direction::Rx => self.rx_frequency_hz = freq_hz,
            Direction::Tx => self.tx_frequency_hz = freq_hz,
        }
        Ok(())
    }

    fn setup_stream(
        &mut self,
        direction: Direction,
        _format: SampleFormat,
    ) -> FrontEndResult<StreamId> {
        let id = StreamId(self.streams.len() as u32);
        self.streams.push(SimStream {
            direction,
            active: false,
            activated_at_ns: 0,
        });
        Ok(id)
    }

    fn activate_stream(&mut self, stream: StreamId) -> FrontEndResult<()> {
        let now = self.now_ns;
        let s = self.stream_mut(stream)?;
        if s.active {
            return Err(FrontEndError::StreamAlreadyActive(stream));
        }
        s.active = true;
        s.activated_at_ns = now;
        Ok(())
    }

    fn deactivate_stream(&mut self, stream: StreamId) -> FrontEndResult<()> {
        let s = self.stream_mut(stream)?;
        if !s.active {
            return Err(FrontEndError::StreamNotActive(stream));
        }
        s.active = false;
        Ok(())
    }

    fn hardware_time_ns(&self) -> i64 {
        self.now_ns
    }

    fn write_timed_burst(
        &mut self,
        stream: StreamId,
        samples: &[IQSample],
        time_ns: i64,
        _end_of_burst: bool,
    ) -> FrontEndResult<usize> {
        let s = self.stream(stream)?;
        if s.direction != Direction::Tx {
            return Err(FrontEndError::Hardware(
                "timed burst write on a receive stream".to_string(),
            ));
        }
        if !s.active {
            return Err(FrontEndError::StreamNotActive(stream));
        }
        self.pending_burst = Some(PendingBurst {
            time_ns,
            len: samples.len(),
        });
        Ok(samples.len())
    }

    fn read_blocking(
        &mut self,
        stream: StreamId,
        buffer: &mut [IQSample],
    ) -> FrontEndResult<ReadStatus> {
        let s = self.stream(stream)?;
        if s.direction != Direction::Rx {
            return Err(FrontEndError::Hardware(
                "blocking read on a transmit stream".to_string(),
            ));
        }
        if !s.active {
            return Err(FrontEndError::StreamNotActive(stream));
        }

        let capture_start_ns = s.activated_at_ns + self.capture_delay_ns;
        let limit = self.read_limits.pop_front().flatten();
        let filled = limit.map_or(buffer.len(), |l| l.min(buffer.len()));

        buffer[..filled].fill(IQSample::new(0.0, 0.0));

        // Drop the scheduled burst into the capture where its timestamp
        // says it belongs; parts outside the capture are simply lost.
        if let Some(burst) = self.pending_burst.take() {
            let offset = ns_to_samples(burst.time_ns - capture_start_ns, self.sample_rate_hz);
            for k in 0..burst.len {
                let idx = offset + k as i64;
                if idx >= 0 && (idx as usize) < filled {
                    buffer[idx as usize] = self.channel_sample(k);
                }
            }
        }

        // The blocking read suspends until the samples exist in real time.
        self.now_ns = capture_start_ns
            + (filled as f64 / self.sample_rate_hz * 1e9).round() as i64;

        Ok(ReadStatus {
            samples_read: filled,
            start_time_ns: capture_start_ns,
        })
    }
}
