//! Advances a [`Frame`] over time and renders PCM audio from it.
//!
//! [`TimecodeGenerator`] owns the counter itself, in either free-run (wall-clock-driven) or
//! manual mode. [`AudioGenerator`] wraps one and renders PCM audio for it, tracking the
//! fractional-sample drift that accumulates when `sample_rate / frame_rate` isn't an integer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{Local, Timelike, Utc};
use snafu::prelude::*;

use crate::biphase::sampler::{generate_samples, PcmSamples, SampleFormat};
use crate::config::ValidGeneratorConfig;
use crate::datablock::LtcDataBlock;
use crate::frame::{Frame, FrameError};
use crate::framerate::{FrameFormat, FrameRate, FrameRateError};


/// Advances a [`Frame`] over time, either driven by the wall clock on a background timer thread
/// (free-run) or by explicit calls to [`TimecodeGenerator::incr_frame`] (manual).
pub struct TimecodeGenerator {
    frame: Arc<Mutex<Frame>>,
    free_run: Option<FreeRunHandle>,
}

impl std::fmt::Debug for TimecodeGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimecodeGenerator")
            .field("frame", &self.frame())
            .field("free_running", &self.is_free_running())
            .finish()
    }
}

struct FreeRunHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl TimecodeGenerator {
    /// Creates a manual-mode generator, starting from `00:00:00:00`.
    pub fn new(frame_format: FrameFormat) -> Self {
        TimecodeGenerator { frame: Arc::new(Mutex::new(Frame::new(frame_format))), free_run: None }
    }

    /// A snapshot of the current timecode.
    pub fn frame(&self) -> Frame {
        self.frame.lock().expect("timecode generator mutex poisoned").clone()
    }

    /// The current timecode encoded as an [`LtcDataBlock`].
    pub fn get_data_block_array(&self) -> LtcDataBlock {
        LtcDataBlock::encode(&self.frame())
    }

    /// Advances the counter by one frame. Valid in both manual and free-run mode, though in
    /// free-run mode the timer thread normally does this on its own.
    pub fn incr_frame(&self) {
        self.frame.lock().expect("timecode generator mutex poisoned").incr();
    }

    /// Replaces the counter with the frame closest to `dt`, keeping the same [`FrameFormat`].
    pub fn set_frame_from_datetime<T: Timelike>(&self, dt: &T) -> Result<(), FrameError> {
        let format = self.frame().frame_format().clone();
        let replacement = Frame::from_datetime(format, dt)?;
        *self.frame.lock().expect("timecode generator mutex poisoned") = replacement;
        Ok(())
    }

    /// Starts a background timer thread that wakes every `1/rate` seconds and re-synchronizes
    /// the counter to the wall clock. Does nothing if free-run is already active.
    pub fn start_free_run(&mut self, use_utc: bool) {
        if self.free_run.is_some() {
            return;
        }
        let stop = Arc::new(AtomicBool::new(false));
        let period = Duration::from_secs_f64(1.0 / self.frame().frame_format().rate.float_value());
        let frame = Arc::clone(&self.frame);
        let thread_stop = Arc::clone(&stop);

        log::debug!("timecode generator free-run thread starting, period={period:?}");
        let thread = std::thread::spawn(move || {
            while !thread_stop.load(Ordering::Acquire) {
                std::thread::sleep(period);
                if thread_stop.load(Ordering::Acquire) {
                    break;
                }
                let format = frame.lock().expect("timecode generator mutex poisoned").frame_format().clone();
                let result = if use_utc {
                    Frame::from_datetime(format, &Utc::now())
                } else {
                    Frame::from_datetime(format, &Local::now())
                };
                match result {
                    Ok(replacement) => {
                        *frame.lock().expect("timecode generator mutex poisoned") = replacement;
                    }
                    Err(err) => log::warn!("free-run timecode resync failed: {err}"),
                }
            }
            log::debug!("timecode generator free-run thread stopped");
        });

        self.free_run = Some(FreeRunHandle { stop, thread: Some(thread) });
    }

    /// Stops the free-run timer thread started by [`TimecodeGenerator::start_free_run`]. A no-op
    /// in manual mode.
    pub fn stop_free_run(&mut self) {
        if let Some(mut handle) = self.free_run.take() {
            handle.stop.store(true, Ordering::Release);
            if let Some(thread) = handle.thread.take() {
                let _ = thread.join();
            }
        }
    }

    /// Whether the free-run timer thread is currently active.
    pub fn is_free_running(&self) -> bool {
        self.free_run.is_some()
    }
}

impl Drop for TimecodeGenerator {
    fn drop(&mut self) {
        self.stop_free_run();
    }
}

/// Renders PCM audio for a [`TimecodeGenerator`], tracking fractional-sample drift so
/// cumulative error never exceeds one sample at any frame boundary.
#[derive(Debug)]
pub struct AudioGenerator {
    timecode: TimecodeGenerator,
    sample_rate: u32,
    format: SampleFormat,
    frames_emitted: u64,
    samples_emitted: u64,
}

impl AudioGenerator {
    /// Builds an audio generator for `rate` from a validated [`ValidGeneratorConfig`], matching
    /// the original tool's `AudioGenerator.__init__`: drop-frame counting, sample rate, and PCM
    /// representation all come from `config`, and if `config.use_current_time` is set the
    /// counter is synchronized to the wall clock immediately (UTC or local, per
    /// `config.use_utc`) rather than starting at `00:00:00:00`.
    pub fn new(rate: FrameRate, config: ValidGeneratorConfig) -> Result<Self, GeneratorError> {
        let frame_format =
            FrameFormat::new(rate, config.drop_frame).context(InvalidFrameFormatSnafu)?;
        let timecode = TimecodeGenerator::new(frame_format);
        if config.use_current_time {
            let synced = if config.use_utc {
                timecode.set_frame_from_datetime(&Utc::now())
            } else {
                timecode.set_frame_from_datetime(&Local::now())
            };
            synced.context(InitialSyncSnafu)?;
        }
        let format = if config.use_float_samples {
            SampleFormat::Float
        } else {
            SampleFormat::Integer { bit_depth: config.bit_depth }
        };
        Ok(AudioGenerator {
            timecode,
            sample_rate: config.sample_rate,
            format,
            frames_emitted: 0,
            samples_emitted: 0,
        })
    }

    /// The underlying timecode generator, for inspection or manual advancement.
    pub fn timecode(&self) -> &TimecodeGenerator {
        &self.timecode
    }

    /// The nominal (non-integral) number of samples one frame occupies at this sample rate.
    pub fn samples_per_frame(&self) -> f64 {
        self.sample_rate as f64 / self.timecode.frame().frame_format().rate.float_value()
    }

    /// Renders one frame's audio, advances the counter, and applies fractional-drift
    /// compensation against the running `(frames_emitted, samples_emitted)` totals.
    pub fn generate_frame(&mut self) -> PcmSamples {
        let block = self.timecode.get_data_block_array();
        let nominal = self.samples_per_frame().round() as usize;
        let mut samples = generate_samples(&block, nominal, self.format);

        self.frames_emitted += 1;
        let expected = self.samples_per_frame() * self.frames_emitted as f64;
        let tentative_total = self.samples_emitted as f64 + samples.len() as f64;
        let delta = (expected - tentative_total).round() as i64;
        samples.adjust_length(delta);

        self.samples_emitted += samples.len() as u64;
        self.timecode.incr_frame();
        samples
    }

    /// Renders `n` consecutive frames' worth of audio. Output sample count is `round(n *
    /// sample_rate / frame_rate) ± 1`, with cumulative drift bounded by one sample at any
    /// frame boundary.
    pub fn generate_frames(&mut self, n: usize) -> PcmSamples {
        let mut combined = PcmSamples::empty(self.format);
        for _ in 0..n {
            combined.extend(self.generate_frame());
        }
        combined
    }
}

/// Error constructing an [`AudioGenerator`] from a [`ValidGeneratorConfig`].
#[derive(Debug, Snafu)]
pub struct GeneratorError(InnerGeneratorError);

#[derive(Debug, Snafu)]
enum InnerGeneratorError {
    #[snafu(display("invalid frame format"))]
    InvalidFrameFormat { source: FrameRateError },

    #[snafu(display("initial wall-clock synchronization failed"))]
    InitialSync { source: FrameError },
}
