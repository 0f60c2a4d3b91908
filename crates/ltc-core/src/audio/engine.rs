//! The real-time ring-buffered producer/consumer core.
//!
//! A background producer thread keeps [`AudioCore`]'s ring buffer filled by repeatedly calling
//! [`AudioGenerator::generate_frame`]; [`AudioCore`] itself implements [`HostCallbacks`] so a
//! real host binding's audio thread can drain the buffer directly, without ever taking a lock
//! shared with the producer.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::Utc;

use crate::audio::host::HostCallbacks;
use crate::audio::ring_buffer::RingBuffer;
use crate::biphase::sampler::PcmSamples;
use crate::config::{GeneratorConfig, ValidAudioCoreConfig};
use crate::framerate::FrameFormat;
use crate::generator::AudioGenerator;

#[cfg(test)]
mod tests;

/// How long the producer's steady-state wait blocks before re-checking its flags, bounding the
/// worst-case latency of a missed wakeup notification.
const NEED_DATA_TIMEOUT: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CoreState {
    Idle,
    Filling,
    BlockSizeChanging,
    Stopped,
}

/// State shared between the producer thread and [`AudioCore::on_block_size_changed`]. Never
/// touched by [`AudioCore::on_process`] — the audio callback reads and writes only plain atomics
/// plus a brief, effectively uncontended lock on the ring buffer's current identity.
struct Control {
    state: CoreState,
    block_size: u32,
    queue_length: u32,
    buffer_time_offset_secs: f64,
}

/// The ring-buffered producer/consumer core.
///
/// Owns an [`AudioGenerator`] on a background producer thread and a [`RingBuffer`] the real-time
/// audio callback drains. Implements [`HostCallbacks`] so a host binding can drive it directly.
pub struct AudioCore {
    control: Arc<(Mutex<Control>, Condvar)>,
    ring: Arc<Mutex<Arc<RingBuffer<f32>>>>,
    running: Arc<AtomicBool>,
    ready: Arc<AtomicBool>,
    need_data: Arc<AtomicBool>,
    process_timestamp_millis: Arc<AtomicU64>,
    sample_rate: u32,
    frame_format: FrameFormat,
    producer_thread: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for AudioCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioCore")
            .field("sample_rate", &self.sample_rate)
            .field("frame_format", &self.frame_format)
            .field("running", &self.is_running())
            .field("queued_samples", &self.queued_samples())
            .finish()
    }
}

impl AudioCore {
    /// Builds a core for `frame_format` at `sample_rate`, sized per `config` to hold
    /// `config.queue_length` host blocks of `config.block_size` samples each. Call
    /// [`AudioCore::start`] to begin producing.
    pub fn new(frame_format: FrameFormat, sample_rate: u32, config: ValidAudioCoreConfig) -> Self {
        let block_size = config.block_size;
        let queue_length = config.queue_length;
        let capacity = (block_size as usize) * (queue_length as usize);
        let buffer_time_offset_secs = block_size as f64 * queue_length as f64 / sample_rate as f64;
        AudioCore {
            control: Arc::new((
                Mutex::new(Control { state: CoreState::Stopped, block_size, queue_length, buffer_time_offset_secs }),
                Condvar::new(),
            )),
            ring: Arc::new(Mutex::new(Arc::new(RingBuffer::new(capacity)))),
            running: Arc::new(AtomicBool::new(false)),
            ready: Arc::new(AtomicBool::new(false)),
            need_data: Arc::new(AtomicBool::new(false)),
            process_timestamp_millis: Arc::new(AtomicU64::new(0)),
            sample_rate,
            frame_format,
            producer_thread: Mutex::new(None),
        }
    }

    /// Starts the background producer thread. A no-op if already running.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        self.ready.store(false, Ordering::Release);
        {
            let (lock, _cv) = &*self.control;
            lock.lock().expect("audio core control mutex poisoned").state = CoreState::Filling;
        }

        let control = Arc::clone(&self.control);
        let ring = Arc::clone(&self.ring);
        let running = Arc::clone(&self.running);
        let ready = Arc::clone(&self.ready);
        let need_data = Arc::clone(&self.need_data);
        let sample_rate = self.sample_rate;
        let frame_format = self.frame_format.clone();

        let handle =
            std::thread::spawn(move || run_producer(control, ring, running, ready, need_data, sample_rate, frame_format));
        *self.producer_thread.lock().expect("producer thread handle mutex poisoned") = Some(handle);
        log::debug!("audio core producer thread started");
    }

    /// Stops the background producer thread and waits for it to exit. A no-op if not running.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        {
            let (_lock, cv) = &*self.control;
            cv.notify_all();
        }
        if let Some(handle) = self.producer_thread.lock().expect("producer thread handle mutex poisoned").take() {
            let _ = handle.join();
        }
        log::debug!("audio core stopped");
    }

    /// Whether the producer thread is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Samples currently queued for the consumer to read.
    pub fn queued_samples(&self) -> usize {
        self.ring.lock().expect("ring buffer slot mutex poisoned").read_space()
    }

    /// The millisecond UTC timestamp recorded by the most recent [`AudioCore::on_process`] call,
    /// or `0` before the first call.
    pub fn last_process_timestamp_millis(&self) -> u64 {
        self.process_timestamp_millis.load(Ordering::Acquire)
    }
}

impl HostCallbacks for AudioCore {
    fn on_block_size_changed(&self, new_size: u32) {
        let (lock, cv) = &*self.control;
        let mut ctl = lock.lock().expect("audio core control mutex poisoned");
        if ctl.block_size == new_size {
            return;
        }
        ctl.block_size = new_size;
        ctl.buffer_time_offset_secs = new_size as f64 * ctl.queue_length as f64 / self.sample_rate as f64;
        ctl.state = CoreState::BlockSizeChanging;

        let capacity = new_size as usize * ctl.queue_length as usize;
        *self.ring.lock().expect("ring buffer slot mutex poisoned") = Arc::new(RingBuffer::new(capacity));

        cv.notify_all();
        let _ctl = cv.wait_while(ctl, |c| c.state == CoreState::BlockSizeChanging).expect("audio core control mutex poisoned");
        log::debug!("audio core block size changed to {new_size}");
    }

    fn on_process(&self, output: &mut [f32]) {
        // Only ever notified by the condvar here, never locked: the callback must not contend
        // with the producer thread's own use of `self.control`.
        if !self.ready.swap(true, Ordering::AcqRel) {
            let (_lock, cv) = &*self.control;
            cv.notify_all();
        }

        let ring = Arc::clone(&self.ring.lock().expect("ring buffer slot mutex poisoned"));
        let read = ring.read(output);
        if read < output.len() {
            let fill_value = if read > 0 { output[read - 1] } else { 0.0 };
            for sample in &mut output[read..] {
                *sample = fill_value;
            }
        }

        let now_millis = Utc::now().timestamp_millis().max(0) as u64;
        self.process_timestamp_millis.store(now_millis, Ordering::Release);
        self.need_data.store(true, Ordering::Release);
    }

    fn on_midi_in(&self, _bytes: &[u8]) {
        // Quarter-frame reassembly belongs to crate::mtc::MtcReassembler, owned by whoever wires
        // the host's MIDI input port to this core; this core has no inbound MIDI state itself.
    }
}

fn run_producer(
    control: Arc<(Mutex<Control>, Condvar)>,
    ring: Arc<Mutex<Arc<RingBuffer<f32>>>>,
    running: Arc<AtomicBool>,
    ready: Arc<AtomicBool>,
    need_data: Arc<AtomicBool>,
    sample_rate: u32,
    frame_format: FrameFormat,
) {
    let (lock, cv) = &*control;

    // Start-up handshake: wait for the host's first on_process call before synchronizing and
    // filling, so the initial timecode lands close to when playback actually begins.
    {
        let mut ctl = lock.lock().expect("audio core control mutex poisoned");
        while running.load(Ordering::Acquire) && !ready.load(Ordering::Acquire) {
            let (guard, _timeout) = cv.wait_timeout(ctl, NEED_DATA_TIMEOUT).expect("audio core control mutex poisoned");
            ctl = guard;
        }
        if !running.load(Ordering::Acquire) {
            ctl.state = CoreState::Stopped;
            cv.notify_all();
            return;
        }
    }

    let rate = frame_format.rate.clone();
    let generator_config = GeneratorConfig {
        use_current_time: false,
        use_utc: false,
        drop_frame: frame_format.drop_frame,
        use_float_samples: true,
        sample_rate,
        bit_depth: 16,
    }
    .validated()
    .expect("audio core's internal generator config is always within range");
    let mut generator = AudioGenerator::new(rate, generator_config)
        .expect("audio core's internal generator always has a valid frame format");
    let offset_secs = lock.lock().expect("audio core control mutex poisoned").buffer_time_offset_secs;
    let target_time = Utc::now() + chrono::Duration::milliseconds((offset_secs * 1000.0).round() as i64);
    if let Err(err) = generator.timecode().set_frame_from_datetime(&target_time) {
        log::warn!("audio core start-up synchronization failed: {err}");
    }

    let mut data_waiting: Option<PcmSamples> = None;

    loop {
        {
            let mut ctl = lock.lock().expect("audio core control mutex poisoned");
            while running.load(Ordering::Acquire)
                && !need_data.load(Ordering::Acquire)
                && ctl.state != CoreState::BlockSizeChanging
            {
                let (guard, _timeout) = cv.wait_timeout(ctl, NEED_DATA_TIMEOUT).expect("audio core control mutex poisoned");
                ctl = guard;
            }
            if !running.load(Ordering::Acquire) {
                ctl.state = CoreState::Stopped;
                cv.notify_all();
                return;
            }
            if ctl.state == CoreState::BlockSizeChanging {
                data_waiting = None;
                ctl.state = CoreState::Idle;
                cv.notify_all();
                continue;
            }
            need_data.store(false, Ordering::Release);
            ctl.state = CoreState::Filling;
        }

        let current_ring = Arc::clone(&ring.lock().expect("ring buffer slot mutex poisoned"));
        fill_ring(&current_ring, &mut generator, &mut data_waiting);

        let mut ctl = lock.lock().expect("audio core control mutex poisoned");
        if ctl.state == CoreState::Filling {
            ctl.state = CoreState::Idle;
        }
        cv.notify_all();
    }
}

/// Keeps generating and writing frames into `ring` until the next one wouldn't fit, stashing
/// that over-sized frame in `data_waiting` so the next pass picks up where this one left off.
fn fill_ring(ring: &RingBuffer<f32>, generator: &mut AudioGenerator, data_waiting: &mut Option<PcmSamples>) {
    loop {
        let samples = data_waiting.take().unwrap_or_else(|| generator.generate_frame());
        let PcmSamples::Float(values) = &samples else {
            unreachable!("audio core always configures its generator for float samples")
        };
        if values.len() > ring.write_space() {
            *data_waiting = Some(samples);
            break;
        }
        ring.write(values);
    }
}
