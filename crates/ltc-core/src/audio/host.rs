//! The boundary between this crate's producer/consumer core and a real audio host binding.
//!
//! No concrete binding (JACK, PortAudio, CoreAudio, ...) ships in this crate. A real one would
//! live in a sibling crate: it implements [`AudioHost`] against its own native API, and calls
//! into [`HostCallbacks`] (implemented here by [`crate::audio::AudioCore`]) from its native
//! block-size-change notification, audio callback, and MIDI input callback.

/// Methods the core exposes for a host binding to invoke.
///
/// `on_process` is the real-time audio callback: it must never block for longer than is
/// unavoidable to touch the ring buffer, allocate, or log.
pub trait HostCallbacks: Send + Sync {
    /// The host renegotiated its block size; reconfigure internal buffering to match.
    fn on_block_size_changed(&self, new_size: u32);

    /// The host's real-time audio callback. Fills `output` with the next `output.len()`
    /// samples, padding with the last available sample if the ring buffer underruns.
    fn on_process(&self, output: &mut [f32]);

    /// Raw MIDI bytes arrived on an input port the host routed to this core. Quarter-frame
    /// reassembly itself is the caller's responsibility via [`crate::mtc::MtcReassembler`]; this
    /// core has no inbound MIDI state of its own.
    fn on_midi_in(&self, bytes: &[u8]);
}

/// Methods this crate calls on whatever concrete host implements the audio backend.
pub trait AudioHost {
    /// Registers an audio output port, returning an opaque handle the binding understands.
    fn register_output_port(&mut self, name: &str);
    /// Registers a MIDI input port to receive incoming MTC quarter-frames.
    fn register_midi_input_port(&mut self, name: &str);
    /// Connects a previously registered port to a host-side endpoint.
    fn connect(&mut self, source: &str, destination: &str);
    /// Activates the audio client, after which the host may begin calling [`HostCallbacks`].
    fn activate(&mut self);
    /// Deactivates the audio client; no further [`HostCallbacks`] calls should follow.
    fn deactivate(&mut self);
    /// The host's current frame-time counter, in samples since stream start.
    fn current_frame_time(&self) -> u64;
    /// The frame-time counter as of the start of the most recent audio callback.
    fn last_frame_time(&self) -> u64;
}
