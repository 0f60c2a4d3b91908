//! This crate generates and decodes [SMPTE Linear Timecode (LTC)](https://en.wikipedia.org/wiki/Linear_timecode)
//! as audio, and decodes [MIDI Timecode (MTC)](https://en.wikipedia.org/wiki/MIDI_timecode)
//! quarter-frame messages.
//!
//! LTC is a biphase-mark-encoded audio signal carrying a video-style timecode (hours, minutes,
//! seconds, frames) at industry-standard frame rates, used to synchronize audio/video equipment.
//!
//! The crate is organized as:
//!
//! - [`framerate`]: rational frame rates and drop-frame/non-drop-frame formats.
//! - [`frame`]: the `HH:MM:SS:FF` timecode counter, including drop-frame arithmetic.
//! - [`datablock`]: the 80-bit LTC data block layout, independent of audio.
//! - [`biphase`]: biphase-mark-code modulation (generation) and demodulation (decoding) against
//!   a PCM sample stream.
//! - [`generator`]: advances a [`frame::Frame`] over time and renders PCM audio from it.
//! - [`audio`]: the real-time ring-buffered producer/consumer core that feeds an audio callback.
//! - [`mtc`]: reassembly of MIDI Timecode quarter-frame messages into a timecode snapshot.
//! - [`config`]: validated configuration structures accepted by [`generator`] and [`audio`].
//!
//! Audio host bindings (PortAudio/JACK/CoreAudio equivalents), wavefile I/O, a CLI, and any
//! `ffprobe`-based timecode extraction are explicitly out of scope for this crate: it consumes a
//! `sample_rate`, a `block_size`, and a `process(n_samples)` callback from a host, and exposes a
//! pull interface back to it. See [`audio::host`] for the boundary trait.

pub mod audio;
pub mod biphase;
pub mod config;
pub mod datablock;
pub mod frame;
pub mod framerate;
pub mod generator;
pub mod mtc;
mod util;
