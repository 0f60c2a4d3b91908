//! A ring-buffered, real-time-safe producer/consumer core for feeding generated LTC audio to a
//! host audio API (JACK, PortAudio, CoreAudio, or equivalent).
//!
//! [`ring_buffer`] is the lock-free SPSC buffer itself; [`engine`] owns the background producer
//! thread and the state machine that keeps it fed; [`host`] defines the boundary traits a real
//! host binding would implement to plug this core into an actual audio callback.

pub mod engine;
pub mod host;
pub mod ring_buffer;

pub use engine::AudioCore;
pub use host::{AudioHost, HostCallbacks};
pub use ring_buffer::RingBuffer;
