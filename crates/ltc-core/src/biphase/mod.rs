//! Biphase-mark-code (BMC) modulation and demodulation against a PCM sample stream.
//!
//! [`sampler`] turns an [`crate::datablock::LtcDataBlock`] into PCM samples; [`decoder`] runs the
//! reverse process, recovering data blocks from a stream of incoming samples.

pub mod decoder;
pub mod sampler;

pub use decoder::BiphaseDecoder;
pub use sampler::{generate_samples, PcmSamples, SampleFormat};
