//! Validated configuration structures accepted by [`crate::generator`] and [`crate::audio`].

use garde::{Unvalidated, Valid, Validate};
use snafu::prelude::*;

#[cfg(test)]
mod tests;

fn is_positive_sample_rate(value: &u32, _context: &()) -> garde::Result {
    match *value {
        1..=384_000 => Ok(()),
        _ => Err(garde::Error::new("sample rate must be between 1 and 384000 Hz")),
    }
}

fn is_supported_bit_depth(value: &u8, _context: &()) -> garde::Result {
    match *value {
        8 | 16 | 24 | 32 => Ok(()),
        _ => Err(garde::Error::new("bit depth must be one of 8, 16, 24, or 32")),
    }
}

fn is_positive(value: &u32, _context: &()) -> garde::Result {
    match *value {
        0 => Err(garde::Error::new("must be greater than zero")),
        _ => Ok(()),
    }
}

/// Configuration for a [`crate::generator::TimecodeGenerator`] / [`crate::generator::AudioGenerator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Validate)]
pub struct GeneratorConfig {
    /// Start the Frame counter from the wall clock instead of `00:00:00:00`.
    #[garde(skip)]
    pub use_current_time: bool,
    /// Interpret the wall clock as UTC rather than local time. Only meaningful when
    /// `use_current_time` is set.
    #[garde(skip)]
    pub use_utc: bool,
    /// Enable drop-frame counting. Only legal for the 30000/1001 and 60000/1001 frame rates.
    #[garde(skip)]
    pub drop_frame: bool,
    /// Emit normalized IEEE-754 floats in `[-1.0, +1.0]` instead of integer PCM.
    #[garde(skip)]
    pub use_float_samples: bool,
    /// Audio sample rate, in Hz.
    #[garde(custom(is_positive_sample_rate))]
    pub sample_rate: u32,
    /// Integer PCM bit width. Ignored when `use_float_samples` is set.
    #[garde(custom(is_supported_bit_depth))]
    pub bit_depth: u8,
}

pub type ValidGeneratorConfig = Valid<GeneratorConfig>;

impl GeneratorConfig {
    /// Validates this configuration, producing the [`Valid`] wrapper required to build a
    /// generator.
    pub fn validated(self) -> Result<ValidGeneratorConfig, ConfigError> {
        Unvalidated::new(self).validate().context(InvalidGeneratorConfigSnafu)
    }
}

/// Configuration for the [`crate::audio`] ring-buffered producer/consumer core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Validate)]
pub struct AudioCoreConfig {
    /// Host-negotiated initial block size, in samples.
    #[garde(custom(is_positive))]
    pub block_size: u32,
    /// Ring buffer depth, in host blocks.
    #[garde(custom(is_positive))]
    pub queue_length: u32,
}

pub type ValidAudioCoreConfig = Valid<AudioCoreConfig>;

impl AudioCoreConfig {
    /// Validates this configuration, producing the [`Valid`] wrapper required to build an audio
    /// core.
    pub fn validated(self) -> Result<ValidAudioCoreConfig, ConfigError> {
        Unvalidated::new(self).validate().context(InvalidAudioCoreConfigSnafu)
    }
}

/// Error validating a [`GeneratorConfig`] or [`AudioCoreConfig`].
#[derive(Debug, Snafu)]
pub struct ConfigError(InnerConfigError);

#[derive(Debug, Snafu)]
enum InnerConfigError {
    #[snafu(display("invalid generator configuration"))]
    InvalidGeneratorConfig { source: garde::Report },

    #[snafu(display("invalid audio core configuration"))]
    InvalidAudioCoreConfig { source: garde::Report },
}
