//! Converts an [`LtcDataBlock`] into PCM samples at a target sample count.
//!
//! - SMPTE 12M (entire standard) - Time and Control Code, Section 7 (biphase-mark modulation)

use crate::datablock::LtcDataBlock;


/// How many intermediate samples to hold each of the 160 biphase half-bit slots for, before
/// resampling down to the target sample count. Higher values give the linear-interpolation
/// resample stage a smoother input waveform to work from.
const OVERSAMPLE: usize = 10;

/// The PCM sample representation chosen once at generator construction and fixed for its
/// lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// Normalized floating point in `[-1.0, +1.0]`.
    Float,
    /// Signed integer PCM at the given bit depth (8, 16, 24, or 32).
    Integer { bit_depth: u8 },
}

/// One data block's worth of generated PCM audio, in whichever representation the caller asked
/// for.
#[derive(Debug, Clone, PartialEq)]
pub enum PcmSamples {
    Float(Vec<f32>),
    Integer(Vec<i32>),
}

impl PcmSamples {
    pub fn len(&self) -> usize {
        match self {
            PcmSamples::Float(v) => v.len(),
            PcmSamples::Integer(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// An empty buffer in the given format, ready for [`PcmSamples::extend`].
    pub(crate) fn empty(format: SampleFormat) -> Self {
        match format {
            SampleFormat::Float => PcmSamples::Float(Vec::new()),
            SampleFormat::Integer { .. } => PcmSamples::Integer(Vec::new()),
        }
    }

    /// Appends another batch of samples of the same representation.
    ///
    /// Panics if `other` is a different [`SampleFormat`] variant than `self`; callers only ever
    /// combine samples produced from a single generator, which always uses one format.
    pub(crate) fn extend(&mut self, other: PcmSamples) {
        match (self, other) {
            (PcmSamples::Float(a), PcmSamples::Float(b)) => a.extend(b),
            (PcmSamples::Integer(a), PcmSamples::Integer(b)) => a.extend(b),
            _ => panic!("cannot combine PCM samples of different formats"),
        }
    }

    /// Appends `count` copies of the last sample, or trims the last `count` samples if negative.
    /// Used by the generator's fractional-drift compensation.
    pub(crate) fn adjust_length(&mut self, delta: i64) {
        match self {
            PcmSamples::Float(v) => adjust_vec(v, delta),
            PcmSamples::Integer(v) => adjust_vec(v, delta),
        }
    }
}

fn adjust_vec<T: Copy>(v: &mut Vec<T>, delta: i64) {
    if delta > 0 {
        if let Some(&last) = v.last() {
            v.extend(std::iter::repeat(last).take(delta as usize));
        }
    } else if delta < 0 {
        let new_len = v.len().saturating_sub((-delta) as usize);
        v.truncate(new_len);
    }
}

/// Stage 1: expands the 80-bit block into a `160 * OVERSAMPLE`-sample toggle signal.
///
/// Starting from `y = -1`, for each of the 80 bits: emit `y` for one sub-sample (held for
/// `OVERSAMPLE` samples); if the bit is `1`, toggle `y`; emit the new `y` for the next sub-sample
/// (held for `OVERSAMPLE` samples); always toggle `y` at the end of the bit. This produces a
/// transition at every bit boundary, plus an extra mid-bit transition for logical `1` and none
/// for logical `0` -- biphase-mark encoding.
fn block_to_toggle_signal(bits: &[bool; 80]) -> Vec<f64> {
    let mut samples = Vec::with_capacity(160 * OVERSAMPLE);
    let mut y: f64 = -1.0;
    for &bit in bits {
        samples.extend(std::iter::repeat(y).take(OVERSAMPLE));
        if bit {
            y = -y;
        }
        samples.extend(std::iter::repeat(y).take(OVERSAMPLE));
        y = -y;
    }
    samples
}

/// Stage 2: resamples the intermediate toggle signal down to `num_samples`, via linear
/// interpolation over the unit interval `[0, 1)`.
fn resample_linear(toggle_signal: &[f64], num_samples: usize) -> Vec<f64> {
    let n = toggle_signal.len();
    let mut out = Vec::with_capacity(num_samples);
    for i in 0..num_samples {
        let t = i as f64 / num_samples as f64;
        let pos = t * n as f64;
        let idx = pos.floor() as usize;
        let frac = pos - idx as f64;
        let a = toggle_signal[idx.min(n - 1)];
        let b = toggle_signal[(idx + 1).min(n - 1)];
        out.push(a + (b - a) * frac);
    }
    out
}

/// Renders one [`LtcDataBlock`] as `num_samples` PCM samples in the requested [`SampleFormat`].
///
/// `num_samples` is ordinarily `round(sample_rate / frame_rate)`; callers needing fractional
/// drift compensation across many frames should adjust the returned [`PcmSamples`] with
/// [`PcmSamples::adjust_length`] rather than passing a non-integral count here.
pub fn generate_samples(block: &LtcDataBlock, num_samples: usize, format: SampleFormat) -> PcmSamples {
    let toggle = block_to_toggle_signal(&block.get_array());
    let resampled = resample_linear(&toggle, num_samples);
    match format {
        SampleFormat::Float => {
            PcmSamples::Float(resampled.iter().map(|&s| s as f32).collect())
        }
        SampleFormat::Integer { bit_depth } => {
            let scale = (((1i64 << bit_depth) / 2 - 1) / 2) as f64;
            PcmSamples::Integer(resampled.iter().map(|&s| (s * scale).round() as i32).collect())
        }
    }
}
