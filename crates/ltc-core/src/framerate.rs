//! Rational frame rates and drop-frame/non-drop-frame timecode formats.
//!
//! - SMPTE 12M (entire standard) - Time and Control Code
//! - SMPTE ST 12-1:2014 Section 5 - Drop-frame compensation

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use num::rational::Rational64;
use num::ToPrimitive;
use serde::{de, Deserialize, Serialize};
use snafu::prelude::*;

#[cfg(test)]
mod tests;

/// The set of frame numbers dropped at the start of every non-tenth minute, for a drop-frame
/// [`FrameRate`].
///
/// - 30000/1001 (29.97): `{0, 1}`
/// - 60000/1001 (59.94): `{0, 1, 2, 3}`
pub(crate) fn drop_frame_numbers(rounded: i64) -> &'static [u8] {
    match rounded {
        30 => &[0, 1],
        60 => &[0, 1, 2, 3],
        _ => &[],
    }
}

/// Returns whether `rate` may legally be combined with drop-frame counting.
fn supports_drop_frame(rate: &FrameRate) -> bool {
    let r = rate.rational();
    r == Rational64::new(30_000, 1_001) || r == Rational64::new(60_000, 1_001)
}

#[derive(Debug)]
struct FrameRateInner {
    rational: Rational64,
}

/// A frame rate, expressed as an exact rational number of frames per second.
///
/// `FrameRate` values are interned: two `FrameRate`s constructed from the same `(numerator,
/// denominator)` pair (after reduction) are the same logical object, so equality and hashing are
/// cheap pointer comparisons. This is a process-wide registry with the lifetime of the program,
/// similar in spirit to how [`crate::frame`]'s counters are owned by a single parent rather than
/// forming a reference cycle.
#[derive(Debug, Clone)]
pub struct FrameRate(Arc<FrameRateInner>);

fn registry() -> &'static Mutex<HashMap<Rational64, Arc<FrameRateInner>>> {
    static REGISTRY: OnceLock<Mutex<HashMap<Rational64, Arc<FrameRateInner>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Default frame rates recognized by [`FrameRate::from_float`], keyed by their approximate
/// decimal value.
const DEFAULTS: &[(f64, i64, i64)] = &[
    (24.0, 24, 1),
    (25.0, 25, 1),
    (29.97, 30_000, 1_001),
    (30.0, 30, 1),
    (59.94, 60_000, 1_001),
    (60.0, 60, 1),
];

impl FrameRate {
    /// Constructs (or looks up) a `FrameRate` from an exact `numerator/denominator` pair.
    ///
    /// The pair is reduced before interning, so `FrameRate::new(60, 2)` and `FrameRate::new(30,
    /// 1)` return the same interned value.
    pub fn new(numerator: i64, denominator: i64) -> Result<Self, FrameRateError> {
        ensure!(
            numerator > 0 && denominator > 0,
            OutOfRangeSnafu { reason: "frame rate numerator and denominator must be positive" }
        );
        let rational = Rational64::new(numerator, denominator);
        let mut registry = registry().lock().expect("frame rate registry poisoned");
        let inner =
            registry.entry(rational).or_insert_with(|| Arc::new(FrameRateInner { rational }));
        Ok(FrameRate(Arc::clone(inner)))
    }

    /// Looks up one of the well-known frame rates by its approximate decimal value (within
    /// `1e-6`), e.g. `24.0`, `29.97`, `59.94`.
    pub fn from_float(value: f64) -> Result<Self, FrameRateError> {
        let entry = DEFAULTS
            .iter()
            .find(|(v, _, _)| (v - value).abs() < 1e-6)
            .context(UnsupportedSnafu { value })?;
        Self::new(entry.1, entry.2)
    }

    /// The exact rational value of this frame rate, in frames per second.
    pub fn rational(&self) -> Rational64 {
        self.0.rational
    }

    /// The frame rate as a floating point approximation, in frames per second.
    pub fn float_value(&self) -> f64 {
        self.0.rational.to_f64().expect("frame rate rational is always representable as f64")
    }

    /// The frame rate rounded to the nearest integer: the frame rate's timebase.
    ///
    /// For rates with a denominator of 1 this is exactly the numerator. For NTSC rates such as
    /// 30000/1001 this rounds to 30.
    pub fn rounded(&self) -> i64 {
        if *self.0.rational.denom() == 1 {
            return *self.0.rational.numer();
        }
        self.0.rational.round().to_integer()
    }
}

impl PartialEq for FrameRate {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for FrameRate {}

impl std::hash::Hash for FrameRate {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl PartialOrd for FrameRate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrameRate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.rational.cmp(&other.0.rational)
    }
}

impl std::fmt::Display for FrameRate {
    /// Matches the original tool's display convention: an exact integer rate is printed bare
    /// (`24`), otherwise the floating-point approximation is printed to two decimal places
    /// (`29.97`).
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if *self.0.rational.denom() == 1 {
            write!(f, "{}", self.0.rational.numer())
        } else {
            write!(f, "{:05.2}", self.float_value())
        }
    }
}

impl Serialize for FrameRate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("FrameRate", 2)?;
        s.serialize_field("numerator", self.0.rational.numer())?;
        s.serialize_field("denominator", self.0.rational.denom())?;
        s.end()
    }
}

impl<'de> Deserialize<'de> for FrameRate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            numerator: i64,
            denominator: i64,
        }
        let raw = Raw::deserialize(deserializer)?;
        FrameRate::new(raw.numerator, raw.denominator).map_err(de::Error::custom)
    }
}

/// Error constructing or looking up a [`FrameRate`].
#[derive(Debug, Snafu)]
pub struct FrameRateError(InnerFrameRateError);

#[derive(Debug, Snafu)]
enum InnerFrameRateError {
    #[snafu(display("no default frame rate definition found for {value}"))]
    Unsupported { value: f64 },

    #[snafu(display("frame rate out of range: {reason}"))]
    OutOfRange { reason: &'static str },
}

/// A time address format: a [`FrameRate`] plus whether drop-frame counting is enabled.
///
/// Drop-frame is only legal for the two NTSC rates, 30000/1001 and 60000/1001. See
/// [`crate::frame`] for the counting algorithm itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameFormat {
    /// The underlying frame rate.
    pub rate: FrameRate,
    /// Whether drop-frame counting is enabled. Always `false` for non-NTSC rates.
    pub drop_frame: bool,
}

impl FrameFormat {
    /// Constructs a new `FrameFormat`, validating that drop-frame is only requested for a rate
    /// that supports it.
    pub fn new(rate: FrameRate, drop_frame: bool) -> Result<Self, FrameRateError> {
        if drop_frame && !supports_drop_frame(&rate) {
            return Err(FrameRateError(InnerFrameRateError::OutOfRange {
                reason: "drop-frame is only valid for 30000/1001 or 60000/1001 rates",
            }));
        }
        Ok(FrameFormat { rate, drop_frame })
    }
}

impl std::fmt::Display for FrameFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.drop_frame { "Drop" } else { "Non-Drop" };
        write!(f, "{}fps ({kind})", self.rate)
    }
}

