//! The `HH:MM:SS:FF` timecode counter and drop-frame arithmetic.
//!
//! - SMPTE ST 12-1:2014 Section 5 - Drop-frame compensation

use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::sync::LazyLock;

use chrono::Timelike;
use regex::Regex;
use serde::{de, de::Unexpected, Deserialize, Serialize};
use snafu::prelude::*;

use crate::framerate::{drop_frame_numbers, FrameFormat};


/// A mutable `HH:MM:SS:FF` timecode counter for a fixed [`FrameFormat`].
///
/// `total_frames` is the number of frames elapsed since `00:00:00:00`, and is always kept
/// consistent with the `hour`/`minute`/`second`/`value` fields by every mutating operation:
/// constructing, [`Frame::set`], [`Frame::set_total_frames`], [`Frame::incr`], [`Frame::decr`],
/// [`Frame::from_datetime`], and the arithmetic operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    frame_format: FrameFormat,
    hour: u8,
    minute: u8,
    second: u8,
    value: u8,
    total_frames: i64,
    drop_enabled: bool,
}

impl Frame {
    /// Constructs a `Frame` at `00:00:00:00` for the given format.
    pub fn new(frame_format: FrameFormat) -> Self {
        let mut frame = Frame {
            frame_format,
            hour: 0,
            minute: 0,
            second: 0,
            value: 0,
            total_frames: 0,
            drop_enabled: false,
        };
        frame.recompute_drop_enabled();
        frame
    }

    /// Constructs a `Frame` from an hour/minute/second/frame-number tuple.
    pub fn with_hmsf(
        frame_format: FrameFormat,
        hour: u8,
        minute: u8,
        second: u8,
        value: u8,
    ) -> Result<Self, FrameError> {
        let mut frame = Frame::new(frame_format);
        frame.set(Some(hour), Some(minute), Some(second), Some(value))?;
        Ok(frame)
    }

    /// Constructs a `Frame` from a cumulative frame count; see [`Frame::set_total_frames`].
    pub fn with_total_frames(frame_format: FrameFormat, total_frames: i64) -> Result<Self, FrameError> {
        let mut frame = Frame::new(frame_format);
        frame.set_total_frames(total_frames)?;
        Ok(frame)
    }

    /// The timecode's frame format.
    pub fn frame_format(&self) -> &FrameFormat {
        &self.frame_format
    }

    /// Hour, in `0..24`.
    pub fn hour(&self) -> u8 {
        self.hour
    }

    /// Minute, in `0..60`.
    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Second, in `0..60`.
    pub fn second(&self) -> u8 {
        self.second
    }

    /// Frame number within the second, in `0..rounded`.
    pub fn value(&self) -> u8 {
        self.value
    }

    /// The cumulative frame count elapsed since `00:00:00:00`.
    pub fn total_frames(&self) -> i64 {
        self.total_frames
    }

    /// Whether drop-frame compensation is active for the *current* second: `drop_frame &&
    /// second == 0 && minute % 10 != 0`.
    pub fn drop_enabled(&self) -> bool {
        self.drop_enabled
    }

    fn recompute_drop_enabled(&mut self) {
        self.drop_enabled =
            self.frame_format.drop_frame && self.second == 0 && self.minute % 10 != 0;
    }

    fn df_frame_numbers(&self) -> &'static [u8] {
        drop_frame_numbers(self.frame_format.rate.rounded())
    }

    /// Assigns the given fields (leaving any `None` field unchanged), then recomputes
    /// `drop_enabled` and `total_frames` from the result.
    pub fn set(
        &mut self,
        hour: Option<u8>,
        minute: Option<u8>,
        second: Option<u8>,
        value: Option<u8>,
    ) -> Result<(), FrameError> {
        let hour = hour.unwrap_or(self.hour);
        let minute = minute.unwrap_or(self.minute);
        let second = second.unwrap_or(self.second);
        let value = value.unwrap_or(self.value);
        ensure!(hour < 24, OutOfRangeSnafu { reason: "hour must be in 0..24" });
        ensure!(minute < 60, OutOfRangeSnafu { reason: "minute must be in 0..60" });
        ensure!(second < 60, OutOfRangeSnafu { reason: "second must be in 0..60" });
        let rounded = self.frame_format.rate.rounded();
        ensure!(
            i64::from(value) < rounded,
            OutOfRangeSnafu { reason: "frame number must be less than the rounded frame rate" }
        );
        self.hour = hour;
        self.minute = minute;
        self.second = second;
        self.value = value;
        self.recompute_drop_enabled();
        self.total_frames = self.calc_total_frames();
        Ok(())
    }

    /// The forward conversion from `(hour, minute, second, value)` to a cumulative frame count,
    /// per the drop-frame compensation algorithm.
    fn calc_total_frames(&self) -> i64 {
        let rounded = self.frame_format.rate.rounded();
        let hour = i64::from(self.hour);
        let minute = i64::from(self.minute);
        let second = i64::from(self.second);
        let value = i64::from(self.value);
        let frames = (hour * 3600 + minute * 60 + second) * rounded + value;
        if self.frame_format.drop_frame {
            let drop_count = self.df_frame_numbers().len() as i64;
            let total_minutes = 60 * hour + minute;
            let dropped = drop_count * (total_minutes - total_minutes / 10);
            frames - dropped
        } else {
            frames
        }
    }

    /// The inverse conversion: sets `hour`/`minute`/`second`/`value` (and `drop_enabled`) from a
    /// cumulative frame count `n`.
    pub fn set_total_frames(&mut self, n: i64) -> Result<(), FrameError> {
        ensure!(n >= 0, OutOfRangeSnafu { reason: "total_frames must not be negative" });
        let rounded = self.frame_format.rate.rounded();
        let mut n = n;
        if self.frame_format.drop_frame {
            let drop_count = self.df_frame_numbers().len() as i64;
            let d_offset = rounded * 60 * 10 - drop_count * 9;
            let m_offset = rounded * 60 - drop_count;
            let d = n / d_offset;
            let m = n % d_offset;
            let add = if m < drop_count {
                drop_count * 9 * d
            } else {
                drop_count * 9 * d + drop_count * ((m - drop_count) / m_offset)
            };
            n += add;
        }
        self.hour = (((n / rounded) / 60) / 60 % 24) as u8;
        self.minute = (((n / rounded) / 60) % 60) as u8;
        self.second = ((n / rounded) % 60) as u8;
        self.value = (n % rounded) as u8;
        self.recompute_drop_enabled();
        self.total_frames = self.calc_total_frames();
        Ok(())
    }

    /// Advances the counter by exactly one frame.
    pub fn incr(&mut self) {
        self.total_frames += 1;
        let rounded = self.frame_format.rate.rounded() as u8;
        self.value += 1;
        if self.value >= rounded {
            self.value = 0;
            self.second += 1;
            if self.second >= 60 {
                self.second = 0;
                self.minute += 1;
                if self.minute >= 60 {
                    self.minute = 0;
                    self.hour = (self.hour + 1) % 24;
                }
            }
            self.recompute_drop_enabled();
            if self.drop_enabled && self.df_frame_numbers().contains(&self.value) {
                self.value = self.df_frame_numbers().last().copied().unwrap() + 1;
            }
        }
    }

    /// Retreats the counter by exactly one frame.
    pub fn decr(&mut self) {
        self.total_frames -= 1;
        let rounded = self.frame_format.rate.rounded() as i16;
        let mut value = i16::from(self.value) - 1;
        let mut decr_second = value < 0;
        if !decr_second
            && self.frame_format.drop_frame
            && self.df_frame_numbers().contains(&(value as u8))
            && self.second == 0
            && self.minute % 10 != 0
        {
            decr_second = true;
        }
        if decr_second {
            value = rounded - 1;
            if self.second == 0 {
                self.second = 59;
                if self.minute == 0 {
                    self.minute = 59;
                    self.hour = if self.hour == 0 { 23 } else { self.hour - 1 };
                } else {
                    self.minute -= 1;
                }
            } else {
                self.second -= 1;
            }
            self.recompute_drop_enabled();
        }
        self.value = value as u8;
    }

    /// Derives a `Frame` from a wall-clock timestamp: the hour/minute/second are taken directly,
    /// and the sub-second fraction is mapped to the closest `i/float_rate` for `i in 0..rounded`.
    pub fn from_datetime<T: Timelike>(frame_format: FrameFormat, dt: &T) -> Result<Self, FrameError> {
        let rounded = frame_format.rate.rounded();
        let float_rate = frame_format.rate.float_value();
        let fraction_secs = f64::from(dt.nanosecond()) / 1_000_000_000.0;
        let mut best_value = 0u8;
        let mut best_distance = f64::MAX;
        for i in 0..rounded {
            let candidate_time = i as f64 / float_rate;
            let distance = (candidate_time - fraction_secs).abs();
            if distance < best_distance {
                best_distance = distance;
                best_value = i as u8;
            }
        }
        Frame::with_hmsf(
            frame_format,
            dt.hour() as u8,
            dt.minute() as u8,
            dt.second() as u8,
            best_value,
        )
    }

    fn checked_add(&self, rhs: i64) -> Self {
        let mut result = self.clone();
        if rhs >= 0 {
            for _ in 0..rhs {
                result.incr();
            }
        } else {
            for _ in 0..(-rhs) {
                result.decr();
            }
        }
        result
    }

    fn ensure_compatible(&self, other: &Frame) -> Result<(), FrameError> {
        ensure!(self.frame_format == other.frame_format, IncompatibleFormatSnafu);
        Ok(())
    }
}

impl Add<i64> for Frame {
    type Output = Frame;

    fn add(self, rhs: i64) -> Frame {
        self.checked_add(rhs)
    }
}

impl Sub<i64> for Frame {
    type Output = Frame;

    fn sub(self, rhs: i64) -> Frame {
        self.checked_add(-rhs)
    }
}

impl AddAssign<i64> for Frame {
    fn add_assign(&mut self, rhs: i64) {
        *self = self.checked_add(rhs);
    }
}

impl SubAssign<i64> for Frame {
    fn sub_assign(&mut self, rhs: i64) {
        *self = self.checked_add(-rhs);
    }
}

/// Adding two `Frame`s requires a shared [`FrameFormat`]; the result's `total_frames` is the sum
/// of the two operands' `total_frames`.
impl Frame {
    /// Adds another `Frame`'s cumulative frame count to this one, failing if the formats differ.
    pub fn checked_add_frame(&self, other: &Frame) -> Result<Frame, FrameError> {
        self.ensure_compatible(other)?;
        Frame::with_total_frames(self.frame_format.clone(), self.total_frames + other.total_frames)
    }

    /// Subtracts another `Frame`'s cumulative frame count from this one, failing if the formats
    /// differ.
    pub fn checked_sub_frame(&self, other: &Frame) -> Result<Frame, FrameError> {
        self.ensure_compatible(other)?;
        Frame::with_total_frames(self.frame_format.clone(), self.total_frames - other.total_frames)
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sep = if self.frame_format.drop_frame { ';' } else { ':' };
        write!(f, "{:02}:{:02}:{:02}{sep}{:02}", self.hour, self.minute, self.second, self.value)
    }
}

static FRAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<hour>\d+):(?P<minute>\d+):(?P<second>\d+)(?P<sep>[:;])(?P<frame>\d+)$")
        .unwrap()
});

impl Frame {
    /// Parses a `HH:MM:SS:FF` or `HH:MM:SS;FF` string against a known [`FrameFormat`].
    ///
    /// The separator (`:` or `;`) must match the format's `drop_frame` setting.
    pub fn parse(frame_format: FrameFormat, s: &str) -> Result<Self, FrameError> {
        let captures = FRAME_RE.captures(s).context(ParseSnafu { input: s.to_string() })?;
        let expected_sep = if frame_format.drop_frame { ';' } else { ':' };
        let sep = captures["sep"].chars().next().unwrap();
        ensure!(
            sep == expected_sep,
            ParseSnafu {
                input: format!(
                    "separator '{sep}' does not match drop_frame={}",
                    frame_format.drop_frame
                )
            }
        );
        let hour: u8 = captures["hour"].parse().ok().context(ParseSnafu { input: s.to_string() })?;
        let minute: u8 =
            captures["minute"].parse().ok().context(ParseSnafu { input: s.to_string() })?;
        let second: u8 =
            captures["second"].parse().ok().context(ParseSnafu { input: s.to_string() })?;
        let value: u8 =
            captures["frame"].parse().ok().context(ParseSnafu { input: s.to_string() })?;
        Frame::with_hmsf(frame_format, hour, minute, second, value)
    }
}

impl Serialize for Frame {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

struct FrameVisitor(FrameFormat);

impl<'de> de::Visitor<'de> for FrameVisitor {
    type Value = Frame;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a HH:MM:SS:FF or HH:MM:SS;FF timecode string")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Frame::parse(self.0, v).map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
    }
}

impl Frame {
    /// Deserializes a `Frame` from a timecode string, validated against a known [`FrameFormat`].
    pub fn deserialize<'de, D>(frame_format: FrameFormat, deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(FrameVisitor(frame_format))
    }
}

/// Error constructing or mutating a [`Frame`].
#[derive(Debug, Snafu)]
pub struct FrameError(InnerFrameError);

#[derive(Debug, Snafu)]
enum InnerFrameError {
    #[snafu(display("frame value out of range: {reason}"))]
    OutOfRange { reason: &'static str },

    #[snafu(display("arithmetic between frames requires the same frame format"))]
    IncompatibleFormat,

    #[snafu(display("'{input}' is not a valid timecode string for this frame format"))]
    Parse { input: String },
}
