//! The 80-bit Linear Timecode data block: field layout, BCD packing, and parity.
//!
//! - IEC 60461:2010 (entire standard) - Time and control code
//! - SMPTE 12M (entire standard) - Time and Control Code

use arbitrary_int::{u2, u3, u4, Number};
use bitbybit::bitfield;
use snafu::prelude::*;

use crate::frame::{Frame, FrameError};
use crate::framerate::{FrameFormat, FrameRate, FrameRateError};
use crate::util::{from_bcd, to_bcd_tens_units, to_bcd_u2_units, to_bcd_u3_units, BcdError};

#[cfg(test)]
mod tests;

/// The 16-bit sync word occupying bits 64-79, LSB-first: `0011 1111 1111 1101`.
pub const SYNC_WORD: u16 = 0x3FFD;

#[bitfield(u64)]
struct RawBlock {
    #[bits(0..=3, rw)]
    frame_units: u4,
    #[bits(4..=7, rw)]
    user_bits_1: u4,
    #[bits(8..=9, rw)]
    frame_tens: u2,
    #[bit(10, rw)]
    drop_frame_flag: bool,
    #[bit(11, rw)]
    color_frame_flag: bool,
    #[bits(12..=15, rw)]
    user_bits_2: u4,
    #[bits(16..=19, rw)]
    second_units: u4,
    #[bits(20..=23, rw)]
    user_bits_3: u4,
    #[bits(24..=26, rw)]
    second_tens: u3,
    #[bit(27, rw)]
    parity: bool,
    #[bits(28..=31, rw)]
    user_bits_4: u4,
    #[bits(32..=35, rw)]
    minute_units: u4,
    #[bits(36..=39, rw)]
    user_bits_5: u4,
    #[bits(40..=42, rw)]
    minute_tens: u3,
    #[bit(43, rw)]
    binary_group_flag_1: bool,
    #[bits(44..=47, rw)]
    user_bits_6: u4,
    #[bits(48..=51, rw)]
    hour_units: u4,
    #[bits(52..=55, rw)]
    user_bits_7: u4,
    #[bits(56..=57, rw)]
    hour_tens: u2,
    #[bit(58, rw)]
    reserved: bool,
    #[bit(59, rw)]
    binary_group_flag_2: bool,
    #[bits(60..=63, rw)]
    user_bits_8: u4,
}

/// An 80-bit Linear Timecode data block.
///
/// Bits `0..64` carry the BCD timecode fields, user bits, and a parity bit; bits `64..80` are the
/// fixed [`SYNC_WORD`]. Only the drop-frame flag is recorded here, not the exact [`FrameRate`]:
/// two rates that round to the same integer (e.g. 30/1 and 30000/1001) are bit-for-bit
/// indistinguishable, matching how real LTC hardware cannot tell them apart either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LtcDataBlock(RawBlock);

impl LtcDataBlock {
    /// Encodes a [`Frame`] into a data block. User bits are left at zero; use
    /// [`LtcDataBlock::set_user_bits`] to fill them in afterwards.
    pub fn encode(frame: &Frame) -> Self {
        let (frame_tens, frame_units) = frame_tens_truncated(frame.value());
        let (second_tens, second_units) = to_bcd_u3_units(frame.second());
        let (minute_tens, minute_units) = to_bcd_u3_units(frame.minute());
        let (hour_tens, hour_units) = to_bcd_u2_units(frame.hour());

        let unparitied = RawBlock::builder()
            .with_frame_units(frame_units)
            .with_user_bits_1(u4::new(0))
            .with_frame_tens(frame_tens)
            .with_drop_frame_flag(frame.frame_format().drop_frame)
            .with_color_frame_flag(true)
            .with_user_bits_2(u4::new(0))
            .with_second_units(second_units)
            .with_user_bits_3(u4::new(0))
            .with_second_tens(second_tens)
            .with_parity(false)
            .with_user_bits_4(u4::new(0))
            .with_minute_units(minute_units)
            .with_user_bits_5(u4::new(0))
            .with_minute_tens(minute_tens)
            .with_binary_group_flag_1(false)
            .with_user_bits_6(u4::new(0))
            .with_hour_units(hour_units)
            .with_user_bits_7(u4::new(0))
            .with_hour_tens(hour_tens)
            .with_reserved(false)
            .with_binary_group_flag_2(false)
            .with_user_bits_8(u4::new(0))
            .build();

        let parity = compute_parity(unparitied.raw_value());
        LtcDataBlock(RawBlock::new_with_raw_value(
            unparitied.raw_value() | (u64::from(parity) << 27),
        ))
    }

    /// Reconstructs a data block from a raw 80-bit array, such as one recovered by
    /// [`crate::biphase::decoder::BiphaseDecoder`]. Only bits `0..64` are inspected; the sync
    /// word at `64..80` is assumed to have already been located by the caller and is not
    /// re-validated here.
    pub fn from_array(bits: &[bool; 80]) -> Self {
        let mut raw_value: u64 = 0;
        for (i, &bit) in bits[..64].iter().enumerate() {
            if bit {
                raw_value |= 1 << i;
            }
        }
        LtcDataBlock(RawBlock::new_with_raw_value(raw_value))
    }

    /// Decodes a data block back into a [`Frame`], given the [`FrameRate`] in use (the data
    /// block itself only records whether drop-frame is active, not the exact rate).
    pub fn decode(&self, rate: FrameRate) -> Result<Frame, DataBlockError> {
        self.check_parity()?;
        let raw = self.0;

        let format =
            FrameFormat::new(rate, raw.drop_frame_flag()).context(InvalidFrameFormatSnafu)?;

        let value =
            from_bcd(raw.frame_tens(), raw.frame_units()).context(BadFieldSnafu { field: "frame" })?;
        let second = from_bcd(raw.second_tens(), raw.second_units())
            .context(BadFieldSnafu { field: "second" })?;
        let minute = from_bcd(raw.minute_tens(), raw.minute_units())
            .context(BadFieldSnafu { field: "minute" })?;
        let hour =
            from_bcd(raw.hour_tens(), raw.hour_units()).context(BadFieldSnafu { field: "hour" })?;

        let frame = Frame::with_hmsf(format, hour, minute, second, value)
            .context(InvalidTimecodeSnafu)?;
        Ok(frame)
    }

    fn check_parity(&self) -> Result<(), DataBlockError> {
        let without_parity = self.0.raw_value() & !(1 << 27);
        let expected = compute_parity(without_parity);
        ensure!(self.0.parity() == expected, ParityMismatchSnafu);
        Ok(())
    }

    /// The 80-bit array, LSB-first within each field, bits `0..64` followed by the 16-bit sync
    /// word at bits `64..80`.
    pub fn get_array(&self) -> [bool; 80] {
        let mut array = [false; 80];
        let raw = self.0.raw_value();
        for (i, bit) in array.iter_mut().take(64).enumerate() {
            *bit = (raw >> i) & 1 == 1;
        }
        for (j, bit) in array.iter_mut().skip(64).enumerate() {
            *bit = (SYNC_WORD >> j) & 1 == 1;
        }
        array
    }

    /// Bits `0..64` as a single integer, LSB-first (bit 0 is the least significant bit).
    pub fn get_uint64_value(&self) -> u64 {
        self.0.raw_value()
    }

    /// The 8 user-bits nibbles, in field order (user bits 1 through 8).
    pub fn user_bits(&self) -> [u8; 8] {
        [
            self.0.user_bits_1().value(),
            self.0.user_bits_2().value(),
            self.0.user_bits_3().value(),
            self.0.user_bits_4().value(),
            self.0.user_bits_5().value(),
            self.0.user_bits_6().value(),
            self.0.user_bits_7().value(),
            self.0.user_bits_8().value(),
        ]
    }

    /// Overwrites the 8 user-bits nibbles and recomputes parity.
    ///
    /// Only the low 4 bits of each byte are used; the rest are ignored.
    pub fn set_user_bits(&mut self, bits: [u8; 8]) {
        let unparitied = RawBlock::builder()
            .with_frame_units(self.0.frame_units())
            .with_user_bits_1(u4::new(bits[0] & 0xF))
            .with_frame_tens(self.0.frame_tens())
            .with_drop_frame_flag(self.0.drop_frame_flag())
            .with_color_frame_flag(self.0.color_frame_flag())
            .with_user_bits_2(u4::new(bits[1] & 0xF))
            .with_second_units(self.0.second_units())
            .with_user_bits_3(u4::new(bits[2] & 0xF))
            .with_second_tens(self.0.second_tens())
            .with_parity(false)
            .with_user_bits_4(u4::new(bits[3] & 0xF))
            .with_minute_units(self.0.minute_units())
            .with_user_bits_5(u4::new(bits[4] & 0xF))
            .with_minute_tens(self.0.minute_tens())
            .with_binary_group_flag_1(self.0.binary_group_flag_1())
            .with_user_bits_6(u4::new(bits[5] & 0xF))
            .with_hour_units(self.0.hour_units())
            .with_user_bits_7(u4::new(bits[6] & 0xF))
            .with_hour_tens(self.0.hour_tens())
            .with_reserved(self.0.reserved())
            .with_binary_group_flag_2(self.0.binary_group_flag_2())
            .with_user_bits_8(u4::new(bits[7] & 0xF))
            .build();
        let parity = compute_parity(unparitied.raw_value());
        self.0 = RawBlock::new_with_raw_value(unparitied.raw_value() | (u64::from(parity) << 27));
    }
}

/// Splits a frame-number field into its BCD tens/units digits, truncating the tens digit to 2
/// bits to match the fixed bit layout (bits 8-9). Only matters for the 60000/1001 rate, whose
/// frame numbers run up to 59: values 40-59 alias onto a smaller tens digit, same as in the
/// original tool this was ported from, which only ever populated these two bits.
fn frame_tens_truncated(value: u8) -> (u2, u4) {
    let (tens, units) = to_bcd_tens_units(value);
    (u2::new(tens % 4), units)
}

/// Returns the parity bit value (0 or 1) that, when placed at bit 27, makes the total number of
/// set bits across `[0..64)` even. `raw` must have bit 27 already cleared.
fn compute_parity(raw: u64) -> u64 {
    u64::from(raw.count_ones() % 2 == 1)
}

/// Error decoding an [`LtcDataBlock`] into a [`Frame`].
#[derive(Debug, Snafu)]
pub struct DataBlockError(InnerDataBlockError);

#[derive(Debug, Snafu)]
enum InnerDataBlockError {
    #[snafu(display("LTC data block failed its parity check"))]
    ParityMismatch,

    #[snafu(display("data block's drop-frame flag is incompatible with the given frame rate"))]
    InvalidFrameFormat { source: FrameRateError },

    #[snafu(display("data block's {field} field does not decode to a valid value"))]
    BadField { field: &'static str, source: BcdError },

    #[snafu(display("data block decodes to an invalid timecode"))]
    InvalidTimecode { source: FrameError },
}
