//! Small binary-coded-decimal helpers used by [`crate::datablock`].

use arbitrary_int::{u2, u3, u4, Number};
use snafu::prelude::*;

#[cfg(test)]
mod tests;

/// Combine a tens digit and a units digit stored as binary-coded decimal into a normal number.
///
/// Returns an error if either digit is out of the `0..=9` range, which can happen when decoding
/// a corrupted bitstream.
pub(crate) fn from_bcd<TTens>(tens: TTens, units: u4) -> Result<u8, BcdError>
where
    TTens: Copy + Number,
    u8: From<TTens>,
{
    let tens = u8::from(tens);
    let units = units.value();
    ensure!(tens <= 9, BcdSnafu { place: "tens", value: tens });
    ensure!(units <= 9, BcdSnafu { place: "units", value: units });
    Ok(tens * 10 + units)
}

/// Split a two-digit decimal number (`0..=99`) into a tens digit and a units digit.
pub(crate) fn to_bcd_tens_units(value: u8) -> (u8, u4) {
    (value / 10, u4::new(value % 10))
}

/// Split a two-digit decimal number into a tens digit and a units digit, narrowing the tens
/// digit to a [`u2`] (used for frame and hour tens, which never exceed 5).
pub(crate) fn to_bcd_u2_units(value: u8) -> (u2, u4) {
    (u2::new(value / 10), u4::new(value % 10))
}

/// Split a two-digit decimal number into a tens digit and a units digit, narrowing the tens
/// digit to a [`u3`] (used for second and minute tens, which never exceed 5).
pub(crate) fn to_bcd_u3_units(value: u8) -> (u3, u4) {
    (u3::new(value / 10), u4::new(value % 10))
}

/// Error decoding a binary-coded decimal field.
#[derive(Debug, Snafu)]
#[snafu(display("BCD {place} digit {value} is not a valid decimal digit"))]
pub(crate) struct BcdError {
    place: &'static str,
    value: u8,
}
