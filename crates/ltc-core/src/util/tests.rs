use arbitrary_int::u4;
use rstest::rstest;

use super::*;

#[rstest]
#[case(0, 0, 0)]
#[case(2, 9, 29)]
#[case(5, 0, 50)]
fn test_from_bcd_ok(#[case] tens: u8, #[case] units: u8, #[case] expected: u8) {
    assert_eq!(from_bcd(tens, u4::new(units)).unwrap(), expected);
}

#[test]
fn test_from_bcd_bad_units() {
    let err = from_bcd(1u8, u4::new(0xA)).unwrap_err();
    assert_eq!(err.to_string(), "BCD units digit 10 is not a valid decimal digit");
}

#[test]
fn test_from_bcd_bad_tens() {
    let err = from_bcd(0xAu8, u4::new(0)).unwrap_err();
    assert_eq!(err.to_string(), "BCD tens digit 10 is not a valid decimal digit");
}

#[rstest]
#[case(0, (0, 0))]
#[case(29, (2, 9))]
#[case(59, (5, 9))]
fn test_to_bcd_tens_units(#[case] value: u8, #[case] expected: (u8, u8)) {
    let (tens, units) = to_bcd_tens_units(value);
    assert_eq!((tens, units.value()), expected);
}
