use rstest::rstest;

use super::*;

#[test]
fn test_interning_same_object() {
    let a = FrameRate::new(30_000, 1_001).unwrap();
    let b = FrameRate::new(30_000, 1_001).unwrap();
    assert_eq!(a, b);
    assert!(Arc::ptr_eq(&a.0, &b.0));
}

#[test]
fn test_interning_reduces_before_lookup() {
    let a = FrameRate::new(30, 1).unwrap();
    let b = FrameRate::new(60, 2).unwrap();
    assert_eq!(a, b);
    assert!(Arc::ptr_eq(&a.0, &b.0));
}

#[test]
fn test_distinct_rates_are_distinct() {
    let a = FrameRate::new(30, 1).unwrap();
    let b = FrameRate::new(25, 1).unwrap();
    assert_ne!(a, b);
}

#[rstest]
#[case(24.0, 24, 1)]
#[case(25.0, 25, 1)]
#[case(29.97, 30_000, 1_001)]
#[case(30.0, 30, 1)]
#[case(59.94, 60_000, 1_001)]
#[case(60.0, 60, 1)]
fn test_from_float(#[case] value: f64, #[case] numerator: i64, #[case] denominator: i64) {
    let rate = FrameRate::from_float(value).unwrap();
    assert_eq!(rate.rational(), Rational64::new(numerator, denominator));
}

#[test]
fn test_from_float_unsupported() {
    let err = FrameRate::from_float(23.976).unwrap_err();
    assert_eq!(err.to_string(), "no default frame rate definition found for 23.976");
}

#[rstest]
#[case(24, 1, 24)]
#[case(25, 1, 25)]
#[case(30_000, 1_001, 30)]
#[case(60_000, 1_001, 60)]
fn test_rounded(#[case] numerator: i64, #[case] denominator: i64, #[case] expected: i64) {
    let rate = FrameRate::new(numerator, denominator).unwrap();
    assert_eq!(rate.rounded(), expected);
}

#[test]
fn test_float_value() {
    let rate = FrameRate::new(30_000, 1_001).unwrap();
    assert!((rate.float_value() - 29.97_002_997).abs() < 1e-6);
}

#[test]
fn test_display_integer_rate() {
    let rate = FrameRate::new(24, 1).unwrap();
    assert_eq!(rate.to_string(), "24");
}

#[test]
fn test_display_ntsc_rate() {
    let rate = FrameRate::new(30_000, 1_001).unwrap();
    assert_eq!(rate.to_string(), "29.97");
}

#[test]
fn test_new_rejects_non_positive() {
    assert!(FrameRate::new(0, 1).is_err());
    assert!(FrameRate::new(30, 0).is_err());
    assert!(FrameRate::new(-30, 1).is_err());
}

#[test]
fn test_ordering() {
    let a = FrameRate::new(24, 1).unwrap();
    let b = FrameRate::new(30, 1).unwrap();
    assert!(a < b);
}

#[rstest]
#[case(FrameFormat::new(FrameRate::new(30_000, 1_001).unwrap(), true), true)]
#[case(FrameFormat::new(FrameRate::new(60_000, 1_001).unwrap(), true), true)]
#[case(FrameFormat::new(FrameRate::new(25, 1).unwrap(), false), true)]
#[case(FrameFormat::new(FrameRate::new(25, 1).unwrap(), true), false)]
#[case(FrameFormat::new(FrameRate::new(24, 1).unwrap(), true), false)]
fn test_frame_format_drop_frame_validation(
    #[case] result: Result<FrameFormat, FrameRateError>,
    #[case] should_succeed: bool,
) {
    assert_eq!(result.is_ok(), should_succeed);
}

#[test]
fn test_frame_format_display() {
    let fmt =
        FrameFormat::new(FrameRate::new(30_000, 1_001).unwrap(), true).expect("valid format");
    assert_eq!(fmt.to_string(), "29.97fps (Drop)");
}

#[test]
fn test_serde_tokens() {
    let rate = FrameRate::new(30_000, 1_001).unwrap();
    serde_test::assert_tokens(
        &rate,
        &[
            serde_test::Token::Struct { name: "FrameRate", len: 2 },
            serde_test::Token::Str("numerator"),
            serde_test::Token::I64(30_000),
            serde_test::Token::Str("denominator"),
            serde_test::Token::I64(1_001),
            serde_test::Token::StructEnd,
        ],
    );
}

#[test]
fn test_drop_frame_numbers() {
    assert_eq!(drop_frame_numbers(30), &[0, 1]);
    assert_eq!(drop_frame_numbers(60), &[0, 1, 2, 3]);
    assert!(drop_frame_numbers(25).is_empty());
}
