use rstest::rstest;

use super::*;
use crate::framerate::FrameRate;

fn ntsc_30_df() -> FrameFormat {
    FrameFormat::new(FrameRate::new(30_000, 1_001).unwrap(), true).unwrap()
}

fn pal_25_ndf() -> FrameFormat {
    FrameFormat::new(FrameRate::new(25, 1).unwrap(), false).unwrap()
}

#[rstest]
#[case(0, 0, 0, 0, true)]
#[case(1, 9, 0, 2, true)]
#[case(23, 59, 59, 29, true)]
fn test_encode_decode_round_trip(
    #[case] hour: u8,
    #[case] minute: u8,
    #[case] second: u8,
    #[case] value: u8,
    #[case] drop_frame: bool,
) {
    let format = if drop_frame { ntsc_30_df() } else { pal_25_ndf() };
    let frame = Frame::with_hmsf(format.clone(), hour, minute, second, value).unwrap();
    let block = LtcDataBlock::encode(&frame);
    let decoded = block.decode(format.rate).unwrap();
    assert_eq!(decoded, frame);
}

#[test]
fn test_parity_is_even_across_first_64_bits() {
    let frame = Frame::with_hmsf(ntsc_30_df(), 12, 34, 56, 7).unwrap();
    let block = LtcDataBlock::encode(&frame);
    assert_eq!(block.get_uint64_value().count_ones() % 2, 0);
}

#[test]
fn test_sync_word_occupies_top_16_bits() {
    let frame = Frame::new(pal_25_ndf());
    let block = LtcDataBlock::encode(&frame);
    let array = block.get_array();
    assert_eq!(array.len(), 80);
    for (j, bit) in array[64..].iter().enumerate() {
        assert_eq!(*bit, (SYNC_WORD >> j) & 1 == 1);
    }
}

#[test]
fn test_get_array_matches_uint64_value() {
    let frame = Frame::with_hmsf(pal_25_ndf(), 1, 2, 3, 4).unwrap();
    let block = LtcDataBlock::encode(&frame);
    let array = block.get_array();
    let mut reconstructed: u64 = 0;
    for (i, bit) in array[..64].iter().enumerate() {
        if *bit {
            reconstructed |= 1 << i;
        }
    }
    assert_eq!(reconstructed, block.get_uint64_value());
}

#[test]
fn test_decode_rejects_corrupted_parity() {
    let frame = Frame::with_hmsf(ntsc_30_df(), 1, 2, 3, 4).unwrap();
    let mut block = LtcDataBlock::encode(&frame);
    // Flip the frame-units nibble without touching the parity bit, which breaks the invariant.
    block.0 = RawBlock::new_with_raw_value(block.0.raw_value() ^ 0b1);
    assert!(block.decode(ntsc_30_df().rate).is_err());
}

#[test]
fn test_decode_rejects_drop_frame_on_unsupported_rate() {
    let frame = Frame::new(pal_25_ndf());
    let block = LtcDataBlock::encode(&frame);
    // Manually force the drop-frame flag on, which is illegal for a 25fps rate.
    let forced = RawBlock::new_with_raw_value(block.0.raw_value() | (1 << 10));
    let mut with_bad_parity = LtcDataBlock(forced);
    let fixed_parity = compute_parity(with_bad_parity.0.raw_value() & !(1 << 27));
    with_bad_parity.0 =
        RawBlock::new_with_raw_value((with_bad_parity.0.raw_value() & !(1 << 27)) | (fixed_parity << 27));
    assert!(with_bad_parity.decode(pal_25_ndf().rate).is_err());
}

#[test]
fn test_set_user_bits_preserves_timecode_fields() {
    let frame = Frame::with_hmsf(ntsc_30_df(), 5, 6, 7, 8).unwrap();
    let mut block = LtcDataBlock::encode(&frame);
    block.set_user_bits([1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(block.user_bits(), [1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(block.get_uint64_value().count_ones() % 2, 0);
    let decoded = block.decode(ntsc_30_df().rate).unwrap();
    assert_eq!(decoded, frame);
}

#[test]
fn test_set_user_bits_masks_high_nibble() {
    let mut block = LtcDataBlock::encode(&Frame::new(pal_25_ndf()));
    block.set_user_bits([0xFF; 8]);
    assert_eq!(block.user_bits(), [0xF; 8]);
}

#[test]
fn test_high_frame_rate_frame_tens_truncates_without_panicking() {
    // 60000/1001 allows frame numbers up to 59, whose tens digit (5) doesn't fit the 2-bit
    // frame-tens field; encoding must not panic, even though the round trip is lossy here.
    let format = FrameFormat::new(FrameRate::new(60_000, 1_001).unwrap(), true).unwrap();
    let frame = Frame::with_hmsf(format, 0, 1, 0, 44).unwrap();
    let block = LtcDataBlock::encode(&frame);
    assert_eq!(block.get_uint64_value().count_ones() % 2, 0);
}
