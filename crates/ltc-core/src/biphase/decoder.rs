//! Recovers [`LtcDataBlock`]s from a stream of incoming PCM samples.
//!
//! Streaming and stateful: samples arrive in arbitrarily sized chunks across repeated calls to
//! [`BiphaseDecoder::feed`], and zero-crossing/interval state carries over between chunks so a
//! bit boundary straddling a chunk split is still classified correctly.

use std::collections::VecDeque;

use crate::datablock::LtcDataBlock;


/// How many of the most recent chunks' interval lists (not counting the current one) feed the
/// rolling `dmin`/`dmax` estimate.
const INTERVAL_HISTORY_CHUNKS: usize = 2;

/// How many consecutive logical-1 bits mark the start of a sync word.
const SYNC_ONES_THRESHOLD: u32 = 12;

/// Upper bound on the buffered-bit window, well above the 80 bits ever needed at once.
const MAX_BUFFERED_BITS: usize = 160;

/// A streaming biphase-mark-code decoder.
///
/// Feed it PCM samples as they arrive; it returns any [`LtcDataBlock`]s it managed to
/// reassemble from the samples seen so far. Malformed or noisy input never produces an error --
/// it's simply dropped, and the decoder resynchronizes against the next valid sync word (counted
/// in [`BiphaseDecoder::resync_count`]).
#[derive(Debug, Default)]
pub struct BiphaseDecoder {
    last_sign: Option<i8>,
    samples_since_crossing: usize,
    recent_intervals: VecDeque<Vec<usize>>,
    bits: VecDeque<bool>,
    bit_count: usize,
    consecutive_ones: u32,
    pending_sync_bit_index: Option<usize>,
    pending_short: bool,
    resync_count: u64,
}

impl BiphaseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times the decoder has discarded an unclassifiable interval and resynchronized.
    /// Non-fatal; surfaced only as a counter and a `log::debug!` event.
    pub fn resync_count(&self) -> u64 {
        self.resync_count
    }

    /// Feeds another chunk of PCM samples, returning any data blocks completed along the way.
    pub fn feed(&mut self, samples: &[f64]) -> Vec<LtcDataBlock> {
        let this_chunk_intervals = self.detect_intervals(samples);

        let mut history: Vec<&Vec<usize>> = self.recent_intervals.iter().collect();
        history.push(&this_chunk_intervals);

        let mut emitted = Vec::new();
        if let Some((dmin, dmax)) = estimate_dmin_dmax(&history) {
            for &interval in &this_chunk_intervals {
                self.classify_and_accumulate(interval, dmin, dmax, &mut emitted);
            }
        }

        self.recent_intervals.push_back(this_chunk_intervals);
        while self.recent_intervals.len() > INTERVAL_HISTORY_CHUNKS {
            self.recent_intervals.pop_front();
        }

        emitted
    }

    /// Zero-cross detection: tracks the running sample count since the last sign change, which
    /// carries across calls so an interval spanning a chunk boundary is measured correctly.
    /// `0` maps to `-1`, matching how a silent/DC sample is treated as the negative half-cycle.
    fn detect_intervals(&mut self, samples: &[f64]) -> Vec<usize> {
        let mut intervals = Vec::new();
        for &s in samples {
            let sign: i8 = if s > 0.0 { 1 } else { -1 };
            self.samples_since_crossing += 1;
            if let Some(prev) = self.last_sign {
                if sign != prev {
                    intervals.push(self.samples_since_crossing);
                    self.samples_since_crossing = 0;
                }
            }
            self.last_sign = Some(sign);
        }
        intervals
    }

    /// Classifies one zero-cross interval as a bit-period half (short) or a full bit-period
    /// (long), pairing two consecutive shorts into one logical `1`, and feeds the result into
    /// the bit accumulator/sync search. An interval matching neither cluster resynchronizes.
    fn classify_and_accumulate(
        &mut self,
        interval: usize,
        dmin: f64,
        dmax: f64,
        emitted: &mut Vec<LtcDataBlock>,
    ) {
        let value = interval as f64;
        let is_short = (dmin - 2.0..=dmin + 2.0).contains(&value);
        let is_long = (dmax - 2.0..=dmax + 2.0).contains(&value);

        match (is_short, is_long) {
            (_, true) => {
                if self.pending_short {
                    self.resync();
                }
                self.emit_bit(false, emitted);
            }
            (true, false) => {
                if self.pending_short {
                    self.pending_short = false;
                    self.emit_bit(true, emitted);
                } else {
                    self.pending_short = true;
                }
            }
            (false, false) => self.resync(),
        }
    }

    fn emit_bit(&mut self, bit: bool, emitted: &mut Vec<LtcDataBlock>) {
        self.bits.push_back(bit);
        self.bit_count += 1;
        while self.bits.len() > MAX_BUFFERED_BITS {
            self.bits.pop_front();
        }

        if bit {
            self.consecutive_ones += 1;
            if self.consecutive_ones == SYNC_ONES_THRESHOLD {
                self.pending_sync_bit_index = Some(self.bit_count + 2);
            }
        } else {
            self.consecutive_ones = 0;
        }

        if self.pending_sync_bit_index == Some(self.bit_count) && self.bits.len() >= 80 {
            let tail: Vec<bool> = self.bits.iter().rev().take(80).rev().copied().collect();
            let mut array = [false; 80];
            array.copy_from_slice(&tail);
            emitted.push(LtcDataBlock::from_array(&array));
            self.bits.clear();
            self.bit_count = 0;
            self.consecutive_ones = 0;
            self.pending_sync_bit_index = None;
        }
    }

    fn resync(&mut self) {
        self.pending_short = false;
        self.consecutive_ones = 0;
        self.pending_sync_bit_index = None;
        self.resync_count += 1;
        log::debug!("biphase decoder lost sync; dropping bits until the next sync word");
    }
}

/// Estimates the typical short (`dmin`) and long (`dmax`) interval lengths by taking the overall
/// median of every interval in `history`, then the median of the values below and above it.
/// `history` covers the current chunk plus the previous [`INTERVAL_HISTORY_CHUNKS`] chunks.
fn estimate_dmin_dmax(history: &[&Vec<usize>]) -> Option<(f64, f64)> {
    let mut all: Vec<usize> = history.iter().flat_map(|chunk| chunk.iter().copied()).collect();
    if all.is_empty() {
        return None;
    }
    all.sort_unstable();

    let overall_median = median(&all);
    let (lows, highs): (Vec<usize>, Vec<usize>) =
        all.iter().partition(|&&v| (v as f64) < overall_median);

    let dmin = if lows.is_empty() { overall_median } else { median(&lows) };
    let dmax = if highs.is_empty() { overall_median * 2.0 } else { median(&highs) };
    Some((dmin, dmax))
}

/// Median of an already-sorted slice.
fn median(sorted: &[usize]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2] as f64
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0
    }
}
