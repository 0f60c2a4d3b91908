//! A lock-free single-producer single-consumer ring buffer.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(test)]
mod tests;

/// A single-producer single-consumer ring buffer of samples.
///
/// Exactly one thread may call [`RingBuffer::write`] and exactly one (possibly different)
/// thread may call [`RingBuffer::read`] at any given time; the buffer never takes a lock on
/// either path. One slot of capacity is always kept empty to distinguish a full buffer from an
/// empty one.
pub struct RingBuffer<T> {
    buffer: Box<[UnsafeCell<T>]>,
    capacity: usize,
    write_pos: AtomicUsize,
    read_pos: AtomicUsize,
}

// SAFETY: `write` only ever touches the region between `read_pos` and `write_pos + n`, and
// `read` only ever touches the region between `read_pos` and `read_pos + n`; the two regions
// never overlap because `write_space`/`read_space` are derived from the same two atomics with
// acquire/release ordering on the boundary each side publishes.
unsafe impl<T: Send> Send for RingBuffer<T> {}
unsafe impl<T: Send> Sync for RingBuffer<T> {}

impl<T: Copy + Default> std::fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &(self.capacity - 1))
            .field("read_space", &self.read_space())
            .finish()
    }
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Creates a ring buffer able to hold `capacity` samples before `write_space()` reaches
    /// zero.
    pub fn new(capacity: usize) -> Self {
        let slots = capacity + 1;
        let buffer = (0..slots).map(|_| UnsafeCell::new(T::default())).collect();
        RingBuffer { buffer, capacity: slots, write_pos: AtomicUsize::new(0), read_pos: AtomicUsize::new(0) }
    }

    /// Samples available to [`RingBuffer::read`] right now.
    pub fn read_space(&self) -> usize {
        let w = self.write_pos.load(Ordering::Acquire);
        let r = self.read_pos.load(Ordering::Acquire);
        (w + self.capacity - r) % self.capacity
    }

    /// Free slots available to [`RingBuffer::write`] right now.
    pub fn write_space(&self) -> usize {
        self.capacity - 1 - self.read_space()
    }

    /// Writes as many samples from `data` as fit, returning how many were written.
    pub fn write(&self, data: &[T]) -> usize {
        let n = data.len().min(self.write_space());
        let w = self.write_pos.load(Ordering::Relaxed);
        for (i, &sample) in data[..n].iter().enumerate() {
            let idx = (w + i) % self.capacity;
            // SAFETY: this index range is exclusively owned by the writer (see impl comment).
            unsafe { *self.buffer[idx].get() = sample };
        }
        self.write_pos.store((w + n) % self.capacity, Ordering::Release);
        n
    }

    /// Reads as many samples as fit into `out`, returning how many were read. Any remainder of
    /// `out` beyond that count is left untouched.
    pub fn read(&self, out: &mut [T]) -> usize {
        let n = out.len().min(self.read_space());
        let r = self.read_pos.load(Ordering::Relaxed);
        for (i, slot) in out[..n].iter_mut().enumerate() {
            let idx = (r + i) % self.capacity;
            // SAFETY: this index range is exclusively owned by the reader (see impl comment).
            *slot = unsafe { *self.buffer[idx].get() };
        }
        self.read_pos.store((r + n) % self.capacity, Ordering::Release);
        n
    }

    /// Discards all buffered samples. Only safe to call when the writer is not concurrently
    /// writing, e.g. while the producer is parked during a block-size change.
    pub fn clear(&self) {
        let w = self.write_pos.load(Ordering::Acquire);
        self.read_pos.store(w, Ordering::Release);
    }
}
