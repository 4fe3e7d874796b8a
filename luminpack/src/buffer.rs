//! Destinations for the [`Writer`](crate::Writer). The writer fills one segment at a time through a bounded cursor;
//! once a write does not fit into what is left, it commits the segment and rents the next one. Committed bytes are
//! never moved or rewritten.

use crate::error::{Error, Result};
use std::sync::{Mutex, OnceLock, PoisonError};
use tracing::{debug, trace};

/// Supplies writable segments to a [`Writer`](crate::Writer) and receives them back once they are filled.
pub trait BufferProvider {

    /// Returns a zeroed segment of at least `min_size` bytes, or [`Error::OutOfRange`] if the provider cannot grow
    /// any further.
    fn rent(&mut self, min_size: usize) -> Result<Vec<u8>>;

    /// Takes back a segment of which the first `written` bytes are part of the output.
    fn commit(&mut self, segment: Vec<u8>, written: usize);

}

/// A free list of byte buffers shared between calls so that hot paths do not allocate.
#[derive(Debug)]
pub struct BufferPool {
    free: Mutex<Vec<Vec<u8>>>,
    retain: usize,
}

impl BufferPool {

    /// Buffers with a larger capacity are not kept idle, so a single large message does not pin its memory.
    pub const MAX_RETAINED_CAPACITY: usize = 1 << 20;

    /// Creates a pool keeping at most `retain` idle buffers.
    pub const fn new(retain: usize) -> Self {
        Self { free: Mutex::new(Vec::new()), retain }
    }

    /// The process-wide pool.
    pub fn shared() -> &'static BufferPool {
        static SHARED: OnceLock<BufferPool> = OnceLock::new();
        SHARED.get_or_init(|| {
            debug!("creating shared buffer pool");
            BufferPool::new(16)
        })
    }

    /// Hands out a zeroed buffer of exactly `size` bytes, reusing the smallest idle one that fits.
    pub fn rent(&self, size: usize) -> Vec<u8> {
        let reused = {
            let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
            let best = free.iter()
                .enumerate()
                .filter(|(_, b)| b.capacity() >= size)
                .min_by_key(|(_, b)| b.capacity())
                .map(|(i, _)| i);
            best.map(|i| free.swap_remove(i))
        };
        match reused {
            Some(mut buf) => {
                buf.clear();
                buf.resize(size, 0);
                buf
            },
            None => vec![0u8; size],
        }
    }

    /// Takes a buffer back. Buffers beyond the retention limit or with a capacity above
    /// [`MAX_RETAINED_CAPACITY`](Self::MAX_RETAINED_CAPACITY) are dropped.
    pub fn give_back(&self, buf: Vec<u8>) {
        if buf.capacity() > Self::MAX_RETAINED_CAPACITY {
            return;
        }
        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        if free.len() < self.retain {
            free.push(buf);
        }
    }

    /// Returns the number of idle buffers.
    pub fn idle(&self) -> usize {
        self.free.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

}

/// A growable destination made of pooled segments. Segment sizes double until `limit` total bytes are reached.
/// All segments go back to the pool when the buffer is dropped, whether the write succeeded or not.
#[derive(Debug)]
pub struct SegmentedBuffer<'p> {
    pool: &'p BufferPool,
    segments: Vec<(Vec<u8>, usize)>,
    committed: usize,
    next_size: usize,
    limit: usize,
}

impl<'p> SegmentedBuffer<'p> {

    pub const INITIAL_SEGMENT_SIZE: usize = 256;

    pub fn new(pool: &'p BufferPool) -> Self {
        Self::with_limit(pool, usize::MAX)
    }

    /// Creates a buffer which refuses to grow beyond `limit` bytes in total.
    pub fn with_limit(pool: &'p BufferPool, limit: usize) -> Self {
        Self { pool, segments: Vec::new(), committed: 0, next_size: Self::INITIAL_SEGMENT_SIZE, limit }
    }

    /// Returns the number of committed bytes.
    pub fn len(&self) -> usize {
        self.committed
    }

    pub fn is_empty(&self) -> bool {
        self.committed == 0
    }

    /// Copies all committed bytes into one contiguous vector.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.committed);
        for (segment, written) in self.segments.iter() {
            out.extend_from_slice(&segment[..*written]);
        }
        out
    }

    /// Copies all committed bytes into `out`, which has to be large enough. Returns the number of copied bytes.
    pub fn copy_to(&self, out: &mut [u8]) -> Result<usize> {
        if out.len() < self.committed {
            return Err(Error::OutOfRange { position: 0, requested: self.committed, capacity: out.len() });
        }
        let mut pos = 0;
        for (segment, written) in self.segments.iter() {
            out[pos..pos + written].copy_from_slice(&segment[..*written]);
            pos += written;
        }
        Ok(pos)
    }

}

impl<'p> BufferProvider for SegmentedBuffer<'p> {

    fn rent(&mut self, min_size: usize) -> Result<Vec<u8>> {
        let available = self.limit - self.committed;
        if min_size > available {
            return Err(Error::OutOfRange { position: self.committed, requested: min_size, capacity: self.limit });
        }
        let size = self.next_size.max(min_size).min(available);
        trace!(size, committed = self.committed, "renting segment");
        self.next_size = self.next_size.saturating_mul(2);
        Ok(self.pool.rent(size))
    }

    fn commit(&mut self, segment: Vec<u8>, written: usize) {
        self.committed += written;
        self.segments.push((segment, written));
    }

}

impl<'p> Drop for SegmentedBuffer<'p> {
    fn drop(&mut self) {
        for (segment, _) in self.segments.drain(..) {
            self.pool.give_back(segment);
        }
    }
}
