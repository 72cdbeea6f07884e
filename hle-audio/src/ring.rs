//! Fixed-capacity sample ring buffer
//!
//! Stores signed 16-bit samples in a circular buffer. Bulk access hands out
//! up to two contiguous spans (split at the wrap boundary) so producers and
//! consumers can copy whole blocks without an intermediate buffer.
//!
//! Used for every channel queue. The ring performs no synchronization; the
//! cross-thread output queue lives in [`crate::output`].

use std::num::NonZeroUsize;

/// Fixed-capacity circular buffer of `i16` samples
#[derive(Clone)]
pub struct SampleRing {
    /// Backing storage (never resized)
    storage: Box<[i16]>,
    /// Read position
    head: usize,
    /// Write position
    tail: usize,
    /// Number of queued samples
    count: usize,
}

impl SampleRing {
    /// Create an empty ring holding up to `capacity` samples
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            storage: vec![0; capacity.get()].into_boxed_slice(),
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// Total number of sample slots
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Number of queued samples
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of samples that can still be pushed
    pub fn vacant_len(&self) -> usize {
        self.capacity() - self.count
    }

    /// Drop all queued samples and rewind both cursors
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.count = 0;
    }

    /// Push a single sample
    ///
    /// Pushing into a full ring is a caller error; the sample is discarded.
    pub fn push(&mut self, sample: i16) {
        debug_assert!(self.count < self.capacity(), "push into full sample ring");
        if self.count == self.capacity() {
            return;
        }
        self.storage[self.tail] = sample;
        self.tail = (self.tail + 1) % self.capacity();
        self.count += 1;
    }

    /// Reserve `n` samples at the write cursor and return them as two spans
    ///
    /// The first span runs from the write cursor towards the end of storage,
    /// the second (possibly empty) continues from index 0. The caller must
    /// fill both spans in order. The samples count as queued immediately.
    ///
    /// Requesting more than [`Self::vacant_len`] is a caller error; the
    /// request is clamped so the spans never overlap queued data.
    pub fn push_spans(&mut self, n: usize) -> (&mut [i16], &mut [i16]) {
        debug_assert!(n <= self.vacant_len(), "sample ring overflow");
        let n = n.min(self.vacant_len());
        let capacity = self.capacity();
        let tail = self.tail;
        let first = n.min(capacity - tail);
        let second = n - first;

        self.tail = (tail + n) % capacity;
        self.count += n;

        let (front, back) = self.storage.split_at_mut(tail);
        (&mut back[..first], &mut front[..second])
    }

    /// Consume up to `n` samples from the read cursor as two spans
    ///
    /// Returns fewer than `n` samples in total when the ring holds fewer.
    /// The spans stay valid until the next write.
    pub fn pop_spans(&mut self, n: usize) -> (&[i16], &[i16]) {
        let n = n.min(self.count);
        let capacity = self.capacity();
        let head = self.head;
        let first = n.min(capacity - head);
        let second = n - first;

        self.head = (head + n) % capacity;
        self.count -= n;

        let (front, back) = self.storage.split_at(head);
        (&back[..first], &front[..second])
    }

    /// Queued samples in FIFO order, without consuming them
    pub fn iter(&self) -> impl ExactSizeIterator<Item = i16> + '_ {
        let capacity = self.capacity();
        (0..self.count).map(move |i| self.storage[(self.head + i) % capacity])
    }

    /// Append samples, truncating at capacity. Returns the number written.
    pub fn extend_from_slice(&mut self, samples: &[i16]) -> usize {
        let (first, second) = self.push_spans(samples.len().min(self.vacant_len()));
        let split = first.len();
        first.copy_from_slice(&samples[..split]);
        let end = split + second.len();
        second.copy_from_slice(&samples[split..end]);
        end
    }
}

impl std::fmt::Debug for SampleRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleRing")
            .field("capacity", &self.capacity())
            .field("head", &self.head)
            .field("tail", &self.tail)
            .field("count", &self.count)
            .finish()
    }
}
