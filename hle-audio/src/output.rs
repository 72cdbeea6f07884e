//! Global output queue and host puller
//!
//! The mix tick (emulation thread) pushes clamped stereo blocks; the host
//! audio thread pulls whole frames. The ring is shared behind a mutex that
//! each side holds for a single copy, so cursor updates are always visible
//! to the other thread.
//!
//! Neither side waits on the other. Overflow drops the newest frames, and a
//! pull that finds the queue locked returns nothing (an ordinary underrun).

use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use ringbuf::HeapRb;
use ringbuf::traits::{Consumer, Observer, Producer};
use tracing::{debug, warn};

/// Output queue capacity in samples (4096 stereo frames)
pub const OUTPUT_QUEUE_CAPACITY: usize = 512 * 16;

type SharedRing = Arc<Mutex<HeapRb<i16>>>;

fn lock(ring: &Mutex<HeapRb<i16>>) -> MutexGuard<'_, HeapRb<i16>> {
    ring.lock().unwrap_or_else(|e| {
        warn!("Audio output queue mutex poisoned; continuing");
        e.into_inner()
    })
}

/// Producer side of the output queue, owned by [`crate::AudioHle`]
pub(crate) struct OutputQueue {
    ring: SharedRing,
}

impl OutputQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Arc::new(Mutex::new(HeapRb::new(capacity))),
        }
    }

    pub fn capacity(&self) -> usize {
        lock(&self.ring).capacity().get()
    }

    /// Queued samples
    pub fn len(&self) -> usize {
        lock(&self.ring).occupied_len()
    }

    /// Append a mixed block, dropping whatever whole frames do not fit
    ///
    /// Returns the number of samples queued.
    pub fn push_block(&mut self, block: &[i16]) -> usize {
        let mut ring = lock(&self.ring);
        let fits = block.len().min(ring.vacant_len()) & !1;
        let pushed = ring.push_slice(&block[..fits]);
        if pushed < block.len() {
            debug!(
                "Audio output queue overflow: dropped {} samples",
                block.len() - pushed
            );
        }
        pushed
    }

    /// Queued samples in playback order, without consuming them
    pub fn snapshot(&self) -> Vec<i16> {
        let ring = lock(&self.ring);
        let (first, second) = ring.as_slices();
        let mut samples = Vec::with_capacity(first.len() + second.len());
        samples.extend_from_slice(first);
        samples.extend_from_slice(second);
        samples
    }

    /// Replace the queue contents
    pub fn restore(&mut self, samples: &[i16]) -> usize {
        let mut ring = lock(&self.ring);
        ring.clear();
        ring.push_slice(samples)
    }

    pub fn puller(&self) -> OutputPuller {
        OutputPuller {
            ring: Arc::clone(&self.ring),
        }
    }
}

/// Consumer handle for the host audio thread
///
/// Cheap to clone; every clone reads the same queue.
#[derive(Clone)]
pub struct OutputPuller {
    ring: SharedRing,
}

impl OutputPuller {
    /// Copy up to `num_frames` stereo frames into `out`
    ///
    /// Returns the number of whole frames written. When fewer frames are
    /// queued than requested the rest of `out` is left untouched; padding
    /// (usually silence) is the caller's choice. Never blocks: if the mix
    /// tick holds the queue, zero frames are returned.
    pub fn mix(&self, out: &mut [i16], num_frames: usize) -> usize {
        let mut ring = match self.ring.try_lock() {
            Ok(ring) => ring,
            Err(TryLockError::WouldBlock) => return 0,
            Err(TryLockError::Poisoned(e)) => {
                warn!("Audio output queue mutex poisoned; continuing");
                e.into_inner()
            }
        };
        let wanted = num_frames
            .saturating_mul(2)
            .min(out.len())
            .min(ring.occupied_len())
            & !1;
        let popped = ring.pop_slice(&mut out[..wanted]);
        popped / 2
    }

    /// Whole stereo frames ready to pull
    pub fn available_frames(&self) -> usize {
        lock(&self.ring).occupied_len() / 2
    }
}
