//! Mix tick and drain wake-ups
//!
//! Every tick drains one hardware block from each reserved channel, sums the
//! blocks in a 32-bit accumulator, saturates to 16 bits and appends the
//! result to the output queue. Threads blocked on a channel are released
//! once enough frames have drained.

use tracing::trace;

use super::AudioHle;
use crate::channel::{AudioChannel, wait_key};
use crate::collab::{KernelThreads, WaitType};
use crate::error::AudioError;
use crate::volume::clamp_s16;

/// Drain step that releases every waiter regardless of its threshold
pub const WAKE_ALL: i32 = i32::MAX;

/// Why waiters are being woken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    /// Frames drained normally; waiters get the value stashed when they parked
    Drained,
    /// Channel released; waiters get [`AudioError::ChannelNotReserved`]
    Released,
}

/// Advance every waiter on `chan` by `step` drained frames
///
/// Entries whose thread is no longer parked on this channel are dropped
/// without a resume. A single reschedule follows if anything woke.
pub(crate) fn wake_threads<K: KernelThreads + ?Sized>(
    chan: &mut AudioChannel,
    index: usize,
    reason: WakeReason,
    step: i32,
    kernel: &mut K,
) {
    let key = wait_key(index);
    let mut woke = false;

    chan.waiting.retain_mut(|info| {
        info.remaining = info.remaining.saturating_sub(step);

        if kernel.wait_key(info.thread, WaitType::AudioChannel) != Some(key) {
            // Left the wait some other way (woken, killed)
            return false;
        }
        if info.remaining > 0 {
            return true;
        }

        let ret = match reason {
            WakeReason::Drained => kernel.wait_value(info.thread),
            WakeReason::Released => AudioError::ChannelNotReserved.code(),
        };
        trace!("Audio channel {} woke thread {:?} ({:#x})", index, info.thread, ret);
        kernel.resume_thread(info.thread, ret);
        woke = true;
        false
    });

    if woke {
        kernel.reschedule("audio drain");
    }
}

impl AudioHle {
    /// Run one mix tick
    pub fn update<K: KernelThreads + ?Sized>(&mut self, kernel: &mut K) {
        if self.mix_buffer.is_empty() {
            return;
        }
        self.mix_buffer.fill(0);

        let step = i32::try_from(self.profile.hw_block_size).unwrap_or(WAKE_ALL);
        for (index, chan) in self.channels.iter_mut().enumerate() {
            if !chan.reserved {
                continue;
            }

            wake_threads(chan, index, WakeReason::Drained, step, kernel);

            if chan.queue.is_empty() {
                continue;
            }

            let (first, second) = chan.queue.pop_spans(self.mix_buffer.len());
            for (acc, &sample) in self.mix_buffer.iter_mut().zip(first.iter().chain(second)) {
                *acc += i32::from(sample);
            }
        }

        for (dst, &acc) in self.mix_block.iter_mut().zip(&self.mix_buffer) {
            *dst = clamp_s16(acc);
        }
        self.output.push_block(&self.mix_block);
    }

    /// Release every waiter on a channel at once
    pub fn wake_channel<K: KernelThreads + ?Sized>(
        &mut self,
        index: usize,
        reason: WakeReason,
        kernel: &mut K,
    ) -> Result<(), AudioError> {
        let chan = self
            .channels
            .get_mut(index)
            .ok_or(AudioError::InvalidChannel)?;
        wake_threads(chan, index, reason, WAKE_ALL, kernel);
        Ok(())
    }
}
