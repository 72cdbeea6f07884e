//! Guest sample submission
//!
//! Copies a guest PCM buffer into a channel queue with volume scaling and
//! mono expansion, and implements the blocking contract: a blocking call
//! onto a busy channel parks the caller but still queues its samples.

use tracing::warn;

use super::AudioHle;
use crate::channel::{
    AudioChannel, CHANNEL_OUTPUT2, CHANNEL_SRC, ChannelFormat, UNITY_VOLUME, WaitInfo, wait_key,
};
use crate::collab::{GuestMemory, KernelThreads, WaitType};
use crate::error::AudioError;
use crate::volume::adjust_volume;

impl AudioHle {
    /// Submit the channel's pending guest buffer
    ///
    /// Returns the frame count (the syscall result) or a guest error. With
    /// `blocking` set and samples still queued, the current thread is parked
    /// and the returned value becomes its wake-up result;
    /// [`AudioError::CannotWait`] is returned when parking is impossible, after
    /// the samples were queued anyway.
    pub fn enqueue<M, K>(
        &mut self,
        index: usize,
        blocking: bool,
        memory: &M,
        kernel: &mut K,
    ) -> Result<u32, AudioError>
    where
        M: GuestMemory + ?Sized,
        K: KernelThreads + ?Sized,
    {
        let min_factor = self.profile.queue_min_factor;
        let chan = self
            .channels
            .get_mut(index)
            .ok_or(AudioError::InvalidChannel)?;

        let mut ret = chan.sample_count;
        // Hardware quirk: silence-only calls on these report zero frames
        if chan.sample_address == 0 && (index == CHANNEL_SRC || index == CHANNEL_OUTPUT2) {
            ret = 0;
        }

        let mut result = Ok(ret);
        if !chan.queue.is_empty() {
            if !blocking {
                return Err(AudioError::ChannelBusy);
            }

            let block_samples = chan.queue.len() / 2 / min_factor;
            if kernel.is_dispatch_enabled() {
                chan.waiting.push(WaitInfo {
                    thread: kernel.current_thread(),
                    remaining: i32::try_from(block_samples).unwrap_or(i32::MAX),
                });
                kernel.wait_current_thread(
                    WaitType::AudioChannel,
                    wait_key(index),
                    ret,
                    "blocking audio",
                );
            } else {
                result = Err(AudioError::CannotWait);
            }
            // The hardware queues the samples even though the caller blocks
        }

        if chan.sample_address == 0 {
            return result;
        }

        queue_guest_samples(chan, index, memory);
        result
    }
}

/// Copy the channel's guest buffer into its queue
fn queue_guest_samples<M: GuestMemory + ?Sized>(chan: &mut AudioChannel, index: usize, memory: &M) {
    let mut frames = chan.sample_count as usize;
    let room = chan.queue.vacant_len() / 2;
    if frames > room {
        warn!(
            "Audio channel {} queue full: dropping {} of {} frames",
            index,
            frames - room,
            frames
        );
        frames = room;
    }

    let unity = chan.left_volume == UNITY_VOLUME && chan.right_volume == UNITY_VOLUME;
    match chan.format {
        ChannelFormat::Stereo if unity && cfg!(target_endian = "little") => {
            copy_stereo(chan, frames, memory);
        }
        ChannelFormat::Stereo => {
            let left = (chan.left_volume as i32) << 1;
            let right = (chan.right_volume as i32) << 1;
            scale_stereo(chan, frames, left, right, memory);
        }
        ChannelFormat::Mono => {
            let left = (chan.left_volume as i32) << 1;
            let right = (chan.right_volume as i32) << 1;
            expand_mono(chan, frames, left, right, memory);
        }
    }
}

/// Unity gain stereo: raw byte copy straight into the queue spans
fn copy_stereo<M: GuestMemory + ?Sized>(chan: &mut AudioChannel, frames: usize, memory: &M) {
    let address = chan.sample_address;
    let (first, second) = chan.queue.push_spans(frames * 2);
    let offset = (first.len() * 2) as u32;
    memory.read_bytes(address, bytemuck::cast_slice_mut(first));
    if !second.is_empty() {
        memory.read_bytes(address.wrapping_add(offset), bytemuck::cast_slice_mut(second));
    }
}

/// Stereo with per-side gain (volumes already doubled)
fn scale_stereo<M: GuestMemory + ?Sized>(
    chan: &mut AudioChannel,
    frames: usize,
    left: i32,
    right: i32,
    memory: &M,
) {
    let address = chan.sample_address;
    let (first, second) = chan.queue.push_spans(frames * 2);
    let offset = (first.len() * 2) as u32;
    for (span, span_address) in [(first, address), (second, address.wrapping_add(offset))] {
        if span.is_empty() {
            continue;
        }
        memory.read_bytes(span_address, bytemuck::cast_slice_mut(span));
        for pair in span.chunks_exact_mut(2) {
            pair[0] = adjust_volume(i16::from_le(pair[0]), left);
            pair[1] = adjust_volume(i16::from_le(pair[1]), right);
        }
    }
}

/// Mono source: each sample becomes an independently scaled L/R pair
fn expand_mono<M: GuestMemory + ?Sized>(
    chan: &mut AudioChannel,
    frames: usize,
    left: i32,
    right: i32,
    memory: &M,
) {
    let address = chan.sample_address;
    for i in 0..frames {
        let sample = memory.read_i16(address.wrapping_add((i * 2) as u32));
        chan.queue.push(adjust_volume(sample, left));
        chan.queue.push(adjust_volume(sample, right));
    }
}
