//! Audio channel state
//!
//! Each hardware channel owns a sample queue of interleaved stereo `i16`
//! (mono input is expanded on enqueue), its volume/format registers and the
//! list of guest threads blocked until the queue drains.

use std::num::NonZeroUsize;

use crate::collab::ThreadId;
use crate::ring::SampleRing;

/// Number of regular output channels
pub const CHANNEL_MAX: usize = 8;

/// Secondary-stream (sample rate converter) channel index
pub const CHANNEL_SRC: usize = 8;

/// Distinguished "output2" channel index (shares the SRC slot)
pub const CHANNEL_OUTPUT2: usize = 8;

/// Total channel slots: the regular channels plus the shared SRC/OUTPUT2 slot
pub const CHANNEL_COUNT: usize = CHANNEL_MAX + 1;

/// Per-channel queue capacity in samples
pub const CHANNEL_QUEUE_CAPACITY: usize = 32768 * 8;

const QUEUE_SLOTS: NonZeroUsize = NonZeroUsize::new(CHANNEL_QUEUE_CAPACITY).unwrap();

/// Channel volume that leaves samples unchanged
pub const UNITY_VOLUME: u32 = 0x8000;

/// Largest channel volume accepted
pub const MAX_VOLUME: u32 = 0xFFFF;

/// Wait key a blocked thread is parked under for `index`
#[inline]
pub fn wait_key(index: usize) -> u32 {
    index as u32 + 1
}

/// Sample layout of the guest buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelFormat {
    /// Interleaved L/R pairs
    #[default]
    Stereo,
    /// One sample per frame, duplicated to both sides
    Mono,
}

impl ChannelFormat {
    /// Guest register value for stereo
    pub const STEREO_CODE: u32 = 0x00;
    /// Guest register value for mono
    pub const MONO_CODE: u32 = 0x10;

    pub fn code(self) -> u32 {
        match self {
            Self::Stereo => Self::STEREO_CODE,
            Self::Mono => Self::MONO_CODE,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            Self::STEREO_CODE => Some(Self::Stereo),
            Self::MONO_CODE => Some(Self::Mono),
            _ => None,
        }
    }
}

/// A guest thread blocked on a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitInfo {
    /// Parked thread
    pub thread: ThreadId,
    /// Stereo frames still to drain before the thread is released
    pub remaining: i32,
}

/// One hardware audio channel
#[derive(Debug, Clone)]
pub struct AudioChannel {
    /// Whether the guest reserved this channel (only reserved channels mix)
    pub reserved: bool,
    /// Layout of the guest sample buffer
    pub format: ChannelFormat,
    /// Guest address of the pending sample buffer (0 = silence-only call)
    pub sample_address: u32,
    /// Frames requested by the pending enqueue
    pub sample_count: u32,
    /// Left volume (unity = [`UNITY_VOLUME`])
    pub left_volume: u32,
    /// Right volume (unity = [`UNITY_VOLUME`])
    pub right_volume: u32,
    /// Queued interleaved stereo samples
    pub(crate) queue: SampleRing,
    /// Threads blocked until the queue drains
    pub(crate) waiting: Vec<WaitInfo>,
}

impl AudioChannel {
    /// Create an unreserved, empty channel
    pub fn new() -> Self {
        Self {
            reserved: false,
            format: ChannelFormat::Stereo,
            sample_address: 0,
            sample_count: 0,
            left_volume: 0,
            right_volume: 0,
            queue: SampleRing::new(QUEUE_SLOTS),
            waiting: Vec::new(),
        }
    }

    /// Mark the channel reserved with the given layout and frame count
    pub fn reserve(&mut self, format: ChannelFormat, sample_count: u32) {
        self.reserved = true;
        self.format = format;
        self.sample_count = sample_count;
    }

    /// Set both volumes, clamped to [`MAX_VOLUME`]
    pub fn set_volume(&mut self, left: u32, right: u32) {
        self.left_volume = left.min(MAX_VOLUME);
        self.right_volume = right.min(MAX_VOLUME);
    }

    /// Point the channel at the next guest buffer
    pub fn set_samples(&mut self, address: u32, sample_count: u32) {
        self.sample_address = address;
        self.sample_count = sample_count;
    }

    /// Number of queued samples (two per stereo frame)
    pub fn queued_samples(&self) -> usize {
        self.queue.len()
    }

    /// Queued samples in playback order
    pub fn queued(&self) -> impl Iterator<Item = i16> + '_ {
        self.queue.iter()
    }

    pub fn waiting_threads(&self) -> &[WaitInfo] {
        &self.waiting
    }

    /// Reset to the unreserved state, discarding queued samples and waits
    pub fn clear(&mut self) {
        self.reserved = false;
        self.format = ChannelFormat::Stereo;
        self.sample_address = 0;
        self.sample_count = 0;
        self.left_volume = 0;
        self.right_volume = 0;
        self.queue.clear();
        self.waiting.clear();
    }
}

impl Default for AudioChannel {
    fn default() -> Self {
        Self::new()
    }
}
