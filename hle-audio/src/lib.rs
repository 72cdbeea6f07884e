//! HLE Audio - fixed-function audio output core
//!
//! Reproduces a console's hardware audio output block: per-channel sample
//! queues with fixed-point volume, blocking submission semantics tied to the
//! guest thread scheduler, a periodic mixer driven by emulated time, and a
//! queue that hands mixed PCM to a host audio thread.
//!
//! # Architecture
//!
//! - [`AudioHle`] - context object owning channels, mixer and output queue
//! - [`SampleRing`] - fixed-capacity sample queue with two-span bulk access
//! - [`OutputPuller`] - host-thread handle for pulling mixed frames
//! - [`collab`] - traits the emulator implements (memory, threads, timing, host)
//! - [`StateWriter`] / [`StateReader`] - save-state cursor

pub mod channel;
pub mod collab;
mod engine;
pub mod error;
#[cfg(feature = "cpal")]
pub mod host;
pub mod latency;
pub mod output;
pub mod ring;
pub mod savestate;
#[cfg(test)]
pub mod test_utils;
pub mod volume;

pub use channel::{
    AudioChannel, CHANNEL_COUNT, CHANNEL_MAX, CHANNEL_OUTPUT2, CHANNEL_SRC, ChannelFormat,
    MAX_VOLUME, UNITY_VOLUME, WaitInfo,
};
pub use collab::{CoreTiming, EventId, GuestMemory, HostAudio, KernelThreads, ThreadId, WaitType};
pub use engine::{AUDIO_EVENT_NAME, AudioHle, HOST_EVENT_NAME, WakeReason};
pub use error::{AudioError, StateError};
pub use latency::{AudioConfig, AudioLatency, HW_SAMPLE_RATE, LatencyProfile, TickIntervals};
pub use output::{OUTPUT_QUEUE_CAPACITY, OutputPuller};
pub use ring::SampleRing;
pub use savestate::{StateReader, StateWriter};
pub use volume::adjust_volume;

#[cfg(feature = "cpal")]
pub use host::CpalOutput;
