//! Audio HLE engine
//!
//! [`AudioHle`] owns every channel, the mix accumulator and the producer side
//! of the output queue. All methods except [`AudioHle::mix`] run on the
//! emulation thread; the host thread only ever touches an [`OutputPuller`].
//!
//! # Timing
//!
//! ```text
//! Emulation thread                                     Host audio thread
//!     │                                                      │
//! [enqueue] ──► channel queues                               │
//!     │                                                      │
//! [AudioUpdate tick] ── mix reserved channels ──► output ──► [mix / pull]
//!     │                                                      │
//! [AudioUpdateHost tick] ── HostAudio::update_sound          │
//! ```

mod enqueue;
mod mixer;
mod state;


use tracing::{debug, warn};

use crate::channel::{AudioChannel, CHANNEL_COUNT};
use crate::collab::{CoreTiming, EventId, HostAudio, KernelThreads};
use crate::error::AudioError;
use crate::latency::{AudioConfig, HW_SAMPLE_RATE, LatencyProfile, TickIntervals};
use crate::output::{OUTPUT_QUEUE_CAPACITY, OutputPuller, OutputQueue};

pub use mixer::WakeReason;

/// Name of the mix tick event
pub const AUDIO_EVENT_NAME: &str = "AudioUpdate";

/// Name of the host poll event
pub const HOST_EVENT_NAME: &str = "AudioUpdateHost";

/// Audio output subsystem state
pub struct AudioHle {
    /// Hardware channels (regular channels plus the SRC/OUTPUT2 slot)
    channels: [AudioChannel; CHANNEL_COUNT],
    /// Latency preset chosen at init
    profile: LatencyProfile,
    /// Cycle intervals of the two periodic events
    intervals: TickIntervals,
    /// Per-tick accumulator, 2 * hw_block_size (empty after shutdown)
    mix_buffer: Vec<i32>,
    /// Clamped copy of the accumulator handed to the output queue
    mix_block: Vec<i16>,
    /// Mixed output awaiting the host
    output: OutputQueue,
    /// Host output frequency requested by the guest
    mix_frequency: u32,
    audio_event: EventId,
    host_event: EventId,
}

impl AudioHle {
    /// Bring up the audio subsystem and schedule its periodic events
    pub fn init<T: CoreTiming + ?Sized>(config: &AudioConfig, timing: &mut T) -> Self {
        let profile = config.profile();
        let intervals = TickIntervals::new(timing.cpu_hz(), &profile);

        let audio_event = timing.register_event(AUDIO_EVENT_NAME);
        let host_event = timing.register_event(HOST_EVENT_NAME);
        timing.schedule_event(intervals.audio_cycles, audio_event, 0);
        timing.schedule_event(intervals.host_cycles, host_event, 0);

        let block_len = profile.hw_block_size * 2;

        debug!(
            "Audio HLE init: latency={:?}, block={} frames, tick={} cycles, host tick={} cycles",
            config.latency, profile.hw_block_size, intervals.audio_cycles, intervals.host_cycles
        );

        Self {
            channels: std::array::from_fn(|_| AudioChannel::new()),
            profile,
            intervals,
            mix_buffer: vec![0; block_len],
            mix_block: vec![0; block_len],
            output: OutputQueue::new(OUTPUT_QUEUE_CAPACITY),
            mix_frequency: HW_SAMPLE_RATE,
            audio_event,
            host_event,
        }
    }

    /// Release the mix accumulator and clear every channel
    ///
    /// Queued samples are discarded, nothing is flushed to the host. Ticks
    /// arriving after shutdown do nothing.
    pub fn shutdown(&mut self) {
        self.mix_buffer = Vec::new();
        self.mix_block = Vec::new();
        for chan in &mut self.channels {
            chan.clear();
        }
        debug!("Audio HLE shutdown");
    }

    pub fn profile(&self) -> &LatencyProfile {
        &self.profile
    }

    pub fn intervals(&self) -> TickIntervals {
        self.intervals
    }

    pub fn channel(&self, index: usize) -> Option<&AudioChannel> {
        self.channels.get(index)
    }

    pub fn channel_mut(&mut self, index: usize) -> Option<&mut AudioChannel> {
        self.channels.get_mut(index)
    }

    pub fn channels(&self) -> &[AudioChannel] {
        &self.channels
    }

    /// Release a channel: wake every waiter with "not reserved", then clear it
    pub fn release_channel<K: KernelThreads + ?Sized>(
        &mut self,
        index: usize,
        kernel: &mut K,
    ) -> Result<(), AudioError> {
        self.wake_channel(index, WakeReason::Released, kernel)?;
        if let Some(chan) = self.channels.get_mut(index) {
            chan.clear();
        }
        Ok(())
    }

    /// Record the host output frequency requested by the guest
    pub fn set_output_frequency(&mut self, freq: u32) {
        warn!("Switching audio frequency to {}", freq);
        self.mix_frequency = freq;
    }

    pub fn mix_frequency(&self) -> u32 {
        self.mix_frequency
    }

    /// Recompute tick intervals after the emulated CPU clock changed
    ///
    /// Queued audio is untouched; the new intervals apply from the next
    /// reschedule.
    pub fn on_clock_rate_change<T: CoreTiming + ?Sized>(&mut self, timing: &T) {
        self.intervals = TickIntervals::new(timing.cpu_hz(), &self.profile);
    }

    /// Route a fired event. Returns `false` if the event is not ours.
    pub fn handle_event<T, K, H>(
        &mut self,
        event: EventId,
        cycles_late: i64,
        timing: &mut T,
        kernel: &mut K,
        host: &mut H,
    ) -> bool
    where
        T: CoreTiming + ?Sized,
        K: KernelThreads + ?Sized,
        H: HostAudio + ?Sized,
    {
        if event == self.audio_event {
            self.on_audio_update(cycles_late, timing, kernel);
            true
        } else if event == self.host_event {
            self.on_host_update(cycles_late, timing, host);
            true
        } else {
            false
        }
    }

    /// Mix tick callback
    ///
    /// Reschedules itself first so time spent mixing does not skew the cadence.
    pub fn on_audio_update<T, K>(&mut self, cycles_late: i64, timing: &mut T, kernel: &mut K)
    where
        T: CoreTiming + ?Sized,
        K: KernelThreads + ?Sized,
    {
        timing.schedule_event(
            self.intervals.audio_cycles - cycles_late,
            self.audio_event,
            0,
        );
        self.update(kernel);
    }

    /// Host poll callback
    pub fn on_host_update<T, H>(&mut self, cycles_late: i64, timing: &mut T, host: &mut H)
    where
        T: CoreTiming + ?Sized,
        H: HostAudio + ?Sized,
    {
        timing.schedule_event(self.intervals.host_cycles - cycles_late, self.host_event, 0);
        host.update_sound();
    }

    /// Pull up to `num_frames` mixed stereo frames into `out`
    ///
    /// Host-thread entry point; see [`OutputPuller::mix`] for the underrun
    /// contract.
    pub fn mix(&self, out: &mut [i16], num_frames: usize) -> usize {
        self.output.puller().mix(out, num_frames)
    }

    /// Handle for the host audio thread
    pub fn puller(&self) -> OutputPuller {
        self.output.puller()
    }

    /// Samples waiting in the output queue
    pub fn queued_output_samples(&self) -> usize {
        self.output.len()
    }
}
