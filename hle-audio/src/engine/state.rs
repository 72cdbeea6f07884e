//! Save-state support
//!
//! Layout (section `sceAudio`, version 1):
//! event ids, mix frequency, output queue, channel count, then one
//! `AudioChannel` section per channel. Queues are stored as their occupied
//! samples in playback order; cursors restart at zero on load.

use std::io::{Read, Write};

use tracing::error;

use super::{AUDIO_EVENT_NAME, AudioHle, HOST_EVENT_NAME};
use crate::channel::{AudioChannel, CHANNEL_COUNT, ChannelFormat, WaitInfo};
use crate::collab::{CoreTiming, EventId, ThreadId};
use crate::error::StateError;
use crate::latency::TickIntervals;
use crate::output::OUTPUT_QUEUE_CAPACITY;
use crate::savestate::{StateReader, StateWriter};

const SECTION: &str = "sceAudio";
const SECTION_VERSION: u8 = 1;
const CHANNEL_SECTION: &str = "AudioChannel";
const CHANNEL_SECTION_VERSION: u8 = 1;
const QUEUE_MARKER: &str = "FixedSizeQueueLR";

/// Log and build an incompatibility error
fn incompatible(what: &'static str, saved: usize, expected: usize) -> StateError {
    error!(
        "Savestate failure: incompatible {} (saved {}, expected {})",
        what, saved, expected
    );
    StateError::Incompatible {
        what,
        saved,
        expected,
    }
}

/// Read a stereo queue image; a trailing half frame is rejected
fn read_frames<R: Read>(
    reader: &mut StateReader<R>,
    what: &'static str,
    capacity: usize,
) -> Result<Vec<i16>, StateError> {
    let samples = reader.read_samples(what, capacity)?;
    if samples.len() % 2 != 0 {
        return Err(incompatible(what, samples.len(), samples.len() & !1));
    }
    Ok(samples)
}

impl AudioHle {
    /// Serialize all in-flight audio state
    pub fn save_state<W: Write>(&self, writer: &mut StateWriter<W>) -> Result<(), StateError> {
        writer.section(SECTION, SECTION_VERSION)?;
        writer.write_i32(self.audio_event.0)?;
        writer.write_i32(self.host_event.0)?;
        writer.write_u32(self.mix_frequency)?;

        writer.write_len(self.output.capacity())?;
        writer.write_samples(self.output.snapshot().into_iter())?;
        writer.marker(QUEUE_MARKER)?;

        writer.write_len(self.channels.len())?;
        for chan in &self.channels {
            save_channel(chan, writer)?;
        }
        Ok(())
    }

    /// Restore state written by [`Self::save_state`]
    ///
    /// Event ids are re-bound by name and tick intervals recomputed from the
    /// current clock. On error, state restored before the failure point is
    /// kept; the caller should abandon the load.
    pub fn load_state<R, T>(
        &mut self,
        reader: &mut StateReader<R>,
        timing: &mut T,
    ) -> Result<(), StateError>
    where
        R: Read,
        T: CoreTiming + ?Sized,
    {
        reader.section(SECTION, SECTION_VERSION)?;

        self.audio_event = EventId(reader.read_i32()?);
        timing.restore_event(self.audio_event, AUDIO_EVENT_NAME);
        self.host_event = EventId(reader.read_i32()?);
        timing.restore_event(self.host_event, HOST_EVENT_NAME);

        self.mix_frequency = reader.read_u32()?;

        let capacity = reader.read_len()?;
        if capacity != OUTPUT_QUEUE_CAPACITY {
            return Err(incompatible(
                "output queue capacity",
                capacity,
                OUTPUT_QUEUE_CAPACITY,
            ));
        }
        let samples = read_frames(reader, "output queue contents", capacity)?;
        reader.marker(QUEUE_MARKER)?;
        self.output.restore(&samples);

        let count = reader.read_len()?;
        if count != CHANNEL_COUNT {
            return Err(incompatible("channel count", count, CHANNEL_COUNT));
        }
        for chan in &mut self.channels {
            load_channel(chan, reader)?;
        }

        self.intervals = TickIntervals::new(timing.cpu_hz(), &self.profile);
        Ok(())
    }
}

fn save_channel<W: Write>(
    chan: &AudioChannel,
    writer: &mut StateWriter<W>,
) -> Result<(), StateError> {
    writer.section(CHANNEL_SECTION, CHANNEL_SECTION_VERSION)?;
    writer.write_bool(chan.reserved)?;
    writer.write_u32(chan.sample_address)?;
    writer.write_u32(chan.sample_count)?;
    writer.write_u32(chan.left_volume)?;
    writer.write_u32(chan.right_volume)?;
    writer.write_u32(chan.format.code())?;

    writer.write_len(chan.waiting.len())?;
    for info in &chan.waiting {
        writer.write_u32(info.thread.0)?;
        writer.write_i32(info.remaining)?;
    }

    writer.write_len(chan.queue.capacity())?;
    writer.write_samples(chan.queue.iter())?;
    Ok(())
}

fn load_channel<R: Read>(
    chan: &mut AudioChannel,
    reader: &mut StateReader<R>,
) -> Result<(), StateError> {
    reader.section(CHANNEL_SECTION, CHANNEL_SECTION_VERSION)?;
    let reserved = reader.read_bool()?;
    let sample_address = reader.read_u32()?;
    let sample_count = reader.read_u32()?;
    let left_volume = reader.read_u32()?;
    let right_volume = reader.read_u32()?;
    let code = reader.read_u32()?;
    let format = ChannelFormat::from_code(code).ok_or(StateError::InvalidFormat(code))?;

    let waits = reader.read_len()?;
    let mut waiting = Vec::with_capacity(waits.min(64));
    for _ in 0..waits {
        let thread = ThreadId(reader.read_u32()?);
        let remaining = reader.read_i32()?;
        waiting.push(WaitInfo { thread, remaining });
    }

    let capacity = reader.read_len()?;
    if capacity != chan.queue.capacity() {
        return Err(incompatible(
            "channel queue capacity",
            capacity,
            chan.queue.capacity(),
        ));
    }
    let samples = read_frames(reader, "channel queue contents", capacity)?;

    chan.reserved = reserved;
    chan.sample_address = sample_address;
    chan.sample_count = sample_count;
    chan.left_volume = left_volume;
    chan.right_volume = right_volume;
    chan.format = format;
    chan.waiting = waiting;
    chan.queue.clear();
    chan.queue.extend_from_slice(&samples);
    Ok(())
}
