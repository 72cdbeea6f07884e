//! Interfaces to the rest of the emulator
//!
//! The audio core does not own guest memory, guest threads, the event queue
//! or the host audio device. The surrounding emulator implements these
//! traits and passes them into each call that needs them.

/// Guest thread identifier (kernel object UID)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ThreadId(pub u32);

/// Periodic event handle issued by [`CoreTiming::register_event`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId(pub i32);

/// Wait categories used when parking guest threads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitType {
    /// Blocked until an audio channel queue drains
    AudioChannel,
}

/// Byte-addressable guest memory
///
/// Address validity is the implementor's concern; the core reads whatever it
/// is handed.
pub trait GuestMemory {
    /// Copy `dst.len()` bytes starting at `address`
    fn read_bytes(&self, address: u32, dst: &mut [u8]);

    /// Read one little-endian sample
    fn read_i16(&self, address: u32) -> i16 {
        let mut bytes = [0u8; 2];
        self.read_bytes(address, &mut bytes);
        i16::from_le_bytes(bytes)
    }
}

/// Cooperative guest thread scheduler
pub trait KernelThreads {
    /// Whether the current thread may be parked right now
    fn is_dispatch_enabled(&self) -> bool;

    fn current_thread(&self) -> ThreadId;

    /// Park the current thread until resumed, stashing `wait_value` as the
    /// value it will observe on a normal wake
    fn wait_current_thread(
        &mut self,
        wait_type: WaitType,
        wait_key: u32,
        wait_value: u32,
        reason: &'static str,
    );

    /// Key `thread` is parked under for `wait_type`, or `None` if it is not
    /// waiting there (woken by another path, or gone)
    fn wait_key(&self, thread: ThreadId, wait_type: WaitType) -> Option<u32>;

    /// Value stashed by [`Self::wait_current_thread`]
    fn wait_value(&self, thread: ThreadId) -> u32;

    /// Make `thread` runnable with `return_value` as its syscall result
    fn resume_thread(&mut self, thread: ThreadId, return_value: u32);

    /// Run a scheduling pass after threads were resumed
    fn reschedule(&mut self, reason: &'static str);
}

/// Emulated-time event scheduler
///
/// The emulator routes fired events back through
/// [`AudioHle::handle_event`](crate::AudioHle::handle_event) and reports CPU
/// clock changes through
/// [`AudioHle::on_clock_rate_change`](crate::AudioHle::on_clock_rate_change).
pub trait CoreTiming {
    /// Current emulated CPU clock in Hz
    fn cpu_hz(&self) -> u64;

    /// Register a named periodic event
    fn register_event(&mut self, name: &'static str) -> EventId;

    /// Re-bind a saved event id to its name after a save-state load
    fn restore_event(&mut self, event: EventId, name: &'static str);

    /// Fire `event` after `cycles` emulated cycles
    fn schedule_event(&mut self, cycles: i64, event: EventId, userdata: u64);
}

/// Host audio backend
pub trait HostAudio {
    /// Give the backend a chance to service its device; no data is passed
    fn update_sound(&mut self);
}
