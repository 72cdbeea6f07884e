//! Shared test utilities: in-memory collaborators

use crate::collab::{
    CoreTiming, EventId, GuestMemory, HostAudio, KernelThreads, ThreadId, WaitType,
};

// ============================================================================
// Guest Memory
// ============================================================================

/// Flat guest memory window starting at `base`; reads outside it return zeros
pub struct FlatMemory {
    pub base: u32,
    pub bytes: Vec<u8>,
}

impl FlatMemory {
    pub fn from_samples(base: u32, samples: &[i16]) -> Self {
        Self {
            base,
            bytes: samples.iter().flat_map(|s| s.to_le_bytes()).collect(),
        }
    }
}

impl GuestMemory for FlatMemory {
    fn read_bytes(&self, address: u32, dst: &mut [u8]) {
        let start = address.wrapping_sub(self.base) as usize;
        for (i, byte) in dst.iter_mut().enumerate() {
            *byte = self.bytes.get(start + i).copied().unwrap_or(0);
        }
    }
}

// ============================================================================
// Kernel Threads
// ============================================================================

/// A parked thread in [`MockKernel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parked {
    pub thread: ThreadId,
    pub key: u32,
    pub value: u32,
}

/// Records parks, resumes and reschedules
pub struct MockKernel {
    pub dispatch_enabled: bool,
    pub current: ThreadId,
    pub parked: Vec<Parked>,
    pub resumed: Vec<(ThreadId, u32)>,
    pub reschedules: usize,
}

impl MockKernel {
    pub fn new(current: ThreadId) -> Self {
        Self {
            dispatch_enabled: true,
            current,
            parked: Vec::new(),
            resumed: Vec::new(),
            reschedules: 0,
        }
    }

    /// Park a thread directly, bypassing the current-thread path
    pub fn park(&mut self, thread: ThreadId, key: u32, value: u32) {
        self.parked.push(Parked { thread, key, value });
    }

    /// Thread leaves its wait without being resumed by the audio core
    pub fn kill(&mut self, thread: ThreadId) {
        self.parked.retain(|p| p.thread != thread);
    }

    pub fn is_parked(&self, thread: ThreadId) -> bool {
        self.parked.iter().any(|p| p.thread == thread)
    }
}

impl KernelThreads for MockKernel {
    fn is_dispatch_enabled(&self) -> bool {
        self.dispatch_enabled
    }

    fn current_thread(&self) -> ThreadId {
        self.current
    }

    fn wait_current_thread(
        &mut self,
        _wait_type: WaitType,
        wait_key: u32,
        wait_value: u32,
        _reason: &'static str,
    ) {
        self.park(self.current, wait_key, wait_value);
    }

    fn wait_key(&self, thread: ThreadId, _wait_type: WaitType) -> Option<u32> {
        self.parked.iter().find(|p| p.thread == thread).map(|p| p.key)
    }

    fn wait_value(&self, thread: ThreadId) -> u32 {
        self.parked
            .iter()
            .find(|p| p.thread == thread)
            .map(|p| p.value)
            .unwrap_or(0)
    }

    fn resume_thread(&mut self, thread: ThreadId, return_value: u32) {
        self.parked.retain(|p| p.thread != thread);
        self.resumed.push((thread, return_value));
    }

    fn reschedule(&mut self, _reason: &'static str) {
        self.reschedules += 1;
    }
}

// ============================================================================
// Core Timing
// ============================================================================

/// Hands out sequential event ids and records every schedule call
pub struct MockTiming {
    pub cpu_hz: u64,
    pub registered: Vec<&'static str>,
    pub restored: Vec<(EventId, &'static str)>,
    pub scheduled: Vec<(i64, EventId)>,
}

impl Default for MockTiming {
    fn default() -> Self {
        Self {
            cpu_hz: 222_000_000,
            registered: Vec::new(),
            restored: Vec::new(),
            scheduled: Vec::new(),
        }
    }
}

impl CoreTiming for MockTiming {
    fn cpu_hz(&self) -> u64 {
        self.cpu_hz
    }

    fn register_event(&mut self, name: &'static str) -> EventId {
        self.registered.push(name);
        EventId(self.registered.len() as i32)
    }

    fn restore_event(&mut self, event: EventId, name: &'static str) {
        self.restored.push((event, name));
    }

    fn schedule_event(&mut self, cycles: i64, event: EventId, _userdata: u64) {
        self.scheduled.push((cycles, event));
    }
}

// ============================================================================
// Host Audio
// ============================================================================

#[derive(Default)]
pub struct CountingHost {
    pub polls: usize,
}

impl HostAudio for CountingHost {
    fn update_sound(&mut self) {
        self.polls += 1;
    }
}
