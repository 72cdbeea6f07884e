//! Error types
//!
//! [`AudioError`] values are guest-visible: each maps to the 32-bit status
//! word the guest syscall returns. [`StateError`] covers save-state loading.

/// Guest-visible audio failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AudioError {
    /// Non-blocking enqueue onto a channel that still has queued samples
    #[error("audio channel busy")]
    ChannelBusy,

    /// Blocking enqueue while thread dispatch is disabled (samples were still queued)
    #[error("cannot wait: thread dispatch disabled")]
    CannotWait,

    /// Channel was released while a thread waited on it
    #[error("audio channel not reserved")]
    ChannelNotReserved,

    /// Channel index outside the hardware range
    #[error("invalid audio channel")]
    InvalidChannel,
}

impl AudioError {
    /// Guest status word
    pub fn code(self) -> u32 {
        match self {
            Self::ChannelBusy => 0x8026_0002,
            Self::CannotWait => 0x8002_01A7,
            Self::ChannelNotReserved => 0x8026_0008,
            Self::InvalidChannel => 0x8026_0003,
        }
    }
}

/// Save-state load failure
///
/// An incompatibility aborts the section it was found in; anything restored
/// before it is kept, so callers must abandon the whole load.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("save-state I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("expected section {expected:?}, found {found:?}")]
    SectionMismatch { expected: &'static str, found: String },

    #[error("section {name:?} version {version} not supported (max {max})")]
    UnsupportedVersion {
        name: &'static str,
        version: u8,
        max: u8,
    },

    #[error("missing marker {0:?}")]
    MarkerMismatch(&'static str),

    #[error("incompatible {what}: saved {saved}, expected {expected}")]
    Incompatible {
        what: &'static str,
        saved: usize,
        expected: usize,
    },

    #[error("invalid channel format {0:#x}")]
    InvalidFormat(u32),
}
