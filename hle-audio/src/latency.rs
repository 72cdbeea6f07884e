//! Latency presets and tick timing
//!
//! The only configurable setting is the latency preset, which fixes the mix
//! block size, the host polling cadence and the channel queue watermarks.

use serde::{Deserialize, Serialize};

/// Hardware output sample rate in Hz
pub const HW_SAMPLE_RATE: u32 = 44_100;

/// Latency preset selected at init
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioLatency {
    Low,
    #[default]
    Medium,
    High,
}

/// Block sizes and watermark factors derived from an [`AudioLatency`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyProfile {
    /// Stereo frames mixed per audio tick
    pub hw_block_size: usize,
    /// Stereo frames the host is expected to consume per poll
    pub host_attempt_block_size: usize,
    /// High watermark divisor (recorded, not consulted by the mixer)
    pub queue_max_factor: usize,
    /// Low watermark divisor used for blocking thresholds
    pub queue_min_factor: usize,
}

impl LatencyProfile {
    pub const fn for_latency(latency: AudioLatency) -> Self {
        match latency {
            AudioLatency::Low => Self {
                hw_block_size: 16,
                host_attempt_block_size: 256,
                queue_max_factor: 1,
                queue_min_factor: 1,
            },
            AudioLatency::Medium => Self {
                hw_block_size: 64,
                host_attempt_block_size: 512,
                queue_max_factor: 2,
                queue_min_factor: 1,
            },
            AudioLatency::High => Self {
                hw_block_size: 64,
                host_attempt_block_size: 512,
                queue_max_factor: 4,
                queue_min_factor: 2,
            },
        }
    }
}

impl From<AudioLatency> for LatencyProfile {
    fn from(latency: AudioLatency) -> Self {
        Self::for_latency(latency)
    }
}

/// Audio configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Latency preset (default: medium)
    #[serde(default)]
    pub latency: AudioLatency,
}

impl AudioConfig {
    pub fn new(latency: AudioLatency) -> Self {
        Self { latency }
    }

    /// Parse from TOML text, e.g. `latency = "high"`
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn profile(&self) -> LatencyProfile {
        LatencyProfile::from(self.latency)
    }
}

/// Emulated-cycle intervals of the two periodic audio events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickIntervals {
    /// Cycles between mix ticks
    pub audio_cycles: i64,
    /// Cycles between host polls
    pub host_cycles: i64,
}

impl TickIntervals {
    /// Derive both intervals from the emulated CPU clock
    pub fn new(cpu_hz: u64, profile: &LatencyProfile) -> Self {
        Self {
            audio_cycles: cycles_for_frames(cpu_hz, profile.hw_block_size),
            host_cycles: cycles_for_frames(cpu_hz, profile.host_attempt_block_size),
        }
    }
}

/// Cycles it takes the hardware to play `frames` at [`HW_SAMPLE_RATE`]
fn cycles_for_frames(cpu_hz: u64, frames: usize) -> i64 {
    let cycles = u128::from(cpu_hz) * frames as u128 / u128::from(HW_SAMPLE_RATE);
    i64::try_from(cycles).unwrap_or(i64::MAX)
}
