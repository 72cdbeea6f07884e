//! Host audio output using cpal
//!
//! Drains the output queue from the cpal callback thread through an
//! [`OutputPuller`]. Underruns are padded with silence.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, error, warn};

use crate::collab::HostAudio;
use crate::latency::HW_SAMPLE_RATE;
use crate::output::OutputPuller;

/// Failure to bring up the host audio device
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("no audio output device available")]
    NoDevice,

    #[error("failed to get default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build audio stream: {0}")]
    Build(#[from] cpal::BuildStreamError),

    #[error("failed to play audio stream: {0}")]
    Play(#[from] cpal::PlayStreamError),

    #[error("unsupported sample format: {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),
}

/// Default output device fed from the mixed output queue
pub struct CpalOutput {
    /// The cpal stream (kept alive for the duration)
    _stream: cpal::Stream,
    sample_rate: u32,
}

impl CpalOutput {
    /// Open the default output device as a stereo stream
    pub fn new(puller: OutputPuller) -> Result<Self, HostError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(HostError::NoDevice)?;
        let config = device.default_output_config()?;

        let sample_rate = config.sample_rate().0;
        if sample_rate != HW_SAMPLE_RATE {
            warn!(
                "Host device runs at {} Hz, audio is mixed at {} Hz",
                sample_rate, HW_SAMPLE_RATE
            );
        }

        let sample_format = config.sample_format();
        let mut stream_config: cpal::StreamConfig = config.into();
        stream_config.channels = 2;

        let stream = match sample_format {
            cpal::SampleFormat::I16 => device.build_output_stream(
                &stream_config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    let frames = puller.mix(data, data.len() / 2);
                    data[frames * 2..].fill(0);
                },
                |err| error!("Audio stream error: {}", err),
                None,
            )?,
            cpal::SampleFormat::F32 => {
                let mut temp_buffer: Vec<i16> = vec![0; 4096];
                device.build_output_stream(
                    &stream_config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        if temp_buffer.len() < data.len() {
                            temp_buffer.resize(data.len(), 0);
                        }
                        let frames = puller.mix(&mut temp_buffer[..data.len()], data.len() / 2);
                        let filled = frames * 2;
                        for (dst, &sample) in data.iter_mut().zip(&temp_buffer[..filled]) {
                            *dst = f32::from(sample) / 32768.0;
                        }
                        data[filled..].fill(0.0);
                    },
                    |err| error!("Audio stream error: {}", err),
                    None,
                )?
            }
            cpal::SampleFormat::U16 => {
                let mut temp_buffer: Vec<i16> = vec![0; 4096];
                device.build_output_stream(
                    &stream_config,
                    move |data: &mut [u16], _: &cpal::OutputCallbackInfo| {
                        if temp_buffer.len() < data.len() {
                            temp_buffer.resize(data.len(), 0);
                        }
                        let frames = puller.mix(&mut temp_buffer[..data.len()], data.len() / 2);
                        let filled = frames * 2;
                        for (dst, &sample) in data.iter_mut().zip(&temp_buffer[..filled]) {
                            *dst = (i32::from(sample) + 32768) as u16;
                        }
                        // 0x8000 is silence for unsigned samples
                        data[filled..].fill(32768);
                    },
                    |err| error!("Audio stream error: {}", err),
                    None,
                )?
            }
            other => return Err(HostError::UnsupportedFormat(other)),
        };

        stream.play()?;
        debug!("Audio stream started at {} Hz", sample_rate);

        Ok(Self {
            _stream: stream,
            sample_rate,
        })
    }

    /// Get the output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl HostAudio for CpalOutput {
    /// The device pulls on its own thread; nothing to service here
    fn update_sound(&mut self) {}
}
