//! CPAL output engine.
//!
//! Owns the output stream and drives a [`Renderer`] from the device's
//! audio callback. Optional: hosts that schedule their own real-time
//! callback can call [`Renderer::render`] directly instead.

use crate::config::PlayerDesc;
use crate::error::{Result, SwapdeckError};
use crate::render::Renderer;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};

pub struct AudioEngine {
    desc: PlayerDesc,
    stream: Option<cpal::Stream>,
}

impl AudioEngine {
    pub fn new(desc: PlayerDesc) -> Self {
        Self { desc, stream: None }
    }

    /// Opens the default output device and starts rendering.
    ///
    /// The renderer moves into the audio callback; the callback clears
    /// its buffer each block, so a missing source plays silence.
    pub fn start(&mut self, renderer: Renderer) -> Result<()> {
        if self.stream.is_some() {
            return Err(SwapdeckError::Engine("engine already started".into()));
        }

        let host = cpal::default_host();
        let device = host.default_output_device().ok_or_else(|| {
            SwapdeckError::AudioDevice("no default output device available".into())
        })?;

        let config = cpal::StreamConfig {
            channels: self.desc.channels,
            sample_rate: cpal::SampleRate(self.desc.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(self.desc.block_size as u32),
        };

        let default_config = device.default_output_config().map_err(|e| {
            SwapdeckError::AudioDevice(format!("failed to get default config: {}", e))
        })?;

        let stream = match default_config.sample_format() {
            cpal::SampleFormat::F32 => self.build_stream::<f32>(&device, &config, renderer)?,
            cpal::SampleFormat::I16 => self.build_stream::<i16>(&device, &config, renderer)?,
            cpal::SampleFormat::U16 => self.build_stream::<u16>(&device, &config, renderer)?,
            _ => {
                return Err(SwapdeckError::AudioFormat(
                    "unsupported sample format".into(),
                ));
            }
        };

        stream
            .play()
            .map_err(|e| SwapdeckError::AudioDevice(format!("failed to start stream: {}", e)))?;

        self.stream = Some(stream);
        Ok(())
    }

    /// Stops and drops the output stream.
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
        }
    }

    pub fn is_running(&self) -> bool {
        self.stream.is_some()
    }

    pub fn desc(&self) -> &PlayerDesc {
        &self.desc
    }

    fn build_stream<T>(
        &self,
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        mut renderer: Renderer,
    ) -> Result<cpal::Stream>
    where
        T: SizedSample + FromSample<f32>,
    {
        // Reused across callbacks; grows at most once if the device picks
        // a larger block than configured.
        let mut scratch: Vec<f32> =
            Vec::with_capacity(self.desc.block_size * self.desc.channels as usize);

        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    scratch.clear();
                    scratch.resize(data.len(), 0.0);
                    renderer.render(&mut scratch);
                    for (out, &sample) in data.iter_mut().zip(scratch.iter()) {
                        *out = T::from_sample(sample);
                    }
                },
                move |err| {
                    log::error!("audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| SwapdeckError::AudioDevice(format!("failed to build stream: {}", e)))?;

        Ok(stream)
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
