//! Microphone capture through cpal.
//!
//! The input callback downmixes each buffer to mono f32 and sends it to the
//! control thread, which owns the recorder.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream};
use std::sync::mpsc;

use crate::error::RecorderError;

pub struct InputCapture {
    _stream: Stream,
    sample_rate: u32,
    device_name: String,
}

impl InputCapture {
    /// Open the default input device and start streaming into `samples`.
    pub fn open(samples: mpsc::Sender<Vec<f32>>) -> Result<Self, RecorderError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| RecorderError::Device("no input device available".to_string()))?;
        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());

        let supported = device
            .default_input_config()
            .map_err(|e| RecorderError::Device(e.to_string()))?;
        let channels = usize::from(supported.channels());
        let sample_rate = supported.sample_rate().0;
        let format = supported.sample_format();
        let config = supported.config();

        let err_fn = |err: cpal::StreamError| log::error!("Input stream error: {err}");

        let stream = match format {
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let _ = samples.send(downmix(data, channels, |s| s));
                },
                err_fn,
                None,
            ),
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let _ = samples.send(downmix(data, channels, |s| f32::from(s) / 32_768.0));
                },
                err_fn,
                None,
            ),
            SampleFormat::U16 => device.build_input_stream(
                &config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    let _ = samples.send(downmix(data, channels, |s| {
                        (f32::from(s) - 32_768.0) / 32_768.0
                    }));
                },
                err_fn,
                None,
            ),
            other => {
                return Err(RecorderError::Device(format!(
                    "unsupported input sample format: {other}"
                )));
            }
        }
        .map_err(|e| RecorderError::Device(e.to_string()))?;

        stream
            .play()
            .map_err(|e| RecorderError::Device(e.to_string()))?;

        log::info!("Capturing from {device_name}: {sample_rate} Hz, {channels} channels, {format}");

        Ok(Self {
            _stream: stream,
            sample_rate,
            device_name,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

/// Average interleaved frames down to one channel.
pub fn downmix<T: Copy>(data: &[T], channels: usize, convert: impl Fn(T) -> f32) -> Vec<f32> {
    let channels = channels.max(1);
    data.chunks(channels)
        .map(|frame| frame.iter().map(|&s| convert(s)).sum::<f32>() / frame.len() as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_stereo() {
        let mono = downmix(&[0.5_f32, -0.5, 1.0, 0.0], 2, |s| s);
        assert_eq!(mono, vec![0.0, 0.5]);
    }

    #[test]
    fn test_downmix_mono_passthrough() {
        let mono = downmix(&[16_384_i16, -16_384], 1, |s| f32::from(s) / 32_768.0);
        assert_eq!(mono, vec![0.5, -0.5]);
    }
}
