//! Whole-file decoding into interleaved f32 buffers.
//!
//! WAV goes through hound and FLAC through claxon; anything else is handed
//! to rodio's decoder. Tracks are fully decoded up front so that a scheduled
//! start never waits on disk or codec work.

use rayon::prelude::*;
use rodio::Source;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::LoadError;

/// Fully decoded, interleaved audio content.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Arc<[f32]>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Number of frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }
}

/// Decode every source in parallel. Any failure fails the whole batch.
pub fn decode_all(sources: &[String]) -> Result<Vec<DecodedAudio>, LoadError> {
    sources.par_iter().map(|source| decode_source(source)).collect()
}

/// Resolve a source identifier (a path, `~` allowed) and decode it.
pub fn decode_source(source: &str) -> Result<DecodedAudio, LoadError> {
    let expanded = shellexpand::tilde(source);
    let path = Path::new(expanded.as_ref());

    if !path.exists() {
        return Err(LoadError::NotFound(source.to_string()));
    }

    let started = Instant::now();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let audio = match ext.as_str() {
        "wav" => decode_wav(path)?,
        "flac" => decode_flac(path)?,
        _ => decode_other(path, &ext)?,
    };

    if audio.channels == 0 || audio.frames() == 0 {
        return Err(LoadError::Empty(source.to_string()));
    }
    if audio.sample_rate == 0 {
        return Err(LoadError::Decode {
            path: source.to_string(),
            message: "sample rate is 0 Hz".to_string(),
        });
    }

    log::info!(
        "Decoded {}: {} Hz, {} channels, {:?} in {:?}",
        source,
        audio.sample_rate,
        audio.channels,
        audio.duration(),
        started.elapsed()
    );

    Ok(audio)
}

fn decode_error(path: &Path, err: impl std::fmt::Display) -> LoadError {
    LoadError::Decode {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

/// Full-scale divisor for signed integer samples of the given bit depth.
fn int_scale(path: &Path, bits_per_sample: u32) -> Result<f32, LoadError> {
    if bits_per_sample == 0 || bits_per_sample > 32 {
        return Err(decode_error(
            path,
            format!("Unsupported bit depth: {bits_per_sample}"),
        ));
    }
    Ok((1_u64 << (bits_per_sample - 1)) as f32)
}

fn decode_wav(path: &Path) -> Result<DecodedAudio, LoadError> {
    let reader = hound::WavReader::open(path).map_err(|e| decode_error(path, e))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| decode_error(path, e))?,
        hound::SampleFormat::Int => {
            let scale = int_scale(path, spec.bits_per_sample as u32)?;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| decode_error(path, e))?
        }
    };

    Ok(DecodedAudio {
        samples: samples.into(),
        channels: spec.channels,
        sample_rate: spec.sample_rate,
    })
}

fn decode_flac(path: &Path) -> Result<DecodedAudio, LoadError> {
    let mut reader = claxon::FlacReader::open(path).map_err(|e| decode_error(path, e))?;
    let info = reader.streaminfo();
    let scale = int_scale(path, info.bits_per_sample)?;

    let samples: Vec<f32> = reader
        .samples()
        .map(|s| s.map(|v| v as f32 / scale))
        .collect::<Result<_, _>>()
        .map_err(|e| decode_error(path, e))?;

    Ok(DecodedAudio {
        samples: samples.into(),
        channels: info.channels as u16,
        sample_rate: info.sample_rate,
    })
}

fn decode_other(path: &Path, ext: &str) -> Result<DecodedAudio, LoadError> {
    let file = File::open(path).map_err(|e| decode_error(path, e))?;
    let decoder = match rodio::Decoder::new(BufReader::new(file)) {
        Ok(decoder) => decoder,
        Err(rodio::decoder::DecoderError::UnrecognizedFormat) => {
            return Err(LoadError::Unsupported {
                path: path.display().to_string(),
                extension: ext.to_string(),
            });
        }
        Err(e) => return Err(decode_error(path, e)),
    };

    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    let samples: Vec<f32> = decoder.collect();

    Ok(DecodedAudio {
        samples: samples.into(),
        channels,
        sample_rate,
    })
}
