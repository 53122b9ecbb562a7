//! rodio-backed track handles.
//!
//! Each track owns one `Sink` that stays running for the lifetime of the
//! track with a single never-ending [`LoopSource`] queued. Transport commands
//! only touch the shared [`TrackControls`], so starting and stopping never
//! rebuilds the sink or re-queues audio.

use rodio::mixer::Mixer;
use rodio::{OutputStream, OutputStreamBuilder, Sink};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::decode::{self, DecodedAudio};
use super::source::{LoopSource, TrackControls};
use crate::error::LoadError;
use crate::looper::{TrackHandle, TrackLoader};

/// Default audio output device. Must outlive every track created from it.
pub struct AudioOutput {
    stream: OutputStream,
}

impl AudioOutput {
    pub fn open_default() -> Result<Self, LoadError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| LoadError::Output(e.to_string()))?;
        stream.log_on_drop(false);
        Ok(Self { stream })
    }

    pub fn mixer(&self) -> &Mixer {
        self.stream.mixer()
    }
}

pub struct RodioTrack {
    sink: Sink,
    controls: Arc<TrackControls>,
    sample_rate: u32,
    duration: Duration,
}

impl RodioTrack {
    pub fn new(mixer: &Mixer, audio: DecodedAudio) -> Self {
        let controls = Arc::new(TrackControls::new());
        let sample_rate = audio.sample_rate;
        let duration = audio.duration();

        let sink = Sink::connect_new(mixer);
        sink.append(LoopSource::new(audio, controls.clone()));
        sink.play();

        Self {
            sink,
            controls,
            sample_rate,
            duration,
        }
    }
}

impl TrackHandle for RodioTrack {
    fn play_at(&mut self, deadline: Instant) -> Result<(), String> {
        if self.sink.empty() {
            return Err("track source is no longer queued".to_string());
        }
        self.controls.schedule(deadline);
        Ok(())
    }

    fn stop(&mut self) {
        self.controls.halt();
    }

    fn rewind(&mut self) {
        self.controls.request_rewind();
    }

    fn set_pan(&mut self, pan: f32) {
        self.controls.set_pan(pan);
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }

    fn set_rate(&mut self, rate: f32) {
        self.sink.set_speed(rate);
    }

    fn is_playing(&self) -> bool {
        self.controls.is_scheduled()
    }

    fn position(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.controls.frame() as f64 / self.sample_rate as f64)
    }

    fn duration(&self) -> Duration {
        self.duration
    }
}

/// Loads file paths into [`RodioTrack`]s on one output device.
pub struct RodioLoader<'a> {
    output: &'a AudioOutput,
}

impl<'a> RodioLoader<'a> {
    pub fn new(output: &'a AudioOutput) -> Self {
        Self { output }
    }
}

impl TrackLoader for RodioLoader<'_> {
    type Handle = RodioTrack;

    fn load_all(&self, sources: &[String]) -> Result<Vec<RodioTrack>, LoadError> {
        let decoded = decode::decode_all(sources)?;

        let rates: Vec<u32> = decoded.iter().map(|a| a.sample_rate).collect();
        if rates.windows(2).any(|pair| pair[0] != pair[1]) {
            log::warn!("Tracks have differing sample rates: {rates:?}");
        }

        Ok(decoded
            .into_iter()
            .map(|audio| RodioTrack::new(self.output.mixer(), audio))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn is_ci_environment() -> bool {
        std::env::var("CI").is_ok()
            || std::env::var("GITHUB_ACTIONS").is_ok()
            || std::env::var("TRAVIS").is_ok()
            || std::env::var("CIRCLECI").is_ok()
    }

    fn open_output() -> Option<AudioOutput> {
        if is_ci_environment() {
            eprintln!("Skipping audio test in CI environment");
            return None;
        }
        AudioOutput::open_default().ok()
    }

    fn write_loop(dir: &TempDir, name: &str) -> String {
        let path = dir.path().join(name);
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..4_410 {
            writer.write_sample(0_i16).unwrap();
        }
        writer.finalize().unwrap();
        path.to_string_lossy().to_string()
    }

    #[test]
    fn test_load_and_control_tracks() {
        let Some(output) = open_output() else {
            return;
        };
        let dir = TempDir::new().unwrap();
        let sources = vec![write_loop(&dir, "a.wav"), write_loop(&dir, "b.wav")];

        let mut tracks = RodioLoader::new(&output).load_all(&sources).unwrap();
        assert_eq!(tracks.len(), 2);

        // Far enough out that the render thread never reaches it.
        let deadline = Instant::now() + Duration::from_secs(60);
        for track in &mut tracks {
            assert_eq!(track.duration(), Duration::from_millis(100));
            track.play_at(deadline).unwrap();
            assert!(track.is_playing());
            track.set_pan(0.5);
            track.set_volume(0.5);
            track.set_rate(1.5);
        }

        for track in &mut tracks {
            track.stop();
            track.rewind();
            assert!(!track.is_playing());
            assert_eq!(track.position(), Duration::ZERO);
        }
    }

    #[test]
    fn test_load_missing_file_fails() {
        let Some(output) = open_output() else {
            return;
        };
        let result = RodioLoader::new(&output).load_all(&["/nonexistent/file.wav".to_string()]);
        assert!(matches!(result, Err(LoadError::NotFound(_))));
    }
}
