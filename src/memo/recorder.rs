//! Single-take voice memo recorder.
//!
//! A take is written to a scratch WAV while recording and copied over the
//! memo file when stopped, so an interrupted take never clobbers the last
//! finished memo.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::meter::{LevelMeter, MeterReading};
use crate::constants::MEMO_FILE_NAME;
use crate::error::RecorderError;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    #[default]
    Idle,
    Recording,
    Paused,
    Finished,
}

pub struct MemoRecorder {
    state: RecorderState,
    sample_rate: u32,
    scratch_path: PathBuf,
    memo_path: PathBuf,
    writer: Option<WavWriter<BufWriter<File>>>,
    meter: LevelMeter,
    frames_written: u64,
}

impl MemoRecorder {
    /// Recorder that keeps its finished memo in `memo_dir`.
    pub fn new(memo_dir: &Path, sample_rate: u32) -> Self {
        let scratch = std::env::temp_dir().join(format!("stemloop-take-{}.wav", std::process::id()));
        Self::with_paths(scratch, memo_dir.join(MEMO_FILE_NAME), sample_rate)
    }

    pub fn with_paths(scratch_path: PathBuf, memo_path: PathBuf, sample_rate: u32) -> Self {
        Self {
            state: RecorderState::Idle,
            sample_rate,
            scratch_path,
            memo_path,
            writer: None,
            meter: LevelMeter::new(),
            frames_written: 0,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn memo_path(&self) -> &Path {
        &self.memo_path
    }

    /// Change the take sample rate. Only allowed between takes.
    pub fn set_sample_rate(&mut self, sample_rate: u32) -> Result<(), RecorderError> {
        match self.state {
            RecorderState::Idle | RecorderState::Finished => {
                self.sample_rate = sample_rate;
                Ok(())
            }
            state => Err(RecorderError::InvalidState {
                action: "change sample rate",
                state,
            }),
        }
    }

    /// Length of the current (or last) take.
    pub fn elapsed(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames_written as f64 / f64::from(self.sample_rate))
    }

    /// Start a new take, or resume a paused one.
    pub fn record(&mut self) -> Result<(), RecorderError> {
        match self.state {
            RecorderState::Idle | RecorderState::Finished => {
                let spec = WavSpec {
                    channels: 1,
                    sample_rate: self.sample_rate,
                    bits_per_sample: 16,
                    sample_format: SampleFormat::Int,
                };
                self.writer = Some(WavWriter::create(&self.scratch_path, spec)?);
                self.frames_written = 0;
                self.meter.reset();
                log::info!(
                    "Recording memo take to {} at {} Hz",
                    self.scratch_path.display(),
                    self.sample_rate
                );
            }
            RecorderState::Paused => log::info!("Resuming memo take"),
            RecorderState::Recording => {
                return Err(RecorderError::InvalidState {
                    action: "record",
                    state: self.state,
                });
            }
        }
        self.state = RecorderState::Recording;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), RecorderError> {
        if self.state != RecorderState::Recording {
            return Err(RecorderError::InvalidState {
                action: "pause",
                state: self.state,
            });
        }
        self.state = RecorderState::Paused;
        log::info!("Paused memo take at {:?}", self.elapsed());
        Ok(())
    }

    /// Finalize the take and publish it as the memo. Returns the memo path.
    pub fn stop(&mut self) -> Result<PathBuf, RecorderError> {
        if !matches!(
            self.state,
            RecorderState::Recording | RecorderState::Paused
        ) {
            return Err(RecorderError::InvalidState {
                action: "stop",
                state: self.state,
            });
        }

        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
        }

        if let Some(parent) = self.memo_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&self.scratch_path, &self.memo_path)?;
        if let Err(e) = fs::remove_file(&self.scratch_path) {
            log::warn!("Could not remove scratch take: {e}");
        }

        self.state = RecorderState::Finished;
        log::info!(
            "Saved memo ({:?}) to {}",
            self.elapsed(),
            self.memo_path.display()
        );
        Ok(self.memo_path.clone())
    }

    /// Append captured mono samples. Ignored unless recording.
    pub fn push_samples(&mut self, samples: &[f32]) -> Result<(), RecorderError> {
        if self.state != RecorderState::Recording {
            return Ok(());
        }

        self.meter.push(samples);
        if let Some(writer) = self.writer.as_mut() {
            for &sample in samples {
                writer.write_sample(to_i16(sample))?;
            }
            self.frames_written += samples.len() as u64;
        }
        Ok(())
    }

    /// Meter reading since the last call. Silent unless recording.
    pub fn meter(&mut self) -> MeterReading {
        if self.state != RecorderState::Recording {
            return MeterReading::SILENT;
        }
        self.meter.update()
    }
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn recorder(dir: &TempDir) -> MemoRecorder {
        MemoRecorder::with_paths(
            dir.path().join("take.wav"),
            dir.path().join("memos").join(MEMO_FILE_NAME),
            8_000,
        )
    }

    #[test]
    fn test_record_pause_stop_writes_memo() {
        let dir = TempDir::new().unwrap();
        let mut recorder = recorder(&dir);

        recorder.record().unwrap();
        recorder.push_samples(&[0.5; 4_000]).unwrap();
        recorder.pause().unwrap();
        recorder.push_samples(&[0.5; 4_000]).unwrap();
        recorder.record().unwrap();
        recorder.push_samples(&[-0.5; 4_000]).unwrap();
        let path = recorder.stop().unwrap();

        assert_eq!(recorder.state(), RecorderState::Finished);
        assert_eq!(recorder.elapsed(), Duration::from_secs(1));
        assert!(!dir.path().join("take.wav").exists());

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 8_000);
        assert_eq!(reader.spec().bits_per_sample, 16);
        assert_eq!(reader.len(), 8_000);
    }

    #[test]
    fn test_invalid_transitions() {
        let dir = TempDir::new().unwrap();
        let mut recorder = recorder(&dir);

        assert!(matches!(
            recorder.pause(),
            Err(RecorderError::InvalidState { action: "pause", .. })
        ));
        assert!(matches!(
            recorder.stop(),
            Err(RecorderError::InvalidState { action: "stop", .. })
        ));

        recorder.record().unwrap();
        assert!(matches!(
            recorder.record(),
            Err(RecorderError::InvalidState {
                state: RecorderState::Recording,
                ..
            })
        ));
        assert!(recorder.set_sample_rate(48_000).is_err());
    }

    #[test]
    fn test_new_take_overwrites_memo() {
        let dir = TempDir::new().unwrap();
        let mut recorder = recorder(&dir);

        recorder.record().unwrap();
        recorder.push_samples(&[0.1; 800]).unwrap();
        recorder.stop().unwrap();

        recorder.record().unwrap();
        recorder.push_samples(&[0.1; 80]).unwrap();
        let path = recorder.stop().unwrap();

        assert_eq!(hound::WavReader::open(path).unwrap().len(), 80);
    }

    #[test]
    fn test_meter_only_while_recording() {
        let dir = TempDir::new().unwrap();
        let mut recorder = recorder(&dir);

        recorder.push_samples(&[1.0; 100]).unwrap();
        assert_eq!(recorder.meter(), MeterReading::SILENT);

        recorder.record().unwrap();
        recorder.push_samples(&[1.0; 100]).unwrap();
        let reading = recorder.meter();
        assert!(reading.peak_db > -0.01);
    }

    #[test]
    fn test_sample_conversion_clamps() {
        assert_eq!(to_i16(0.0), 0);
        assert_eq!(to_i16(1.0), i16::MAX);
        assert_eq!(to_i16(2.0), i16::MAX);
        assert_eq!(to_i16(-2.0), -i16::MAX);
    }
}
