//! In-memory track handles for exercising the looper without an audio device.

use std::time::{Duration, Instant};

use super::track::{TrackHandle, TrackLoader};
use crate::error::LoadError;

#[derive(Debug, Default)]
pub struct FakeTrack {
    pub playing: bool,
    pub position: Duration,
    pub pan: f32,
    pub volume: f32,
    pub rate: f32,
    pub start_commands: Vec<Instant>,
    pub stop_commands: usize,
    pub reject_start: bool,
}

impl TrackHandle for FakeTrack {
    fn play_at(&mut self, deadline: Instant) -> Result<(), String> {
        if self.reject_start {
            return Err("device busy".to_string());
        }
        self.start_commands.push(deadline);
        self.playing = true;
        // Pretend some audio has already been rendered.
        self.position = Duration::from_millis(250);
        Ok(())
    }

    fn stop(&mut self) {
        self.stop_commands += 1;
        self.playing = false;
    }

    fn rewind(&mut self) {
        self.position = Duration::ZERO;
    }

    fn set_pan(&mut self, pan: f32) {
        self.pan = pan;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn set_rate(&mut self, rate: f32) {
        self.rate = rate;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn position(&self) -> Duration {
        self.position
    }

    fn duration(&self) -> Duration {
        Duration::from_secs(4)
    }
}

#[derive(Debug, Default)]
pub struct FakeLoader {
    fail_on: Option<String>,
    drop_last: bool,
}

impl FakeLoader {
    pub fn failing_on(source: &str) -> Self {
        Self {
            fail_on: Some(source.to_string()),
            ..Self::default()
        }
    }

    /// Loads everything but hands back one track fewer than asked for.
    pub fn dropping_last() -> Self {
        Self {
            drop_last: true,
            ..Self::default()
        }
    }
}

impl TrackLoader for FakeLoader {
    type Handle = FakeTrack;

    fn load_all(&self, sources: &[String]) -> Result<Vec<FakeTrack>, LoadError> {
        sources
            .iter()
            .map(|source| {
                if self.fail_on.as_deref() == Some(source.as_str()) {
                    Err(LoadError::Decode {
                        path: source.clone(),
                        message: "corrupt stream".to_string(),
                    })
                } else {
                    Ok(FakeTrack::default())
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|mut tracks| {
                if self.drop_last {
                    tracks.pop();
                }
                tracks
            })
    }
}
