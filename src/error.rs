//! Error types for the looper core, the observed player and the memo recorder.
//!
//! Every error is local to the operation that raised it. Callers at the CLI
//! boundary convert them into `Box<dyn Error>` with `?`.

use crate::memo::RecorderState;

/// A track source could not be resolved, decoded or prepared for playback.
///
/// Loading is all-or-nothing, so any of these aborts construction of the
/// whole track set.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("audio source not found: {0}")]
    NotFound(String),
    #[error("unsupported audio format '{extension}' for {path}")]
    Unsupported { path: String, extension: String },
    #[error("failed to decode {path}: {message}")]
    Decode { path: String, message: String },
    #[error("audio source contains no samples: {0}")]
    Empty(String),
    #[error("audio output unavailable: {0}")]
    Output(String),
    #[error("loader returned {loaded} tracks for {expected} sources")]
    TrackCount { expected: usize, loaded: usize },
}

/// Synchronized start could not be scheduled. Transport state is unchanged.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("no tracks loaded")]
    NoTracks,
    #[error("track {track} rejected the scheduled start: {reason}")]
    StartRejected { track: usize, reason: String },
}

/// A parameter value or track index was outside its contract range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    #[error("{name} {value} is outside [{min}, {max}]")]
    OutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("track index {index} out of range ({count} tracks)")]
    NoSuchTrack { index: usize, count: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("cannot open {path}: {message}")]
    Open { path: String, message: String },
    #[error("no media loaded")]
    NotLoaded,
    #[error("playback backend error: {0}")]
    Backend(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("cannot {action} while {state:?}")]
    InvalidState {
        action: &'static str,
        state: RecorderState,
    },
    #[error("memo file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("memo encoding error: {0}")]
    Wav(#[from] hound::Error),
    #[error("input device error: {0}")]
    Device(String),
}
