//! Voice memo: record one take from the microphone, keep it as a single WAV
//! and play it back.

pub mod meter;
pub mod recorder;

#[cfg(feature = "playback")]
pub mod capture;

pub use meter::{LevelMeter, MeterReading};
pub use recorder::{MemoRecorder, RecorderState};

#[cfg(feature = "playback")]
pub use capture::InputCapture;

use std::time::Duration;

/// Render a playback position as `hh:mm:ss`, or a placeholder when nothing
/// is playing.
pub fn format_clock(position: Option<Duration>) -> String {
    match position {
        Some(position) => {
            let secs = position.as_secs();
            format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
        }
        None => "--:--:--".to_string(),
    }
}
