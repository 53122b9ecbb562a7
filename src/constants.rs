//! Project-wide constants used across multiple modules.
//!
//! Parameter ranges live here so the looper core, the CLI key bindings and the
//! config validation agree on the same bounds.

use std::ops::RangeInclusive;

/// Spinner animation characters for progress indicators
pub const SPINNER_CHARS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Shared playback rate bounds
pub const RATE_RANGE: RangeInclusive<f32> = 0.5..=2.0;

/// Per-track pan bounds, hard left to hard right
pub const PAN_RANGE: RangeInclusive<f32> = -1.0..=1.0;

/// Per-track volume bounds
pub const VOLUME_RANGE: RangeInclusive<f32> = 0.0..=1.0;

/// Default delay between reading the clock and the synchronized start
pub const DEFAULT_SCHEDULING_MARGIN_MS: u64 = 10;

/// Floor reported by the level meter for silence, in dBFS
pub const METER_FLOOR_DB: f32 = -160.0;

/// Scan rate limit for the observed player's rewind / fast forward
pub const MAX_SCAN_RATE: f32 = 2.0;

/// File name of the finished voice memo
pub const MEMO_FILE_NAME: &str = "memo.wav";
