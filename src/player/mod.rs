//! Observed single-file player used by `stemloop play` and memo playback.

pub mod observed;

#[cfg(feature = "playback")]
pub mod backend;

pub use observed::{
    DEFAULT_TIME_INTERVAL, MediaBackend, ObservedPlayer, PlayerObserver, format_position,
};

#[cfg(feature = "playback")]
pub use backend::RodioBackend;
