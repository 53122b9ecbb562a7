pub mod config;
pub mod constants;
pub mod error;
pub mod looper;
pub mod memo;
pub mod player;
pub mod utils;

#[cfg(feature = "playback")]
pub mod audio;
