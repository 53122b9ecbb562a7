//! Audio backend for the looper: decoding, the looping source, rodio track
//! handles and output route monitoring.

pub mod decode;
pub mod route;
pub mod source;
pub mod track;

pub use decode::DecodedAudio;
pub use route::RouteMonitor;
pub use track::{AudioOutput, RodioLoader, RodioTrack};
