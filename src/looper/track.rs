//! Track set: a fixed, ordered collection of looping tracks.
//!
//! A [`TrackSet`] is built once from a list of sources and never grows or
//! shrinks. Each track wraps a [`TrackHandle`], the platform player object that
//! actually renders audio. The transport and the parameter bus are the only
//! writers; everything else reads.

use std::ops::RangeInclusive;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::constants::{PAN_RANGE, VOLUME_RANGE};
use crate::error::LoadError;

/// Platform player object for one pre-buffered, infinitely looping track.
pub trait TrackHandle {
    /// Schedule playback to begin at `deadline`. Returns the reason when the
    /// backend cannot honour the start command.
    fn play_at(&mut self, deadline: Instant) -> Result<(), String>;

    /// Halt playback immediately. The playhead is left where it is.
    fn stop(&mut self);

    /// Move the playhead back to the start of the content.
    fn rewind(&mut self);

    fn set_pan(&mut self, pan: f32);

    fn set_volume(&mut self, volume: f32);

    fn set_rate(&mut self, rate: f32);

    fn is_playing(&self) -> bool;

    /// Playhead position within the loop.
    fn position(&self) -> Duration;

    /// Length of one pass through the content.
    fn duration(&self) -> Duration;
}

/// Resolves opaque source identifiers into ready-to-play handles.
///
/// Implementations must be all-or-nothing: either every source yields a
/// handle, in source order, or the first failure is returned.
pub trait TrackLoader {
    type Handle: TrackHandle;

    fn load_all(&self, sources: &[String]) -> Result<Vec<Self::Handle>, LoadError>;
}

/// Initial parameter values applied to every freshly loaded track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackDefaults {
    pub pan: f32,
    pub volume: f32,
    pub rate: f32,
}

impl Default for TrackDefaults {
    fn default() -> Self {
        Self {
            pan: 0.0,
            volume: 1.0,
            rate: 1.0,
        }
    }
}

impl TrackDefaults {
    /// Initial values from config, pulled back into range if the file was
    /// edited by hand.
    pub fn from_config(config: &Config) -> Self {
        Self {
            pan: clamp_to(config.default_pan, &PAN_RANGE),
            volume: clamp_to(config.default_volume, &VOLUME_RANGE),
            ..Self::default()
        }
    }
}

fn clamp_to(value: f32, range: &RangeInclusive<f32>) -> f32 {
    let value = if value.is_finite() { value } else { 0.0 };
    value.clamp(*range.start(), *range.end())
}

/// One looping track within a synchronized set.
#[derive(Debug)]
pub struct Track<H> {
    index: usize,
    source: String,
    handle: H,
    pan: f32,
    volume: f32,
}

impl<H: TrackHandle> Track<H> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Tracks always loop indefinitely once started.
    pub fn looping(&self) -> bool {
        true
    }

    pub fn is_playing(&self) -> bool {
        self.handle.is_playing()
    }

    pub fn position(&self) -> Duration {
        self.handle.position()
    }

    pub fn duration(&self) -> Duration {
        self.handle.duration()
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub(crate) fn handle_mut(&mut self) -> &mut H {
        &mut self.handle
    }

    pub(crate) fn apply_pan(&mut self, pan: f32) {
        self.pan = pan;
        self.handle.set_pan(pan);
    }

    pub(crate) fn apply_volume(&mut self, volume: f32) {
        self.volume = volume;
        self.handle.set_volume(volume);
    }
}

/// Ordered, fixed-size set of tracks indexed in source order.
#[derive(Debug)]
pub struct TrackSet<H> {
    tracks: Vec<Track<H>>,
}

impl<H: TrackHandle> TrackSet<H> {
    /// Load every source through `loader`. No partial set is ever returned.
    pub fn load<L>(loader: &L, sources: &[String], defaults: TrackDefaults) -> Result<Self, LoadError>
    where
        L: TrackLoader<Handle = H>,
    {
        let handles = loader.load_all(sources)?;
        if handles.len() != sources.len() {
            return Err(LoadError::TrackCount {
                expected: sources.len(),
                loaded: handles.len(),
            });
        }

        let set = Self::from_handles(sources.iter().cloned().zip(handles), defaults);
        log::info!("Loaded {} tracks", set.len());
        Ok(set)
    }

    /// Build a set from already prepared handles.
    pub fn from_handles<I>(handles: I, defaults: TrackDefaults) -> Self
    where
        I: IntoIterator<Item = (String, H)>,
    {
        let tracks = handles
            .into_iter()
            .enumerate()
            .map(|(index, (source, mut handle))| {
                handle.set_pan(defaults.pan);
                handle.set_volume(defaults.volume);
                handle.set_rate(defaults.rate);
                Track {
                    index,
                    source,
                    handle,
                    pan: defaults.pan,
                    volume: defaults.volume,
                }
            })
            .collect();

        Self { tracks }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track<H>> {
        self.tracks.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track<H>> {
        self.tracks.iter()
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Track<H>> {
        self.tracks.get_mut(index)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Track<H>> {
        self.tracks.iter_mut()
    }
}
