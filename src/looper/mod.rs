//! Synchronized multi-track looper.
//!
//! [`Looper`] is the surface a front end talks to. It owns the track set and
//! the three components that act on it:
//!
//! - [`TransportController`] starts every track against one shared deadline
//!   and stops them together.
//! - [`ParameterBus`] applies per-track pan/volume and the shared rate.
//! - [`InterruptionPolicy`] turns interruption and route-change signals into
//!   transport calls.
//!
//! All calls are expected on a single control thread. Rendering happens on
//! the backend's own thread behind [`TrackHandle`].

pub mod interruption;
pub mod params;
pub mod track;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

use std::time::{Duration, Instant};

pub use interruption::{InterruptionPolicy, InterruptionSignal, ResumeBehavior};
pub use params::ParameterBus;
pub use track::{Track, TrackDefaults, TrackHandle, TrackLoader, TrackSet};
pub use transport::{DeviceClock, SystemClock, TransportController, TransportState};

use crate::config::Config;
use crate::error::{LoadError, ParameterError, TransportError};

/// Construction-time settings for a [`Looper`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LooperSettings {
    pub scheduling_margin: Duration,
    pub defaults: TrackDefaults,
    pub resume: ResumeBehavior,
}

impl Default for LooperSettings {
    fn default() -> Self {
        Self {
            scheduling_margin: Duration::from_millis(crate::constants::DEFAULT_SCHEDULING_MARGIN_MS),
            defaults: TrackDefaults::default(),
            resume: ResumeBehavior::default(),
        }
    }
}

impl LooperSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            scheduling_margin: Duration::from_millis(config.scheduling_margin_ms),
            defaults: TrackDefaults::from_config(config),
            resume: if config.resume_after_interruption {
                ResumeBehavior::Resume
            } else {
                ResumeBehavior::ResumeThenStop
            },
        }
    }
}

#[derive(Debug)]
pub struct Looper<H, C = SystemClock> {
    tracks: TrackSet<H>,
    transport: TransportController<C>,
    params: ParameterBus,
    interruptions: InterruptionPolicy,
}

impl<H: TrackHandle> Looper<H, SystemClock> {
    /// Load all `sources` and build a stopped looper around them.
    pub fn load<L>(loader: &L, sources: &[String], settings: LooperSettings) -> Result<Self, LoadError>
    where
        L: TrackLoader<Handle = H>,
    {
        let tracks = TrackSet::load(loader, sources, settings.defaults)?;
        Ok(Self::with_clock(tracks, settings, SystemClock))
    }
}

impl<H: TrackHandle, C: DeviceClock> Looper<H, C> {
    pub fn with_clock(tracks: TrackSet<H>, settings: LooperSettings, clock: C) -> Self {
        Self {
            tracks,
            transport: TransportController::with_clock(settings.scheduling_margin, clock),
            params: ParameterBus::new(settings.defaults.rate),
            interruptions: InterruptionPolicy::new(settings.resume),
        }
    }

    pub fn play(&mut self) -> Result<(), TransportError> {
        self.transport.play(&mut self.tracks)
    }

    pub fn stop(&mut self) {
        self.transport.stop(&mut self.tracks);
    }

    pub fn toggle(&mut self) -> Result<TransportState, TransportError> {
        self.transport.toggle(&mut self.tracks)
    }

    pub fn set_rate(&mut self, value: f32) -> Result<(), ParameterError> {
        self.params.set_rate(&mut self.tracks, value)
    }

    pub fn set_pan(&mut self, index: usize, value: f32) -> Result<(), ParameterError> {
        self.params.set_pan(&mut self.tracks, index, value)
    }

    pub fn set_volume(&mut self, index: usize, value: f32) -> Result<(), ParameterError> {
        self.params.set_volume(&mut self.tracks, index, value)
    }

    pub fn on_interruption_began(&mut self) {
        self.interruptions
            .on_interruption_began(&mut self.transport, &mut self.tracks);
    }

    pub fn on_interruption_ended(&mut self, should_resume: bool) {
        self.interruptions
            .on_interruption_ended(should_resume, &mut self.transport, &mut self.tracks);
    }

    pub fn on_route_changed(&mut self, previous_output_was_headphones: bool) {
        self.interruptions.on_route_changed(
            previous_output_was_headphones,
            &mut self.transport,
            &mut self.tracks,
        );
    }

    /// Dispatch a signal received from an out-of-thread source.
    pub fn handle_signal(&mut self, signal: InterruptionSignal) {
        self.interruptions
            .handle(signal, &mut self.transport, &mut self.tracks);
    }

    pub fn state(&self) -> TransportState {
        self.transport.state()
    }

    pub fn rate(&self) -> f32 {
        self.params.rate()
    }

    pub fn pan(&self, index: usize) -> Option<f32> {
        self.tracks.get(index).map(Track::pan)
    }

    pub fn volume(&self, index: usize) -> Option<f32> {
        self.tracks.get(index).map(Track::volume)
    }

    pub fn tracks(&self) -> &TrackSet<H> {
        &self.tracks
    }

    pub fn last_deadline(&self) -> Option<Instant> {
        self.transport.last_deadline()
    }

    pub fn scheduling_margin(&self) -> Duration {
        self.transport.margin()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{FakeLoader, FakeTrack};
    use super::*;

    fn looper(count: usize) -> Looper<FakeTrack> {
        let sources: Vec<String> = (0..count).map(|i| format!("track{i}.wav")).collect();
        Looper::load(&FakeLoader::default(), &sources, LooperSettings::default()).unwrap()
    }

    #[test]
    fn test_new_looper_initial_state() {
        let looper = looper(3);

        assert_eq!(looper.state(), TransportState::Stopped);
        assert_eq!(looper.rate(), 1.0);
        assert_eq!(looper.tracks().len(), 3);
        assert_eq!(looper.pan(0), Some(0.0));
        assert_eq!(looper.volume(2), Some(1.0));
        assert_eq!(looper.pan(3), None);
    }

    #[test]
    fn test_parameters_do_not_change_transport() {
        let mut looper = looper(2);

        looper.set_rate(0.75).unwrap();
        looper.set_pan(1, -1.0).unwrap();
        assert_eq!(looper.state(), TransportState::Stopped);

        looper.toggle().unwrap();
        looper.set_volume(0, 0.2).unwrap();
        assert_eq!(looper.state(), TransportState::Playing);
        assert_eq!(looper.volume(0), Some(0.2));
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::new();
        config.scheduling_margin_ms = 25;
        config.resume_after_interruption = true;
        config.default_volume = 0.5;

        let settings = LooperSettings::from_config(&config);

        assert_eq!(settings.scheduling_margin, Duration::from_millis(25));
        assert_eq!(settings.resume, ResumeBehavior::Resume);
        assert_eq!(settings.defaults.volume, 0.5);
    }

    #[test]
    fn test_handle_signal_dispatches() {
        let mut looper = looper(3);
        looper.play().unwrap();

        looper.handle_signal(InterruptionSignal::Began);

        assert_eq!(looper.state(), TransportState::Stopped);
    }
}
