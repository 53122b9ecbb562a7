//! Single-file player that reports its state through [`PlayerObserver`].
//!
//! Rate follows the usual transport convention: 0.0 is paused, 1.0 is normal
//! playback and anything else is scanning. The media backend only has to
//! play forward, so negative rates are rendered here by pausing the backend
//! and stepping the position back on every [`ObservedPlayer::tick`].

use std::path::Path;
use std::time::{Duration, Instant};

use crate::constants::MAX_SCAN_RATE;
use crate::error::PlayerError;

/// Default period of the elapsed-time callback.
pub const DEFAULT_TIME_INTERVAL: Duration = Duration::from_secs(1);

/// Something that can decode and play one media file.
pub trait MediaBackend {
    /// Load `path`, paused at the start. Returns the duration when known.
    fn load(&mut self, path: &Path) -> Result<Option<Duration>, PlayerError>;
    fn play(&mut self);
    fn pause(&mut self);
    /// Forward playback speed. Always positive.
    fn set_speed(&mut self, speed: f32);
    fn seek(&mut self, position: Duration) -> Result<(), PlayerError>;
    fn position(&self) -> Duration;
    /// True once playback ran off the end of the media.
    fn is_finished(&self) -> bool;
}

/// Callbacks for player state changes.
pub trait PlayerObserver {
    /// `None` when the media has no valid duration.
    fn on_duration_known(&mut self, duration: Option<Duration>);
    fn on_rate_changed(&mut self, rate: f32);
    fn on_status_failed(&mut self, error: &PlayerError);
    fn on_time_elapsed(&mut self, position: Duration);
}

pub struct ObservedPlayer<B, O> {
    backend: B,
    observer: O,
    loaded: bool,
    duration: Option<Duration>,
    rate: f32,
    interval: Duration,
    last_tick: Option<Instant>,
    next_report: Option<Instant>,
}

impl<B: MediaBackend, O: PlayerObserver> ObservedPlayer<B, O> {
    pub fn new(backend: B, observer: O) -> Self {
        Self::with_interval(backend, observer, DEFAULT_TIME_INTERVAL)
    }

    pub fn with_interval(backend: B, observer: O, interval: Duration) -> Self {
        Self {
            backend,
            observer,
            loaded: false,
            duration: None,
            rate: 0.0,
            interval,
            last_tick: None,
            next_report: None,
        }
    }

    pub fn open(&mut self, path: &Path) -> Result<(), PlayerError> {
        self.loaded = false;
        self.duration = None;
        self.last_tick = None;
        self.next_report = None;
        if self.rate != 0.0 {
            self.set_rate(0.0);
        }

        match self.backend.load(path) {
            Ok(duration) => {
                self.loaded = true;
                self.duration = duration.filter(|d| !d.is_zero());
                log::info!("Opened {} ({:?})", path.display(), self.duration);
                self.observer.on_duration_known(self.duration);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to open {}: {e}", path.display());
                self.observer.on_status_failed(&e);
                Err(e)
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Transport controls only make sense with a known, non-zero duration.
    pub fn controls_enabled(&self) -> bool {
        self.loaded && self.duration.is_some()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn position(&self) -> Duration {
        self.backend.position()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    fn at_end(&self) -> bool {
        self.backend.is_finished() || self.duration.is_some_and(|d| self.position() >= d)
    }

    /// Play at normal speed, or pause if already playing at normal speed.
    /// Playing from the end starts over.
    pub fn play_pause(&mut self) -> Result<(), PlayerError> {
        self.ensure_loaded()?;

        if self.rate != 1.0 {
            if self.at_end() {
                self.seek(Duration::ZERO)?;
            }
            self.set_rate(1.0);
        } else {
            self.set_rate(0.0);
        }
        Ok(())
    }

    pub fn rewind(&mut self) -> Result<(), PlayerError> {
        self.ensure_loaded()?;
        self.set_rate((self.rate - 2.0).max(-MAX_SCAN_RATE));
        Ok(())
    }

    pub fn fast_forward(&mut self) -> Result<(), PlayerError> {
        self.ensure_loaded()?;
        self.set_rate((self.rate + 2.0).min(MAX_SCAN_RATE));
        Ok(())
    }

    /// Jump to `position`, clamped to the media bounds.
    pub fn seek(&mut self, position: Duration) -> Result<(), PlayerError> {
        self.ensure_loaded()?;

        let target = match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        };
        self.backend.seek(target)?;
        log::debug!("Seeked to {target:?}");
        self.observer.on_time_elapsed(target);
        Ok(())
    }

    /// Relative seek in seconds; negative goes back.
    pub fn seek_by(&mut self, seconds: f64) -> Result<(), PlayerError> {
        let current = self.position().as_secs_f64();
        self.seek(Duration::from_secs_f64((current + seconds).max(0.0)))
    }

    /// Advance time-driven behavior: reverse scanning, end of media and the
    /// periodic elapsed-time callback. Call at least as often as `interval`.
    pub fn tick(&mut self, now: Instant) {
        if !self.loaded {
            return;
        }

        let elapsed = self
            .last_tick
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or_default();
        self.last_tick = Some(now);

        if self.rate < 0.0 {
            let step = elapsed.mul_f32(-self.rate);
            let target = self.position().saturating_sub(step);
            if let Err(e) = self.backend.seek(target) {
                log::warn!("Reverse scan seek failed: {e}");
                self.observer.on_status_failed(&e);
                self.set_rate(0.0);
            } else if target.is_zero() {
                self.set_rate(0.0);
            }
        } else if self.rate > 0.0 && self.backend.is_finished() {
            log::info!("Reached end of media");
            self.set_rate(0.0);
        }

        if self.rate != 0.0 && self.next_report.is_none_or(|due| now >= due) {
            self.next_report = Some(now + self.interval);
            let position = self.position();
            self.observer.on_time_elapsed(position);
        }
    }

    fn ensure_loaded(&self) -> Result<(), PlayerError> {
        if self.loaded {
            Ok(())
        } else {
            Err(PlayerError::NotLoaded)
        }
    }

    fn set_rate(&mut self, rate: f32) {
        if rate == self.rate {
            return;
        }
        self.rate = rate;

        if rate > 0.0 {
            self.backend.set_speed(rate);
            self.backend.play();
        } else {
            self.backend.pause();
        }

        log::info!("Player rate -> {rate}");
        self.observer.on_rate_changed(rate);
    }
}

/// `m:ss` for a known position, `-:--` otherwise.
pub fn format_position(position: Option<Duration>) -> String {
    match position {
        Some(position) => {
            let secs = position.as_secs();
            format!("{}:{:02}", secs / 60, secs % 60)
        }
        None => "-:--".to_string(),
    }
}
