//! Transport: synchronized start and stop of every track in a set.
//!
//! `play` reads the device clock exactly once, adds a small scheduling margin
//! and hands the same deadline to every track. Computing the deadline per
//! track would reintroduce skew between them.

use std::time::{Duration, Instant};

use super::track::{TrackHandle, TrackSet};
use crate::error::TransportError;

/// Source of the timestamp that scheduled starts are measured against.
pub trait DeviceClock {
    fn now(&self) -> Instant;
}

/// Monotonic host clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl DeviceClock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Aggregate play/stop state shared by all tracks of a set.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
}

#[derive(Debug)]
pub struct TransportController<C = SystemClock> {
    state: TransportState,
    margin: Duration,
    clock: C,
    last_deadline: Option<Instant>,
}

impl TransportController<SystemClock> {
    pub fn new(margin: Duration) -> Self {
        Self::with_clock(margin, SystemClock)
    }
}

impl<C: DeviceClock> TransportController<C> {
    pub fn with_clock(margin: Duration, clock: C) -> Self {
        Self {
            state: TransportState::Stopped,
            margin,
            clock,
            last_deadline: None,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn margin(&self) -> Duration {
        self.margin
    }

    /// Deadline handed to the tracks by the most recent successful `play`.
    pub fn last_deadline(&self) -> Option<Instant> {
        self.last_deadline
    }

    /// Start every track at one common deadline. No-op while playing.
    ///
    /// If any track refuses the start command, the tracks already scheduled
    /// are stopped and rewound again and the state stays `Stopped`.
    pub fn play<H: TrackHandle>(&mut self, tracks: &mut TrackSet<H>) -> Result<(), TransportError> {
        if self.state == TransportState::Playing {
            return Ok(());
        }
        if tracks.is_empty() {
            return Err(TransportError::NoTracks);
        }

        let deadline = self.clock.now() + self.margin;

        let mut rejected = None;
        for track in tracks.iter_mut() {
            if let Err(reason) = track.handle_mut().play_at(deadline) {
                rejected = Some((track.index(), reason));
                break;
            }
        }

        if let Some((index, reason)) = rejected {
            for track in tracks.iter_mut().take(index) {
                let handle = track.handle_mut();
                handle.stop();
                handle.rewind();
            }
            log::warn!("Synchronized start aborted, track {index} rejected it: {reason}");
            return Err(TransportError::StartRejected {
                track: index,
                reason,
            });
        }

        self.state = TransportState::Playing;
        self.last_deadline = Some(deadline);
        log::info!(
            "Transport playing: {} tracks scheduled {:?} ahead",
            tracks.len(),
            self.margin
        );
        Ok(())
    }

    /// Stop every track and rewind it to the start. No-op while stopped.
    pub fn stop<H: TrackHandle>(&mut self, tracks: &mut TrackSet<H>) {
        if self.state == TransportState::Stopped {
            return;
        }

        for track in tracks.iter_mut() {
            let handle = track.handle_mut();
            handle.stop();
            handle.rewind();
        }

        self.state = TransportState::Stopped;
        log::info!("Transport stopped");
    }

    /// Play when stopped, stop when playing. Returns the resulting state.
    pub fn toggle<H: TrackHandle>(
        &mut self,
        tracks: &mut TrackSet<H>,
    ) -> Result<TransportState, TransportError> {
        match self.state {
            TransportState::Stopped => self.play(tracks)?,
            TransportState::Playing => self.stop(tracks),
        }
        Ok(self.state)
    }
}
