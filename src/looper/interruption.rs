//! Reactions to interruptions and output route changes.
//!
//! The policy holds no state of its own. Each signal maps onto transport
//! calls, delivered on the control thread.

use super::track::{TrackHandle, TrackSet};
use super::transport::{DeviceClock, TransportController};

/// What to do when an interruption ends with a resume hint.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ResumeBehavior {
    /// Resume, then stop again straight away.
    #[default]
    ResumeThenStop,
    /// Resume and keep playing.
    Resume,
}

/// External signal delivered by the host's interruption source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptionSignal {
    Began,
    Ended { should_resume: bool },
    RouteChanged { previous_output_was_headphones: bool },
}

#[derive(Debug, Default, Clone, Copy)]
pub struct InterruptionPolicy {
    resume: ResumeBehavior,
}

impl InterruptionPolicy {
    pub fn new(resume: ResumeBehavior) -> Self {
        Self { resume }
    }

    pub fn resume_behavior(&self) -> ResumeBehavior {
        self.resume
    }

    pub fn handle<H: TrackHandle, C: DeviceClock>(
        &self,
        signal: InterruptionSignal,
        transport: &mut TransportController<C>,
        tracks: &mut TrackSet<H>,
    ) {
        match signal {
            InterruptionSignal::Began => self.on_interruption_began(transport, tracks),
            InterruptionSignal::Ended { should_resume } => {
                self.on_interruption_ended(should_resume, transport, tracks)
            }
            InterruptionSignal::RouteChanged {
                previous_output_was_headphones,
            } => self.on_route_changed(previous_output_was_headphones, transport, tracks),
        }
    }

    pub fn on_interruption_began<H: TrackHandle, C: DeviceClock>(
        &self,
        transport: &mut TransportController<C>,
        tracks: &mut TrackSet<H>,
    ) {
        log::info!("Interruption began");
        transport.stop(tracks);
    }

    pub fn on_interruption_ended<H: TrackHandle, C: DeviceClock>(
        &self,
        should_resume: bool,
        transport: &mut TransportController<C>,
        tracks: &mut TrackSet<H>,
    ) {
        log::info!("Interruption ended (should_resume: {should_resume})");
        if should_resume {
            if let Err(e) = transport.play(tracks) {
                log::warn!("Could not resume after interruption: {e}");
            }
        }
        if self.resume == ResumeBehavior::ResumeThenStop {
            transport.stop(tracks);
        }
    }

    /// Stops playback when the previous output was headphones, so audio does
    /// not jump to the speaker when they are unplugged.
    pub fn on_route_changed<H: TrackHandle, C: DeviceClock>(
        &self,
        previous_output_was_headphones: bool,
        transport: &mut TransportController<C>,
        tracks: &mut TrackSet<H>,
    ) {
        log::info!("Route changed (previous output headphones: {previous_output_was_headphones})");
        if previous_output_was_headphones {
            transport.stop(tracks);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::looper::testing::FakeTrack;
    use crate::looper::track::TrackDefaults;
    use crate::looper::transport::TransportState;
    use std::time::Duration;

    fn setup() -> (TransportController, TrackSet<FakeTrack>) {
        let tracks = TrackSet::from_handles(
            (0..3).map(|i| (format!("track{i}"), FakeTrack::default())),
            TrackDefaults::default(),
        );
        (TransportController::new(Duration::from_millis(10)), tracks)
    }

    #[test]
    fn test_interruption_began_stops_all_tracks() {
        let (mut transport, mut tracks) = setup();
        transport.play(&mut tracks).unwrap();

        InterruptionPolicy::default().on_interruption_began(&mut transport, &mut tracks);

        assert_eq!(transport.state(), TransportState::Stopped);
        assert!(tracks.iter().all(|t| !t.is_playing()));
    }

    #[test]
    fn test_interruption_ended_resume_then_stop() {
        let (mut transport, mut tracks) = setup();
        let policy = InterruptionPolicy::new(ResumeBehavior::ResumeThenStop);

        policy.on_interruption_ended(true, &mut transport, &mut tracks);

        // The resume is issued, then undone.
        assert_eq!(transport.state(), TransportState::Stopped);
        for track in tracks.iter() {
            assert_eq!(track.handle().start_commands.len(), 1);
            assert_eq!(track.handle().stop_commands, 1);
            assert_eq!(track.position(), Duration::ZERO);
        }
    }

    #[test]
    fn test_interruption_ended_resume() {
        let (mut transport, mut tracks) = setup();
        let policy = InterruptionPolicy::new(ResumeBehavior::Resume);

        policy.on_interruption_ended(true, &mut transport, &mut tracks);

        assert_eq!(transport.state(), TransportState::Playing);
        assert!(tracks.iter().all(|t| t.is_playing()));
    }

    #[test]
    fn test_interruption_ended_without_resume_hint() {
        let (mut transport, mut tracks) = setup();
        let policy = InterruptionPolicy::new(ResumeBehavior::Resume);

        policy.on_interruption_ended(false, &mut transport, &mut tracks);

        assert_eq!(transport.state(), TransportState::Stopped);
        assert!(tracks.iter().all(|t| t.handle().start_commands.is_empty()));
    }

    #[test]
    fn test_route_change_only_stops_for_headphones() {
        let (mut transport, mut tracks) = setup();
        let policy = InterruptionPolicy::default();
        transport.play(&mut tracks).unwrap();

        policy.handle(
            InterruptionSignal::RouteChanged {
                previous_output_was_headphones: false,
            },
            &mut transport,
            &mut tracks,
        );
        assert_eq!(transport.state(), TransportState::Playing);

        policy.handle(
            InterruptionSignal::RouteChanged {
                previous_output_was_headphones: true,
            },
            &mut transport,
            &mut tracks,
        );
        assert_eq!(transport.state(), TransportState::Stopped);
    }
}
