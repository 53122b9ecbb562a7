//! Parameter bus: live pan, volume and playback rate.
//!
//! Pan and volume are per track. Rate is a single value owned by the bus and
//! broadcast to every track whenever it changes. Nothing here looks at the
//! transport state; changes are audible only while playing but always apply.

use std::ops::RangeInclusive;

use super::track::{TrackHandle, TrackSet};
use crate::constants::{PAN_RANGE, RATE_RANGE, VOLUME_RANGE};
use crate::error::ParameterError;

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterBus {
    rate: f32,
}

impl Default for ParameterBus {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl ParameterBus {
    pub fn new(rate: f32) -> Self {
        Self { rate }
    }

    /// Shared playback rate currently applied to every track.
    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn set_rate<H: TrackHandle>(
        &mut self,
        tracks: &mut TrackSet<H>,
        value: f32,
    ) -> Result<(), ParameterError> {
        check_range("rate", value, &RATE_RANGE)?;

        self.rate = value;
        for track in tracks.iter_mut() {
            track.handle_mut().set_rate(value);
        }
        log::debug!("rate: {value}");
        Ok(())
    }

    pub fn set_pan<H: TrackHandle>(
        &self,
        tracks: &mut TrackSet<H>,
        index: usize,
        value: f32,
    ) -> Result<(), ParameterError> {
        check_range("pan", value, &PAN_RANGE)?;

        let count = tracks.len();
        let track = tracks
            .get_mut(index)
            .ok_or(ParameterError::NoSuchTrack { index, count })?;
        track.apply_pan(value);
        log::debug!("track {index} pan: {value}");
        Ok(())
    }

    pub fn set_volume<H: TrackHandle>(
        &self,
        tracks: &mut TrackSet<H>,
        index: usize,
        value: f32,
    ) -> Result<(), ParameterError> {
        check_range("volume", value, &VOLUME_RANGE)?;

        let count = tracks.len();
        let track = tracks
            .get_mut(index)
            .ok_or(ParameterError::NoSuchTrack { index, count })?;
        track.apply_volume(value);
        log::debug!("track {index} volume: {value}");
        Ok(())
    }
}

/// Reject values outside `range`. NaN never satisfies `contains`, so it is
/// rejected here too.
fn check_range(
    name: &'static str,
    value: f32,
    range: &RangeInclusive<f32>,
) -> Result<(), ParameterError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ParameterError::OutOfRange {
            name,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::looper::testing::FakeTrack;
    use crate::looper::track::TrackDefaults;

    fn track_set(count: usize) -> TrackSet<FakeTrack> {
        TrackSet::from_handles(
            (0..count).map(|i| (format!("track{i}"), FakeTrack::default())),
            TrackDefaults::default(),
        )
    }

    #[test]
    fn test_set_rate_broadcasts_to_every_track() {
        let mut bus = ParameterBus::default();
        let mut tracks = track_set(3);

        bus.set_rate(&mut tracks, 1.5).unwrap();

        assert_eq!(bus.rate(), 1.5);
        for track in tracks.iter() {
            assert_eq!(track.handle().rate, 1.5);
        }
    }

    #[test]
    fn test_set_rate_accepts_bounds() {
        let mut bus = ParameterBus::default();
        let mut tracks = track_set(1);

        assert!(bus.set_rate(&mut tracks, 0.5).is_ok());
        assert!(bus.set_rate(&mut tracks, 2.0).is_ok());
    }

    #[test]
    fn test_set_rate_out_of_range_leaves_rates_unchanged() {
        let mut bus = ParameterBus::default();
        let mut tracks = track_set(3);

        for bad in [0.49, 2.01, -1.0, f32::NAN, f32::INFINITY] {
            let err = bus.set_rate(&mut tracks, bad).unwrap_err();
            assert!(matches!(err, ParameterError::OutOfRange { name: "rate", .. }));
        }

        assert_eq!(bus.rate(), 1.0);
        for track in tracks.iter() {
            assert_eq!(track.handle().rate, 1.0);
        }
    }

    #[test]
    fn test_set_pan_touches_exactly_one_track() {
        let bus = ParameterBus::default();

        for index in 0..3 {
            for pan in [-1.0, -0.5, 0.0, 0.3, 1.0] {
                let mut tracks = track_set(3);
                bus.set_pan(&mut tracks, index, pan).unwrap();

                for track in tracks.iter() {
                    let expected = if track.index() == index { pan } else { 0.0 };
                    assert_eq!(track.pan(), expected);
                    assert_eq!(track.handle().pan, expected);
                }
            }
        }
    }

    #[test]
    fn test_set_pan_rejects_bad_value_and_index() {
        let bus = ParameterBus::default();
        let mut tracks = track_set(2);

        assert!(bus.set_pan(&mut tracks, 0, 1.5).is_err());
        assert_eq!(
            bus.set_pan(&mut tracks, 2, 0.0),
            Err(ParameterError::NoSuchTrack { index: 2, count: 2 })
        );
        assert!(tracks.iter().all(|t| t.pan() == 0.0));
    }

    #[test]
    fn test_set_volume_out_of_range_index() {
        let bus = ParameterBus::default();
        let mut tracks = track_set(3);

        let err = bus.set_volume(&mut tracks, 5, 0.5).unwrap_err();

        assert_eq!(err, ParameterError::NoSuchTrack { index: 5, count: 3 });
        assert!(tracks.iter().all(|t| t.volume() == 1.0));
    }

    #[test]
    fn test_set_volume_updates_one_track() {
        let bus = ParameterBus::default();
        let mut tracks = track_set(3);

        bus.set_volume(&mut tracks, 1, 0.25).unwrap();

        let volumes: Vec<f32> = tracks.iter().map(|t| t.volume()).collect();
        assert_eq!(volumes, vec![1.0, 0.25, 1.0]);
        assert!(bus.set_volume(&mut tracks, 1, -0.1).is_err());
        assert_eq!(tracks.get(1).unwrap().volume(), 0.25);
    }
}
