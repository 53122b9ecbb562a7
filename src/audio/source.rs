//! Looping, pannable rodio source driven by a lock-free control block.
//!
//! The control thread writes into [`TrackControls`]; the rodio mixer thread
//! reads it once per output frame. The source never ends: it renders silence
//! until a start deadline is set and reached, then loops the decoded buffer
//! until the deadline is cleared again.

use rodio::Source;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use super::decode::DecodedAudio;

const NOT_SCHEDULED: u64 = u64::MAX;

/// Always rendered as stereo so pan has somewhere to go.
const OUTPUT_CHANNELS: u16 = 2;

/// Shared state between a track handle and its source.
#[derive(Debug)]
pub struct TrackControls {
    epoch: Instant,
    /// Start deadline in nanoseconds after `epoch`, or `NOT_SCHEDULED`.
    start_at: AtomicU64,
    /// Bumped on every schedule so the source notices stop/start pairs that
    /// land between two frames.
    schedule_seq: AtomicU64,
    pan_bits: AtomicU32,
    frame: AtomicUsize,
    rewind: AtomicBool,
}

impl Default for TrackControls {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackControls {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            start_at: AtomicU64::new(NOT_SCHEDULED),
            schedule_seq: AtomicU64::new(0),
            pan_bits: AtomicU32::new(0.0_f32.to_bits()),
            frame: AtomicUsize::new(0),
            rewind: AtomicBool::new(false),
        }
    }

    pub fn schedule(&self, deadline: Instant) {
        let nanos = deadline.saturating_duration_since(self.epoch).as_nanos();
        let nanos = u64::try_from(nanos).unwrap_or(NOT_SCHEDULED - 1);
        self.schedule_seq.fetch_add(1, Ordering::AcqRel);
        self.start_at.store(nanos, Ordering::Release);
    }

    pub fn halt(&self) {
        self.start_at.store(NOT_SCHEDULED, Ordering::Release);
    }

    pub fn request_rewind(&self) {
        self.rewind.store(true, Ordering::Release);
        self.frame.store(0, Ordering::Relaxed);
    }

    pub fn is_scheduled(&self) -> bool {
        self.start_at.load(Ordering::Acquire) != NOT_SCHEDULED
    }

    pub fn set_pan(&self, pan: f32) {
        self.pan_bits.store(pan.to_bits(), Ordering::Relaxed);
    }

    pub fn pan(&self) -> f32 {
        f32::from_bits(self.pan_bits.load(Ordering::Relaxed))
    }

    /// Playhead in frames, as last published by the source.
    pub fn frame(&self) -> usize {
        self.frame.load(Ordering::Relaxed)
    }

    fn elapsed_nanos(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

/// Left/right gains for a balance-style pan in [-1, 1]. Center is unity on
/// both sides.
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let pan = pan.clamp(-1.0, 1.0);
    ((1.0 - pan).min(1.0), (1.0 + pan).min(1.0))
}

pub struct LoopSource {
    audio: DecodedAudio,
    frames: usize,
    controls: Arc<TrackControls>,
    frame: usize,
    running: bool,
    seen_seq: u64,
    current: [f32; 2],
    out_channel: usize,
}

impl LoopSource {
    pub fn new(audio: DecodedAudio, controls: Arc<TrackControls>) -> Self {
        let frames = audio.frames();
        Self {
            audio,
            frames,
            controls,
            frame: 0,
            running: false,
            seen_seq: 0,
            current: [0.0; 2],
            out_channel: 0,
        }
    }

    fn begin_frame(&mut self) {
        let controls = &self.controls;

        if controls.rewind.swap(false, Ordering::AcqRel) {
            self.frame = 0;
            controls.frame.store(0, Ordering::Relaxed);
        }

        let seq = controls.schedule_seq.load(Ordering::Acquire);
        if seq != self.seen_seq {
            self.seen_seq = seq;
            self.running = false;
        }

        let start_at = controls.start_at.load(Ordering::Acquire);
        if start_at == NOT_SCHEDULED {
            self.running = false;
            self.current = [0.0; 2];
            return;
        }

        if !self.running {
            if controls.elapsed_nanos() < start_at {
                self.current = [0.0; 2];
                return;
            }
            self.running = true;
            log::debug!("Track source started at frame {}", self.frame);
        }

        let channels = self.audio.channels as usize;
        let base = self.frame * channels;
        let left = self.audio.samples[base];
        let right = if channels > 1 {
            self.audio.samples[base + 1]
        } else {
            left
        };

        let (gain_l, gain_r) = pan_gains(controls.pan());
        self.current = [left * gain_l, right * gain_r];

        self.frame += 1;
        if self.frame >= self.frames {
            self.frame = 0;
        }
        controls.frame.store(self.frame, Ordering::Relaxed);
    }
}

impl Iterator for LoopSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.frames == 0 {
            return None;
        }

        if self.out_channel == 0 {
            self.begin_frame();
        }

        let sample = self.current[self.out_channel];
        self.out_channel = (self.out_channel + 1) % OUTPUT_CHANNELS as usize;
        Some(sample)
    }
}

impl Source for LoopSource {
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        OUTPUT_CHANNELS
    }

    fn sample_rate(&self) -> u32 {
        self.audio.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}
