//! Output route monitoring.
//!
//! Desktop hosts do not deliver route-change notifications, so a background
//! thread polls the default output device. When the device that was in use
//! disappears, a [`InterruptionSignal::RouteChanged`] is sent to the control
//! thread, flagged as headphones when the old device's name says so.

use cpal::traits::{DeviceTrait, HostTrait};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::looper::InterruptionSignal;

const HEADPHONE_HINTS: &[&str] = &["headphone", "headset", "earphone", "earbud"];

pub fn is_headphone_name(name: &str) -> bool {
    let name = name.to_lowercase();
    HEADPHONE_HINTS.iter().any(|hint| name.contains(hint))
}

/// Decide whether a change of default output counts as a route change.
///
/// Only the old device becoming unavailable counts; switching the default
/// while the old device is still present does not.
pub fn route_change(
    previous: Option<&str>,
    current: Option<&str>,
    previous_still_available: bool,
) -> Option<InterruptionSignal> {
    let previous = previous?;
    if current == Some(previous) || previous_still_available {
        return None;
    }
    Some(InterruptionSignal::RouteChanged {
        previous_output_was_headphones: is_headphone_name(previous),
    })
}

fn default_output_name(host: &cpal::Host) -> Option<String> {
    host.default_output_device()?.name().ok()
}

fn output_available(host: &cpal::Host, name: &str) -> bool {
    host.output_devices()
        .map(|mut devices| devices.any(|d| d.name().is_ok_and(|n| n == name)))
        .unwrap_or(false)
}

/// Polls the default output device until dropped.
pub struct RouteMonitor {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl RouteMonitor {
    pub fn spawn(interval: Duration, signals: mpsc::Sender<InterruptionSignal>) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();

        let handle = thread::spawn(move || {
            let host = cpal::default_host();
            let mut previous = default_output_name(&host);
            log::info!("Route monitor watching output: {previous:?}");

            while flag.load(Ordering::Relaxed) {
                // Unparked by drop so shutdown does not wait out the interval.
                thread::park_timeout(interval);
                if !flag.load(Ordering::Relaxed) {
                    break;
                }

                let current = default_output_name(&host);
                if current == previous {
                    continue;
                }

                let still_available = previous
                    .as_deref()
                    .is_some_and(|name| output_available(&host, name));
                if let Some(signal) =
                    route_change(previous.as_deref(), current.as_deref(), still_available)
                {
                    log::info!("Output route changed: {previous:?} -> {current:?}");
                    if signals.send(signal).is_err() {
                        break;
                    }
                }
                previous = current;
            }
        });

        Self {
            running,
            handle: Some(handle),
        }
    }
}

impl Drop for RouteMonitor {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headphone_names() {
        assert!(is_headphone_name("Headphones (Realtek Audio)"));
        assert!(is_headphone_name("USB Headset"));
        assert!(is_headphone_name("AirPods Earbuds"));
        assert!(!is_headphone_name("MacBook Pro Speakers"));
        assert!(!is_headphone_name("HDMI Output"));
    }

    #[test]
    fn test_unplugged_headphones_signal() {
        let signal = route_change(Some("Headphones"), Some("Speakers"), false);
        assert_eq!(
            signal,
            Some(InterruptionSignal::RouteChanged {
                previous_output_was_headphones: true
            })
        );
    }

    #[test]
    fn test_speaker_removed_signal() {
        let signal = route_change(Some("HDMI"), None, false);
        assert_eq!(
            signal,
            Some(InterruptionSignal::RouteChanged {
                previous_output_was_headphones: false
            })
        );
    }

    #[test]
    fn test_drop_does_not_wait_out_interval() {
        let (tx, _rx) = mpsc::channel();
        let monitor = RouteMonitor::spawn(Duration::from_secs(60), tx);

        let started = std::time::Instant::now();
        drop(monitor);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_no_signal_when_old_device_remains() {
        assert_eq!(route_change(Some("Headphones"), Some("Speakers"), true), None);
        assert_eq!(route_change(Some("Speakers"), Some("Speakers"), false), None);
        assert_eq!(route_change(None, Some("Speakers"), false), None);
    }
}
