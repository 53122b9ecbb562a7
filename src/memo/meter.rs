//! Input level metering in dBFS.

use crate::constants::METER_FLOOR_DB;

/// Average and peak level over one metering window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterReading {
    pub average_db: f32,
    pub peak_db: f32,
}

impl MeterReading {
    pub const SILENT: Self = Self {
        average_db: METER_FLOOR_DB,
        peak_db: METER_FLOOR_DB,
    };
}

impl Default for MeterReading {
    fn default() -> Self {
        Self::SILENT
    }
}

/// Accumulates samples between updates. The average is RMS based.
#[derive(Debug, Default)]
pub struct LevelMeter {
    sum_squares: f64,
    peak: f32,
    count: usize,
}

impl LevelMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, samples: &[f32]) {
        for &sample in samples {
            let magnitude = sample.abs();
            self.sum_squares += f64::from(magnitude) * f64::from(magnitude);
            self.peak = self.peak.max(magnitude);
        }
        self.count += samples.len();
    }

    /// Reading over everything pushed since the previous update.
    pub fn update(&mut self) -> MeterReading {
        if self.count == 0 {
            return MeterReading::SILENT;
        }

        let rms = (self.sum_squares / self.count as f64).sqrt() as f32;
        let reading = MeterReading {
            average_db: to_dbfs(rms),
            peak_db: to_dbfs(self.peak),
        };
        self.reset();
        reading
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Linear amplitude to dBFS, clamped to the meter range.
pub fn to_dbfs(amplitude: f32) -> f32 {
    if amplitude <= 0.0 || amplitude.is_nan() {
        return METER_FLOOR_DB;
    }
    (20.0 * amplitude.log10()).clamp(METER_FLOOR_DB, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_reads_floor() {
        let mut meter = LevelMeter::new();
        assert_eq!(meter.update(), MeterReading::SILENT);

        meter.push(&[0.0; 64]);
        assert_eq!(meter.update(), MeterReading::SILENT);
    }

    #[test]
    fn test_full_scale_reads_zero() {
        let mut meter = LevelMeter::new();
        meter.push(&[1.0, -1.0, 1.0, -1.0]);

        let reading = meter.update();
        assert!(reading.average_db.abs() < 1e-4);
        assert!(reading.peak_db.abs() < 1e-4);
    }

    #[test]
    fn test_half_scale_peak() {
        let mut meter = LevelMeter::new();
        meter.push(&[0.5, 0.0, 0.0, 0.0]);

        let reading = meter.update();
        assert!((reading.peak_db - -6.0206).abs() < 0.01);
        assert!(reading.average_db < reading.peak_db);
    }

    #[test]
    fn test_update_resets_window() {
        let mut meter = LevelMeter::new();
        meter.push(&[0.9; 16]);
        meter.update();

        assert_eq!(meter.update(), MeterReading::SILENT);
    }

    #[test]
    fn test_dbfs_clamps() {
        assert_eq!(to_dbfs(1e-12), METER_FLOOR_DB);
        assert_eq!(to_dbfs(4.0), 0.0);
        assert_eq!(to_dbfs(f32::NAN), METER_FLOOR_DB);
    }
}
