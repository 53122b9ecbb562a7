//! Application configuration management.
//!
//! This module handles the persistent configuration for stemloop: transport
//! timing, initial track parameters, interruption handling, memo recording
//! settings and logging. Configuration is stored in the user's config
//! directory (typically ~/.config/stemloop/config.toml). A missing file means
//! defaults; a missing key means that key's default.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use crate::constants::{DEFAULT_SCHEDULING_MARGIN_MS, PAN_RANGE, VOLUME_RANGE};

/// Keys accepted by `stemloop config set`.
pub const SETTABLE_KEYS: &[&str] = &[
    "scheduling_margin_ms",
    "default_pan",
    "default_volume",
    "resume_after_interruption",
    "route_poll_interval_ms",
    "meter_refresh_hz",
    "memo_sample_rate",
    "memo_dir",
    "log_file",
    "log_level",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_scheduling_margin_ms")]
    pub scheduling_margin_ms: u64,
    #[serde(default = "default_pan")]
    pub default_pan: f32,
    #[serde(default = "default_volume")]
    pub default_volume: f32,
    #[serde(default)]
    pub resume_after_interruption: bool,
    #[serde(default = "default_route_poll_interval_ms")]
    pub route_poll_interval_ms: u64,
    #[serde(default = "default_meter_refresh_hz")]
    pub meter_refresh_hz: u32,
    #[serde(default = "default_memo_sample_rate")]
    pub memo_sample_rate: u32,
    #[serde(default = "default_memo_dir")]
    pub memo_dir: String,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_scheduling_margin_ms() -> u64 {
    DEFAULT_SCHEDULING_MARGIN_MS
}

fn default_pan() -> f32 {
    0.0
}

fn default_volume() -> f32 {
    1.0
}

fn default_route_poll_interval_ms() -> u64 {
    1000
}

fn default_meter_refresh_hz() -> u32 {
    5
}

fn default_memo_sample_rate() -> u32 {
    44_100
}

fn default_memo_dir() -> String {
    dirs::data_dir()
        .map(|dir| dir.join("stemloop"))
        .unwrap_or_else(|| PathBuf::from("~/.stemloop"))
        .to_string_lossy()
        .to_string()
}

fn default_log_file() -> String {
    std::env::temp_dir()
        .join("stemloop.log")
        .to_string_lossy()
        .to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            scheduling_margin_ms: default_scheduling_margin_ms(),
            default_pan: default_pan(),
            default_volume: default_volume(),
            resume_after_interruption: false,
            route_poll_interval_ms: default_route_poll_interval_ms(),
            meter_refresh_hz: default_meter_refresh_hz(),
            memo_sample_rate: default_memo_sample_rate(),
            memo_dir: default_memo_dir(),
            log_file: default_log_file(),
            log_level: default_log_level(),
        }
    }

    pub fn config_dir() -> Result<PathBuf, Box<dyn Error>> {
        // Check for XDG_CONFIG_HOME first (useful for testing)
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config).join("stemloop")
        } else {
            dirs::config_dir()
                .ok_or("Unable to find config directory")?
                .join("stemloop")
        };
        Ok(config_dir)
    }

    pub fn config_path() -> Result<PathBuf, Box<dyn Error>> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn load() -> Result<Self, Box<dyn Error>> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Default::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        let config_path = Self::config_path()?;
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(&config_path, toml_string)?;

        Ok(())
    }

    pub fn exists() -> Result<bool, Box<dyn Error>> {
        Ok(Self::config_path()?.exists())
    }

    /// Directory holding the finished memo, with `~` expanded.
    pub fn memo_dir_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.memo_dir).as_ref())
    }

    pub fn log_file_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.log_file).as_ref())
    }

    /// Parsed log level, falling back to `Info` for unknown names.
    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        match key {
            "scheduling_margin_ms" => {
                let ms: u64 = value
                    .parse()
                    .map_err(|_| "Value must be a whole number of milliseconds")?;
                if !(1..=1000).contains(&ms) {
                    return Err("Scheduling margin must be between 1 and 1000 ms".into());
                }
                self.scheduling_margin_ms = ms;
            }
            "default_pan" => {
                self.default_pan = parse_in_range(value, PAN_RANGE.start(), PAN_RANGE.end())?;
            }
            "default_volume" => {
                self.default_volume =
                    parse_in_range(value, VOLUME_RANGE.start(), VOLUME_RANGE.end())?;
            }
            "resume_after_interruption" => {
                self.resume_after_interruption = value
                    .parse::<bool>()
                    .map_err(|_| "Value must be 'true' or 'false'")?;
            }
            "route_poll_interval_ms" => {
                let interval: u64 = value
                    .parse()
                    .map_err(|_| "Value must be a whole number of milliseconds")?;
                if interval == 0 {
                    return Err("Poll interval must be greater than zero".into());
                }
                self.route_poll_interval_ms = interval;
            }
            "meter_refresh_hz" => {
                let hz: u32 = value.parse().map_err(|_| "Value must be a whole number")?;
                if !(1..=60).contains(&hz) {
                    return Err("Meter refresh must be between 1 and 60 Hz".into());
                }
                self.meter_refresh_hz = hz;
            }
            "memo_sample_rate" => {
                let rate: u32 = value.parse().map_err(|_| "Value must be a whole number")?;
                if !(8_000..=192_000).contains(&rate) {
                    return Err("Sample rate must be between 8000 and 192000".into());
                }
                self.memo_sample_rate = rate;
            }
            "memo_dir" => self.memo_dir = value.to_string(),
            "log_file" => self.log_file = value.to_string(),
            "log_level" => {
                value
                    .parse::<log::LevelFilter>()
                    .map_err(|_| "Value must be one of off, error, warn, info, debug, trace")?;
                self.log_level = value.to_lowercase();
            }
            _ => return Err(format!("Unknown configuration key: {key}").into()),
        }
        Ok(())
    }
}

fn parse_in_range(value: &str, min: &f32, max: &f32) -> Result<f32, Box<dyn Error>> {
    let parsed: f32 = value.parse().map_err(|_| "Value must be a number")?;
    if !(*min..=*max).contains(&parsed) {
        return Err(format!("Value must be between {min} and {max}").into());
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Use a mutex to ensure tests that modify environment variables don't run concurrently
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_config_new() {
        let config = Config::new();
        assert_eq!(config.scheduling_margin_ms, 10);
        assert_eq!(config.default_pan, 0.0);
        assert_eq!(config.default_volume, 1.0);
        assert!(!config.resume_after_interruption);
        assert_eq!(config.meter_refresh_hz, 5);
        assert_eq!(config.memo_sample_rate, 44_100);
        assert_eq!(config.log_level_filter(), log::LevelFilter::Info);
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config: Config = toml::from_str("scheduling_margin_ms = 20\n").unwrap();
        assert_eq!(config.scheduling_margin_ms, 20);
        assert_eq!(config.default_volume, 1.0);
        assert_eq!(config.route_poll_interval_ms, 1000);
    }

    #[test]
    fn test_set_value() {
        let mut config = Config::new();

        config.set_value("scheduling_margin_ms", "15").unwrap();
        assert_eq!(config.scheduling_margin_ms, 15);

        config.set_value("default_pan", "-0.5").unwrap();
        assert_eq!(config.default_pan, -0.5);

        config.set_value("resume_after_interruption", "true").unwrap();
        assert!(config.resume_after_interruption);

        config.set_value("log_level", "DEBUG").unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_level_filter(), log::LevelFilter::Debug);

        // Out of range and unparsable values
        assert!(config.set_value("default_pan", "1.5").is_err());
        assert!(config.set_value("default_volume", "loud").is_err());
        assert!(config.set_value("meter_refresh_hz", "0").is_err());
        assert!(config.set_value("route_poll_interval_ms", "0").is_err());
        assert!(config.set_value("scheduling_margin_ms", "0").is_err());
        assert!(config.set_value("scheduling_margin_ms", "3600000").is_err());
        assert_eq!(config.scheduling_margin_ms, 15);
        assert!(config.set_value("log_level", "verbose").is_err());
        assert_eq!(config.default_pan, -0.5);

        // Unknown key
        assert!(config.set_value("unknown_key", "value").is_err());
    }

    #[test]
    fn test_every_settable_key_is_accepted() {
        let samples = [
            ("scheduling_margin_ms", "10"),
            ("default_pan", "0"),
            ("default_volume", "1"),
            ("resume_after_interruption", "false"),
            ("route_poll_interval_ms", "500"),
            ("meter_refresh_hz", "5"),
            ("memo_sample_rate", "22050"),
            ("memo_dir", "/tmp/memos"),
            ("log_file", "/tmp/stemloop.log"),
            ("log_level", "warn"),
        ];
        let mut config = Config::new();
        for (key, value) in samples {
            assert!(SETTABLE_KEYS.contains(&key));
            config.set_value(key, value).unwrap();
        }
        assert_eq!(samples.len(), SETTABLE_KEYS.len());
    }

    #[test]
    fn test_config_save_and_load() {
        let _guard = ENV_MUTEX.lock().unwrap();

        let temp_dir = TempDir::new().unwrap();
        let original_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
        }

        let mut config = Config::new();
        config.scheduling_margin_ms = 42;
        config.save().unwrap();

        let config_path = Config::config_path().unwrap();
        assert!(config_path.exists());
        assert!(config_path.starts_with(temp_dir.path().join("stemloop")));

        let loaded = Config::load().unwrap();
        assert_eq!(loaded, config);

        unsafe {
            if let Some(original) = original_xdg {
                std::env::set_var("XDG_CONFIG_HOME", original);
            } else {
                std::env::remove_var("XDG_CONFIG_HOME");
            }
        }
    }

    #[test]
    fn test_tilde_paths_expand() {
        let mut config = Config::new();
        config.memo_dir = "~/memos".to_string();
        assert!(!config.memo_dir_path().starts_with("~"));
    }
}
