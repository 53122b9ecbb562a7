pub mod config;
pub mod init;
pub mod looper;
pub mod play;
pub mod record;

#[cfg(feature = "playback")]
mod terminal;

use std::error::Error;
use std::fs::{self, File};
use stemloop::config::Config;

/// Send library logging to the configured file. Terminal output belongs to
/// the interactive front ends.
pub fn init_logging(config: &Config) -> Result<(), Box<dyn Error>> {
    use simplelog::{CombinedLogger, WriteLogger};

    let log_file = config.log_file_path();
    if let Some(parent) = log_file.parent() {
        fs::create_dir_all(parent)?;
    }

    CombinedLogger::init(vec![WriteLogger::new(
        config.log_level_filter(),
        simplelog::Config::default(),
        File::create(&log_file)?,
    )])?;

    Ok(())
}

#[cfg(not(feature = "playback"))]
fn print_playback_unavailable(title: &str) {
    use owo_colors::OwoColorize;
    println!("{} {}", "🎵".cyan(), title.bold());
    println!();
    println!(
        "{} This command requires the 'playback' feature to be enabled.",
        "Note:".yellow()
    );
    println!();
    println!("To enable it, install with:");
    println!("  {}", "cargo install stemloop --features playback".cyan());
    println!();
    println!("Or if building from source:");
    println!("  {}", "cargo build --release --features playback".cyan());
}
