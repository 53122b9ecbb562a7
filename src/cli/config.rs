use std::error::Error;
use std::process::Command;
use stemloop::config::Config;

pub fn handle_config_view() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;

    println!("Current stemloop configuration:");
    println!("  scheduling_margin_ms: {}", config.scheduling_margin_ms);
    println!("  default_pan: {}", config.default_pan);
    println!("  default_volume: {}", config.default_volume);
    println!(
        "  resume_after_interruption: {}",
        config.resume_after_interruption
    );
    println!("  route_poll_interval_ms: {}", config.route_poll_interval_ms);
    println!("  meter_refresh_hz: {}", config.meter_refresh_hz);
    println!("  memo_sample_rate: {}", config.memo_sample_rate);
    println!("  memo_dir: {}", config.memo_dir);
    println!("  log_file: {}", config.log_file);
    println!("  log_level: {}", config.log_level);

    Ok(())
}

pub fn handle_config_set(key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;

    config.set_value(key, value)?;
    config.save()?;

    println!("Configuration updated: {key} = {value}");

    Ok(())
}

pub fn handle_config_edit() -> Result<(), Box<dyn Error>> {
    if !Config::exists()? {
        return Err("stemloop not initialized. Run 'stemloop init' first.".into());
    }

    let config_path = Config::config_path()?;
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    println!("Opening {} in {}", config_path.display(), editor);

    let status = Command::new(&editor)
        .arg(&config_path)
        .status()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                format!("Editor '{editor}' not found. Set $EDITOR to a valid editor path.")
            } else {
                format!("Failed to launch editor '{editor}': {e}")
            }
        })?;

    if !status.success() {
        return Err(format!("Editor '{editor}' exited with error").into());
    }

    match Config::load() {
        Ok(_) => println!("Configuration saved successfully"),
        Err(e) => {
            return Err(format!("Configuration validation failed: {e}").into());
        }
    }

    Ok(())
}
