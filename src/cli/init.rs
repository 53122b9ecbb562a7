use std::error::Error;
use stemloop::config::Config;

pub fn handle_init() -> Result<(), Box<dyn Error>> {
    if Config::exists()? {
        return Err(
            "stemloop is already initialized. Use 'stemloop config set <key> <value>' to change settings."
                .into(),
        );
    }

    let config = Config::new();
    config.save()?;

    println!("stemloop initialized successfully!");
    println!("Memo directory: {}", config.memo_dir_path().display());
    println!("Log file: {}", config.log_file_path().display());
    println!(
        "Configuration saved to: {}",
        Config::config_path()?.display()
    );

    Ok(())
}
