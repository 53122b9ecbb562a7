//! stemloop - synchronized multi-track loop player for the terminal.
//!
//! The main tool is `stemloop loop`, which loads a handful of stems, starts
//! them sample-aligned against one shared deadline and lets you change the
//! shared rate and per-track pan/volume while they loop. Audio interruptions
//! and output route changes stop the transport.
//!
//! Two smaller tools share the same audio stack: `stemloop play` is a
//! single-file player with scanning and seeking, and `stemloop record` keeps
//! a single voice memo that can be played back.

use clap::{CommandFactory, Parser, Subcommand, builder::PossibleValuesParser};
use clap_complete::{Generator, Shell, generate};
use std::error::Error;
use std::io;

use stemloop::config::SETTABLE_KEYS;

mod cli;

#[derive(Parser)]
#[command(name = "stemloop")]
#[command(about = "Synchronized multi-track loop player")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Loop several audio files in sync
    Loop {
        /// Audio files, one per track
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// Play a single audio file
    Play {
        /// Audio file to play
        file: String,
    },
    /// Record and play back a voice memo
    Record,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// View current configuration
    View,
    /// Set a configuration value
    Set {
        /// Configuration key
        #[arg(value_parser = PossibleValuesParser::new(SETTABLE_KEYS.iter().copied()))]
        key: String,
        /// Configuration value
        value: String,
    },
    /// Edit configuration file in your editor
    Edit,
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            cli::init::handle_init()?;
        }
        Commands::Config { action } => match action {
            ConfigAction::View => {
                cli::config::handle_config_view()?;
            }
            ConfigAction::Set { key, value } => {
                cli::config::handle_config_set(&key, &value)?;
            }
            ConfigAction::Edit => {
                cli::config::handle_config_edit()?;
            }
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            print_completions(shell, &mut cmd);
        }
        Commands::Loop { files } => {
            cli::looper::handle_loop(&files)?;
        }
        Commands::Play { file } => {
            cli::play::handle_play(&file)?;
        }
        Commands::Record => {
            cli::record::handle_record()?;
        }
    }

    Ok(())
}
