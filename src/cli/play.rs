use std::error::Error;
use std::time::Duration;
use stemloop::config::Config;
use stemloop::error::PlayerError;
use stemloop::player::PlayerObserver;

/// Keeps the latest observed player state for the status line.
#[cfg_attr(not(feature = "playback"), allow(dead_code))]
#[derive(Debug, Default)]
pub struct StatusObserver {
    pub duration: Option<Duration>,
    pub rate: f32,
    pub elapsed: Option<Duration>,
    pub failure: Option<String>,
}

impl PlayerObserver for StatusObserver {
    fn on_duration_known(&mut self, duration: Option<Duration>) {
        self.duration = duration;
        self.elapsed = Some(Duration::ZERO);
        self.failure = None;
    }

    fn on_rate_changed(&mut self, rate: f32) {
        self.rate = rate;
    }

    fn on_status_failed(&mut self, error: &PlayerError) {
        self.failure = Some(error.to_string());
    }

    fn on_time_elapsed(&mut self, position: Duration) {
        self.elapsed = Some(position);
    }
}

pub fn handle_play(file: &str) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    super::init_logging(&config)?;

    #[cfg(feature = "playback")]
    {
        run(file)
    }

    #[cfg(not(feature = "playback"))]
    {
        let _ = file;
        super::print_playback_unavailable("Audio Player");
        Ok(())
    }
}

#[cfg(feature = "playback")]
fn run(file: &str) -> Result<(), Box<dyn Error>> {
    use crossterm::event::KeyCode;
    use owo_colors::OwoColorize;
    use std::path::Path;
    use std::time::Instant;
    use stemloop::player::{ObservedPlayer, RodioBackend, format_position};

    use super::terminal::RawTerminal;

    let expanded = shellexpand::tilde(file);
    let mut player = ObservedPlayer::new(RodioBackend::new()?, StatusObserver::default());
    player.open(Path::new(expanded.as_ref()))?;

    let terminal = RawTerminal::enter()?;
    if player.controls_enabled() {
        terminal.println("space play/pause  ← rewind  → fast forward  , . seek ±5s  q quit")?;
    } else {
        terminal.println("No valid duration; transport controls disabled. q quits.")?;
    }

    loop {
        player.tick(Instant::now());

        let status = player.observer();
        let rate = if status.rate == 0.0 {
            format!("{}", "paused".yellow())
        } else if status.rate == 1.0 {
            format!("{}", "playing".green())
        } else {
            format!("{}", format!("scan {:+.0}x", status.rate).cyan())
        };
        let mut line = format!(
            "{}  {} / {}",
            rate,
            format_position(status.elapsed),
            format_position(status.duration)
        );
        if let Some(failure) = &status.failure {
            line.push_str(&format!("  {}", failure.red()));
        }
        terminal.status(&line)?;

        let Some(key) = terminal.poll_key(Duration::from_millis(50))? else {
            continue;
        };
        if matches!(key, KeyCode::Char('q') | KeyCode::Esc) {
            break;
        }
        if !player.controls_enabled() {
            continue;
        }

        let result = match key {
            KeyCode::Char(' ') => player.play_pause(),
            KeyCode::Left => player.rewind(),
            KeyCode::Right => player.fast_forward(),
            KeyCode::Char(',') => player.seek_by(-5.0),
            KeyCode::Char('.') => player.seek_by(5.0),
            _ => Ok(()),
        };
        if let Err(e) = result {
            player.observer_mut().on_status_failed(&e);
        }
    }

    Ok(())
}
