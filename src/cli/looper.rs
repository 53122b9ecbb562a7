use std::error::Error;
use stemloop::config::Config;

#[cfg(feature = "playback")]
use stemloop::looper::{Looper, SystemClock, TrackHandle, TransportState};

/// Rate, pan and volume change per key press.
#[cfg_attr(not(feature = "playback"), allow(dead_code))]
const STEP: f32 = 0.1;

/// What a key press in the looper asks for.
#[cfg_attr(not(feature = "playback"), allow(dead_code))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoopAction {
    Toggle,
    Rate(f32),
    Select(usize),
    Pan(f32),
    Volume(f32),
    InterruptionBegan,
    InterruptionEnded,
    Quit,
}

#[cfg_attr(not(feature = "playback"), allow(dead_code))]
impl LoopAction {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            ' ' => Some(Self::Toggle),
            '[' => Some(Self::Rate(-STEP)),
            ']' => Some(Self::Rate(STEP)),
            'i' => Some(Self::InterruptionBegan),
            'e' => Some(Self::InterruptionEnded),
            'q' => Some(Self::Quit),
            '1'..='9' => c.to_digit(10).map(|d| Self::Select(d as usize - 1)),
            _ => None,
        }
    }
}

/// Round to one decimal so repeated steps land on the range edges exactly.
#[cfg_attr(not(feature = "playback"), allow(dead_code))]
fn stepped(value: f32, delta: f32) -> f32 {
    ((value + delta) * 10.0).round() / 10.0
}

pub fn handle_loop(files: &[String]) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    super::init_logging(&config)?;

    #[cfg(feature = "playback")]
    {
        run(&config, files)
    }

    #[cfg(not(feature = "playback"))]
    {
        let _ = files;
        super::print_playback_unavailable("Multi-track Looper");
        Ok(())
    }
}

#[cfg(feature = "playback")]
fn run(config: &Config, files: &[String]) -> Result<(), Box<dyn Error>> {
    use crossterm::event::KeyCode;
    use std::sync::mpsc;
    use std::time::Duration;
    use stemloop::audio::{AudioOutput, RodioLoader, RouteMonitor};
    use stemloop::looper::LooperSettings;
    use stemloop::utils::progress::create_progress_spinner;

    use super::terminal::RawTerminal;

    log::info!("Starting looper with {} tracks", files.len());

    let output = AudioOutput::open_default()?;
    let spinner = create_progress_spinner(format!("Decoding {} tracks...", files.len()));
    let loaded = Looper::load(
        &RodioLoader::new(&output),
        files,
        LooperSettings::from_config(config),
    );
    spinner.finish_and_clear();
    let mut looper = loaded?;

    let (signal_tx, signal_rx) = mpsc::channel();
    let _monitor = RouteMonitor::spawn(
        Duration::from_millis(config.route_poll_interval_ms),
        signal_tx,
    );

    let terminal = RawTerminal::enter()?;
    terminal.println("space play/stop  [ ] rate  1-9 track  ←→ pan  ↑↓ volume  i/e interrupt  q quit")?;

    let mut selected = 0;
    loop {
        while let Ok(signal) = signal_rx.try_recv() {
            looper.handle_signal(signal);
            terminal.println(&format!("Audio signal: {signal:?}"))?;
        }

        terminal.status(&status_line(&looper, selected))?;

        let action = match terminal.poll_key(Duration::from_millis(50))? {
            Some(KeyCode::Char(c)) => LoopAction::from_char(c),
            Some(KeyCode::Left) => Some(LoopAction::Pan(-STEP)),
            Some(KeyCode::Right) => Some(LoopAction::Pan(STEP)),
            Some(KeyCode::Up) => Some(LoopAction::Volume(STEP)),
            Some(KeyCode::Down) => Some(LoopAction::Volume(-STEP)),
            Some(KeyCode::Esc) => Some(LoopAction::Quit),
            _ => None,
        };

        match action {
            Some(LoopAction::Quit) => break,
            Some(action) => {
                if let Err(message) = apply_action(&mut looper, &mut selected, action) {
                    terminal.println(&message)?;
                }
            }
            None => {}
        }
    }

    looper.stop();
    log::info!("Looper closed");
    Ok(())
}

/// Apply one key action. Rejected requests come back as a message to show;
/// they never end the session.
#[cfg(feature = "playback")]
pub fn apply_action<H: TrackHandle>(
    looper: &mut Looper<H, SystemClock>,
    selected: &mut usize,
    action: LoopAction,
) -> Result<(), String> {
    match action {
        LoopAction::Toggle => {
            looper.toggle().map_err(|e| e.to_string())?;
        }
        LoopAction::Rate(delta) => {
            looper
                .set_rate(stepped(looper.rate(), delta))
                .map_err(|e| e.to_string())?;
        }
        LoopAction::Select(index) => {
            if index >= looper.tracks().len() {
                return Err(format!("No track {}", index + 1));
            }
            *selected = index;
        }
        LoopAction::Pan(delta) => {
            let current = looper.pan(*selected).unwrap_or_default();
            looper
                .set_pan(*selected, stepped(current, delta))
                .map_err(|e| e.to_string())?;
        }
        LoopAction::Volume(delta) => {
            let current = looper.volume(*selected).unwrap_or_default();
            looper
                .set_volume(*selected, stepped(current, delta))
                .map_err(|e| e.to_string())?;
        }
        LoopAction::InterruptionBegan => looper.on_interruption_began(),
        LoopAction::InterruptionEnded => looper.on_interruption_ended(true),
        LoopAction::Quit => {}
    }
    Ok(())
}

#[cfg(feature = "playback")]
fn status_line<H: TrackHandle>(looper: &Looper<H, SystemClock>, selected: usize) -> String {
    use owo_colors::OwoColorize;

    let state = match looper.state() {
        TransportState::Playing => format!("{}", "▶ playing".green()),
        TransportState::Stopped => format!("{}", "■ stopped".yellow()),
    };

    let tracks: Vec<String> = looper
        .tracks()
        .iter()
        .map(|track| {
            let label = format!(
                "{}:{:+.1}/{:.1}",
                track.index() + 1,
                track.pan(),
                track.volume()
            );
            if track.index() == selected {
                format!("{}", label.cyan().bold())
            } else {
                label
            }
        })
        .collect();

    format!("{state}  rate {:.1}x  {}", looper.rate(), tracks.join("  "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(LoopAction::from_char(' '), Some(LoopAction::Toggle));
        assert_eq!(LoopAction::from_char(']'), Some(LoopAction::Rate(STEP)));
        assert_eq!(LoopAction::from_char('1'), Some(LoopAction::Select(0)));
        assert_eq!(LoopAction::from_char('9'), Some(LoopAction::Select(8)));
        assert_eq!(LoopAction::from_char('0'), None);
        assert_eq!(LoopAction::from_char('q'), Some(LoopAction::Quit));
        assert_eq!(LoopAction::from_char('x'), None);
    }

    #[test]
    fn test_stepped_lands_on_edges() {
        let mut rate = 1.0;
        for _ in 0..10 {
            rate = stepped(rate, STEP);
        }
        assert_eq!(rate, 2.0);
        assert_eq!(stepped(0.5, -STEP), 0.4);
        assert_eq!(stepped(-0.9, -STEP), -1.0);
    }
}
