use std::error::Error;
use stemloop::config::Config;

pub fn handle_record() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    super::init_logging(&config)?;

    #[cfg(feature = "playback")]
    {
        run(&config)
    }

    #[cfg(not(feature = "playback"))]
    {
        super::print_playback_unavailable("Voice Memo");
        Ok(())
    }
}

#[cfg(feature = "playback")]
fn run(config: &Config) -> Result<(), Box<dyn Error>> {
    use crossterm::event::KeyCode;
    use owo_colors::OwoColorize;
    use std::sync::mpsc;
    use std::time::{Duration, Instant};
    use stemloop::memo::{InputCapture, MemoRecorder, MeterReading, RecorderState, format_clock};

    use super::terminal::RawTerminal;

    const MEMO_TIME_INTERVAL: Duration = Duration::from_millis(500);

    let mut recorder = MemoRecorder::new(&config.memo_dir_path(), config.memo_sample_rate);

    let (samples_tx, samples_rx) = mpsc::channel();
    let capture = InputCapture::open(samples_tx)?;
    if capture.sample_rate() != config.memo_sample_rate {
        log::warn!(
            "Input device {} runs at {} Hz, recording at that rate instead of {} Hz",
            capture.device_name(),
            capture.sample_rate(),
            config.memo_sample_rate
        );
        recorder.set_sample_rate(capture.sample_rate())?;
    }

    let mut player: Option<MemoPlayer> = None;
    let meter_period = Duration::from_secs_f64(1.0 / f64::from(config.meter_refresh_hz.max(1)));
    let mut next_meter = Instant::now();
    let mut reading = MeterReading::SILENT;

    let terminal = RawTerminal::enter()?;
    terminal.println("r record/pause  s stop  p play memo  q quit")?;

    loop {
        while let Ok(buffer) = samples_rx.try_recv() {
            recorder.push_samples(&buffer)?;
        }

        let now = Instant::now();
        if now >= next_meter {
            reading = recorder.meter();
            next_meter = now + meter_period;
        }
        if let Some(player) = player.as_mut() {
            player.tick(now);
        }

        let line = match recorder.state() {
            RecorderState::Recording => format!(
                "{} {}  avg {:6.1} dB  peak {:6.1} dB",
                "● REC".red().bold(),
                format_clock(Some(recorder.elapsed())),
                reading.average_db,
                reading.peak_db
            ),
            RecorderState::Paused => format!(
                "{} {}",
                "‖ paused".yellow(),
                format_clock(Some(recorder.elapsed()))
            ),
            RecorderState::Idle | RecorderState::Finished => {
                let elapsed = player.as_ref().and_then(|p| p.observer().elapsed);
                format!("{} {}", "▶".green(), format_clock(elapsed))
            }
        };
        terminal.status(&line)?;

        let Some(key) = terminal.poll_key(Duration::from_millis(50))? else {
            continue;
        };

        let result: Result<(), Box<dyn Error>> = match key {
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Char('r') => {
                if let Some(player) = player.as_mut()
                    && player.rate() != 0.0
                    && let Err(e) = player.play_pause()
                {
                    log::warn!("Could not pause memo playback: {e}");
                }
                if recorder.state() == RecorderState::Recording {
                    recorder.pause().map_err(Into::into)
                } else {
                    recorder.record().map_err(Into::into)
                }
            }
            KeyCode::Char('s') => recorder
                .stop()
                .map(|path| log::info!("Memo ready at {}", path.display()))
                .map_err(Into::into),
            KeyCode::Char('p') => play_memo(&mut player, &recorder, MEMO_TIME_INTERVAL),
            _ => Ok(()),
        };
        if let Err(e) = result {
            terminal.println(&format!("{}", e.to_string().red()))?;
        }
    }

    if matches!(
        recorder.state(),
        RecorderState::Recording | RecorderState::Paused
    ) {
        recorder.stop()?;
    }
    Ok(())
}

#[cfg(feature = "playback")]
type MemoPlayer =
    stemloop::player::ObservedPlayer<stemloop::player::RodioBackend, super::play::StatusObserver>;

/// Pause the memo if it is playing, otherwise play the latest take from the
/// start.
#[cfg(feature = "playback")]
fn play_memo(
    player: &mut Option<MemoPlayer>,
    recorder: &stemloop::memo::MemoRecorder,
    interval: std::time::Duration,
) -> Result<(), Box<dyn Error>> {
    use stemloop::memo::RecorderState;
    use stemloop::player::{ObservedPlayer, RodioBackend};

    if let Some(player) = player.as_mut()
        && player.rate() != 0.0
    {
        player.play_pause()?;
        return Ok(());
    }

    if recorder.state() != RecorderState::Finished {
        return Err("Nothing to play yet. Record and stop a memo first.".into());
    }

    let player = match player.take() {
        Some(existing) => player.insert(existing),
        None => player.insert(ObservedPlayer::with_interval(
            RodioBackend::new()?,
            Default::default(),
            interval,
        )),
    };

    player.open(recorder.memo_path())?;
    player.play_pause()?;
    Ok(())
}
