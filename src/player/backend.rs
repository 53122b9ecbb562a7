//! rodio implementation of [`MediaBackend`].

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::observed::MediaBackend;
use crate::error::PlayerError;

pub struct RodioBackend {
    _stream: OutputStream,
    sink: Sink,
    path: Option<PathBuf>,
}

impl RodioBackend {
    pub fn new() -> Result<Self, PlayerError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| PlayerError::Backend(e.to_string()))?;
        stream.log_on_drop(false);
        let sink = Sink::connect_new(stream.mixer());
        sink.pause();

        Ok(Self {
            _stream: stream,
            sink,
            path: None,
        })
    }

    fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>, PlayerError> {
        let open_error = |message: String| PlayerError::Open {
            path: path.display().to_string(),
            message,
        };
        let file = File::open(path).map_err(|e| open_error(e.to_string()))?;
        Decoder::new(BufReader::new(file)).map_err(|e| open_error(e.to_string()))
    }

    /// Queue the file again after playback drained the sink.
    fn requeue(&mut self) -> Result<(), PlayerError> {
        let path = self.path.clone().ok_or(PlayerError::NotLoaded)?;
        let decoder = Self::open_decoder(&path)?;
        let was_paused = self.sink.is_paused();
        self.sink.append(decoder);
        if was_paused {
            self.sink.pause();
        }
        Ok(())
    }
}

impl MediaBackend for RodioBackend {
    fn load(&mut self, path: &Path) -> Result<Option<Duration>, PlayerError> {
        let decoder = Self::open_decoder(path)?;
        let duration = decoder.total_duration();

        self.sink.clear();
        self.sink.append(decoder);
        self.sink.pause();
        self.path = Some(path.to_path_buf());

        log::info!("Loaded {} into player, duration {duration:?}", path.display());
        Ok(duration)
    }

    fn play(&mut self) {
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn set_speed(&mut self, speed: f32) {
        self.sink.set_speed(speed);
    }

    fn seek(&mut self, position: Duration) -> Result<(), PlayerError> {
        if self.sink.empty() {
            self.requeue()?;
        }
        self.sink
            .try_seek(position)
            .map_err(|e| PlayerError::Backend(e.to_string()))
    }

    fn position(&self) -> Duration {
        self.sink.get_pos()
    }

    fn is_finished(&self) -> bool {
        self.path.is_some() && self.sink.empty()
    }
}
