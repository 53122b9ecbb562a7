//! Spinner shown while long-running work (decoding tracks, opening devices)
//! blocks the terminal.

use crate::constants::SPINNER_CHARS;
use indicatif::{ProgressBar, ProgressStyle};
use std::borrow::Cow;
use std::time::Duration;

/// Cyan spinner with the given message, ticking on its own thread.
///
/// ```ignore
/// let spinner = create_progress_spinner("Decoding 3 tracks...");
/// let tracks = decode_all(&sources)?;
/// spinner.finish_and_clear();
/// ```
pub fn create_progress_spinner(message: impl Into<Cow<'static, str>>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style.tick_strings(SPINNER_CHARS));
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_progress_spinner() {
        let spinner = create_progress_spinner("Decoding");
        assert_eq!(spinner.message(), "Decoding");
        spinner.finish_and_clear();
    }
}
