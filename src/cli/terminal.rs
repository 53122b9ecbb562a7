//! Raw-mode terminal plumbing shared by the interactive commands.

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    style::Print,
    terminal::{Clear, ClearType, disable_raw_mode, enable_raw_mode},
};
use std::error::Error;
use std::io::{self, Write};
use std::time::Duration;

/// Raw mode for as long as the guard lives.
pub struct RawTerminal;

impl RawTerminal {
    pub fn enter() -> Result<Self, Box<dyn Error>> {
        enable_raw_mode()?;
        execute!(io::stdout(), cursor::Hide)?;
        Ok(Self)
    }

    /// Print a line above the status line.
    pub fn println(&self, line: &str) -> Result<(), Box<dyn Error>> {
        execute!(
            io::stdout(),
            cursor::MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(line),
            Print("\r\n")
        )?;
        Ok(())
    }

    /// Redraw the single status line in place.
    pub fn status(&self, line: &str) -> Result<(), Box<dyn Error>> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            cursor::MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(line)
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Next key press within `timeout`, if any.
    pub fn poll_key(&self, timeout: Duration) -> Result<Option<KeyCode>, Box<dyn Error>> {
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            return Ok(Some(key.code));
        }
        Ok(None)
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), cursor::Show, Print("\r\n"));
        let _ = disable_raw_mode();
    }
}
