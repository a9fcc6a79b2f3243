//! Keyboard input from the real terminal
//!
//! When stdin is a terminal, keys come from crossterm's event system in raw
//! mode; `event::poll` blocks until a key arrives or the timeout expires, so
//! the display can blink its cursor between keys. Piped input is read line
//! by line and replayed one key at a time.

use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal,
};
use log::{debug, info};

use crate::input::{InputError, InputSource, KEY_BACKSPACE, KEY_ENTER, KEY_ESCAPE};

/// Pick the input that matches how stdin is connected
pub fn stdin_input() -> Result<Box<dyn InputSource>, InputError> {
    if atty::is(atty::Stream::Stdin) {
        debug!("Terminal input detected - using raw key events");
        Ok(Box::new(TerminalInput::new()?))
    } else {
        debug!("Input is piped/redirected - using line reads");
        Ok(Box::new(PipedInput::new()))
    }
}

pub struct TerminalInput {
    in_raw_mode: bool,
}

impl TerminalInput {
    pub fn new() -> Result<Self, InputError> {
        terminal::enable_raw_mode()
            .map_err(|e| InputError::Device(format!("Failed to enable raw mode: {}", e)))?;
        info!("Raw keyboard input active");
        Ok(TerminalInput { in_raw_mode: true })
    }

    fn cleanup(&mut self) {
        if self.in_raw_mode {
            let _ = terminal::disable_raw_mode();
            self.in_raw_mode = false;
        }
    }
}

impl Drop for TerminalInput {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Translate one key event, or `None` for events that are not key presses
fn map_key(key: KeyEvent) -> Result<Option<char>, InputError> {
    if key.kind != KeyEventKind::Press {
        return Ok(None);
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('d') => {
                debug!("Ctrl-{:?} pressed, closing input", key.code);
                Err(InputError::Closed)
            }
            _ => Ok(Some(KEY_ESCAPE)),
        };
    }
    Ok(Some(match key.code {
        KeyCode::Enter => KEY_ENTER,
        KeyCode::Backspace => KEY_BACKSPACE,
        KeyCode::Char(ch) => ch,
        _ => KEY_ESCAPE,
    }))
}

fn device_error(error: io::Error) -> InputError {
    InputError::Device(error.to_string())
}

impl InputSource for TerminalInput {
    fn key_available(&mut self) -> Result<bool, InputError> {
        event::poll(Duration::ZERO).map_err(device_error)
    }

    fn read_key(&mut self, timeout: Duration) -> Result<Option<char>, InputError> {
        if !event::poll(timeout).map_err(device_error)? {
            return Ok(None);
        }
        match event::read().map_err(device_error)? {
            Event::Key(key) => map_key(key),
            // mouse, focus and resize events are not keys
            _ => Ok(None),
        }
    }
}

/// Lines from a redirected stdin, replayed as keys
#[derive(Default)]
pub struct PipedInput {
    pending: VecDeque<char>,
}

impl PipedInput {
    pub fn new() -> Self {
        Self::default()
    }

    fn fill(&mut self) -> Result<(), InputError> {
        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(device_error)?;
        if read == 0 {
            return Err(InputError::Closed);
        }
        let line = line.trim_end_matches(&['\n', '\r'][..]);
        self.pending.extend(line.chars());
        self.pending.push_back(KEY_ENTER);
        Ok(())
    }
}

impl InputSource for PipedInput {
    fn key_available(&mut self) -> Result<bool, InputError> {
        Ok(!self.pending.is_empty())
    }

    fn read_key(&mut self, _timeout: Duration) -> Result<Option<char>, InputError> {
        if self.pending.is_empty() {
            self.fill()?;
        }
        Ok(self.pending.pop_front())
    }
}
