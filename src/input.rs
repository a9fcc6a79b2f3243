//! Keyboard input seam
//!
//! Keys arrive one character at a time: Enter is `'\n'`, Backspace is
//! `'\x08'`, and anything outside printable ASCII is a control key whose
//! remaining sequence the reader discards.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

pub const KEY_ENTER: char = '\n';
pub const KEY_BACKSPACE: char = '\x08';
pub const KEY_ESCAPE: char = '\x1b';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// No more input will ever arrive
    Closed,
    Device(String),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Closed => write!(f, "input closed"),
            InputError::Device(msg) => write!(f, "input error: {}", msg),
        }
    }
}

impl std::error::Error for InputError {}

pub trait InputSource {
    /// Is a key waiting to be read?
    fn key_available(&mut self) -> Result<bool, InputError>;

    /// Wait up to `timeout` for one key
    fn read_key(&mut self, timeout: Duration) -> Result<Option<char>, InputError>;
}

/// Replays a fixed sequence of keys, then reports `Closed`.
///
/// Clones share the same queue, so a test can keep one handle and feed
/// more keys after giving the other to a display buffer.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    keys: Rc<RefCell<VecDeque<char>>>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each line is followed by Enter
    pub fn from_lines(lines: &[&str]) -> Self {
        let input = Self::new();
        for line in lines {
            input.push_line(line);
        }
        input
    }

    pub fn push_str(&self, keys: &str) {
        self.keys.borrow_mut().extend(keys.chars());
    }

    pub fn push_line(&self, line: &str) {
        self.push_str(line);
        self.keys.borrow_mut().push_back(KEY_ENTER);
    }

    pub fn remaining(&self) -> usize {
        self.keys.borrow().len()
    }
}

impl InputSource for ScriptedInput {
    fn key_available(&mut self) -> Result<bool, InputError> {
        Ok(!self.keys.borrow().is_empty())
    }

    fn read_key(&mut self, _timeout: Duration) -> Result<Option<char>, InputError> {
        match self.keys.borrow_mut().pop_front() {
            Some(key) => Ok(Some(key)),
            None => Err(InputError::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_input_replays_then_closes() {
        let mut input = ScriptedInput::from_lines(&["ab"]);
        assert!(input.key_available().unwrap());
        assert_eq!(input.read_key(Duration::ZERO), Ok(Some('a')));
        assert_eq!(input.read_key(Duration::ZERO), Ok(Some('b')));
        assert_eq!(input.read_key(Duration::ZERO), Ok(Some(KEY_ENTER)));
        assert!(!input.key_available().unwrap());
        assert_eq!(input.read_key(Duration::ZERO), Err(InputError::Closed));
    }

    #[test]
    fn test_clones_share_the_queue() {
        let feeder = ScriptedInput::new();
        let mut reader = feeder.clone();
        feeder.push_str("x");
        assert_eq!(reader.read_key(Duration::ZERO), Ok(Some('x')));
        assert_eq!(feeder.remaining(), 0);
    }
}
