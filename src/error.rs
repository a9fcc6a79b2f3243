//! Error types for story loading, save files, meta-commands and the session
//!
//! Memory accesses have no error type: out-of-range reads return 0 and
//! out-of-range writes are dropped (see `memory.rs`).

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::display_trait::DisplayError;

/// Failure to bring a story into memory. Fatal at startup.
#[derive(Debug)]
pub enum LoadError {
    Io(PathBuf, io::Error),
    NotFound(PathBuf),
    TooSmall(usize),
    TooLarge(usize),
    UnsupportedVersion(u8),
    Config(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(path, err) => write!(f, "cannot read {}: {}", path.display(), err),
            LoadError::NotFound(path) => write!(f, "story file not found: {}", path.display()),
            LoadError::TooSmall(len) => {
                write!(f, "invalid story file - too short ({} bytes)", len)
            }
            LoadError::TooLarge(len) => write!(f, "story file too large: {} bytes", len),
            LoadError::UnsupportedVersion(v) => {
                write!(f, "unsupported Z-machine version: {}", v)
            }
            LoadError::Config(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(_, err) => Some(err),
            _ => None,
        }
    }
}

/// Save or restore failure. A failed restore never mutates the machine.
#[derive(Debug)]
pub enum SaveError {
    Io(io::Error),
    NotFound(String),
    BadMagic([u8; 4]),
    VersionMismatch { found: u8, expected: u8 },
    Truncated { needed: usize, available: usize },
    MemorySizeMismatch { found: usize, expected: usize },
    ProgramCounterOutOfRange(u32),
    FrameTooLarge(usize),
    TooManyFrames(usize),
    Frames(ProcessorError),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Io(err) => write!(f, "I/O error: {}", err),
            SaveError::NotFound(slot) => write!(f, "save file not found: {}", slot),
            SaveError::BadMagic(_) => write!(f, "invalid save file"),
            SaveError::VersionMismatch { found, expected } => write!(
                f,
                "save file version mismatch (file is version {}, story is version {})",
                found, expected
            ),
            SaveError::Truncated { needed, available } => write!(
                f,
                "save file truncated (needed {} bytes, {} available)",
                needed, available
            ),
            SaveError::MemorySizeMismatch { found, expected } => write!(
                f,
                "save file holds {} bytes of dynamic memory, story has {}",
                found, expected
            ),
            SaveError::ProgramCounterOutOfRange(pc) => {
                write!(f, "program counter {:#07x} does not fit in a save file", pc)
            }
            SaveError::FrameTooLarge(len) => write!(f, "call frame too large: {} bytes", len),
            SaveError::TooManyFrames(n) => write!(f, "too many call frames: {}", n),
            SaveError::Frames(err) => write!(f, "cannot rebuild call stack: {}", err),
        }
    }
}

impl std::error::Error for SaveError {}

impl From<io::Error> for SaveError {
    fn from(err: io::Error) -> Self {
        SaveError::Io(err)
    }
}

impl From<ProcessorError> for SaveError {
    fn from(err: ProcessorError) -> Self {
        SaveError::Frames(err)
    }
}

/// A meta-command with a bad argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    MissingArgument(&'static str),
    InvalidSlotName(String),
    UnknownTheme(String),
    NotANumber(String),
    OutOfRange { value: usize, max: usize },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::MissingArgument(cmd) => write!(f, "'{}' needs an argument", cmd),
            CommandError::InvalidSlotName(name) => write!(f, "invalid save name: '{}'", name),
            CommandError::UnknownTheme(name) => write!(f, "Unknown theme: {}", name),
            CommandError::NotANumber(text) => write!(f, "Invalid number: '{}'", text),
            CommandError::OutOfRange { max, .. } => {
                write!(f, "Invalid input, select between 0 and {}", max)
            }
        }
    }
}

impl std::error::Error for CommandError {}

/// Raised by the external instruction processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorError {
    pub message: String,
    /// Input ended while the processor was printing or reading
    pub input_closed: bool,
}

impl ProcessorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            input_closed: false,
        }
    }
}

impl fmt::Display for ProcessorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProcessorError {}

impl From<String> for ProcessorError {
    fn from(message: String) -> Self {
        ProcessorError::new(message)
    }
}

impl From<DisplayError> for ProcessorError {
    fn from(err: DisplayError) -> Self {
        ProcessorError {
            input_closed: err.input_closed,
            message: err.message,
        }
    }
}

/// Anything that can go wrong once a session exists.
#[derive(Debug)]
pub enum SessionError {
    Load(LoadError),
    Save(SaveError),
    Command(CommandError),
    Processor(ProcessorError),
    Display(DisplayError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Load(err) => write!(f, "{}", err),
            SessionError::Save(err) => write!(f, "{}", err),
            SessionError::Command(err) => write!(f, "{}", err),
            SessionError::Processor(err) => write!(f, "Game execution error: {}", err),
            SessionError::Display(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<LoadError> for SessionError {
    fn from(err: LoadError) -> Self {
        SessionError::Load(err)
    }
}

impl From<SaveError> for SessionError {
    fn from(err: SaveError) -> Self {
        SessionError::Save(err)
    }
}

impl From<CommandError> for SessionError {
    fn from(err: CommandError) -> Self {
        SessionError::Command(err)
    }
}

impl From<ProcessorError> for SessionError {
    fn from(err: ProcessorError) -> Self {
        SessionError::Processor(err)
    }
}

impl From<DisplayError> for SessionError {
    fn from(err: DisplayError) -> Self {
        SessionError::Display(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_bad_magic() {
        let err = SaveError::BadMagic(*b"FORM");
        assert_eq!(format!("{}", err), "invalid save file");
    }

    #[test]
    fn test_display_version_mismatch() {
        let err = SaveError::VersionMismatch {
            found: 5,
            expected: 3,
        };
        assert!(format!("{}", err).contains("version mismatch"));
    }

    #[test]
    fn test_display_unsupported_version() {
        let err = LoadError::UnsupportedVersion(6);
        assert_eq!(format!("{}", err), "unsupported Z-machine version: 6");
    }

    #[test]
    fn test_session_error_wraps_command_error() {
        let err: SessionError = CommandError::UnknownTheme("neon".to_string()).into();
        assert_eq!(format!("{}", err), "Unknown theme: neon");
    }
}
