//! Core trait for the character-grid output surface
//!
//! The display buffer decides what goes on each row; a surface only draws
//! it, whether that is a real terminal or an in-memory grid for tests.

use std::fmt;

use crate::input::InputError;
use crate::theme::Theme;

/// How a row should be drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowStyle {
    #[default]
    Normal,
    /// Error lines, drawn in the theme's error colour
    Error,
}

/// Fixed-size monospace grid. Row 0 is the status line.
pub trait OutputSurface {
    /// Grid size as (columns, rows)
    fn size(&self) -> (u16, u16);

    /// Replace the text of one row
    fn set_row(&mut self, row: u16, text: &str, style: RowStyle) -> Result<(), DisplayError>;

    /// Replace the status line
    fn set_status(&mut self, text: &str) -> Result<(), DisplayError>;

    /// Move the single-cell cursor indicator, or hide it
    fn set_cursor(&mut self, column: u16, row: u16, visible: bool) -> Result<(), DisplayError>;

    /// Blank the whole screen while idle, or bring it back
    fn set_screen_saver(&mut self, active: bool) -> Result<(), DisplayError>;

    fn apply_theme(&mut self, theme: &Theme) -> Result<(), DisplayError>;

    /// Push pending drawing to the device
    fn flush(&mut self) -> Result<(), DisplayError> {
        Ok(())
    }
}

/// Display error type
#[derive(Debug, Clone)]
pub struct DisplayError {
    pub message: String,
    /// The input source has ended; no more lines will arrive
    pub input_closed: bool,
}

impl DisplayError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            input_closed: false,
        }
    }
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Display error: {}", self.message)
    }
}

impl std::error::Error for DisplayError {}

impl From<std::io::Error> for DisplayError {
    fn from(error: std::io::Error) -> Self {
        Self::new(format!("I/O error: {}", error))
    }
}

impl From<InputError> for DisplayError {
    fn from(error: InputError) -> Self {
        Self {
            message: error.to_string(),
            input_closed: matches!(error, InputError::Closed),
        }
    }
}
