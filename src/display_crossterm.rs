//! Crossterm terminal surface
//!
//! Draws the character grid on the alternate screen: row 0 is the status
//! line in the theme's status colours, the rest is text. Rows are cached so
//! the screen can be rebuilt after a theme change or the screen saver.

use std::io::{self, Stdout, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::debug;

use crate::display_trait::{DisplayError, OutputSurface, RowStyle};
use crate::theme::{find_theme, Theme, DEFAULT_THEME};

fn rgb(colour: u32) -> Color {
    Color::Rgb {
        r: (colour >> 16) as u8,
        g: (colour >> 8) as u8,
        b: colour as u8,
    }
}

pub struct TerminalSurface {
    stdout: Stdout,
    columns: u16,
    height: u16,
    rows: Vec<(String, RowStyle)>,
    theme: Theme,
    screen_saver: bool,
}

impl TerminalSurface {
    /// Open a grid of at most `columns` x `rows`, shrunk to fit the terminal
    pub fn new(columns: u16, rows: u16) -> Result<Self, DisplayError> {
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All), MoveTo(0, 0))
            .map_err(|e| DisplayError::new(format!("Failed to initialize terminal: {}", e)))?;

        let (term_width, term_height) = terminal::size()
            .map_err(|e| DisplayError::new(format!("Failed to get terminal size: {}", e)))?;
        let columns = columns.min(term_width);
        let height = rows.min(term_height);
        debug!(
            "TerminalSurface: terminal {}x{}, using {}x{}",
            term_width, term_height, columns, height
        );

        let theme = find_theme(DEFAULT_THEME)
            .map(|(_, theme)| *theme)
            .ok_or_else(|| DisplayError::new("default theme missing"))?;

        let mut surface = TerminalSurface {
            stdout,
            columns,
            height,
            rows: vec![(String::new(), RowStyle::Normal); height as usize],
            theme,
            screen_saver: false,
        };
        surface.redraw()?;
        Ok(surface)
    }

    fn colours_for(&self, row: u16, style: RowStyle) -> (Color, Color) {
        match (row, style) {
            (0, _) => (rgb(self.theme.status), rgb(self.theme.status_bg)),
            (_, RowStyle::Error) => (rgb(self.theme.error), rgb(self.theme.bg)),
            (_, RowStyle::Normal) => (rgb(self.theme.text), rgb(self.theme.bg)),
        }
    }

    fn draw_row(&mut self, row: u16) -> Result<(), DisplayError> {
        if self.screen_saver {
            return Ok(());
        }
        let (text, style) = match self.rows.get(row as usize) {
            Some((text, style)) => (text.clone(), *style),
            None => return Ok(()),
        };
        let (fg, bg) = self.colours_for(row, style);
        let width = self.columns as usize;
        queue!(
            self.stdout,
            MoveTo(0, row),
            SetForegroundColor(fg),
            SetBackgroundColor(bg),
            Print(format!("{:<width$}", text, width = width))
        )?;
        Ok(())
    }

    fn redraw(&mut self) -> Result<(), DisplayError> {
        queue!(
            self.stdout,
            SetBackgroundColor(rgb(self.theme.bg)),
            Clear(ClearType::All)
        )?;
        for row in 0..self.height {
            self.draw_row(row)?;
        }
        self.stdout.flush()?;
        Ok(())
    }
}

impl OutputSurface for TerminalSurface {
    fn size(&self) -> (u16, u16) {
        (self.columns, self.height)
    }

    fn set_row(&mut self, row: u16, text: &str, style: RowStyle) -> Result<(), DisplayError> {
        let clipped: String = text.chars().take(self.columns as usize).collect();
        match self.rows.get_mut(row as usize) {
            Some(slot) if *slot == (clipped.clone(), style) => Ok(()),
            Some(slot) => {
                *slot = (clipped, style);
                self.draw_row(row)
            }
            None => Err(DisplayError::new(format!("row {} outside the grid", row))),
        }
    }

    fn set_status(&mut self, text: &str) -> Result<(), DisplayError> {
        self.set_row(0, text, RowStyle::Normal)
    }

    fn set_cursor(&mut self, column: u16, row: u16, visible: bool) -> Result<(), DisplayError> {
        if self.screen_saver {
            return Ok(());
        }
        if visible {
            queue!(self.stdout, MoveTo(column, row), Show)?;
        } else {
            queue!(self.stdout, Hide)?;
        }
        self.stdout.flush()?;
        Ok(())
    }

    fn set_screen_saver(&mut self, active: bool) -> Result<(), DisplayError> {
        if active == self.screen_saver {
            return Ok(());
        }
        self.screen_saver = active;
        if active {
            debug!("TerminalSurface: blanking screen");
            queue!(
                self.stdout,
                Hide,
                SetBackgroundColor(Color::Black),
                Clear(ClearType::All)
            )?;
            self.stdout.flush()?;
            Ok(())
        } else {
            self.redraw()
        }
    }

    fn apply_theme(&mut self, theme: &Theme) -> Result<(), DisplayError> {
        self.theme = *theme;
        self.redraw()
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        self.stdout.flush()?;
        Ok(())
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        let _ = execute!(self.stdout, ResetColor, Show, LeaveAlternateScreen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_splits_channels() {
        assert_eq!(rgb(0xFFB000), Color::Rgb { r: 0xFF, g: 0xB0, b: 0x00 });
        assert_eq!(rgb(0x4040E0), Color::Rgb { r: 0x40, g: 0x40, b: 0xE0 });
    }
}
