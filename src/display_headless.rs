//! Headless surface for testing and non-interactive environments
//!
//! Keeps the character grid in memory. Clones share the grid so a test can
//! hand one clone to a display buffer and inspect the other.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::display_trait::{DisplayError, OutputSurface, RowStyle};
use crate::theme::Theme;

#[derive(Debug)]
pub struct HeadlessState {
    pub rows: Vec<String>,
    pub styles: Vec<RowStyle>,
    pub cursor: (u16, u16),
    pub cursor_visible: bool,
    pub screen_saver: bool,
    pub screen_saver_activations: usize,
    pub theme: Option<Theme>,
}

#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    columns: u16,
    height: u16,
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessSurface {
    pub fn new(columns: u16, rows: u16) -> Self {
        Self {
            columns,
            height: rows,
            state: Rc::new(RefCell::new(HeadlessState {
                rows: vec![String::new(); rows as usize],
                styles: vec![RowStyle::Normal; rows as usize],
                cursor: (0, 0),
                cursor_visible: false,
                screen_saver: false,
                screen_saver_activations: 0,
                theme: None,
            })),
        }
    }

    /// Text of one grid row
    pub fn row(&self, row: u16) -> String {
        self.state
            .borrow()
            .rows
            .get(row as usize)
            .cloned()
            .unwrap_or_default()
    }

    pub fn row_style(&self, row: u16) -> RowStyle {
        self.state
            .borrow()
            .styles
            .get(row as usize)
            .copied()
            .unwrap_or_default()
    }

    pub fn status(&self) -> String {
        self.row(0)
    }

    /// All rows below the status line
    pub fn text_rows(&self) -> Vec<String> {
        self.state.borrow().rows.iter().skip(1).cloned().collect()
    }

    /// Whether any row contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.state.borrow().rows.iter().any(|row| row.contains(needle))
    }

    pub fn cursor(&self) -> (u16, u16) {
        self.state.borrow().cursor
    }

    pub fn screen_saver_activations(&self) -> usize {
        self.state.borrow().screen_saver_activations
    }

    pub fn screen_saver_active(&self) -> bool {
        self.state.borrow().screen_saver
    }

    pub fn theme(&self) -> Option<Theme> {
        self.state.borrow().theme
    }

    /// Grid as text, one line per row
    pub fn get_output(&self) -> String {
        self.state.borrow().rows.join("\n")
    }
}

impl OutputSurface for HeadlessSurface {
    fn size(&self) -> (u16, u16) {
        (self.columns, self.height)
    }

    fn set_row(&mut self, row: u16, text: &str, style: RowStyle) -> Result<(), DisplayError> {
        let mut state = self.state.borrow_mut();
        match state.rows.get_mut(row as usize) {
            Some(slot) => {
                *slot = text.chars().take(self.columns as usize).collect();
                state.styles[row as usize] = style;
                Ok(())
            }
            None => Err(DisplayError::new(format!("row {} outside the grid", row))),
        }
    }

    fn set_status(&mut self, text: &str) -> Result<(), DisplayError> {
        self.set_row(0, text, RowStyle::Normal)
    }

    fn set_cursor(&mut self, column: u16, row: u16, visible: bool) -> Result<(), DisplayError> {
        let mut state = self.state.borrow_mut();
        state.cursor = (column, row);
        state.cursor_visible = visible;
        Ok(())
    }

    fn set_screen_saver(&mut self, active: bool) -> Result<(), DisplayError> {
        debug!("Headless: screen saver {}", if active { "on" } else { "off" });
        let mut state = self.state.borrow_mut();
        if active && !state.screen_saver {
            state.screen_saver_activations += 1;
        }
        state.screen_saver = active;
        Ok(())
    }

    fn apply_theme(&mut self, theme: &Theme) -> Result<(), DisplayError> {
        self.state.borrow_mut().theme = Some(*theme);
        Ok(())
    }
}
