//! Scrolling text display
//!
//! The text area is a fixed ring of `rows - 2` lines under a status line.
//! Each line has a vertical position; while the ring is filling up the
//! cursor simply moves down, and once it has reached the last line every
//! further line scrolls the whole ring up by one, recycling the line that
//! left the top as the new bottom line.
//!
//! Every `rows - 3` lines without user input the buffer stops, shows
//! [`CONTINUE_PROMPT`] and waits for Enter. The prompt's row is then reused
//! by the next line, so the pause costs no scroll step.

use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::config::Config;
use crate::display_trait::{DisplayError, OutputSurface, RowStyle};
use crate::input::{InputSource, KEY_BACKSPACE, KEY_ENTER};
use crate::theme::Theme;

pub const CONTINUE_PROMPT: &str = "Press <Enter> key to continue";
pub const ERROR_PREFIX: &str = "*** ERROR: ";

/// Grid rows above the first text line (status line plus one)
const TOP_MARGIN: usize = 2;

/// Timing for line input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySettings {
    /// How long one poll for a key may block
    pub poll_interval: Duration,
    /// Blank the screen after this long without a key
    pub idle_timeout: Option<Duration>,
    /// Toggle the cursor this often while waiting for input
    pub cursor_blink: Option<Duration>,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        DisplaySettings::from(&Config::default())
    }
}

impl From<&Config> for DisplaySettings {
    fn from(config: &Config) -> Self {
        DisplaySettings {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            idle_timeout: match config.idle_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            cursor_blink: if config.cursor_blink {
                Some(Duration::from_millis(config.cursor_blink_ms))
            } else {
                None
            },
        }
    }
}

/// One row of the text area
#[derive(Debug, Clone)]
struct DisplayLine {
    text: String,
    style: RowStyle,
    /// Vertical position in rows; visible lines sit at TOP_MARGIN and below
    y: usize,
}

pub struct DisplayBuffer {
    surface: Box<dyn OutputSurface>,
    input: Box<dyn InputSource>,
    settings: DisplaySettings,
    columns: usize,
    rows: usize,
    lines: Vec<DisplayLine>,
    version: u8,
    /// Index into `lines` of the line last written
    cursor_row: Option<usize>,
    scrolling: bool,
    /// Next line goes where the continue prompt was, without scrolling
    skip_scroll: bool,
    lines_written: usize,
}

impl DisplayBuffer {
    pub fn new(
        surface: Box<dyn OutputSurface>,
        input: Box<dyn InputSource>,
        settings: DisplaySettings,
    ) -> Result<Self, DisplayError> {
        let (columns, rows) = surface.size();
        let (columns, rows) = (columns as usize, rows as usize);
        if columns == 0 || rows < 4 {
            return Err(DisplayError::new(format!(
                "display too small: {} x {}",
                columns, rows
            )));
        }
        debug!("text display: {} x {}", columns, rows);

        let lines = (0..rows - 2)
            .map(|i| DisplayLine {
                text: String::new(),
                style: RowStyle::Normal,
                y: i + TOP_MARGIN,
            })
            .collect();

        let mut display = DisplayBuffer {
            surface,
            input,
            settings,
            columns,
            rows,
            lines,
            version: 3,
            cursor_row: None,
            scrolling: false,
            skip_scroll: false,
            lines_written: 0,
        };
        display.surface.set_status(&" ".repeat(columns))?;
        display.render()?;
        Ok(display)
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Story version, which picks the status line format
    pub fn set_version(&mut self, version: u8) {
        self.version = version;
    }

    /// Print text; each `\n`-separated piece becomes at least one row
    pub fn print(&mut self, text: &str) -> Result<(), DisplayError> {
        self.print_styled(text, RowStyle::Normal)
    }

    /// Print a message the player should not mistake for story text
    pub fn print_error(&mut self, message: &str) -> Result<(), DisplayError> {
        warn!("*** ERROR: {}", message);
        self.print_styled(&format!("{}{}", ERROR_PREFIX, message), RowStyle::Error)
    }

    fn print_styled(&mut self, text: &str, style: RowStyle) -> Result<(), DisplayError> {
        let text = text.strip_suffix('\n').unwrap_or(text);
        for line in text.split('\n') {
            for row in wrap_line(line, self.columns) {
                self.add_text_line(&row, style)?;
            }
        }
        Ok(())
    }

    fn add_text_line(&mut self, line: &str, style: RowStyle) -> Result<(), DisplayError> {
        if self.lines_written >= self.rows - 3 {
            self.pause()?;
        }
        let line: String = line.chars().filter(|&c| c != '\r').collect();
        self.place_line(line, style);
        self.lines_written += 1;
        self.render()
    }

    /// Put `text` on the next row, scrolling if the ring is full
    fn place_line(&mut self, text: String, style: RowStyle) {
        let count = self.lines.len();
        if self.cursor_row.is_some_and(|row| row >= count - 1) {
            self.scrolling = true;
        }

        let row = match self.cursor_row {
            Some(row) if self.skip_scroll => {
                self.skip_scroll = false;
                row
            }
            Some(_) if self.scrolling => self.scroll_up(),
            Some(row) => (row + 1) % count,
            None => 0,
        };
        self.cursor_row = Some(row);
        self.lines[row].text = text;
        self.lines[row].style = style;
    }

    /// Move every line up one row; returns the recycled bottom line
    fn scroll_up(&mut self) -> usize {
        let count = self.lines.len();
        let mut bottom = 0;
        for (i, line) in self.lines.iter_mut().enumerate() {
            line.y -= 1;
            if line.y < TOP_MARGIN {
                line.text.clear();
                line.style = RowStyle::Normal;
                line.y = count - 1 + TOP_MARGIN;
                bottom = i;
            }
        }
        bottom
    }

    fn pause(&mut self) -> Result<(), DisplayError> {
        debug!("Pausing output after {} lines", self.lines_written);
        self.lines_written = 0;
        // one row only, so the next line can take its place
        let prompt = CONTINUE_PROMPT.chars().take(self.columns).collect();
        self.place_line(prompt, RowStyle::Normal);
        self.render()?;
        self.read_line()?;

        // clear the prompt and whatever was typed after it
        if let Some(row) = self.cursor_row {
            self.lines[row].text.clear();
        }
        self.skip_scroll = true;
        self.render()
    }

    /// Read one line of input, echoing it after the current row's text.
    ///
    /// Resets the pagination count: the player has just seen the screen.
    pub fn read_line(&mut self) -> Result<String, DisplayError> {
        self.lines_written = 0;
        if self.cursor_row.is_none() {
            self.place_line(String::new(), RowStyle::Normal);
        }

        let mut input = String::new();
        let mut last_key = Instant::now();
        let mut last_blink = Instant::now();
        let mut cursor_visible = true;
        self.draw_cursor(true)?;

        loop {
            if let Some(blink) = self.settings.cursor_blink {
                if last_blink.elapsed() >= blink {
                    last_blink = Instant::now();
                    cursor_visible = !cursor_visible;
                    self.draw_cursor(cursor_visible)?;
                }
            }
            if let Some(idle) = self.settings.idle_timeout {
                if last_key.elapsed() >= idle {
                    self.run_screen_saver()?;
                    last_key = Instant::now();
                    continue;
                }
            }

            let key = match self.input.read_key(self.settings.poll_interval)? {
                Some(key) => key,
                None => continue,
            };
            last_key = Instant::now();

            match key {
                KEY_ENTER | '\r' => break,
                KEY_BACKSPACE | '\x7f' => {
                    if input.pop().is_some() {
                        self.current_line_mut().text.pop();
                    }
                }
                ' '..='~' => {
                    input.push(key);
                    self.current_line_mut().text.push(key);
                }
                _ => {
                    // function or cursor key; drop the rest of its sequence
                    while self.input.key_available()? {
                        self.input.read_key(Duration::ZERO)?;
                    }
                }
            }
            self.render_current()?;
            self.draw_cursor(true)?;
            cursor_visible = true;
        }

        self.draw_cursor(true)?;
        Ok(input)
    }

    fn run_screen_saver(&mut self) -> Result<(), DisplayError> {
        info!("Idle timeout, starting screen saver");
        self.surface.set_screen_saver(true)?;
        self.surface.flush()?;
        // the key that wakes the screen is not part of the input
        let woken = loop {
            match self.input.read_key(self.settings.poll_interval) {
                Ok(Some(_)) => break Ok(()),
                Ok(None) => {}
                Err(e) => break Err(e),
            }
        };
        self.surface.set_screen_saver(false)?;
        woken?;
        self.render()
    }

    fn current_line_mut(&mut self) -> &mut DisplayLine {
        let row = self.cursor_row.unwrap_or(0);
        &mut self.lines[row]
    }

    /// Replace the status line, formatted for the story version
    pub fn update_status_line(
        &mut self,
        location: &str,
        score_or_hours: i16,
        moves_or_minutes: u16,
    ) -> Result<(), DisplayError> {
        let text = status_text(
            self.version,
            self.columns,
            location,
            score_or_hours,
            moves_or_minutes,
        );
        self.surface.set_status(&text)?;
        self.surface.flush()
    }

    pub fn apply_theme(&mut self, theme: &Theme) -> Result<(), DisplayError> {
        self.surface.apply_theme(theme)?;
        self.render()
    }

    /// Text of the visible rows, top to bottom
    pub fn visible_lines(&self) -> Vec<String> {
        let mut lines: Vec<&DisplayLine> = self.lines.iter().collect();
        lines.sort_by_key(|line| line.y);
        lines.into_iter().map(|line| line.text.clone()).collect()
    }

    fn grid_row(line: &DisplayLine) -> u16 {
        (line.y - 1) as u16
    }

    fn render(&mut self) -> Result<(), DisplayError> {
        for line in &self.lines {
            self.surface
                .set_row(Self::grid_row(line), &line.text, line.style)?;
        }
        self.draw_cursor(true)?;
        self.surface.flush()
    }

    fn render_current(&mut self) -> Result<(), DisplayError> {
        if let Some(row) = self.cursor_row {
            let line = &self.lines[row];
            self.surface
                .set_row(Self::grid_row(line), &line.text, line.style)?;
        }
        self.surface.flush()
    }

    fn draw_cursor(&mut self, visible: bool) -> Result<(), DisplayError> {
        let (column, row) = match self.cursor_row {
            Some(index) => {
                let line = &self.lines[index];
                (line.text.chars().count(), Self::grid_row(line))
            }
            None => (0, 1),
        };
        let column = column.min(self.columns - 1) as u16;
        self.surface.set_cursor(column, row, visible)
    }
}

/// Split a line into rows of at most `columns` characters, breaking at the
/// last space that keeps the row short enough, or hard at `columns`.
pub fn wrap_line(line: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut rows = Vec::new();
    let mut rest: Vec<char> = line.chars().collect();

    while rest.len() > columns {
        // a space right at the limit still leaves a full row
        let break_pos = (1..=columns)
            .rev()
            .find(|&i| rest[i] == ' ')
            .unwrap_or(columns);
        rows.push(rest[..break_pos].iter().collect());
        let remainder = &rest[break_pos..];
        let skip = remainder.iter().take_while(|c| c.is_whitespace()).count();
        rest = remainder[skip..].to_vec();
    }

    rows.push(rest.into_iter().collect());
    rows
}

/// Status line text, exactly `columns` characters wide.
///
/// Up to v3 the right side shows score and moves; later versions show the
/// time of day.
pub fn status_text(
    version: u8,
    columns: usize,
    location: &str,
    score_or_hours: i16,
    moves_or_minutes: u16,
) -> String {
    let text = if version <= 3 {
        format!(
            " {:<30} Score: {:>3} Moves: {:>3} ",
            location, score_or_hours, moves_or_minutes
        )
    } else {
        let time = format!("{}:{:02}", score_or_hours, moves_or_minutes);
        format!(" {:<50} {:>10} ", location, time)
    };

    let mut status: String = text.chars().take(columns).collect();
    let len = status.chars().count();
    status.extend(std::iter::repeat(' ').take(columns - len));
    status
}
