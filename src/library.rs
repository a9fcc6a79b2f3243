//! Picking a story out of a directory
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::display::DisplayBuffer;
use crate::display_trait::DisplayError;
use crate::error::CommandError;

const STORY_EXTENSIONS: &[&str] = &["z3", "z5", "z8", "dat"];

/// Story files in `dir`, sorted by file name
pub fn find_stories(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut stories = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_story = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| STORY_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false);
        if is_story && path.is_file() {
            stories.push(path);
        }
    }
    stories.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!("Found {} stories in {}", stories.len(), dir.display());
    Ok(stories)
}

/// Parse a menu answer: `Some(index)` for a story, `None` for 0 (exit)
pub fn parse_selection(input: &str, count: usize) -> Result<Option<usize>, CommandError> {
    let input = input.trim();
    let value: usize = input
        .parse()
        .map_err(|_| CommandError::NotANumber(input.to_string()))?;
    match value {
        0 => Ok(None),
        n if n <= count => Ok(Some(n - 1)),
        _ => Err(CommandError::OutOfRange { value, max: count }),
    }
}

/// Let the player choose one of `stories`, re-asking until the answer is
/// usable. A single story is chosen without asking.
pub fn choose_story<'a>(
    display: &mut DisplayBuffer,
    stories: &'a [PathBuf],
) -> Result<Option<&'a Path>, DisplayError> {
    match stories.len() {
        0 => return Ok(None),
        1 => return Ok(Some(stories[0].as_path())),
        _ => {}
    }

    display.print("Available stories:")?;
    for (i, story) in stories.iter().enumerate() {
        let name = story
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        display.print(&format!("  {}. {}", i + 1, name))?;
    }
    display.print("Select a story # or enter 0 to exit")?;

    loop {
        display.print(">")?;
        let answer = display.read_line()?;
        match parse_selection(&answer, stories.len()) {
            Ok(choice) => return Ok(choice.map(|i| stories[i].as_path())),
            Err(e) => display.print_error(&e.to_string())?,
        }
    }
}
