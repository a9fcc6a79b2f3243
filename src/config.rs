//! Runtime settings, read from an optional TOML file
//!
//! Every field has a default, so an empty file (or no file) is valid.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::error::LoadError;
use crate::save::{valid_slot_name, DEFAULT_SLOT};
use crate::theme::{find_theme, DEFAULT_THEME};

pub const MIN_COLUMNS: u16 = 20;
pub const MIN_ROWS: u16 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub columns: u16,
    pub rows: u16,
    pub save_dir: PathBuf,
    /// Instructions per scheduling batch
    pub batch_size: u32,
    pub poll_interval_ms: u64,
    /// 0 disables the screen saver
    pub idle_timeout_secs: u64,
    pub cursor_blink: bool,
    pub cursor_blink_ms: u64,
    pub theme: String,
    pub default_slot: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            columns: 80,
            rows: 25,
            save_dir: PathBuf::from("saves"),
            batch_size: 100,
            poll_interval_ms: 1,
            idle_timeout_secs: 300,
            cursor_blink: true,
            cursor_blink_ms: 500,
            theme: DEFAULT_THEME.to_string(),
            default_slot: DEFAULT_SLOT.to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        debug!("Loading configuration from {}", path.display());
        let text = fs::read_to_string(path).map_err(|e| LoadError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, LoadError> {
        let config: Config =
            toml::from_str(text).map_err(|e| LoadError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), LoadError> {
        if self.columns < MIN_COLUMNS || self.rows < MIN_ROWS {
            return Err(LoadError::Config(format!(
                "display must be at least {} x {}, got {} x {}",
                MIN_COLUMNS, MIN_ROWS, self.columns, self.rows
            )));
        }
        if self.batch_size == 0 {
            return Err(LoadError::Config("batch_size must be at least 1".to_string()));
        }
        if find_theme(&self.theme).is_none() {
            return Err(LoadError::Config(format!("unknown theme '{}'", self.theme)));
        }
        if !valid_slot_name(&self.default_slot.trim().to_lowercase()) {
            return Err(LoadError::Config(format!(
                "invalid default_slot '{}'",
                self.default_slot
            )));
        }
        Ok(())
    }
}
