//! One interactive session: a loaded story, its instruction processor, the
//! display and the save slots.
//!
//! The session runs the processor in bounded batches and intercepts
//! meta-commands in each input line before the story sees it. After the
//! story is loaded nothing ends the session except `quit`, the story
//! finishing, or the input running dry; every other failure becomes an
//! error line on the display.

use std::fmt;
use std::path::Path;

use log::{debug, error, info};

use crate::config::Config;
use crate::display::DisplayBuffer;
use crate::display_trait::DisplayError;
use crate::error::{CommandError, LoadError, SessionError};
use crate::game::Game;
use crate::processor::{InstructionProcessor, ProcessorFactory, Step};
use crate::save::SaveStore;
use crate::theme::{find_theme, theme_names};
use crate::vm::VM;

/// Commands handled by the session itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaCommand {
    Help,
    Themes,
    Theme(String),
    Save,
    Restore,
    Restart,
    Quit,
}

impl MetaCommand {
    /// Match a line of input, ignoring case and surrounding space.
    ///
    /// `None` means the line is game input.
    pub fn parse(line: &str) -> Option<Result<MetaCommand, CommandError>> {
        let line = line.trim().to_lowercase();
        let mut words = line.splitn(2, char::is_whitespace);
        let command = words.next().unwrap_or_default();
        let argument = words.next().map(str::trim).unwrap_or_default();

        let parsed = match (command, argument) {
            ("help", "") => Ok(MetaCommand::Help),
            ("themes", "") => Ok(MetaCommand::Themes),
            ("theme", "") => Err(CommandError::MissingArgument("theme")),
            ("theme", name) => Ok(MetaCommand::Theme(name.to_string())),
            ("save", "") => Ok(MetaCommand::Save),
            ("restore", "") => Ok(MetaCommand::Restore),
            ("restart", "") => Ok(MetaCommand::Restart),
            ("quit", "") => Ok(MetaCommand::Quit),
            _ => return None,
        };
        Some(parsed)
    }
}

impl fmt::Display for MetaCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaCommand::Help => write!(f, "help"),
            MetaCommand::Themes => write!(f, "themes"),
            MetaCommand::Theme(name) => write!(f, "theme {}", name),
            MetaCommand::Save => write!(f, "save"),
            MetaCommand::Restore => write!(f, "restore"),
            MetaCommand::Restart => write!(f, "restart"),
            MetaCommand::Quit => write!(f, "quit"),
        }
    }
}

const HELP_TEXT: &[&str] = &[
    "Commands:",
    "  help     - Show this help",
    "  save     - Save current game",
    "  restore  - Restore saved game",
    "  restart  - Restart game",
    "  themes   - List available themes",
    "  theme <name> - Change color theme",
    "  quit     - Exit",
    "Game commands depend on the loaded story.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Executing instructions
    Running,
    /// The story is waiting for a line of input
    AwaitingInput,
    /// Execution stopped on an error; meta-commands still work
    Halted,
    Ended,
}

pub struct Session {
    vm: VM,
    processor: Box<dyn InstructionProcessor>,
    display: DisplayBuffer,
    saves: SaveStore,
    batch_size: u64,
    theme: &'static str,
    state: SessionState,
}

impl Session {
    /// Load a story file and get its processor ready to run
    pub fn start(
        story_path: &Path,
        config: &Config,
        factory: &dyn ProcessorFactory,
        mut display: DisplayBuffer,
    ) -> Result<Self, SessionError> {
        let name = story_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        display.print(&format!("Loading {}...", name))?;
        let game = Game::from_file(story_path)?;
        Session::new(game, config, factory, display)
    }

    /// Set up a session for an already loaded story
    pub fn new(
        game: Game,
        config: &Config,
        factory: &dyn ProcessorFactory,
        mut display: DisplayBuffer,
    ) -> Result<Self, SessionError> {
        let mut processor = factory
            .create(&game.header)
            .ok_or(LoadError::UnsupportedVersion(game.header.version))?;

        let (theme, colours) = find_theme(&config.theme)
            .ok_or_else(|| LoadError::Config(format!("unknown theme '{}'", config.theme)))?;
        display.apply_theme(colours)?;
        display.set_version(game.header.version);

        let saves = SaveStore::new(&config.save_dir, &game.story_stem(), &config.default_slot);
        let story_len = game.story_len;
        let mut vm = VM::new(game);
        processor.init_frame(&mut vm);
        info!(
            "Session started: version {}, PC {:04x}, batch size {}",
            vm.version(),
            vm.pc,
            config.batch_size
        );

        display.print(&format!("Story size: {} bytes", story_len))?;
        display.print("Type 'help' for commands")?;

        Ok(Session {
            vm,
            processor,
            display,
            saves,
            batch_size: config.batch_size.max(1) as u64,
            theme,
            state: SessionState::Running,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn vm(&self) -> &VM {
        &self.vm
    }

    pub fn vm_mut(&mut self) -> &mut VM {
        &mut self.vm
    }

    pub fn display(&self) -> &DisplayBuffer {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut DisplayBuffer {
        &mut self.display
    }

    pub fn saves(&self) -> &SaveStore {
        &self.saves
    }

    pub fn theme(&self) -> &'static str {
        self.theme
    }

    /// Execute at most one batch of instructions
    pub fn run_batch(&mut self) -> Result<SessionState, SessionError> {
        if self.state != SessionState::Running {
            return Ok(self.state);
        }

        let target = self.processor.instruction_count() + self.batch_size;
        for _ in 0..self.batch_size {
            if self.vm.pc as usize >= self.vm.game.memory.len() {
                let pc = self.vm.pc;
                self.halt(&format!("program counter {:#x} is outside memory", pc))?;
                break;
            }

            match self
                .processor
                .execute_instruction(&mut self.vm, &mut self.display)
            {
                Ok(Step::Continue) => {}
                Ok(Step::AwaitInput) => {
                    self.state = SessionState::AwaitingInput;
                    break;
                }
                Ok(Step::Quit) => {
                    info!("Story finished");
                    self.display.print("Game is no longer running")?;
                    self.state = SessionState::Ended;
                    break;
                }
                Err(e) if e.input_closed => {
                    info!("Input closed during story output");
                    self.state = SessionState::Ended;
                    break;
                }
                Err(e) => {
                    self.halt(&e.to_string())?;
                    break;
                }
            }

            if self.processor.instruction_count() >= target {
                break;
            }
        }

        debug!(
            "Batch done at {} instructions, PC {:04x}",
            self.processor.instruction_count(),
            self.vm.pc
        );
        Ok(self.state)
    }

    fn halt(&mut self, message: &str) -> Result<(), DisplayError> {
        error!("Game execution error: {}", message);
        self.state = SessionState::Halted;
        self.display
            .print_error(&format!("Game execution error: {}", message))
    }

    /// Act on one line typed by the player
    pub fn handle_line(&mut self, line: &str) -> Result<(), SessionError> {
        match MetaCommand::parse(line) {
            Some(Ok(command)) => {
                debug!("Meta-command: {}", command);
                self.execute(command)?;
                if self.state == SessionState::AwaitingInput {
                    self.display.print(">")?;
                }
            }
            Some(Err(e)) => self.display.print_error(&e.to_string())?,
            None => self.forward(line)?,
        }
        Ok(())
    }

    fn forward(&mut self, line: &str) -> Result<(), DisplayError> {
        match self.state {
            SessionState::AwaitingInput | SessionState::Running => {
                match self.processor.provide_input(&mut self.vm, line) {
                    Ok(()) => self.state = SessionState::Running,
                    Err(e) => self.halt(&e.to_string())?,
                }
                Ok(())
            }
            SessionState::Halted => self
                .display
                .print_error("The game has stopped; use restore, restart or quit"),
            SessionState::Ended => Ok(()),
        }
    }

    fn execute(&mut self, command: MetaCommand) -> Result<(), DisplayError> {
        match command {
            MetaCommand::Help => {
                for line in HELP_TEXT {
                    self.display.print(line)?;
                }
            }
            MetaCommand::Themes => {
                self.display.print("Available themes:")?;
                for name in theme_names() {
                    let marker = if name == self.theme { " (current)" } else { "" };
                    self.display.print(&format!("  {}{}", name, marker))?;
                }
            }
            MetaCommand::Theme(name) => match find_theme(&name) {
                Some((name, colours)) => {
                    self.display.apply_theme(colours)?;
                    self.theme = name;
                    info!("Theme changed to {}", name);
                    self.display.print(&format!("Theme changed to: {}", name))?;
                }
                None => self
                    .display
                    .print_error(&CommandError::UnknownTheme(name).to_string())?,
            },
            MetaCommand::Save => self.save()?,
            MetaCommand::Restore => self.restore()?,
            MetaCommand::Restart => {
                info!("Restarting story");
                self.vm.reset();
                self.processor.init_frame(&mut self.vm);
                self.state = SessionState::Running;
                self.display.print("Restarting...")?;
            }
            MetaCommand::Quit => {
                info!("Quit requested");
                self.state = SessionState::Ended;
            }
        }
        Ok(())
    }

    /// Ask for a slot name; `None` if what was typed is not a valid name
    fn prompt_slot(&mut self) -> Result<Option<String>, DisplayError> {
        self.display
            .print(&format!("Enter file name ({}):", self.saves.last_slot()))?;
        let answer = self.display.read_line()?;
        match self.saves.resolve_slot(&answer) {
            Ok(slot) => Ok(Some(slot)),
            Err(e) => {
                self.display.print_error(&e.to_string())?;
                Ok(None)
            }
        }
    }

    fn save(&mut self) -> Result<(), DisplayError> {
        let Some(slot) = self.prompt_slot()? else {
            return Ok(());
        };
        match self.saves.save(&slot, &self.vm, self.processor.as_ref()) {
            Ok(_) => self.display.print(&format!("Game saved as {}", slot)),
            Err(e) => self.display.print_error(&format!("Save failed: {}", e)),
        }
    }

    fn restore(&mut self) -> Result<(), DisplayError> {
        let Some(slot) = self.prompt_slot()? else {
            return Ok(());
        };
        match self
            .saves
            .restore(&slot, &mut self.vm, self.processor.as_mut())
        {
            Ok(()) => {
                if self.state != SessionState::Ended {
                    self.state = SessionState::Running;
                }
                self.display.print(&format!("Game restored from {}", slot))
            }
            Err(e) => self.display.print_error(&format!("Restore failed: {}", e)),
        }
    }

    /// Run until the story ends, the player quits or input runs out
    pub fn run(&mut self) -> Result<(), SessionError> {
        while self.state != SessionState::Ended {
            let step = match self.state {
                SessionState::Running => self.run_batch().map(|_| ()),
                _ => self
                    .display
                    .read_line()
                    .map_err(SessionError::from)
                    .and_then(|line| self.handle_line(&line)),
            };
            match step {
                Ok(()) => std::thread::yield_now(),
                Err(SessionError::Display(e)) if e.input_closed => {
                    info!("Input closed, ending session");
                    self.state = SessionState::Ended;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
