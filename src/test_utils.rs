//! Helpers shared by unit and integration tests: a story image builder, a
//! scriptable instruction processor, a headless display and scratch save
//! directories.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use crate::display::{DisplayBuffer, DisplaySettings};
use crate::display_headless::HeadlessSurface;
use crate::error::ProcessorError;
use crate::header::Header;
use crate::input::ScriptedInput;
use crate::processor::{InstructionProcessor, Step};
use crate::vm::VM;

/// Builds story images with the header fields tests care about
#[derive(Debug, Clone)]
pub struct StoryBuilder {
    version: u8,
    len: usize,
    initial_pc: u16,
    dictionary: u16,
    object_table: u16,
    globals: u16,
    dynamic_size: u16,
    dictionary_table: Option<(Vec<u8>, u8, u16)>,
}

impl StoryBuilder {
    pub fn new(version: u8) -> Self {
        StoryBuilder {
            version,
            len: 1024,
            initial_pc: 0x0100,
            dictionary: 0,
            object_table: 0,
            globals: 0,
            dynamic_size: 0x0100,
            dictionary_table: None,
        }
    }

    pub fn len(mut self, len: usize) -> Self {
        self.len = len;
        self
    }

    pub fn initial_pc(mut self, pc: u16) -> Self {
        self.initial_pc = pc;
        self
    }

    pub fn dictionary(mut self, addr: u16) -> Self {
        self.dictionary = addr;
        self
    }

    pub fn object_table(mut self, addr: u16) -> Self {
        self.object_table = addr;
        self
    }

    pub fn globals(mut self, addr: u16) -> Self {
        self.globals = addr;
        self
    }

    pub fn dynamic_size(mut self, size: u16) -> Self {
        self.dynamic_size = size;
        self
    }

    /// Lay out a dictionary header at the dictionary address
    pub fn dictionary_table(mut self, separators: &[u8], entry_length: u8, count: u16) -> Self {
        self.dictionary_table = Some((separators.to_vec(), entry_length, count));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut table = Vec::new();
        if let Some((separators, entry_length, count)) = &self.dictionary_table {
            table.push(separators.len() as u8);
            table.extend_from_slice(separators);
            table.push(*entry_length);
            table.extend_from_slice(&count.to_be_bytes());
        }

        let dict = self.dictionary as usize;
        let len = self.len.max(dict + table.len());
        let mut story = vec![0u8; len];

        story[0x00] = self.version;
        story[0x06..0x08].copy_from_slice(&self.initial_pc.to_be_bytes());
        story[0x08..0x0A].copy_from_slice(&self.dictionary.to_be_bytes());
        story[0x0A..0x0C].copy_from_slice(&self.object_table.to_be_bytes());
        story[0x0C..0x0E].copy_from_slice(&self.globals.to_be_bytes());
        story[0x0E..0x10].copy_from_slice(&self.dynamic_size.to_be_bytes());
        story[dict..dict + table.len()].copy_from_slice(&table);
        story
    }
}

/// One scripted instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockStep {
    Print(String),
    /// Write a byte of story memory
    Poke(u32, u8),
    AwaitInput,
    Fail(String),
    Quit,
}

/// What a `MockProcessor` has been asked to do, shared between clones
#[derive(Debug, Default)]
pub struct MockLog {
    pub inputs: Vec<String>,
    pub init_frames: usize,
}

/// Instruction processor that plays back a script.
///
/// Each instruction takes the next `MockStep` and advances the PC by one;
/// with the script used up it waits for input forever.
#[derive(Debug, Clone, Default)]
pub struct MockProcessor {
    pub frames: Vec<Vec<u8>>,
    pub script: VecDeque<MockStep>,
    pub count: u64,
    pub log: Rc<RefCell<MockLog>>,
}

impl MockProcessor {
    /// Frames starting with this byte are refused by `restore_frame_stack`
    pub const POISON: u8 = 0xEE;

    pub fn with_frames(frames: Vec<Vec<u8>>) -> Self {
        MockProcessor {
            frames,
            ..Default::default()
        }
    }

    pub fn scripted(steps: Vec<MockStep>) -> Self {
        MockProcessor {
            script: steps.into(),
            ..Default::default()
        }
    }

    pub fn inputs(&self) -> Vec<String> {
        self.log.borrow().inputs.clone()
    }

    pub fn init_frames(&self) -> usize {
        self.log.borrow().init_frames
    }

    /// Factory closure handing out clones of this processor
    pub fn factory(&self) -> impl Fn(&Header) -> Option<Box<dyn InstructionProcessor>> {
        let template = self.clone();
        move |_header: &Header| Some(Box::new(template.clone()) as Box<dyn InstructionProcessor>)
    }
}

impl InstructionProcessor for MockProcessor {
    fn init_frame(&mut self, _vm: &mut VM) {
        self.frames = vec![vec![0]];
        self.log.borrow_mut().init_frames += 1;
    }

    fn execute_instruction(
        &mut self,
        vm: &mut VM,
        display: &mut DisplayBuffer,
    ) -> Result<Step, ProcessorError> {
        self.count += 1;
        vm.pc += 1;
        match self.script.pop_front() {
            Some(MockStep::Print(text)) => {
                display.print(&text)?;
                Ok(Step::Continue)
            }
            Some(MockStep::Poke(addr, value)) => {
                vm.write_byte(addr, value);
                Ok(Step::Continue)
            }
            Some(MockStep::AwaitInput) | None => Ok(Step::AwaitInput),
            Some(MockStep::Fail(message)) => Err(ProcessorError::new(message)),
            Some(MockStep::Quit) => Ok(Step::Quit),
        }
    }

    fn provide_input(&mut self, _vm: &mut VM, line: &str) -> Result<(), ProcessorError> {
        self.log.borrow_mut().inputs.push(line.to_string());
        Ok(())
    }

    fn instruction_count(&self) -> u64 {
        self.count
    }

    fn frame_stack(&self) -> Vec<Vec<u8>> {
        self.frames.clone()
    }

    fn restore_frame_stack(&mut self, frames: &[Vec<u8>]) -> Result<(), ProcessorError> {
        if frames.iter().any(|f| f.first() == Some(&Self::POISON)) {
            return Err(ProcessorError::new("corrupt call frame"));
        }
        self.frames = frames.to_vec();
        Ok(())
    }
}

/// Settings that never wait and never blank the screen
pub fn instant_settings() -> DisplaySettings {
    DisplaySettings {
        poll_interval: Duration::ZERO,
        idle_timeout: None,
        cursor_blink: None,
    }
}

/// A display on an in-memory grid, plus handles to inspect it and feed keys
pub fn headless_display(columns: u16, rows: u16) -> (DisplayBuffer, HeadlessSurface, ScriptedInput) {
    let surface = HeadlessSurface::new(columns, rows);
    let input = ScriptedInput::new();
    let display = DisplayBuffer::new(
        Box::new(surface.clone()),
        Box::new(input.clone()),
        instant_settings(),
    )
    .expect("headless display");
    (display, surface, input)
}

/// Fresh, not yet created directory under the system temp dir
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("zjam-{}-{}", std::process::id(), name));
    if dir.exists() {
        let _ = fs::remove_dir_all(&dir);
    }
    dir
}
