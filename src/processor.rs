//! Seam to the instruction processor
//!
//! Decoding and executing opcodes, and the byte layout of a call frame, are
//! the processor's business. The session drives it one instruction at a
//! time and only handles frames as opaque serialized blobs.

use crate::display::DisplayBuffer;
use crate::error::ProcessorError;
use crate::header::Header;
use crate::vm::VM;

/// What the processor needs after an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Keep executing
    Continue,
    /// The story is reading a line; hand one over with `provide_input`
    AwaitInput,
    /// The story has finished
    Quit,
}

pub trait InstructionProcessor {
    /// Set up the initial call frame, discarding any existing stack
    fn init_frame(&mut self, vm: &mut VM);

    /// Execute exactly one instruction. May mutate memory, the PC and the
    /// frame stack, and print to the display.
    fn execute_instruction(
        &mut self,
        vm: &mut VM,
        display: &mut DisplayBuffer,
    ) -> Result<Step, ProcessorError>;

    /// Deliver a line of game input after `Step::AwaitInput`
    fn provide_input(&mut self, vm: &mut VM, line: &str) -> Result<(), ProcessorError>;

    /// Instructions executed so far; never decreases
    fn instruction_count(&self) -> u64;

    /// The call stack, oldest frame first, each frame serialized
    fn frame_stack(&self) -> Vec<Vec<u8>>;

    /// Replace the call stack from serialized frames, oldest first.
    ///
    /// Must be all-or-nothing: if any frame is rejected the existing stack
    /// stays as it was.
    fn restore_frame_stack(&mut self, frames: &[Vec<u8>]) -> Result<(), ProcessorError>;
}

/// Picks the processor implementation for a story, once, at load time
pub trait ProcessorFactory {
    fn create(&self, header: &Header) -> Option<Box<dyn InstructionProcessor>>;
}

impl<F> ProcessorFactory for F
where
    F: Fn(&Header) -> Option<Box<dyn InstructionProcessor>>,
{
    fn create(&self, header: &Header) -> Option<Box<dyn InstructionProcessor>> {
        self(header)
    }
}
