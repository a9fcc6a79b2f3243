use log::debug;

use crate::game::Game;

/// Machine state owned by the session: story memory plus program counter.
///
/// The call stack lives in the instruction processor; this core only ever
/// sees it as serialized frames.
pub struct VM {
    /// The game being executed
    pub game: Game,
    /// Program counter - current instruction address
    pub pc: u32,
}

impl VM {
    /// Create a new VM instance with the given game
    pub fn new(game: Game) -> Self {
        let pc = game.header.initial_pc as u32;
        VM { game, pc }
    }

    pub fn version(&self) -> u8 {
        self.game.header.version
    }

    /// Read a byte from memory
    pub fn read_byte(&self, addr: u32) -> u8 {
        self.game.memory.read_byte(addr)
    }

    /// Read a word (2 bytes, big-endian) from memory
    pub fn read_word(&self, addr: u32) -> u16 {
        self.game.memory.read_word(addr)
    }

    /// Write a byte to memory
    pub fn write_byte(&mut self, addr: u32, value: u8) {
        self.game.memory.write_byte(addr, value)
    }

    /// Write a word to memory
    pub fn write_word(&mut self, addr: u32, value: u16) {
        self.game.memory.write_word(addr, value)
    }

    /// Put dynamic memory and the PC back to how the story was loaded
    pub fn reset(&mut self) {
        self.game
            .memory
            .copy_into_prefix(&self.game.pristine_dynamic);
        self.pc = self.game.header.initial_pc as u32;
        debug!(
            "VM reset: {} bytes of dynamic memory, PC {:04x}",
            self.game.pristine_dynamic.len(),
            self.pc
        );
    }
}
