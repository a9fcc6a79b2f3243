use std::fmt::Display;
use std::fmt::Error;
use std::fmt::Formatter;

use crate::memory::MemoryImage;

/// Versions from which routine and string offsets live in the header
pub const OFFSETS_FROM_VERSION: u8 = 4;

/// Fixed-offset fields of the 64-byte story header.
///
/// Parsed once when the story is loaded; nothing writes back into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub release: u16,
    pub base_high_mem: u16,
    pub initial_pc: u16,
    pub dictionary: u16,
    pub object_table_addr: u16,
    pub global_variables: u16,
    /// Size of dynamic memory (the static memory base)
    pub dynamic_size: u16,
    pub serial: String,
    pub abbrev_table: u16,
    pub len_file: usize,
    pub checksum_file: u16,
    pub routine_offset: u32,
    pub string_offset: u32,
}

impl Header {
    pub fn new(memory: &MemoryImage) -> Header {
        let version = memory.read_byte(0x00);
        let (routine_offset, string_offset) = if version >= OFFSETS_FROM_VERSION {
            (
                memory.read_word(0x28) as u32 * 8,
                memory.read_word(0x2A) as u32 * 8,
            )
        } else {
            (0, 0)
        };

        Header {
            version,
            release: memory.read_word(0x02),
            base_high_mem: memory.read_word(0x04),
            initial_pc: memory.read_word(0x06),
            dictionary: memory.read_word(0x08),
            object_table_addr: memory.read_word(0x0A),
            global_variables: memory.read_word(0x0C),
            dynamic_size: memory.read_word(0x0E),
            serial: (0x12..0x18)
                .map(|addr| memory.read_byte(addr) as char)
                .collect(),
            abbrev_table: memory.read_word(0x18),
            len_file: memory.read_word(0x1A) as usize * 2,
            checksum_file: memory.read_word(0x1C),
            routine_offset,
            string_offset,
        }
    }
}

impl Display for Header {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(
            f,
            "
Z-code version:           {}
Release number:           {}
Size of resident memory:  {:#06x}
Start PC:                 {:#06x}
Dictionary address:       {:#06x}
Object table address:     {:#06x}
Global variables address: {:#06x}
Size of dynamic memory:   {:#06x}
Serial number:            {}
Abbreviations address:    {:#06x}
File size:                {:#06x}
Checksum:                 {:#06x}
",
            self.version,
            self.release,
            self.base_high_mem,
            self.initial_pc,
            self.dictionary,
            self.object_table_addr,
            self.global_variables,
            self.dynamic_size,
            self.serial,
            self.abbrev_table,
            self.len_file,
            self.checksum_file,
        )
    }
}
