use std::fmt::Display;
use std::fmt::Error;
use std::fmt::Formatter;

use log::{debug, warn};

use crate::header::Header;
use crate::memory::MemoryImage;

/// Layout of the dictionary table. Entry bytes are left to the processor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    pub input_codes: Vec<u8>,
    pub entry_length: u8,
    pub number_of_entries: usize,
    /// Address of the first entry
    pub start_addr: u32,
}

impl Dictionary {
    pub fn new(memory: &MemoryImage, header: &Header) -> Dictionary {
        if header.dictionary == 0 {
            return Dictionary::default();
        }

        let mut cur_pos = header.dictionary as u32;
        let n = memory.read_byte(cur_pos);
        cur_pos += 1;
        let input_codes = (0..n as u32)
            .map(|i| memory.read_byte(cur_pos + i))
            .collect();
        cur_pos += n as u32;
        let entry_length = memory.read_byte(cur_pos);
        cur_pos += 1;
        let declared_entries = memory.read_word(cur_pos) as usize;
        cur_pos += 2;

        // Trust the header only as far as memory reaches
        let room = memory.len().saturating_sub(cur_pos as usize);
        let number_of_entries = match entry_length {
            0 => 0,
            len => declared_entries.min(room / len as usize),
        };
        if number_of_entries != declared_entries {
            warn!(
                "Dictionary declares {} entries of {} bytes, only {} fit",
                declared_entries, entry_length, number_of_entries
            );
        }
        debug!(
            "Dictionary at {:#06x}: {} separators, {} entries from {:#06x}",
            header.dictionary,
            n,
            number_of_entries,
            cur_pos
        );

        Dictionary {
            input_codes,
            entry_length,
            number_of_entries,
            start_addr: cur_pos,
        }
    }

    pub fn separators(&self) -> &[u8] {
        &self.input_codes
    }

    pub fn is_separator(&self, zscii: u8) -> bool {
        self.input_codes.contains(&zscii)
    }

    /// Address of entry `index` (0-based)
    pub fn entry_address(&self, index: usize) -> Option<u32> {
        if index < self.number_of_entries {
            Some(self.start_addr + (index * self.entry_length as usize) as u32)
        } else {
            None
        }
    }
}

impl Display for Dictionary {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        writeln!(
            f,
            "Number of separator / input codes: {}, word size: {}, word count: {}",
            self.input_codes.len(),
            self.entry_length,
            self.number_of_entries
        )?;
        write!(f, "separators:")?;
        for c in &self.input_codes {
            write!(f, " '{}'", *c as char)?;
        }
        writeln!(f)
    }
}
