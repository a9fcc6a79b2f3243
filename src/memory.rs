use log::debug;

use crate::error::LoadError;

/// Smallest story file that still holds a complete header
pub const MIN_STORY_SIZE: usize = 64;

/// Largest story file we are prepared to hold in memory
pub const MAX_STORY_SIZE: usize = 1024 * 1024;

/// Memory is zero-extended to at least this many bytes at load time
pub const MIN_MEMORY_SIZE: usize = 65536;

/// Byte-addressable story memory.
///
/// Every accessor is total: reads past the end return 0 and writes past the
/// end are dropped, so story data can never halt the machine with a bad
/// address. Words are big-endian and are accessed as a unit: a word whose
/// low byte would fall past the end reads as 0 and is never written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryImage {
    bytes: Vec<u8>,
}

impl MemoryImage {
    /// Copy a story file verbatim and pad it with zeroes up to 64K
    pub fn from_story(story: &[u8]) -> Result<Self, LoadError> {
        if story.len() < MIN_STORY_SIZE {
            return Err(LoadError::TooSmall(story.len()));
        }
        if story.len() > MAX_STORY_SIZE {
            return Err(LoadError::TooLarge(story.len()));
        }

        let mut bytes = Vec::with_capacity(story.len().max(MIN_MEMORY_SIZE));
        bytes.extend_from_slice(story);
        if bytes.len() < MIN_MEMORY_SIZE {
            bytes.resize(MIN_MEMORY_SIZE, 0);
        }
        debug!(
            "Memory image: {} story bytes, {} addressable",
            story.len(),
            bytes.len()
        );

        Ok(MemoryImage { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Read a byte from memory
    pub fn read_byte(&self, addr: u32) -> u8 {
        self.bytes.get(addr as usize).copied().unwrap_or(0)
    }

    /// Read a word (2 bytes, big-endian) from memory
    pub fn read_word(&self, addr: u32) -> u16 {
        let addr = addr as usize;
        match self.bytes.get(addr..addr.saturating_add(2)) {
            Some(&[high, low]) => u16::from_be_bytes([high, low]),
            _ => 0,
        }
    }

    /// Write a byte to memory
    pub fn write_byte(&mut self, addr: u32, value: u8) {
        if let Some(slot) = self.bytes.get_mut(addr as usize) {
            *slot = value;
        }
    }

    /// Write a word (2 bytes, big-endian) to memory
    pub fn write_word(&mut self, addr: u32, value: u16) {
        let addr = addr as usize;
        if let Some(slot) = self.bytes.get_mut(addr..addr.saturating_add(2)) {
            slot.copy_from_slice(&value.to_be_bytes());
        }
    }

    /// The first `len` bytes, clamped to the image size
    pub fn prefix(&self, len: usize) -> &[u8] {
        &self.bytes[..len.min(self.bytes.len())]
    }

    /// Overwrite the start of memory with `data`; anything past the end is dropped
    pub fn copy_into_prefix(&mut self, data: &[u8]) {
        let len = data.len().min(self.bytes.len());
        self.bytes[..len].copy_from_slice(&data[..len]);
    }
}
