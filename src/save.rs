//! Save files
//!
//! Layout, all integers big-endian:
//!
//! ```text
//! "ZSAV"                  magic
//! u8                      story version
//! u16                     program counter
//! u16 N, N bytes          dynamic memory
//! u16 F                   frame count
//! F x (u16 len, bytes)    call frames, oldest first, opaque
//! ```
//!
//! One file per story and slot, `<story-stem>.<slot>.sav`, in the save
//! directory. A restore validates the whole file before touching memory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::{CommandError, SaveError};
use crate::processor::InstructionProcessor;
use crate::vm::VM;

pub const SAVE_MAGIC: [u8; 4] = *b"ZSAV";
pub const SAVE_EXTENSION: &str = "sav";
pub const DEFAULT_SLOT: &str = "default";

/// Slot names become part of a file name: no separators, dots or spaces
pub fn valid_slot_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_graphic() && !matches!(c, '/' | '\\' | '.' | ':'))
}

/// Decoded contents of a save file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRecord {
    pub version: u8,
    pub pc: u16,
    pub dynamic_memory: Vec<u8>,
    pub frames: Vec<Vec<u8>>,
}

impl SaveRecord {
    /// Snapshot the machine and the processor's call stack
    pub fn capture(vm: &VM, processor: &dyn InstructionProcessor) -> Result<Self, SaveError> {
        let pc = u16::try_from(vm.pc).map_err(|_| SaveError::ProgramCounterOutOfRange(vm.pc))?;
        let mem_size = vm.game.header.dynamic_size as usize;
        Ok(SaveRecord {
            version: vm.version(),
            pc,
            dynamic_memory: vm.game.memory.prefix(mem_size).to_vec(),
            frames: processor.frame_stack(),
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SaveError> {
        let frame_count = u16::try_from(self.frames.len())
            .map_err(|_| SaveError::TooManyFrames(self.frames.len()))?;
        let mem_size = u16::try_from(self.dynamic_memory.len()).map_err(|_| {
            SaveError::MemorySizeMismatch {
                found: self.dynamic_memory.len(),
                expected: u16::MAX as usize,
            }
        })?;

        let frames_size: usize = self.frames.iter().map(|f| 2 + f.len()).sum();
        let mut output =
            Vec::with_capacity(4 + 1 + 2 + 2 + self.dynamic_memory.len() + 2 + frames_size);

        output.extend_from_slice(&SAVE_MAGIC);
        output.push(self.version);
        output.extend_from_slice(&self.pc.to_be_bytes());
        output.extend_from_slice(&mem_size.to_be_bytes());
        output.extend_from_slice(&self.dynamic_memory);
        output.extend_from_slice(&frame_count.to_be_bytes());
        for frame in &self.frames {
            let len =
                u16::try_from(frame.len()).map_err(|_| SaveError::FrameTooLarge(frame.len()))?;
            output.extend_from_slice(&len.to_be_bytes());
            output.extend_from_slice(frame);
        }

        Ok(output)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, SaveError> {
        let mut reader = SaveReader { data, pos: 0 };

        let magic = reader.take(4)?;
        if magic != &SAVE_MAGIC[..] {
            let mut found = [0u8; 4];
            found.copy_from_slice(magic);
            return Err(SaveError::BadMagic(found));
        }

        let version = reader.u8()?;
        let pc = reader.u16()?;
        let mem_size = reader.u16()? as usize;
        let dynamic_memory = reader.take(mem_size)?.to_vec();

        let frame_count = reader.u16()? as usize;
        let mut frames = Vec::with_capacity(frame_count);
        for _ in 0..frame_count {
            let len = reader.u16()? as usize;
            frames.push(reader.take(len)?.to_vec());
        }

        if reader.pos < data.len() {
            debug!("Ignoring {} trailing bytes in save file", data.len() - reader.pos);
        }

        Ok(SaveRecord {
            version,
            pc,
            dynamic_memory,
            frames,
        })
    }
}

struct SaveReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SaveReader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], SaveError> {
        let available = self.data.len() - self.pos;
        if len > available {
            return Err(SaveError::Truncated {
                needed: len,
                available,
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn u8(&mut self) -> Result<u8, SaveError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, SaveError> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }
}

/// Named save slots for one story
pub struct SaveStore {
    save_dir: PathBuf,
    story_stem: String,
    last_slot: String,
}

impl SaveStore {
    pub fn new(save_dir: impl Into<PathBuf>, story_stem: &str, default_slot: &str) -> Self {
        let mut last_slot = default_slot.trim().to_lowercase();
        if !valid_slot_name(&last_slot) {
            warn!(
                "Ignoring invalid default slot {:?}, using {}",
                default_slot, DEFAULT_SLOT
            );
            last_slot = DEFAULT_SLOT.to_string();
        }
        SaveStore {
            save_dir: save_dir.into(),
            story_stem: story_stem.to_lowercase(),
            last_slot,
        }
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Slot used when the player just presses Enter
    pub fn last_slot(&self) -> &str {
        &self.last_slot
    }

    /// Turn what the player typed into a slot name
    pub fn resolve_slot(&self, input: &str) -> Result<String, CommandError> {
        let name = input.trim().to_lowercase();
        if name.is_empty() {
            return Ok(self.last_slot.clone());
        }
        if !valid_slot_name(&name) {
            return Err(CommandError::InvalidSlotName(input.trim().to_string()));
        }
        Ok(name)
    }

    pub fn slot_path(&self, slot: &str) -> PathBuf {
        self.save_dir
            .join(format!("{}.{}.{}", self.story_stem, slot, SAVE_EXTENSION))
    }

    /// Write the machine state to `slot`
    pub fn save(
        &mut self,
        slot: &str,
        vm: &VM,
        processor: &dyn InstructionProcessor,
    ) -> Result<PathBuf, SaveError> {
        // Build the whole file first so a bad frame never leaves a partial save
        let bytes = SaveRecord::capture(vm, processor)?.to_bytes()?;

        if !self.save_dir.is_dir() {
            fs::create_dir_all(&self.save_dir)?;
            debug!("Created save directory {:?}", self.save_dir);
        }

        let path = self.slot_path(slot);
        info!("Saving game to {:?}", path);
        // the old slot stays intact until the new file is complete
        let tmp = path.with_extension(format!("{}.tmp", SAVE_EXTENSION));
        if let Err(e) = fs::write(&tmp, &bytes).and_then(|_| fs::rename(&tmp, &path)) {
            warn!("Could not write {:?}: {}", path, e);
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        self.last_slot = slot.to_string();
        info!("Game saved successfully ({} bytes)", bytes.len());
        Ok(path)
    }

    /// Load `slot` into the machine. On any error nothing is changed.
    pub fn restore(
        &mut self,
        slot: &str,
        vm: &mut VM,
        processor: &mut dyn InstructionProcessor,
    ) -> Result<(), SaveError> {
        let path = self.slot_path(slot);
        info!("Loading save game from {:?}", path);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SaveError::NotFound(slot.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        // The slot exists, so remember it even if the contents are bad
        self.last_slot = slot.to_string();

        let record = SaveRecord::from_bytes(&data)?;
        let expected = vm.version();
        if record.version != expected {
            warn!(
                "Save file version {} does not match story version {}",
                record.version, expected
            );
            return Err(SaveError::VersionMismatch {
                found: record.version,
                expected,
            });
        }
        let dynamic_size = vm.game.header.dynamic_size as usize;
        if record.dynamic_memory.len() != dynamic_size {
            return Err(SaveError::MemorySizeMismatch {
                found: record.dynamic_memory.len(),
                expected: dynamic_size,
            });
        }

        // Last fallible step; the processor keeps its old stack on failure
        processor.restore_frame_stack(&record.frames)?;

        vm.game.memory.copy_into_prefix(&record.dynamic_memory);
        vm.pc = record.pc as u32;
        debug!(
            "Restored {} bytes of dynamic memory and {} call frames, PC {:04x}",
            record.dynamic_memory.len(),
            record.frames.len(),
            vm.pc
        );
        info!("Game restored successfully");
        Ok(())
    }

    /// Slots saved for this story, sorted
    pub fn list_slots(&self) -> Result<Vec<String>, SaveError> {
        let entries = match fs::read_dir(&self.save_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let prefix = format!("{}.", self.story_stem);
        let suffix = format!(".{}", SAVE_EXTENSION);
        let mut slots = Vec::new();
        for entry in entries {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if let Some(slot) = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(&suffix))
            {
                if !slot.is_empty() {
                    slots.push(slot.to_string());
                }
            }
        }
        slots.sort();
        Ok(slots)
    }
}
