use std::fmt::Display;
use std::fmt::Error;
use std::fmt::Formatter;

use log::debug;

use crate::header::Header;
use crate::memory::MemoryImage;

/// Objects are numbered 1..=255
pub const MAX_OBJECTS: usize = 255;

/// Number of property default words before the first object
pub fn property_defaults_count(version: u8) -> usize {
    if version <= 3 {
        31
    } else {
        63
    }
}

/// Size of one object entry: 9 bytes up to v3, 14 from v4
pub fn object_entry_size(version: u8) -> usize {
    if version <= 3 {
        9
    } else {
        14
    }
}

/// Byte addresses of the object records.
///
/// Only the location of each record is kept; the processor decodes
/// attributes, relatives and properties itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectTable {
    addresses: Vec<u32>,
}

impl ObjectTable {
    /// Walk the table, stopping early at the first record that would not
    /// fit in memory.
    pub fn new(memory: &MemoryImage, header: &Header) -> Self {
        if header.object_table_addr == 0 {
            return ObjectTable::default();
        }

        let version = header.version;
        let obj_start =
            header.object_table_addr as usize + property_defaults_count(version) * 2;
        let obj_size = object_entry_size(version);

        let mut addresses = Vec::new();
        for n in 0..MAX_OBJECTS {
            let obj_addr = obj_start + n * obj_size;
            if obj_addr + obj_size > memory.len() {
                debug!(
                    "Object table truncated after {} objects at {:#06x}",
                    n, obj_addr
                );
                break;
            }
            addresses.push(obj_addr as u32);
        }

        ObjectTable { addresses }
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Address of object `number` (1-based)
    pub fn address(&self, number: usize) -> Option<u32> {
        number
            .checked_sub(1)
            .and_then(|index| self.addresses.get(index))
            .copied()
    }

    /// (object number, address) pairs in table order
    pub fn iter(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.addresses
            .iter()
            .enumerate()
            .map(|(index, addr)| (index + 1, *addr))
    }
}

impl Display for ObjectTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        writeln!(f, "There are {} objects.", self.addresses.len())?;
        if let (Some(first), Some(last)) = (self.addresses.first(), self.addresses.last()) {
            writeln!(f, "Object records span {:#06x}..={:#06x}", first, last)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::StoryBuilder;
    use test_log::test;

    fn table_for(version: u8, len: usize, table_addr: u16) -> (ObjectTable, usize) {
        let story = StoryBuilder::new(version)
            .len(len)
            .object_table(table_addr)
            .build();
        let mem = MemoryImage::from_story(&story).unwrap();
        let header = Header::new(&mem);
        (ObjectTable::new(&mem, &header), mem.len())
    }

    #[test]
    fn test_full_table_in_padded_memory() {
        let (table, _) = table_for(3, 1024, 0x0100);
        assert_eq!(table.len(), 255);
        assert_eq!(table.address(1), Some(0x0100 + 62));
        assert_eq!(table.address(2), Some(0x0100 + 62 + 9));
        assert_eq!(table.address(0), None);
        assert_eq!(table.address(256), None);
    }

    #[test]
    fn test_truncates_at_end_of_memory() {
        // table near the top of a 64K image
        let table_addr = 0xFE00u16;
        let (table, mem_len) = table_for(3, 1024, table_addr);
        let start = table_addr as usize + 62;
        assert_eq!(table.len(), ((mem_len - start) / 9).min(255));
        let last = table.iter().last().unwrap().1 as usize;
        assert!(last + 9 <= mem_len);
    }

    #[test]
    fn test_count_matches_formula_for_v5() {
        let table_addr = 0xF800u16;
        let (table, mem_len) = table_for(5, 1024, table_addr);
        let start = table_addr as usize + 126;
        assert_eq!(table.len(), ((mem_len - start) / 14).min(255));
    }

    #[test]
    fn test_table_start_past_end_is_empty() {
        let (table, _) = table_for(3, 1024, 0xFFF0);
        assert!(table.is_empty());
    }

    #[test]
    fn test_no_table() {
        let (table, _) = table_for(3, 1024, 0);
        assert!(table.is_empty());
    }
}
