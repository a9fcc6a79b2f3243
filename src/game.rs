use std::fmt::{Display, Error, Formatter};
use std::fs;
use std::io;
use std::path::Path;

use log::{debug, info};

use crate::dictionary::Dictionary;
use crate::error::LoadError;
use crate::header::Header;
use crate::memory::{MemoryImage, MAX_STORY_SIZE};
use crate::zobject::ObjectTable;

/// Story versions this build will load
pub const SUPPORTED_VERSIONS: &[u8] = &[3];

/// Represents a loaded story with owned memory
pub struct Game {
    /// The story memory, zero-padded to at least 64K
    pub memory: MemoryImage,
    /// The parsed header
    pub header: Header,
    pub objects: ObjectTable,
    pub dictionary: Dictionary,
    /// Dynamic memory as it was at load time, for restart
    pub pristine_dynamic: Vec<u8>,
    /// File name the story was loaded from
    pub filename: String,
    /// Size of the story file itself, before padding
    pub story_len: usize,
}

impl Game {
    /// Load a story file from disk
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
            _ => LoadError::Io(path.to_path_buf(), e),
        })?;
        // Check the size before pulling the whole file in
        if metadata.len() > MAX_STORY_SIZE as u64 {
            return Err(LoadError::TooLarge(metadata.len() as usize));
        }

        let bytes = fs::read(path).map_err(|e| LoadError::Io(path.to_path_buf(), e))?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Game::from_memory(&bytes, &filename)
    }

    /// Create a new game from story bytes
    pub fn from_memory(story: &[u8], filename: &str) -> Result<Self, LoadError> {
        let memory = MemoryImage::from_story(story)?;

        let version = memory.read_byte(0);
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(LoadError::UnsupportedVersion(version));
        }

        let header = Header::new(&memory);
        let objects = ObjectTable::new(&memory, &header);
        let dictionary = Dictionary::new(&memory, &header);
        let pristine_dynamic = memory.prefix(header.dynamic_size as usize).to_vec();

        info!(
            "Loaded '{}': version {}, {} bytes, {} objects",
            filename,
            version,
            story.len(),
            objects.len()
        );
        debug!("Initial PC: {:04x}", header.initial_pc);

        Ok(Game {
            memory,
            header,
            objects,
            dictionary,
            pristine_dynamic,
            filename: filename.to_string(),
            story_len: story.len(),
        })
    }

    /// Lowercased file name up to the first '.', used to name save files
    pub fn story_stem(&self) -> String {
        self.filename
            .split('.')
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }
}

impl Display for Game {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        writeln!(f, "Story: {} ({} bytes)", self.filename, self.story_len)?;
        write!(f, "{}", self.header)?;
        write!(f, "{}", self.objects)?;
        write!(f, "{}", self.dictionary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::StoryBuilder;
    use test_log::test;

    #[test]
    fn test_load_v3_story() {
        let story = StoryBuilder::new(3)
            .len(70000)
            .initial_pc(0x4BC2)
            .dictionary(0x0391)
            .build();
        let game = Game::from_memory(&story, "zork1.z3").unwrap();
        assert_eq!(game.header.version, 3);
        assert_eq!(game.header.initial_pc, 0x4BC2);
        assert_eq!(game.header.dictionary, 0x0391);
        assert_eq!(game.header.routine_offset, 0);
        assert_eq!(game.header.string_offset, 0);
        assert_eq!(game.memory.len(), 70000);
        assert_eq!(game.story_len, 70000);
    }

    #[test]
    fn test_rejects_unsupported_version() {
        let story = StoryBuilder::new(5).build();
        assert!(matches!(
            Game::from_memory(&story, "x.z5"),
            Err(LoadError::UnsupportedVersion(5))
        ));
    }

    #[test]
    fn test_keeps_pristine_dynamic_memory() {
        let story = StoryBuilder::new(3).dynamic_size(0x0400).build();
        let game = Game::from_memory(&story, "x.z3").unwrap();
        assert_eq!(game.pristine_dynamic.len(), 0x0400);
        assert_eq!(&game.pristine_dynamic[..], &story[..0x0400]);
    }

    #[test]
    fn test_story_stem() {
        let story = StoryBuilder::new(3).build();
        let game = Game::from_memory(&story, "Zork1.Release88.z3").unwrap();
        assert_eq!(game.story_stem(), "zork1");
    }

    #[test]
    fn test_missing_file() {
        let path = Path::new("/nonexistent/story.z3");
        assert!(matches!(Game::from_file(path), Err(LoadError::NotFound(_))));
    }
}
