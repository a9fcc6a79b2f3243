//! Loading stories from disk and the views built over them

use std::fs;

use zjam::error::LoadError;
use zjam::game::Game;
use zjam::memory::{MemoryImage, MAX_STORY_SIZE, MIN_MEMORY_SIZE};
use zjam::test_utils::{scratch_dir, StoryBuilder};
use zjam::zobject::{object_entry_size, property_defaults_count};

#[test]
fn test_load_70000_byte_story_from_file() {
    let dir = scratch_dir("story-70000");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("ZORK1.DAT");
    let story = StoryBuilder::new(3)
        .len(70000)
        .initial_pc(0x4BC2)
        .dictionary(0x0391)
        .build();
    fs::write(&path, &story).unwrap();

    let game = Game::from_file(&path).unwrap();
    assert_eq!(game.header.version, 3);
    assert_eq!(game.header.initial_pc, 0x4BC2);
    assert_eq!(game.header.dictionary, 0x0391);
    assert_eq!(game.header.routine_offset, 0);
    assert_eq!(game.header.string_offset, 0);
    assert_eq!(game.filename, "ZORK1.DAT");
    assert_eq!(game.story_stem(), "zork1");
    assert_eq!(game.memory.len(), 70000);
}

#[test]
fn test_oversized_file_rejected_before_reading() {
    let dir = scratch_dir("story-big");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("huge.z3");
    let mut story = vec![0u8; MAX_STORY_SIZE + 1];
    story[0] = 3;
    fs::write(&path, &story).unwrap();

    assert!(matches!(
        Game::from_file(&path),
        Err(LoadError::TooLarge(len)) if len == MAX_STORY_SIZE + 1
    ));
}

#[test]
fn test_short_file_rejected() {
    let dir = scratch_dir("story-short");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("tiny.z3");
    fs::write(&path, [3u8; 10]).unwrap();
    assert!(matches!(
        Game::from_file(&path),
        Err(LoadError::TooSmall(10))
    ));
}

#[test]
fn test_memory_accesses_never_fail() {
    let mut mem = MemoryImage::from_story(&[3u8; 64]).unwrap();
    assert_eq!(mem.len(), MIN_MEMORY_SIZE);
    let end = mem.len() as u32;

    for addr in [end, end + 1, u32::MAX - 1, u32::MAX] {
        mem.write_byte(addr, 0xAB);
        mem.write_word(addr, 0xABCD);
        assert_eq!(mem.read_byte(addr), 0);
        assert_eq!(mem.read_word(addr), 0);
    }
    assert_eq!(mem.len(), MIN_MEMORY_SIZE);

    // a word straddling the end is neither read nor written
    mem.write_word(end - 1, 0xABCD);
    assert_eq!(mem.read_byte(end - 1), 0);
    assert_eq!(mem.read_word(end - 1), 0);
}

#[test]
fn test_word_round_trip_across_memory() {
    let mut mem = MemoryImage::from_story(&[0u8; 64]).unwrap();
    for (addr, value) in [(0u32, 0u16), (0x40, 0xFFFF), (0x1234, 0x4BC2), (0xFFFE, 0x8001)] {
        mem.write_word(addr, value);
        assert_eq!(mem.read_word(addr), value);
        assert_eq!(mem.read_byte(addr), (value >> 8) as u8);
        assert_eq!(mem.read_byte(addr + 1), value as u8);
    }
}

#[test]
fn test_object_count_formula() {
    for (version, table) in [(3u8, 0x0100u16), (3, 0xFB00), (3, 0xFF80)] {
        let story = StoryBuilder::new(version).object_table(table).build();
        let game = Game::from_memory(&story, "t.z3").unwrap();
        let start = table as usize + 2 * property_defaults_count(version);
        let expected = (game.memory.len().saturating_sub(start) / object_entry_size(version)).min(255);
        assert_eq!(game.objects.len(), expected, "table at {:#x}", table);
    }
}

#[test]
fn test_dictionary_view() {
    let story = StoryBuilder::new(3)
        .dictionary(0x0391)
        .dictionary_table(b".,\"", 7, 697)
        .build();
    let game = Game::from_memory(&story, "zork1.z3").unwrap();
    assert_eq!(game.dictionary.separators(), b".,\"");
    assert_eq!(game.dictionary.entry_length, 7);
    assert_eq!(game.dictionary.number_of_entries, 697);
    assert_eq!(game.dictionary.start_addr, 0x0391 + 7);
}

#[test]
fn test_inspector_dump() {
    let story = StoryBuilder::new(3)
        .initial_pc(0x4BC2)
        .object_table(0x0100)
        .dictionary(0x0391)
        .dictionary_table(b".", 7, 10)
        .build();
    let game = Game::from_memory(&story, "zork1.z3").unwrap();
    let text = format!("{}", game);
    assert!(text.contains("zork1.z3"));
    assert!(text.contains("4bc2"));
}
