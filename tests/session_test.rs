//! Session tests: batching, meta-commands, save/restore through the
//! command loop, error recovery and shutdown.
//!
//! Every test drives a `Session` with a scripted `MockProcessor` on a
//! headless display, so no terminal is needed.

use std::fs;

use zjam::config::Config;
use zjam::display_headless::HeadlessSurface;
use zjam::error::{LoadError, SessionError};
use zjam::game::Game;
use zjam::header::Header;
use zjam::input::ScriptedInput;
use zjam::processor::InstructionProcessor;
use zjam::session::{Session, SessionState};
use zjam::test_utils::{headless_display, scratch_dir, MockProcessor, MockStep, StoryBuilder};
use zjam::theme::find_theme;

const INITIAL_PC: u16 = 0x0500;

fn story() -> Vec<u8> {
    StoryBuilder::new(3)
        .initial_pc(INITIAL_PC)
        .dynamic_size(0x0400)
        .build()
}

fn config(name: &str) -> Config {
    Config {
        save_dir: scratch_dir(name),
        batch_size: 10,
        ..Config::default()
    }
}

struct Harness {
    session: Session,
    surface: HeadlessSurface,
    input: ScriptedInput,
    processor: MockProcessor,
}

fn harness(name: &str, steps: Vec<MockStep>) -> Harness {
    let game = Game::from_memory(&story(), "Zork1.z3").unwrap();
    let processor = MockProcessor::scripted(steps);
    let (display, surface, input) = headless_display(80, 50);
    let session = Session::new(game, &config(name), &processor.factory(), display).unwrap();
    Harness {
        session,
        surface,
        input,
        processor,
    }
}

fn waiting(name: &str) -> Harness {
    let mut h = harness(name, vec![MockStep::AwaitInput]);
    assert_eq!(h.session.run_batch().unwrap(), SessionState::AwaitingInput);
    h
}

#[test]
fn test_banner_and_first_batch() {
    let mut h = harness(
        "banner",
        vec![MockStep::Print("West of House".to_string()), MockStep::AwaitInput],
    );
    assert_eq!(h.processor.init_frames(), 1);
    assert!(h.surface.contains("Story size: 1024 bytes"));
    assert!(h.surface.contains("Type 'help' for commands"));

    assert_eq!(h.session.run_batch().unwrap(), SessionState::AwaitingInput);
    assert!(h.surface.contains("West of House"));
}

#[test]
fn test_batch_is_bounded() {
    let steps = (0..25).map(|i| MockStep::Poke(0x200 + i, 1)).collect();
    let mut h = harness("batch", steps);

    assert_eq!(h.session.run_batch().unwrap(), SessionState::Running);
    assert_eq!(h.session.vm().pc, INITIAL_PC as u32 + 10);
    assert_eq!(h.session.vm().read_byte(0x209), 1);
    assert_eq!(h.session.vm().read_byte(0x20A), 0);

    h.session.run_batch().unwrap();
    h.session.run_batch().unwrap();
    assert_eq!(h.session.vm().read_byte(0x218), 1);
}

#[test]
fn test_game_input_is_forwarded_verbatim() {
    let mut h = waiting("forward");
    h.session.handle_line("Open the Mailbox").unwrap();
    assert_eq!(h.processor.inputs(), vec!["Open the Mailbox"]);
    assert_eq!(h.session.state(), SessionState::Running);
}

#[test]
fn test_meta_commands_are_not_forwarded() {
    let mut h = waiting("help");
    h.session.handle_line("  HELP ").unwrap();
    assert!(h.processor.inputs().is_empty());
    assert!(h.surface.contains("  save     - Save current game"));
    assert!(h.surface.contains("  theme <name> - Change color theme"));
    assert_eq!(h.session.state(), SessionState::AwaitingInput);
}

#[test]
fn test_theme_commands() {
    let mut h = waiting("theme");
    h.session.handle_line("themes").unwrap();
    assert!(h.surface.contains("Available themes:"));
    assert!(h.surface.contains("  trs80 (current)"));
    assert!(h.surface.contains("  amber"));

    h.session.handle_line("Theme Amber").unwrap();
    assert!(h.surface.contains("Theme changed to: amber"));
    assert_eq!(h.session.theme(), "amber");
    let (_, amber) = find_theme("amber").unwrap();
    assert_eq!(h.surface.theme(), Some(*amber));

    h.session.handle_line("theme neon").unwrap();
    assert!(h.surface.contains("*** ERROR: Unknown theme: neon"));
    assert_eq!(h.session.theme(), "amber");

    h.session.handle_line("theme").unwrap();
    assert!(h.surface.contains("*** ERROR: 'theme' needs an argument"));
    assert!(h.processor.inputs().is_empty());
}

#[test]
fn test_save_then_restore_last_slot() {
    let mut h = harness(
        "save-restore",
        vec![MockStep::Poke(0x200, 0x11), MockStep::AwaitInput],
    );
    h.session.run_batch().unwrap();
    let saved_pc = h.session.vm().pc;

    h.input.push_line("Slot1");
    h.session.handle_line("save").unwrap();
    assert!(h.surface.contains("Enter file name (default):"));
    assert!(h.surface.contains("Game saved as slot1"));
    assert!(h.session.saves().slot_path("slot1").exists());

    h.session.vm_mut().write_byte(0x200, 0x99);
    h.session.vm_mut().pc = 0x0999;

    // Enter alone picks the slot used last
    h.input.push_line("");
    h.session.handle_line("restore").unwrap();
    assert!(h.surface.contains("Enter file name (slot1):"));
    assert!(h.surface.contains("Game restored from slot1"));
    assert_eq!(h.session.vm().read_byte(0x200), 0x11);
    assert_eq!(h.session.vm().pc, saved_pc);
    assert_eq!(h.session.state(), SessionState::Running);
}

#[test]
fn test_restore_missing_slot_reports_error() {
    let mut h = waiting("restore-missing");
    h.input.push_line("nothing");
    h.session.handle_line("restore").unwrap();
    assert!(h
        .surface
        .contains("*** ERROR: Restore failed: save file not found: nothing"));
    assert_eq!(h.session.state(), SessionState::AwaitingInput);
}

#[test]
fn test_corrupt_save_leaves_machine_alone() {
    let mut h = waiting("restore-corrupt");
    let path = h.session.saves().slot_path("junk");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, b"JUNK\x03\x05\x00").unwrap();

    h.session.vm_mut().write_byte(0x100, 0x42);
    let pc = h.session.vm().pc;
    let before = h.session.vm().game.memory.clone();

    h.input.push_line("junk");
    h.session.handle_line("restore").unwrap();
    assert!(h
        .surface
        .contains("*** ERROR: Restore failed: invalid save file"));
    assert_eq!(h.session.vm().game.memory, before);
    assert_eq!(h.session.vm().pc, pc);
}

#[test]
fn test_invalid_slot_name() {
    let mut h = waiting("bad-slot");
    h.input.push_line("../etc/passwd");
    h.session.handle_line("save").unwrap();
    assert!(h.surface.contains("*** ERROR: invalid save name"));
    assert!(!h.session.saves().save_dir().exists());
}

#[test]
fn test_processor_error_halts_but_session_survives() {
    let mut h = harness(
        "halt",
        vec![MockStep::Fail("illegal opcode 0xff".to_string())],
    );
    assert_eq!(h.session.run_batch().unwrap(), SessionState::Halted);
    assert!(h
        .surface
        .contains("*** ERROR: Game execution error: illegal opcode 0xff"));

    // further batches do nothing until restart
    assert_eq!(h.session.run_batch().unwrap(), SessionState::Halted);

    h.session.handle_line("look").unwrap();
    assert!(h.processor.inputs().is_empty());
    assert!(h.surface.contains("The game has stopped"));

    h.session.handle_line("restart").unwrap();
    assert_eq!(h.session.state(), SessionState::Running);
    assert_eq!(h.processor.init_frames(), 2);
    assert_eq!(h.session.vm().pc, INITIAL_PC as u32);
}

#[test]
fn test_restart_restores_dynamic_memory() {
    let mut h = harness(
        "restart",
        vec![MockStep::Poke(0x300, 7), MockStep::AwaitInput],
    );
    h.session.run_batch().unwrap();
    assert_eq!(h.session.vm().read_byte(0x300), 7);

    h.session.handle_line("restart").unwrap();
    assert_eq!(h.session.vm().read_byte(0x300), 0);
    assert_eq!(h.session.vm().pc, INITIAL_PC as u32);
}

#[test]
fn test_program_counter_outside_memory_halts() {
    let mut h = harness("wild-pc", vec![]);
    h.session.vm_mut().pc = 0x2_0000;
    assert_eq!(h.session.run_batch().unwrap(), SessionState::Halted);
    assert!(h.surface.contains("outside memory"));
}

#[test]
fn test_quit_ends_session() {
    let mut h = waiting("quit");
    h.session.handle_line("QUIT").unwrap();
    assert_eq!(h.session.state(), SessionState::Ended);
    h.session.run().unwrap();
    assert!(h.processor.inputs().is_empty());
}

#[test]
fn test_story_finishing_ends_session() {
    let mut h = harness("finish", vec![MockStep::Quit]);
    assert_eq!(h.session.run_batch().unwrap(), SessionState::Ended);
    assert!(h.surface.contains("Game is no longer running"));
}

#[test]
fn test_run_until_input_closes() {
    let mut h = harness(
        "run",
        vec![
            MockStep::Print("Welcome".to_string()),
            MockStep::AwaitInput,
            MockStep::Print("You said it".to_string()),
            MockStep::AwaitInput,
        ],
    );
    h.input.push_line("hello");
    h.session.run().unwrap();

    assert_eq!(h.session.state(), SessionState::Ended);
    assert_eq!(h.processor.inputs(), vec!["hello"]);
    assert!(h.surface.contains("Welcome"));
    assert!(h.surface.contains("You said it"));
}

#[test]
fn test_unsupported_version_from_factory() {
    let game = Game::from_memory(&story(), "zork1.z3").unwrap();
    let (display, _, _) = headless_display(80, 25);
    let factory = |_: &Header| -> Option<Box<dyn InstructionProcessor>> { None };
    let result = Session::new(game, &config("no-processor"), &factory, display);
    assert!(matches!(
        result,
        Err(SessionError::Load(LoadError::UnsupportedVersion(3)))
    ));
}

#[test]
fn test_start_from_file() {
    let dir = scratch_dir("start");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("Zork1.z3");
    fs::write(&path, story()).unwrap();

    let processor = MockProcessor::default();
    let (display, surface, input) = headless_display(80, 25);
    let config = Config {
        save_dir: dir.join("saves"),
        ..Config::default()
    };
    let mut session = Session::start(&path, &config, &processor.factory(), display).unwrap();
    assert!(surface.contains("Loading Zork1.z3..."));

    session.run_batch().unwrap();
    input.push_line("");
    session.handle_line("save").unwrap();
    assert!(dir.join("saves").join("zork1.default.sav").exists());
}

#[test]
fn test_start_missing_file() {
    let processor = MockProcessor::default();
    let (display, surface, _) = headless_display(80, 25);
    let result = Session::start(
        &scratch_dir("absent").join("nope.z3"),
        &Config::default(),
        &processor.factory(),
        display,
    );
    assert!(matches!(
        result,
        Err(SessionError::Load(LoadError::NotFound(_)))
    ));
    assert!(surface.contains("Loading nope.z3..."));
}

#[test]
fn test_status_line_through_session_display() {
    let mut h = waiting("status");
    h.session
        .display_mut()
        .update_status_line("West of House", 0, 1)
        .unwrap();
    assert!(h.surface.status().starts_with(" West of House"));
    assert!(h.surface.status().contains("Moves:   1"));
    assert_eq!(h.session.display().columns(), 80);
    assert!(h
        .session
        .display()
        .visible_lines()
        .iter()
        .any(|line| line == "Type 'help' for commands"));
}

#[test]
fn test_input_closing_during_story_output_ends_session() {
    let game = Game::from_memory(&story(), "zork1.z3").unwrap();
    let steps = (1..=10).map(|n| MockStep::Print(format!("line {}", n))).collect();
    let processor = MockProcessor::scripted(steps);
    // a short display pauses for Enter partway through, and no input comes
    let (display, surface, _) = headless_display(80, 10);
    let mut session =
        Session::new(game, &config("closed-mid-page"), &processor.factory(), display).unwrap();

    assert_eq!(session.run_batch().unwrap(), SessionState::Ended);
    assert!(surface.contains("Press <Enter> key to continue"));
    assert!(!surface.contains("Game execution error"));
    session.run().unwrap();
}
