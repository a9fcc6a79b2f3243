use std::env;
use std::path::{Path, PathBuf};

use log::{debug, info};
use zjam::config::Config;
use zjam::display::{DisplayBuffer, DisplaySettings, CONTINUE_PROMPT};
use zjam::display_crossterm::TerminalSurface;
use zjam::game::Game;
use zjam::library::{choose_story, find_stories};
use zjam::save::SaveStore;
use zjam::theme::find_theme;
use zjam::timed_input::stdin_input;

fn usage(program: &str) {
    println!("zjam - Z-machine story inspector");
    println!();
    println!("Usage: {} <story_file | story_dir> [--config <file.toml>]", program);
    println!("Examples:");
    println!("  {} stories/zork1.z3", program);
    println!("  {} stories --config zjam.toml", program);
    println!();
    println!("Shows the story header, memory map, dictionary and save slots.");
    println!("Given a directory, lists the stories in it and asks which one to open.");
}

/// Everything the inspector shows about a loaded story
fn report(game: &Game, config: &Config) -> Vec<String> {
    let mut lines: Vec<String> = format!("{}", game).lines().map(str::to_string).collect();

    let saves = SaveStore::new(&config.save_dir, &game.story_stem(), &config.default_slot);
    match saves.list_slots() {
        Ok(slots) if slots.is_empty() => lines.push("Save slots: none".to_string()),
        Ok(slots) => lines.push(format!("Save slots: {}", slots.join(", "))),
        Err(e) => lines.push(format!("Save slots unavailable: {}", e)),
    }
    lines
}

fn load_config(path: Option<&str>) -> Config {
    match path {
        Some(path) => match Config::load(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    }
}

/// Plain output when stdout is not a terminal
fn run_plain(target: &Path, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let story = if target.is_dir() {
        let stories = find_stories(target)?;
        match stories.as_slice() {
            [] => {
                println!("No story files found in {}", target.display());
                return Ok(());
            }
            [only] => only.clone(),
            _ => {
                println!("Available stories:");
                for (i, story) in stories.iter().enumerate() {
                    println!("  {}. {}", i + 1, story.display());
                }
                println!("Run again with one of these paths.");
                return Ok(());
            }
        }
    } else {
        target.to_path_buf()
    };

    let game = Game::from_file(&story)?;
    for line in report(&game, config) {
        println!("{}", line);
    }
    Ok(())
}

fn run_terminal(target: &Path, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let surface = TerminalSurface::new(config.columns, config.rows)?;
    let input = stdin_input()?;
    let mut display = DisplayBuffer::new(Box::new(surface), input, DisplaySettings::from(config))?;
    if let Some((_, theme)) = find_theme(&config.theme) {
        display.apply_theme(theme)?;
    }

    display.print("zjam: Z-machine story inspector")?;
    display.print(&format!(
        "Display: {} cols x {} rows",
        display.columns(),
        display.rows()
    ))?;
    display.print(&"=".repeat(display.columns().min(50)))?;

    let story = if target.is_dir() {
        let stories = find_stories(target)?;
        if stories.is_empty() {
            display.print("No story files found.")?;
            display.print(&format!("Copy story files to {}/", target.display()))?;
            None
        } else {
            choose_story(&mut display, &stories)?.map(Path::to_path_buf)
        }
    } else {
        Some(target.to_path_buf())
    };

    if let Some(story) = story {
        debug!("Inspecting {}", story.display());
        match Game::from_file(&story) {
            Ok(game) => {
                for line in report(&game, config) {
                    display.print(&line)?;
                }
            }
            Err(e) => display.print_error(&e.to_string())?,
        }
    }

    display.print(CONTINUE_PROMPT)?;
    match display.read_line() {
        Err(e) if !e.input_closed => return Err(e.into()),
        _ => {}
    }
    info!("zjam terminated");
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage(&args[0]);
        return Ok(());
    }

    let target = PathBuf::from(&args[1]);
    let config_path = match args.get(2).map(String::as_str) {
        Some("--config") => match args.get(3) {
            Some(path) => Some(path.as_str()),
            None => {
                eprintln!("Error: --config needs a file name");
                std::process::exit(1);
            }
        },
        Some(other) => {
            eprintln!("Error: unexpected argument '{}'", other);
            std::process::exit(1);
        }
        None => None,
    };
    let config = load_config(config_path);

    if !target.exists() {
        eprintln!("Error: Story file not found: {}", target.display());
        eprintln!();
        eprintln!("Please check:");
        eprintln!("• File path is correct");
        eprintln!("• You're running from the right directory");
        std::process::exit(1);
    }

    if atty::is(atty::Stream::Stdout) {
        run_terminal(&target, &config)
    } else {
        run_plain(&target, &config)
    }
}
