// src/bingo_caller.rs
// Terminal number caller for the host of a bingo night.
//
// Interactive Controls:
// - ENTER: Draw the next number
// - w: Open the winner checking board
// - g: Switch to the next game
// - r: Reset the game (asks first)
// - ESC: Exit
//
// CLI Options:
// - --event: Event preset (alumni, bata, classic)
// - --game: Game to start on, counting from 1

use std::error::Error;

use clap::Parser;
use bingo::caller::NumberCaller;
use bingo::checker::{CHECKER_COLS, CHECKER_ROWS, WinnerBoard};
use bingo::config::BingoConfig;
use bingo::event::Event;
use bingo::logging::{log_error, log_info, log_warning};
use bingo::storage::{FileStore, KeyValueStore};
use bingo::terminal::{self, KeyAction, RawMode};

#[derive(Parser)]
#[command(name = env!("CARGO_BIN_NAME"))]
#[command(about = "Bingo Caller - Draw numbers and check winners")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Event preset: alumni, bata or classic (overrides the config file)
    #[arg(long)]
    event: Option<String>,

    /// Game to start on, counting from 1
    #[arg(long)]
    game: Option<usize>,

    /// Path to the configuration file
    #[arg(long, default_value = BingoConfig::DEFAULT_PATH)]
    config: String,
}

fn run_checker<S: KeyValueStore>(event: &Event, checker: &mut WinnerBoard, caller: &NumberCaller<S>) -> Result<(), Box<dyn Error>> {
    checker.sync_generation(caller.reset_generation());
    let mut cursor = (0usize, 0usize);
    loop {
        terminal::draw(&terminal::render_checker(event, checker, caller.drawn(), cursor))?;
        match terminal::wait_action()? {
            KeyAction::Up => cursor.0 = cursor.0.saturating_sub(1),
            KeyAction::Down => cursor.0 = (cursor.0 + 1).min(CHECKER_ROWS - 1),
            KeyAction::Left => cursor.1 = cursor.1.saturating_sub(1),
            KeyAction::Right => cursor.1 = (cursor.1 + 1).min(CHECKER_COLS - 1),
            KeyAction::Select => {
                checker.toggle(cursor.0, cursor.1);
            }
            KeyAction::Char('x') => checker.reset(),
            KeyAction::Quit => return Ok(()),
            _ => {}
        }
    }
}

fn run_caller(args: Args) -> Result<(), Box<dyn Error>> {
    let config = BingoConfig::load_from_or_default(&args.config);
    config.init_logging();

    let event_id = args.event.unwrap_or_else(|| config.event.clone());
    let event = Event::by_id(&event_id)
        .ok_or_else(|| format!("Unknown event '{event_id}', expected one of {}", Event::IDS.join(", ")))?;

    let mut caller = NumberCaller::open(FileStore::in_dir(&config.data_dir));
    let mut game = match args.game {
        Some(n) if (1..=event.games.len()).contains(&n) => {
            caller.select_game(n - 1);
            n - 1
        }
        Some(n) => return Err(format!("Game {n} does not exist, {} has {} game(s)", event.id, event.games.len()).into()),
        None => caller.selected_game(event.games.len()),
    };
    log_info(&format!("Caller started for event '{}' on {} with {} number(s) already drawn", event.id, event.game(game).name, caller.drawn().len()));

    let mut checker = WinnerBoard::new();
    let _raw = RawMode::enable()?;

    loop {
        terminal::draw(&terminal::render_caller(&event, event.game(game), &caller))?;
        match terminal::wait_action()? {
            KeyAction::Select => match caller.draw() {
                Some(number) => {
                    terminal::animate_draw(event.caller_label(number), number)?;
                    log_info(&format!("Drew {} {number}", event.caller_label(number)));
                }
                None => log_warning("Draw requested but every number has been called"),
            },
            KeyAction::Char('g') => {
                game = (game + 1) % event.games.len();
                caller.select_game(game);
                log_info(&format!("Switched to {} ({})", event.game(game).name, event.game(game).pattern.display_name()));
            }
            KeyAction::Char('w') => run_checker(&event, &mut checker, &caller)?,
            KeyAction::Char('r') => {
                if terminal::confirm("Reset the game and put every number back?")? {
                    caller.reset();
                }
            }
            KeyAction::Quit => break,
            _ => {}
        }
    }

    terminal::draw("Exiting the caller.\n")?;
    Ok(())
}

fn main() {
    let args = Args::parse();
    match run_caller(args) {
        Ok(_) => {
            println!("Caller finished successfully.");
        }
        Err(e) => {
            log_error(&format!("Exiting on error: {e}"));
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
