// src/terminal.rs
// Terminal input/output for the caller and the card front ends.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::{
    cursor::MoveTo,
    event::{self, Event as TermEvent, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{Clear, ClearType, disable_raw_mode, enable_raw_mode},
};

use crate::caller::NumberCaller;
use crate::card::Card;
use crate::checker::{CHECKER_COLS, CHECKER_ROWS, WinnerBoard};
use crate::defs::{CARDCONFIG, FREE_LABEL, Number, column_of};
use crate::event::{Event, Game};
use crate::pattern::Pattern;
use crate::storage::KeyValueStore;

const RESET: &str = "\x1b[0m";
const BOLD_GREEN: &str = "\x1b[1;32m";
const BOLD_YELLOW: &str = "\x1b[1;33m";
const BOLD_RED: &str = "\x1b[1;31m";
const REVERSE: &str = "\x1b[7m";
const DIM: &str = "\x1b[2m";

const CARD_LETTERS: [char; 5] = ['B', 'I', 'N', 'G', 'O'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Up,
    Down,
    Left,
    Right,
    /// Enter or Space
    Select,
    NextTab,
    Quit,
    Char(char),
}

/// Raw mode for as long as the guard lives.
pub struct RawMode;

impl RawMode {
    pub fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        // drop anything typed before we started listening
        while event::poll(Duration::from_millis(0))? {
            event::read()?;
        }
        Ok(RawMode)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

pub fn map_key(code: KeyCode, modifiers: KeyModifiers) -> Option<KeyAction> {
    match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(KeyAction::Quit),
        KeyCode::Esc => Some(KeyAction::Quit),
        KeyCode::Up => Some(KeyAction::Up),
        KeyCode::Down => Some(KeyAction::Down),
        KeyCode::Left => Some(KeyAction::Left),
        KeyCode::Right => Some(KeyAction::Right),
        KeyCode::Enter | KeyCode::Char(' ') => Some(KeyAction::Select),
        KeyCode::Tab => Some(KeyAction::NextTab),
        KeyCode::Char(c) => Some(KeyAction::Char(c.to_ascii_lowercase())),
        _ => None,
    }
}

/// Wait up to `timeout` for a key press.
pub fn poll_action(timeout: Duration) -> io::Result<Option<KeyAction>> {
    if !event::poll(timeout)? {
        return Ok(None);
    }
    match event::read()? {
        // Only process key press events, not key release events
        TermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(map_key(key.code, key.modifiers)),
        _ => Ok(None),
    }
}

pub fn wait_action() -> io::Result<KeyAction> {
    loop {
        if let Some(action) = poll_action(Duration::from_secs(3600))? {
            return Ok(action);
        }
    }
}

/// Clear the screen and print `content`, fixing line endings for raw mode.
pub fn draw(content: &str) -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;
    write!(stdout, "{}", content.replace('\n', "\r\n"))?;
    stdout.flush()
}

/// Ask a yes/no question; anything other than `y` is a no.
pub fn confirm(question: &str) -> io::Result<bool> {
    let mut stdout = io::stdout();
    write!(stdout, "\r\n{BOLD_YELLOW}{question} (y/n){RESET} ")?;
    stdout.flush()?;
    Ok(matches!(wait_action()?, KeyAction::Char('y')))
}

pub fn rgb_escape((r, g, b): (u8, u8, u8)) -> String {
    format!("\x1b[1;38;2;{r};{g};{b}m")
}

/// Intermediate values shown while a number is being drawn, ending on it.
pub fn rolling_frames(number: Number, steps: usize) -> Vec<Number> {
    let steps = steps.max(1);
    (1..=steps)
        .map(|i| ((number as usize * i).div_ceil(steps)).max(1) as Number)
        .collect()
}

pub fn animate_draw(label: char, number: Number) -> io::Result<()> {
    let mut stdout = io::stdout();
    for frame in rolling_frames(number, 12) {
        write!(stdout, "\r{BOLD_GREEN}   {label} {frame:2}{RESET}")?;
        stdout.flush()?;
        std::thread::sleep(Duration::from_millis(40));
    }
    Ok(())
}

pub fn render_pattern(pattern: &Pattern, color: (u8, u8, u8)) -> String {
    let on = rgb_escape(color);
    let mut out = String::new();
    for row in pattern.grid() {
        out.push_str("   ");
        for cell in row {
            if cell {
                out.push_str(&format!("{on}■{RESET} "));
            } else {
                out.push_str(&format!("{DIM}·{RESET} "));
            }
        }
        out.push('\n');
    }
    out
}

pub fn render_game(game: &Game) -> String {
    format!("{}{} - {}{RESET}\n{}", rgb_escape(game.rgb()), game.name, game.pattern.display_name(), render_pattern(&game.pattern, game.rgb()))
}

pub fn render_caller<S: KeyValueStore>(event: &Event, game: &Game, caller: &NumberCaller<S>) -> String {
    let mut out = format!("{}\n", event.title);
    if !event.subtitle.is_empty() {
        out.push_str(&format!("{}\n", event.subtitle));
    }
    out.push('\n');

    match caller.last() {
        Some(n) => out.push_str(&format!("Last number: {BOLD_GREEN}{} {n}{RESET}\n", event.caller_label(n))),
        None => out.push_str("Last number: --\n"),
    }
    let previous: Vec<String> = caller
        .previous_draws()
        .iter()
        .map(|&n| format!("{} {n}", event.caller_label(n)))
        .collect();
    out.push_str(&format!("Previous numbers: {}\n\n", previous.join("  ")));

    // called numbers grouped by column letter
    let called = caller.board().sorted_numbers();
    for (col, letter) in event.caller_letters.iter().enumerate() {
        let row: Vec<String> = called
            .iter()
            .filter(|&&n| column_of(n) == col)
            .map(|n| format!("{n:2}"))
            .collect();
        out.push_str(&format!("{letter} | {}\n", row.join(" ")));
    }
    out.push('\n');

    out.push_str(&render_game(game));
    out.push('\n');

    if caller.is_finished() {
        out.push_str("All numbers have been called!\n");
    } else {
        out.push_str(&format!("Remaining in pouch: {}\n", caller.remaining()));
    }
    out.push_str("\nENTER draw | w check winner | g next game | r reset | ESC exit\n");
    out
}

pub fn render_checker(event: &Event, board: &WinnerBoard, drawn: &[Number], cursor: (usize, usize)) -> String {
    let mut out = String::from("Winner check\n\n ");
    for letter in event.checker_letters {
        out.push_str(&format!("{letter:^4}"));
    }
    out.push('\n');

    for row in 0..CHECKER_ROWS {
        out.push(' ');
        for col in 0..CHECKER_COLS {
            let number = WinnerBoard::number_at(row, col);
            let style = match (board.is_selected(row, col), drawn.contains(&number)) {
                (true, true) => BOLD_GREEN,
                (true, false) => BOLD_RED,
                (false, true) => BOLD_YELLOW,
                (false, false) => "",
            };
            let marker = if cursor == (row, col) { REVERSE } else { "" };
            out.push_str(&format!(" {marker}{style}{number:2}{RESET} "));
        }
        out.push('\n');
    }

    let missing = board.not_drawn(drawn);
    if board.selected_numbers().is_empty() {
        out.push_str("\nPick the numbers on the claimed card.\n");
    } else if missing.is_empty() {
        out.push_str(&format!("\n{BOLD_GREEN}All selected numbers were called{RESET}\n"));
    } else {
        let listed: Vec<String> = missing.iter().map(|n| n.to_string()).collect();
        out.push_str(&format!("\n{BOLD_RED}Not called: {}{RESET}\n", listed.join(", ")));
    }
    out.push_str("\nArrows move | SPACE pick | x clear picks | ESC back\n");
    out
}

pub fn render_card(card: &Card, index: usize, cursor: Option<(usize, usize)>) -> String {
    let mut out = format!("Card {}\n ", index + 1);
    for letter in CARD_LETTERS {
        out.push_str(&format!("{letter:^6}"));
    }
    out.push('\n');

    for row in 0..CARDCONFIG.rows_per_card {
        out.push(' ');
        for col in 0..CARDCONFIG.cols_per_card {
            let text = card
                .cell(row, col)
                .number()
                .map_or_else(|| FREE_LABEL.to_string(), |n| n.to_string());
            let style = if card.is_marked(row, col) { BOLD_YELLOW } else { "" };
            let marker = if cursor == Some((row, col)) { REVERSE } else { "" };
            out.push_str(&format!("{marker}{style}{text:^6}{RESET}"));
        }
        out.push('\n');
    }

    if card.has_blackout() {
        out.push_str(&format!("{BOLD_GREEN}   *** BLACKOUT! ***{RESET}\n"));
    }
    out
}
