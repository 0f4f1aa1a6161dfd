// src/bingo_card.rs
// Terminal bingo card. Several simulated tabs can share one store and one
// channel to show how cards stay in step between instances.
//
// Interactive Controls:
// - Arrows: Move the cursor (left/right crosses over to the other card)
// - SPACE/ENTER: Mark or unmark the cell under the cursor
// - a: Add a second card
// - c: Clear all cards everywhere (asks first)
// - TAB: Switch to the next simulated tab
// - ESC: Exit
//
// CLI Options:
// - --tabs: Number of simulated tabs
// - --memory: Keep cards in memory instead of the data directory

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use bingo::clock::SystemClock;
use bingo::config::BingoConfig;
use bingo::defs::CARDCONFIG;
use bingo::logging::{log_debug, log_error, log_info};
use bingo::persistence::SharedClock;
use bingo::storage::{FileStore, KeyValueStore, MemoryStore};
use bingo::sync::{CardSession, SyncContext, SyncOutcome};
use bingo::terminal::{self, KeyAction, RawMode};

const MAX_TABS: usize = 4;
const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Parser)]
#[command(name = env!("CARGO_BIN_NAME"))]
#[command(about = "Bingo Card - Mark your card, kept in step across tabs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Number of simulated tabs sharing the same cards
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=MAX_TABS as i64))]
    tabs: u8,

    /// Keep cards in memory only
    #[arg(long)]
    memory: bool,

    /// Path to the configuration file
    #[arg(long, default_value = BingoConfig::DEFAULT_PATH)]
    config: String,
}

#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    card: usize,
    row: usize,
    col: usize,
}

impl Cursor {
    fn apply(&mut self, action: KeyAction, card_count: usize) {
        let last_row = CARDCONFIG.rows_per_card - 1;
        let last_col = CARDCONFIG.cols_per_card - 1;
        match action {
            KeyAction::Up => self.row = self.row.saturating_sub(1),
            KeyAction::Down => self.row = (self.row + 1).min(last_row),
            KeyAction::Left if self.col == 0 && self.card > 0 => {
                self.card -= 1;
                self.col = last_col;
            }
            KeyAction::Left => self.col = self.col.saturating_sub(1),
            KeyAction::Right if self.col == last_col && self.card + 1 < card_count => {
                self.card += 1;
                self.col = 0;
            }
            KeyAction::Right => self.col = (self.col + 1).min(last_col),
            _ => {}
        }
    }

    fn clamp(&mut self, card_count: usize) {
        self.card = self.card.min(card_count.saturating_sub(1));
    }
}

struct Tab<S: KeyValueStore> {
    session: CardSession<S>,
    cursor: Cursor,
}

fn render_tab<S: KeyValueStore>(tabs: &[Tab<S>], active: usize, notice: &str) -> String {
    let tab = &tabs[active];
    let link = if tab.session.context().is_connected() { "synced" } else { "not synced" };
    let mut out = format!("Tab {}/{} ({link})\n\n", active + 1, tabs.len());
    for (index, card) in tab.session.board().cards().iter().enumerate() {
        let cursor = (index == tab.cursor.card).then_some((tab.cursor.row, tab.cursor.col));
        out.push_str(&terminal::render_card(card, index, cursor));
        out.push('\n');
    }
    if !notice.is_empty() {
        out.push_str(&format!("{notice}\n"));
    }
    out.push_str("\nArrows move | SPACE mark | a add card | c clear all | TAB next tab | ESC exit\n");
    out
}

fn run_cards<S: KeyValueStore + Clone>(store: S, config: &BingoConfig, tab_count: usize) -> Result<(), Box<dyn Error>> {
    let clock: SharedClock = Arc::new(SystemClock);
    let mut tabs: Vec<Tab<S>> = (0..tab_count)
        .map(|_| Tab {
            session: CardSession::open(store.clone(), SyncContext::open(&config.channel), clock.clone(), config.clear_lock_ttl_ms),
            cursor: Cursor::default(),
        })
        .collect();
    let mut active = 0;
    let mut notice = String::new();
    log_info(&format!("Card front end started with {tab_count} tab(s) on channel '{}'", config.channel));

    let _raw = RawMode::enable()?;
    let mut dirty = true;

    loop {
        for (index, tab) in tabs.iter_mut().enumerate() {
            for outcome in tab.session.pump() {
                log_debug(&format!("Tab {}: {outcome:?}", index + 1));
                if matches!(outcome, SyncOutcome::Adopted | SyncOutcome::Reloaded) {
                    dirty = true;
                }
            }
            tab.cursor.clamp(tab.session.board().count());
        }

        if dirty {
            terminal::draw(&render_tab(&tabs, active, &notice))?;
            dirty = false;
        }

        let Some(action) = terminal::poll_action(POLL_INTERVAL)? else {
            continue;
        };
        dirty = true;
        notice.clear();

        let tab = &mut tabs[active];
        match action {
            KeyAction::Select => {
                let Cursor { card, row, col } = tab.cursor;
                if tab.session.toggle(card, row, col) {
                    notice = format!("Card {} is a BLACKOUT!", card + 1);
                }
            }
            KeyAction::Char('a') => {
                if !tab.session.add_card() {
                    notice = "Two cards are already showing".to_string();
                }
            }
            KeyAction::Char('c') => {
                if terminal::confirm("Clear all cards in every tab?")? {
                    tab.session.begin_clear();
                    tab.cursor = Cursor::default();
                    notice = "Cards cleared, here are new ones".to_string();
                }
            }
            KeyAction::NextTab => active = (active + 1) % tabs.len(),
            KeyAction::Quit => break,
            other => {
                let count = tab.session.board().count();
                tab.cursor.apply(other, count);
            }
        }
    }

    terminal::draw("Exiting the bingo card.\n")?;
    Ok(())
}

fn main() {
    let args = Args::parse();
    let config = BingoConfig::load_from_or_default(&args.config);
    config.init_logging();

    let tabs = args.tabs as usize;
    let result = if args.memory {
        run_cards(MemoryStore::new(), &config, tabs)
    } else {
        run_cards(FileStore::in_dir(&config.data_dir), &config, tabs)
    };

    match result {
        Ok(_) => {
            println!("Card client finished successfully.");
        }
        Err(e) => {
            log_error(&format!("Exiting on error: {e}"));
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
