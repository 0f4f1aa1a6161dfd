// src/event.rs
// Event presets: the title shown by the caller, the column letters, and the
// five games played that night with their colours and patterns.

use crate::defs::{Number, column_of};
use crate::pattern::Pattern;

#[derive(Debug, Clone)]
pub struct Game {
    pub id: &'static str,
    pub name: &'static str,
    /// Primary colour as `#rrggbb`
    pub color: &'static str,
    pub pattern: Pattern,
}

impl Game {
    fn new(index: usize, color: &'static str, pattern: &str) -> Self {
        const IDS: [&str; 5] = ["g1", "g2", "g3", "g4", "g5"];
        const NAMES: [&str; 5] = ["Game 1", "Game 2", "Game 3", "Game 4", "Game 5"];
        Game { id: IDS[index], name: NAMES[index], color, pattern: Pattern::from_id(pattern) }
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        parse_hex_color(self.color).unwrap_or((255, 255, 255))
    }
}

#[derive(Debug, Clone)]
pub struct Event {
    pub id: &'static str,
    pub title: &'static str,
    pub subtitle: &'static str,
    /// Column letters used when announcing numbers
    pub caller_letters: [char; 5],
    /// Column letters printed on the winner checking board
    pub checker_letters: [char; 5],
    pub games: Vec<Game>,
}

const BINGO: [char; 5] = ['B', 'I', 'N', 'G', 'O'];
const SUPER: [char; 5] = ['S', 'U', 'P', 'E', 'R'];

impl Event {
    pub const IDS: [&'static str; 3] = ["alumni", "bata", "classic"];

    pub fn alumni() -> Self {
        Event {
            id: "alumni",
            title: "LA CONSOLACION COLLEGE BACOLOD ALUMNI ASSOCIATION",
            subtitle: "BINGO SOCIAL",
            caller_letters: BINGO,
            checker_letters: SUPER,
            games: vec![
                Game::new(0, "#6BFFB8", "diamond"),
                Game::new(1, "#FFB74D", "cross"),
                Game::new(2, "#C388FF", "outside"),
                Game::new(3, "#FF6B6B", "diagonal"),
                Game::new(4, "#4A90E2", "blackout"),
            ],
        }
    }

    pub fn bata() -> Self {
        Event {
            id: "bata",
            title: "BNHS 20th Grand Alumni Homecoming Bingo",
            subtitle: "",
            caller_letters: BINGO,
            checker_letters: BINGO,
            games: vec![
                Game::new(0, "#1e90ff", "corners"),
                Game::new(1, "#ffb300", "pyramid"),
                Game::new(2, "#43a047", "y"),
                Game::new(3, "#e53935", "c"),
                Game::new(4, "#8e24aa", "blackout"),
            ],
        }
    }

    pub fn classic() -> Self {
        Event {
            id: "classic",
            title: "BINGO",
            subtitle: "",
            caller_letters: BINGO,
            checker_letters: BINGO,
            games: vec![Game::new(0, "#0057D9", "blackout")],
        }
    }

    pub fn by_id(id: &str) -> Option<Self> {
        match id.trim().to_lowercase().as_str() {
            "alumni" => Some(Self::alumni()),
            "bata" => Some(Self::bata()),
            "classic" => Some(Self::classic()),
            _ => None,
        }
    }

    pub fn game(&self, index: usize) -> &Game {
        self.games.get(index).unwrap_or(&self.games[0])
    }

    /// Letter announced with a number, e.g. `G` for 52.
    pub fn caller_label(&self, number: Number) -> char {
        self.caller_letters[column_of(number)]
    }

    pub fn checker_label(&self, number: Number) -> char {
        self.checker_letters[column_of(number)]
    }
}

/// First `#rgb` / `#rrggbb` colour found in `text`.
pub fn parse_hex_color(text: &str) -> Option<(u8, u8, u8)> {
    let start = text.find('#')? + 1;
    let hex: String = text[start..].chars().take_while(char::is_ascii_hexdigit).take(6).collect();
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some((channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        3 => {
            let expand = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
            Some((expand(0)?, expand(1)?, expand(2)?))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_have_five_games_ending_in_blackout() {
        for event in [Event::alumni(), Event::bata()] {
            assert_eq!(event.games.len(), 5);
            assert_eq!(event.games[4].pattern, Pattern::Blackout);
            assert!(event.games.iter().all(|g| !matches!(g.pattern, Pattern::Unknown(_))));
        }
        assert_eq!(Event::classic().games.len(), 1);
    }

    #[test]
    fn test_labels() {
        let alumni = Event::alumni();
        assert_eq!(alumni.caller_label(7), 'B');
        assert_eq!(alumni.caller_label(52), 'G');
        assert_eq!(alumni.checker_label(7), 'S');
        assert_eq!(alumni.checker_label(75), 'R');
        assert_eq!(Event::bata().checker_label(40), 'N');
    }

    #[test]
    fn test_by_id() {
        assert_eq!(Event::by_id("BATA").unwrap().id, "bata");
        assert!(Event::by_id("gala").is_none());
        for id in Event::IDS {
            assert!(Event::by_id(id).is_some());
        }
    }

    #[test]
    fn test_game_index_falls_back_to_first() {
        let event = Event::classic();
        assert_eq!(event.game(3).id, "g1");
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#1e90ff"), Some((0x1e, 0x90, 0xff)));
        assert_eq!(parse_hex_color("linear-gradient(45deg, #6BFFB8 0%, #006400 100%)"), Some((0x6b, 0xff, 0xb8)));
        assert_eq!(parse_hex_color("#fff"), Some((255, 255, 255)));
        assert_eq!(parse_hex_color("blue"), None);
        assert_eq!(Game::new(0, "nope", "blackout").rgb(), (255, 255, 255));
    }
}
