// src/pattern.rs
// Winning patterns shown next to the caller, as 5x5 preview grids.

use crate::logging::log_warning;

pub type PatternGrid = [[bool; 5]; 5];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Diamond,
    Cross,
    Outside,
    Diagonal,
    Blackout,
    Corners,
    Pyramid,
    LetterY,
    LetterC,
    Custom(PatternGrid),
    /// A pattern id nobody knows how to draw
    Unknown(String),
}

impl Pattern {
    /// Pattern for a configured id; matching ignores case and surrounding spaces.
    pub fn from_id(id: &str) -> Self {
        match id.trim().to_lowercase().as_str() {
            "diamond" => Pattern::Diamond,
            "cross" => Pattern::Cross,
            "outside" => Pattern::Outside,
            "diagonal" => Pattern::Diagonal,
            "blackout" => Pattern::Blackout,
            "corners" => Pattern::Corners,
            "pyramid" => Pattern::Pyramid,
            "y" => Pattern::LetterY,
            "c" => Pattern::LetterC,
            other => Pattern::Unknown(other.to_string()),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Pattern::Diamond => "diamond",
            Pattern::Cross => "cross",
            Pattern::Outside => "outside",
            Pattern::Diagonal => "diagonal",
            Pattern::Blackout => "blackout",
            Pattern::Corners => "corners",
            Pattern::Pyramid => "pyramid",
            Pattern::LetterY => "y",
            Pattern::LetterC => "c",
            Pattern::Custom(_) => "custom",
            Pattern::Unknown(id) => id.as_str(),
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Pattern::Corners => "Four Corners".to_string(),
            Pattern::Pyramid => "Pyramid".to_string(),
            Pattern::LetterY => "Letter Y".to_string(),
            Pattern::LetterC => "Letter C".to_string(),
            Pattern::Blackout => "Blackout".to_string(),
            Pattern::Custom(_) => "Custom".to_string(),
            other => capitalize(other.id()),
        }
    }

    pub fn grid(&self) -> PatternGrid {
        let mut g = [[false; 5]; 5];
        match self {
            Pattern::Diamond => {
                // outline only: Manhattan distance exactly 2 from the centre
                for (r, row) in g.iter_mut().enumerate() {
                    for (c, cell) in row.iter_mut().enumerate() {
                        *cell = r.abs_diff(2) + c.abs_diff(2) == 2;
                    }
                }
            }
            Pattern::Cross => {
                // an X through both diagonals
                for i in 0..5 {
                    g[i][i] = true;
                    g[i][4 - i] = true;
                }
            }
            Pattern::Outside => {
                for (r, row) in g.iter_mut().enumerate() {
                    for (c, cell) in row.iter_mut().enumerate() {
                        *cell = r == 0 || r == 4 || c == 0 || c == 4;
                    }
                }
            }
            Pattern::Diagonal => {
                // bottom-right triangle
                for (r, row) in g.iter_mut().enumerate() {
                    for (c, cell) in row.iter_mut().enumerate() {
                        *cell = r + c >= 4;
                    }
                }
            }
            Pattern::Blackout => g = [[true; 5]; 5],
            Pattern::Corners => {
                g[0][0] = true;
                g[0][4] = true;
                g[4][0] = true;
                g[4][4] = true;
            }
            Pattern::Pyramid => {
                g[4] = [true; 5];
                g[3][1..4].fill(true);
                g[2][2] = true;
            }
            Pattern::LetterY => {
                for i in 0..3 {
                    g[i][i] = true;
                    g[i][4 - i] = true;
                }
                g[3][2] = true;
                g[4][2] = true;
            }
            Pattern::LetterC => {
                for row in g.iter_mut() {
                    row[0] = true;
                }
                g[0] = [true; 5];
                g[4] = [true; 5];
            }
            Pattern::Custom(grid) => g = *grid,
            Pattern::Unknown(id) => {
                if !id.is_empty() {
                    log_warning(&format!("Unknown pattern '{id}', showing an empty grid"));
                }
            }
        }
        g
    }

    pub fn cell_count(&self) -> usize {
        self.grid().iter().flatten().filter(|&&on| on).count()
    }
}

fn capitalize(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
