//! Single-player games that can be streamed to spectators.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single-player game from the games hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    #[serde(rename = "2048")]
    Game2048,
    Snake,
    Minesweeper,
    Sudoku,
    BlockDrop,
    Flappy,
}

impl GameType {
    pub const ALL: [GameType; 6] = [
        GameType::Game2048,
        GameType::Snake,
        GameType::Minesweeper,
        GameType::Sudoku,
        GameType::BlockDrop,
        GameType::Flappy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::Game2048 => "2048",
            GameType::Snake => "snake",
            GameType::Minesweeper => "minesweeper",
            GameType::Sudoku => "sudoku",
            GameType::BlockDrop => "block_drop",
            GameType::Flappy => "flappy",
        }
    }

    /// Human-readable name shown on invite cards.
    pub fn display_name(&self) -> &'static str {
        match self {
            GameType::Game2048 => "2048",
            GameType::Snake => "Snake",
            GameType::Minesweeper => "Minesweeper",
            GameType::Sudoku => "Sudoku",
            GameType::BlockDrop => "Block Drop",
            GameType::Flappy => "Flappy",
        }
    }
}

impl FromStr for GameType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameType::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| format!("Unknown game type: {}", s))
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
