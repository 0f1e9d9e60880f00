//! Turn and outcome state, always taken from the oracle.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use strum::Display;

use super::Mark;

/// Who won, from the local player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
pub enum Winner {
    /// The local player won.
    Player,
    /// The AI won.
    Opponent,
    /// Nobody won.
    Draw,
    /// The game is still running.
    #[default]
    None,
}

impl Winner {
    /// Decodes the oracle's `winner` field.
    ///
    /// Accepts `"player"`, `"ai"`, `"draw"`, or a mark compared with the
    /// session's player mark. `null` means a draw once the game is over.
    pub fn from_wire(value: &Value, game_over: bool, player: Mark) -> Self {
        let Some(text) = value.as_str() else {
            return if game_over { Self::Draw } else { Self::None };
        };
        match text.to_ascii_lowercase().as_str() {
            "player" => Self::Player,
            "ai" | "opponent" => Self::Opponent,
            "draw" | "tie" => Self::Draw,
            _ => match Mark::from_str(text) {
                Ok(mark) if mark == player => Self::Player,
                Ok(_) => Self::Opponent,
                Err(_) if game_over => Self::Draw,
                Err(_) => Self::None,
            },
        }
    }
}

/// Turn flag plus terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// True when the local player is to move.
    pub player_turn: bool,
    /// True once the game has ended.
    pub game_over: bool,
    /// Result of the game.
    pub winner: Winner,
}

impl Default for Outcome {
    fn default() -> Self {
        Self {
            player_turn: false,
            game_over: false,
            winner: Winner::None,
        }
    }
}
