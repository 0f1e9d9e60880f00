//! Game variants and their per-variant oracle contract.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use tracing::instrument;

use super::Mark;

/// A board game supported by the client.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// 3x3 placement game.
    #[strum(to_string = "tictactoe", serialize = "tic-tac-toe")]
    TicTacToe,
    /// 6x7 column-drop game.
    #[strum(to_string = "connect-four", serialize = "connectfour")]
    ConnectFour,
    /// 8x8 draughts.
    #[strum(to_string = "checkers")]
    Checkers,
    /// 8x8 chess.
    #[strum(to_string = "chess")]
    Chess,
}

/// How a click on the board becomes a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Clicking an empty cell places a mark there.
    Place,
    /// Clicking a column drops a token; the oracle resolves the row.
    Drop,
    /// Select an owned piece, then a destination from the valid-move set.
    SelectThenMove,
}

/// How the opponent's reply reaches the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpponentReply {
    /// The move response already contains the opponent's reply.
    Bundled,
    /// The client must ask for the reply with an explicit `aiMove` call.
    Explicit,
}

/// Which side the local player plays in variants that allow a choice.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PlayerSide {
    /// Light pieces, moves first.
    #[default]
    White,
    /// Dark pieces, moves second.
    Black,
}

impl PlayerSide {
    /// Toggles between white and black.
    pub fn toggle(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

/// Oracle endpoint paths for one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    /// Starts a new game.
    pub new_game: &'static str,
    /// Lists destinations for a selected origin.
    pub valid_moves: &'static str,
    /// Submits a player move.
    pub make_move: &'static str,
    /// Requests the opponent's reply.
    pub ai_move: &'static str,
    /// Changes the AI algorithm.
    pub change_ai_mode: &'static str,
    /// Reads aggregate statistics.
    pub stats: &'static str,
}

const SHARED: Endpoints = Endpoints {
    new_game: "/api/new_game",
    valid_moves: "/api/get_valid_moves",
    make_move: "/api/make_move",
    ai_move: "/api/ai_move",
    change_ai_mode: "/api/change_ai_mode",
    stats: "/api/get_stats",
};

const CHECKERS: Endpoints = Endpoints {
    new_game: "/api/checkers/new_game",
    valid_moves: "/api/checkers/valid_moves",
    make_move: "/api/checkers/move",
    ..SHARED
};

impl Variant {
    /// Returns `(rows, cols)` of the board.
    pub fn dimensions(self) -> (usize, usize) {
        match self {
            Self::TicTacToe => (3, 3),
            Self::ConnectFour => (6, 7),
            Self::Checkers | Self::Chess => (8, 8),
        }
    }

    /// Returns the `game_type` string sent to the oracle.
    pub fn game_type(self) -> &'static str {
        match self {
            Self::TicTacToe => "TicTacToe",
            Self::ConnectFour => "ConnectFour",
            Self::Checkers => "Checkers",
            Self::Chess => "Chess",
        }
    }

    /// Returns the human-readable title.
    pub fn title(self) -> &'static str {
        match self {
            Self::TicTacToe => "Tic-Tac-Toe",
            Self::ConnectFour => "Connect Four",
            Self::Checkers => "Checkers",
            Self::Chess => "Chess",
        }
    }

    /// Returns the preference namespace for this variant.
    pub fn namespace(self) -> &'static str {
        match self {
            Self::TicTacToe => "tictactoe",
            Self::ConnectFour => "connect_four",
            Self::Checkers => "checkers",
            Self::Chess => "chess",
        }
    }

    /// Returns how board clicks become moves.
    pub fn input_mode(self) -> InputMode {
        match self {
            Self::TicTacToe => InputMode::Place,
            Self::ConnectFour => InputMode::Drop,
            Self::Checkers | Self::Chess => InputMode::SelectThenMove,
        }
    }

    /// Returns how the opponent's reply is delivered.
    pub fn opponent_reply(self) -> OpponentReply {
        match self {
            Self::TicTacToe | Self::Chess => OpponentReply::Explicit,
            Self::ConnectFour | Self::Checkers => OpponentReply::Bundled,
        }
    }

    /// Returns true if the player may choose a side.
    pub fn has_side_choice(self) -> bool {
        matches!(self, Self::Checkers)
    }

    /// Returns the mark owned by the local player for this session.
    #[instrument]
    pub fn player_mark(self, side: PlayerSide) -> Mark {
        match self {
            Self::TicTacToe | Self::ConnectFour => Mark::O,
            Self::Checkers => match side {
                PlayerSide::White => Mark::White,
                PlayerSide::Black => Mark::Black,
            },
            Self::Chess => Mark::White,
        }
    }

    /// Returns the oracle endpoint paths.
    pub fn endpoints(self) -> Endpoints {
        match self {
            Self::Checkers => CHECKERS,
            _ => SHARED,
        }
    }
}
