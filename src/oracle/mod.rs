//! Remote oracle client.
//!
//! The oracle owns all game rules. This module only sends requests and
//! decodes responses into tagged results, so nothing downstream ever
//! inspects raw payload shapes.

mod rest;
mod wire;

pub use rest::RestOracle;
pub use wire::{decode_ai_mode, decode_stats, decode_update, decode_valid_moves, move_body};

use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::games::{
    AiMode, Board, Coord, LastMove, Mark, MoveTarget, Outcome, PieceKind, PlayerSide, ValidMoves,
    Variant,
};
use crate::{OracleError, SessionToken};

/// Everything the oracle needs to identify and decode a session.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
pub struct SessionContext {
    token: SessionToken,
    variant: Variant,
    side: PlayerSide,
    ai_mode: AiMode,
}

impl SessionContext {
    /// Returns the mark owned by the local player.
    pub fn player_mark(&self) -> Mark {
        self.variant.player_mark(self.side)
    }
}

/// A player move as submitted to the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveSubmission {
    /// Origin square for piece moves.
    pub origin: Option<Coord>,
    /// Destination cell or column.
    pub target: MoveTarget,
    /// Promotion piece, for moves flagged as promotions.
    pub promotion: Option<PieceKind>,
}

/// Authoritative state returned by `newGame`, `makeMove` and `aiMove`.
#[derive(Debug, Clone, PartialEq)]
pub struct GameUpdate {
    /// The board to display.
    pub board: Board,
    /// Turn flag and terminal state.
    pub outcome: Outcome,
    /// True if the move captured a piece.
    pub captured: bool,
    /// The move the oracle reports, if any.
    pub last_move: Option<LastMove>,
}

/// Aggregate counters for one game type.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GameStats {
    /// Games finished.
    #[serde(default)]
    pub total_games: u64,
    /// Games won by the player.
    #[serde(default)]
    pub player_wins: u64,
    /// Games won by the AI.
    #[serde(default)]
    pub ai_wins: u64,
    /// Drawn games.
    #[serde(default)]
    pub draws: u64,
    /// Player win rate in percent.
    #[serde(default)]
    pub win_rate: f64,
}

/// The external authoritative game service.
///
/// Every call either succeeds with a decoded payload or fails with an
/// [`OracleError`]. Implementations never retry.
#[async_trait::async_trait]
pub trait Oracle: Send + Sync {
    /// Starts a new game for the session.
    async fn new_game(&self, session: &SessionContext) -> Result<GameUpdate, OracleError>;

    /// Lists destinations reachable from `origin`.
    async fn valid_moves(
        &self,
        session: &SessionContext,
        origin: Coord,
    ) -> Result<ValidMoves, OracleError>;

    /// Submits a player move.
    async fn make_move(
        &self,
        session: &SessionContext,
        submission: MoveSubmission,
    ) -> Result<GameUpdate, OracleError>;

    /// Asks the oracle to play the opponent's reply.
    async fn ai_move(&self, session: &SessionContext) -> Result<GameUpdate, OracleError>;

    /// Changes the AI algorithm for the session.
    async fn change_ai_mode(
        &self,
        session: &SessionContext,
        mode: AiMode,
    ) -> Result<AiMode, OracleError>;

    /// Reads aggregate statistics for a game type.
    async fn stats(&self, variant: Variant) -> Result<GameStats, OracleError>;
}
