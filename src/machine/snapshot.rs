//! Observable state of one game session.

use derive_getters::Getters;
use strum::Display;

use super::{CallKind, Ticket};
use crate::SessionToken;
use crate::games::{AiMode, Board, Coord, LastMove, Mark, Outcome, PlayerSide, ValidMoves, Variant};

/// Where the session is in its turn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum Phase {
    /// No game has been started, or the last start failed.
    #[default]
    Idle,
    /// `newGame` is in flight.
    AwaitingNewGame,
    /// The player may act; nothing is selected.
    PlayerTurnNoSelection,
    /// The player has selected an origin.
    PlayerTurnSelected,
    /// A promotion move is waiting for a piece choice.
    AwaitingPromotionChoice,
    /// A player move is in flight.
    AwaitingMoveResult,
    /// The opponent is to move.
    OpponentTurn,
    /// The game has ended.
    GameOver,
}

impl Phase {
    /// Returns true in the phases that accept board clicks.
    pub fn is_interactive(self) -> bool {
        matches!(self, Self::PlayerTurnNoSelection | Self::PlayerTurnSelected)
    }
}

/// The gameplay call currently in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlight {
    /// Identity of the call.
    pub ticket: Ticket,
    /// What was asked.
    pub kind: CallKind,
}

/// Everything the renderer and the front-end may read.
///
/// Only the state machine mutates a snapshot.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct Snapshot {
    phase: Phase,
    token: Option<SessionToken>,
    variant: Variant,
    side: PlayerSide,
    ai_mode: AiMode,
    board: Option<Board>,
    outcome: Outcome,
    selection: Option<Coord>,
    valid_moves: ValidMoves,
    promotion_target: Option<Coord>,
    pending: Option<InFlight>,
    history: Vec<LastMove>,
    notice: Option<String>,
    ai_move_held: bool,
}

impl Snapshot {
    pub(super) fn new(variant: Variant, side: PlayerSide, ai_mode: AiMode) -> Self {
        Self {
            phase: Phase::Idle,
            token: None,
            variant,
            side,
            ai_mode,
            board: None,
            outcome: Outcome::default(),
            selection: None,
            valid_moves: ValidMoves::new(),
            promotion_target: None,
            pending: None,
            history: Vec::new(),
            notice: None,
            ai_move_held: false,
        }
    }

    /// Returns true while a gameplay call is in flight.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns the mark owned by the local player.
    pub fn player_mark(&self) -> Mark {
        self.variant.player_mark(self.side)
    }

    pub(super) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(super) fn reset(&mut self, token: SessionToken) {
        *self = Self {
            token: Some(token),
            phase: Phase::AwaitingNewGame,
            ..Self::new(self.variant, self.side, self.ai_mode)
        };
    }

    pub(super) fn clear_token(&mut self) {
        self.token = None;
    }

    pub(super) fn clear_selection(&mut self) {
        self.selection = None;
        self.valid_moves.clear();
        self.promotion_target = None;
    }

    pub(super) fn select(&mut self, origin: Coord) {
        self.selection = Some(origin);
        self.valid_moves.clear();
        self.promotion_target = None;
    }

    pub(super) fn set_valid_moves(&mut self, moves: ValidMoves) {
        self.valid_moves = moves;
    }

    pub(super) fn set_promotion_target(&mut self, target: Option<Coord>) {
        self.promotion_target = target;
    }

    pub(super) fn set_pending(&mut self, pending: Option<InFlight>) {
        self.pending = pending;
    }

    pub(super) fn take_pending(&mut self) -> Option<InFlight> {
        self.pending.take()
    }

    pub(super) fn set_board(&mut self, board: Board, outcome: Outcome) {
        self.board = Some(board);
        self.outcome = outcome;
    }

    pub(super) fn set_ai_mode(&mut self, mode: AiMode) {
        self.ai_mode = mode;
    }

    pub(super) fn push_history(&mut self, entry: LastMove) {
        self.history.push(entry);
    }

    pub(super) fn set_notice(&mut self, notice: Option<String>) {
        self.notice = notice;
    }

    pub(super) fn hold_ai_move(&mut self, held: bool) {
        self.ai_move_held = held;
    }
}
