//! Values passed between the state machine and whoever performs I/O.

use crate::OracleError;
use crate::games::{AiMode, Coord, Mover, ValidMoves, Winner};
use crate::oracle::{GameUpdate, MoveSubmission, SessionContext};
use crate::SessionToken;

/// Identity of one issued oracle call.
///
/// A completion is applied only if its ticket is the one the machine is
/// waiting for, which also proves it belongs to the current session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ticket {
    token: SessionToken,
    id: u64,
}

impl Ticket {
    pub(super) fn new(token: SessionToken, id: u64) -> Self {
        Self { token, id }
    }

    /// Session the call was issued for.
    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    /// Sequence number, unique per machine.
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Kind of a gameplay call, kept while it is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum CallKind {
    /// `newGame`.
    NewGame,
    /// `getValidMoves`.
    ValidMoves,
    /// `makeMove`.
    MakeMove,
    /// `aiMove`.
    AiMove,
}

/// An oracle call the machine wants performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleCall {
    /// Start the game.
    NewGame,
    /// Fetch destinations for an origin.
    ValidMoves(Coord),
    /// Submit a player move.
    MakeMove(MoveSubmission),
    /// Ask for the opponent's reply.
    AiMove,
    /// Switch the AI algorithm.
    ChangeAiMode(AiMode),
}

/// A successful oracle result, fed back through `settle`.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleReply {
    /// Result of `newGame`, `makeMove` or `aiMove`.
    Update(GameUpdate),
    /// Result of `getValidMoves`.
    ValidMoves(ValidMoves),
    /// Result of `changeAiMode`.
    AiMode(AiMode),
}

/// A call to perform, with everything needed to perform it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    /// Identity to hand back with the completion.
    pub ticket: Ticket,
    /// What to ask.
    pub call: OracleCall,
    /// Session the call belongs to.
    pub context: SessionContext,
}

/// Something observable that happened during a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A new game board arrived.
    SessionStarted,
    /// An origin was selected.
    Selected(Coord),
    /// The selection was dropped without a request.
    SelectionCleared,
    /// A promotion move needs a piece choice.
    PromotionRequested {
        /// Square the pawn moves from.
        origin: Coord,
        /// Square the pawn lands on.
        destination: Coord,
    },
    /// The promotion prompt was dismissed.
    PromotionCancelled,
    /// A move was applied by the oracle.
    MoveApplied {
        /// Who moved.
        by: Mover,
        /// True if the move captured.
        captured: bool,
    },
    /// The opponent is to move and no call will be made for it.
    OpponentStalled,
    /// The game ended.
    GameOver(Winner),
    /// The AI algorithm changed.
    AiModeChanged(AiMode),
    /// An oracle call failed and the session reverted.
    Failed(OracleError),
    /// A completion arrived for a call that is no longer awaited.
    StaleDiscarded,
}

/// Result of feeding one input or completion into the machine.
#[derive(Debug, Clone, Default)]
pub struct Transition {
    /// What happened, in order.
    pub events: Vec<SessionEvent>,
    /// The call to perform next, if any.
    pub dispatch: Option<Dispatch>,
}

impl Transition {
    pub(super) fn event(event: SessionEvent) -> Self {
        Self {
            events: vec![event],
            dispatch: None,
        }
    }

    pub(super) fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }
}
