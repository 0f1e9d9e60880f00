//! Error types for oracle calls and rejected local inputs.

use derive_more::{Display, Error};
use tracing::instrument;

/// Which side of the oracle boundary a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum OracleErrorKind {
    /// Network, timeout, HTTP status or decode failure.
    #[display("transport failure")]
    Transport,
    /// The oracle answered with an explicit `error` field.
    #[display("oracle rejected")]
    Rejected,
}

/// Failure of a single oracle call.
///
/// The state machine treats both kinds identically; the kind is kept for
/// logging and for the notice shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("{}: {} at {}:{}", kind, message, file, line)]
pub struct OracleError {
    /// Failure category.
    pub kind: OracleErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl OracleError {
    /// Creates a transport failure with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::with_kind(OracleErrorKind::Transport, message.into())
    }

    /// Creates an oracle rejection with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::with_kind(OracleErrorKind::Rejected, message.into())
    }

    #[track_caller]
    fn with_kind(kind: OracleErrorKind, message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Returns true if the oracle itself refused the request.
    pub fn is_rejection(&self) -> bool {
        self.kind == OracleErrorKind::Rejected
    }
}

impl From<reqwest::Error> for OracleError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        Self::transport(format!("HTTP error: {}", err))
    }
}

impl From<serde_json::Error> for OracleError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::transport(format!("Malformed response: {}", err))
    }
}

/// Why an input was ignored.
///
/// Returned by state machine inputs that are not accepted in the current
/// state. Callers log these at debug level and never show them to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum PreconditionViolation {
    /// An oracle call is still in flight.
    #[display("a request is pending")]
    RequestPending,
    /// No session has been started yet.
    #[display("no active session")]
    NoSession,
    /// The current phase does not accept this input.
    #[display("input not accepted in the current phase")]
    NotInteractive,
    /// The input does not fit the variant's input mode.
    #[display("input not supported by this game")]
    WrongInputMode,
    /// The coordinate is outside the board.
    #[display("coordinate outside the board")]
    OutOfBounds,
    /// There is no piece to select.
    #[display("empty cell")]
    EmptyCell,
    /// The piece belongs to the opponent.
    #[display("not the player's piece")]
    NotOwnPiece,
    /// A placement targeted a cell that is already taken.
    #[display("cell already occupied")]
    Occupied,
    /// A promotion choice arrived with no promotion pending.
    #[display("no promotion pending")]
    NoPromotionPending,
    /// The chosen piece is not one a pawn may promote to.
    #[display("not a promotion piece")]
    InvalidPromotion,
}
