//! JSON request bodies and tagged response decoding.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::{GameStats, GameUpdate, MoveSubmission, SessionContext};
use crate::OracleError;
use crate::games::{
    AiMode, Board, InputMode, LastMove, MoveTarget, Mover, Outcome, ValidMoves, Variant, Winner,
    valid_moves_from_wire,
};

#[derive(Debug, Serialize)]
pub(super) struct NewGameRequest<'a> {
    pub session_id: &'a str,
    pub ai_mode: AiMode,
    pub game_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_color: Option<String>,
}

impl<'a> NewGameRequest<'a> {
    pub fn new(session: &'a SessionContext) -> Self {
        let variant = *session.variant();
        Self {
            session_id: session.token().as_str(),
            ai_mode: *session.ai_mode(),
            game_type: variant.game_type(),
            player_color: variant
                .has_side_choice()
                .then(|| session.side().to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ValidMovesRequest<'a> {
    pub session_id: &'a str,
    pub row: u8,
    pub col: u8,
    pub game_type: &'static str,
}

#[derive(Debug, Serialize)]
pub(super) struct AiMoveRequest<'a> {
    pub session_id: &'a str,
    pub game_type: &'static str,
    pub ai_mode: AiMode,
}

#[derive(Debug, Serialize)]
pub(super) struct ChangeAiModeRequest<'a> {
    pub session_id: &'a str,
    pub ai_mode: AiMode,
}

/// Builds the `makeMove` body for the session's input mode.
#[instrument(skip(session), fields(session = %session.token()))]
pub fn move_body(session: &SessionContext, submission: &MoveSubmission) -> Value {
    let variant = *session.variant();
    let mut body = serde_json::Map::new();
    body.insert("session_id".into(), session.token().as_str().into());
    body.insert("game_type".into(), variant.game_type().into());

    match (variant.input_mode(), submission.origin, submission.target) {
        (InputMode::SelectThenMove, Some(from), MoveTarget::Cell(to)) => {
            body.insert("from_row".into(), from.row.into());
            body.insert("from_col".into(), from.col.into());
            body.insert("to_row".into(), to.row.into());
            body.insert("to_col".into(), to.col.into());
            if let Some(piece) = submission.promotion {
                body.insert("promotion_piece".into(), piece.letter().to_string().into());
            }
        }
        (_, _, MoveTarget::Cell(cell)) => {
            body.insert("row".into(), cell.row.into());
            body.insert("col".into(), cell.col.into());
        }
        (_, _, MoveTarget::Column(col)) => {
            body.insert("col".into(), col.into());
        }
    }
    Value::Object(body)
}

/// Splits an `error` field off a response body.
///
/// Any non-null `error` is a rejection, whatever the HTTP status said.
pub(super) fn reject_on_error(body: &Value) -> Result<(), OracleError> {
    match body.get("error") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::String(message)) => Err(OracleError::rejected(message.clone())),
        Some(other) => Err(OracleError::rejected(other.to_string())),
    }
}

fn captured_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Number(n)) => n.as_u64().is_some_and(|n| n > 0),
        _ => false,
    }
}

/// Decodes a `newGame`, `makeMove` or `aiMove` response body.
#[instrument(skip(session, body), fields(session = %session.token()))]
pub fn decode_update(session: &SessionContext, body: &Value) -> Result<GameUpdate, OracleError> {
    reject_on_error(body)?;
    let variant = *session.variant();
    let board = Board::from_wire(
        variant,
        session.player_mark(),
        body.get("board")
            .ok_or_else(|| OracleError::transport("Response has no board"))?,
    )?;

    let game_over = body
        .get("game_over")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let player_turn = body
        .get("player_turn")
        .and_then(Value::as_bool)
        .ok_or_else(|| OracleError::transport("Response has no player_turn flag"))?;
    let winner = Winner::from_wire(
        body.get("winner").unwrap_or(&Value::Null),
        game_over,
        session.player_mark(),
    );

    let captured = captured_flag(body.get("captured"));
    let last_move = match (body.get("last_move"), body.get("move")) {
        (Some(lm), _) if !lm.is_null() => LastMove::from_wire(lm),
        (_, Some(mv)) if !mv.is_null() && variant == Variant::TicTacToe => {
            LastMove::from_wire(mv).map(|m| LastMove {
                by: Mover::Opponent,
                ..m
            })
        }
        _ => None,
    }
    .map(|m| LastMove {
        captured: m.captured || (captured && m.by == Mover::Player),
        ..m
    });

    debug!(player_turn, game_over, winner = %winner, captured, "Decoded game update");
    Ok(GameUpdate {
        board,
        outcome: Outcome {
            player_turn,
            game_over,
            winner,
        },
        captured,
        last_move,
    })
}

/// Decodes a `getValidMoves` response body.
pub fn decode_valid_moves(body: &Value) -> Result<ValidMoves, OracleError> {
    reject_on_error(body)?;
    valid_moves_from_wire(body.get("valid_moves").unwrap_or(&Value::Null))
}

/// Decodes a `changeAiMode` response body.
///
/// Falls back to the requested mode when the oracle acknowledges without
/// echoing it.
pub fn decode_ai_mode(body: &Value, requested: AiMode) -> Result<AiMode, OracleError> {
    reject_on_error(body)?;
    match body.get("ai_mode") {
        None | Some(Value::Null) => Ok(requested),
        Some(mode) => Ok(serde_json::from_value(mode.clone())?),
    }
}

/// Decodes a `getStats` response body.
pub fn decode_stats(body: &Value) -> Result<GameStats, OracleError> {
    reject_on_error(body)?;
    Ok(serde_json::from_value(body.clone())?)
}
