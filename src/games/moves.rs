//! Move metadata, AI modes and move history entries.

use std::collections::BTreeMap;

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Coord, Variant};
use crate::OracleError;

/// Metadata the oracle attaches to a candidate destination.
#[derive(Debug, Clone, PartialEq, Default, Getters)]
pub struct MoveMeta {
    /// The move needs a promotion choice before it can be submitted.
    promotion: bool,
    /// The move captures at least one piece.
    capture: bool,
    /// The metadata exactly as received.
    raw: Value,
}

impl MoveMeta {
    /// Creates metadata with explicit flags.
    pub fn new(promotion: bool, capture: bool) -> Self {
        Self {
            promotion,
            capture,
            raw: Value::Null,
        }
    }

    /// Decodes metadata from an object of flags or a list of captured squares.
    pub fn from_wire(value: &Value) -> Self {
        let flag = |name: &str| value.get(name).and_then(Value::as_bool).unwrap_or(false);
        let (promotion, capture) = match value {
            Value::Object(_) => (flag("promotion"), flag("capture")),
            Value::Array(captured) => (false, !captured.is_empty()),
            _ => (false, false),
        };
        Self {
            promotion,
            capture,
            raw: value.clone(),
        }
    }
}

/// Destinations reachable from the selected origin.
pub type ValidMoves = BTreeMap<Coord, MoveMeta>;

/// Decodes the oracle's `valid_moves` map keyed by `"row,col"`.
pub fn valid_moves_from_wire(value: &Value) -> Result<ValidMoves, OracleError> {
    let Some(map) = value.as_object() else {
        return match value {
            Value::Null => Ok(ValidMoves::new()),
            _ => Err(OracleError::transport("valid_moves is not an object")),
        };
    };
    map.iter()
        .map(|(key, meta)| {
            Coord::parse_key(key)
                .map(|coord| (coord, MoveMeta::from_wire(meta)))
                .ok_or_else(|| OracleError::transport(format!("Bad destination key: {}", key)))
        })
        .collect()
}

/// AI algorithm index understood by the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AiMode(pub u8);

impl AiMode {
    const NAMES: [&'static str; 6] = [
        "Minimax",
        "Pattern Recognition",
        "Q-Learning",
        "Neural Network",
        "MCTS",
        "Genetic Algorithm",
    ];

    /// Returns the display name of the algorithm.
    pub fn name(self) -> &'static str {
        Self::NAMES.get(self.0 as usize).copied().unwrap_or("Unknown")
    }

    /// Returns the next known mode, wrapping around.
    pub fn next(self) -> Self {
        Self(((self.0 as usize + 1) % Self::NAMES.len()) as u8)
    }
}

/// Who made a move in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mover {
    /// The local player.
    Player,
    /// The AI.
    Opponent,
}

/// Where a move landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveTarget {
    /// A specific cell.
    Cell(Coord),
    /// A column; the oracle resolves the row.
    Column(u8),
}

/// One entry of the move history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastMove {
    /// Who moved.
    pub by: Mover,
    /// Origin, for piece moves.
    pub from: Option<Coord>,
    /// Destination.
    pub to: MoveTarget,
    /// True if the move captured.
    pub captured: bool,
}

impl LastMove {
    /// Decodes the `last_move` (or tic-tac-toe `move`) annotation.
    pub fn from_wire(value: &Value) -> Option<Self> {
        let by = match value.get("player").and_then(Value::as_str) {
            Some("player") => Mover::Player,
            _ => Mover::Opponent,
        };
        let index = |v: &Value| -> Option<u8> { u8::try_from(v.as_u64()?).ok() };
        let pair = |v: &Value| -> Option<Coord> {
            let a = v.as_array()?;
            Some(Coord::new(index(a.first()?)?, index(a.get(1)?)?))
        };
        let from = match value.get("from") {
            Some(v) if !v.is_null() => Some(pair(v)?),
            _ => None,
        };
        let to = match value.get("to") {
            Some(to) if !to.is_null() => MoveTarget::Cell(pair(to)?),
            _ => {
                let col = index(value.get("col")?)?;
                match value.get("row") {
                    Some(row) if !row.is_null() => MoveTarget::Cell(Coord::new(index(row)?, col)),
                    _ => MoveTarget::Column(col),
                }
            }
        };
        let captured = match value.get("captured") {
            Some(Value::Bool(b)) => *b,
            Some(Value::Array(squares)) => !squares.is_empty(),
            _ => false,
        };
        Some(Self {
            by,
            from,
            to,
            captured,
        })
    }

    /// Formats the move for the history panel.
    pub fn notation(&self, variant: Variant) -> String {
        let square = |c: Coord| match variant.dimensions() {
            (8, 8) => c.algebraic().unwrap_or_else(|| c.to_string()),
            _ => c.to_string(),
        };
        let to = match self.to {
            MoveTarget::Cell(c) => square(c),
            MoveTarget::Column(col) => format!("column {}", col + 1),
        };
        let mut text = match self.from {
            Some(from) => format!("{} → {}", square(from), to),
            None => to,
        };
        if self.captured {
            text.push_str(" ×");
        }
        text
    }
}
