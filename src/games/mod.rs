//! Board game data model shared by every variant.

mod board;
mod moves;
mod outcome;
mod variant;

pub use board::{Board, Coord, Mark, Occupant, PieceKind};
pub use moves::{AiMode, LastMove, MoveMeta, MoveTarget, Mover, ValidMoves, valid_moves_from_wire};
pub use outcome::{Outcome, Winner};
pub use variant::{Endpoints, InputMode, OpponentReply, PlayerSide, Variant};
