//! Pure mapping from a session snapshot to a displayable board.
//!
//! Highlights are derived from the snapshot on every call. Nothing here is
//! cached between renders.

use tracing::instrument;

use crate::games::{Coord, InputMode, Mark, Occupant, OpponentReply, PieceKind, Variant, Winner};
use crate::machine::{Phase, Snapshot};

/// Whose piece sits in a cell, from the local player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// The local player.
    Player,
    /// The AI.
    Opponent,
}

/// One rendered cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellView {
    /// Position on the board.
    pub coord: Coord,
    /// Decoded occupant, if any.
    pub occupant: Option<Occupant>,
    /// Owner of the occupant.
    pub owner: Option<Owner>,
    /// Text to draw for the cell.
    pub glyph: String,
    /// The cell is the selected origin.
    pub selected: bool,
    /// The cell is a valid destination for the selection.
    pub destination: bool,
    /// The destination would capture.
    pub capture: bool,
    /// The cell is waiting for a promotion choice.
    pub promoting: bool,
}

/// Full visual state of the game screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    /// Game title.
    pub title: String,
    /// Grid of cells, row-major. Empty before the first board arrives.
    pub cells: Vec<Vec<CellView>>,
    /// Line describing whose turn it is and what to do.
    pub status: String,
    /// Terminal result, shown once the game is over.
    pub banner: Option<String>,
    /// Transient notice, usually the last failure.
    pub notice: Option<String>,
    /// A request is in flight.
    pub busy: bool,
    /// Move history in notation, oldest first.
    pub history: Vec<String>,
    /// Current AI algorithm name.
    pub ai_mode: String,
}

/// Renders a snapshot.
#[instrument(skip(snapshot), fields(phase = %snapshot.phase()))]
pub fn render(snapshot: &Snapshot) -> BoardView {
    let variant = *snapshot.variant();
    let player = snapshot.player_mark();

    let cells = snapshot
        .board()
        .as_ref()
        .map(|board| {
            let mut rows: Vec<Vec<CellView>> = vec![Vec::with_capacity(board.cols()); board.rows()];
            for (coord, occupant) in board.iter() {
                let meta = snapshot.valid_moves().get(&coord);
                rows[coord.row as usize].push(CellView {
                    coord,
                    occupant,
                    owner: occupant.map(|o| owner_of(o.mark, player)),
                    glyph: glyph(variant, occupant),
                    selected: *snapshot.selection() == Some(coord),
                    destination: meta.is_some(),
                    capture: meta.is_some_and(|m| *m.capture()),
                    promoting: *snapshot.promotion_target() == Some(coord),
                });
            }
            rows
        })
        .unwrap_or_default();

    let banner = (*snapshot.phase() == Phase::GameOver).then(|| banner(snapshot.outcome().winner));

    BoardView {
        title: variant.title().to_string(),
        cells,
        status: status(snapshot),
        banner,
        notice: snapshot.notice().clone(),
        busy: snapshot.is_pending() || *snapshot.ai_move_held(),
        history: snapshot
            .history()
            .iter()
            .map(|m| m.notation(variant))
            .collect(),
        ai_mode: snapshot.ai_mode().name().to_string(),
    }
}

fn owner_of(mark: Mark, player: Mark) -> Owner {
    if mark == player {
        Owner::Player
    } else {
        Owner::Opponent
    }
}

/// Returns the text drawn for a cell.
pub fn glyph(variant: Variant, occupant: Option<Occupant>) -> String {
    let Some(occupant) = occupant else {
        return " ".to_string();
    };
    let white = matches!(occupant.mark, Mark::White);
    let symbol = match (variant, occupant.kind) {
        (Variant::ConnectFour, _) => "●",
        (_, None) => return occupant.mark.to_string(),
        (_, Some(PieceKind::Man)) if white => "⛀",
        (_, Some(PieceKind::Man)) => "⛂",
        (Variant::Checkers, Some(PieceKind::King)) if white => "⛁",
        (Variant::Checkers, Some(PieceKind::King)) => "⛃",
        (_, Some(PieceKind::King)) if white => "♔",
        (_, Some(PieceKind::King)) => "♚",
        (_, Some(PieceKind::Queen)) if white => "♕",
        (_, Some(PieceKind::Queen)) => "♛",
        (_, Some(PieceKind::Rook)) if white => "♖",
        (_, Some(PieceKind::Rook)) => "♜",
        (_, Some(PieceKind::Bishop)) if white => "♗",
        (_, Some(PieceKind::Bishop)) => "♝",
        (_, Some(PieceKind::Knight)) if white => "♘",
        (_, Some(PieceKind::Knight)) => "♞",
        (_, Some(PieceKind::Pawn)) if white => "♙",
        (_, Some(PieceKind::Pawn)) => "♟",
    };
    symbol.to_string()
}

fn banner(winner: Winner) -> String {
    match winner {
        Winner::Player => "You win!".to_string(),
        Winner::Opponent => "AI wins!".to_string(),
        Winner::Draw => "It's a draw!".to_string(),
        Winner::None => "Game over".to_string(),
    }
}

fn status(snapshot: &Snapshot) -> String {
    let variant = *snapshot.variant();
    match snapshot.phase() {
        Phase::Idle => "Press n to start a new game".to_string(),
        Phase::AwaitingNewGame => "Starting a new game...".to_string(),
        Phase::PlayerTurnNoSelection => match variant.input_mode() {
            InputMode::Place => "Your turn: pick an empty cell".to_string(),
            InputMode::Drop => "Your turn: pick a column".to_string(),
            InputMode::SelectThenMove => "Your turn: select a piece".to_string(),
        },
        Phase::PlayerTurnSelected => match snapshot.selection() {
            Some(origin) if snapshot.is_pending() => {
                format!("Loading moves for {}...", label(variant, *origin))
            }
            Some(origin) if snapshot.valid_moves().is_empty() => {
                format!("{} has no moves", label(variant, *origin))
            }
            Some(origin) => format!("Move {} where?", label(variant, *origin)),
            None => "Select a piece".to_string(),
        },
        Phase::AwaitingPromotionChoice => {
            "Promote to: [Q]ueen [R]ook k[N]ight [B]ishop".to_string()
        }
        Phase::AwaitingMoveResult => "Submitting move...".to_string(),
        Phase::OpponentTurn => match variant.opponent_reply() {
            OpponentReply::Explicit if snapshot.is_pending() => {
                format!("{} is thinking...", snapshot.ai_mode().name())
            }
            OpponentReply::Explicit if *snapshot.ai_move_held() => "Switching AI...".to_string(),
            OpponentReply::Explicit => "AI did not move. Press a to retry".to_string(),
            OpponentReply::Bundled => "Waiting for the opponent".to_string(),
        },
        Phase::GameOver => "Press n to play again".to_string(),
    }
}

fn label(variant: Variant, coord: Coord) -> String {
    match variant.dimensions() {
        (8, 8) => coord.algebraic().unwrap_or_else(|| coord.to_string()),
        _ => coord.to_string(),
    }
}
