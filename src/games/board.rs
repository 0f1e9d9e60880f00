//! Board model mirrored from the oracle.
//!
//! The board is never mutated locally. Every accepted transition replaces it
//! wholesale with the board decoded from the oracle's response.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};
use tracing::{debug, instrument};

use super::Variant;
use crate::OracleError;

/// A board coordinate, row-major, origin at the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    /// Row index from the top.
    pub row: u8,
    /// Column index from the left.
    pub col: u8,
}

impl Coord {
    /// Creates a coordinate.
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// Returns the destination key used by the oracle (`"row,col"`).
    pub fn key(&self) -> String {
        format!("{},{}", self.row, self.col)
    }

    /// Parses a `"row,col"` destination key.
    pub fn parse_key(key: &str) -> Option<Self> {
        let (row, col) = key.split_once(',')?;
        Some(Self::new(row.trim().parse().ok()?, col.trim().parse().ok()?))
    }

    /// Returns algebraic notation (`A8`..`H1`) for 8x8 boards.
    pub fn algebraic(&self) -> Option<String> {
        if self.row >= 8 || self.col >= 8 {
            return None;
        }
        let file = (b'A' + self.col) as char;
        Some(format!("{}{}", file, 8 - self.row))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

/// The owner identity of a piece as the oracle reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Mark {
    /// Tic-tac-toe and connect-four player mark.
    #[strum(to_string = "O")]
    O,
    /// Tic-tac-toe and connect-four AI mark.
    #[strum(to_string = "X")]
    X,
    /// Light pieces.
    #[strum(to_string = "white")]
    White,
    /// Dark pieces.
    #[strum(to_string = "black")]
    Black,
}

impl Mark {
    /// Returns the mark on the other side of the board.
    pub fn opponent(self) -> Self {
        match self {
            Self::O => Self::X,
            Self::X => Self::O,
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

/// Rank of a piece, for variants that have them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum PieceKind {
    /// Uncrowned checkers piece.
    Man,
    /// Chess pawn.
    Pawn,
    /// Chess knight.
    Knight,
    /// Chess bishop.
    Bishop,
    /// Chess rook.
    Rook,
    /// Chess queen.
    Queen,
    /// Chess king or crowned checkers piece.
    King,
}

impl PieceKind {
    /// Pieces a pawn may promote to, in prompt order.
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Knight,
        PieceKind::Bishop,
    ];

    /// Returns the single-letter code used on the wire.
    pub fn letter(self) -> char {
        match self {
            Self::Man => 'M',
            Self::Pawn => 'P',
            Self::Knight => 'N',
            Self::Bishop => 'B',
            Self::Rook => 'R',
            Self::Queen => 'Q',
            Self::King => 'K',
        }
    }

    /// Parses a chess piece letter.
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'P' => Some(Self::Pawn),
            'N' => Some(Self::Knight),
            'B' => Some(Self::Bishop),
            'R' => Some(Self::Rook),
            'Q' => Some(Self::Queen),
            'K' => Some(Self::King),
            _ => None,
        }
    }
}

/// What occupies a non-empty cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occupant {
    /// Owner of the piece.
    pub mark: Mark,
    /// Rank, absent for plain marks.
    pub kind: Option<PieceKind>,
}

impl Occupant {
    /// Creates a plain mark with no rank.
    pub const fn mark(mark: Mark) -> Self {
        Self { mark, kind: None }
    }

    /// Creates a ranked piece.
    pub const fn piece(mark: Mark, kind: PieceKind) -> Self {
        Self {
            mark,
            kind: Some(kind),
        }
    }

    /// Decodes one cell in any encoding the oracle uses.
    ///
    /// `null`, `0` and `""` are empty. Strings are marks, integers are
    /// checkers codes. Objects are chess pieces with a `color`, or checkers
    /// pieces whose `piece` names the player (`O`) or the AI (`X`); those
    /// are seated on `player`'s side of the board.
    pub fn from_wire(value: &Value, player: Mark) -> Result<Option<Self>, OracleError> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) if s.is_empty() => Ok(None),
            Value::String(s) => Mark::from_str(s)
                .map(|mark| Some(Self::mark(mark)))
                .map_err(|_| OracleError::transport(format!("Unknown cell mark: {}", s))),
            Value::Number(n) => match n.as_u64() {
                Some(0) => Ok(None),
                Some(1) => Ok(Some(Self::piece(Mark::White, PieceKind::Man))),
                Some(2) => Ok(Some(Self::piece(Mark::Black, PieceKind::Man))),
                Some(3) => Ok(Some(Self::piece(Mark::White, PieceKind::King))),
                Some(4) => Ok(Some(Self::piece(Mark::Black, PieceKind::King))),
                _ => Err(OracleError::transport(format!("Unknown piece code: {}", n))),
            },
            Value::Object(fields) if fields.contains_key("king") => {
                let mark = match fields.get("piece").and_then(Value::as_str) {
                    Some("O") | Some("o") => player,
                    Some("X") | Some("x") => player.opponent(),
                    _ => return Err(OracleError::transport("Checkers piece without an owner")),
                };
                let kind = match fields.get("king").and_then(Value::as_bool) {
                    Some(true) => PieceKind::King,
                    _ => PieceKind::Man,
                };
                Ok(Some(Self::piece(mark, kind)))
            }
            Value::Object(fields) => {
                let color = fields
                    .get("color")
                    .and_then(Value::as_str)
                    .and_then(|c| Mark::from_str(c).ok())
                    .ok_or_else(|| OracleError::transport("Piece without a valid color"))?;
                let kind = fields
                    .get("piece")
                    .and_then(Value::as_str)
                    .and_then(|p| p.chars().next())
                    .and_then(PieceKind::from_letter)
                    .ok_or_else(|| OracleError::transport("Piece without a valid kind"))?;
                Ok(Some(Self::piece(color, kind)))
            }
            other => Err(OracleError::transport(format!(
                "Unsupported cell encoding: {}",
                other
            ))),
        }
    }
}

/// A fixed-size grid of cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Option<Occupant>>,
}

impl Board {
    /// Creates an empty board.
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![None; rows * cols],
        }
    }

    /// Creates a board from rows of cells.
    ///
    /// Returns `None` if the rows are ragged.
    pub fn from_rows(rows: Vec<Vec<Option<Occupant>>>) -> Option<Self> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if rows.iter().any(|r| r.len() != width) {
            return None;
        }
        Some(Self {
            rows: height,
            cols: width,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// Decodes a board of the given variant from the oracle's JSON grid.
    #[instrument(skip(value), fields(variant = %variant, player = %player))]
    pub fn from_wire(variant: Variant, player: Mark, value: &Value) -> Result<Self, OracleError> {
        let (rows, cols) = variant.dimensions();
        let grid = value
            .as_array()
            .ok_or_else(|| OracleError::transport("Board is not an array"))?;
        if grid.len() != rows {
            return Err(OracleError::transport(format!(
                "Board has {} rows, expected {}",
                grid.len(),
                rows
            )));
        }

        let mut cells = Vec::with_capacity(rows * cols);
        for (r, row) in grid.iter().enumerate() {
            let row = row
                .as_array()
                .ok_or_else(|| OracleError::transport(format!("Row {} is not an array", r)))?;
            if row.len() != cols {
                return Err(OracleError::transport(format!(
                    "Row {} has {} cells, expected {}",
                    r,
                    row.len(),
                    cols
                )));
            }
            for cell in row {
                cells.push(Occupant::from_wire(cell, player)?);
            }
        }

        debug!(occupied = cells.iter().flatten().count(), "Decoded board");
        Ok(Self { rows, cols, cells })
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns true if the coordinate lies on the board.
    pub fn contains(&self, coord: Coord) -> bool {
        (coord.row as usize) < self.rows && (coord.col as usize) < self.cols
    }

    /// Returns the occupant at `coord`, or `None` if empty or off-board.
    pub fn get(&self, coord: Coord) -> Option<Occupant> {
        if !self.contains(coord) {
            return None;
        }
        self.cells[coord.row as usize * self.cols + coord.col as usize]
    }

    /// Returns true if `coord` holds a piece with the given mark.
    pub fn is_owned_by(&self, coord: Coord, mark: Mark) -> bool {
        self.get(coord).is_some_and(|o| o.mark == mark)
    }

    /// Iterates over `(coord, cell)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, Option<Occupant>)> + '_ {
        self.cells.iter().enumerate().map(|(i, cell)| {
            let coord = Coord::new((i / self.cols) as u8, (i % self.cols) as u8);
            (coord, *cell)
        })
    }
}
