//! Key bindings for the menu and the game screen.

use crossterm::event::KeyCode;

use crate::games::{Coord, InputMode, PieceKind, Variant};

/// What a key press asks for on the game screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    /// Move the board cursor.
    Cursor(KeyCode),
    /// Click the cell under the cursor.
    Activate,
    /// Click a cell directly.
    Cell(Coord),
    /// Click a column directly.
    Column(u8),
    /// Answer the promotion prompt.
    Promote(PieceKind),
    /// Dismiss the promotion prompt.
    CancelPromotion,
    /// Start a new game.
    NewGame,
    /// Cycle the AI algorithm.
    NextAiMode,
    /// Ask for the AI move again.
    RetryAiMove,
    /// Flip the sound preference.
    ToggleSound,
    /// Flip the animation preference.
    ToggleAnimations,
    /// Go back to the variant menu.
    Menu,
    /// Leave the program.
    Quit,
}

/// Maps a key to a game action.
///
/// While the promotion prompt is open, piece letters and Escape belong to it.
pub fn game_action(key: KeyCode, variant: Variant, promotion_open: bool) -> Option<GameAction> {
    if promotion_open {
        return match key {
            KeyCode::Esc => Some(GameAction::CancelPromotion),
            KeyCode::Char(c) => PieceKind::from_letter(c)
                .filter(|p| PieceKind::PROMOTIONS.contains(p))
                .map(GameAction::Promote),
            _ => None,
        };
    }

    match key {
        KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right => {
            Some(GameAction::Cursor(key))
        }
        KeyCode::Enter | KeyCode::Char(' ') => Some(GameAction::Activate),
        KeyCode::Char(c) if c.is_ascii_digit() => digit_action(c, variant),
        KeyCode::Char('n') | KeyCode::Char('r') => Some(GameAction::NewGame),
        KeyCode::Char('m') => Some(GameAction::NextAiMode),
        KeyCode::Char('a') => Some(GameAction::RetryAiMove),
        KeyCode::Char('s') => Some(GameAction::ToggleSound),
        KeyCode::Char('v') => Some(GameAction::ToggleAnimations),
        KeyCode::Esc => Some(GameAction::Menu),
        KeyCode::Char('q') => Some(GameAction::Quit),
        _ => None,
    }
}

fn digit_action(c: char, variant: Variant) -> Option<GameAction> {
    let digit = c.to_digit(10)? as u8;
    let index = digit.checked_sub(1)?;
    let (rows, cols) = variant.dimensions();
    match variant.input_mode() {
        InputMode::Drop if (index as usize) < cols => Some(GameAction::Column(index)),
        InputMode::Place if (index as usize) < rows * cols => Some(GameAction::Cell(Coord::new(
            index / cols as u8,
            index % cols as u8,
        ))),
        _ => None,
    }
}

/// Moves the cursor, staying on a `rows` x `cols` board.
pub fn move_cursor(cursor: Coord, key: KeyCode, rows: usize, cols: usize) -> Coord {
    let last_row = rows.saturating_sub(1) as u8;
    let last_col = cols.saturating_sub(1) as u8;
    match key {
        KeyCode::Up => Coord::new(cursor.row.saturating_sub(1), cursor.col),
        KeyCode::Down => Coord::new((cursor.row + 1).min(last_row), cursor.col),
        KeyCode::Left => Coord::new(cursor.row, cursor.col.saturating_sub(1)),
        KeyCode::Right => Coord::new(cursor.row, (cursor.col + 1).min(last_col)),
        _ => cursor,
    }
}
