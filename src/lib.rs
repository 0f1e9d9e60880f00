//! vsai client library - play board games against a remote AI oracle
//!
//! The server owns every rule. This crate mirrors its state, keeps the
//! local selection and turn bookkeeping consistent, and renders it.
//!
//! # Architecture
//!
//! - **Session**: opaque token correlating client and server state
//! - **Oracle**: async client for the game server (`RestOracle`)
//! - **Machine**: sans-IO session state machine
//! - **Render / Dispatch**: pure snapshot rendering and click routing
//! - **Controller**: runs oracle calls on tokio tasks and feeds results back
//! - **TUI**: ratatui front-end
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vsai_client::{
//!     AiMode, Collaborators, ControllerSettings, PlayerSide, RestOracle, SessionController,
//!     Variant,
//! };
//!
//! # async fn example() {
//! let oracle = Arc::new(RestOracle::new("http://127.0.0.1:5000"));
//! let mut controller = SessionController::new(
//!     oracle,
//!     ControllerSettings::default(),
//!     Variant::TicTacToe,
//!     PlayerSide::White,
//!     AiMode::default(),
//!     Collaborators::headless(),
//! );
//! controller.start_new_game();
//! controller.settle_next().await;
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod collaborators;
mod config;
mod controller;
mod dispatch;
mod error;
mod games;
mod machine;
mod oracle;
mod render;
mod session;
pub mod tui;

// Crate-level exports - Errors
pub use error::{OracleError, OracleErrorKind, PreconditionViolation};

// Crate-level exports - Session identity
pub use session::SessionToken;

// Crate-level exports - Game data model
pub use games::{
    AiMode, Board, Coord, Endpoints, InputMode, LastMove, Mark, MoveMeta, MoveTarget, Mover,
    Occupant, OpponentReply, Outcome, PieceKind, PlayerSide, ValidMoves, Variant, Winner,
    valid_moves_from_wire,
};

// Crate-level exports - Oracle client
pub use oracle::{
    GameStats, GameUpdate, MoveSubmission, Oracle, RestOracle, SessionContext, decode_ai_mode,
    decode_stats, decode_update, decode_valid_moves, move_body,
};

// Crate-level exports - State machine
pub use machine::{
    CallKind, Dispatch, InFlight, OracleCall, OracleReply, Phase, SessionEvent, SessionMachine,
    Snapshot, Ticket, Transition,
};

// Crate-level exports - Rendering and input
pub use dispatch::{InputDispatcher, MachineInput, UiEvent};
pub use render::{BoardView, CellView, Owner, glyph, render};

// Crate-level exports - Controller and collaborators
pub use collaborators::{
    Collaborators, MemoryPreferences, MenuFlag, Navigator, NoStats, Preference, PreferencesError,
    PreferencesStore, PromotionPrompt, PromotionReply, PromptCommand, SharedPrompt, SharedStats,
    Silent, SoundCue, SoundPlayer, StatsDisplay, TerminalBell, TomlPreferences,
};
pub use controller::{ControllerSettings, SessionController};

// Crate-level exports - Configuration
pub use config::{ClientConfig, ConfigError};
