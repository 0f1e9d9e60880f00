//! Application state and key handling.

use std::path::PathBuf;
use std::sync::Arc;

use crossterm::event::{KeyCode, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use strum::IntoEnumIterator;
use tracing::{debug, info, instrument, warn};

use super::input::{GameAction, game_action, move_cursor};
use super::ui::{CELL_HEIGHT, CELL_WIDTH};
use crate::collaborators::{
    Collaborators, MemoryPreferences, MenuFlag, Preference, PreferencesStore, SharedPrompt,
    SharedStats, StatsDisplay, TerminalBell, TomlPreferences,
};
use crate::controller::{ControllerSettings, SessionController};
use crate::dispatch::UiEvent;
use crate::games::{AiMode, Coord, InputMode, PlayerSide, Variant};
use crate::machine::Phase;
use crate::oracle::Oracle;
use crate::{ClientConfig, OracleError, PreconditionViolation};

/// Which screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Variant picker.
    Menu,
    /// A game in progress.
    Game,
}

/// Main application state.
pub struct App {
    screen: Screen,
    variants: Vec<Variant>,
    menu_index: usize,
    side: PlayerSide,
    ai_mode: AiMode,
    controller: Option<SessionController>,
    cursor: Coord,
    board_area: Option<Rect>,
    oracle: Arc<dyn Oracle>,
    settings: ControllerSettings,
    preferences_path: PathBuf,
    stats: SharedStats,
    prompt: SharedPrompt,
    menu_flag: MenuFlag,
    tick: usize,
    quit: bool,
}

impl App {
    /// Creates the application on the menu screen.
    #[instrument(skip(oracle, config))]
    pub fn new(oracle: Arc<dyn Oracle>, config: &ClientConfig) -> Self {
        Self {
            screen: Screen::Menu,
            variants: Variant::iter().collect(),
            menu_index: 0,
            side: *config.player_side(),
            ai_mode: *config.ai_mode(),
            controller: None,
            cursor: Coord::new(0, 0),
            board_area: None,
            oracle,
            settings: ControllerSettings::new(config.request_timeout(), config.ai_move_delay()),
            preferences_path: config.preferences_path().clone(),
            stats: SharedStats::default(),
            prompt: SharedPrompt::default(),
            menu_flag: MenuFlag::default(),
            tick: 0,
            quit: false,
        }
    }

    /// Current screen.
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Variants in menu order.
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// Highlighted menu entry.
    pub fn menu_index(&self) -> usize {
        self.menu_index
    }

    /// Side used for checkers.
    pub fn side(&self) -> PlayerSide {
        self.side
    }

    /// AI mode for the next game.
    pub fn ai_mode(&self) -> AiMode {
        self.controller
            .as_ref()
            .map(|c| *c.snapshot().ai_mode())
            .unwrap_or(self.ai_mode)
    }

    /// The running session, on the game screen.
    pub fn controller(&self) -> Option<&SessionController> {
        self.controller.as_ref()
    }

    /// Board cursor.
    pub fn cursor(&self) -> Coord {
        self.cursor
    }

    /// Latest stats received for a variant.
    pub fn stats(&self) -> &SharedStats {
        &self.stats
    }

    /// Animation frame counter.
    pub fn tick(&self) -> usize {
        self.tick
    }

    /// True once the user asked to quit.
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Records where the board was drawn, for mouse hits.
    pub fn set_board_area(&mut self, area: Option<Rect>) {
        self.board_area = area;
    }

    /// Advances the animation clock.
    pub fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    /// Fetches stats for every variant in the background.
    #[instrument(skip(self))]
    pub fn refresh_menu_stats(&self) {
        for variant in self.variants.iter().copied() {
            let oracle = Arc::clone(&self.oracle);
            let stats = self.stats.clone();
            let timeout = self.settings.request_timeout;
            tokio::spawn(async move {
                let result = tokio::time::timeout(timeout, oracle.stats(variant))
                    .await
                    .unwrap_or_else(|_| Err(OracleError::transport("Stats request timed out")));
                match result {
                    Ok(payload) => stats.show(variant, payload),
                    Err(e) => debug!(%variant, error = %e, "Menu stats unavailable"),
                }
            });
        }
    }

    /// Opens a game of `variant` and starts it.
    #[instrument(skip(self))]
    pub fn open_game(&mut self, variant: Variant) {
        let preferences: Box<dyn PreferencesStore> =
            match TomlPreferences::load(&self.preferences_path) {
                Ok(prefs) => Box::new(prefs),
                Err(e) => {
                    warn!(error = %e, "Preferences unreadable, using defaults");
                    Box::new(MemoryPreferences::default())
                }
            };
        let collaborators = Collaborators {
            preferences,
            sound: Box::new(TerminalBell),
            stats: Box::new(self.stats.clone()),
            promotion: Box::new(self.prompt.clone()),
            navigator: Box::new(self.menu_flag.clone()),
        };
        let mut controller = SessionController::new(
            Arc::clone(&self.oracle),
            self.settings,
            variant,
            self.side,
            self.ai_mode,
            collaborators,
        );
        controller.start_new_game();
        controller.refresh_stats();
        info!(%variant, "Opened game");

        self.controller = Some(controller);
        self.cursor = Coord::new(0, 0);
        self.screen = Screen::Game;
    }

    fn close_game(&mut self) {
        if let Some(controller) = self.controller.take() {
            self.ai_mode = *controller.snapshot().ai_mode();
        }
        self.prompt.take();
        self.board_area = None;
        self.screen = Screen::Menu;
        self.refresh_menu_stats();
    }

    /// Applies whatever the session has received and follows navigation.
    pub fn settle(&mut self) {
        if let Some(controller) = self.controller.as_mut() {
            for event in controller.try_settle() {
                debug!(?event, "Session event");
            }
        }
        if self.menu_flag.take() {
            self.close_game();
        }
    }

    /// Handles a key press.
    pub fn on_key(&mut self, key: KeyCode) {
        match self.screen {
            Screen::Menu => self.on_menu_key(key),
            Screen::Game => self.on_game_key(key),
        }
    }

    fn on_menu_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Up => self.menu_index = self.menu_index.saturating_sub(1),
            KeyCode::Down => {
                self.menu_index = (self.menu_index + 1).min(self.variants.len().saturating_sub(1))
            }
            KeyCode::Enter => {
                if let Some(variant) = self.variants.get(self.menu_index).copied() {
                    self.open_game(variant);
                }
            }
            KeyCode::Char('s') => self.side = self.side.toggle(),
            KeyCode::Char('m') => self.ai_mode = self.ai_mode.next(),
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            _ => {}
        }
    }

    fn promotion_open(&self) -> bool {
        self.controller
            .as_ref()
            .is_some_and(|c| *c.snapshot().phase() == Phase::AwaitingPromotionChoice)
    }

    #[instrument(skip(self))]
    fn on_game_key(&mut self, key: KeyCode) {
        let Some(variant) = self.controller.as_ref().map(|c| *c.snapshot().variant()) else {
            return;
        };
        let Some(action) = game_action(key, variant, self.promotion_open()) else {
            return;
        };
        self.perform(variant, action);
    }

    fn perform(&mut self, variant: Variant, action: GameAction) {
        match action {
            GameAction::Promote(piece) => match self.prompt.take() {
                Some(reply) => reply.choose(piece),
                None => self.with_controller(|c| c.choose_promotion(piece)),
            },
            GameAction::CancelPromotion => match self.prompt.take() {
                Some(reply) => reply.cancel(),
                None => self.with_controller(|c| c.cancel_promotion()),
            },
            GameAction::Quit => self.quit = true,
            GameAction::Cursor(key) => {
                let (rows, cols) = variant.dimensions();
                self.cursor = move_cursor(self.cursor, key, rows, cols);
            }
            GameAction::Activate => {
                let event = match variant.input_mode() {
                    InputMode::Drop => UiEvent::ColumnClicked(self.cursor.col),
                    _ => UiEvent::CellClicked(self.cursor),
                };
                self.with_controller(|c| c.handle(event));
            }
            GameAction::Cell(cell) => {
                self.cursor = cell;
                self.with_controller(|c| c.handle(UiEvent::CellClicked(cell)));
            }
            GameAction::Column(col) => {
                self.cursor = Coord::new(self.cursor.row, col);
                self.with_controller(|c| c.handle(UiEvent::ColumnClicked(col)));
            }
            GameAction::NewGame => self.with_controller(|c| {
                c.start_new_game();
                Ok(())
            }),
            GameAction::NextAiMode => self.with_controller(|c| {
                let next = c.snapshot().ai_mode().next();
                c.change_ai_mode(next);
                Ok(())
            }),
            GameAction::RetryAiMove => self.with_controller(|c| c.retry_ai_move()),
            GameAction::ToggleSound => self.with_controller(|c| {
                c.toggle_preference(Preference::Sound);
                Ok(())
            }),
            GameAction::ToggleAnimations => self.with_controller(|c| {
                c.toggle_preference(Preference::Animations);
                Ok(())
            }),
            GameAction::Menu => self.with_controller(|c| {
                c.return_to_menu();
                Ok(())
            }),
        }
    }

    fn with_controller(
        &mut self,
        f: impl FnOnce(&mut SessionController) -> Result<(), PreconditionViolation>,
    ) {
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        if let Err(violation) = f(controller) {
            debug!(%violation, "Key ignored");
        }
    }

    /// Handles a mouse event over the board.
    pub fn on_mouse(&mut self, event: MouseEvent) {
        if self.screen != Screen::Game || event.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let (Some(area), Some(variant)) = (
            self.board_area,
            self.controller.as_ref().map(|c| *c.snapshot().variant()),
        ) else {
            return;
        };
        let Some(cell) = cell_at(area, variant, event.column, event.row) else {
            return;
        };
        let action = match variant.input_mode() {
            InputMode::Drop => GameAction::Column(cell.col),
            _ => GameAction::Cell(cell),
        };
        self.perform(variant, action);
    }
}

/// Maps a terminal position inside the board area to a cell.
pub fn cell_at(area: Rect, variant: Variant, x: u16, y: u16) -> Option<Coord> {
    if x < area.x || y < area.y {
        return None;
    }
    let (rows, cols) = variant.dimensions();
    let col = (x - area.x) / CELL_WIDTH;
    let row = (y - area.y) / CELL_HEIGHT;
    if (row as usize) < rows && (col as usize) < cols {
        Some(Coord::new(row as u8, col as u8))
    } else {
        None
    }
}
