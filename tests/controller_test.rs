//! Tests for the async session controller against a scripted oracle.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vsai_client::{
    AiMode, Board, Collaborators, ControllerSettings, Coord, GameStats, GameUpdate, LastMove, Mark,
    MemoryPreferences, MenuFlag, MoveMeta, MoveSubmission, MoveTarget, Mover, NoStats, Occupant,
    Oracle, OracleError, OracleErrorKind, Outcome, Phase, PieceKind, PlayerSide, Preference,
    SessionContext, SessionController, SessionEvent, SharedPrompt, SharedStats, Silent, SoundCue,
    SoundPlayer, UiEvent, ValidMoves, Variant, Winner,
};

#[derive(Default)]
struct ScriptedOracle {
    new_games: AtomicUsize,
    ai_moves: AtomicUsize,
    slow_first_game: AtomicBool,
    hang: AtomicBool,
    finish_on_move: AtomicBool,
    capture_with_reply: AtomicBool,
    submissions: Mutex<Vec<MoveSubmission>>,
}

impl ScriptedOracle {
    fn board(variant: Variant, pieces: &[(u8, u8, Occupant)]) -> Board {
        let (rows, cols) = variant.dimensions();
        let mut grid = vec![vec![None; cols]; rows];
        for (row, col, occupant) in pieces {
            grid[*row as usize][*col as usize] = Some(*occupant);
        }
        Board::from_rows(grid).unwrap()
    }

    fn update(board: Board, player_turn: bool, winner: Option<Winner>) -> GameUpdate {
        GameUpdate {
            board,
            outcome: Outcome {
                player_turn,
                game_over: winner.is_some(),
                winner: winner.unwrap_or_default(),
            },
            captured: false,
            last_move: None,
        }
    }

    async fn maybe_hang(&self) {
        if self.hang.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
    }
}

#[async_trait::async_trait]
impl Oracle for ScriptedOracle {
    async fn new_game(&self, session: &SessionContext) -> Result<GameUpdate, OracleError> {
        self.maybe_hang().await;
        let variant = *session.variant();
        let first = self.new_games.fetch_add(1, Ordering::SeqCst) == 0;
        if first && self.slow_first_game.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(150)).await;
            let stale = Self::board(variant, &[(0, 0, Occupant::mark(Mark::X))]);
            return Ok(Self::update(stale, true, None));
        }
        let pieces = match variant {
            Variant::Chess => vec![(1, 0, Occupant::piece(Mark::White, PieceKind::Pawn))],
            Variant::Checkers => vec![(5, 4, Occupant::piece(Mark::White, PieceKind::Man))],
            _ => Vec::new(),
        };
        Ok(Self::update(Self::board(variant, &pieces), true, None))
    }

    async fn valid_moves(
        &self,
        session: &SessionContext,
        origin: Coord,
    ) -> Result<ValidMoves, OracleError> {
        let promotion = *session.variant() == Variant::Chess;
        let mut moves = ValidMoves::new();
        if origin.row > 0 {
            moves.insert(
                Coord::new(origin.row - 1, origin.col),
                MoveMeta::new(promotion, false),
            );
        }
        Ok(moves)
    }

    async fn make_move(
        &self,
        session: &SessionContext,
        submission: MoveSubmission,
    ) -> Result<GameUpdate, OracleError> {
        self.submissions.lock().unwrap().push(submission);
        let variant = *session.variant();
        let player = session.player_mark();
        let pieces = match submission.target {
            MoveTarget::Cell(cell) => vec![(cell.row, cell.col, Occupant::mark(player))],
            MoveTarget::Column(col) => vec![(5, col, Occupant::mark(player))],
        };
        if self.capture_with_reply.load(Ordering::SeqCst) {
            // The player's jump, with the AI's plain reply bundled in.
            return Ok(GameUpdate {
                captured: true,
                last_move: Some(LastMove {
                    by: Mover::Opponent,
                    from: Some(Coord::new(2, 1)),
                    to: MoveTarget::Cell(Coord::new(3, 2)),
                    captured: false,
                }),
                ..Self::update(Self::board(variant, &pieces), true, None)
            });
        }
        let winner = self.finish_on_move.load(Ordering::SeqCst).then_some(Winner::Player);
        Ok(Self::update(Self::board(variant, &pieces), false, winner))
    }

    async fn ai_move(&self, session: &SessionContext) -> Result<GameUpdate, OracleError> {
        self.ai_moves.fetch_add(1, Ordering::SeqCst);
        let board = Self::board(
            *session.variant(),
            &[(0, 0, Occupant::mark(Mark::O)), (2, 2, Occupant::mark(Mark::X))],
        );
        Ok(GameUpdate {
            last_move: Some(LastMove {
                by: Mover::Opponent,
                from: None,
                to: MoveTarget::Cell(Coord::new(2, 2)),
                captured: false,
            }),
            ..Self::update(board, true, None)
        })
    }

    async fn change_ai_mode(
        &self,
        _session: &SessionContext,
        mode: AiMode,
    ) -> Result<AiMode, OracleError> {
        Ok(mode)
    }

    async fn stats(&self, _variant: Variant) -> Result<GameStats, OracleError> {
        Ok(GameStats {
            total_games: 7,
            player_wins: 3,
            ai_wins: 3,
            draws: 1,
            win_rate: 42.9,
        })
    }
}

#[derive(Clone, Default)]
struct RecordedCues(Arc<Mutex<Vec<SoundCue>>>);

impl SoundPlayer for RecordedCues {
    fn play(&self, cue: SoundCue) {
        self.0.lock().unwrap().push(cue);
    }
}

fn settings() -> ControllerSettings {
    ControllerSettings::new(Duration::from_millis(500), Duration::from_millis(20))
}

fn controller(oracle: Arc<ScriptedOracle>, variant: Variant) -> SessionController {
    SessionController::new(
        oracle,
        settings(),
        variant,
        PlayerSide::White,
        AiMode::default(),
        Collaborators::headless(),
    )
}

#[tokio::test]
async fn test_superseded_new_game_is_discarded() {
    let oracle = Arc::new(ScriptedOracle::default());
    oracle.slow_first_game.store(true, Ordering::SeqCst);
    let mut controller = controller(oracle.clone(), Variant::TicTacToe);

    controller.start_new_game();
    // Let the first call reach the oracle before superseding it.
    tokio::time::sleep(Duration::from_millis(20)).await;
    controller.start_new_game();

    assert_eq!(controller.settle_next().await, vec![SessionEvent::SessionStarted]);
    assert_eq!(controller.settle_next().await, vec![SessionEvent::StaleDiscarded]);

    let board = controller.snapshot().board().clone().unwrap();
    assert!(board.iter().all(|(_, cell)| cell.is_none()));
    assert_eq!(*controller.snapshot().phase(), Phase::PlayerTurnNoSelection);
}

#[tokio::test]
async fn test_explicit_variant_requests_ai_move_after_player_move() {
    let oracle = Arc::new(ScriptedOracle::default());
    let mut controller = controller(oracle.clone(), Variant::TicTacToe);

    controller.start_new_game();
    controller.settle_next().await;
    controller.handle(UiEvent::CellClicked(Coord::new(0, 0))).unwrap();

    let events = controller.settle_next().await;
    assert!(events.contains(&SessionEvent::MoveApplied {
        by: Mover::Player,
        captured: false
    }));
    assert_eq!(*controller.snapshot().phase(), Phase::OpponentTurn);
    assert!(controller.snapshot().is_pending());
    assert!(controller.view().busy);

    controller.settle_next().await;
    assert_eq!(oracle.ai_moves.load(Ordering::SeqCst), 1);
    assert_eq!(*controller.snapshot().phase(), Phase::PlayerTurnNoSelection);
    assert_eq!(controller.snapshot().history().len(), 2);
}

#[tokio::test]
async fn test_slow_oracle_fails_as_transport() {
    let oracle = Arc::new(ScriptedOracle::default());
    oracle.hang.store(true, Ordering::SeqCst);
    let mut controller = SessionController::new(
        oracle,
        ControllerSettings::new(Duration::from_millis(50), Duration::ZERO),
        Variant::ConnectFour,
        PlayerSide::White,
        AiMode::default(),
        Collaborators::headless(),
    );

    controller.start_new_game();
    let events = controller.settle_next().await;
    match &events[..] {
        [SessionEvent::Failed(err)] => assert_eq!(err.kind, OracleErrorKind::Transport),
        other => panic!("unexpected events: {:?}", other),
    }
    assert_eq!(*controller.snapshot().phase(), Phase::Idle);
    assert!(controller.view().notice.is_some());
}

#[tokio::test]
async fn test_promotion_prompt_answer_submits_once() {
    let oracle = Arc::new(ScriptedOracle::default());
    let prompt = SharedPrompt::default();
    let collaborators = Collaborators {
        promotion: Box::new(prompt.clone()),
        ..Collaborators::headless()
    };
    let mut controller = SessionController::new(
        oracle.clone(),
        settings(),
        Variant::Chess,
        PlayerSide::White,
        AiMode::default(),
        collaborators,
    );

    controller.start_new_game();
    controller.settle_next().await;
    controller.handle(UiEvent::CellClicked(Coord::new(1, 0))).unwrap();
    controller.settle_next().await;
    controller.handle(UiEvent::CellClicked(Coord::new(0, 0))).unwrap();

    assert_eq!(
        *controller.snapshot().phase(),
        Phase::AwaitingPromotionChoice
    );
    assert!(prompt.is_open());
    prompt.take().unwrap().choose(PieceKind::Queen);
    assert!(!prompt.is_open());

    // The prompt answer, then the move result.
    controller.settle_next().await;
    controller.settle_next().await;

    let submissions = oracle.submissions.lock().unwrap().clone();
    assert_eq!(
        submissions,
        vec![MoveSubmission {
            origin: Some(Coord::new(1, 0)),
            target: MoveTarget::Cell(Coord::new(0, 0)),
            promotion: Some(PieceKind::Queen),
        }]
    );
}

#[tokio::test]
async fn test_game_over_plays_cue_and_refreshes_stats() {
    let oracle = Arc::new(ScriptedOracle::default());
    oracle.finish_on_move.store(true, Ordering::SeqCst);
    let stats = SharedStats::default();
    let cues = RecordedCues::default();
    let collaborators = Collaborators {
        preferences: Box::new(MemoryPreferences::default()),
        sound: Box::new(cues.clone()),
        stats: Box::new(stats.clone()),
        promotion: Box::new(SharedPrompt::default()),
        navigator: Box::new(MenuFlag::default()),
    };
    let mut controller = SessionController::new(
        oracle,
        settings(),
        Variant::ConnectFour,
        PlayerSide::White,
        AiMode::default(),
        collaborators,
    );

    controller.start_new_game();
    controller.settle_next().await;
    controller.place(MoveTarget::Column(2)).unwrap();
    let events = controller.settle_next().await;
    assert!(events.contains(&SessionEvent::GameOver(Winner::Player)));
    assert_eq!(controller.view().banner.as_deref(), Some("You win!"));

    assert!(controller.settle_next().await.is_empty());
    assert_eq!(stats.get(Variant::ConnectFour).unwrap().total_games, 7);
    assert_eq!(
        *cues.0.lock().unwrap(),
        vec![SoundCue::Move, SoundCue::Win]
    );
}

#[tokio::test]
async fn test_sound_preference_mutes_cues() {
    let cues = RecordedCues::default();
    let collaborators = Collaborators {
        sound: Box::new(cues.clone()),
        stats: Box::new(NoStats),
        ..Collaborators::headless()
    };
    let mut controller = SessionController::new(
        Arc::new(ScriptedOracle::default()),
        settings(),
        Variant::TicTacToe,
        PlayerSide::White,
        AiMode::default(),
        collaborators,
    );

    assert!(controller.preference(Preference::Sound));
    assert!(!controller.toggle_preference(Preference::Sound));
    controller.start_new_game();
    controller.settle_next().await;
    controller.place(MoveTarget::Cell(Coord::new(1, 1))).unwrap();
    controller.settle_next().await;
    assert!(cues.0.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_ai_mode_change_while_move_pending() {
    let oracle = Arc::new(ScriptedOracle::default());
    let mut controller = SessionController::new(
        oracle,
        settings(),
        Variant::ConnectFour,
        PlayerSide::White,
        AiMode::default(),
        Collaborators {
            sound: Box::new(Silent),
            ..Collaborators::headless()
        },
    );

    controller.start_new_game();
    controller.settle_next().await;
    controller.place(MoveTarget::Column(0)).unwrap();
    controller.change_ai_mode(AiMode(4));

    let mut events = controller.settle_next().await;
    events.extend(controller.settle_next().await);
    assert!(events.contains(&SessionEvent::AiModeChanged(AiMode(4))));
    assert_eq!(*controller.snapshot().ai_mode(), AiMode(4));
    assert!(!controller.snapshot().is_pending());
}

#[tokio::test]
async fn test_return_to_menu_raises_flag() {
    let flag = MenuFlag::default();
    let controller = SessionController::new(
        Arc::new(ScriptedOracle::default()),
        settings(),
        Variant::Checkers,
        PlayerSide::Black,
        AiMode::default(),
        Collaborators {
            navigator: Box::new(flag.clone()),
            ..Collaborators::headless()
        },
    );
    assert!(!flag.take());
    controller.return_to_menu();
    assert!(flag.take());
    assert!(!flag.take());
}

#[tokio::test]
async fn test_bundled_reply_counts_player_capture_once() {
    let oracle = Arc::new(ScriptedOracle::default());
    oracle.capture_with_reply.store(true, Ordering::SeqCst);
    let cues = RecordedCues::default();
    let mut controller = SessionController::new(
        oracle,
        settings(),
        Variant::Checkers,
        PlayerSide::White,
        AiMode::default(),
        Collaborators {
            sound: Box::new(cues.clone()),
            stats: Box::new(NoStats),
            ..Collaborators::headless()
        },
    );

    controller.start_new_game();
    controller.settle_next().await;
    controller.handle(UiEvent::CellClicked(Coord::new(5, 4))).unwrap();
    controller.settle_next().await;
    controller.handle(UiEvent::CellClicked(Coord::new(4, 4))).unwrap();
    let events = controller.settle_next().await;

    assert_eq!(
        events,
        vec![
            SessionEvent::MoveApplied {
                by: Mover::Player,
                captured: true
            },
            SessionEvent::MoveApplied {
                by: Mover::Opponent,
                captured: false
            },
        ]
    );
    assert_eq!(
        *cues.0.lock().unwrap(),
        vec![SoundCue::Select, SoundCue::Capture, SoundCue::Move]
    );
    assert_eq!(
        controller.view().history,
        vec!["E3 → E4 ×".to_string(), "B6 → C5".to_string()]
    );
}

#[tokio::test]
async fn test_ai_mode_change_during_new_game_is_sent_after_it() {
    let oracle = Arc::new(ScriptedOracle::default());
    let mut controller = controller(oracle, Variant::TicTacToe);

    controller.start_new_game();
    controller.change_ai_mode(AiMode(3));
    assert_eq!(*controller.snapshot().ai_mode(), AiMode::default());

    assert_eq!(controller.settle_next().await, vec![SessionEvent::SessionStarted]);
    assert_eq!(
        controller.settle_next().await,
        vec![SessionEvent::AiModeChanged(AiMode(3))]
    );
    assert_eq!(*controller.snapshot().ai_mode(), AiMode(3));
    assert_eq!(*controller.snapshot().phase(), Phase::PlayerTurnNoSelection);
}
