//! Game session state machine.
//!
//! The machine performs no I/O. Inputs either return a [`PreconditionViolation`]
//! (the input is a no-op) or a [`Transition`] carrying events and, at most,
//! one oracle call to perform. The caller performs the call and feeds the
//! completion back through [`SessionMachine::settle`].

mod snapshot;
mod transition;

pub use snapshot::{InFlight, Phase, Snapshot};
pub use transition::{
    CallKind, Dispatch, OracleCall, OracleReply, SessionEvent, Ticket, Transition,
};

use tracing::{debug, info, instrument, warn};

use crate::games::{
    AiMode, Coord, InputMode, LastMove, MoveTarget, Mover, OpponentReply, PieceKind, PlayerSide,
    Variant,
};
use crate::oracle::{GameUpdate, MoveSubmission, SessionContext};
use crate::{OracleError, PreconditionViolation, SessionToken};

/// Owns one session's snapshot and mediates every change to it.
#[derive(Debug, Clone)]
pub struct SessionMachine {
    snapshot: Snapshot,
    next_id: u64,
    submitted: Option<LastMove>,
    mode_request: Option<(Ticket, AiMode)>,
    deferred_mode: Option<AiMode>,
}

impl SessionMachine {
    /// Creates an idle machine for a variant.
    #[instrument]
    pub fn new(variant: Variant, side: PlayerSide, ai_mode: AiMode) -> Self {
        Self {
            snapshot: Snapshot::new(variant, side, ai_mode),
            next_id: 0,
            submitted: None,
            mode_request: None,
            deferred_mode: None,
        }
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Returns the current phase.
    pub fn phase(&self) -> Phase {
        *self.snapshot.phase()
    }

    fn context(&self) -> Result<SessionContext, PreconditionViolation> {
        let token = self
            .snapshot
            .token()
            .clone()
            .ok_or(PreconditionViolation::NoSession)?;
        Ok(SessionContext::new(
            token,
            *self.snapshot.variant(),
            *self.snapshot.side(),
            *self.snapshot.ai_mode(),
        ))
    }

    fn ticket(&mut self, token: SessionToken) -> Ticket {
        self.next_id += 1;
        Ticket::new(token, self.next_id)
    }

    /// Issues a gameplay call and marks it pending.
    fn issue(
        &mut self,
        kind: CallKind,
        call: OracleCall,
    ) -> Result<Dispatch, PreconditionViolation> {
        let context = self.context()?;
        let ticket = self.ticket(context.token().clone());
        self.snapshot.set_pending(Some(InFlight {
            ticket: ticket.clone(),
            kind,
        }));
        debug!(id = ticket.id(), %kind, "Issuing oracle call");
        Ok(Dispatch {
            ticket,
            call,
            context,
        })
    }

    fn ensure_not_pending(&self) -> Result<(), PreconditionViolation> {
        if self.snapshot.is_pending() {
            return Err(PreconditionViolation::RequestPending);
        }
        Ok(())
    }

    /// Starts a new game under `token`.
    ///
    /// Always accepted. The previous session's snapshot is discarded and any
    /// call still in flight for it will be ignored when it settles.
    #[instrument(skip(self), fields(session = %token, from = %self.phase()))]
    pub fn start_new_game(&mut self, token: SessionToken) -> Transition {
        if let Some(mode) = self.deferred_mode.take() {
            self.snapshot.set_ai_mode(mode);
        }
        self.snapshot.reset(token);
        self.submitted = None;
        self.mode_request = None;
        info!("Starting new game");
        match self.issue(CallKind::NewGame, OracleCall::NewGame) {
            Ok(dispatch) => Transition::default().with_dispatch(dispatch),
            Err(violation) => {
                // reset always installs a token
                warn!(%violation, "Could not issue newGame");
                Transition::default()
            }
        }
    }

    /// Selects the piece at `origin`.
    ///
    /// Selecting the current origin again deselects it.
    #[instrument(skip(self), fields(phase = %self.phase()))]
    pub fn select_origin(&mut self, origin: Coord) -> Result<Transition, PreconditionViolation> {
        self.ensure_not_pending()?;
        match self.phase() {
            Phase::PlayerTurnSelected if *self.snapshot.selection() == Some(origin) => {
                Ok(self.deselect())
            }
            Phase::PlayerTurnNoSelection | Phase::PlayerTurnSelected => self.select(origin),
            _ => Err(PreconditionViolation::NotInteractive),
        }
    }

    fn select(&mut self, origin: Coord) -> Result<Transition, PreconditionViolation> {
        if self.snapshot.variant().input_mode() != InputMode::SelectThenMove {
            return Err(PreconditionViolation::WrongInputMode);
        }
        let board = self
            .snapshot
            .board()
            .as_ref()
            .ok_or(PreconditionViolation::NoSession)?;
        if !board.contains(origin) {
            return Err(PreconditionViolation::OutOfBounds);
        }
        let occupant = board.get(origin).ok_or(PreconditionViolation::EmptyCell)?;
        if occupant.mark != self.snapshot.player_mark() {
            return Err(PreconditionViolation::NotOwnPiece);
        }

        self.snapshot.set_notice(None);
        self.snapshot.select(origin);
        self.snapshot.set_phase(Phase::PlayerTurnSelected);
        info!(%origin, "Selected origin");
        let dispatch = self.issue(CallKind::ValidMoves, OracleCall::ValidMoves(origin))?;
        Ok(Transition::event(SessionEvent::Selected(origin)).with_dispatch(dispatch))
    }

    fn deselect(&mut self) -> Transition {
        self.snapshot.set_notice(None);
        self.snapshot.clear_selection();
        self.snapshot.set_phase(Phase::PlayerTurnNoSelection);
        debug!("Selection cleared");
        Transition::event(SessionEvent::SelectionCleared)
    }

    /// Acts on a destination click while an origin is selected.
    ///
    /// A valid destination submits the move, or asks for a promotion piece
    /// first. Otherwise another owned piece is reselected, and anything
    /// else clears the selection.
    #[instrument(skip(self), fields(phase = %self.phase()))]
    pub fn select_destination(
        &mut self,
        destination: Coord,
    ) -> Result<Transition, PreconditionViolation> {
        self.ensure_not_pending()?;
        if self.phase() != Phase::PlayerTurnSelected {
            return Err(PreconditionViolation::NotInteractive);
        }
        let origin = self
            .snapshot
            .selection()
            .ok_or(PreconditionViolation::NotInteractive)?;

        if let Some(meta) = self.snapshot.valid_moves().get(&destination) {
            if *meta.promotion() {
                self.snapshot.set_notice(None);
                self.snapshot.set_promotion_target(Some(destination));
                self.snapshot.set_phase(Phase::AwaitingPromotionChoice);
                info!(%origin, %destination, "Promotion choice required");
                return Ok(Transition::event(SessionEvent::PromotionRequested {
                    origin,
                    destination,
                }));
            }
            return self.submit(Some(origin), MoveTarget::Cell(destination), None);
        }

        let reselect = destination != origin
            && self
                .snapshot
                .board()
                .as_ref()
                .is_some_and(|b| b.is_owned_by(destination, self.snapshot.player_mark()));
        if reselect {
            return self.select(destination);
        }
        Ok(self.deselect())
    }

    /// Places a mark or drops a token, for variants without selection.
    #[instrument(skip(self), fields(phase = %self.phase()))]
    pub fn place(&mut self, target: MoveTarget) -> Result<Transition, PreconditionViolation> {
        self.ensure_not_pending()?;
        if self.phase() != Phase::PlayerTurnNoSelection {
            return Err(PreconditionViolation::NotInteractive);
        }
        let board = self
            .snapshot
            .board()
            .as_ref()
            .ok_or(PreconditionViolation::NoSession)?;
        match (self.snapshot.variant().input_mode(), target) {
            (InputMode::Place, MoveTarget::Cell(cell)) => {
                if !board.contains(cell) {
                    return Err(PreconditionViolation::OutOfBounds);
                }
                if board.get(cell).is_some() {
                    return Err(PreconditionViolation::Occupied);
                }
            }
            (InputMode::Drop, MoveTarget::Column(col)) => {
                if col as usize >= board.cols() {
                    return Err(PreconditionViolation::OutOfBounds);
                }
            }
            _ => return Err(PreconditionViolation::WrongInputMode),
        }
        self.submit(None, target, None)
    }

    /// Completes a pending promotion with the chosen piece.
    #[instrument(skip(self), fields(phase = %self.phase()))]
    pub fn choose_promotion(
        &mut self,
        piece: PieceKind,
    ) -> Result<Transition, PreconditionViolation> {
        self.ensure_not_pending()?;
        if self.phase() != Phase::AwaitingPromotionChoice {
            return Err(PreconditionViolation::NoPromotionPending);
        }
        if !PieceKind::PROMOTIONS.contains(&piece) {
            return Err(PreconditionViolation::InvalidPromotion);
        }
        let origin = *self.snapshot.selection();
        let destination = self
            .snapshot
            .promotion_target()
            .ok_or(PreconditionViolation::NoPromotionPending)?;
        self.submit(origin, MoveTarget::Cell(destination), Some(piece))
    }

    /// Dismisses the promotion prompt, keeping the selection.
    #[instrument(skip(self), fields(phase = %self.phase()))]
    pub fn cancel_promotion(&mut self) -> Result<Transition, PreconditionViolation> {
        if self.phase() != Phase::AwaitingPromotionChoice {
            return Err(PreconditionViolation::NoPromotionPending);
        }
        self.snapshot.set_promotion_target(None);
        self.snapshot.set_phase(Phase::PlayerTurnSelected);
        debug!("Promotion cancelled");
        Ok(Transition::event(SessionEvent::PromotionCancelled))
    }

    /// Asks the oracle for the opponent's move again after a failed attempt.
    #[instrument(skip(self), fields(phase = %self.phase()))]
    pub fn request_ai_move(&mut self) -> Result<Transition, PreconditionViolation> {
        self.ensure_not_pending()?;
        if self.phase() != Phase::OpponentTurn {
            return Err(PreconditionViolation::NotInteractive);
        }
        if self.snapshot.variant().opponent_reply() != OpponentReply::Explicit {
            return Err(PreconditionViolation::WrongInputMode);
        }
        if *self.snapshot.ai_move_held() {
            return Err(PreconditionViolation::RequestPending);
        }
        self.snapshot.set_notice(None);
        let dispatch = self.issue(CallKind::AiMove, OracleCall::AiMove)?;
        Ok(Transition::default().with_dispatch(dispatch))
    }

    /// Changes the AI algorithm.
    ///
    /// Not gated by a pending gameplay call. Without a session the mode is
    /// only stored and used by the next `newGame`. While `newGame` is in
    /// flight the server has no session yet, so the change is held and sent
    /// once it settles.
    #[instrument(skip(self), fields(mode = mode.0))]
    pub fn change_ai_mode(&mut self, mode: AiMode) -> Transition {
        if self.phase() == Phase::AwaitingNewGame {
            self.deferred_mode = Some(mode);
            info!(name = mode.name(), "AI mode change waits for the new game");
            return Transition::default();
        }
        match self.mode_dispatch(mode) {
            Ok(dispatch) => Transition::default().with_dispatch(dispatch),
            Err(_) => {
                self.snapshot.set_ai_mode(mode);
                info!(name = mode.name(), "AI mode set for the next game");
                Transition::event(SessionEvent::AiModeChanged(mode))
            }
        }
    }

    fn mode_dispatch(&mut self, mode: AiMode) -> Result<Dispatch, PreconditionViolation> {
        let context = self.context()?;
        let ticket = self.ticket(context.token().clone());
        self.mode_request = Some((ticket.clone(), mode));
        Ok(Dispatch {
            ticket,
            call: OracleCall::ChangeAiMode(mode),
            context,
        })
    }

    fn submit(
        &mut self,
        origin: Option<Coord>,
        target: MoveTarget,
        promotion: Option<PieceKind>,
    ) -> Result<Transition, PreconditionViolation> {
        let submission = MoveSubmission {
            origin,
            target,
            promotion,
        };
        self.snapshot.set_notice(None);
        self.snapshot.clear_selection();
        self.snapshot.set_phase(Phase::AwaitingMoveResult);
        self.submitted = Some(LastMove {
            by: Mover::Player,
            from: origin,
            to: target,
            captured: false,
        });
        info!(?submission, "Submitting move");
        let dispatch = self.issue(CallKind::MakeMove, OracleCall::MakeMove(submission))?;
        Ok(Transition::default().with_dispatch(dispatch))
    }

    /// Applies the completion of a previously dispatched call.
    ///
    /// Completions whose ticket is not the one awaited are discarded.
    #[instrument(
        skip(self, result),
        fields(id = ticket.id(), phase = %self.phase(), ok = result.is_ok())
    )]
    pub fn settle(
        &mut self,
        ticket: Ticket,
        result: Result<OracleReply, OracleError>,
    ) -> Transition {
        if let Some((_, mode)) = self.mode_request.take_if(|(awaited, _)| *awaited == ticket) {
            return self.settle_ai_mode(mode, result);
        }

        let awaited = self
            .snapshot
            .pending()
            .as_ref()
            .is_some_and(|p| p.ticket == ticket);
        if !awaited || self.snapshot.token().as_ref() != Some(ticket.token()) {
            debug!(session = %ticket.token(), "Discarding stale completion");
            return Transition::event(SessionEvent::StaleDiscarded);
        }
        let Some(in_flight) = self.snapshot.take_pending() else {
            return Transition::event(SessionEvent::StaleDiscarded);
        };

        match (in_flight.kind, result) {
            (CallKind::ValidMoves, Ok(OracleReply::ValidMoves(moves))) => {
                self.snapshot.set_notice(None);
                debug!(count = moves.len(), "Valid moves received");
                self.snapshot.set_valid_moves(moves);
                Transition::default()
            }
            (kind, Ok(OracleReply::Update(update))) if kind != CallKind::ValidMoves => {
                self.apply_update(kind, update)
            }
            (kind, Ok(other)) => self.fail(
                kind,
                OracleError::transport(format!("Unexpected reply to {}: {:?}", kind, other)),
            ),
            (kind, Err(error)) => self.fail(kind, error),
        }
    }

    fn settle_ai_mode(
        &mut self,
        requested: AiMode,
        result: Result<OracleReply, OracleError>,
    ) -> Transition {
        let mut transition = match result {
            Ok(OracleReply::AiMode(mode)) => {
                self.snapshot.set_ai_mode(mode);
                self.snapshot
                    .set_notice(Some(format!("AI switched to {}", mode.name())));
                info!(name = mode.name(), "AI mode changed");
                Transition::event(SessionEvent::AiModeChanged(mode))
            }
            Ok(other) => self.fail_ai_mode(
                requested,
                OracleError::transport(format!("Unexpected reply to changeAiMode: {:?}", other)),
            ),
            Err(error) => self.fail_ai_mode(requested, error),
        };
        if *self.snapshot.ai_move_held() && self.phase() == Phase::OpponentTurn {
            self.snapshot.hold_ai_move(false);
            match self.issue(CallKind::AiMove, OracleCall::AiMove) {
                Ok(dispatch) => transition.dispatch = Some(dispatch),
                Err(violation) => warn!(%violation, "Could not request AI move"),
            }
        }
        transition
    }

    fn fail_ai_mode(&mut self, requested: AiMode, error: OracleError) -> Transition {
        warn!(mode = requested.0, %error, "AI mode change failed");
        self.snapshot
            .set_notice(Some(format!("Could not change AI: {}", error.message)));
        Transition::event(SessionEvent::Failed(error))
    }

    fn apply_update(&mut self, kind: CallKind, update: GameUpdate) -> Transition {
        let mut transition = Transition::default();
        let GameUpdate {
            board,
            outcome,
            captured,
            last_move,
        } = update;

        self.snapshot.set_notice(None);
        self.snapshot.clear_selection();
        self.snapshot.set_board(board, outcome);
        let deferred = match kind {
            CallKind::NewGame => self.deferred_mode.take(),
            _ => None,
        };

        match kind {
            CallKind::NewGame => {
                info!(player_turn = outcome.player_turn, "New game started");
                transition.events.push(SessionEvent::SessionStarted);
            }
            CallKind::MakeMove => {
                if let Some(mut entry) = self.submitted.take() {
                    entry.captured = captured;
                    self.snapshot.push_history(entry);
                }
                transition.events.push(SessionEvent::MoveApplied {
                    by: Mover::Player,
                    captured,
                });
                if let Some(reply) = last_move.filter(|m| m.by == Mover::Opponent) {
                    self.snapshot.push_history(reply);
                    transition.events.push(SessionEvent::MoveApplied {
                        by: Mover::Opponent,
                        captured: reply.captured,
                    });
                }
            }
            CallKind::AiMove => {
                if let Some(reply) = last_move {
                    self.snapshot.push_history(LastMove {
                        by: Mover::Opponent,
                        captured,
                        ..reply
                    });
                }
                transition.events.push(SessionEvent::MoveApplied {
                    by: Mover::Opponent,
                    captured,
                });
            }
            CallKind::ValidMoves => {}
        }

        if outcome.game_over {
            self.snapshot.set_phase(Phase::GameOver);
            info!(winner = %outcome.winner, "Game over");
            transition.events.push(SessionEvent::GameOver(outcome.winner));
        } else if outcome.player_turn {
            self.snapshot.set_phase(Phase::PlayerTurnNoSelection);
        } else {
            self.snapshot.set_phase(Phase::OpponentTurn);
            match self.snapshot.variant().opponent_reply() {
                OpponentReply::Explicit if deferred.is_some() => {
                    debug!("AI move waits for the mode change");
                    self.snapshot.hold_ai_move(true);
                }
                OpponentReply::Explicit => match self.issue(CallKind::AiMove, OracleCall::AiMove) {
                    Ok(dispatch) => transition.dispatch = Some(dispatch),
                    Err(violation) => warn!(%violation, "Could not request AI move"),
                },
                OpponentReply::Bundled => {
                    warn!("Opponent to move but the variant bundles replies");
                    transition.events.push(SessionEvent::OpponentStalled);
                }
            }
        }
        if let Some(mode) = deferred {
            match self.mode_dispatch(mode) {
                Ok(dispatch) => transition.dispatch = Some(dispatch),
                Err(violation) => warn!(%violation, "Could not send the AI mode change"),
            }
        }
        transition
    }

    fn fail(&mut self, kind: CallKind, error: OracleError) -> Transition {
        warn!(%kind, %error, "Oracle call failed");
        self.submitted = None;
        self.snapshot.clear_selection();
        let phase = match kind {
            CallKind::NewGame => {
                self.snapshot.clear_token();
                if let Some(mode) = self.deferred_mode.take() {
                    self.snapshot.set_ai_mode(mode);
                }
                Phase::Idle
            }
            CallKind::ValidMoves | CallKind::MakeMove => Phase::PlayerTurnNoSelection,
            CallKind::AiMove => Phase::OpponentTurn,
        };
        self.snapshot.set_phase(phase);
        self.snapshot.set_notice(Some(error.message.clone()));
        Transition::event(SessionEvent::Failed(error))
    }
}
