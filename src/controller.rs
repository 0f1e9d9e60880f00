//! Async driver that owns a session machine and performs its oracle calls.

use std::sync::Arc;
use std::time::Duration;

use derive_new::new;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::collaborators::{Collaborators, Preference, PromotionReply, PromptCommand, SoundCue};
use crate::dispatch::{InputDispatcher, UiEvent};
use crate::games::{AiMode, MoveTarget, PieceKind, PlayerSide, Variant, Winner};
use crate::machine::{
    Dispatch, OracleCall, OracleReply, SessionEvent, SessionMachine, Snapshot, Ticket, Transition,
};
use crate::oracle::{GameStats, Oracle, SessionContext};
use crate::render::{BoardView, render};
use crate::{OracleError, PreconditionViolation, SessionToken};

/// Timing knobs for the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct ControllerSettings {
    /// Oracle calls taking longer than this fail as transport errors.
    pub request_timeout: Duration,
    /// Pause before each `aiMove`.
    pub ai_move_delay: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            ai_move_delay: Duration::from_millis(500),
        }
    }
}

enum Completion {
    Call {
        ticket: Ticket,
        result: Result<OracleReply, OracleError>,
    },
    Stats {
        variant: Variant,
        result: Result<GameStats, OracleError>,
    },
}

enum Arrival {
    Completion(Completion),
    Prompt(PromptCommand),
}

/// Runs one game session against an oracle.
///
/// Every oracle call runs on its own task. Completions come back over a
/// channel and are applied one at a time, so the machine is only ever
/// touched from the task that owns the controller.
pub struct SessionController {
    machine: SessionMachine,
    oracle: Arc<dyn Oracle>,
    settings: ControllerSettings,
    collaborators: Collaborators,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    prompt_tx: mpsc::UnboundedSender<PromptCommand>,
    prompt_rx: mpsc::UnboundedReceiver<PromptCommand>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("machine", &self.machine)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Creates a controller with an idle session.
    #[instrument(skip(oracle, collaborators))]
    pub fn new(
        oracle: Arc<dyn Oracle>,
        settings: ControllerSettings,
        variant: Variant,
        side: PlayerSide,
        ai_mode: AiMode,
        collaborators: Collaborators,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (prompt_tx, prompt_rx) = mpsc::unbounded_channel();
        Self {
            machine: SessionMachine::new(variant, side, ai_mode),
            oracle,
            settings,
            collaborators,
            completions_tx,
            completions_rx,
            prompt_tx,
            prompt_rx,
        }
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> &Snapshot {
        self.machine.snapshot()
    }

    /// Renders the current snapshot.
    pub fn view(&self) -> BoardView {
        render(self.machine.snapshot())
    }

    fn variant(&self) -> Variant {
        *self.machine.snapshot().variant()
    }

    /// Reads a preference for this session's variant.
    pub fn preference(&self, preference: Preference) -> bool {
        self.collaborators.preferences.get(self.variant(), preference)
    }

    /// Flips a preference for this session's variant.
    #[instrument(skip(self))]
    pub fn toggle_preference(&mut self, preference: Preference) -> bool {
        let value = !self.preference(preference);
        if let Err(e) = self
            .collaborators
            .preferences
            .set(self.variant(), preference, value)
        {
            warn!(error = %e, "Could not save preference");
        }
        value
    }

    /// Starts a new game under a fresh session token.
    #[instrument(skip(self))]
    pub fn start_new_game(&mut self) {
        let transition = self.machine.start_new_game(SessionToken::generate());
        self.apply(transition);
    }

    /// Feeds a board event through the input dispatcher.
    #[instrument(skip(self))]
    pub fn handle(&mut self, event: UiEvent) -> Result<(), PreconditionViolation> {
        let transition = InputDispatcher::dispatch(&mut self.machine, event)?;
        self.apply(transition);
        Ok(())
    }

    /// Places a mark or drops a token directly.
    pub fn place(&mut self, target: MoveTarget) -> Result<(), PreconditionViolation> {
        let transition = self.machine.place(target)?;
        self.apply(transition);
        Ok(())
    }

    /// Answers the open promotion prompt.
    #[instrument(skip(self))]
    pub fn choose_promotion(&mut self, piece: PieceKind) -> Result<(), PreconditionViolation> {
        let transition = self.machine.choose_promotion(piece)?;
        self.apply(transition);
        Ok(())
    }

    /// Dismisses the open promotion prompt.
    pub fn cancel_promotion(&mut self) -> Result<(), PreconditionViolation> {
        let transition = self.machine.cancel_promotion()?;
        self.apply(transition);
        Ok(())
    }

    /// Asks for the AI's move again after a failure.
    pub fn retry_ai_move(&mut self) -> Result<(), PreconditionViolation> {
        let transition = self.machine.request_ai_move()?;
        self.apply(transition);
        Ok(())
    }

    /// Switches the AI algorithm.
    #[instrument(skip(self), fields(mode = mode.0))]
    pub fn change_ai_mode(&mut self, mode: AiMode) {
        let transition = self.machine.change_ai_mode(mode);
        self.apply(transition);
    }

    /// Leaves for the variant menu.
    pub fn return_to_menu(&self) {
        info!("Returning to menu");
        self.collaborators.navigator.return_to_menu();
    }

    /// Fetches statistics in the background for the stats display.
    #[instrument(skip(self))]
    pub fn refresh_stats(&self) {
        let variant = self.variant();
        let oracle = Arc::clone(&self.oracle);
        let tx = self.completions_tx.clone();
        let timeout = self.settings.request_timeout;
        tokio::spawn(async move {
            let result = tokio::time::timeout(timeout, oracle.stats(variant))
                .await
                .unwrap_or_else(|_| Err(OracleError::transport("Stats request timed out")));
            if tx.send(Completion::Stats { variant, result }).is_err() {
                debug!("Controller dropped before stats arrived");
            }
        });
    }

    /// Waits for the next completion or prompt answer and applies it.
    pub async fn settle_next(&mut self) -> Vec<SessionEvent> {
        let arrival = tokio::select! {
            Some(completion) = self.completions_rx.recv() => Arrival::Completion(completion),
            Some(command) = self.prompt_rx.recv() => Arrival::Prompt(command),
            else => return Vec::new(),
        };
        match arrival {
            Arrival::Completion(completion) => self.complete(completion),
            Arrival::Prompt(command) => self.answer(command),
        }
    }

    /// Applies everything that has already arrived, without waiting.
    pub fn try_settle(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(command) = self.prompt_rx.try_recv() {
            events.extend(self.answer(command));
        }
        while let Ok(completion) = self.completions_rx.try_recv() {
            events.extend(self.complete(completion));
        }
        events
    }

    fn answer(&mut self, command: PromptCommand) -> Vec<SessionEvent> {
        let result = match command {
            PromptCommand::Promote(piece) => self.machine.choose_promotion(piece),
            PromptCommand::Cancel => self.machine.cancel_promotion(),
        };
        match result {
            Ok(transition) => self.apply(transition),
            Err(violation) => {
                debug!(%violation, ?command, "Ignoring prompt answer");
                Vec::new()
            }
        }
    }

    fn complete(&mut self, completion: Completion) -> Vec<SessionEvent> {
        match completion {
            Completion::Call { ticket, result } => {
                let transition = self.machine.settle(ticket, result);
                self.apply(transition)
            }
            Completion::Stats { variant, result } => {
                match result {
                    Ok(stats) => {
                        debug!(%variant, total = stats.total_games, "Stats received");
                        self.collaborators.stats.show(variant, stats);
                    }
                    Err(e) => warn!(%variant, error = %e, "Stats request failed"),
                }
                Vec::new()
            }
        }
    }

    fn apply(&mut self, transition: Transition) -> Vec<SessionEvent> {
        let Transition { events, dispatch } = transition;
        for event in &events {
            self.react(event);
        }
        if let Some(dispatch) = dispatch {
            self.spawn(dispatch);
        }
        events
    }

    fn cue(&self, cue: SoundCue) {
        if self.preference(Preference::Sound) {
            self.collaborators.sound.play(cue);
        }
    }

    fn react(&self, event: &SessionEvent) {
        match event {
            SessionEvent::Selected(_) => self.cue(SoundCue::Select),
            SessionEvent::MoveApplied { captured: true, .. } => self.cue(SoundCue::Capture),
            SessionEvent::MoveApplied { .. } => self.cue(SoundCue::Move),
            SessionEvent::GameOver(winner) => {
                match winner {
                    Winner::Player => self.cue(SoundCue::Win),
                    Winner::Opponent => self.cue(SoundCue::Lose),
                    Winner::Draw | Winner::None => {}
                }
                self.refresh_stats();
            }
            SessionEvent::Failed(_) => self.cue(SoundCue::Error),
            SessionEvent::PromotionRequested {
                origin,
                destination,
            } => {
                let reply = PromotionReply::new(self.prompt_tx.clone());
                self.collaborators
                    .promotion
                    .request(*origin, *destination, reply);
            }
            SessionEvent::SessionStarted
            | SessionEvent::SelectionCleared
            | SessionEvent::PromotionCancelled
            | SessionEvent::OpponentStalled
            | SessionEvent::AiModeChanged(_)
            | SessionEvent::StaleDiscarded => {}
        }
    }

    #[instrument(skip(self, dispatch), fields(id = dispatch.ticket.id(), call = ?dispatch.call))]
    fn spawn(&self, dispatch: Dispatch) {
        let oracle = Arc::clone(&self.oracle);
        let tx = self.completions_tx.clone();
        let timeout = self.settings.request_timeout;
        let delay = match dispatch.call {
            OracleCall::AiMove => self.settings.ai_move_delay,
            _ => Duration::ZERO,
        };
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let Dispatch {
                ticket,
                call,
                context,
            } = dispatch;
            let result = tokio::time::timeout(timeout, perform(oracle.as_ref(), &context, call))
                .await
                .unwrap_or_else(|_| {
                    Err(OracleError::transport(format!(
                        "No response within {} ms",
                        timeout.as_millis()
                    )))
                });
            if tx.send(Completion::Call { ticket, result }).is_err() {
                debug!("Controller dropped before the call settled");
            }
        });
    }
}

async fn perform(
    oracle: &dyn Oracle,
    context: &SessionContext,
    call: OracleCall,
) -> Result<OracleReply, OracleError> {
    match call {
        OracleCall::NewGame => oracle.new_game(context).await.map(OracleReply::Update),
        OracleCall::ValidMoves(origin) => oracle
            .valid_moves(context, origin)
            .await
            .map(OracleReply::ValidMoves),
        OracleCall::MakeMove(submission) => oracle
            .make_move(context, submission)
            .await
            .map(OracleReply::Update),
        OracleCall::AiMove => oracle.ai_move(context).await.map(OracleReply::Update),
        OracleCall::ChangeAiMode(mode) => oracle
            .change_ai_mode(context, mode)
            .await
            .map(OracleReply::AiMode),
    }
}
