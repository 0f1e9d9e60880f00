//! Translation of raw board events into state machine inputs.

use tracing::{debug, instrument};

use crate::PreconditionViolation;
use crate::games::{Coord, InputMode, MoveTarget};
use crate::machine::{Phase, SessionMachine, Snapshot, Transition};

/// A coordinate-bearing event from the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    /// A board cell was clicked.
    CellClicked(Coord),
    /// A column header was clicked.
    ColumnClicked(u8),
}

/// The single machine input an event maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineInput {
    /// `select_origin`.
    SelectOrigin(Coord),
    /// `select_destination`.
    SelectDestination(Coord),
    /// `place`.
    Place(MoveTarget),
}

/// Routes UI events to the state machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputDispatcher;

impl InputDispatcher {
    /// Decides which input an event means in the current snapshot.
    ///
    /// Events arriving while a call is pending, or outside the player's
    /// turn, are filtered here.
    #[instrument(skip(snapshot), fields(phase = %snapshot.phase()))]
    pub fn route(
        snapshot: &Snapshot,
        event: UiEvent,
    ) -> Result<MachineInput, PreconditionViolation> {
        if snapshot.is_pending() {
            return Err(PreconditionViolation::RequestPending);
        }
        let phase = *snapshot.phase();
        if !phase.is_interactive() {
            return Err(PreconditionViolation::NotInteractive);
        }

        match (snapshot.variant().input_mode(), event) {
            (InputMode::Place, UiEvent::CellClicked(cell)) => {
                Ok(MachineInput::Place(MoveTarget::Cell(cell)))
            }
            (InputMode::Drop, UiEvent::CellClicked(Coord { col, .. }))
            | (InputMode::Drop, UiEvent::ColumnClicked(col)) => {
                Ok(MachineInput::Place(MoveTarget::Column(col)))
            }
            (InputMode::SelectThenMove, UiEvent::CellClicked(cell)) => match phase {
                Phase::PlayerTurnSelected if *snapshot.selection() != Some(cell) => {
                    Ok(MachineInput::SelectDestination(cell))
                }
                _ => Ok(MachineInput::SelectOrigin(cell)),
            },
            (_, UiEvent::ColumnClicked(_)) => Err(PreconditionViolation::WrongInputMode),
        }
    }

    /// Routes an event and applies it to the machine.
    pub fn dispatch(
        machine: &mut SessionMachine,
        event: UiEvent,
    ) -> Result<Transition, PreconditionViolation> {
        let input = Self::route(machine.snapshot(), event).inspect_err(|violation| {
            debug!(?event, %violation, "Ignoring board event");
        })?;
        let result = match input {
            MachineInput::SelectOrigin(cell) => machine.select_origin(cell),
            MachineInput::SelectDestination(cell) => machine.select_destination(cell),
            MachineInput::Place(target) => machine.place(target),
        };
        result.inspect_err(|violation| debug!(?input, %violation, "Input was a no-op"))
    }
}
