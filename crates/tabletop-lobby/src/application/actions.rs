//! Local user actions and their outcomes.

use serde::{Deserialize, Serialize};
use tabletop_core::error::SessionError;

use crate::domain::seats::SeatIndex;

/// Something the local participant asked the session to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Take the lowest free seat.
    Join,
    /// Give up the local seat.
    Leave,
    /// Start a game.
    Start,
    /// End the running game.
    Reset,
    /// Open the stop-confirmation dialog.
    ConfirmStop,
    /// Press the dice button of a seat.
    RollDice {
        /// Seat pressed.
        seat: SeatIndex,
    },
    /// Hand the turn on from a seat.
    NextTurn {
        /// Seat pressed.
        seat: SeatIndex,
    },
    /// Event button 4 of a seat.
    Event4 {
        /// Seat pressed.
        seat: SeatIndex,
    },
    /// Event button 9 of a seat.
    Event9 {
        /// Seat pressed.
        seat: SeatIndex,
    },
    /// Event button 12 of a seat; also reverses the rotation.
    Event12 {
        /// Seat pressed.
        seat: SeatIndex,
    },
}

impl Action {
    /// Stable name for logging.
    #[must_use]
    pub fn action_type(&self) -> &'static str {
        match self {
            Self::Join => "lobby.join",
            Self::Leave => "lobby.leave",
            Self::Start => "lobby.start",
            Self::Reset => "lobby.reset",
            Self::ConfirmStop => "lobby.confirm_stop",
            Self::RollDice { .. } => "seat.roll_dice",
            Self::NextTurn { .. } => "seat.next_turn",
            Self::Event4 { .. } => "seat.event4",
            Self::Event9 { .. } => "seat.event9",
            Self::Event12 { .. } => "seat.event12",
        }
    }

    /// Seat the action targets, for seat actions.
    #[must_use]
    pub fn seat(&self) -> Option<SeatIndex> {
        match self {
            Self::RollDice { seat }
            | Self::NextTurn { seat }
            | Self::Event4 { seat }
            | Self::Event9 { seat }
            | Self::Event12 { seat } => Some(*seat),
            Self::Join | Self::Leave | Self::Start | Self::Reset | Self::ConfirmStop => None,
        }
    }
}

/// A refused action and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// The action as requested.
    pub action: Action,
    /// Why it was refused.
    pub error: SessionError,
}

/// Result of dispatching an action. Rejected actions changed nothing and
/// may be retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action was applied and committed.
    Accepted,
    /// The action was refused.
    Rejected(Rejection),
}

impl ActionOutcome {
    /// Whether the action was applied.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// The refusal reason, if any.
    #[must_use]
    pub fn error(&self) -> Option<&SessionError> {
        match self {
            Self::Accepted => None,
            Self::Rejected(rejection) => Some(&rejection.error),
        }
    }
}
