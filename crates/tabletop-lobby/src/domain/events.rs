//! Notifications raised towards presentation collaborators.

use serde::Serialize;
use tabletop_core::ids::ParticipantId;
use tabletop_core::notification::{Notification, NotificationMetadata};

use super::cues::CueCode;
use super::seats::SeatIndex;
use super::turn::NoticeClass;

/// Notification type identifier for membership changes.
pub const MEMBERSHIP_CHANGED_TYPE: &str = "lobby.membership_changed";

/// Notification type identifier for game start/stop.
pub const GAME_STATE_CHANGED_TYPE: &str = "lobby.game_state_changed";

/// Notification type identifier for turn changes.
pub const TURN_CHANGED_TYPE: &str = "lobby.turn_changed";

/// Notification type identifier for one-shot cues.
pub const CUE_TYPE: &str = "lobby.cue";

/// Notification type identifier for the stop-confirmation dialog.
pub const DIALOG_REQUESTED_TYPE: &str = "lobby.dialog_requested";

/// Where a cue came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CueSource {
    /// The lobby record.
    Lobby,
    /// A seat record.
    Seat(SeatIndex),
}

/// Notification payload variants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SessionNotificationKind {
    /// The roster changed.
    MembershipChanged {
        /// Occupants in seat order.
        seats: Vec<Option<ParticipantId>>,
    },
    /// A game started or ended.
    GameStateChanged {
        /// New game state.
        started: bool,
    },
    /// Active seat, direction or per-seat notices changed.
    TurnChanged {
        /// Seat whose turn it is.
        active_index: SeatIndex,
        /// Rotation direction.
        reverse: bool,
        /// Notice class of every seat for the local viewer.
        notices: Vec<NoticeClass>,
    },
    /// A one-shot cue to play.
    Cue {
        /// Record that carried the cue.
        source: CueSource,
        /// What to play.
        code: CueCode,
    },
    /// Ask the local participant to confirm stopping the game.
    DialogRequested,
}

/// Notification envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionNotification {
    /// Notification metadata.
    pub metadata: NotificationMetadata,
    /// Notification payload.
    pub kind: SessionNotificationKind,
}

impl SessionNotificationKind {
    /// Type identifier of this payload.
    #[must_use]
    pub fn notification_type(&self) -> &'static str {
        match self {
            Self::MembershipChanged { .. } => MEMBERSHIP_CHANGED_TYPE,
            Self::GameStateChanged { .. } => GAME_STATE_CHANGED_TYPE,
            Self::TurnChanged { .. } => TURN_CHANGED_TYPE,
            Self::Cue { .. } => CUE_TYPE,
            Self::DialogRequested => DIALOG_REQUESTED_TYPE,
        }
    }
}

impl Notification for SessionNotification {
    fn notification_type(&self) -> &'static str {
        self.kind.notification_type()
    }

    fn metadata(&self) -> &NotificationMetadata {
        &self.metadata
    }
}
