//! Session error types.

use thiserror::Error;

use crate::ids::{ObjectId, ParticipantId};

/// Why an ownership acquisition did not produce a writer capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// The substrate could not tell us who the local participant is.
    NoLocalIdentity,
    /// A transfer was requested but the substrate did not grant it.
    TransferRefused,
    /// A capability for a different object was presented.
    WrongObject,
}

/// Coarse classification used by callers deciding how to surface an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Retry on the next user-initiated action.
    Transient,
    /// The action is not valid in the current state.
    Precondition,
    /// A participant reference no longer resolves.
    StaleReference,
    /// Encoding, decoding or configuration failures.
    Infrastructure,
}

/// Top-level session error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Write permission on a replicated object could not be obtained.
    #[error("ownership denied on object {object}: {reason:?}")]
    OwnershipDenied {
        /// The object we tried to write.
        object: ObjectId,
        /// Why the acquisition failed.
        reason: DenialReason,
    },

    /// The participant already occupies a seat here or in a sibling session.
    #[error("participant {0} has already joined a session")]
    AlreadyJoined(ParticipantId),

    /// Membership cannot change while a game is running.
    #[error("a game is in progress")]
    GameInProgress,

    /// The action needs a running game.
    #[error("no game is in progress")]
    GameNotStarted,

    /// The local participant holds no seat.
    #[error("participant is not joined")]
    NotJoined,

    /// Not enough occupied seats to start.
    #[error("{occupied} occupied seats, at least {minimum} required")]
    BelowMinimumOccupancy {
        /// Seats currently occupied.
        occupied: usize,
        /// Configured minimum.
        minimum: usize,
    },

    /// Every seat is occupied.
    #[error("all {0} seats are occupied")]
    LobbyFull(usize),

    /// The seat is not the active seat, or not the caller's seat.
    #[error("seat {0} is not the local participant's active seat")]
    NotYourTurn(usize),

    /// A seat index outside the arena.
    #[error("seat {index} out of range (seat count {seat_count})")]
    SeatOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of seats.
        seat_count: usize,
    },

    /// A participant id that no longer resolves (already disconnected).
    #[error("participant {0} is no longer present")]
    StaleReference(ParticipantId),

    /// A snapshot could not be encoded or decoded.
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// Invalid session configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl SessionError {
    /// Returns the retry/surfacing class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OwnershipDenied { .. } => ErrorKind::Transient,
            Self::AlreadyJoined(_)
            | Self::GameInProgress
            | Self::GameNotStarted
            | Self::NotJoined
            | Self::BelowMinimumOccupancy { .. }
            | Self::LobbyFull(_)
            | Self::NotYourTurn(_)
            | Self::SeatOutOfRange { .. } => ErrorKind::Precondition,
            Self::StaleReference(_) => ErrorKind::StaleReference,
            Self::Snapshot(_) | Self::Config(_) => ErrorKind::Infrastructure,
        }
    }
}
