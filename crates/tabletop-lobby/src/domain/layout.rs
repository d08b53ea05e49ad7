//! Which replicated objects make up one session.

use serde::{Deserialize, Serialize};
use tabletop_core::ids::ObjectId;

use super::seats::SeatIndex;

/// Role of a replicated object within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectRole {
    /// The lobby membership record.
    Lobby,
    /// The turn cursor.
    Turn,
    /// One seat record.
    Seat(SeatIndex),
}

/// Object ids of a session's lobby, turn cursor and seats.
///
/// Every participant must construct the same layout (for example from a
/// scene description) so that snapshots route to the same records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLayout {
    /// Lobby membership object.
    pub lobby: ObjectId,
    /// Turn cursor object.
    pub turn: ObjectId,
    /// One object per seat, in seat order.
    pub seats: Vec<ObjectId>,
}

impl SessionLayout {
    /// Allocates fresh ids for a session with `seat_count` seats.
    #[must_use]
    pub fn new(seat_count: usize) -> Self {
        Self {
            lobby: ObjectId::new(),
            turn: ObjectId::new(),
            seats: (0..seat_count).map(|_| ObjectId::new()).collect(),
        }
    }

    /// Number of seats.
    #[must_use]
    pub fn seat_count(&self) -> usize {
        self.seats.len()
    }

    /// Finds the role of `object` in this session.
    #[must_use]
    pub fn locate(&self, object: ObjectId) -> Option<ObjectRole> {
        if object == self.lobby {
            return Some(ObjectRole::Lobby);
        }
        if object == self.turn {
            return Some(ObjectRole::Turn);
        }
        self.seats
            .iter()
            .position(|seat| *seat == object)
            .map(ObjectRole::Seat)
    }
}
