//! Turn rotation: the active-seat cursor, its direction, and notice
//! classification.

use serde::{Deserialize, Serialize};
use tabletop_core::error::SessionError;
use tabletop_core::ids::{ObjectId, ParticipantId};
use tabletop_core::ownership::Owned;

use super::seats::{SeatArena, SeatIndex};

/// Replicated turn cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnCursor {
    /// Writer-side revision.
    pub revision: u64,
    /// Seat whose turn it is.
    pub active_index: SeatIndex,
    /// Rotation runs towards lower indices.
    pub reverse: bool,
}

/// Per-seat turn relevance for the local viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeClass {
    /// No game, or nobody in the seat.
    None,
    /// The local participant's seat, and it is its turn.
    Current,
    /// The local participant's seat, waiting for its turn.
    Wait,
    /// Someone else's seat, and it is their turn.
    Active,
    /// Someone else's seat, not their turn.
    Inactive,
}

/// Classifies one seat for the local viewer.
///
/// Pure in `(game_started, occupant of seat, active_index, local)`.
#[must_use]
pub fn derive_notice(
    game_started: bool,
    seats: &SeatArena,
    active_index: SeatIndex,
    local: Option<ParticipantId>,
    seat: SeatIndex,
) -> NoticeClass {
    if !game_started {
        return NoticeClass::None;
    }
    let Some(occupant) = seats.occupant(seat) else {
        return NoticeClass::None;
    };
    let is_turn = seat == active_index;
    match (local == Some(occupant), is_turn) {
        (true, true) => NoticeClass::Current,
        (true, false) => NoticeClass::Wait,
        (false, true) => NoticeClass::Active,
        (false, false) => NoticeClass::Inactive,
    }
}

/// Classifies every seat.
#[must_use]
pub fn derive_notices(
    game_started: bool,
    seats: &SeatArena,
    active_index: SeatIndex,
    local: Option<ParticipantId>,
) -> Vec<NoticeClass> {
    (0..seats.len())
        .map(|seat| derive_notice(game_started, seats, active_index, local, seat))
        .collect()
}

/// Owner of the turn cursor.
#[derive(Debug, Clone)]
pub struct TurnEngine {
    object_id: ObjectId,
    cursor: TurnCursor,
}

impl TurnEngine {
    /// Creates a cursor at seat 0, rotating forward.
    #[must_use]
    pub fn new(object_id: ObjectId) -> Self {
        Self {
            object_id,
            cursor: TurnCursor {
                revision: 0,
                active_index: 0,
                reverse: false,
            },
        }
    }

    /// Replicated object backing the cursor.
    #[must_use]
    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    /// The replicated record.
    #[must_use]
    pub fn cursor(&self) -> &TurnCursor {
        &self.cursor
    }

    /// Seat whose turn it is.
    #[must_use]
    pub fn active_index(&self) -> SeatIndex {
        self.cursor.active_index
    }

    /// Whether rotation runs backwards.
    #[must_use]
    pub fn reverse(&self) -> bool {
        self.cursor.reverse
    }

    /// Whether `seat` holds the turn: it is the cursor and it is occupied.
    #[must_use]
    pub fn is_active_turn(&self, seats: &SeatArena, seat: SeatIndex) -> bool {
        seat == self.cursor.active_index && seats.is_occupied(seat)
    }

    fn begin_write(&mut self, owned: &Owned) -> Result<(), SessionError> {
        owned.ensure_for(self.object_id)?;
        self.cursor.revision += 1;
        Ok(())
    }

    /// Moves the cursor one step in the current direction, skipping empty
    /// seats, for at most `seats.len()` steps. With no occupied seat the
    /// cursor stays where it is.
    ///
    /// # Errors
    ///
    /// Returns `OwnershipDenied` for a foreign capability; nothing changes.
    pub fn advance(&mut self, owned: &Owned, seats: &SeatArena) -> Result<SeatIndex, SessionError> {
        owned.ensure_for(self.object_id)?;
        let seat_count = seats.len();
        if seat_count == 0 {
            return Ok(self.cursor.active_index);
        }
        let start = self.cursor.active_index % seat_count;
        let next = (1..=seat_count)
            .map(|step| {
                if self.cursor.reverse {
                    (start + seat_count - step) % seat_count
                } else {
                    (start + step) % seat_count
                }
            })
            .find(|candidate| seats.is_occupied(*candidate));

        if let Some(next) = next {
            self.begin_write(owned)?;
            self.cursor.active_index = next;
        }
        Ok(self.cursor.active_index)
    }

    /// Flips the direction, then runs a repair pass against `seats`.
    /// Returns the new direction.
    ///
    /// # Errors
    ///
    /// Returns `OwnershipDenied` for a foreign capability; nothing changes.
    pub fn toggle_direction(&mut self, owned: &Owned, seats: &SeatArena) -> Result<bool, SessionError> {
        self.begin_write(owned)?;
        self.cursor.reverse = !self.cursor.reverse;
        self.repair_cursor(seats);
        Ok(self.cursor.reverse)
    }

    /// Points the cursor at the lowest occupied seat (or 0) if the active
    /// seat is empty. Returns whether the cursor moved.
    ///
    /// Every participant runs this on its own copy; the result depends only
    /// on the roster, so copies agree once the roster has converged.
    pub fn repair_cursor(&mut self, seats: &SeatArena) -> bool {
        if seats.is_occupied(self.cursor.active_index) {
            return false;
        }
        let repaired = seats.lowest_occupied().unwrap_or(0);
        let moved = repaired != self.cursor.active_index;
        self.cursor.active_index = repaired;
        moved
    }

    /// A new game: forward rotation from seat 0 (or the lowest occupied seat).
    ///
    /// # Errors
    ///
    /// Returns `OwnershipDenied` for a foreign capability.
    pub fn begin_round(&mut self, owned: &Owned, seats: &SeatArena) -> Result<(), SessionError> {
        self.begin_write(owned)?;
        self.cursor.active_index = 0;
        self.cursor.reverse = false;
        self.repair_cursor(seats);
        Ok(())
    }

    /// The game ended: the cursor returns to seat 0 on the local copy.
    /// Returns whether the cursor moved.
    pub fn end_round(&mut self) -> bool {
        let moved = self.cursor.active_index != 0;
        self.cursor.active_index = 0;
        moved
    }

    /// Replaces the local cursor with a received snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Snapshot` if the index is outside the arena.
    pub fn apply_snapshot(&mut self, incoming: TurnCursor, seat_count: usize) -> Result<(), SessionError> {
        if incoming.active_index >= seat_count.max(1) {
            return Err(SessionError::Snapshot(format!(
                "turn cursor {} outside {seat_count} seats",
                incoming.active_index
            )));
        }
        self.cursor = incoming;
        Ok(())
    }
}
