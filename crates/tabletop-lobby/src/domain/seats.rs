//! Fixed-size seat roster with compaction on removal.

use serde::{Deserialize, Serialize};
use tabletop_core::ids::ParticipantId;

/// Index of a seat in the roster.
pub type SeatIndex = usize;

/// The occupants of a fixed number of seats.
///
/// The arena never grows or shrinks after construction. Removing an
/// occupant shifts every later seat left by one, so occupied seats stay
/// packed at the front and the first empty seat is always the next one a
/// joiner gets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatArena {
    occupants: Vec<Option<ParticipantId>>,
}

impl SeatArena {
    /// Creates `seat_count` empty seats.
    #[must_use]
    pub fn new(seat_count: usize) -> Self {
        Self {
            occupants: vec![None; seat_count],
        }
    }

    /// Number of seats (occupied or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.occupants.len()
    }

    /// Whether the arena has no seats at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }

    /// Occupant of `seat`; `None` when empty or out of range.
    #[must_use]
    pub fn occupant(&self, seat: SeatIndex) -> Option<ParticipantId> {
        self.occupants.get(seat).copied().flatten()
    }

    /// Whether `seat` is in range and occupied.
    #[must_use]
    pub fn is_occupied(&self, seat: SeatIndex) -> bool {
        self.occupant(seat).is_some()
    }

    /// Number of occupied seats.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.occupants.iter().filter(|seat| seat.is_some()).count()
    }

    /// Seat held by `participant`, if any.
    #[must_use]
    pub fn position_of(&self, participant: ParticipantId) -> Option<SeatIndex> {
        self.occupants
            .iter()
            .position(|seat| *seat == Some(participant))
    }

    /// Lowest empty seat.
    #[must_use]
    pub fn first_empty(&self) -> Option<SeatIndex> {
        self.occupants.iter().position(Option::is_none)
    }

    /// Lowest occupied seat.
    #[must_use]
    pub fn lowest_occupied(&self) -> Option<SeatIndex> {
        self.occupants.iter().position(Option::is_some)
    }

    /// Seats `participant` in the lowest empty seat.
    ///
    /// Returns `None` without changing anything if the participant is
    /// already seated or every seat is taken.
    pub fn occupy_first_empty(&mut self, participant: ParticipantId) -> Option<SeatIndex> {
        if self.position_of(participant).is_some() {
            return None;
        }
        let seat = self.first_empty()?;
        self.occupants[seat] = Some(participant);
        Some(seat)
    }

    /// Removes `participant` and shifts later seats left by one, leaving
    /// the vacated slot at the end. Returns the seat it held.
    pub fn remove_compacting(&mut self, participant: ParticipantId) -> Option<SeatIndex> {
        let seat = self.position_of(participant)?;
        self.occupants.remove(seat);
        self.occupants.push(None);
        Some(seat)
    }

    /// Empties every seat.
    pub fn clear(&mut self) {
        self.occupants.fill(None);
    }

    /// Occupants in seat order.
    #[must_use]
    pub fn as_slice(&self) -> &[Option<ParticipantId>] {
        &self.occupants
    }

    /// Builds an arena with arbitrary holes, which compaction never produces.
    #[cfg(test)]
    pub(crate) fn from_occupants(occupants: Vec<Option<ParticipantId>>) -> Self {
        Self { occupants }
    }
}
