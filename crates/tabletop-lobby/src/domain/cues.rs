//! One-shot cues carried inside replicated records.
//!
//! A cue rides along with a snapshot but must fire once per emission on
//! every participant, even when the same snapshot is delivered twice or a
//! later snapshot still carries it. Each emission gets a unique stamp, and a
//! per-object [`CueLatch`] fires only on stamps it has not seen last.

use serde::{Deserialize, Serialize};
use tabletop_core::ids::ParticipantId;
use uuid::Uuid;

/// Cues raised by the lobby (join/leave/start/reset/stop sounds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LobbyCue {
    Join,
    Leave,
    Start,
    Reset,
    Stop,
}

/// Cues raised by a seat (dice and event buttons).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeatCue {
    DiceRoll,
    DiceResult,
    Event4,
    Event9,
    Event12,
    Next,
}

/// Either kind of cue, as handed to presentation collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CueCode {
    /// A lobby cue.
    Lobby(LobbyCue),
    /// A seat cue.
    Seat(SeatCue),
}

/// Unique identity of one cue emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueStamp {
    /// Participant that emitted the cue.
    pub origin: ParticipantId,
    /// Time-ordered unique id of the emission.
    pub emission_id: Uuid,
}

impl CueStamp {
    /// Stamps a new emission by `origin`.
    #[must_use]
    pub fn issue(origin: ParticipantId) -> Self {
        Self {
            origin,
            emission_id: Uuid::now_v7(),
        }
    }
}

/// A pending cue inside a replicated record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueEvent<C> {
    /// What to play.
    pub code: C,
    /// Which emission this is.
    pub stamp: CueStamp,
}

/// Local-only record of the last cue consumed for one object.
#[derive(Debug, Clone, Default)]
pub struct CueLatch {
    last: Option<CueStamp>,
}

impl CueLatch {
    /// Marks a locally emitted cue as already consumed, so an echo of our
    /// own snapshot does not fire it again.
    pub fn mark(&mut self, stamp: CueStamp) {
        self.last = Some(stamp);
    }

    /// Consumes the pending cue in `slot`.
    ///
    /// Returns the code the first time a given stamp is seen. When
    /// `may_clear` is set (the local participant owns the record) the local
    /// copy's slot is emptied; otherwise the slot is left alone and the
    /// latch alone keeps the consumption idempotent. Clearing is never
    /// committed.
    pub fn consume<C: Copy>(&mut self, slot: &mut Option<CueEvent<C>>, may_clear: bool) -> Option<C> {
        let event = (*slot)?;
        let fresh = self.last != Some(event.stamp);
        if fresh {
            self.last = Some(event.stamp);
        }
        if may_clear {
            *slot = None;
        }
        fresh.then_some(event.code)
    }
}
