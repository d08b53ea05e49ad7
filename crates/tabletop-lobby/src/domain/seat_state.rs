//! Per-seat replicated record.

use serde::{Deserialize, Serialize};
use tabletop_core::error::SessionError;
use tabletop_core::ids::ObjectId;
use tabletop_core::ownership::Owned;

use super::cues::{CueEvent, CueStamp, SeatCue};

/// Replicated state of one seat: the dice and the seat's pending cue.
///
/// Who sits in the seat is recorded by the lobby roster, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatState {
    /// Replicated object backing this seat.
    pub object_id: ObjectId,
    /// Writer-side revision.
    pub(crate) revision: u64,
    /// Last rolled value; 0 means no result.
    pub(crate) dice_result: u32,
    /// Dice are in the air (first press happened, result pending).
    pub(crate) rolling: bool,
    /// One-shot cue for this seat.
    pub(crate) cue: Option<CueEvent<SeatCue>>,
}

impl SeatState {
    /// Creates a cleared seat record.
    #[must_use]
    pub fn new(object_id: ObjectId) -> Self {
        Self {
            object_id,
            revision: 0,
            dice_result: 0,
            rolling: false,
            cue: None,
        }
    }

    /// Last rolled value, 0 when none.
    #[must_use]
    pub fn dice_result(&self) -> u32 {
        self.dice_result
    }

    /// Whether a roll is in progress.
    #[must_use]
    pub fn is_rolling(&self) -> bool {
        self.rolling
    }

    /// Writer-side revision.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Pending cue of the local copy.
    #[must_use]
    pub fn pending_cue(&self) -> Option<&CueEvent<SeatCue>> {
        self.cue.as_ref()
    }

    pub(crate) fn cue_slot(&mut self) -> &mut Option<CueEvent<SeatCue>> {
        &mut self.cue
    }

    /// Starts a write: checks the capability and drops any cue left over
    /// from an earlier snapshot, so a commit only carries a cue it emitted.
    fn begin_write(&mut self, owned: &Owned) -> Result<(), SessionError> {
        owned.ensure_for(self.object_id)?;
        self.cue = None;
        self.revision += 1;
        Ok(())
    }

    /// First dice press: the dice start rolling.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::OwnershipDenied` if `owned` is for another object.
    pub fn begin_roll(&mut self, owned: &Owned, stamp: CueStamp) -> Result<(), SessionError> {
        self.begin_write(owned)?;
        self.rolling = true;
        self.cue = Some(CueEvent {
            code: SeatCue::DiceRoll,
            stamp,
        });
        Ok(())
    }

    /// Second dice press: the rolled value lands.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::OwnershipDenied` if `owned` is for another object.
    pub fn record_roll(
        &mut self,
        owned: &Owned,
        value: u32,
        stamp: CueStamp,
    ) -> Result<(), SessionError> {
        self.begin_write(owned)?;
        self.rolling = true;
        self.dice_result = value;
        self.cue = Some(CueEvent {
            code: SeatCue::DiceResult,
            stamp,
        });
        Ok(())
    }

    /// Hands the turn on: clears the dice and cues `Next`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::OwnershipDenied` if `owned` is for another object.
    pub fn finish_turn(&mut self, owned: &Owned, stamp: CueStamp) -> Result<(), SessionError> {
        self.begin_write(owned)?;
        self.rolling = false;
        self.dice_result = 0;
        self.cue = Some(CueEvent {
            code: SeatCue::Next,
            stamp,
        });
        Ok(())
    }

    /// Whether the dice are at rest with no value showing.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        !self.rolling && self.dice_result == 0
    }

    /// Returns the dice to rest between games. Carries no cue.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::OwnershipDenied` if `owned` is for another object.
    pub fn clear_dice(&mut self, owned: &Owned) -> Result<(), SessionError> {
        self.begin_write(owned)?;
        self.rolling = false;
        self.dice_result = 0;
        Ok(())
    }

    /// Emits an event cue (`Event4`, `Event9`, `Event12`) without touching
    /// the dice.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::OwnershipDenied` if `owned` is for another object.
    pub fn emit(&mut self, owned: &Owned, code: SeatCue, stamp: CueStamp) -> Result<(), SessionError> {
        self.begin_write(owned)?;
        self.cue = Some(CueEvent { code, stamp });
        Ok(())
    }

    /// Replaces the local copy with a received snapshot of the same seat.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Snapshot` if the snapshot is for another seat.
    pub fn apply_snapshot(&mut self, incoming: Self) -> Result<(), SessionError> {
        if incoming.object_id != self.object_id {
            return Err(SessionError::Snapshot(format!(
                "seat snapshot for {} applied to {}",
                incoming.object_id, self.object_id
            )));
        }
        *self = incoming;
        Ok(())
    }
}
