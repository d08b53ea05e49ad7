//! Lobby membership: the seat roster, the game-started flag and the lobby cue.

use serde::{Deserialize, Serialize};
use tabletop_core::error::SessionError;
use tabletop_core::ids::{ObjectId, ParticipantId};
use tabletop_core::ownership::Owned;

use super::cues::{CueEvent, CueStamp, LobbyCue};
use super::seats::{SeatArena, SeatIndex};

/// Replicated part of the lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyRecord {
    /// Writer-side revision.
    pub revision: u64,
    /// Who sits where.
    pub roster: SeatArena,
    /// Whether a game is running. This is the single source of truth for
    /// the game state; the turn cursor carries no copy of it.
    pub game_started: bool,
    /// One-shot lobby cue.
    pub cue: Option<CueEvent<LobbyCue>>,
}

/// Result of a forced removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Departure {
    /// Seat the participant held before compaction.
    pub vacated: Option<SeatIndex>,
    /// The removal ended a running game.
    pub ended_game: bool,
}

impl Departure {
    /// Whether the removal changed anything.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.vacated.is_some() || self.ended_game
    }
}

/// What a received lobby snapshot changed in the local copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LobbyDelta {
    /// The roster differs from the previous local copy.
    pub roster_changed: bool,
    /// The game-started flag flipped.
    pub game_state_changed: bool,
    /// The local membership flag flipped while reconciling.
    pub local_membership_changed: bool,
}

/// The lobby of one session as seen by one participant.
#[derive(Debug, Clone)]
pub struct LobbyMembership {
    object_id: ObjectId,
    min_players: usize,
    record: LobbyRecord,
    /// Local-only: whether this participant believes it holds a seat.
    local_joined: bool,
}

impl LobbyMembership {
    /// Creates an idle lobby with `seat_count` empty seats.
    #[must_use]
    pub fn new(object_id: ObjectId, seat_count: usize, min_players: usize) -> Self {
        Self {
            object_id,
            min_players,
            record: LobbyRecord {
                revision: 0,
                roster: SeatArena::new(seat_count),
                game_started: false,
                cue: None,
            },
            local_joined: false,
        }
    }

    /// Replicated object backing the lobby.
    #[must_use]
    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    /// The replicated record, as it would be committed.
    #[must_use]
    pub fn record(&self) -> &LobbyRecord {
        &self.record
    }

    /// Mutable access to the pending cue slot, for cue consumption.
    pub(crate) fn cue_slot(&mut self) -> &mut Option<CueEvent<LobbyCue>> {
        &mut self.record.cue
    }

    /// Current roster.
    #[must_use]
    pub fn roster(&self) -> &SeatArena {
        &self.record.roster
    }

    /// Whether a game is running.
    #[must_use]
    pub fn game_started(&self) -> bool {
        self.record.game_started
    }

    /// Whether the local participant believes it holds a seat.
    #[must_use]
    pub fn local_joined(&self) -> bool {
        self.local_joined
    }

    /// Minimum occupied seats needed to start.
    #[must_use]
    pub fn min_players(&self) -> usize {
        self.min_players
    }

    fn begin_write(&mut self, owned: &Owned) -> Result<(), SessionError> {
        owned.ensure_for(self.object_id)?;
        self.record.cue = None;
        self.record.revision += 1;
        Ok(())
    }

    fn set_cue(&mut self, code: LobbyCue, stamp: CueStamp) {
        self.record.cue = Some(CueEvent { code, stamp });
    }

    /// Checks the local preconditions of `join`, without touching state.
    ///
    /// # Errors
    ///
    /// `AlreadyJoined` if the participant is seated or the local flag is
    /// set, `GameInProgress` if a game is running, `LobbyFull` if no seat is
    /// free.
    pub fn ensure_can_join(&self, participant: ParticipantId) -> Result<(), SessionError> {
        if self.local_joined || self.record.roster.position_of(participant).is_some() {
            return Err(SessionError::AlreadyJoined(participant));
        }
        if self.record.game_started {
            return Err(SessionError::GameInProgress);
        }
        if self.record.roster.first_empty().is_none() {
            return Err(SessionError::LobbyFull(self.record.roster.len()));
        }
        Ok(())
    }

    /// Seats `participant` in the lowest empty seat and cues `Join`.
    ///
    /// # Errors
    ///
    /// Any error of [`Self::ensure_can_join`], or `OwnershipDenied` for a
    /// foreign capability. State is unchanged on error.
    pub fn join(
        &mut self,
        owned: &Owned,
        participant: ParticipantId,
        stamp: CueStamp,
    ) -> Result<SeatIndex, SessionError> {
        owned.ensure_for(self.object_id)?;
        self.ensure_can_join(participant)?;
        self.begin_write(owned)?;
        let seat = self
            .record
            .roster
            .occupy_first_empty(participant)
            .ok_or(SessionError::LobbyFull(self.record.roster.len()))?;
        self.local_joined = true;
        self.set_cue(LobbyCue::Join, stamp);
        Ok(seat)
    }

    /// Checks the local preconditions of `leave`.
    ///
    /// # Errors
    ///
    /// `NotJoined` if the local flag is clear, `GameInProgress` if a game
    /// is running.
    pub fn ensure_can_leave(&self) -> Result<(), SessionError> {
        if !self.local_joined {
            return Err(SessionError::NotJoined);
        }
        if self.record.game_started {
            return Err(SessionError::GameInProgress);
        }
        Ok(())
    }

    /// Removes `participant`, compacts the roster and cues `Leave`.
    ///
    /// # Errors
    ///
    /// Any error of [`Self::ensure_can_leave`]; `NotJoined` if the roster
    /// has no seat for the participant. State is unchanged on error.
    pub fn leave(
        &mut self,
        owned: &Owned,
        participant: ParticipantId,
        stamp: CueStamp,
    ) -> Result<SeatIndex, SessionError> {
        owned.ensure_for(self.object_id)?;
        self.ensure_can_leave()?;
        if self.record.roster.position_of(participant).is_none() {
            return Err(SessionError::NotJoined);
        }
        self.begin_write(owned)?;
        let seat = self
            .record
            .roster
            .remove_compacting(participant)
            .ok_or(SessionError::NotJoined)?;
        self.local_joined = false;
        self.set_cue(LobbyCue::Leave, stamp);
        Ok(seat)
    }

    /// Forced removal of a disconnected participant, written as the owner.
    ///
    /// Ends a running game in the same write, so the roster change and the
    /// end of the game reach every participant in one snapshot.
    ///
    /// # Errors
    ///
    /// Returns `OwnershipDenied` for a foreign capability.
    pub fn remove_disconnected(
        &mut self,
        owned: &Owned,
        participant: ParticipantId,
        local: Option<ParticipantId>,
    ) -> Result<Departure, SessionError> {
        owned.ensure_for(self.object_id)?;
        let pending = self.preview_departure(participant);
        if !pending.changed() {
            return Ok(pending);
        }
        self.begin_write(owned)?;
        Ok(self.project_departure(participant, local))
    }

    /// What removing `participant` would change.
    #[must_use]
    pub fn preview_departure(&self, participant: ParticipantId) -> Departure {
        let vacated = self.record.roster.position_of(participant);
        Departure {
            vacated,
            ended_game: self.record.game_started,
        }
    }

    /// Applies a forced removal to the local copy only.
    ///
    /// Used when this participant cannot write the lobby: the result is the
    /// same deterministic compaction the owner performs, and the owner's
    /// snapshot will overwrite it.
    pub fn project_departure(
        &mut self,
        participant: ParticipantId,
        local: Option<ParticipantId>,
    ) -> Departure {
        let vacated = self.record.roster.remove_compacting(participant);
        let ended_game = self.record.game_started;
        self.record.game_started = false;
        if local == Some(participant) {
            self.local_joined = false;
        }
        Departure {
            vacated,
            ended_game,
        }
    }

    /// Checks the preconditions of `start`.
    ///
    /// # Errors
    ///
    /// `NotJoined`, `GameInProgress`, or `BelowMinimumOccupancy`.
    pub fn ensure_can_start(&self) -> Result<(), SessionError> {
        if !self.local_joined {
            return Err(SessionError::NotJoined);
        }
        if self.record.game_started {
            return Err(SessionError::GameInProgress);
        }
        let occupied = self.record.roster.occupied_count();
        if occupied < self.min_players {
            return Err(SessionError::BelowMinimumOccupancy {
                occupied,
                minimum: self.min_players,
            });
        }
        Ok(())
    }

    /// Starts the game and cues `Start`.
    ///
    /// # Errors
    ///
    /// Any error of [`Self::ensure_can_start`], or `OwnershipDenied`.
    pub fn start(&mut self, owned: &Owned, stamp: CueStamp) -> Result<(), SessionError> {
        owned.ensure_for(self.object_id)?;
        self.ensure_can_start()?;
        self.begin_write(owned)?;
        self.record.game_started = true;
        self.set_cue(LobbyCue::Start, stamp);
        Ok(())
    }

    /// Checks the preconditions shared by `reset` and `confirm_stop`.
    ///
    /// # Errors
    ///
    /// `NotJoined` or `GameNotStarted`.
    pub fn ensure_in_game(&self) -> Result<(), SessionError> {
        if !self.local_joined {
            return Err(SessionError::NotJoined);
        }
        if !self.record.game_started {
            return Err(SessionError::GameNotStarted);
        }
        Ok(())
    }

    /// Ends the running game and cues `Reset`. Seats stay occupied.
    ///
    /// # Errors
    ///
    /// Any error of [`Self::ensure_in_game`], or `OwnershipDenied`.
    pub fn reset(&mut self, owned: &Owned, stamp: CueStamp) -> Result<(), SessionError> {
        owned.ensure_for(self.object_id)?;
        self.ensure_in_game()?;
        self.begin_write(owned)?;
        self.record.game_started = false;
        self.set_cue(LobbyCue::Reset, stamp);
        Ok(())
    }

    /// Cues `Stop` (the stop-confirmation dialog was opened).
    ///
    /// # Errors
    ///
    /// Any error of [`Self::ensure_in_game`], or `OwnershipDenied`.
    pub fn confirm_stop(&mut self, owned: &Owned, stamp: CueStamp) -> Result<(), SessionError> {
        owned.ensure_for(self.object_id)?;
        self.ensure_in_game()?;
        self.begin_write(owned)?;
        self.set_cue(LobbyCue::Stop, stamp);
        Ok(())
    }

    /// Replaces the replicated part with a received snapshot and
    /// reconciles the local membership flag against the roster.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Snapshot` if the roster size does not match.
    pub fn apply_snapshot(
        &mut self,
        incoming: LobbyRecord,
        local: Option<ParticipantId>,
    ) -> Result<LobbyDelta, SessionError> {
        if incoming.roster.len() != self.record.roster.len() {
            return Err(SessionError::Snapshot(format!(
                "lobby snapshot has {} seats, expected {}",
                incoming.roster.len(),
                self.record.roster.len()
            )));
        }
        let roster_changed = incoming.roster != self.record.roster;
        let game_state_changed = incoming.game_started != self.record.game_started;
        self.record = incoming;

        let seated = local.is_some_and(|p| self.record.roster.position_of(p).is_some());
        let local_membership_changed = seated != self.local_joined;
        self.local_joined = seated;

        Ok(LobbyDelta {
            roster_changed,
            game_state_changed,
            local_membership_changed,
        })
    }
}
