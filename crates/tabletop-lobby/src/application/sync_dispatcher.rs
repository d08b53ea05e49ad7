//! Outbound commits and inbound snapshot routing.
//!
//! Commits are explicit: a mutator changes the local copy, then the
//! dispatcher encodes that copy and hands it to the substrate. Inbound
//! snapshots are decoded by the role their object plays in the session
//! layout. Cue latches live here so that every record's one-shot cue is
//! consumed at most once per emission.

use serde::Serialize;
use tabletop_core::error::SessionError;
use tabletop_core::ownership::Owned;
use tabletop_core::replication::{ReplicationSubstrate, Snapshot};
use tracing::debug;

use crate::domain::cues::{CueEvent, CueLatch, CueStamp, LobbyCue, SeatCue};
use crate::domain::layout::{ObjectRole, SessionLayout};
use crate::domain::lobby::LobbyRecord;
use crate::domain::seat_state::SeatState;
use crate::domain::seats::SeatIndex;
use crate::domain::turn::TurnCursor;

/// A decoded inbound snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// The lobby record.
    Lobby(LobbyRecord),
    /// The turn cursor.
    Turn(TurnCursor),
    /// A seat record.
    Seat {
        /// Seat the record belongs to.
        index: SeatIndex,
        /// The record.
        record: SeatState,
    },
}

/// Commits local records and routes remote ones.
#[derive(Debug)]
pub struct SyncDispatcher {
    layout: SessionLayout,
    lobby_latch: CueLatch,
    seat_latches: Vec<CueLatch>,
}

impl SyncDispatcher {
    /// Creates a dispatcher for one session.
    #[must_use]
    pub fn new(layout: SessionLayout) -> Self {
        let seat_latches = vec![CueLatch::default(); layout.seat_count()];
        Self {
            layout,
            lobby_latch: CueLatch::default(),
            seat_latches,
        }
    }

    /// The session's object ids.
    #[must_use]
    pub fn layout(&self) -> &SessionLayout {
        &self.layout
    }

    /// Encodes `record` and commits it as the object `owned` covers.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Snapshot` if the record cannot be encoded.
    pub fn commit<T: Serialize>(
        &self,
        substrate: &dyn ReplicationSubstrate,
        owned: &Owned,
        revision: u64,
        record: &T,
    ) -> Result<(), SessionError> {
        let snapshot = Snapshot::encode(owned.object(), revision, owned.participant(), record)?;
        debug!(
            object_id = %snapshot.object_id,
            revision,
            participant = %owned.participant(),
            "committing snapshot"
        );
        substrate.commit(snapshot);
        Ok(())
    }

    /// Decodes an inbound snapshot according to its object's role.
    ///
    /// Returns `Ok(None)` for objects outside this session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Snapshot` if the payload does not decode.
    pub fn route(&self, snapshot: &Snapshot) -> Result<Option<Inbound>, SessionError> {
        let Some(role) = self.layout.locate(snapshot.object_id) else {
            debug!(object_id = %snapshot.object_id, "snapshot for another session ignored");
            return Ok(None);
        };
        debug!(
            object_id = %snapshot.object_id,
            revision = snapshot.revision,
            sent_by = %snapshot.sent_by,
            ?role,
            "routing snapshot"
        );
        let inbound = match role {
            ObjectRole::Lobby => Inbound::Lobby(snapshot.decode()?),
            ObjectRole::Turn => Inbound::Turn(snapshot.decode()?),
            ObjectRole::Seat(index) => Inbound::Seat {
                index,
                record: snapshot.decode()?,
            },
        };
        Ok(Some(inbound))
    }

    /// Records a cue the local participant emitted on the lobby.
    pub fn mark_lobby(&mut self, stamp: CueStamp) {
        self.lobby_latch.mark(stamp);
    }

    /// Records a cue the local participant emitted on a seat.
    pub fn mark_seat(&mut self, index: SeatIndex, stamp: CueStamp) {
        if let Some(latch) = self.seat_latches.get_mut(index) {
            latch.mark(stamp);
        }
    }

    /// Consumes the lobby's pending cue, at most once per emission.
    pub fn consume_lobby_cue(
        &mut self,
        slot: &mut Option<CueEvent<LobbyCue>>,
        may_clear: bool,
    ) -> Option<LobbyCue> {
        self.lobby_latch.consume(slot, may_clear)
    }

    /// Consumes a seat's pending cue, at most once per emission.
    pub fn consume_seat_cue(
        &mut self,
        index: SeatIndex,
        slot: &mut Option<CueEvent<SeatCue>>,
        may_clear: bool,
    ) -> Option<SeatCue> {
        self.seat_latches
            .get_mut(index)
            .and_then(|latch| latch.consume(slot, may_clear))
    }
}
