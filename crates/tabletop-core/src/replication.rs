//! Replication substrate abstraction.
//!
//! The substrate delivers whole-object snapshots to every participant and
//! tracks a single writer per object. It gives no ordering across objects
//! and no cross-object transactions.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::ids::{ObjectId, ParticipantId};

/// Full state of one replicated object as sent to remote participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// The object this snapshot describes.
    pub object_id: ObjectId,
    /// Writer-side revision of the object.
    pub revision: u64,
    /// Participant that committed it.
    pub sent_by: ParticipantId,
    /// Serialized record.
    pub payload: serde_json::Value,
}

impl Snapshot {
    /// Encodes `record` as the payload of a new snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Snapshot` if the record cannot be serialized.
    pub fn encode<T: Serialize>(
        object_id: ObjectId,
        revision: u64,
        sent_by: ParticipantId,
        record: &T,
    ) -> Result<Self, SessionError> {
        let payload = serde_json::to_value(record)
            .map_err(|e| SessionError::Snapshot(format!("snapshot encoding failed: {e}")))?;
        Ok(Self {
            object_id,
            revision,
            sent_by,
            payload,
        })
    }

    /// Decodes the payload into a record.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Snapshot` if the payload does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, SessionError> {
        serde_json::from_value(self.payload.clone()).map_err(|e| {
            SessionError::Snapshot(format!(
                "snapshot decoding failed for object {}: {e}",
                self.object_id
            ))
        })
    }
}

/// Cross-object fan-out events delivered to every participant of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkEvent {
    /// A game has been started.
    GameStarted,
    /// A game has been reset or forcibly ended.
    GameEnded,
}

/// A fan-out event addressed to one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkMessage {
    /// Session (lobby object) the event belongs to.
    pub session_id: ObjectId,
    /// Participant that sent it.
    pub sent_by: ParticipantId,
    /// The event.
    pub event: NetworkEvent,
}

/// Source of participant identity.
pub trait IdentitySource: Send + Sync {
    /// The local participant, if the substrate knows it yet.
    fn local_identity(&self) -> Option<ParticipantId>;

    /// Display name of a participant, `None` if it has already left.
    fn resolve(&self, participant: ParticipantId) -> Option<String>;
}

/// Ownership and propagation primitives of the replication substrate.
pub trait ReplicationSubstrate: Send + Sync {
    /// Whether the local participant currently holds write permission.
    ///
    /// This is a local check against a record that may be one round trip
    /// stale.
    fn is_owner(&self, object: ObjectId) -> bool;

    /// Asks the substrate to transfer write permission to `participant`.
    /// The request may be ignored.
    fn request_ownership(&self, object: ObjectId, participant: ParticipantId);

    /// Propagates a snapshot to every other participant.
    fn commit(&self, snapshot: Snapshot);

    /// Sends a fan-out event to every other participant.
    fn broadcast(&self, message: NetworkMessage);
}
