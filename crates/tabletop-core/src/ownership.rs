//! Single-writer discipline over replicated objects.
//!
//! The substrate offers no merge and no transactions, so two concurrent
//! writers of one object would silently clobber each other's snapshot.
//! Every mutator in the session engine therefore takes an [`Owned`]
//! capability, and the only way to obtain one is [`OwnershipGate::acquire`].

use tracing::{debug, warn};

use crate::error::{DenialReason, SessionError};
use crate::ids::{ObjectId, ParticipantId};
use crate::replication::{IdentitySource, ReplicationSubstrate};

/// Proof that the local participant was the writer of `object` when the
/// capability was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owned {
    object: ObjectId,
    participant: ParticipantId,
}

impl Owned {
    /// The object this capability is for.
    #[must_use]
    pub fn object(&self) -> ObjectId {
        self.object
    }

    /// The participant holding write permission.
    #[must_use]
    pub fn participant(&self) -> ParticipantId {
        self.participant
    }

    /// Checks that this capability was issued for `object`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::OwnershipDenied` with `DenialReason::WrongObject`
    /// when the capability belongs to another object.
    pub fn ensure_for(&self, object: ObjectId) -> Result<(), SessionError> {
        if self.object == object {
            Ok(())
        } else {
            Err(SessionError::OwnershipDenied {
                object,
                reason: DenialReason::WrongObject,
            })
        }
    }
}

/// Failed acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotOwned {
    /// The object we tried to write.
    pub object: ObjectId,
    /// Why it failed.
    pub reason: DenialReason,
}

impl From<NotOwned> for SessionError {
    fn from(denied: NotOwned) -> Self {
        Self::OwnershipDenied {
            object: denied.object,
            reason: denied.reason,
        }
    }
}

/// Wraps the substrate's ownership primitives.
#[derive(Clone, Copy)]
pub struct OwnershipGate<'a> {
    substrate: &'a dyn ReplicationSubstrate,
    identity: &'a dyn IdentitySource,
}

impl<'a> OwnershipGate<'a> {
    /// Creates a gate over the given substrate and identity source.
    #[must_use]
    pub fn new(substrate: &'a dyn ReplicationSubstrate, identity: &'a dyn IdentitySource) -> Self {
        Self {
            substrate,
            identity,
        }
    }

    /// Attempts to become the writer of `object`.
    ///
    /// Succeeds immediately if already the writer. Otherwise requests one
    /// transfer and re-checks; there is no waiting and no retry.
    ///
    /// # Errors
    ///
    /// Returns `NotOwned` if there is no local identity or the transfer did
    /// not result in ownership.
    pub fn acquire(&self, object: ObjectId) -> Result<Owned, NotOwned> {
        let Some(participant) = self.identity.local_identity() else {
            warn!(%object, "no local identity, cannot acquire ownership");
            return Err(NotOwned {
                object,
                reason: DenialReason::NoLocalIdentity,
            });
        };

        if !self.substrate.is_owner(object) {
            debug!(%object, %participant, "requesting ownership transfer");
            self.substrate.request_ownership(object, participant);
        }

        if self.substrate.is_owner(object) {
            Ok(Owned {
                object,
                participant,
            })
        } else {
            warn!(%object, %participant, "ownership transfer was not granted");
            Err(NotOwned {
                object,
                reason: DenialReason::TransferRefused,
            })
        }
    }

    /// Whether the local participant currently owns `object`, without
    /// requesting a transfer.
    #[must_use]
    pub fn holds(&self, object: ObjectId) -> bool {
        self.identity.local_identity().is_some() && self.substrate.is_owner(object)
    }
}
