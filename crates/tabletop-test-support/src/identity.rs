//! Fixed identity source.

use tabletop_core::ids::ParticipantId;
use tabletop_core::replication::IdentitySource;

/// An identity source with a fixed local participant that resolves every
/// id to its default display name.
#[derive(Debug, Clone, Copy)]
pub struct StaticIdentity {
    local: Option<ParticipantId>,
}

impl StaticIdentity {
    /// Identity of `local`.
    #[must_use]
    pub fn new(local: ParticipantId) -> Self {
        Self { local: Some(local) }
    }

    /// No local identity yet, as before the substrate has assigned one.
    #[must_use]
    pub fn anonymous() -> Self {
        Self { local: None }
    }
}

impl IdentitySource for StaticIdentity {
    fn local_identity(&self) -> Option<ParticipantId> {
        self.local
    }

    fn resolve(&self, participant: ParticipantId) -> Option<String> {
        Some(participant.to_string())
    }
}
