//! In-process replication substrate.
//!
//! A [`LoopbackHub`] stands in for the network: every connected participant
//! gets a [`LoopbackEndpoint`] with an inbox, commits and broadcasts are
//! queued into the other participants' inboxes, and tests decide when to
//! drain them. Objects nobody has claimed belong to the master, the
//! connected participant with the lowest id.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tabletop_core::ids::{ObjectId, ParticipantId};
use tabletop_core::replication::{IdentitySource, NetworkMessage, ReplicationSubstrate, Snapshot};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Something the substrate delivers to a participant.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// Another participant committed an object.
    Snapshot(Snapshot),
    /// Another participant broadcast a fan-out event.
    Network(NetworkMessage),
    /// A participant left the world.
    ParticipantLeft(ParticipantId),
}

struct Member {
    name: String,
    inbox: UnboundedSender<Delivery>,
}

#[derive(Default)]
struct HubState {
    members: BTreeMap<ParticipantId, Member>,
    departed: HashSet<ParticipantId>,
    owners: HashMap<ObjectId, ParticipantId>,
    refusals: HashMap<ObjectId, usize>,
    latest: HashMap<ObjectId, Snapshot>,
    committed: Vec<Snapshot>,
    broadcasts: Vec<NetworkMessage>,
}

impl HubState {
    fn master(&self) -> Option<ParticipantId> {
        self.members.keys().next().copied()
    }

    fn owner_of(&self, object: ObjectId) -> Option<ParticipantId> {
        self.owners.get(&object).copied().or_else(|| self.master())
    }

    fn send_to_others(&self, sender: ParticipantId, delivery: &Delivery) {
        for (id, member) in &self.members {
            if *id != sender {
                let _ = member.inbox.send(delivery.clone());
            }
        }
    }
}

/// The shared "network" of one test world.
#[derive(Clone, Default)]
pub struct LoopbackHub {
    state: Arc<Mutex<HubState>>,
}

impl LoopbackHub {
    /// Create an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects a participant. The latest snapshot of every object is
    /// queued to the newcomer, as late joiners receive current state.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn connect(&self, participant: ParticipantId, name: &str) -> Arc<LoopbackEndpoint> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut state = self.state.lock().unwrap();
        for snapshot in state.latest.values() {
            let _ = sender.send(Delivery::Snapshot(snapshot.clone()));
        }
        state.departed.remove(&participant);
        state.members.insert(
            participant,
            Member {
                name: name.to_string(),
                inbox: sender,
            },
        );
        Arc::new(LoopbackEndpoint {
            participant,
            state: Arc::clone(&self.state),
            inbox: Mutex::new(receiver),
        })
    }

    /// Disconnects a participant: its objects fall back to the master, the
    /// remaining participants are told, and its id no longer resolves.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn disconnect(&self, participant: ParticipantId) {
        let mut state = self.state.lock().unwrap();
        state.members.remove(&participant);
        state.departed.insert(participant);
        state.owners.retain(|_, owner| *owner != participant);
        state.send_to_others(participant, &Delivery::ParticipantLeft(participant));
    }

    /// Makes the next `count` ownership requests for `object` fail.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn refuse_transfers(&self, object: ObjectId, count: usize) {
        self.state.lock().unwrap().refusals.insert(object, count);
    }

    /// Current writer of `object`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn owner_of(&self, object: ObjectId) -> Option<ParticipantId> {
        self.state.lock().unwrap().owner_of(object)
    }

    /// Hands `object` to `participant` without a request.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn assign_owner(&self, object: ObjectId, participant: ParticipantId) {
        self.state.lock().unwrap().owners.insert(object, participant);
    }

    /// Every snapshot committed so far, in commit order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn committed(&self) -> Vec<Snapshot> {
        self.state.lock().unwrap().committed.clone()
    }

    /// Every fan-out event broadcast so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn broadcasts(&self) -> Vec<NetworkMessage> {
        self.state.lock().unwrap().broadcasts.clone()
    }
}

/// One participant's connection to the hub. Serves as both its replication
/// substrate and its identity source.
pub struct LoopbackEndpoint {
    participant: ParticipantId,
    state: Arc<Mutex<HubState>>,
    inbox: Mutex<UnboundedReceiver<Delivery>>,
}

impl LoopbackEndpoint {
    /// The participant this endpoint belongs to.
    #[must_use]
    pub fn participant(&self) -> ParticipantId {
        self.participant
    }

    /// Takes every delivery queued so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn drain(&self) -> Vec<Delivery> {
        let mut inbox = self.inbox.lock().unwrap();
        let mut deliveries = Vec::new();
        while let Ok(delivery) = inbox.try_recv() {
            deliveries.push(delivery);
        }
        deliveries
    }
}

impl ReplicationSubstrate for LoopbackEndpoint {
    fn is_owner(&self, object: ObjectId) -> bool {
        let state = self.state.lock().unwrap();
        state.members.contains_key(&self.participant)
            && state.owner_of(object) == Some(self.participant)
    }

    fn request_ownership(&self, object: ObjectId, participant: ParticipantId) {
        let mut state = self.state.lock().unwrap();
        if !state.members.contains_key(&participant) {
            return;
        }
        if let Some(remaining) = state.refusals.get_mut(&object)
            && *remaining > 0
        {
            *remaining -= 1;
            return;
        }
        state.owners.insert(object, participant);
    }

    fn commit(&self, snapshot: Snapshot) {
        let mut state = self.state.lock().unwrap();
        state.latest.insert(snapshot.object_id, snapshot.clone());
        state.committed.push(snapshot.clone());
        state.send_to_others(self.participant, &Delivery::Snapshot(snapshot));
    }

    fn broadcast(&self, message: NetworkMessage) {
        let mut state = self.state.lock().unwrap();
        state.broadcasts.push(message);
        state.send_to_others(self.participant, &Delivery::Network(message));
    }
}

impl IdentitySource for LoopbackEndpoint {
    fn local_identity(&self) -> Option<ParticipantId> {
        Some(self.participant)
    }

    fn resolve(&self, participant: ParticipantId) -> Option<String> {
        let state = self.state.lock().unwrap();
        if state.departed.contains(&participant) {
            return None;
        }
        state
            .members
            .get(&participant)
            .map(|member| member.name.clone())
    }
}
