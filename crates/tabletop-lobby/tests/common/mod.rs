//! Shared helpers for multi-participant session tests.
#![allow(dead_code)]

use std::sync::Arc;

use tabletop_core::ids::ParticipantId;
use tabletop_core::notification::Clock;
use tabletop_core::registry::LocalSessionRegistry;
use tabletop_core::replication::NetworkMessage;
use tabletop_core::rng::DeterministicRng;
use tabletop_lobby::domain::cues::CueCode;
use tabletop_lobby::{
    LobbyCoordinator, SessionConfig, SessionLayout, SessionNotification, SessionNotificationKind,
    SessionPorts,
};
use tabletop_test_support::{
    Delivery, FixedClock, LoopbackEndpoint, LoopbackHub, MockRng, RecordingSink, init_tracing,
};

/// Fixed timestamp used across all session tests.
pub fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

/// One participant's machine: its connection, its notifications and its
/// copy of the session.
pub struct Participant {
    pub id: ParticipantId,
    pub endpoint: Arc<LoopbackEndpoint>,
    pub sink: Arc<RecordingSink<SessionNotification>>,
    pub session: LobbyCoordinator,
}

impl Participant {
    /// Payloads of every notification received so far.
    pub fn kinds(&self) -> Vec<SessionNotificationKind> {
        self.sink.published().into_iter().map(|n| n.kind).collect()
    }

    /// Cues received so far, in order.
    pub fn cues(&self) -> Vec<CueCode> {
        self.kinds()
            .into_iter()
            .filter_map(|kind| match kind {
                SessionNotificationKind::Cue { code, .. } => Some(code),
                _ => None,
            })
            .collect()
    }

    /// Number of `TurnChanged` notifications received so far.
    pub fn turn_changes(&self) -> usize {
        self.kinds()
            .iter()
            .filter(|kind| matches!(kind, SessionNotificationKind::TurnChanged { .. }))
            .count()
    }
}

/// A shared world with one session and any number of participants.
pub struct World {
    pub hub: LoopbackHub,
    pub layout: SessionLayout,
    pub config: SessionConfig,
    pub participants: Vec<Participant>,
}

impl World {
    pub fn new(config: SessionConfig) -> Self {
        init_tracing();
        let layout = SessionLayout::new(config.seat_count);
        Self {
            hub: LoopbackHub::new(),
            layout,
            config,
            participants: Vec::new(),
        }
    }

    /// Four seats, two to start.
    pub fn standard() -> Self {
        Self::new(SessionConfig::default())
    }

    pub fn connect(&mut self, id: u32) -> ParticipantId {
        self.connect_with_rng(id, Box::new(MockRng))
    }

    pub fn connect_with_rng(&mut self, id: u32, rng: Box<dyn DeterministicRng>) -> ParticipantId {
        let participant = ParticipantId(id);
        let endpoint = self.hub.connect(participant, &format!("Player {id}"));
        let sink = Arc::new(RecordingSink::<SessionNotification>::new());
        let ports = SessionPorts {
            substrate: endpoint.clone(),
            identity: endpoint.clone(),
            registry: Arc::new(LocalSessionRegistry::new()),
            sink: sink.clone(),
            clock: fixed_clock(),
            rng,
        };
        let session =
            LobbyCoordinator::new(self.config.clone(), self.layout.clone(), ports).unwrap();
        self.participants.push(Participant {
            id: participant,
            endpoint,
            sink,
            session,
        });
        participant
    }

    /// Drops a participant from the world.
    pub fn disconnect(&mut self, participant: ParticipantId) {
        self.hub.disconnect(participant);
        self.participants.retain(|p| p.id != participant);
    }

    pub fn get(&self, participant: ParticipantId) -> &Participant {
        self.participants
            .iter()
            .find(|p| p.id == participant)
            .unwrap()
    }

    pub fn session(&mut self, participant: ParticipantId) -> &mut LobbyCoordinator {
        &mut self
            .participants
            .iter_mut()
            .find(|p| p.id == participant)
            .unwrap()
            .session
    }

    /// Delivers queued snapshots, fan-out events and departures until
    /// every inbox is empty.
    pub fn pump(&mut self) {
        loop {
            let mut delivered = false;
            for participant in &mut self.participants {
                for delivery in participant.endpoint.drain() {
                    delivered = true;
                    match delivery {
                        Delivery::Snapshot(snapshot) => {
                            participant.session.on_snapshot_received(&snapshot).unwrap();
                        }
                        Delivery::Network(message) => participant.session.on_network_event(message),
                        Delivery::ParticipantLeft(left) => {
                            participant.session.on_participant_disconnected(left).unwrap();
                        }
                    }
                }
            }
            if !delivered {
                break;
            }
        }
    }

    /// Delivers one participant's queued snapshots and departures but holds
    /// back its fan-out events, returning them for later delivery.
    pub fn pump_holding_network(&mut self, participant: ParticipantId) -> Vec<NetworkMessage> {
        let target = self
            .participants
            .iter_mut()
            .find(|p| p.id == participant)
            .unwrap();
        let mut held = Vec::new();
        for delivery in target.endpoint.drain() {
            match delivery {
                Delivery::Snapshot(snapshot) => {
                    target.session.on_snapshot_received(&snapshot).unwrap();
                }
                Delivery::Network(message) => held.push(message),
                Delivery::ParticipantLeft(left) => {
                    target.session.on_participant_disconnected(left).unwrap();
                }
            }
        }
        held
    }

    /// Clears every participant's recorded notifications.
    pub fn clear_notifications(&self) {
        for participant in &self.participants {
            participant.sink.take();
        }
    }
}
