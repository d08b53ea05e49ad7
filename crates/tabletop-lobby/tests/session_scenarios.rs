//! Multi-participant session scenarios over the loopback substrate.

mod common;

use std::sync::Arc;

use common::World;
use tabletop_core::error::{DenialReason, SessionError};
use tabletop_core::ids::ParticipantId;
use tabletop_core::registry::LocalSessionRegistry;
use tabletop_core::replication::{NetworkEvent, NetworkMessage};
use tabletop_lobby::application::views::LobbyControls;
use tabletop_lobby::domain::cues::{CueCode, LobbyCue, SeatCue};
use tabletop_lobby::domain::lobby::LobbyRecord;
use tabletop_lobby::domain::turn::NoticeClass;
use tabletop_lobby::{
    Action, ActionOutcome, LobbyCoordinator, SessionConfig, SessionLayout, SessionNotification,
    SessionNotificationKind, SessionPorts,
};
use tabletop_test_support::{LoopbackHub, MockRng, RecordingSink, SequenceRng, StaticIdentity};

const P1: ParticipantId = ParticipantId(1);
const P2: ParticipantId = ParticipantId(2);
const P3: ParticipantId = ParticipantId(3);
const P4: ParticipantId = ParticipantId(4);

fn accept(world: &mut World, participant: ParticipantId, action: Action) {
    let outcome = world.session(participant).dispatch(action);
    assert_eq!(outcome, ActionOutcome::Accepted, "{action:?} by {participant}");
    world.pump();
}

fn reject(world: &mut World, participant: ParticipantId, action: Action) -> SessionError {
    match world.session(participant).dispatch(action) {
        ActionOutcome::Rejected(rejection) => rejection.error,
        other => panic!("expected {action:?} by {participant} to be rejected, got {other:?}"),
    }
}

/// Everyone in `ids` joins in order, then the first one starts.
fn started_world(ids: &[u32]) -> World {
    let mut world = World::standard();
    for id in ids {
        world.connect(*id);
    }
    for id in ids {
        accept(&mut world, ParticipantId(*id), Action::Join);
    }
    accept(&mut world, ParticipantId(ids[0]), Action::Start);
    world
}

#[test]
fn test_start_then_advance_moves_turn_to_second_seat_everywhere() {
    // Arrange
    let mut world = World::standard();
    world.connect(1);
    world.connect(2);
    accept(&mut world, P1, Action::Join);
    accept(&mut world, P2, Action::Join);

    // Act
    accept(&mut world, P1, Action::Start);
    let index_after_start = world.get(P2).session.turn().active_index();
    accept(&mut world, P1, Action::NextTurn { seat: 0 });

    // Assert
    assert_eq!(index_after_start, 0);
    for participant in [P1, P2] {
        let session = &world.get(participant).session;
        assert!(session.game_started());
        assert!(session.any_game_in_world());
        assert_eq!(session.turn().active_index(), 1);
    }
    assert_eq!(
        world.get(P2).session.notices(),
        vec![
            NoticeClass::Inactive,
            NoticeClass::Current,
            NoticeClass::None,
            NoticeClass::None
        ]
    );
    assert_eq!(
        world.get(P1).session.notices()[..2],
        [NoticeClass::Wait, NoticeClass::Active]
    );
}

#[test]
fn test_disconnect_of_reversed_active_player_compacts_and_rewinds() {
    // Arrange
    let mut world = started_world(&[1, 2, 3]);
    accept(&mut world, P1, Action::NextTurn { seat: 0 });
    accept(&mut world, P2, Action::NextTurn { seat: 1 });
    accept(&mut world, P3, Action::Event12 { seat: 2 });
    assert_eq!(world.get(P1).session.turn().active_index(), 2);
    assert!(world.get(P1).session.turn().reverse());

    // Act
    world.disconnect(P3);
    world.pump();

    // Assert
    for participant in [P1, P2] {
        let session = &world.get(participant).session;
        assert_eq!(
            session.lobby().roster().as_slice(),
            &[Some(P1), Some(P2), None, None]
        );
        assert!(!session.game_started());
        assert_eq!(session.turn().active_index(), 0);
    }
    assert!(
        world
            .get(P2)
            .kinds()
            .contains(&SessionNotificationKind::GameStateChanged { started: false })
    );
}

#[test]
fn test_refused_turn_transfer_changes_nothing_and_retry_succeeds() {
    // Arrange
    let mut world = started_world(&[1, 2]);
    accept(&mut world, P1, Action::NextTurn { seat: 0 });
    let turn_object = world.layout.turn;
    world.hub.refuse_transfers(turn_object, 1);
    let commits_before = world.hub.committed().len();
    let cursor_before = *world.get(P2).session.turn().cursor();

    // Act
    let error = reject(&mut world, P2, Action::NextTurn { seat: 1 });

    // Assert
    assert_eq!(
        error,
        SessionError::OwnershipDenied {
            object: turn_object,
            reason: DenialReason::TransferRefused,
        }
    );
    assert_eq!(world.get(P2).session.turn().cursor(), &cursor_before);
    assert_eq!(world.hub.committed().len(), commits_before);

    accept(&mut world, P2, Action::NextTurn { seat: 1 });
    assert_eq!(world.get(P1).session.turn().active_index(), 0);
    assert_eq!(world.hub.owner_of(turn_object), Some(P2));
}

#[test]
fn test_join_while_game_started_is_rejected_everywhere() {
    // Arrange
    let mut world = started_world(&[1, 2]);
    world.connect(3);
    world.pump();
    let roster_before = world.get(P3).session.lobby().roster().clone();

    // Act
    let error = reject(&mut world, P3, Action::Join);
    world.pump();

    // Assert
    assert_eq!(error, SessionError::GameInProgress);
    assert_eq!(world.get(P3).session.lobby().roster(), &roster_before);
    assert_eq!(world.get(P1).session.lobby().roster(), &roster_before);
    assert_eq!(world.get(P3).session.controls(), LobbyControls::Disabled);
}

#[test]
fn test_dice_cues_fire_once_per_press_on_remote_copies() {
    // Arrange
    let mut world = World::standard();
    world.connect_with_rng(1, Box::new(SequenceRng::new(vec![5])));
    world.connect(2);
    accept(&mut world, P1, Action::Join);
    accept(&mut world, P2, Action::Join);
    accept(&mut world, P1, Action::Start);
    world.clear_notifications();

    // Act
    accept(&mut world, P1, Action::RollDice { seat: 0 });
    accept(&mut world, P1, Action::RollDice { seat: 0 });
    let latest_seat_snapshot = world
        .hub
        .committed()
        .into_iter()
        .rev()
        .find(|s| s.object_id == world.layout.seats[0])
        .unwrap();
    world
        .session(P2)
        .on_snapshot_received(&latest_seat_snapshot)
        .unwrap();
    world
        .session(P2)
        .on_snapshot_received(&latest_seat_snapshot)
        .unwrap();

    // Assert
    let expected = vec![
        CueCode::Seat(SeatCue::DiceRoll),
        CueCode::Seat(SeatCue::DiceResult),
    ];
    assert_eq!(world.get(P1).cues(), expected);
    assert_eq!(world.get(P2).cues(), expected);
    assert_eq!(world.get(P2).session.seat(0).unwrap().dice_result(), 5);
}

#[test]
fn test_next_turn_clears_dice_and_cues_next() {
    let mut world = World::standard();
    world.connect_with_rng(1, Box::new(SequenceRng::new(vec![3])));
    world.connect(2);
    accept(&mut world, P1, Action::Join);
    accept(&mut world, P2, Action::Join);
    accept(&mut world, P1, Action::Start);
    accept(&mut world, P1, Action::RollDice { seat: 0 });
    accept(&mut world, P1, Action::RollDice { seat: 0 });
    world.clear_notifications();

    accept(&mut world, P1, Action::NextTurn { seat: 0 });

    let seat = world.get(P2).session.seat(0).unwrap();
    assert_eq!(seat.dice_result(), 0);
    assert!(!seat.is_rolling());
    assert_eq!(world.get(P2).cues(), vec![CueCode::Seat(SeatCue::Next)]);
}

#[test]
fn test_seat_actions_outside_own_turn_are_rejected() {
    let mut world = started_world(&[1, 2]);

    assert_eq!(
        reject(&mut world, P2, Action::RollDice { seat: 1 }),
        SessionError::NotYourTurn(1)
    );
    assert_eq!(
        reject(&mut world, P2, Action::NextTurn { seat: 0 }),
        SessionError::NotYourTurn(0)
    );
    assert_eq!(
        reject(&mut world, P2, Action::Event4 { seat: 0 }),
        SessionError::NotYourTurn(0)
    );
    assert!(matches!(
        reject(&mut world, P1, Action::Event9 { seat: 7 }),
        SessionError::SeatOutOfRange { index: 7, .. }
    ));
}

#[test]
fn test_debug_mode_lets_anyone_trigger_events() {
    let mut world = World::new(SessionConfig {
        debug_mode: true,
        ..SessionConfig::default()
    });
    world.connect(1);
    world.connect(2);
    accept(&mut world, P1, Action::Join);
    accept(&mut world, P2, Action::Join);
    accept(&mut world, P1, Action::Start);
    world.clear_notifications();

    accept(&mut world, P2, Action::Event4 { seat: 0 });

    assert_eq!(world.get(P1).cues(), vec![CueCode::Seat(SeatCue::Event4)]);
    assert!(world.get(P1).session.view().seats[1].interactable);
}

#[test]
fn test_seat_actions_require_running_game() {
    let mut world = World::standard();
    world.connect(1);
    accept(&mut world, P1, Action::Join);

    assert_eq!(
        reject(&mut world, P1, Action::RollDice { seat: 0 }),
        SessionError::GameNotStarted
    );
    assert_eq!(
        reject(&mut world, P1, Action::Reset),
        SessionError::GameNotStarted
    );
}

#[test]
fn test_spectator_receives_lobby_but_not_seat_feedback() {
    // Arrange
    let mut world = started_world(&[1, 2]);
    world.connect(3);
    world.pump();
    world.clear_notifications();

    // Act
    accept(&mut world, P1, Action::RollDice { seat: 0 });
    accept(&mut world, P1, Action::NextTurn { seat: 0 });
    accept(&mut world, P1, Action::ConfirmStop);

    // Assert
    let spectator = world.get(P3);
    assert_eq!(spectator.cues(), vec![CueCode::Lobby(LobbyCue::Stop)]);
    assert_eq!(spectator.turn_changes(), 0);
    assert_eq!(spectator.session.turn().active_index(), 1);
}

#[test]
fn test_spectator_feedback_setting_forwards_seat_cues() {
    let mut world = World::new(SessionConfig {
        spectator_feedback: true,
        ..SessionConfig::default()
    });
    world.connect(1);
    world.connect(2);
    world.connect(3);
    accept(&mut world, P1, Action::Join);
    accept(&mut world, P2, Action::Join);
    accept(&mut world, P1, Action::Start);
    world.clear_notifications();

    accept(&mut world, P1, Action::NextTurn { seat: 0 });

    let spectator = world.get(P3);
    assert_eq!(spectator.cues(), vec![CueCode::Seat(SeatCue::Next)]);
    assert_eq!(spectator.turn_changes(), 1);
}

#[test]
fn test_confirm_stop_opens_dialog_only_locally() {
    let mut world = started_world(&[1, 2]);
    world.clear_notifications();

    accept(&mut world, P2, Action::ConfirmStop);

    assert!(
        world
            .get(P2)
            .kinds()
            .contains(&SessionNotificationKind::DialogRequested)
    );
    assert!(
        !world
            .get(P1)
            .kinds()
            .contains(&SessionNotificationKind::DialogRequested)
    );
    assert_eq!(world.get(P1).cues(), vec![CueCode::Lobby(LobbyCue::Stop)]);
}

#[test]
fn test_reset_returns_everyone_to_lobby_with_seats_kept() {
    let mut world = started_world(&[1, 2]);
    accept(&mut world, P1, Action::NextTurn { seat: 0 });

    accept(&mut world, P2, Action::Reset);

    for participant in [P1, P2] {
        let session = &world.get(participant).session;
        assert!(!session.game_started());
        assert_eq!(session.turn().active_index(), 0);
        assert_eq!(session.lobby().roster().occupied_count(), 2);
        assert_eq!(session.controls(), LobbyControls::Ready);
    }
    assert!(world.get(P1).cues().contains(&CueCode::Lobby(LobbyCue::Reset)));
}

#[test]
fn test_owner_departure_is_committed_by_new_owner_without_stale_cue() {
    // Arrange
    let mut world = World::standard();
    for id in [1, 2, 3] {
        world.connect(id);
    }
    for participant in [P1, P2, P3] {
        accept(&mut world, participant, Action::Join);
    }
    assert_eq!(world.hub.owner_of(world.layout.lobby), Some(P3));

    // Act
    world.disconnect(P3);
    world.pump();

    // Assert
    let last_lobby_commit = world
        .hub
        .committed()
        .into_iter()
        .rev()
        .find(|s| s.object_id == world.layout.lobby)
        .unwrap();
    let record: LobbyRecord = last_lobby_commit.decode().unwrap();
    assert_eq!(last_lobby_commit.sent_by, P1);
    assert_eq!(record.roster.as_slice(), &[Some(P1), Some(P2), None, None]);
    assert_eq!(record.cue, None);
    assert_eq!(
        world.get(P2).session.lobby().roster(),
        world.get(P1).session.lobby().roster()
    );
}

#[test]
fn test_leave_then_join_reuses_lowest_free_seat() {
    let mut world = World::standard();
    for id in [1, 2, 3, 4] {
        world.connect(id);
    }
    for participant in [P1, P2, P3] {
        accept(&mut world, participant, Action::Join);
    }

    accept(&mut world, P1, Action::Leave);
    accept(&mut world, P4, Action::Join);

    assert_eq!(
        world.get(P2).session.lobby().roster().as_slice(),
        &[Some(P2), Some(P3), Some(P4), None]
    );
    assert!(!world.get(P1).session.local_joined());
    assert!(world.get(P4).session.local_joined());
}

#[test]
fn test_late_joiner_catches_up_from_latest_snapshots() {
    let mut world = started_world(&[1, 2]);
    accept(&mut world, P1, Action::NextTurn { seat: 0 });

    world.connect(4);
    world.pump();

    let view = world.get(P4).session.view();
    assert!(view.game_started);
    assert_eq!(view.active_index, 1);
    assert_eq!(view.seats[0].display_name.as_deref(), Some("Player 1"));
    assert_eq!(view.controls, LobbyControls::Disabled);
}

#[test]
fn test_turn_changed_is_published_only_on_change() {
    let mut world = started_world(&[1, 2]);
    let before = world.get(P2).turn_changes();
    let echo = NetworkMessage {
        session_id: world.layout.lobby,
        sent_by: P1,
        event: NetworkEvent::GameStarted,
    };

    world.session(P2).on_network_event(echo);
    accept(&mut world, P1, Action::Event4 { seat: 0 });

    assert_eq!(world.get(P2).turn_changes(), before);
}

#[test]
fn test_display_name_is_stale_until_departure_is_processed() {
    // Arrange
    let mut world = World::standard();
    for id in [1, 2, 3] {
        world.connect(id);
    }
    for participant in [P1, P2, P3] {
        accept(&mut world, participant, Action::Join);
    }

    // Act
    world.disconnect(P3);
    let before_pump = world.session(P1).display_name(2);
    world.pump();
    let after_pump = world.session(P1).display_name(2);

    // Assert
    assert_eq!(before_pump, Err(SessionError::StaleReference(P3)));
    assert_eq!(after_pump, Ok(None));
    assert_eq!(
        world.session(P1).display_name(1),
        Ok(Some("Player 2".to_string()))
    );
    assert!(matches!(
        world.session(P1).display_name(9),
        Err(SessionError::SeatOutOfRange { index: 9, .. })
    ));
}

#[test]
fn test_participant_can_join_only_one_sibling_session() {
    // Arrange
    let hub = LoopbackHub::new();
    let endpoint = hub.connect(P1, "Player 1");
    let registry = Arc::new(LocalSessionRegistry::new());
    let open_session = |layout: SessionLayout| {
        let ports = SessionPorts {
            substrate: endpoint.clone(),
            identity: endpoint.clone(),
            registry: registry.clone(),
            sink: Arc::new(RecordingSink::<SessionNotification>::new()),
            clock: common::fixed_clock(),
            rng: Box::new(MockRng),
        };
        LobbyCoordinator::new(SessionConfig::default(), layout, ports).unwrap()
    };
    let mut first = open_session(SessionLayout::new(4));
    let mut second = open_session(SessionLayout::new(4));

    // Act
    let joined = first.join();
    let rejected = second.join();

    // Assert
    assert_eq!(joined, Ok(0));
    assert_eq!(rejected, Err(SessionError::AlreadyJoined(P1)));
    assert_eq!(second.lobby().roster().occupied_count(), 0);
    assert!(!second.any_game_in_world());

    first.leave().unwrap();
    assert_eq!(second.join(), Ok(0));
}

#[test]
fn test_anonymous_participant_cannot_write() {
    let hub = LoopbackHub::new();
    let endpoint = hub.connect(P1, "Player 1");
    let layout = SessionLayout::new(4);
    let lobby_id = layout.lobby;
    let ports = SessionPorts {
        substrate: endpoint,
        identity: Arc::new(StaticIdentity::anonymous()),
        registry: Arc::new(LocalSessionRegistry::new()),
        sink: Arc::new(RecordingSink::<SessionNotification>::new()),
        clock: common::fixed_clock(),
        rng: Box::new(MockRng),
    };
    let mut session = LobbyCoordinator::new(SessionConfig::default(), layout, ports).unwrap();

    let outcome = session.dispatch(Action::Join);

    assert_eq!(
        outcome.error(),
        Some(&SessionError::OwnershipDenied {
            object: lobby_id,
            reason: DenialReason::NoLocalIdentity,
        })
    );
    assert!(!session.local_joined());
}

#[test]
fn test_layout_must_match_configured_seat_count() {
    let hub = LoopbackHub::new();
    let endpoint = hub.connect(P1, "Player 1");
    let ports = SessionPorts {
        substrate: endpoint.clone(),
        identity: endpoint,
        registry: Arc::new(LocalSessionRegistry::new()),
        sink: Arc::new(RecordingSink::<SessionNotification>::new()),
        clock: common::fixed_clock(),
        rng: Box::new(MockRng),
    };

    let result = LobbyCoordinator::new(SessionConfig::default(), SessionLayout::new(3), ports);

    assert!(matches!(result, Err(SessionError::Config(_))));
}

#[test]
fn test_start_below_minimum_is_rejected() {
    let mut world = World::standard();
    world.connect(1);
    accept(&mut world, P1, Action::Join);

    assert_eq!(
        reject(&mut world, P1, Action::Start),
        SessionError::BelowMinimumOccupancy {
            occupied: 1,
            minimum: 2,
        }
    );
    assert!(!world.get(P1).session.game_started());
}

#[test]
fn test_late_game_end_from_previous_round_leaves_new_round_alone() {
    // Arrange
    let mut world = started_world(&[1, 2]);
    let outcome = world.session(P1).dispatch(Action::Reset);
    assert!(outcome.is_accepted());
    let held = world.pump_holding_network(P2);
    assert_eq!(held.len(), 1);
    assert!(!world.get(P2).session.game_started());
    accept(&mut world, P1, Action::Start);
    accept(&mut world, P1, Action::NextTurn { seat: 0 });
    assert_eq!(world.get(P2).session.turn().active_index(), 1);

    // Act
    for message in held {
        world.session(P2).on_network_event(message);
    }

    // Assert
    let session = &world.get(P2).session;
    assert!(session.game_started());
    assert_eq!(session.turn().active_index(), 1);
    accept(&mut world, P2, Action::NextTurn { seat: 1 });
    assert_eq!(world.get(P1).session.turn().active_index(), 0);
}

#[test]
fn test_new_round_starts_with_dice_at_rest() {
    // Arrange
    let mut world = started_world(&[1, 2]);
    accept(&mut world, P1, Action::RollDice { seat: 0 });
    accept(&mut world, P1, Action::RollDice { seat: 0 });
    assert!(world.get(P2).session.seat(0).unwrap().is_rolling());

    // Act
    accept(&mut world, P2, Action::Reset);
    let after_reset = world.get(P1).session.view().seats[0].clone();
    accept(&mut world, P1, Action::Start);
    world.clear_notifications();
    accept(&mut world, P1, Action::RollDice { seat: 0 });

    // Assert
    assert!(!after_reset.rolling);
    assert_eq!(after_reset.dice_result, 0);
    assert_eq!(world.get(P1).cues(), vec![CueCode::Seat(SeatCue::DiceRoll)]);
    assert_eq!(world.get(P2).cues(), vec![CueCode::Seat(SeatCue::DiceRoll)]);
    assert_eq!(world.get(P2).session.seat(0).unwrap().dice_result(), 0);
}

#[test]
fn test_departure_mid_game_does_not_hand_dice_to_next_occupant() {
    // Arrange
    let mut world = started_world(&[1, 2, 3]);
    accept(&mut world, P1, Action::NextTurn { seat: 0 });
    accept(&mut world, P2, Action::RollDice { seat: 1 });
    accept(&mut world, P2, Action::RollDice { seat: 1 });

    // Act
    world.disconnect(P2);
    world.pump();

    // Assert
    for participant in [P1, P3] {
        let seat = world.get(participant).session.view().seats[1].clone();
        assert_eq!(seat.occupant, Some(P3));
        assert!(!seat.rolling);
        assert_eq!(seat.dice_result, 0);
    }
}

#[test]
fn test_early_game_start_announcement_waits_for_lobby_snapshot() {
    let mut world = World::standard();
    world.connect(1);
    world.connect(2);
    accept(&mut world, P1, Action::Join);
    accept(&mut world, P2, Action::Join);
    let session_id = world.layout.lobby;

    world.session(P2).on_network_event(NetworkMessage {
        session_id,
        sent_by: P1,
        event: NetworkEvent::GameStarted,
    });

    assert!(!world.get(P2).session.game_started());
    assert_eq!(world.get(P2).session.controls(), LobbyControls::Ready);
}
