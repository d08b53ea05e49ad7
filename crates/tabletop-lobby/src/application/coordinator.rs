//! The session controller.
//!
//! A [`LobbyCoordinator`] is one participant's copy of one session. It owns
//! the local copies of the lobby, turn cursor and seat records, turns local
//! actions into ownership-guarded mutations and commits, and turns inbound
//! snapshots, fan-out events and disconnections into notifications.

use std::sync::Arc;

use tabletop_core::error::{DenialReason, SessionError};
use tabletop_core::ids::{ObjectId, ParticipantId};
use tabletop_core::notification::{Clock, NotificationMetadata, NotificationSink};
use tabletop_core::ownership::{Owned, OwnershipGate};
use tabletop_core::registry::{SessionPresence, SessionRegistry};
use tabletop_core::replication::{
    IdentitySource, NetworkEvent, NetworkMessage, ReplicationSubstrate, Snapshot,
};
use tabletop_core::rng::DeterministicRng;
use tracing::{debug, info, instrument, warn};

use crate::application::actions::{Action, ActionOutcome, Rejection};
use crate::application::sync_dispatcher::{Inbound, SyncDispatcher};
use crate::application::views::{self, LobbyControls, LobbyView};
use crate::config::SessionConfig;
use crate::domain::cues::{CueCode, CueStamp, LobbyCue, SeatCue};
use crate::domain::events::{CueSource, SessionNotification, SessionNotificationKind};
use crate::domain::layout::SessionLayout;
use crate::domain::lobby::{LobbyMembership, LobbyRecord};
use crate::domain::seat_state::SeatState;
use crate::domain::seats::SeatIndex;
use crate::domain::turn::{NoticeClass, TurnEngine, derive_notices};

/// External collaborators of one coordinator.
pub struct SessionPorts {
    /// Ownership and propagation.
    pub substrate: Arc<dyn ReplicationSubstrate>,
    /// Who the local participant is, and display names.
    pub identity: Arc<dyn IdentitySource>,
    /// Sibling sessions in the same world.
    pub registry: Arc<dyn SessionRegistry>,
    /// Receiver of notifications.
    pub sink: Arc<dyn NotificationSink<SessionNotification>>,
    /// Timestamps for notification metadata.
    pub clock: Arc<dyn Clock>,
    /// Dice.
    pub rng: Box<dyn DeterministicRng>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TurnSummary {
    active_index: SeatIndex,
    reverse: bool,
    notices: Vec<NoticeClass>,
}

/// One participant's controller for one session.
pub struct LobbyCoordinator {
    config: SessionConfig,
    ports: SessionPorts,
    presence: Arc<SessionPresence>,
    dispatcher: SyncDispatcher,
    lobby: LobbyMembership,
    turn: TurnEngine,
    seats: Vec<SeatState>,
    published_turn: Option<TurnSummary>,
}

impl LobbyCoordinator {
    /// Creates the local copy of a session and registers it with the
    /// world's registry.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Config` if the configuration is invalid or
    /// does not match the layout's seat count.
    pub fn new(
        config: SessionConfig,
        layout: SessionLayout,
        ports: SessionPorts,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        if layout.seat_count() != config.seat_count {
            return Err(SessionError::Config(format!(
                "layout has {} seats, config expects {}",
                layout.seat_count(),
                config.seat_count
            )));
        }

        let lobby = LobbyMembership::new(layout.lobby, config.seat_count, config.min_players);
        let turn = TurnEngine::new(layout.turn);
        let seats = layout.seats.iter().copied().map(SeatState::new).collect();
        let presence = ports.registry.register();

        info!(session_id = %layout.lobby, seats = config.seat_count, "session created");

        Ok(Self {
            config,
            presence,
            dispatcher: SyncDispatcher::new(layout),
            lobby,
            turn,
            seats,
            ports,
            published_turn: None,
        })
    }

    /// The session id (the lobby object's id).
    #[must_use]
    pub fn session_id(&self) -> ObjectId {
        self.lobby.object_id()
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn layout(&self) -> &SessionLayout {
        self.dispatcher.layout()
    }

    /// Local copy of the lobby.
    #[must_use]
    pub fn lobby(&self) -> &LobbyMembership {
        &self.lobby
    }

    /// Local copy of the turn cursor.
    #[must_use]
    pub fn turn(&self) -> &TurnEngine {
        &self.turn
    }

    /// Local copy of one seat record.
    #[must_use]
    pub fn seat(&self, index: SeatIndex) -> Option<&SeatState> {
        self.seats.get(index)
    }

    #[must_use]
    pub fn local_joined(&self) -> bool {
        self.lobby.local_joined()
    }

    #[must_use]
    pub fn game_started(&self) -> bool {
        self.lobby.game_started()
    }

    /// Whether any session in this world, this one included, has a game
    /// running as last observed locally.
    #[must_use]
    pub fn any_game_in_world(&self) -> bool {
        self.ports.registry.any_game_started()
    }

    /// Notice class of every seat for the local participant.
    #[must_use]
    pub fn notices(&self) -> Vec<NoticeClass> {
        derive_notices(
            self.lobby.game_started(),
            self.lobby.roster(),
            self.turn.active_index(),
            self.local(),
        )
    }

    /// Lobby button state.
    #[must_use]
    pub fn controls(&self) -> LobbyControls {
        LobbyControls::derive(self.lobby.local_joined(), self.lobby.game_started())
    }

    /// Everything a presentation layer needs to draw the session.
    #[must_use]
    pub fn view(&self) -> LobbyView {
        views::build_lobby_view(
            &self.lobby,
            &self.turn,
            &self.seats,
            &*self.ports.identity,
            self.config.debug_mode,
        )
    }

    /// Display name of the participant in `seat`.
    ///
    /// # Errors
    ///
    /// `SeatOutOfRange` for a bad index, `StaleReference` if the occupant
    /// has left the world.
    pub fn display_name(&self, seat: SeatIndex) -> Result<Option<String>, SessionError> {
        self.ensure_seat(seat)?;
        views::resolve_occupant(&*self.ports.identity, self.lobby.roster(), seat)
    }

    /// Runs one local action, converting any error into a rejection.
    #[instrument(skip(self), fields(session_id = %self.session_id()))]
    pub fn dispatch(&mut self, action: Action) -> ActionOutcome {
        let result = match action {
            Action::Join => self.join().map(|_| ()),
            Action::Leave => self.leave(),
            Action::Start => self.start_game(),
            Action::Reset => self.reset_game(),
            Action::ConfirmStop => self.confirm_stop(),
            Action::RollDice { seat } => self.roll_dice(seat),
            Action::NextTurn { seat } => self.next_turn(seat),
            Action::Event4 { seat } => self.trigger_event(seat, SeatCue::Event4),
            Action::Event9 { seat } => self.trigger_event(seat, SeatCue::Event9),
            Action::Event12 { seat } => self.trigger_event(seat, SeatCue::Event12),
        };

        match result {
            Ok(()) => {
                info!(action = action.action_type(), "action accepted");
                ActionOutcome::Accepted
            }
            Err(error) => {
                warn!(
                    action = action.action_type(),
                    kind = ?error.kind(),
                    %error,
                    "action rejected"
                );
                ActionOutcome::Rejected(Rejection { action, error })
            }
        }
    }

    /// Seats the local participant in the lowest free seat.
    ///
    /// # Errors
    ///
    /// `AlreadyJoined` (here or in a sibling session), `GameInProgress`,
    /// `LobbyFull`, or `OwnershipDenied`.
    pub fn join(&mut self) -> Result<SeatIndex, SessionError> {
        let participant = self.require_local(self.lobby.object_id())?;
        if self.ports.registry.any_session_has_local_member() {
            return Err(SessionError::AlreadyJoined(participant));
        }
        self.lobby.ensure_can_join(participant)?;
        let owned = self.acquire(self.lobby.object_id())?;

        let stamp = CueStamp::issue(participant);
        let seat = self.lobby.join(&owned, participant, stamp)?;
        self.commit_lobby(&owned)?;
        self.dispatcher.mark_lobby(stamp);

        info!(%participant, seat, "joined");
        self.publish_membership();
        self.publish_lobby_cue(LobbyCue::Join);
        self.sync_presence();
        self.refresh_turn();
        Ok(seat)
    }

    /// Gives up the local participant's seat.
    ///
    /// # Errors
    ///
    /// `NotJoined`, `GameInProgress`, or `OwnershipDenied`.
    pub fn leave(&mut self) -> Result<(), SessionError> {
        let participant = self.require_local(self.lobby.object_id())?;
        self.lobby.ensure_can_leave()?;
        let owned = self.acquire(self.lobby.object_id())?;

        let stamp = CueStamp::issue(participant);
        let seat = self.lobby.leave(&owned, participant, stamp)?;
        self.commit_lobby(&owned)?;
        self.dispatcher.mark_lobby(stamp);

        info!(%participant, seat, "left");
        self.turn.repair_cursor(self.lobby.roster());
        self.publish_membership();
        self.publish_lobby_cue(LobbyCue::Leave);
        self.sync_presence();
        self.refresh_turn();
        Ok(())
    }

    /// Starts a game: sets the lobby flag, rewinds the turn cursor, clears
    /// dice left from the last game, and tells every participant.
    ///
    /// # Errors
    ///
    /// `NotJoined`, `GameInProgress`, `BelowMinimumOccupancy`, or
    /// `OwnershipDenied` on the lobby, turn or a seat object.
    pub fn start_game(&mut self) -> Result<(), SessionError> {
        let participant = self.require_local(self.lobby.object_id())?;
        self.lobby.ensure_can_start()?;
        let lobby_owned = self.acquire(self.lobby.object_id())?;
        let turn_owned = self.acquire(self.turn.object_id())?;
        let seats_owned = self.acquire_used_seats()?;

        let stamp = CueStamp::issue(participant);
        self.lobby.start(&lobby_owned, stamp)?;
        self.turn.begin_round(&turn_owned, self.lobby.roster())?;
        self.clear_seats(&seats_owned)?;
        self.commit_lobby(&lobby_owned)?;
        self.commit_turn(&turn_owned)?;
        self.dispatcher.mark_lobby(stamp);
        self.broadcast(participant, NetworkEvent::GameStarted);

        info!(
            %participant,
            occupied = self.lobby.roster().occupied_count(),
            "game started"
        );
        self.publish(SessionNotificationKind::GameStateChanged { started: true });
        self.publish_lobby_cue(LobbyCue::Start);
        self.sync_presence();
        self.refresh_turn();
        Ok(())
    }

    /// Ends the running game and clears the dice. Seats stay occupied.
    ///
    /// # Errors
    ///
    /// `NotJoined`, `GameNotStarted`, or `OwnershipDenied` on the lobby or
    /// a seat object.
    pub fn reset_game(&mut self) -> Result<(), SessionError> {
        let participant = self.require_local(self.lobby.object_id())?;
        self.lobby.ensure_in_game()?;
        let owned = self.acquire(self.lobby.object_id())?;
        let seats_owned = self.acquire_used_seats()?;

        let stamp = CueStamp::issue(participant);
        self.lobby.reset(&owned, stamp)?;
        self.clear_seats(&seats_owned)?;
        self.commit_lobby(&owned)?;
        self.dispatcher.mark_lobby(stamp);
        self.broadcast(participant, NetworkEvent::GameEnded);

        info!(%participant, "game reset");
        self.turn.end_round();
        self.publish(SessionNotificationKind::GameStateChanged { started: false });
        self.publish_lobby_cue(LobbyCue::Reset);
        self.sync_presence();
        self.refresh_turn();
        Ok(())
    }

    /// Cues `Stop` for everyone and asks the local presentation layer to
    /// open the stop-confirmation dialog.
    ///
    /// # Errors
    ///
    /// `NotJoined`, `GameNotStarted`, or `OwnershipDenied`.
    pub fn confirm_stop(&mut self) -> Result<(), SessionError> {
        let participant = self.require_local(self.lobby.object_id())?;
        self.lobby.ensure_in_game()?;
        let owned = self.acquire(self.lobby.object_id())?;

        let stamp = CueStamp::issue(participant);
        self.lobby.confirm_stop(&owned, stamp)?;
        self.commit_lobby(&owned)?;
        self.dispatcher.mark_lobby(stamp);

        self.publish_lobby_cue(LobbyCue::Stop);
        self.publish(SessionNotificationKind::DialogRequested);
        Ok(())
    }

    /// Presses the dice button of the local participant's active seat.
    /// The first press starts the roll, each later press lands a value.
    ///
    /// # Errors
    ///
    /// `SeatOutOfRange`, `GameNotStarted`, `NotYourTurn`, or
    /// `OwnershipDenied`.
    pub fn roll_dice(&mut self, seat: SeatIndex) -> Result<(), SessionError> {
        self.ensure_seat(seat)?;
        let participant = self.require_local(self.seats[seat].object_id)?;
        self.ensure_turn_holder(seat, participant)?;
        let owned = self.acquire(self.seats[seat].object_id)?;

        let stamp = CueStamp::issue(participant);
        let record = &mut self.seats[seat];
        let code = if record.is_rolling() {
            let value = self.ports.rng.next_u32_range(1, self.config.dice_faces);
            record.record_roll(&owned, value, stamp)?;
            info!(%participant, seat, value, "dice landed");
            SeatCue::DiceResult
        } else {
            record.begin_roll(&owned, stamp)?;
            debug!(%participant, seat, "dice rolling");
            SeatCue::DiceRoll
        };
        self.commit_seat(&owned, seat)?;
        self.dispatcher.mark_seat(seat, stamp);

        self.publish_seat_cue(seat, code);
        Ok(())
    }

    /// Hands the turn to the next occupied seat and clears the dice.
    ///
    /// # Errors
    ///
    /// `SeatOutOfRange`, `GameNotStarted`, `NotYourTurn`, or
    /// `OwnershipDenied` on the turn or seat object.
    pub fn next_turn(&mut self, seat: SeatIndex) -> Result<(), SessionError> {
        let participant = self.require_local(self.turn.object_id())?;
        self.ensure_turn_holder(seat, participant)?;
        let turn_owned = self.acquire(self.turn.object_id())?;
        let seat_owned = self.acquire(self.seats[seat].object_id)?;

        let next = self.turn.advance(&turn_owned, self.lobby.roster())?;
        self.commit_turn(&turn_owned)?;

        let stamp = CueStamp::issue(participant);
        self.seats[seat].finish_turn(&seat_owned, stamp)?;
        self.commit_seat(&seat_owned, seat)?;
        self.dispatcher.mark_seat(seat, stamp);

        info!(%participant, from = seat, to = next, "turn advanced");
        self.publish_seat_cue(seat, SeatCue::Next);
        self.refresh_turn();
        Ok(())
    }

    /// Flips the rotation direction.
    ///
    /// # Errors
    ///
    /// `OwnershipDenied` on the turn object.
    pub fn toggle_direction(&mut self) -> Result<bool, SessionError> {
        let owned = self.acquire(self.turn.object_id())?;
        let reverse = self.turn.toggle_direction(&owned, self.lobby.roster())?;
        self.commit_turn(&owned)?;
        info!(reverse, "direction toggled");
        self.refresh_turn();
        Ok(reverse)
    }

    fn trigger_event(&mut self, seat: SeatIndex, code: SeatCue) -> Result<(), SessionError> {
        self.ensure_seat(seat)?;
        let participant = self.require_local(self.seats[seat].object_id)?;
        self.ensure_can_interact(seat, participant)?;
        let owned = self.acquire(self.seats[seat].object_id)?;
        let turn_owned = if code == SeatCue::Event12 {
            Some(self.acquire(self.turn.object_id())?)
        } else {
            None
        };

        let stamp = CueStamp::issue(participant);
        self.seats[seat].emit(&owned, code, stamp)?;
        self.commit_seat(&owned, seat)?;
        self.dispatcher.mark_seat(seat, stamp);
        self.publish_seat_cue(seat, code);

        if let Some(turn_owned) = turn_owned {
            let reverse = self.turn.toggle_direction(&turn_owned, self.lobby.roster())?;
            self.commit_turn(&turn_owned)?;
            info!(%participant, seat, reverse, "direction toggled");
            self.refresh_turn();
        }
        Ok(())
    }

    /// Applies a snapshot committed by another participant.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Snapshot` if the snapshot does not decode or
    /// does not fit this session. The local copy is left unchanged.
    #[instrument(skip(self, snapshot), fields(session_id = %self.session_id(), object_id = %snapshot.object_id))]
    pub fn on_snapshot_received(&mut self, snapshot: &Snapshot) -> Result<(), SessionError> {
        let Some(inbound) = self.dispatcher.route(snapshot)? else {
            return Ok(());
        };
        match inbound {
            Inbound::Lobby(record) => self.apply_lobby(record),
            Inbound::Turn(cursor) => {
                self.turn.apply_snapshot(cursor, self.seats.len())?;
                self.refresh_turn();
                Ok(())
            }
            Inbound::Seat { index, record } => self.apply_seat(index, record),
        }
    }

    /// Handles a fan-out event from another participant.
    ///
    /// Fan-out events are advisory. The lobby record alone decides whether
    /// a game is running, and fan-out is not ordered against snapshots, so
    /// an event that disagrees with the local lobby copy is stale or early
    /// and changes nothing.
    #[instrument(skip(self), fields(session_id = %self.session_id()))]
    pub fn on_network_event(&mut self, message: NetworkMessage) {
        if message.session_id != self.session_id() {
            return;
        }
        match message.event {
            NetworkEvent::GameStarted if !self.lobby.game_started() => {
                debug!(sent_by = %message.sent_by, "game start announced ahead of lobby snapshot");
            }
            NetworkEvent::GameStarted => {}
            NetworkEvent::GameEnded if self.lobby.game_started() => {
                debug!(sent_by = %message.sent_by, "stale game end ignored");
            }
            NetworkEvent::GameEnded => {
                self.turn.end_round();
            }
        }
        self.refresh_turn();
    }

    /// Removes a participant who left the world. A running game always
    /// ends.
    ///
    /// The current lobby writer commits the removal. Everyone else applies
    /// the same compaction to its local copy and waits for the writer's
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns `OwnershipDenied` if this participant is the writer but the
    /// capability could not be issued, or `Snapshot` if the commit fails.
    #[instrument(skip(self), fields(session_id = %self.session_id()))]
    pub fn on_participant_disconnected(
        &mut self,
        participant: ParticipantId,
    ) -> Result<(), SessionError> {
        let preview = self.lobby.preview_departure(participant);
        if !preview.changed() {
            debug!(%participant, "departure does not affect this session");
            return Ok(());
        }
        let local = self.local();
        let lobby_id = self.lobby.object_id();

        let departure = if self.ports.substrate.is_owner(lobby_id) {
            let owned = self.acquire(lobby_id)?;
            let seats_owned = if preview.ended_game {
                self.acquire_used_seats()?
            } else {
                Vec::new()
            };
            let departure = self.lobby.remove_disconnected(&owned, participant, local)?;
            self.clear_seats(&seats_owned)?;
            self.commit_lobby(&owned)?;
            if departure.ended_game {
                self.broadcast(owned.participant(), NetworkEvent::GameEnded);
            }
            departure
        } else {
            self.lobby.project_departure(participant, local)
        };

        info!(
            %participant,
            vacated = ?departure.vacated,
            ended_game = departure.ended_game,
            "participant removed"
        );
        if departure.vacated.is_some() {
            self.publish_membership();
        }
        if departure.ended_game {
            self.turn.end_round();
            self.publish(SessionNotificationKind::GameStateChanged { started: false });
        }
        self.turn.repair_cursor(self.lobby.roster());
        self.sync_presence();
        self.refresh_turn();
        Ok(())
    }

    fn apply_lobby(&mut self, record: LobbyRecord) -> Result<(), SessionError> {
        let delta = self.lobby.apply_snapshot(record, self.local())?;
        let may_clear = self.ports.substrate.is_owner(self.lobby.object_id());
        let cue = self
            .dispatcher
            .consume_lobby_cue(self.lobby.cue_slot(), may_clear);

        if delta.roster_changed {
            self.publish_membership();
        }
        if delta.game_state_changed {
            let started = self.lobby.game_started();
            if !started {
                self.turn.end_round();
            }
            self.publish(SessionNotificationKind::GameStateChanged { started });
        }
        if let Some(code) = cue {
            self.publish_lobby_cue(code);
        }
        self.sync_presence();
        self.refresh_turn();
        Ok(())
    }

    fn apply_seat(&mut self, index: SeatIndex, record: SeatState) -> Result<(), SessionError> {
        self.ensure_seat(index)?;
        let seat = &mut self.seats[index];
        seat.apply_snapshot(record)?;
        let may_clear = self.ports.substrate.is_owner(seat.object_id);
        let cue = self
            .dispatcher
            .consume_seat_cue(index, seat.cue_slot(), may_clear);

        if let Some(code) = cue {
            if self.feedback_enabled() {
                self.publish_seat_cue(index, code);
            } else {
                debug!(seat = index, ?code, "seat cue suppressed for spectator");
            }
        }
        Ok(())
    }

    fn local(&self) -> Option<ParticipantId> {
        self.ports.identity.local_identity()
    }

    fn require_local(&self, object: ObjectId) -> Result<ParticipantId, SessionError> {
        self.local().ok_or(SessionError::OwnershipDenied {
            object,
            reason: DenialReason::NoLocalIdentity,
        })
    }

    fn acquire(&self, object: ObjectId) -> Result<Owned, SessionError> {
        OwnershipGate::new(&*self.ports.substrate, &*self.ports.identity)
            .acquire(object)
            .map_err(SessionError::from)
    }

    /// Capabilities for every seat whose dice still show a roll. Taken
    /// before any mutation so a refusal leaves the session unchanged.
    fn acquire_used_seats(&self) -> Result<Vec<(SeatIndex, Owned)>, SessionError> {
        self.seats
            .iter()
            .enumerate()
            .filter(|(_, seat)| !seat.is_clear())
            .map(|(index, seat)| self.acquire(seat.object_id).map(|owned| (index, owned)))
            .collect()
    }

    /// Returns the dice of the given seats to rest and commits them.
    fn clear_seats(&mut self, seats_owned: &[(SeatIndex, Owned)]) -> Result<(), SessionError> {
        for (index, owned) in seats_owned {
            self.seats[*index].clear_dice(owned)?;
            self.commit_seat(owned, *index)?;
        }
        if !seats_owned.is_empty() {
            debug!(cleared = seats_owned.len(), "seat dice cleared");
        }
        Ok(())
    }

    fn ensure_seat(&self, seat: SeatIndex) -> Result<(), SessionError> {
        if seat < self.seats.len() {
            Ok(())
        } else {
            Err(SessionError::SeatOutOfRange {
                index: seat,
                seat_count: self.seats.len(),
            })
        }
    }

    fn ensure_turn_holder(
        &self,
        seat: SeatIndex,
        participant: ParticipantId,
    ) -> Result<(), SessionError> {
        self.ensure_seat(seat)?;
        if !self.lobby.game_started() {
            return Err(SessionError::GameNotStarted);
        }
        let roster = self.lobby.roster();
        if roster.occupant(seat) != Some(participant) || !self.turn.is_active_turn(roster, seat) {
            return Err(SessionError::NotYourTurn(seat));
        }
        Ok(())
    }

    /// Event buttons: the turn holder, or anyone in debug mode.
    fn ensure_can_interact(
        &self,
        seat: SeatIndex,
        participant: ParticipantId,
    ) -> Result<(), SessionError> {
        if !self.config.debug_mode {
            return self.ensure_turn_holder(seat, participant);
        }
        self.ensure_seat(seat)?;
        if !self.lobby.game_started() {
            return Err(SessionError::GameNotStarted);
        }
        Ok(())
    }

    fn commit_lobby(&self, owned: &Owned) -> Result<(), SessionError> {
        let record = self.lobby.record();
        self.dispatcher
            .commit(&*self.ports.substrate, owned, record.revision, record)
    }

    fn commit_turn(&self, owned: &Owned) -> Result<(), SessionError> {
        let cursor = self.turn.cursor();
        self.dispatcher
            .commit(&*self.ports.substrate, owned, cursor.revision, cursor)
    }

    fn commit_seat(&self, owned: &Owned, seat: SeatIndex) -> Result<(), SessionError> {
        let record = &self.seats[seat];
        self.dispatcher
            .commit(&*self.ports.substrate, owned, record.revision(), record)
    }

    fn broadcast(&self, sent_by: ParticipantId, event: NetworkEvent) {
        self.ports.substrate.broadcast(NetworkMessage {
            session_id: self.session_id(),
            sent_by,
            event,
        });
    }

    fn feedback_enabled(&self) -> bool {
        self.lobby.local_joined() || self.config.spectator_feedback
    }

    fn sync_presence(&self) {
        self.presence.set_local_joined(self.lobby.local_joined());
        self.presence.set_game_started(self.lobby.game_started());
    }

    /// Repairs the cursor during a game and publishes `TurnChanged` if the
    /// turn summary differs from the last one published.
    ///
    /// Outside a game the roster may still be catching up with the cursor,
    /// so no repair happens there.
    fn refresh_turn(&mut self) {
        if self.lobby.game_started() && self.turn.repair_cursor(self.lobby.roster()) {
            debug!(active_index = self.turn.active_index(), "turn cursor repaired");
        }
        if !self.feedback_enabled() {
            return;
        }
        let summary = TurnSummary {
            active_index: self.turn.active_index(),
            reverse: self.turn.reverse(),
            notices: self.notices(),
        };
        if self.published_turn.as_ref() == Some(&summary) {
            return;
        }
        self.publish(SessionNotificationKind::TurnChanged {
            active_index: summary.active_index,
            reverse: summary.reverse,
            notices: summary.notices.clone(),
        });
        self.published_turn = Some(summary);
    }

    fn publish_membership(&self) {
        self.publish(SessionNotificationKind::MembershipChanged {
            seats: self.lobby.roster().as_slice().to_vec(),
        });
    }

    fn publish_lobby_cue(&self, code: LobbyCue) {
        self.publish(SessionNotificationKind::Cue {
            source: CueSource::Lobby,
            code: CueCode::Lobby(code),
        });
    }

    fn publish_seat_cue(&self, seat: SeatIndex, code: SeatCue) {
        self.publish(SessionNotificationKind::Cue {
            source: CueSource::Seat(seat),
            code: CueCode::Seat(code),
        });
    }

    fn publish(&self, kind: SessionNotificationKind) {
        let metadata = NotificationMetadata::new(
            self.session_id(),
            kind.notification_type(),
            &*self.ports.clock,
        );
        self.ports.sink.publish(SessionNotification { metadata, kind });
    }
}
