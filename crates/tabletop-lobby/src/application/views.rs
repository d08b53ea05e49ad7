//! Read models for presentation collaborators.

use serde::Serialize;
use tabletop_core::error::SessionError;
use tabletop_core::ids::ParticipantId;
use tabletop_core::replication::IdentitySource;

use crate::domain::lobby::LobbyMembership;
use crate::domain::seat_state::SeatState;
use crate::domain::seats::{SeatArena, SeatIndex};
use crate::domain::turn::{NoticeClass, TurnEngine, derive_notice};

/// Which lobby buttons the local participant may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LobbyControls {
    /// Not joined, no game: may join.
    Waiting,
    /// Joined, no game: may leave or start.
    Ready,
    /// Joined, game running: may reset.
    Playing,
    /// Not joined, game running: nothing to do.
    Disabled,
}

impl LobbyControls {
    /// Derives the control state from the local flags.
    #[must_use]
    pub fn derive(local_joined: bool, game_started: bool) -> Self {
        match (local_joined, game_started) {
            (false, false) => Self::Waiting,
            (true, false) => Self::Ready,
            (true, true) => Self::Playing,
            (false, true) => Self::Disabled,
        }
    }

    #[must_use]
    pub fn can_join(self) -> bool {
        self == Self::Waiting
    }

    #[must_use]
    pub fn can_leave(self) -> bool {
        self == Self::Ready
    }

    #[must_use]
    pub fn can_start(self) -> bool {
        self == Self::Ready
    }

    #[must_use]
    pub fn can_reset(self) -> bool {
        self == Self::Playing
    }
}

/// One seat as the local participant sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatView {
    /// Seat index.
    pub index: SeatIndex,
    /// Participant in the seat.
    pub occupant: Option<ParticipantId>,
    /// Display name; `None` for empty seats and participants who have left.
    pub display_name: Option<String>,
    /// Last rolled value, 0 when none.
    pub dice_result: u32,
    /// Dice are in the air.
    pub rolling: bool,
    /// Turn relevance for the local viewer.
    pub notice: NoticeClass,
    /// The seat holds the turn in a running game.
    pub is_active_turn: bool,
    /// The local participant may press this seat's buttons.
    pub interactable: bool,
}

/// The whole session as the local participant sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LobbyView {
    /// Every seat in order.
    pub seats: Vec<SeatView>,
    /// A game is running.
    pub game_started: bool,
    /// Seat whose turn it is.
    pub active_index: SeatIndex,
    /// Rotation runs backwards.
    pub reverse: bool,
    /// The local participant holds a seat.
    pub local_joined: bool,
    /// Lobby button state.
    pub controls: LobbyControls,
}

/// Whether the local participant may press a seat's buttons: it is the
/// local participant's seat and turn, or debug mode is on. Never outside a
/// running game.
#[must_use]
pub fn seat_interactable(
    game_started: bool,
    is_active_turn: bool,
    is_local_seat: bool,
    debug_mode: bool,
) -> bool {
    game_started && (debug_mode || (is_active_turn && is_local_seat))
}

/// Display name of the occupant of `seat`.
///
/// # Errors
///
/// Returns `SessionError::StaleReference` if the occupant no longer
/// resolves, i.e. the participant has left but the roster still lists it.
pub fn resolve_occupant(
    identity: &dyn IdentitySource,
    roster: &SeatArena,
    seat: SeatIndex,
) -> Result<Option<String>, SessionError> {
    match roster.occupant(seat) {
        None => Ok(None),
        Some(participant) => identity
            .resolve(participant)
            .map(Some)
            .ok_or(SessionError::StaleReference(participant)),
    }
}

pub(crate) fn build_lobby_view(
    lobby: &LobbyMembership,
    turn: &TurnEngine,
    seats: &[SeatState],
    identity: &dyn IdentitySource,
    debug_mode: bool,
) -> LobbyView {
    let local = identity.local_identity();
    let roster = lobby.roster();
    let game_started = lobby.game_started();
    let seat_views = seats
        .iter()
        .enumerate()
        .map(|(index, seat)| {
            let occupant = roster.occupant(index);
            let is_active_turn = game_started && turn.is_active_turn(roster, index);
            let is_local_seat = occupant.is_some() && occupant == local;
            SeatView {
                index,
                occupant,
                display_name: resolve_occupant(identity, roster, index).ok().flatten(),
                dice_result: seat.dice_result(),
                rolling: seat.is_rolling(),
                notice: derive_notice(game_started, roster, turn.active_index(), local, index),
                is_active_turn,
                interactable: seat_interactable(
                    game_started,
                    is_active_turn,
                    is_local_seat,
                    debug_mode,
                ),
            }
        })
        .collect();

    LobbyView {
        seats: seat_views,
        game_started,
        active_index: turn.active_index(),
        reverse: turn.reverse(),
        local_joined: lobby.local_joined(),
        controls: LobbyControls::derive(lobby.local_joined(), game_started),
    }
}
