//! Tabletop Lobby: a replicated turn-based session.
//!
//! Participants join a bounded set of seats, one seat at a time holds the
//! turn, the rotation can reverse, and one-shot cues (dice, events, lobby
//! sounds) reach every participant exactly once per emission. Each
//! participant runs its own copy of the session against a replication
//! substrate that delivers whole-object snapshots and allows one writer
//! per object.

pub mod application;
pub mod config;
pub mod domain;

pub use application::actions::{Action, ActionOutcome, Rejection};
pub use application::coordinator::{LobbyCoordinator, SessionPorts};
pub use config::SessionConfig;
pub use domain::events::{SessionNotification, SessionNotificationKind};
pub use domain::layout::SessionLayout;
