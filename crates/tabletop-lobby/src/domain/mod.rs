//! Replicated records and the pure rules over them.

pub mod cues;
pub mod events;
pub mod layout;
pub mod lobby;
pub mod seat_state;
pub mod seats;
pub mod turn;
