//! Tabletop Core: shared replication abstractions.
//!
//! This crate defines the identifiers, errors and substrate traits that the
//! session engine is written against. It contains no session logic.

pub mod error;
pub mod ids;
pub mod notification;
pub mod ownership;
pub mod registry;
pub mod replication;
pub mod rng;
