//! Session orchestration: actions, replication plumbing and read models.

pub mod actions;
pub mod coordinator;
pub mod sync_dispatcher;
pub mod views;
