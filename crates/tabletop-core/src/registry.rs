//! Cross-session registry.
//!
//! Several sessions can coexist in one world. A participant may only be a
//! member of one of them at a time, so each session publishes its local
//! membership flag here and consults the others before joining.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Local view of one session, shared with the registry.
#[derive(Debug, Default)]
pub struct SessionPresence {
    local_joined: AtomicBool,
    game_started: AtomicBool,
}

impl SessionPresence {
    /// Whether the local participant holds a seat in this session.
    #[must_use]
    pub fn local_joined(&self) -> bool {
        self.local_joined.load(Ordering::Acquire)
    }

    /// Records the local membership flag.
    pub fn set_local_joined(&self, joined: bool) {
        self.local_joined.store(joined, Ordering::Release);
    }

    /// Whether this session has a game running, as last observed locally.
    #[must_use]
    pub fn game_started(&self) -> bool {
        self.game_started.load(Ordering::Acquire)
    }

    /// Records the locally observed game state.
    pub fn set_game_started(&self, started: bool) {
        self.game_started.store(started, Ordering::Release);
    }
}

/// Registry of sibling sessions.
pub trait SessionRegistry: Send + Sync {
    /// Registers a session and returns the presence handle it must update.
    fn register(&self) -> Arc<SessionPresence>;

    /// Whether the local participant is joined to any registered session.
    fn any_session_has_local_member(&self) -> bool;

    /// Whether any registered session has a game running.
    fn any_game_started(&self) -> bool;
}

/// In-process registry.
#[derive(Debug, Default)]
pub struct LocalSessionRegistry {
    sessions: Mutex<Vec<Arc<SessionPresence>>>,
}

impl LocalSessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn any(&self, predicate: impl Fn(&SessionPresence) -> bool) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|presence| predicate(presence))
    }
}

impl SessionRegistry for LocalSessionRegistry {
    fn register(&self) -> Arc<SessionPresence> {
        let presence = Arc::new(SessionPresence::default());
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::clone(&presence));
        presence
    }

    fn any_session_has_local_member(&self) -> bool {
        self.any(SessionPresence::local_joined)
    }

    fn any_game_started(&self) -> bool {
        self.any(SessionPresence::game_started)
    }
}
