//! Outbound notification abstractions.
//!
//! The session engine never drives presentation directly. It raises
//! notifications that UI, audio and dialog collaborators consume.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::ids::ObjectId;

/// Abstraction over system time so notification timestamps are testable.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock that reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Metadata attached to every notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationMetadata {
    /// Unique, time-ordered notification identifier.
    pub notification_id: Uuid,
    /// Type name, e.g. `lobby.turn_changed`.
    pub notification_type: &'static str,
    /// The session (lobby object) that raised it.
    pub session_id: ObjectId,
    /// When it was raised on this participant.
    pub occurred_at: DateTime<Utc>,
}

impl NotificationMetadata {
    /// Stamps a new notification of the given type.
    #[must_use]
    pub fn new(session_id: ObjectId, notification_type: &'static str, clock: &dyn Clock) -> Self {
        Self {
            notification_id: Uuid::now_v7(),
            notification_type,
            session_id,
            occurred_at: clock.now(),
        }
    }
}

/// Trait that all outbound notifications implement.
pub trait Notification: Send + Sync + std::fmt::Debug {
    /// Returns the notification type name (used for logging and routing).
    fn notification_type(&self) -> &'static str;

    /// Returns the metadata for this notification.
    fn metadata(&self) -> &NotificationMetadata;
}

/// Consumer of outbound notifications (UI, audio, dialog collaborators).
pub trait NotificationSink<N>: Send + Sync {
    /// Delivers one notification.
    fn publish(&self, notification: N);
}
