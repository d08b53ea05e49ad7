//! Recording notification sink.

use std::sync::Mutex;

use tabletop_core::notification::NotificationSink;

/// A sink that keeps every published notification for later assertions.
#[derive(Debug)]
pub struct RecordingSink<N> {
    published: Mutex<Vec<N>>,
}

impl<N> Default for RecordingSink<N> {
    fn default() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
        }
    }
}

impl<N: Clone> RecordingSink<N> {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything published so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn published(&self) -> Vec<N> {
        self.published.lock().unwrap().clone()
    }

    /// Removes and returns everything published so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn take(&self) -> Vec<N> {
        std::mem::take(&mut *self.published.lock().unwrap())
    }
}

impl<N: Send> NotificationSink<N> for RecordingSink<N> {
    fn publish(&self, notification: N) {
        self.published.lock().unwrap().push(notification);
    }
}
