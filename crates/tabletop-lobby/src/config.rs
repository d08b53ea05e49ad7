//! Session configuration.

use serde::{Deserialize, Serialize};
use tabletop_core::error::SessionError;

/// Tunables of one session. Every participant must use the same values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Number of seats.
    pub seat_count: usize,
    /// Occupied seats required to start a game.
    pub min_players: usize,
    /// Faces of the die rolled by `RollDice`.
    pub dice_faces: u32,
    /// Lets any participant trigger seat events regardless of turn.
    pub debug_mode: bool,
    /// Whether participants who have not joined receive turn and seat
    /// notifications.
    pub spectator_feedback: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seat_count: 4,
            min_players: 2,
            dice_faces: 6,
            debug_mode: false,
            spectator_feedback: false,
        }
    }
}

impl SessionConfig {
    /// Parses and validates a YAML document. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Config` if the document does not parse or the
    /// values are inconsistent.
    pub fn from_yaml(source: &str) -> Result<Self, SessionError> {
        let config: Self = serde_yaml::from_str(source)
            .map_err(|e| SessionError::Config(format!("invalid session config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the values are usable.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Config` naming the first offending value.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.seat_count == 0 {
            return Err(SessionError::Config(
                "seat_count must be at least 1".to_string(),
            ));
        }
        if self.min_players == 0 || self.min_players > self.seat_count {
            return Err(SessionError::Config(format!(
                "min_players must be between 1 and {}, got {}",
                self.seat_count, self.min_players
            )));
        }
        if self.dice_faces < 2 {
            return Err(SessionError::Config(format!(
                "dice_faces must be at least 2, got {}",
                self.dice_faces
            )));
        }
        Ok(())
    }
}
