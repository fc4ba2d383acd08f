// SPDX-License-Identifier: MPL-2.0
//! Playback state machine.
//!
//! The state is a plain tagged enum; transitions are decided in one place
//! ([`PlaybackEngine`](crate::player::PlaybackEngine)'s command methods) by
//! matching on it. Commands that do not appear in the transition table for
//! the current state are silent no-ops; the command surface is always safe
//! to call, never an error.

/// Represents the current playback state of the engine.
///
/// ```text
/// Stopped --play(t)--> Playing     (acquire pair, seek, start worker)
/// Playing --pause()--> Paused      (worker idles; no frame advance)
/// Paused --resume()--> Playing     (continue from the same position)
/// Paused --play(t)--> Playing      (fresh session; full teardown first)
/// {Playing, Paused} --stop()--> Stopped   (release pair, join worker)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    /// No playback session. Initial state, and where every session ends.
    #[default]
    Stopped,
    /// A decode worker is live and advancing frames.
    Playing,
    /// The worker is live but idling; position is held.
    Paused,
}

impl PlayerState {
    #[must_use]
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }

    #[must_use]
    pub fn is_paused(self) -> bool {
        matches!(self, Self::Paused)
    }

    #[must_use]
    pub fn is_stopped(self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Returns true while a decode worker owns a live decoder pair.
    #[must_use]
    pub fn has_session(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_stopped() {
        assert_eq!(PlayerState::default(), PlayerState::Stopped);
    }

    #[test]
    fn state_checks() {
        assert!(PlayerState::Playing.is_playing());
        assert!(!PlayerState::Paused.is_playing());

        assert!(PlayerState::Paused.is_paused());
        assert!(!PlayerState::Stopped.is_paused());

        assert!(PlayerState::Stopped.is_stopped());
        assert!(!PlayerState::Playing.is_stopped());
    }

    #[test]
    fn session_states() {
        assert!(PlayerState::Playing.has_session());
        assert!(PlayerState::Paused.has_session());
        assert!(!PlayerState::Stopped.has_session());
    }
}
