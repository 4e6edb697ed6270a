//! State machine for the holdtype daemon
//!
//! Defines the states for the hold-to-record workflow:
//! Idle → Recording → Processing → Idle

use std::time::Instant;

/// Application state
#[derive(Debug, Clone)]
pub enum State {
    /// Waiting for the trigger key
    Idle,

    /// Trigger key held, recording audio
    Recording {
        /// When recording started
        started_at: Instant,
    },

    /// Trigger key released, pipeline running (save → validate →
    /// transcribe → insert) on a worker task
    Processing,
}

impl State {
    /// Create a new idle state
    pub fn new() -> Self {
        State::Idle
    }

    /// Check if in idle state
    pub fn is_idle(&self) -> bool {
        matches!(self, State::Idle)
    }

    /// Check if in recording state
    pub fn is_recording(&self) -> bool {
        matches!(self, State::Recording { .. })
    }

    /// Get recording duration if currently recording
    pub fn recording_duration(&self) -> Option<std::time::Duration> {
        match self {
            State::Recording { started_at } => Some(started_at.elapsed()),
            _ => None,
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            State::Idle => write!(f, "Idle"),
            State::Recording { started_at } => {
                write!(f, "Recording ({:.1}s)", started_at.elapsed().as_secs_f32())
            }
            State::Processing => write!(f, "Processing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_idle() {
        let state = State::new();
        assert!(state.is_idle());
        assert!(!state.is_recording());
    }

    #[test]
    fn test_recording_state() {
        let state = State::Recording {
            started_at: Instant::now(),
        };
        assert!(state.is_recording());
        assert!(!state.is_idle());
        assert!(state.recording_duration().is_some());
    }

    #[test]
    fn test_idle_has_no_duration() {
        assert!(State::Idle.recording_duration().is_none());
        assert!(State::Processing.recording_duration().is_none());
    }

    #[test]
    fn test_processing_is_neither_idle_nor_recording() {
        let state = State::Processing;
        assert!(!state.is_idle());
        assert!(!state.is_recording());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(format!("{}", State::Idle), "Idle");
        assert_eq!(format!("{}", State::Processing), "Processing");

        let state = State::Recording {
            started_at: Instant::now(),
        };
        assert!(format!("{}", state).starts_with("Recording"));
    }
}
