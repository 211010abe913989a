//! Playback Events
//!
//! Event-based communication for UI synchronization during playback.
//! Events are emitted at key points:
//! - State changes (idle/paused/playing)
//! - Track changes (every load, including automatic advance)
//! - Queue, shuffle, repeat and volume changes
//! - Position and duration updates reported by the device
//! - Failures the engine recovered from

use serde::{Deserialize, Serialize};

use crate::error::PlaybackError;
use crate::types::{PlaybackState, RepeatMode};

/// Events emitted by the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Playback state changed
    StateChanged {
        /// The new playback state
        state: PlaybackState,
    },

    /// A track was loaded
    TrackChanged {
        /// ID of the new (current) track
        track_id: String,
        /// ID of the previously loaded track (if any)
        previous_track_id: Option<String>,
        /// Absolute queue index of the new track
        index: usize,
    },

    /// Current track restarted because of a repeat mode
    TrackRepeated {
        /// ID of the repeated track
        track_id: String,
    },

    /// Position update
    PositionUpdate {
        /// Current playback position in seconds
        position_secs: f64,
        /// Total track duration in seconds (0 if unknown)
        duration_secs: f64,
    },

    /// Device reported the real duration of the current track
    DurationChanged {
        /// Duration in seconds
        duration_secs: f64,
    },

    /// Volume changed
    VolumeChanged {
        /// New volume (0.0-1.0)
        volume: f32,
    },

    /// Queue changed (replaced or extended)
    QueueChanged {
        /// New queue length
        length: usize,
    },

    /// Shuffle toggled
    ShuffleChanged {
        enabled: bool,
    },

    /// Repeat mode changed
    RepeatChanged {
        mode: RepeatMode,
    },

    /// A failure the engine recovered from
    Failure {
        error: PlaybackError,
    },
}

impl PlaybackEvent {
    /// Whether this event reports a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, PlaybackEvent::Failure { .. })
    }
}
