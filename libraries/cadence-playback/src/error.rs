//! Error types for playback management

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Playback errors
///
/// None of these are fatal to the engine. They are reported through
/// [`PlaybackEvent::Failure`](crate::PlaybackEvent::Failure) after the
/// engine has already moved to a safe state.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum PlaybackError {
    /// Track carries no usable audio URL and was dropped from the playable set
    #[error("Track {track_id:?} has no audio source")]
    MissingAudioSource {
        /// Identifier of the rejected track (may be empty)
        track_id: String,
    },

    /// Device could not load or decode the media
    #[error("Failed to load track {track_id}: {reason}")]
    DeviceLoad {
        /// Track that failed
        track_id: String,
        /// Device-provided reason
        reason: String,
    },

    /// Device refused a programmatic `play()`
    #[error("Playback of track {track_id} was blocked: {reason}")]
    AutoplayBlocked {
        /// Track that was about to play
        track_id: String,
        /// Device-provided reason
        reason: String,
    },

    /// Every track in the queue failed in a row
    #[error("All {count} queued tracks failed to play")]
    QueueExhausted {
        /// Number of consecutive failures
        count: usize,
    },
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Errors a [`PlaybackDevice`](crate::PlaybackDevice) may return from a command
///
/// The engine never propagates these; it converts them into a
/// [`PlaybackError`] and moves to a safe state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// Runtime refused to start playback (e.g. autoplay policy)
    #[error("Play rejected: {0}")]
    PlayRejected(String),

    /// Media could not be loaded
    #[error("Load failed: {0}")]
    Load(String),

    /// Output is gone or not ready
    #[error("Device unavailable: {0}")]
    Unavailable(String),
}
