//! Core types for playback management

use serde::{Deserialize, Serialize};

/// Canonical track consumed by the queue and engine
///
/// Produced by [`normalize`](crate::normalize) from either backend shape.
/// `duration_seconds` is only authoritative once the device has reported
/// metadata; until then it holds whatever the provider claimed (often 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Stable unique identifier
    pub id: String,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist_name: String,

    /// Album name
    pub album_name: String,

    /// Track duration in seconds
    pub duration_seconds: f64,

    /// Playable media URL
    pub audio_url: String,

    /// Artwork URL
    pub image_url: Option<String>,
}

/// Track as stored and listed by the track API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderTrack {
    #[serde(rename = "_id")]
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub artist_name: String,

    #[serde(default)]
    pub album_name: String,

    #[serde(default)]
    pub duration: f64,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub public_id: Option<String>,

    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub genre: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// ISO-8601 creation timestamp
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,

    #[serde(default, rename = "updatedAt")]
    pub updated_at: Option<String>,
}

/// Track in the shape the player UI passes around
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerTrack {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub artist_name: String,

    #[serde(default)]
    pub album_name: String,

    #[serde(default)]
    pub duration: f64,

    #[serde(default)]
    pub audio: Option<String>,

    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub album_image: Option<String>,
}

/// Either track shape, as it arrives from a caller
///
/// Deserializes untagged: anything with `_id` + `title` is a provider
/// track, anything with `id` + `name` is a player track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTrack {
    /// Backend shape (`_id`, `title`, `url`)
    Provider(ProviderTrack),

    /// Player shape (`id`, `name`, `audio`)
    Player(PlayerTrack),
}

impl From<ProviderTrack> for RawTrack {
    fn from(track: ProviderTrack) -> Self {
        RawTrack::Provider(track)
    }
}

impl From<PlayerTrack> for RawTrack {
    fn from(track: PlayerTrack) -> Self {
        RawTrack::Player(track)
    }
}

/// Engine playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No track loaded
    Idle,

    /// Track loaded, not playing
    Paused,

    /// Track loaded and playing
    Playing,
}

impl PlaybackState {
    /// Whether a track is loaded
    pub fn is_loaded(self) -> bool {
        !matches!(self, PlaybackState::Idle)
    }
}

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Advance after each track
    #[default]
    #[serde(rename = "none")]
    Off,

    /// Play the current track one extra time, then advance
    Once,

    /// Loop the current track until the mode changes
    Forever,
}

impl RepeatMode {
    /// Next mode in the Off -> Once -> Forever -> Off rotation
    pub fn cycled(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::Once,
            RepeatMode::Once => RepeatMode::Forever,
            RepeatMode::Forever => RepeatMode::Off,
        }
    }
}

/// Queue navigation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Next,
    Previous,
}

/// Read-only view of engine and queue state for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub state: PlaybackState,
    pub current_track: Option<Track>,
    pub current_index: Option<usize>,
    pub is_playing: bool,
    pub current_time_secs: f64,
    pub duration_secs: f64,
    pub volume: f32,
    pub shuffle_enabled: bool,
    pub repeat_mode: RepeatMode,
    pub queue_len: usize,
}

/// Configuration for the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Initial volume (0.0-1.0, default: 0.7)
    pub volume: f32,

    /// Initial shuffle flag (default: false)
    pub shuffle: bool,

    /// Initial repeat mode (default: Off)
    pub repeat: RepeatMode,

    /// Position after which "previous" restarts the current track (default: 3s)
    pub restart_threshold_secs: f64,

    /// Start playing as soon as a queue is set (default: true)
    pub autoplay_on_queue: bool,

    /// Rewrite `http://` media URLs to `https://` before loading (default: false)
    pub upgrade_insecure_urls: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 0.7,
            shuffle: false,
            repeat: RepeatMode::Off,
            restart_threshold_secs: 3.0,
            autoplay_on_queue: true,
            upgrade_insecure_urls: false,
        }
    }
}
