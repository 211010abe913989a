//! Cadence - Playback Engine
//!
//! Platform-agnostic queue and playback state machine for Cadence.
//!
//! This crate provides:
//! - Track normalization (provider and player track shapes)
//! - Shuffle order generation (Fisher-Yates permutations)
//! - Queue state with wrap-around navigation
//! - Repeat modes (Off, Once, Forever)
//! - Playback engine driving an abstract output device
//!
//! # Architecture
//!
//! `cadence-playback` is completely platform-agnostic:
//! - No async runtime
//! - No HTTP client
//! - No real audio output
//!
//! The audio output is provided via the [`PlaybackDevice`] trait. The engine
//! issues commands to the device, and the owner feeds the device's events
//! back in with [`PlaybackEngine::handle_device_event`].
//!
//! # Example: Basic Playback
//!
//! ```rust
//! use cadence_playback::{
//!     DeviceError, LoadToken, PlaybackConfig, PlaybackDevice, PlaybackEngine, PlaybackState,
//!     Track,
//! };
//!
//! struct NullDevice;
//!
//! impl PlaybackDevice for NullDevice {
//!     fn load(&mut self, _token: &LoadToken, _url: &str) -> Result<(), DeviceError> {
//!         Ok(())
//!     }
//!     fn play(&mut self) -> Result<(), DeviceError> {
//!         Ok(())
//!     }
//!     fn pause(&mut self) -> Result<(), DeviceError> {
//!         Ok(())
//!     }
//!     fn seek(&mut self, _seconds: f64) -> Result<(), DeviceError> {
//!         Ok(())
//!     }
//!     fn set_volume(&mut self, _volume: f32) -> Result<(), DeviceError> {
//!         Ok(())
//!     }
//! }
//!
//! let mut engine = PlaybackEngine::new(NullDevice, PlaybackConfig::default());
//!
//! let track = Track {
//!     id: "track1".to_string(),
//!     title: "My Song".to_string(),
//!     artist_name: "Artist Name".to_string(),
//!     album_name: "Album Name".to_string(),
//!     duration_seconds: 0.0,
//!     audio_url: "https://cdn.example.com/track1.mp3".to_string(),
//!     image_url: None,
//! };
//!
//! engine.set_queue(vec![track], 0);
//! assert_eq!(engine.state(), PlaybackState::Playing);
//!
//! engine.toggle_play_pause();
//! assert_eq!(engine.state(), PlaybackState::Paused);
//! ```
//!
//! # Example: Mixed Track Shapes
//!
//! ```rust
//! use cadence_playback::{normalize, RawTrack};
//!
//! let provider: RawTrack =
//!     serde_json::from_str(r#"{"_id":"a1","title":"X","url":"http://x"}"#).unwrap();
//! let player: RawTrack =
//!     serde_json::from_str(r#"{"id":"a1","name":"X","audio":"http://x"}"#).unwrap();
//!
//! assert_eq!(normalize(provider).unwrap(), normalize(player).unwrap());
//! ```

mod device;
mod engine;
mod error;
mod events;
mod normalize;
mod queue;
pub mod shuffle;
pub mod types;

// Public exports
pub use device::{DeviceEvent, DeviceEventKind, LoadToken, PlaybackDevice};
pub use engine::PlaybackEngine;
pub use error::{DeviceError, PlaybackError, Result};
pub use events::PlaybackEvent;
pub use normalize::{normalize, normalize_all};
pub use queue::Queue;
pub use types::{
    Direction, EngineSnapshot, PlaybackConfig, PlaybackState, PlayerTrack, ProviderTrack,
    RawTrack, RepeatMode, Track,
};
