//! Platform-agnostic playback device trait
//!
//! Abstracts the audio output the engine drives (a browser media element,
//! a native player, or a simulated device in tests). Commands are
//! fire-and-forget; results come back later as [`DeviceEvent`]s which the
//! owner feeds into [`PlaybackEngine::handle_device_event`].
//!
//! [`PlaybackEngine::handle_device_event`]: crate::PlaybackEngine::handle_device_event

use crate::error::DeviceError;
use serde::{Deserialize, Serialize};

/// Identifies one load of one track
///
/// A new token is issued for every load, including a reload of the same
/// track, so events from an earlier load can never be mistaken for the
/// current one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadToken {
    generation: u64,
    track_id: String,
}

impl LoadToken {
    /// Create a token for the given load generation and track
    pub fn new(generation: u64, track_id: impl Into<String>) -> Self {
        Self {
            generation,
            track_id: track_id.into(),
        }
    }

    /// Monotonic load counter
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Track this load belongs to
    pub fn track_id(&self) -> &str {
        &self.track_id
    }
}

/// Event reported by a device for a specific load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEvent {
    /// Load the event originates from
    pub token: LoadToken,

    /// What happened
    pub kind: DeviceEventKind,
}

impl DeviceEvent {
    pub fn new(token: LoadToken, kind: DeviceEventKind) -> Self {
        Self { token, kind }
    }
}

/// Kinds of device events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeviceEventKind {
    /// Playback position in seconds
    TimeUpdate(f64),

    /// Media metadata loaded; total length in seconds
    DurationKnown(f64),

    /// Reached the end of the media
    Ended,

    /// Media failed to load or decode
    Error(String),

    /// Output actually started
    Started,

    /// Output actually paused
    Paused,

    /// An earlier `play()` was refused asynchronously
    PlayRejected(String),
}

/// Audio output driven by the engine
///
/// Exactly one engine owns a device; nothing else calls these methods.
/// A synchronous `Err` means the command was not accepted at all. Failures
/// discovered later are reported as [`DeviceEventKind::Error`] or
/// [`DeviceEventKind::PlayRejected`] tagged with the load's token.
pub trait PlaybackDevice {
    /// Replace the current media with `url`
    ///
    /// All events for this media must carry `token`.
    fn load(&mut self, token: &LoadToken, url: &str) -> Result<(), DeviceError>;

    /// Start or resume output
    fn play(&mut self) -> Result<(), DeviceError>;

    /// Pause output
    fn pause(&mut self) -> Result<(), DeviceError>;

    /// Move to `seconds` from the start
    fn seek(&mut self, seconds: f64) -> Result<(), DeviceError>;

    /// Set output volume in `[0, 1]`
    fn set_volume(&mut self, volume: f32) -> Result<(), DeviceError>;
}

impl<D: PlaybackDevice + ?Sized> PlaybackDevice for Box<D> {
    fn load(&mut self, token: &LoadToken, url: &str) -> Result<(), DeviceError> {
        (**self).load(token, url)
    }

    fn play(&mut self) -> Result<(), DeviceError> {
        (**self).play()
    }

    fn pause(&mut self) -> Result<(), DeviceError> {
        (**self).pause()
    }

    fn seek(&mut self, seconds: f64) -> Result<(), DeviceError> {
        (**self).seek(seconds)
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), DeviceError> {
        (**self).set_volume(volume)
    }
}

/// Device call as seen by [`RecordingDevice`]
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    Load(LoadToken, String),
    Play,
    Pause,
    Seek(f64),
    SetVolume(f32),
}

/// Device that records every call for assertions
///
/// `reject_play` makes `play()` fail; `fail_loads_for` makes `load()` fail
/// for URLs containing any of the listed fragments.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingDevice {
    pub calls: Vec<DeviceCall>,
    pub reject_play: bool,
    pub fail_loads_for: Vec<String>,
}

#[cfg(test)]
impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token passed to the most recent load
    pub fn last_token(&self) -> Option<LoadToken> {
        self.calls.iter().rev().find_map(|call| match call {
            DeviceCall::Load(token, _) => Some(token.clone()),
            _ => None,
        })
    }

    pub fn loads(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DeviceCall::Load(_, url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
impl PlaybackDevice for RecordingDevice {
    fn load(&mut self, token: &LoadToken, url: &str) -> Result<(), DeviceError> {
        self.calls.push(DeviceCall::Load(token.clone(), url.to_string()));
        if self.fail_loads_for.iter().any(|f| url.contains(f.as_str())) {
            return Err(DeviceError::Load(format!("cannot open {}", url)));
        }
        Ok(())
    }

    fn play(&mut self) -> Result<(), DeviceError> {
        self.calls.push(DeviceCall::Play);
        if self.reject_play {
            return Err(DeviceError::PlayRejected("autoplay not allowed".to_string()));
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<(), DeviceError> {
        self.calls.push(DeviceCall::Pause);
        Ok(())
    }

    fn seek(&mut self, seconds: f64) -> Result<(), DeviceError> {
        self.calls.push(DeviceCall::Seek(seconds));
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), DeviceError> {
        self.calls.push(DeviceCall::SetVolume(volume));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_differ_per_generation() {
        let a = LoadToken::new(1, "t1");
        let b = LoadToken::new(2, "t1");
        assert_ne!(a, b);
        assert_eq!(a.track_id(), b.track_id());
    }

    #[test]
    fn boxed_device_forwards_calls() {
        let mut device: Box<RecordingDevice> = Box::new(RecordingDevice::new());
        let token = LoadToken::new(1, "t1");

        PlaybackDevice::load(&mut device, &token, "https://x/1.mp3").unwrap();
        PlaybackDevice::play(&mut device).unwrap();

        assert_eq!(
            device.calls,
            vec![
                DeviceCall::Load(token, "https://x/1.mp3".to_string()),
                DeviceCall::Play
            ]
        );
    }
}
