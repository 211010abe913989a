//! Playback engine - core orchestration
//!
//! Drives one [`PlaybackDevice`] from a [`Queue`]. Commands are applied
//! immediately and never fail; anything the device rejects is turned into a
//! [`PlaybackEvent::Failure`] after the engine has moved to a safe state
//! (paused for a refused `play()`, skip-forward for a broken track).
//!
//! ```text
//!            load(autoplay=false)            play() ok / Started
//!   Idle ───────────────────────▶ Paused ───────────────────────▶ Playing
//!    ▲                              ▲  ◀─────────────────────────── │
//!    │  empty queue / exhausted     │    pause() / Paused /         │
//!    └──────────────────────────────┴──  PlayRejected ──────────────┘
//! ```

use tracing::{debug, info, warn};
use url::Url;

use crate::device::{DeviceEvent, DeviceEventKind, LoadToken, PlaybackDevice};
use crate::error::{DeviceError, PlaybackError};
use crate::events::PlaybackEvent;
use crate::normalize::normalize_all;
use crate::queue::Queue;
use crate::types::{
    Direction, EngineSnapshot, PlaybackConfig, PlaybackState, RawTrack, RepeatMode, Track,
};

/// Playback engine
///
/// Owns the queue and the device. The owner feeds device events back
/// through [`handle_device_event`](Self::handle_device_event) and collects
/// observable changes with [`drain_events`](Self::drain_events).
pub struct PlaybackEngine<D: PlaybackDevice> {
    device: D,
    config: PlaybackConfig,
    queue: Queue,

    state: PlaybackState,

    // Token of the media currently loaded on the device
    load_token: Option<LoadToken>,
    generation: u64,

    current_time: f64,
    duration: f64,
    volume: f32,

    // Track that already got its extra play under RepeatMode::Once
    repeat_once_consumed_for: Option<String>,

    // Set on load, cleared once the device reports a duration
    metadata_pending: bool,

    // Failures since the last successful start
    consecutive_failures: usize,

    // Event queue for UI synchronization
    pending_events: Vec<PlaybackEvent>,
}

impl<D: PlaybackDevice> PlaybackEngine<D> {
    /// Create new engine around a device
    ///
    /// No device calls are made until a track is loaded.
    pub fn new(device: D, config: PlaybackConfig) -> Self {
        let volume = clamp_volume(config.volume).unwrap_or(0.7);

        Self {
            device,
            queue: Queue::with_modes(config.shuffle, config.repeat),
            config,
            state: PlaybackState::Idle,
            load_token: None,
            generation: 0,
            current_time: 0.0,
            duration: 0.0,
            volume,
            repeat_once_consumed_for: None,
            metadata_pending: false,
            consecutive_failures: 0,
            pending_events: Vec::new(),
        }
    }

    // ===== Queue Commands =====

    /// Replace the queue and load the track at `start_index`
    ///
    /// Starts playing when `autoplay_on_queue` is set. An empty list unloads
    /// the device and returns to idle.
    pub fn set_queue(&mut self, tracks: Vec<Track>, start_index: usize) {
        let current = self.queue.set_queue(tracks, start_index);
        info!(length = self.queue.len(), start = ?current, "Queue replaced");

        self.repeat_once_consumed_for = None;
        self.consecutive_failures = 0;
        self.emit_queue_changed();

        match current {
            Some(index) => self.load_index(index, self.config.autoplay_on_queue),
            None => self.unload(),
        }
    }

    /// Normalize a mixed list and queue the playable tracks
    ///
    /// Unplayable items are reported as failures. `start_index` refers to the
    /// raw list and moves to the first playable item at or after it.
    pub fn set_queue_from_raw(&mut self, raw: Vec<RawTrack>, start_index: usize) {
        let (accepted, rejected) = normalize_all(raw);

        for error in rejected {
            warn!(%error, "Dropping unplayable track");
            self.emit_failure(error);
        }

        let start = accepted
            .iter()
            .position(|(raw_index, _)| *raw_index >= start_index)
            .unwrap_or_else(|| accepted.len().saturating_sub(1));
        let tracks = accepted.into_iter().map(|(_, track)| track).collect();

        self.set_queue(tracks, start);
    }

    /// Play a single track
    ///
    /// Jumps to it if already queued; otherwise it becomes the head of the
    /// queue, followed by the previous contents.
    pub fn play_track(&mut self, track: Track) {
        if let Some(index) = self.queue.position_of(&track.id) {
            self.play_index(index);
            return;
        }

        let mut tracks = Vec::with_capacity(self.queue.len() + 1);
        tracks.push(track);
        tracks.extend(self.queue.tracks().iter().cloned());

        self.queue.set_queue(tracks, 0);
        self.repeat_once_consumed_for = None;
        self.consecutive_failures = 0;
        self.emit_queue_changed();
        self.load_index(0, true);
    }

    /// Jump to an absolute queue index and play it
    pub fn play_index(&mut self, index: usize) {
        if self.queue.select(index).is_none() {
            debug!(index, length = self.queue.len(), "Ignoring out-of-range index");
            return;
        }

        self.repeat_once_consumed_for = None;
        self.consecutive_failures = 0;
        self.load_index(index, true);
    }

    /// Append tracks to the queue without interrupting playback
    ///
    /// Returns how many tracks were added (already queued ids are skipped).
    /// Appending to an empty queue loads its first track paused.
    pub fn append_to_queue(&mut self, tracks: Vec<Track>) -> usize {
        let was_empty = self.queue.is_empty();
        let added = self.queue.extend(tracks);
        if added == 0 {
            return 0;
        }

        debug!(added, length = self.queue.len(), "Queue extended");
        self.emit_queue_changed();

        if was_empty {
            if let Some(index) = self.queue.current_index() {
                self.repeat_once_consumed_for = None;
                self.consecutive_failures = 0;
                self.load_index(index, false);
            }
        }
        added
    }

    // ===== Playback Control =====

    /// Toggle between playing and paused
    ///
    /// No-op while idle.
    pub fn toggle_play_pause(&mut self) {
        match self.state {
            PlaybackState::Idle => debug!("Toggle ignored, nothing loaded"),
            PlaybackState::Playing => self.pause_device(),
            PlaybackState::Paused => self.start_playback(),
        }
    }

    /// Skip to next track
    pub fn skip_next(&mut self) {
        let autoplay = self.state == PlaybackState::Playing;
        self.repeat_once_consumed_for = None;

        if let Some(index) = self.queue.advance(Direction::Next) {
            self.consecutive_failures = 0;
            self.load_index(index, autoplay);
        }
    }

    /// Go to previous track
    ///
    /// Past the restart threshold this restarts the current track instead.
    pub fn skip_previous(&mut self) {
        self.repeat_once_consumed_for = None;

        if self.state.is_loaded() && self.current_time > self.config.restart_threshold_secs {
            debug!(position = self.current_time, "Restarting current track");
            self.restart_current();
            return;
        }

        let autoplay = self.state == PlaybackState::Playing;
        if let Some(index) = self.queue.advance(Direction::Previous) {
            self.consecutive_failures = 0;
            self.load_index(index, autoplay);
        }
    }

    /// Seek within the current track
    ///
    /// Clamped to `[0, duration]` once the duration is known. No-op while idle.
    pub fn seek(&mut self, seconds: f64) {
        if !self.state.is_loaded() || !seconds.is_finite() {
            return;
        }

        let target = if self.duration > 0.0 {
            seconds.clamp(0.0, self.duration)
        } else {
            seconds.max(0.0)
        };

        if let Err(err) = self.device.seek(target) {
            warn!(error = %err, target, "Device rejected seek");
            return;
        }

        self.current_time = target;
        self.emit_position_update();
    }

    /// Set volume (0.0-1.0)
    ///
    /// Out-of-range values are clamped; non-finite values are ignored. While
    /// idle the value is kept and applied to the next loaded track.
    pub fn set_volume(&mut self, volume: f32) {
        let Some(volume) = clamp_volume(volume) else {
            return;
        };

        self.volume = volume;
        if self.state.is_loaded() {
            self.apply_volume();
        }
        self.pending_events
            .push(PlaybackEvent::VolumeChanged { volume });
    }

    /// Toggle shuffle, keeping the current track
    pub fn toggle_shuffle(&mut self) -> bool {
        let enabled = self.queue.toggle_shuffle();
        debug!(enabled, "Shuffle toggled");
        self.pending_events
            .push(PlaybackEvent::ShuffleChanged { enabled });
        enabled
    }

    /// Rotate repeat mode Off -> Once -> Forever -> Off
    pub fn cycle_repeat(&mut self) -> RepeatMode {
        let mode = self.queue.cycle_repeat();
        debug!(?mode, "Repeat mode changed");
        self.pending_events.push(PlaybackEvent::RepeatChanged { mode });
        mode
    }

    // ===== Device Events =====

    /// Apply an event reported by the device
    ///
    /// Events from any load other than the current one are discarded.
    pub fn handle_device_event(&mut self, event: DeviceEvent) {
        if self.load_token.as_ref() != Some(&event.token) {
            debug!(
                generation = event.token.generation(),
                track_id = event.token.track_id(),
                kind = ?event.kind,
                "Discarding stale device event"
            );
            return;
        }

        match event.kind {
            DeviceEventKind::TimeUpdate(seconds) => {
                if seconds.is_finite() {
                    self.current_time = seconds.max(0.0);
                    self.emit_position_update();
                }
            }
            DeviceEventKind::DurationKnown(seconds) => self.on_duration_known(seconds),
            DeviceEventKind::Ended => self.on_ended(),
            DeviceEventKind::Error(reason) => self.on_error(reason),
            DeviceEventKind::Started => {
                self.consecutive_failures = 0;
                self.set_state(PlaybackState::Playing);
            }
            DeviceEventKind::Paused => self.set_state(PlaybackState::Paused),
            DeviceEventKind::PlayRejected(reason) => self.on_play_rejected(reason),
        }
    }

    /// Treat a load that never reported metadata as a device error
    ///
    /// Returns `true` if the timeout applied, `false` if `token` is stale or
    /// the track already reported its duration.
    pub fn load_timed_out(&mut self, token: &LoadToken) -> bool {
        if self.load_token.as_ref() != Some(token) || !self.metadata_pending {
            return false;
        }

        warn!(track_id = token.track_id(), "Timed out waiting for track metadata");
        self.on_error("timed out waiting for metadata".to_string());
        true
    }

    // ===== State Queries =====

    /// Snapshot of engine and queue state
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            state: self.state,
            current_track: self.current_track().cloned(),
            current_index: self.queue.current_index(),
            is_playing: self.state == PlaybackState::Playing,
            current_time_secs: self.current_time,
            duration_secs: self.duration,
            volume: self.volume,
            shuffle_enabled: self.queue.shuffle_enabled(),
            repeat_mode: self.queue.repeat_mode(),
            queue_len: self.queue.len(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Track currently loaded on the device
    pub fn current_track(&self) -> Option<&Track> {
        if self.state.is_loaded() {
            self.queue.current()
        } else {
            None
        }
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Token of the current load, if any
    pub fn load_token(&self) -> Option<&LoadToken> {
        self.load_token.as_ref()
    }

    /// Track id that already consumed its repeat-once replay
    pub fn repeat_once_consumed_for(&self) -> Option<&str> {
        self.repeat_once_consumed_for.as_deref()
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    // ===== Events =====

    /// Drain all pending events
    ///
    /// Returns all events that have been emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Check if there are pending events
    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Internals =====

    /// Load `index`, skipping forward past tracks that fail synchronously
    fn load_index(&mut self, index: usize, autoplay: bool) {
        let mut index = index;

        loop {
            match self.try_load(index, autoplay) {
                Ok(()) => return,
                Err(error) => {
                    if !self.record_failure(error) {
                        return;
                    }
                    match self.queue.advance(Direction::Next) {
                        Some(next) => index = next,
                        None => {
                            self.unload();
                            return;
                        }
                    }
                }
            }
        }
    }

    fn try_load(&mut self, index: usize, autoplay: bool) -> Result<(), PlaybackError> {
        let Some(track) = self.queue.get(index).cloned() else {
            return Ok(());
        };

        let previous_track_id = self
            .load_token
            .as_ref()
            .map(|token| token.track_id().to_string());

        self.generation += 1;
        let token = LoadToken::new(self.generation, track.id.clone());
        self.load_token = Some(token.clone());
        self.current_time = 0.0;
        self.duration = track.duration_seconds;
        self.metadata_pending = true;

        info!(track_id = %track.id, index, autoplay, "Loading track");
        self.pending_events.push(PlaybackEvent::TrackChanged {
            track_id: track.id.clone(),
            previous_track_id,
            index,
        });

        let url = self
            .media_url(&track.audio_url)
            .map_err(|reason| PlaybackError::DeviceLoad {
                track_id: track.id.clone(),
                reason,
            })?;

        self.device
            .load(&token, url.as_str())
            .map_err(|err| PlaybackError::DeviceLoad {
                track_id: track.id.clone(),
                reason: err.to_string(),
            })?;

        self.apply_volume();

        if autoplay {
            self.start_playback();
        } else {
            self.set_state(PlaybackState::Paused);
        }

        Ok(())
    }

    fn media_url(&self, raw: &str) -> Result<Url, String> {
        let mut url = Url::parse(raw).map_err(|e| format!("invalid media URL {:?}: {}", raw, e))?;

        if self.config.upgrade_insecure_urls && url.scheme() == "http" {
            // http -> https is always a permitted scheme change
            let _ = url.set_scheme("https");
        }

        Ok(url)
    }

    /// Count a failure and report it
    ///
    /// Returns `false` once every queued track has failed in a row, after
    /// unloading the device.
    fn record_failure(&mut self, error: PlaybackError) -> bool {
        warn!(%error, "Track failed");
        self.emit_failure(error);
        self.consecutive_failures += 1;

        if self.consecutive_failures >= self.queue.len() {
            let count = self.consecutive_failures;
            warn!(count, "Every queued track failed, stopping");
            self.consecutive_failures = 0;
            self.emit_failure(PlaybackError::QueueExhausted { count });
            self.unload();
            return false;
        }

        true
    }

    fn start_playback(&mut self) {
        match self.device.play() {
            Ok(()) => self.set_state(PlaybackState::Playing),
            Err(err) => {
                let track_id = self.current_track_id();
                let error = match err {
                    DeviceError::PlayRejected(reason) => {
                        PlaybackError::AutoplayBlocked { track_id, reason }
                    }
                    other => PlaybackError::DeviceLoad {
                        track_id,
                        reason: other.to_string(),
                    },
                };
                warn!(%error, "Play failed, staying paused");
                self.emit_failure(error);
                self.set_state(PlaybackState::Paused);
            }
        }
    }

    fn pause_device(&mut self) {
        if let Err(err) = self.device.pause() {
            warn!(error = %err, "Device rejected pause");
        }
        self.set_state(PlaybackState::Paused);
    }

    fn restart_current(&mut self) {
        if let Err(err) = self.device.seek(0.0) {
            warn!(error = %err, "Device rejected restart seek");
        }
        self.current_time = 0.0;
        self.emit_position_update();
    }

    fn apply_volume(&mut self) {
        if let Err(err) = self.device.set_volume(self.volume) {
            warn!(error = %err, volume = self.volume, "Device rejected volume");
        }
    }

    /// Drop the current media and go idle
    fn unload(&mut self) {
        if !self.state.is_loaded() && self.load_token.is_none() {
            return;
        }

        if self.state == PlaybackState::Playing {
            if let Err(err) = self.device.pause() {
                warn!(error = %err, "Device rejected pause while unloading");
            }
        }

        self.load_token = None;
        self.metadata_pending = false;
        self.current_time = 0.0;
        self.duration = 0.0;
        self.repeat_once_consumed_for = None;
        self.set_state(PlaybackState::Idle);
    }

    fn on_duration_known(&mut self, seconds: f64) {
        self.metadata_pending = false;

        if !seconds.is_finite() || seconds <= 0.0 {
            return;
        }

        self.duration = seconds;
        if let Some(index) = self.queue.current_index() {
            self.queue.set_duration(index, seconds);
        }
        self.pending_events.push(PlaybackEvent::DurationChanged {
            duration_secs: seconds,
        });
    }

    fn on_ended(&mut self) {
        let track_id = self.current_track_id();

        match self.queue.repeat_mode() {
            RepeatMode::Forever => self.replay_current(track_id),
            RepeatMode::Once
                if self.repeat_once_consumed_for.as_deref() != Some(track_id.as_str()) =>
            {
                self.repeat_once_consumed_for = Some(track_id.clone());
                self.replay_current(track_id);
            }
            _ => {
                self.repeat_once_consumed_for = None;
                match self.queue.advance(Direction::Next) {
                    Some(index) => self.load_index(index, true),
                    None => self.unload(),
                }
            }
        }
    }

    fn replay_current(&mut self, track_id: String) {
        debug!(%track_id, "Repeating track");
        self.restart_current();
        self.pending_events
            .push(PlaybackEvent::TrackRepeated { track_id });
        self.start_playback();
    }

    fn on_error(&mut self, reason: String) {
        let error = PlaybackError::DeviceLoad {
            track_id: self.current_track_id(),
            reason,
        };

        if !self.record_failure(error) {
            return;
        }

        self.repeat_once_consumed_for = None;
        match self.queue.advance(Direction::Next) {
            Some(index) => self.load_index(index, true),
            None => self.unload(),
        }
    }

    fn on_play_rejected(&mut self, reason: String) {
        let error = PlaybackError::AutoplayBlocked {
            track_id: self.current_track_id(),
            reason,
        };
        warn!(%error, "Device refused playback");
        self.emit_failure(error);
        self.set_state(PlaybackState::Paused);
    }

    fn current_track_id(&self) -> String {
        self.load_token
            .as_ref()
            .map(|token| token.track_id().to_string())
            .unwrap_or_default()
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            self.state = state;
            self.pending_events
                .push(PlaybackEvent::StateChanged { state });
        }
    }

    /// Emit a position update event
    fn emit_position_update(&mut self) {
        self.pending_events.push(PlaybackEvent::PositionUpdate {
            position_secs: self.current_time,
            duration_secs: self.duration,
        });
    }

    /// Emit a queue changed event
    fn emit_queue_changed(&mut self) {
        self.pending_events.push(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
        });
    }

    /// Emit a failure event
    fn emit_failure(&mut self, error: PlaybackError) {
        self.pending_events.push(PlaybackEvent::Failure { error });
    }
}

fn clamp_volume(volume: f32) -> Option<f32> {
    volume.is_finite().then_some(volume.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceCall, RecordingDevice};

    fn track(id: &str) -> Track {
        Track {
            id: id.to_string(),
            title: format!("Track {}", id),
            artist_name: "Artist".to_string(),
            album_name: "Album".to_string(),
            duration_seconds: 0.0,
            audio_url: format!("https://cdn.example.com/{}.mp3", id),
            image_url: None,
        }
    }

    fn tracks(ids: &[&str]) -> Vec<Track> {
        ids.iter().map(|id| track(id)).collect()
    }

    fn engine() -> PlaybackEngine<RecordingDevice> {
        PlaybackEngine::new(RecordingDevice::new(), PlaybackConfig::default())
    }

    fn emit(engine: &mut PlaybackEngine<RecordingDevice>, kind: DeviceEventKind) {
        let token = engine.load_token().cloned().unwrap();
        engine.handle_device_event(DeviceEvent::new(token, kind));
    }

    #[test]
    fn new_engine_is_idle_with_default_volume() {
        let engine = engine();
        assert_eq!(engine.state(), PlaybackState::Idle);
        assert_eq!(engine.volume(), 0.7);
        assert!(engine.device().calls.is_empty());
    }

    #[test]
    fn set_queue_loads_applies_volume_and_plays() {
        let mut engine = engine();
        engine.set_queue(tracks(&["1", "2"]), 1);

        let token = engine.load_token().cloned().unwrap();
        assert_eq!(token.track_id(), "2");
        assert_eq!(
            engine.device().calls,
            vec![
                DeviceCall::Load(token, "https://cdn.example.com/2.mp3".to_string()),
                DeviceCall::SetVolume(0.7),
                DeviceCall::Play,
            ]
        );
        assert_eq!(engine.state(), PlaybackState::Playing);
    }

    #[test]
    fn set_queue_without_autoplay_stays_paused() {
        let config = PlaybackConfig {
            autoplay_on_queue: false,
            ..PlaybackConfig::default()
        };
        let mut engine = PlaybackEngine::new(RecordingDevice::new(), config);
        engine.set_queue(tracks(&["1"]), 0);

        assert_eq!(engine.state(), PlaybackState::Paused);
        assert!(!engine.device().calls.contains(&DeviceCall::Play));
    }

    #[test]
    fn empty_queue_on_loaded_engine_goes_idle() {
        let mut engine = engine();
        engine.set_queue(tracks(&["1"]), 0);
        engine.set_queue(vec![], 0);

        assert_eq!(engine.state(), PlaybackState::Idle);
        assert!(engine.load_token().is_none());
        assert_eq!(engine.device().calls.last(), Some(&DeviceCall::Pause));
    }

    #[test]
    fn rejected_play_drops_to_paused_and_reports() {
        let mut device = RecordingDevice::new();
        device.reject_play = true;
        let mut engine = PlaybackEngine::new(device, PlaybackConfig::default());

        engine.set_queue(tracks(&["1"]), 0);

        assert_eq!(engine.state(), PlaybackState::Paused);
        let events = engine.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            PlaybackEvent::Failure {
                error: PlaybackError::AutoplayBlocked { .. }
            }
        )));
    }

    #[test]
    fn invalid_url_skips_forward() {
        let mut bad = track("bad");
        bad.audio_url = "not a url".to_string();
        let mut engine = engine();

        engine.set_queue(vec![bad, track("good")], 0);

        assert_eq!(engine.queue().current_index(), Some(1));
        assert_eq!(engine.load_token().unwrap().track_id(), "good");
        assert_eq!(engine.device().loads().len(), 1);
    }

    #[test]
    fn insecure_urls_are_upgraded_when_configured() {
        let config = PlaybackConfig {
            upgrade_insecure_urls: true,
            ..PlaybackConfig::default()
        };
        let mut engine = PlaybackEngine::new(RecordingDevice::new(), config);
        let mut t = track("1");
        t.audio_url = "http://media.example.com/1.mp3".to_string();

        engine.set_queue(vec![t], 0);

        assert_eq!(
            engine.device().loads(),
            vec!["https://media.example.com/1.mp3".to_string()]
        );
    }

    #[test]
    fn duration_known_updates_engine_and_queue() {
        let mut engine = engine();
        engine.set_queue(tracks(&["1"]), 0);
        emit(&mut engine, DeviceEventKind::DurationKnown(212.5));

        assert_eq!(engine.duration(), 212.5);
        assert_eq!(engine.queue().get(0).unwrap().duration_seconds, 212.5);
    }

    #[test]
    fn seek_clamps_to_duration() {
        let mut engine = engine();
        engine.set_queue(tracks(&["1"]), 0);
        emit(&mut engine, DeviceEventKind::DurationKnown(100.0));

        engine.seek(250.0);
        assert_eq!(engine.current_time(), 100.0);
        engine.seek(-4.0);
        assert_eq!(engine.current_time(), 0.0);
        assert_eq!(engine.device().calls.last(), Some(&DeviceCall::Seek(0.0)));
    }

    #[test]
    fn seek_before_any_known_duration_only_clamps_below() {
        let mut engine = engine();
        engine.set_queue(tracks(&["1"]), 0);

        engine.seek(5000.0);
        assert_eq!(engine.current_time(), 5000.0);

        engine.seek(-1.0);
        assert_eq!(engine.current_time(), 0.0);
    }

    #[test]
    fn seek_uses_provider_duration_until_metadata() {
        let mut engine = engine();
        let mut long = track("1");
        long.duration_seconds = 240.0;
        engine.set_queue(vec![long], 0);

        engine.seek(5000.0);
        assert_eq!(engine.current_time(), 240.0);
    }

    #[test]
    fn append_to_empty_queue_loads_first_track_paused() {
        let mut engine = engine();
        assert_eq!(engine.append_to_queue(tracks(&["a", "b", "c"])), 3);

        assert_eq!(engine.state(), PlaybackState::Paused);
        assert_eq!(engine.current_track().map(|t| t.id.as_str()), Some("a"));
        assert_eq!(engine.device().loads().len(), 1);
        assert!(!engine.device().calls.contains(&DeviceCall::Play));

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.current_index, Some(0));
        assert_eq!(snapshot.current_track.map(|t| t.id), Some("a".to_string()));

        engine.toggle_play_pause();
        assert_eq!(engine.state(), PlaybackState::Playing);
    }

    #[test]
    fn seek_while_idle_is_ignored() {
        let mut engine = engine();
        engine.seek(10.0);
        assert!(engine.device().calls.is_empty());
    }

    #[test]
    fn volume_is_clamped_and_deferred_while_idle() {
        let mut engine = engine();
        engine.set_volume(5.0);
        assert_eq!(engine.volume(), 1.0);
        assert!(engine.device().calls.is_empty());

        engine.set_volume(f32::NAN);
        assert_eq!(engine.volume(), 1.0);

        engine.set_queue(tracks(&["1"]), 0);
        assert!(engine.device().calls.contains(&DeviceCall::SetVolume(1.0)));
    }

    #[test]
    fn load_timeout_skips_when_metadata_missing() {
        let mut engine = engine();
        engine.set_queue(tracks(&["1", "2"]), 0);
        let token = engine.load_token().cloned().unwrap();

        assert!(engine.load_timed_out(&token));
        assert_eq!(engine.load_token().unwrap().track_id(), "2");

        // Stale token no longer applies
        assert!(!engine.load_timed_out(&token));
    }

    #[test]
    fn load_timeout_ignored_after_metadata() {
        let mut engine = engine();
        engine.set_queue(tracks(&["1", "2"]), 0);
        emit(&mut engine, DeviceEventKind::DurationKnown(60.0));

        let token = engine.load_token().cloned().unwrap();
        assert!(!engine.load_timed_out(&token));
        assert_eq!(engine.queue().current_index(), Some(0));
    }

    #[test]
    fn started_and_paused_reconcile_state() {
        let mut engine = engine();
        engine.set_queue(tracks(&["1"]), 0);

        emit(&mut engine, DeviceEventKind::Paused);
        assert_eq!(engine.state(), PlaybackState::Paused);
        emit(&mut engine, DeviceEventKind::Started);
        assert_eq!(engine.state(), PlaybackState::Playing);
        emit(&mut engine, DeviceEventKind::PlayRejected("blocked".to_string()));
        assert_eq!(engine.state(), PlaybackState::Paused);
    }

    #[test]
    fn play_track_prepends_unknown_track() {
        let mut engine = engine();
        engine.set_queue(tracks(&["1", "2"]), 1);
        engine.play_track(track("new"));

        let ids: Vec<&str> = engine.queue().tracks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "1", "2"]);
        assert_eq!(engine.queue().current_index(), Some(0));
        assert_eq!(engine.state(), PlaybackState::Playing);
    }

    #[test]
    fn play_track_jumps_to_queued_track() {
        let mut engine = engine();
        engine.set_queue(tracks(&["1", "2", "3"]), 0);
        engine.play_track(track("3"));

        assert_eq!(engine.queue().len(), 3);
        assert_eq!(engine.queue().current_index(), Some(2));
    }

    #[test]
    fn append_keeps_current_track() {
        let mut engine = engine();
        engine.set_queue(tracks(&["1", "2"]), 1);
        let loads_before = engine.device().loads().len();

        assert_eq!(engine.append_to_queue(tracks(&["2", "3"])), 1);
        assert_eq!(engine.queue().len(), 3);
        assert_eq!(engine.queue().current_index(), Some(1));
        assert_eq!(engine.device().loads().len(), loads_before);
    }

    #[test]
    fn raw_queue_drops_unplayable_and_remaps_start() {
        let raw: Vec<RawTrack> = serde_json::from_str(
            r#"[
                {"_id":"a","title":"A","url":"https://x/a.mp3"},
                {"_id":"b","title":"B"},
                {"id":"c","name":"C","audio":"https://x/c.mp3"}
            ]"#,
        )
        .unwrap();
        let mut engine = engine();

        engine.set_queue_from_raw(raw, 1);

        assert_eq!(engine.queue().len(), 2);
        assert_eq!(engine.current_track().unwrap().id, "c");
        let failures = engine
            .drain_events()
            .into_iter()
            .filter(PlaybackEvent::is_failure)
            .count();
        assert_eq!(failures, 1);
    }
}
