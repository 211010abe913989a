//! Session tests on a paused clock
//!
//! The simulated device advances with tokio's virtual time, so whole tracks
//! play out instantly and deterministically.

use cadence_cli::{Session, SessionCommand, SimulatedDevice, TrackFeed};
use cadence_client::{MemoryTrackProvider, ProviderTrack, TrackQuery};
use cadence_playback::{
    DeviceError, LoadToken, PlaybackConfig, PlaybackDevice, PlaybackError, PlaybackEvent,
    PlaybackState, RawTrack,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const TICK: Duration = Duration::from_millis(250);
const LOAD_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Helpers
// =============================================================================

fn create_track(id: &str) -> ProviderTrack {
    ProviderTrack {
        id: id.to_string(),
        title: format!("Track {}", id),
        artist_name: "Test Artist".to_string(),
        album_name: "Test Album".to_string(),
        duration: 1.0,
        url: Some(url_for(id)),
        public_id: None,
        image: None,
        genre: Some("Jazz".to_string()),
        description: None,
        created_at: None,
        updated_at: None,
    }
}

fn url_for(id: &str) -> String {
    format!("https://cdn.example.com/{}.mp3", id)
}

fn raw(ids: &[&str]) -> Vec<RawTrack> {
    ids.iter().map(|id| RawTrack::from(create_track(id))).collect()
}

fn simulated_session(
    configure: impl FnOnce(&mut SimulatedDevice),
) -> (
    Session<SimulatedDevice>,
    mpsc::UnboundedReceiver<PlaybackEvent>,
) {
    let (mut device, device_events) = SimulatedDevice::new(TICK, 1.0);
    configure(&mut device);

    let (observer, events) = mpsc::unbounded_channel();
    let session = Session::new(device, device_events, PlaybackConfig::default(), LOAD_TIMEOUT)
        .with_observer(observer);

    (session, events)
}

fn collect(events: &mut mpsc::UnboundedReceiver<PlaybackEvent>) -> Vec<PlaybackEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

fn loaded_ids(events: &[PlaybackEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            PlaybackEvent::TrackChanged { track_id, .. } => Some(track_id.clone()),
            _ => None,
        })
        .collect()
}

/// Run the session for `duration` of virtual time
async fn run_for<D: PlaybackDevice>(session: &mut Session<D>, duration: Duration) {
    let (_commands, rx) = mpsc::channel(1);
    let _ = tokio::time::timeout(duration, session.run(rx)).await;
}

/// Device that accepts everything and never reports back
struct SilentDevice;

impl PlaybackDevice for SilentDevice {
    fn load(&mut self, _token: &LoadToken, _url: &str) -> Result<(), DeviceError> {
        Ok(())
    }

    fn play(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn pause(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn seek(&mut self, _seconds: f64) -> Result<(), DeviceError> {
        Ok(())
    }

    fn set_volume(&mut self, _volume: f32) -> Result<(), DeviceError> {
        Ok(())
    }
}

// =============================================================================
// Continuous Playback
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_tracks_advance_when_they_end() {
    let (mut session, mut events) = simulated_session(|_| {});

    session.start(raw(&["a", "b", "c"]), 0);
    run_for(&mut session, Duration::from_millis(2500)).await;

    let seen = collect(&mut events);
    assert_eq!(loaded_ids(&seen), vec!["a", "b", "c"]);
    assert_eq!(session.engine().state(), PlaybackState::Playing);
    assert_eq!(session.engine().current_track().unwrap().id, "c");
}

#[tokio::test(start_paused = true)]
async fn test_broken_media_is_skipped() {
    let (mut session, mut events) = simulated_session(|device| {
        device.set_broken(url_for("a"));
    });

    session.start(raw(&["a", "b"]), 0);
    run_for(&mut session, Duration::from_millis(500)).await;

    let seen = collect(&mut events);
    assert_eq!(loaded_ids(&seen), vec!["a", "b"]);
    assert!(seen.iter().any(|e| matches!(
        e,
        PlaybackEvent::Failure {
            error: PlaybackError::DeviceLoad { track_id, .. }
        } if track_id == "a"
    )));
    assert_eq!(session.engine().current_track().unwrap().id, "b");
}

#[tokio::test(start_paused = true)]
async fn test_all_broken_stops_playback() {
    let (mut session, mut events) = simulated_session(|device| {
        device.set_broken(url_for("a"));
        device.set_broken(url_for("b"));
    });

    session.start(raw(&["a", "b"]), 0);
    run_for(&mut session, Duration::from_secs(1)).await;

    let seen = collect(&mut events);
    assert!(seen.iter().any(|e| matches!(
        e,
        PlaybackEvent::Failure {
            error: PlaybackError::QueueExhausted { count: 2 }
        }
    )));
    assert_eq!(session.engine().state(), PlaybackState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_missing_metadata_times_out() {
    let (_device_tx, device_events) = mpsc::unbounded_channel();
    let (observer, mut events) = mpsc::unbounded_channel();
    let mut session = Session::new(
        SilentDevice,
        device_events,
        PlaybackConfig::default(),
        LOAD_TIMEOUT,
    )
    .with_observer(observer);

    session.start(raw(&["a", "b"]), 0);
    run_for(&mut session, LOAD_TIMEOUT + Duration::from_secs(1)).await;

    let seen = collect(&mut events);
    assert_eq!(loaded_ids(&seen), vec!["a", "b"]);
    assert!(seen.iter().any(|e| matches!(
        e,
        PlaybackEvent::Failure {
            error: PlaybackError::DeviceLoad { reason, .. }
        } if reason.contains("timed out")
    )));
}

// =============================================================================
// Commands
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_commands_drive_engine_until_quit() {
    let (mut session, _events) = simulated_session(|device| {
        device.set_length(url_for("a"), 60.0);
        device.set_length(url_for("b"), 60.0);
    });
    session.start(raw(&["a", "b", "c"]), 0);

    let (tx, rx) = mpsc::channel(8);
    for command in [
        SessionCommand::Next,
        SessionCommand::Volume(0.25),
        SessionCommand::Repeat,
        SessionCommand::Quit,
    ] {
        tx.send(command).await.unwrap();
    }

    session.run(rx).await.unwrap();

    let engine = session.engine();
    assert_eq!(engine.current_track().unwrap().id, "b");
    assert_eq!(engine.volume(), 0.25);
    assert_eq!(engine.device().volume(), 0.25);
    assert_eq!(
        engine.queue().repeat_mode(),
        cadence_playback::RepeatMode::Once
    );
}

#[tokio::test(start_paused = true)]
async fn test_pause_and_goto() {
    let (mut session, _events) = simulated_session(|device| {
        device.set_length(url_for("a"), 60.0);
        device.set_length(url_for("c"), 60.0);
    });
    session.start(raw(&["a", "b", "c"]), 0);

    session.handle_command(SessionCommand::Pause).await;
    assert_eq!(session.engine().state(), PlaybackState::Paused);

    // Pausing twice is a no-op rather than a toggle
    session.handle_command(SessionCommand::Pause).await;
    assert_eq!(session.engine().state(), PlaybackState::Paused);

    session.handle_command(SessionCommand::Goto(3)).await;
    assert_eq!(session.engine().current_track().unwrap().id, "c");
    assert_eq!(session.engine().state(), PlaybackState::Playing);
}

#[tokio::test(start_paused = true)]
async fn test_goto_position_zero_keeps_current_track() {
    let (mut session, mut events) = simulated_session(|device| {
        device.set_length(url_for("a"), 60.0);
    });
    session.start(raw(&["a", "b"]), 0);
    collect(&mut events);

    session.handle_command(SessionCommand::Goto(0)).await;

    assert_eq!(session.engine().current_track().unwrap().id, "a");
    assert_eq!(session.engine().state(), PlaybackState::Playing);
    assert!(loaded_ids(&collect(&mut events)).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_closed_command_channel_ends_session() {
    let (mut session, _events) = simulated_session(|_| {});
    session.start(raw(&["a"]), 0);

    let (tx, rx) = mpsc::channel(1);
    drop(tx);

    session.run(rx).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_autoplay_rejection_leaves_session_paused() {
    let (mut session, mut events) = simulated_session(|device| {
        device.set_reject_play(true);
    });

    session.start(raw(&["a"]), 0);

    let seen = collect(&mut events);
    assert!(seen.iter().any(|e| matches!(
        e,
        PlaybackEvent::Failure {
            error: PlaybackError::AutoplayBlocked { .. }
        }
    )));
    assert_eq!(session.engine().state(), PlaybackState::Paused);
}

// =============================================================================
// Feed Paging
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_more_appends_following_pages() {
    let library: Vec<ProviderTrack> = ["a", "b", "c", "d", "e"]
        .iter()
        .map(|id| create_track(id))
        .collect();
    let provider = Arc::new(MemoryTrackProvider::new(library));

    let mut feed = TrackFeed::new(
        provider,
        TrackQuery::new().order(cadence_client::TrackOrder::Title).limit(2),
    );
    let first = feed.next_page().await.unwrap().unwrap();
    assert_eq!(first.len(), 2);
    assert!(feed.has_more());

    let (session, _events) = simulated_session(|_| {});
    let mut session = session.with_feed(feed);
    session.start(first.into_iter().map(RawTrack::from).collect(), 0);

    session.handle_command(SessionCommand::More).await;
    assert_eq!(session.engine().queue().len(), 4);

    session.handle_command(SessionCommand::More).await;
    assert_eq!(session.engine().queue().len(), 5);

    // Listing exhausted
    session.handle_command(SessionCommand::More).await;
    assert_eq!(session.engine().queue().len(), 5);

    // Appending never interrupts the current track
    assert_eq!(session.engine().current_track().unwrap().id, "a");
}
