//! Interactive playback session
//!
//! Owns the engine and pumps three sources into it: user commands, device
//! events and the metadata timeout for the current load.

use crate::error::Result;
use cadence_client::{ProviderTrack, TrackProvider, TrackQuery};
use cadence_playback::{
    normalize_all, DeviceEvent, EngineSnapshot, LoadToken, PlaybackConfig, PlaybackDevice,
    PlaybackEngine, PlaybackEvent, PlaybackState, RawTrack, RepeatMode,
};
use std::fmt;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Sleep;
use tracing::{debug, info, warn};

/// Commands accepted by a running session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionCommand {
    Play,
    Pause,
    Toggle,
    Next,
    Previous,
    Seek(f64),
    Volume(f32),
    Shuffle,
    Repeat,
    /// Jump to a queue position (1-based)
    Goto(usize),
    /// Append the next page of the track listing
    More,
    Status,
    Quit,
}

impl FromStr for SessionCommand {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let verb = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next();

        let command = match verb.as_str() {
            "play" => SessionCommand::Play,
            "pause" => SessionCommand::Pause,
            "p" | "toggle" => SessionCommand::Toggle,
            "n" | "next" => SessionCommand::Next,
            "b" | "prev" | "previous" => SessionCommand::Previous,
            "s" | "shuffle" => SessionCommand::Shuffle,
            "r" | "repeat" => SessionCommand::Repeat,
            "more" => SessionCommand::More,
            "st" | "status" => SessionCommand::Status,
            "q" | "quit" | "exit" => SessionCommand::Quit,
            "seek" => SessionCommand::Seek(parse_arg(verb.as_str(), arg)?),
            "vol" | "volume" => SessionCommand::Volume(parse_arg(verb.as_str(), arg)?),
            "g" | "goto" => {
                let position: usize = parse_arg(verb.as_str(), arg)?;
                if position == 0 {
                    return Err("Queue positions start at 1".to_string());
                }
                SessionCommand::Goto(position)
            }
            "" => return Err("Empty command".to_string()),
            other => return Err(format!("Unknown command: {}", other)),
        };

        Ok(command)
    }
}

fn parse_arg<T: FromStr>(verb: &str, arg: Option<&str>) -> std::result::Result<T, String> {
    let raw = arg.ok_or_else(|| format!("{} needs an argument", verb))?;
    raw.parse()
        .map_err(|_| format!("Invalid argument for {}: {}", verb, raw))
}

/// Paged track listing that `more` pulls from
pub struct TrackFeed {
    provider: Arc<dyn TrackProvider>,
    query: TrackQuery,
    next_page: Option<u32>,
}

impl TrackFeed {
    pub fn new(provider: Arc<dyn TrackProvider>, query: TrackQuery) -> Self {
        let next_page = Some(query.effective_page());
        Self {
            provider,
            query,
            next_page,
        }
    }

    /// Whether another page may exist
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    /// Fetch the next page, or `None` once the listing is exhausted
    pub async fn next_page(&mut self) -> Result<Option<Vec<ProviderTrack>>> {
        let Some(page) = self.next_page else {
            return Ok(None);
        };

        let query = self.query.clone().page(page);
        let listing = self.provider.list_tracks(&query).await?;

        self.next_page = listing.pagination.has_next().then_some(page + 1);
        debug!(page, tracks = listing.tracks.len(), more = self.has_more(), "Fetched feed page");

        Ok(Some(listing.tracks))
    }
}

struct LoadWatch {
    token: LoadToken,
    timer: Pin<Box<Sleep>>,
}

/// A running player: engine plus the event sources feeding it
pub struct Session<D: PlaybackDevice> {
    engine: PlaybackEngine<D>,
    device_events: mpsc::UnboundedReceiver<DeviceEvent>,
    load_timeout: Duration,
    feed: Option<TrackFeed>,
    observer: Option<mpsc::UnboundedSender<PlaybackEvent>>,
    armed_for: Option<LoadToken>,
    watch: Option<LoadWatch>,
}

impl<D: PlaybackDevice> Session<D> {
    pub fn new(
        device: D,
        device_events: mpsc::UnboundedReceiver<DeviceEvent>,
        config: PlaybackConfig,
        load_timeout: Duration,
    ) -> Self {
        Self {
            engine: PlaybackEngine::new(device, config),
            device_events,
            load_timeout,
            feed: None,
            observer: None,
            armed_for: None,
            watch: None,
        }
    }

    /// Pull more tracks from `feed` on `more`
    pub fn with_feed(mut self, feed: TrackFeed) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Forward every engine event to `observer`
    pub fn with_observer(mut self, observer: mpsc::UnboundedSender<PlaybackEvent>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn engine(&self) -> &PlaybackEngine<D> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PlaybackEngine<D> {
        &mut self.engine
    }

    /// Replace the queue and start at `start_index`
    pub fn start(&mut self, tracks: Vec<RawTrack>, start_index: usize) {
        self.engine.set_queue_from_raw(tracks, start_index);
        self.after_engine_call();
    }

    /// Process input until `Quit` or the command channel closes
    pub async fn run(&mut self, mut commands: mpsc::Receiver<SessionCommand>) -> Result<()> {
        info!(tracks = self.engine.queue().len(), "Session started");

        loop {
            tokio::select! {
                command = commands.recv() => {
                    match command {
                        Some(SessionCommand::Quit) | None => break,
                        Some(command) => self.handle_command(command).await,
                    }
                }
                Some(event) = self.device_events.recv() => {
                    self.engine.handle_device_event(event);
                }
                Some(token) = wait_for_timeout(&mut self.watch) => {
                    self.watch = None;
                    self.engine.load_timed_out(&token);
                }
            }

            self.after_engine_call();
        }

        info!("Session ended");
        Ok(())
    }

    /// Apply one user command
    pub async fn handle_command(&mut self, command: SessionCommand) {
        debug!(?command, "Command");

        match command {
            SessionCommand::Play => {
                if self.engine.state() != PlaybackState::Playing {
                    self.engine.toggle_play_pause();
                }
            }
            SessionCommand::Pause => {
                if self.engine.state() == PlaybackState::Playing {
                    self.engine.toggle_play_pause();
                }
            }
            SessionCommand::Toggle => self.engine.toggle_play_pause(),
            SessionCommand::Next => self.engine.skip_next(),
            SessionCommand::Previous => self.engine.skip_previous(),
            SessionCommand::Seek(seconds) => self.engine.seek(seconds),
            SessionCommand::Volume(volume) => self.engine.set_volume(volume),
            SessionCommand::Shuffle => {
                let enabled = self.engine.toggle_shuffle();
                println!("Shuffle {}", if enabled { "on" } else { "off" });
            }
            SessionCommand::Repeat => {
                let mode = self.engine.cycle_repeat();
                println!("Repeat {}", repeat_label(mode));
            }
            SessionCommand::Goto(position) => match position.checked_sub(1) {
                Some(index) => self.engine.play_index(index),
                None => println!("Queue positions start at 1"),
            },
            SessionCommand::More => self.load_more().await,
            SessionCommand::Status => println!("{}", render_status(&self.engine.snapshot())),
            SessionCommand::Quit => {}
        }

        self.after_engine_call();
    }

    async fn load_more(&mut self) {
        let Some(feed) = self.feed.as_mut() else {
            println!("No track listing to load more from");
            return;
        };

        match feed.next_page().await {
            Ok(Some(page)) => {
                let (tracks, rejected) =
                    normalize_all(page.into_iter().map(RawTrack::from).collect());
                for error in &rejected {
                    warn!(%error, "Skipping unplayable track");
                }

                let added = self
                    .engine
                    .append_to_queue(tracks.into_iter().map(|(_, track)| track).collect());
                println!("Added {} tracks ({} queued)", added, self.engine.queue().len());
            }
            Ok(None) => println!("No more tracks"),
            Err(e) => warn!(error = %e, "Failed to fetch more tracks"),
        }
    }

    fn after_engine_call(&mut self) {
        self.flush_events();
        self.rearm_load_watch();
    }

    fn flush_events(&mut self) {
        for event in self.engine.drain_events() {
            match &event {
                PlaybackEvent::TrackChanged { track_id, index, .. } => {
                    let title = self
                        .engine
                        .queue()
                        .get(*index)
                        .map(|t| format!("{} - {}", t.title, t.artist_name))
                        .unwrap_or_default();
                    info!(%track_id, position = index + 1, "Now playing: {}", title);
                }
                PlaybackEvent::Failure { error } => warn!(%error, "Playback failure"),
                other => debug!(event = ?other, "Engine event"),
            }

            if let Some(observer) = &self.observer {
                if observer.send(event).is_err() {
                    self.observer = None;
                }
            }
        }
    }

    /// Start the metadata timer whenever the engine issues a new load
    fn rearm_load_watch(&mut self) {
        let current = self.engine.load_token().cloned();
        if current == self.armed_for {
            return;
        }

        self.armed_for = current.clone();
        self.watch = current.map(|token| LoadWatch {
            token,
            timer: Box::pin(tokio::time::sleep(self.load_timeout)),
        });
    }
}

async fn wait_for_timeout(watch: &mut Option<LoadWatch>) -> Option<LoadToken> {
    match watch {
        Some(watch) => {
            watch.timer.as_mut().await;
            Some(watch.token.clone())
        }
        None => std::future::pending().await,
    }
}

/// One-line summary of the player state
pub fn render_status(snapshot: &EngineSnapshot) -> String {
    let state = match snapshot.state {
        PlaybackState::Idle => "stopped",
        PlaybackState::Paused => "paused",
        PlaybackState::Playing => "playing",
    };

    let now = match (&snapshot.current_track, snapshot.current_index) {
        (Some(track), Some(index)) => format!(
            "{}/{} {} - {} {} / {}",
            index + 1,
            snapshot.queue_len,
            track.title,
            track.artist_name,
            Clock(snapshot.current_time_secs),
            Clock(snapshot.duration_secs),
        ),
        _ => format!("{} queued", snapshot.queue_len),
    };

    format!(
        "[{}] {} | vol {:.0}% | shuffle {} | repeat {}",
        state,
        now,
        snapshot.volume * 100.0,
        if snapshot.shuffle_enabled { "on" } else { "off" },
        repeat_label(snapshot.repeat_mode),
    )
}

fn repeat_label(mode: RepeatMode) -> &'static str {
    match mode {
        RepeatMode::Off => "off",
        RepeatMode::Once => "once",
        RepeatMode::Forever => "forever",
    }
}

/// Seconds rendered as `m:ss`
struct Clock(f64);

impl fmt::Display for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = if self.0.is_finite() { self.0.max(0.0) as u64 } else { 0 };
        write!(f, "{}:{:02}", total / 60, total % 60)
    }
}
