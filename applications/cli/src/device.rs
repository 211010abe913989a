//! Simulated playback device
//!
//! Stands in for a real audio output: it "plays" media by advancing a clock
//! and reports progress as [`DeviceEvent`]s over a channel. Each load runs in
//! its own task; loading new media aborts the previous one so it cannot
//! report anything further.

use cadence_playback::{DeviceError, DeviceEvent, DeviceEventKind, LoadToken, PlaybackDevice};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

/// Commands forwarded to the media task
#[derive(Debug, Clone, Copy)]
enum Control {
    Play,
    Pause,
    Seek(f64),
}

struct LoadedMedia {
    control: mpsc::UnboundedSender<Control>,
    task: JoinHandle<()>,
}

/// Device that plays media on a virtual clock
pub struct SimulatedDevice {
    events: mpsc::UnboundedSender<DeviceEvent>,
    tick: Duration,
    fallback_secs: f64,
    lengths: HashMap<String, f64>,
    broken: HashSet<String>,
    reject_play: bool,
    volume: f32,
    current: Option<LoadedMedia>,
}

impl SimulatedDevice {
    /// Create a device and the receiver its events arrive on
    ///
    /// `tick` is the position update interval. Media without a registered
    /// length plays for `fallback_secs`.
    pub fn new(tick: Duration, fallback_secs: f64) -> (Self, mpsc::UnboundedReceiver<DeviceEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let device = Self {
            events,
            tick,
            fallback_secs,
            lengths: HashMap::new(),
            broken: HashSet::new(),
            reject_play: false,
            volume: 1.0,
            current: None,
        };
        (device, receiver)
    }

    /// Set the simulated length of the media at `url`
    pub fn set_length(&mut self, url: impl Into<String>, seconds: f64) {
        self.lengths.insert(url.into(), seconds);
    }

    /// Make the media at `url` fail to decode after loading
    pub fn set_broken(&mut self, url: impl Into<String>) {
        self.broken.insert(url.into());
    }

    /// Refuse every `play()` as an autoplay policy would
    pub fn set_reject_play(&mut self, reject: bool) {
        self.reject_play = reject;
    }

    /// Last volume the engine applied
    pub fn volume(&self) -> f32 {
        self.volume
    }

    fn send(&self, control: Control) -> Result<(), DeviceError> {
        let media = self
            .current
            .as_ref()
            .ok_or_else(|| DeviceError::Unavailable("no media loaded".to_string()))?;

        media
            .control
            .send(control)
            .map_err(|_| DeviceError::Unavailable("media task stopped".to_string()))
    }

    fn stop_current(&mut self) {
        if let Some(media) = self.current.take() {
            media.task.abort();
        }
    }
}

impl PlaybackDevice for SimulatedDevice {
    fn load(&mut self, token: &LoadToken, url: &str) -> Result<(), DeviceError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| DeviceError::Unavailable(e.to_string()))?;

        self.stop_current();

        let length = if self.broken.contains(url) {
            None
        } else {
            Some(self.lengths.get(url).copied().unwrap_or(self.fallback_secs))
        };

        debug!(url, generation = token.generation(), ?length, "Loading simulated media");

        let (control, control_rx) = mpsc::unbounded_channel();
        let task = runtime.spawn(run_media(
            token.clone(),
            length,
            self.tick,
            control_rx,
            self.events.clone(),
        ));

        self.current = Some(LoadedMedia { control, task });
        Ok(())
    }

    fn play(&mut self) -> Result<(), DeviceError> {
        if self.reject_play {
            return Err(DeviceError::PlayRejected(
                "playback requires user interaction".to_string(),
            ));
        }
        self.send(Control::Play)
    }

    fn pause(&mut self) -> Result<(), DeviceError> {
        self.send(Control::Pause)
    }

    fn seek(&mut self, seconds: f64) -> Result<(), DeviceError> {
        self.send(Control::Seek(seconds))
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), DeviceError> {
        self.volume = volume;
        Ok(())
    }
}

impl Drop for SimulatedDevice {
    fn drop(&mut self) {
        self.stop_current();
    }
}

/// Media task: reports metadata, then position until the end
async fn run_media(
    token: LoadToken,
    length: Option<f64>,
    tick: Duration,
    mut control: mpsc::UnboundedReceiver<Control>,
    events: mpsc::UnboundedSender<DeviceEvent>,
) {
    let emit = |kind: DeviceEventKind| events.send(DeviceEvent::new(token.clone(), kind)).is_ok();

    let Some(length) = length else {
        emit(DeviceEventKind::Error("media could not be decoded".to_string()));
        return;
    };

    if !emit(DeviceEventKind::DurationKnown(length)) {
        return;
    }

    let step = tick.as_secs_f64();
    let mut position = 0.0_f64;
    let mut playing = false;

    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            command = control.recv() => {
                let Some(command) = command else {
                    return;
                };

                let delivered = match command {
                    Control::Play if !playing => {
                        playing = true;
                        ticker.reset();
                        emit(DeviceEventKind::Started)
                    }
                    Control::Pause if playing => {
                        playing = false;
                        emit(DeviceEventKind::Paused)
                    }
                    Control::Seek(seconds) => {
                        position = seconds.clamp(0.0, length);
                        emit(DeviceEventKind::TimeUpdate(position))
                    }
                    _ => true,
                };

                if !delivered {
                    return;
                }
            }
            _ = ticker.tick(), if playing => {
                position = (position + step).min(length);
                trace!(generation = token.generation(), position, "Tick");

                if !emit(DeviceEventKind::TimeUpdate(position)) {
                    return;
                }

                if position >= length {
                    playing = false;
                    if !emit(DeviceEventKind::Ended) {
                        return;
                    }
                }
            }
        }
    }
}
