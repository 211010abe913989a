//! Queue state
//!
//! Ordered track list with a cursor, shuffle order and repeat mode:
//!
//! ```text
//! tracks:        [T0, T1, T2, T3]      insertion order
//! current_index:      ^ 1
//! shuffle_order: [2, 1, 3, 0]          only while shuffle is on
//! shuffle_pos:       ^ 1               shuffle_order[1] == current_index
//! ```
//!
//! Navigation wraps in both directions. The shuffle order is regenerated,
//! never patched, whenever the contents change.

use std::collections::HashSet;

use crate::shuffle;
use crate::types::{Direction, RepeatMode, Track};

/// Playback queue
#[derive(Debug, Clone, Default)]
pub struct Queue {
    /// Tracks in insertion order (ids unique)
    tracks: Vec<Track>,

    /// Index into `tracks`, `None` only when empty
    current_index: Option<usize>,

    shuffle_enabled: bool,

    /// Permutation of `0..tracks.len()` while shuffle is on, empty otherwise
    shuffle_order: Vec<usize>,

    /// Position of `current_index` within `shuffle_order`
    shuffle_position: usize,

    repeat_mode: RepeatMode,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty queue with initial modes
    pub fn with_modes(shuffle_enabled: bool, repeat_mode: RepeatMode) -> Self {
        Self {
            shuffle_enabled,
            repeat_mode,
            ..Self::default()
        }
    }

    /// Replace the queue contents
    ///
    /// Duplicate ids keep their first occurrence; a `start_index` pointing
    /// at a dropped duplicate resolves to the kept one. The start index is
    /// clamped into range. Returns the new current index.
    pub fn set_queue(&mut self, tracks: Vec<Track>, start_index: usize) -> Option<usize> {
        let start_id = tracks
            .get(start_index.min(tracks.len().saturating_sub(1)))
            .map(|t| t.id.clone());

        self.tracks = dedup_by_id(tracks, &HashSet::new());
        self.current_index = if self.tracks.is_empty() {
            None
        } else {
            start_id
                .and_then(|id| self.position_of(&id))
                .or(Some(0))
        };

        self.regenerate_shuffle();
        self.current_index
    }

    /// Append tracks not already queued
    ///
    /// Keeps pointing at the same current track. Returns how many were added.
    pub fn extend(&mut self, tracks: Vec<Track>) -> usize {
        let existing: HashSet<String> = self.tracks.iter().map(|t| t.id.clone()).collect();
        let fresh = dedup_by_id(tracks, &existing);
        let added = fresh.len();

        if added == 0 {
            return 0;
        }

        self.tracks.extend(fresh);
        if self.current_index.is_none() {
            self.current_index = Some(0);
        }
        self.regenerate_shuffle();
        added
    }

    /// Move the cursor one step and return the new absolute index
    ///
    /// Returns `None` (and changes nothing) when the queue is empty.
    pub fn advance(&mut self, direction: Direction) -> Option<usize> {
        let len = self.tracks.len();
        let current = self.current_index?;

        if self.shuffle_enabled {
            if self.shuffle_order.len() != len {
                self.regenerate_shuffle();
            }
            self.shuffle_position = step(self.shuffle_position, len, direction);
            self.current_index = Some(self.shuffle_order[self.shuffle_position]);
        } else {
            self.current_index = Some(step(current, len, direction));
        }

        self.current_index
    }

    /// Jump to an absolute index
    ///
    /// Returns `None` if the index is out of range.
    pub fn select(&mut self, index: usize) -> Option<usize> {
        if index >= self.tracks.len() {
            return None;
        }

        self.current_index = Some(index);
        self.sync_shuffle_position();
        self.current_index
    }

    /// Flip shuffle, keeping the current track
    ///
    /// Returns the new shuffle flag.
    pub fn toggle_shuffle(&mut self) -> bool {
        self.set_shuffle(!self.shuffle_enabled);
        self.shuffle_enabled
    }

    /// Enable or disable shuffle
    pub fn set_shuffle(&mut self, enabled: bool) {
        self.shuffle_enabled = enabled;
        self.regenerate_shuffle();
    }

    /// Rotate repeat mode Off -> Once -> Forever -> Off
    pub fn cycle_repeat(&mut self) -> RepeatMode {
        self.repeat_mode = self.repeat_mode.cycled();
        self.repeat_mode
    }

    /// Set repeat mode
    pub fn set_repeat(&mut self, mode: RepeatMode) {
        self.repeat_mode = mode;
    }

    /// Record an authoritative duration for a queued track
    pub fn set_duration(&mut self, index: usize, duration_seconds: f64) {
        if let Some(track) = self.tracks.get_mut(index) {
            track.duration_seconds = duration_seconds;
        }
    }

    /// Get current track
    pub fn current(&self) -> Option<&Track> {
        self.current_index.and_then(|i| self.tracks.get(i))
    }

    /// Get current index
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Get track by index
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Find a track's index by id
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    /// All tracks in insertion order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn shuffle_enabled(&self) -> bool {
        self.shuffle_enabled
    }

    pub fn shuffle_order(&self) -> &[usize] {
        &self.shuffle_order
    }

    pub fn shuffle_position(&self) -> usize {
        self.shuffle_position
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    fn regenerate_shuffle(&mut self) {
        if self.shuffle_enabled {
            self.shuffle_order = shuffle::generate(self.tracks.len());
        } else {
            self.shuffle_order.clear();
        }
        self.sync_shuffle_position();
    }

    fn sync_shuffle_position(&mut self) {
        self.shuffle_position = self
            .current_index
            .and_then(|current| self.shuffle_order.iter().position(|&i| i == current))
            .unwrap_or(0);
    }
}

fn step(index: usize, len: usize, direction: Direction) -> usize {
    match direction {
        Direction::Next => (index + 1) % len,
        Direction::Previous => (index + len - 1) % len,
    }
}

fn dedup_by_id(tracks: Vec<Track>, existing: &HashSet<String>) -> Vec<Track> {
    let mut seen = existing.clone();
    tracks
        .into_iter()
        .filter(|t| seen.insert(t.id.clone()))
        .collect()
}
