//! Track provider abstraction.

use async_trait::async_trait;
use cadence_playback::ProviderTrack;

use crate::error::Result;
use crate::types::{TrackPage, TrackQuery};

/// Source of provider-shaped tracks.
///
/// Implemented over HTTP by [`HttpTrackProvider`](crate::HttpTrackProvider)
/// and in memory by [`MemoryTrackProvider`](crate::MemoryTrackProvider).
#[async_trait]
pub trait TrackProvider: Send + Sync {
    /// List one page of tracks matching `query`.
    async fn list_tracks(&self, query: &TrackQuery) -> Result<TrackPage>;

    /// Fetch a single track by id.
    async fn get_track(&self, id: &str) -> Result<ProviderTrack>;
}
