//! In-memory track provider.

use async_trait::async_trait;
use cadence_playback::ProviderTrack;
use std::cmp::Ordering;
use tracing::debug;

use crate::error::{ProviderError, Result};
use crate::provider::TrackProvider;
use crate::types::{Pagination, TrackOrder, TrackPage, TrackQuery};

/// Track provider backed by a fixed list.
///
/// Filters, sorts and pages the same way the HTTP API does, so it can stand
/// in for the server in tests and offline sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryTrackProvider {
    tracks: Vec<ProviderTrack>,
}

impl MemoryTrackProvider {
    pub fn new(tracks: Vec<ProviderTrack>) -> Self {
        Self { tracks }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    fn matches(track: &ProviderTrack, query: &TrackQuery) -> bool {
        if let Some(search) = non_blank(query.search.as_deref()) {
            let fields = [
                Some(track.title.as_str()),
                Some(track.artist_name.as_str()),
                Some(track.album_name.as_str()),
                track.genre.as_deref(),
                track.description.as_deref(),
            ];
            if !fields.into_iter().flatten().any(|f| contains_ci(f, &search)) {
                return false;
            }
        }

        if let Some(genre) = non_blank(query.genre.as_deref()) {
            if !track.genre.as_deref().is_some_and(|g| contains_ci(g, &genre)) {
                return false;
            }
        }

        true
    }
}

#[async_trait]
impl TrackProvider for MemoryTrackProvider {
    async fn list_tracks(&self, query: &TrackQuery) -> Result<TrackPage> {
        let mut matched: Vec<&ProviderTrack> = self
            .tracks
            .iter()
            .filter(|t| Self::matches(t, query))
            .collect();

        match query.order.unwrap_or_default() {
            TrackOrder::Title => matched.sort_by(|a, b| a.title.cmp(&b.title)),
            TrackOrder::Artist => matched.sort_by(|a, b| a.artist_name.cmp(&b.artist_name)),
            TrackOrder::Newest => matched.sort_by(|a, b| newest_first(a, b)),
        }

        let page = query.effective_page();
        let limit = query.effective_limit();
        let skip = (page as usize - 1).saturating_mul(limit as usize);

        let tracks: Vec<ProviderTrack> = matched
            .iter()
            .skip(skip)
            .take(limit as usize)
            .map(|t| (*t).clone())
            .collect();

        debug!(
            matched = matched.len(),
            returned = tracks.len(),
            page,
            limit,
            "Listed in-memory tracks"
        );

        Ok(TrackPage {
            tracks,
            pagination: Pagination::new(page, limit, matched.len() as u64),
        })
    }

    async fn get_track(&self, id: &str) -> Result<ProviderTrack> {
        self.tracks
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Newest first; tracks without a timestamp sort last.
fn newest_first(a: &ProviderTrack, b: &ProviderTrack) -> Ordering {
    match (&a.created_at, &b.created_at) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
