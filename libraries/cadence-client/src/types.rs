//! Types for track listing requests and responses.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use cadence_playback::ProviderTrack;
use serde::{Deserialize, Serialize};

/// Page number used when a query does not set one.
pub const DEFAULT_PAGE: u32 = 1;

/// Page size used when a query does not set one.
pub const DEFAULT_LIMIT: u32 = 20;

/// Configuration for connecting to a track API.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL of the API (e.g., "https://music.example.com/api")
    pub base_url: String,
    /// Bearer token sent with every request (if any)
    pub token: Option<String>,
    /// Whole-request timeout
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Create a new config with just the URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Attach a bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// =============================================================================
// Query Types
// =============================================================================

/// Sort order for track listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackOrder {
    /// Title, A-Z
    Title,
    /// Artist name, A-Z
    Artist,
    /// Most recently added first
    #[default]
    Newest,
}

impl TrackOrder {
    /// Query string value understood by the API.
    pub fn as_str(self) -> &'static str {
        match self {
            TrackOrder::Title => "title",
            TrackOrder::Artist => "artist",
            TrackOrder::Newest => "newest",
        }
    }
}

impl fmt::Display for TrackOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "title" => Ok(TrackOrder::Title),
            "artist" => Ok(TrackOrder::Artist),
            "newest" => Ok(TrackOrder::Newest),
            other => Err(format!(
                "unknown order {:?} (expected title, artist or newest)",
                other
            )),
        }
    }
}

/// Filter and paging options for listing tracks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackQuery {
    /// Case-insensitive match over title, artist, album, genre and description
    pub search: Option<String>,
    /// Case-insensitive genre match
    pub genre: Option<String>,
    pub order: Option<TrackOrder>,
    /// 1-based page number
    pub page: Option<u32>,
    /// Items per page
    pub limit: Option<u32>,
}

impl TrackQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn order(mut self, order: TrackOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Page number with the default applied (0 counts as unset).
    pub fn effective_page(&self) -> u32 {
        self.page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE)
    }

    /// Page size with the default applied (0 counts as unset).
    pub fn effective_limit(&self) -> u32 {
        self.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT)
    }

    /// Query string pairs, skipping unset and blank filters.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(genre) = self.genre.as_deref().filter(|g| !g.trim().is_empty()) {
            pairs.push(("genre", genre.to_string()));
        }
        if let Some(order) = self.order {
            pairs.push(("order", order.as_str().to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }

        pairs
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Paging metadata returned with every listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub items_per_page: u32,
}

impl Pagination {
    /// Build pagination for `total_items` split into pages of `items_per_page`.
    pub fn new(current_page: u32, items_per_page: u32, total_items: u64) -> Self {
        let per_page = u64::from(items_per_page.max(1));
        Self {
            current_page,
            total_pages: total_items.div_ceil(per_page) as u32,
            total_items,
            items_per_page,
        }
    }

    /// Whether a later page exists.
    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// One page of tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPage {
    #[serde(rename = "audios")]
    pub tracks: Vec<ProviderTrack>,
    pub pagination: Pagination,
}

/// Error body returned by the API (`{"error": "..."}`).
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}
