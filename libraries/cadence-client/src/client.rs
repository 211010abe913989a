//! HTTP track provider.

use async_trait::async_trait;
use cadence_playback::ProviderTrack;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::error::{ProviderError, Result};
use crate::provider::TrackProvider;
use crate::types::{ErrorBody, ProviderConfig, TrackPage, TrackQuery, DEFAULT_LIMIT};

/// Client for the track listing REST API.
///
/// Endpoints, relative to the base URL:
/// - `GET /audio?search&genre&order&page&limit`
/// - `GET /audio/featured?limit`
/// - `GET /audio/{id}`
///
/// # Example
///
/// ```ignore
/// use cadence_client::{HttpTrackProvider, ProviderConfig, TrackProvider, TrackQuery};
///
/// let provider = HttpTrackProvider::new(ProviderConfig::new("https://music.example.com/api"))?;
/// let page = provider.list_tracks(&TrackQuery::new().search("coltrane")).await?;
/// println!("Found {} tracks", page.pagination.total_items);
/// ```
#[derive(Debug, Clone)]
pub struct HttpTrackProvider {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpTrackProvider {
    /// Create a new provider with the given configuration.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let base_url = parse_base_url(&config.base_url)?;

        // Create HTTP client with reasonable defaults
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Cadence/{} (CLI)", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ProviderError::Request)?;

        info!(url = %base_url, authenticated = config.token.is_some(), "Track provider ready");

        Ok(Self {
            http,
            base_url,
            token: config.token,
        })
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Most recently added tracks.
    pub async fn featured_tracks(&self, limit: Option<u32>) -> Result<Vec<ProviderTrack>> {
        let mut url = self.endpoint(&["audio", "featured"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.unwrap_or(DEFAULT_LIMIT).to_string());

        debug!(url = %url, "Fetching featured tracks");
        let tracks: Vec<ProviderTrack> = self.get_json(url, "featured tracks").await?;
        debug!(count = tracks.len(), "Fetched featured tracks");

        Ok(tracks)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ProviderError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T> {
        let mut request = self.http.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| {
                ProviderError::ParseError(format!("Failed to parse {}: {}", what, e))
            })
        } else if status == StatusCode::UNAUTHORIZED {
            Err(ProviderError::AuthRequired)
        } else {
            Err(ProviderError::ServerError {
                status: status.as_u16(),
                message: error_message(response).await,
            })
        }
    }
}

#[async_trait]
impl TrackProvider for HttpTrackProvider {
    async fn list_tracks(&self, query: &TrackQuery) -> Result<TrackPage> {
        let mut url = self.endpoint(&["audio"])?;
        {
            let pairs = query.to_pairs();
            if !pairs.is_empty() {
                let mut serializer = url.query_pairs_mut();
                for (key, value) in &pairs {
                    serializer.append_pair(key, value);
                }
            }
        }

        debug!(url = %url, "Listing tracks");
        let page: TrackPage = self.get_json(url, "track listing").await?;

        debug!(
            tracks = page.tracks.len(),
            total = page.pagination.total_items,
            page = page.pagination.current_page,
            "Fetched track page"
        );

        Ok(page)
    }

    async fn get_track(&self, id: &str) -> Result<ProviderTrack> {
        let url = self.endpoint(&["audio", id])?;
        debug!(url = %url, track_id = %id, "Fetching track");

        match self.get_json(url, "track").await {
            Err(ProviderError::ServerError { status: 404, .. }) => {
                Err(ProviderError::NotFound(id.to_string()))
            }
            other => other,
        }
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    // Validate URL
    if raw.trim().is_empty() {
        return Err(ProviderError::InvalidUrl("URL cannot be empty".into()));
    }

    let trimmed = raw.trim().trim_end_matches('/');
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(ProviderError::InvalidUrl(
            "URL must start with http:// or https://".into(),
        ));
    }

    Url::parse(trimmed).map_err(|e| ProviderError::InvalidUrl(format!("{}: {}", trimmed, e)))
}

/// Prefer the API's `{"error": "..."}` message over the raw body.
async fn error_message(response: Response) -> String {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text)
}
