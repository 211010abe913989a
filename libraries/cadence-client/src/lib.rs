//! Cadence Track Providers
//!
//! Clients for listing and fetching tracks to feed the playback engine.
//!
//! # Features
//!
//! - **Listing**: search, genre filter, ordering and paging
//! - **Lookup**: fetch a single track by id
//! - **Featured**: most recently added tracks (HTTP only)
//! - **Offline**: in-memory provider with the same filter semantics
//!
//! Tracks come back in the provider shape ([`ProviderTrack`]); hand them to
//! `cadence_playback::normalize` or `PlaybackEngine::set_queue_from_raw`.
//!
//! # Example
//!
//! ```ignore
//! use cadence_client::{HttpTrackProvider, ProviderConfig, TrackOrder, TrackProvider, TrackQuery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = HttpTrackProvider::new(ProviderConfig::new("http://localhost:5000/api"))?;
//!
//!     let query = TrackQuery::new().genre("jazz").order(TrackOrder::Title);
//!     let page = provider.list_tracks(&query).await?;
//!     println!("Found {} tracks", page.pagination.total_items);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod memory;
mod provider;
mod types;

// Re-export main types
pub use cadence_playback::ProviderTrack;
pub use client::HttpTrackProvider;
pub use error::{ProviderError, Result};
pub use memory::MemoryTrackProvider;
pub use provider::TrackProvider;
pub use types::{
    Pagination, ProviderConfig, TrackOrder, TrackPage, TrackQuery, DEFAULT_LIMIT, DEFAULT_PAGE,
};
