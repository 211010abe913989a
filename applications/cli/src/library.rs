/// Offline track library loaded from a JSON file
use crate::error::{CliError, Result};
use cadence_client::{MemoryTrackProvider, ProviderTrack, TrackPage};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Accepted file layouts: a bare array, or a saved listing response
#[derive(Deserialize)]
#[serde(untagged)]
enum LibraryFile {
    Tracks(Vec<ProviderTrack>),
    Page(TrackPage),
}

/// Read a library file into an in-memory provider
pub fn load_library(path: &Path) -> Result<MemoryTrackProvider> {
    let contents = std::fs::read_to_string(path)?;
    let tracks = parse_library(&contents)
        .map_err(|e| CliError::Library(format!("{}: {}", path.display(), e)))?;

    info!(path = %path.display(), tracks = tracks.len(), "Loaded track library");
    Ok(MemoryTrackProvider::new(tracks))
}

fn parse_library(contents: &str) -> serde_json::Result<Vec<ProviderTrack>> {
    Ok(match serde_json::from_str(contents)? {
        LibraryFile::Tracks(tracks) => tracks,
        LibraryFile::Page(page) => page.tracks,
    })
}
