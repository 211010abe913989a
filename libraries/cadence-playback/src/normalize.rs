//! Track normalization
//!
//! Maps both incoming track shapes onto the canonical [`Track`].

use crate::error::{PlaybackError, Result};
use crate::types::{PlayerTrack, ProviderTrack, RawTrack, Track};

/// Convert either track shape into a canonical [`Track`]
///
/// Fails with [`PlaybackError::MissingAudioSource`] when no audio URL can be
/// resolved. Callers drop such tracks instead of queueing them.
pub fn normalize(raw: RawTrack) -> Result<Track> {
    match raw {
        RawTrack::Provider(track) => from_provider(track),
        RawTrack::Player(track) => from_player(track),
    }
}

/// Normalize a batch, keeping the playable tracks and the rejections apart
///
/// Each accepted track is paired with its position in `raw`.
pub fn normalize_all(raw: Vec<RawTrack>) -> (Vec<(usize, Track)>, Vec<PlaybackError>) {
    let mut accepted = Vec::with_capacity(raw.len());
    let mut rejected = Vec::new();

    for (index, item) in raw.into_iter().enumerate() {
        match normalize(item) {
            Ok(track) => accepted.push((index, track)),
            Err(err) => rejected.push(err),
        }
    }

    (accepted, rejected)
}

fn from_provider(track: ProviderTrack) -> Result<Track> {
    let audio_url = resolve(track.url).ok_or_else(|| PlaybackError::MissingAudioSource {
        track_id: track.id.clone(),
    })?;

    Ok(Track {
        id: track.id,
        title: track.title,
        artist_name: track.artist_name,
        album_name: track.album_name,
        duration_seconds: sanitize_duration(track.duration),
        audio_url,
        image_url: resolve(track.image),
    })
}

fn from_player(track: PlayerTrack) -> Result<Track> {
    let audio_url = resolve(track.audio).ok_or_else(|| PlaybackError::MissingAudioSource {
        track_id: track.id.clone(),
    })?;

    Ok(Track {
        id: track.id,
        title: track.name,
        artist_name: track.artist_name,
        album_name: track.album_name,
        duration_seconds: sanitize_duration(track.duration),
        audio_url,
        image_url: resolve(track.image).or_else(|| resolve(track.album_image)),
    })
}

/// Blank strings count as absent
fn resolve(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn sanitize_duration(duration: f64) -> f64 {
    if duration.is_finite() && duration > 0.0 {
        duration
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(id: &str, url: Option<&str>) -> ProviderTrack {
        ProviderTrack {
            id: id.to_string(),
            title: "X".to_string(),
            artist_name: "Artist".to_string(),
            album_name: "Single".to_string(),
            duration: 0.0,
            url: url.map(String::from),
            public_id: None,
            image: None,
            genre: None,
            description: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn player(id: &str, audio: Option<&str>) -> PlayerTrack {
        PlayerTrack {
            id: id.to_string(),
            name: "X".to_string(),
            artist_name: "Artist".to_string(),
            album_name: "Single".to_string(),
            duration: 0.0,
            audio: audio.map(String::from),
            image: None,
            album_image: None,
        }
    }

    #[test]
    fn both_shapes_normalize_to_the_same_track() {
        let a = normalize(provider("a1", Some("http://x")).into()).unwrap();
        let b = normalize(player("a1", Some("http://x")).into()).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.id, "a1");
        assert_eq!(a.title, "X");
        assert_eq!(a.audio_url, "http://x");
    }

    #[test]
    fn minimal_json_shapes_agree() {
        let a: RawTrack =
            serde_json::from_str(r#"{"_id":"a1","title":"X","url":"http://x"}"#).unwrap();
        let b: RawTrack =
            serde_json::from_str(r#"{"id":"a1","name":"X","audio":"http://x"}"#).unwrap();

        assert_eq!(normalize(a).unwrap(), normalize(b).unwrap());
    }

    #[test]
    fn missing_url_is_rejected() {
        let err = normalize(provider("a1", None).into()).unwrap_err();
        assert_eq!(
            err,
            PlaybackError::MissingAudioSource {
                track_id: "a1".to_string()
            }
        );
    }

    #[test]
    fn blank_url_is_rejected() {
        let err = normalize(player("p1", Some("   ")).into()).unwrap_err();
        assert!(matches!(err, PlaybackError::MissingAudioSource { .. }));
    }

    #[test]
    fn empty_image_becomes_none() {
        let mut track = provider("a1", Some("http://x"));
        track.image = Some(String::new());
        assert_eq!(normalize(track.into()).unwrap().image_url, None);
    }

    #[test]
    fn player_falls_back_to_album_image() {
        let mut track = player("p1", Some("http://x"));
        track.album_image = Some("http://img".to_string());
        assert_eq!(
            normalize(track.into()).unwrap().image_url.as_deref(),
            Some("http://img")
        );
    }

    #[test]
    fn bogus_duration_is_zeroed() {
        let mut track = provider("a1", Some("http://x"));
        track.duration = f64::NAN;
        assert_eq!(normalize(track.into()).unwrap().duration_seconds, 0.0);
    }

    #[test]
    fn normalize_all_keeps_positions() {
        let (accepted, rejected) = normalize_all(vec![
            provider("a", Some("http://a")).into(),
            provider("b", None).into(),
            player("c", Some("http://c")).into(),
        ]);

        let positions: Vec<usize> = accepted.iter().map(|(i, _)| *i).collect();
        assert_eq!(positions, vec![0, 2]);
        assert_eq!(rejected.len(), 1);
    }
}
