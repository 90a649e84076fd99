//! Types shared between the page side of the bridge and the host side.
//!
//! The page script ships every message as a `{ "type": ..., "data": ... }`
//! envelope; the adapter decodes envelopes into [`PageEvent`]s and the rest
//! of the host only ever sees those.

pub mod adapter;
pub mod router;
pub mod settings;

use serde::Deserialize;
use serde_json::Value;

pub const KIND_API_READY: &str = "API_READY";
pub const KIND_TRACK: &str = "TRACK";
pub const KIND_ADVERT: &str = "ADVERT";
pub const KIND_THEME: &str = "THEME";

/// Raw message as received from the page script.
#[derive(Debug, Clone, Deserialize)]
pub struct PageEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

/// Decoded page event, ready for dispatch.
#[derive(Debug, Clone)]
pub enum PageEvent {
    ApiReady,
    TrackChanged(Track),
    ThemeChanged { name: String },
    AdvertStateChanged { playing: bool },
    Unknown { kind: String, payload: Value },
}

/// Command the host wants the page player to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    Next,
    Previous,
    TogglePause,
    ToggleLike,
}

/// Track snapshot as reported by the page. Every field is optional on the
/// wire; display defaults are applied at notification time, not here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Track {
    pub title: Option<String>,
    pub artists: Vec<Artist>,
    pub album: Option<Album>,
    pub cover: Option<String>,
    pub liked: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Artist {
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Album {
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_parses_type_and_data() {
        let envelope: PageEnvelope =
            serde_json::from_str(r#"{"type":"TRACK","data":{"title":"Song"}}"#).unwrap();
        assert_eq!(envelope.kind, "TRACK");
        assert_eq!(envelope.data["title"], "Song");
    }

    #[test]
    fn envelope_data_defaults_to_null() {
        let envelope: PageEnvelope = serde_json::from_str(r#"{"type":"API_READY"}"#).unwrap();
        assert_eq!(envelope.kind, "API_READY");
        assert!(envelope.data.is_null());
    }

    #[test]
    fn track_parses_full_payload() {
        let track: Track = serde_json::from_str(
            r#"{
                "title": "Intro",
                "artists": [{"title": "Someone"}, {"title": "Else"}],
                "album": {"title": "First"},
                "cover": "avatars.example/get-music/1/%%",
                "liked": true
            }"#,
        )
        .unwrap();
        assert_eq!(track.title.as_deref(), Some("Intro"));
        assert_eq!(track.artists.len(), 2);
        assert_eq!(track.artists[1].title.as_deref(), Some("Else"));
        assert_eq!(track.album.unwrap().title.as_deref(), Some("First"));
        assert!(track.liked);
    }

    #[test]
    fn track_with_everything_missing_parses_to_defaults() {
        let track: Track = serde_json::from_str("{}").unwrap();
        assert!(track.title.is_none());
        assert!(track.artists.is_empty());
        assert!(track.album.is_none());
        assert!(track.cover.is_none());
        assert!(!track.liked);
    }

    #[test]
    fn extra_wire_fields_are_ignored() {
        let track: Track =
            serde_json::from_str(r#"{"title":"T","duration":213,"position":4}"#).unwrap();
        assert_eq!(track.title.as_deref(), Some("T"));
    }
}
