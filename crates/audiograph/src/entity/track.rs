//! Canonical track entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EntityId;

/// A track as stored after normalization.
///
/// The uploader is stored by reference: normalization extracts the
/// embedded user object into its own entity and keeps only the ID
/// here. Optional fields are skipped during serialization when absent
/// so sparse payloads overlay cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Remote track ID.
    pub id: EntityId,
    /// Track title.
    pub title: String,
    /// Uploader's user ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<EntityId>,
    /// Cover artwork URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork_url: Option<String>,
    /// Public track page URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permalink_url: Option<String>,
    /// Streaming endpoint URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,
    /// Genre label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    /// Duration in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Total play count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playback_count: Option<u64>,
    /// Number of favoriting users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favoritings_count: Option<u64>,
    /// Upload timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_optional_fields_are_not_serialized() {
        let track = Track {
            id: 101,
            title: "Night Drive".to_string(),
            user: Some(7),
            artwork_url: None,
            permalink_url: None,
            stream_url: None,
            genre: Some("electronic".to_string()),
            duration: Some(214_000),
            playback_count: None,
            favoritings_count: None,
            created_at: None,
        };

        let value = serde_json::to_value(&track).expect("serialize track");
        let obj = value.as_object().expect("track serializes to an object");
        assert!(obj.contains_key("user"));
        assert!(obj.contains_key("genre"));
        assert!(
            !obj.contains_key("artwork_url"),
            "absent fields must not appear: {obj:?}"
        );
        assert!(!obj.contains_key("created_at"));
    }

    #[test]
    fn deserializes_with_rfc3339_timestamp() {
        let track: Track = serde_json::from_value(serde_json::json!({
            "id": 5,
            "title": "Aurora",
            "created_at": "2024-03-01T10:30:00Z"
        }))
        .expect("track with timestamp should deserialize");
        assert_eq!(track.id, 5);
        let created = track.created_at.expect("timestamp parsed");
        assert_eq!(created.to_rfc3339(), "2024-03-01T10:30:00+00:00");
    }
}
