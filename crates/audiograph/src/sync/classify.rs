//! Classification of activities-stream items.
//!
//! The activities stream is heterogeneous. Classification happens once,
//! up front, on the `type` discriminant; the rest of the engine only
//! sees the resulting tagged values. Two passes per page: the first
//! builds the ordered track/repost index, the second collects the
//! wrapped `origin` payloads for entity normalization.

use crate::api::{RawActivity, RawTrack};
use crate::entity::EntityId;

/// Discriminant of a posted track.
pub const ACTIVITY_TRACK: &str = "track";

/// Discriminant of a reposted track.
pub const ACTIVITY_TRACK_REPOST: &str = "track-repost";

/// Classification of one activities item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    /// A freshly posted track.
    Track,
    /// A repost of a track.
    Repost,
    /// Anything else; excluded from the index and from normalization.
    Other,
}

/// Classify one raw item on its `type` discriminant.
///
/// Discriminants match exactly; unknown or differently cased values
/// are `Other`.
#[must_use]
pub fn classify(item: &RawActivity) -> ActivityKind {
    match item.kind.as_str() {
        ACTIVITY_TRACK => ActivityKind::Track,
        ACTIVITY_TRACK_REPOST => ActivityKind::Repost,
        _ => ActivityKind::Other,
    }
}

/// One entry of the activities type index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackRef {
    /// ID of the wrapped track.
    pub id: EntityId,
    /// Whether the item posted or reposted the track.
    pub kind: ActivityKind,
}

/// Build the ordered track/repost index of a page.
///
/// Track-kind items missing their `origin` payload are skipped.
#[must_use]
pub fn track_refs(items: &[RawActivity]) -> Vec<TrackRef> {
    items
        .iter()
        .filter_map(|item| {
            let kind = classify(item);
            if kind == ActivityKind::Other {
                return None;
            }
            let origin = item.origin.as_ref()?;
            Some(TrackRef {
                id: origin.id,
                kind,
            })
        })
        .collect()
}

/// Extract the `origin` payloads of all track-kind items, posts and
/// reposts alike, for normalization.
#[must_use]
pub fn origins(items: Vec<RawActivity>) -> Vec<RawTrack> {
    items
        .into_iter()
        .filter(|item| classify(item) != ActivityKind::Other)
        .filter_map(|item| item.origin)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn activity(kind: &str, origin_id: Option<u64>) -> RawActivity {
        let mut value = json!({"type": kind});
        if let Some(id) = origin_id {
            value["origin"] = json!({"id": id, "title": format!("t{id}")});
        }
        serde_json::from_value(value).expect("activity fixture")
    }

    #[test]
    fn classify_matches_discriminants_exactly() {
        assert_eq!(classify(&activity("track", Some(1))), ActivityKind::Track);
        assert_eq!(
            classify(&activity("track-repost", Some(2))),
            ActivityKind::Repost
        );
        assert_eq!(classify(&activity("playlist", None)), ActivityKind::Other);
        assert_eq!(classify(&activity("Track", Some(3))), ActivityKind::Other);
        assert_eq!(classify(&activity("", None)), ActivityKind::Other);
    }

    #[test]
    fn track_refs_index_preserves_order_and_skips_other() {
        let items = vec![
            activity("track", Some(10)),
            activity("playlist", Some(99)),
            activity("track-repost", Some(11)),
            activity("track", Some(12)),
        ];
        let refs = track_refs(&items);
        assert_eq!(
            refs,
            vec![
                TrackRef {
                    id: 10,
                    kind: ActivityKind::Track
                },
                TrackRef {
                    id: 11,
                    kind: ActivityKind::Repost
                },
                TrackRef {
                    id: 12,
                    kind: ActivityKind::Track
                },
            ]
        );
    }

    #[test]
    fn track_refs_skips_track_items_without_origin() {
        let items = vec![activity("track", None), activity("track", Some(5))];
        let refs = track_refs(&items);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].id, 5);
    }

    #[test]
    fn origins_collects_posts_and_reposts_only() {
        let items = vec![
            activity("track", Some(10)),
            activity("track-repost", Some(11)),
            activity("comment", Some(99)),
            activity("track", None),
        ];
        let tracks = origins(items);
        let ids: Vec<u64> = tracks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![10, 11], "posts and reposts, in page order");
    }
}
