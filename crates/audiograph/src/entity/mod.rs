//! Canonical entity model for the normalized store.
//!
//! Every object that survives normalization is addressed by an
//! ([`EntityKind`], [`EntityId`]) pair. The two kinds the collection
//! endpoints materialize are [`User`] and [`Track`]; `Repost` and
//! `Activity` complete the kind vocabulary used by activity
//! classification and per-kind reporting.

pub mod track;
pub mod user;

pub use track::Track;
pub use user::User;

use serde::{Deserialize, Serialize};

/// Identifier assigned by the remote API.
pub type EntityId = u64;

/// Discriminant of a normalized entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Track,
    Repost,
    Activity,
}

impl EntityKind {
    /// All kinds, in reporting order.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::User,
        EntityKind::Track,
        EntityKind::Repost,
        EntityKind::Activity,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Track => "track",
            EntityKind::Repost => "repost",
            EntityKind::Activity => "activity",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
