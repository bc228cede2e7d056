//! Normalized entity store.
//!
//! Entities live as shallow JSON field maps keyed by
//! ([`EntityKind`], [`EntityId`]). Merging never deletes: fields
//! present in the incoming payload overwrite, fields absent from it
//! are left untouched. That makes re-fetching a collection safe and
//! lets sparse payloads (an embedded uploader, say) coexist with
//! fuller ones fetched later.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{Map, Value};

use crate::entity::{EntityId, EntityKind, Track, User};

/// Field map of one entity.
pub type FieldMap = Map<String, Value>;

/// A batch of normalized entities ready to merge into the store.
///
/// Built by the normalization step, applied atomically by
/// [`EntityStore::merge`]. Inserting the same (kind, id) twice overlays
/// fields, so one page mentioning an entity repeatedly collapses to a
/// single entry.
#[derive(Debug, Clone, Default)]
pub struct EntityDelta {
    entries: HashMap<EntityKind, HashMap<EntityId, FieldMap>>,
}

impl EntityDelta {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity's fields, overlaying any fields already queued for
    /// the same (kind, id).
    pub fn insert(&mut self, kind: EntityKind, id: EntityId, fields: FieldMap) {
        let slot = self
            .entries
            .entry(kind)
            .or_default()
            .entry(id)
            .or_default();
        for (key, value) in fields {
            slot.insert(key, value);
        }
    }

    /// Number of distinct (kind, id) entries queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(HashMap::is_empty)
    }

    #[must_use]
    pub fn get(&self, kind: EntityKind, id: EntityId) -> Option<&FieldMap> {
        self.entries.get(&kind)?.get(&id)
    }
}

/// In-memory store of normalized entities.
///
/// Shared between the pagination loop and spawned favorites tasks;
/// all access goes through one mutex, which is enough because every
/// operation is a short map update.
#[derive(Debug, Default)]
pub struct EntityStore {
    entities: Mutex<HashMap<(EntityKind, EntityId), FieldMap>>,
}

impl EntityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a delta into the store.
    ///
    /// Creates absent entities and overlays fields onto existing ones.
    /// Returns the number of entries applied.
    pub fn merge(&self, delta: EntityDelta) -> usize {
        let mut entities = self.lock();
        let mut applied = 0;
        for (kind, batch) in delta.entries {
            for (id, fields) in batch {
                let slot = entities.entry((kind, id)).or_default();
                for (key, value) in fields {
                    slot.insert(key, value);
                }
                applied += 1;
            }
        }
        applied
    }

    /// Fields of one entity, if present.
    #[must_use]
    pub fn get(&self, kind: EntityKind, id: EntityId) -> Option<FieldMap> {
        self.lock().get(&(kind, id)).cloned()
    }

    /// Typed view of a stored user.
    ///
    /// `None` when absent or when the stored fields do not form a valid
    /// user.
    #[must_use]
    pub fn get_user(&self, id: EntityId) -> Option<User> {
        let fields = self.get(EntityKind::User, id)?;
        serde_json::from_value(Value::Object(fields)).ok()
    }

    /// Typed view of a stored track.
    #[must_use]
    pub fn get_track(&self, id: EntityId) -> Option<Track> {
        let fields = self.get(EntityKind::Track, id)?;
        serde_json::from_value(Value::Object(fields)).ok()
    }

    #[must_use]
    pub fn contains(&self, kind: EntityKind, id: EntityId) -> bool {
        self.lock().contains_key(&(kind, id))
    }

    /// Number of stored entities of one kind.
    #[must_use]
    pub fn count(&self, kind: EntityKind) -> usize {
        self.lock().keys().filter(|(k, _)| *k == kind).count()
    }

    /// Total number of stored entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Render the whole store as one JSON value, kind → id → fields.
    ///
    /// Intended for handing the normalized result to an external
    /// persistence layer.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        let entities = self.lock();
        let mut by_kind: Map<String, Value> = Map::new();
        for ((kind, id), fields) in entities.iter() {
            let kind_map = by_kind
                .entry(kind.as_str().to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(map) = kind_map {
                map.insert(id.to_string(), Value::Object(fields.clone()));
            }
        }
        Value::Object(by_kind)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(EntityKind, EntityId), FieldMap>> {
        self.entities.lock().unwrap_or_else(|e| e.into_inner())
    }
}
