//! Plain-record forms of entities and zones for persistence.
//!
//! Records hold only strings, numbers, bools, lists, and maps so the on-disk
//! document stays forward-compatible: a loader encountering an unknown
//! capability name skips it with a warning instead of failing the load.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::EntityId;
use crate::mode::Mode;

/// One persisted entity: identity, mode (tagged by mode name), and the full
/// map of capability records (each tagged by capability name).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    pub name: String,
    pub desc: String,
    pub hearing: bool,
    pub mode: Option<Mode>,
    #[serde(default)]
    pub components: BTreeMap<String, Value>,
}

/// The persisted snapshot document: `{ "entities": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSnapshot {
    pub entities: Vec<EntityRecord>,
}
