//! Per-entity input interpretation modes.
//!
//! An entity is always in exactly one mode. `Action` parses free text against
//! the registered command patterns; `Disambiguate` is entered when a command
//! matched multiple candidate targets and interprets the next input as a
//! 1-based index into the candidate list. Input that is not a valid index
//! falls through to Action-mode processing so players can type a new command
//! to escape disambiguation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Mode {
    Action,
    Disambiguate(DisambiguateState),
}

/// Pending command captured when a selection was ambiguous. On the next
/// input the entity reverts to `previous` first, then either re-invokes the
/// pending command with the chosen candidate bound into `slot`, or processes
/// the raw input normally.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisambiguateState {
    pub previous: Box<Mode>,
    /// Registered name of the pending command.
    pub command: String,
    /// Captures bound so far, including the ambiguous descriptor.
    pub captures: BTreeMap<String, String>,
    /// Capture slot the chosen candidate id is written into.
    pub slot: String,
    /// Candidate entity ids in the order they were presented.
    pub candidates: Vec<EntityId>,
}
