//! Unified error type surfaced by the engine.
//!
//! Player-facing failures (unknown command, missing target) are never errors;
//! they are delivered over the entity's message channel. `EngineError` covers
//! registry construction problems, snapshot corruption, and content failures
//! severe enough to halt the zone loop.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("capability {0:?} is already registered")]
    DuplicateCapability(&'static str),

    #[error("command {0:?} is already registered")]
    DuplicateCommand(&'static str),

    #[error("invalid pattern {pattern:?} for command {command:?}")]
    InvalidPattern {
        command: &'static str,
        pattern: &'static str,
        #[source]
        source: Box<regex::Error>,
    },

    #[error("hook declared by {capability:?} targets a handler that is not registered")]
    UnknownHookTarget { capability: &'static str },

    #[error("no such capability {0:?}")]
    UnknownCapability(String),

    #[error("malformed record for capability {name:?}")]
    BadRecord {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize capability {name:?}")]
    SerializeRecord {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("content failure: {0}")]
    Content(String),
}
