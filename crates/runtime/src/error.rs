use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The zone worker has exited; its input queue is gone.
    #[error("zone worker unavailable")]
    WorkerClosed,

    #[error(transparent)]
    Engine(#[from] mudlark_engine::EngineError),

    #[error("config {path}: {source}")]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("snapshot encoding: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("gateway: {0}")]
    Gateway(std::io::Error),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
