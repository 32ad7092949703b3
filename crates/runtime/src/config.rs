//! World configuration, read from `<world>/config.toml`.
//!
//! Every field has a default, so a missing file yields a fully usable
//! configuration; a malformed file is a fatal startup error.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RuntimeError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub zone: ZoneConfig,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    pub name: String,
    /// Fixed rng seed for reproducible worlds; entropy-seeded when unset.
    pub seed: Option<u64>,
    /// Zone tick period in milliseconds. Zero disables the ticker.
    pub tick_ms: u64,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            seed: None,
            tick_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub listen: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:4000".to_string(),
        }
    }
}

impl WorldConfig {
    pub fn load(world_dir: &Path) -> Result<Self> {
        let path = world_dir.join("config.toml");
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file; using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path).map_err(|source| RuntimeError::Io {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| RuntimeError::Config { path, source })
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.zone.tick_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = WorldConfig::load(dir.path()).unwrap();
        assert_eq!(config.zone.name, "default");
        assert_eq!(config.zone.tick_ms, 1000);
        assert!(config.zone.seed.is_none());
    }

    #[test]
    fn partial_file_keeps_unset_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.toml"),
            "[zone]\nname = \"arena\"\nseed = 7\n",
        )
        .unwrap();
        let config = WorldConfig::load(dir.path()).unwrap();
        assert_eq!(config.zone.name, "arena");
        assert_eq!(config.zone.seed, Some(7));
        assert_eq!(config.zone.tick_ms, 1000);
        assert_eq!(config.gateway.listen, "127.0.0.1:4000");
    }

    #[test]
    fn malformed_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.toml"), "zone = \"not a table\"").unwrap();
        assert!(matches!(
            WorldConfig::load(dir.path()),
            Err(RuntimeError::Config { .. })
        ));
    }
}
