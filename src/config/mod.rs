use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::share::OpenMode;

/// Configuration for one chunk-writer handle pool
///
/// Created once per upload target; the share, path, and open mode are fixed
/// for the pool's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Share the target file lives on
    pub share: String,

    /// Path of the target file within the share
    pub path: String,

    /// Open disposition used for every handle the pool opens
    #[serde(default = "default_mode")]
    pub mode: OpenMode,

    /// Timeout in seconds for connection acquisition, file open, and
    /// file close performed by the pool
    #[serde(default = "default_open_timeout")]
    pub open_timeout: u64,
}

fn default_mode() -> OpenMode {
    OpenMode::Write
}

fn default_open_timeout() -> u64 {
    30
}

impl PoolConfig {
    /// Create a configuration with default mode and timeout
    pub fn new(share: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            share: share.into(),
            path: path.into(),
            mode: default_mode(),
            open_timeout: default_open_timeout(),
        }
    }

    /// Open timeout as a [`Duration`]
    pub fn open_timeout(&self) -> Duration {
        Duration::from_secs(self.open_timeout)
    }
}

/// Load configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<PoolConfig> {
    let content = std::fs::read_to_string(path.as_ref())
        .context(format!("Failed to read config file: {:?}", path.as_ref()))?;

    let config: PoolConfig =
        serde_yaml::from_str(&content).context("Failed to parse YAML configuration")?;

    Ok(config)
}

/// Load configuration from environment variables
///
/// Supported variables:
/// - SHAREPOOL_SHARE (required)
/// - SHAREPOOL_PATH (required)
/// - SHAREPOOL_MODE (optional: "write" or "create_truncate")
/// - SHAREPOOL_OPEN_TIMEOUT (optional, seconds)
pub fn load_from_env() -> Result<PoolConfig> {
    // Try to load .env file if it exists (don't fail if it doesn't)
    let _ = dotenvy::dotenv();

    let share = std::env::var("SHAREPOOL_SHARE")
        .context("SHAREPOOL_SHARE environment variable not set")?;

    let path =
        std::env::var("SHAREPOOL_PATH").context("SHAREPOOL_PATH environment variable not set")?;

    let mut config = PoolConfig::new(share, path);

    if let Ok(mode) = std::env::var("SHAREPOOL_MODE") {
        config.mode = match mode.as_str() {
            "write" => OpenMode::Write,
            "create_truncate" => OpenMode::CreateTruncate,
            other => anyhow::bail!("Unknown SHAREPOOL_MODE: {}", other),
        };
    }

    if let Ok(timeout) = std::env::var("SHAREPOOL_OPEN_TIMEOUT") {
        config.open_timeout = timeout
            .parse()
            .context("SHAREPOOL_OPEN_TIMEOUT is not a valid number of seconds")?;
    }

    Ok(config)
}

/// Load configuration from file or environment
///
/// Tries the YAML file when a path is given, otherwise falls back to
/// environment variables.
pub fn load_config(config_path: Option<&str>) -> Result<PoolConfig> {
    if let Some(path) = config_path {
        load_from_yaml(path)
    } else {
        load_from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_yaml() {
        let yaml = r#"
share: backups
path: vm-image.bin
mode: create_truncate
open_timeout: 10
"#;

        let config: PoolConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.share, "backups");
        assert_eq!(config.path, "vm-image.bin");
        assert_eq!(config.mode, OpenMode::CreateTruncate);
        assert_eq!(config.open_timeout, 10);
        assert_eq!(config.open_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_default_values() {
        let yaml = r#"
share: media
path: upload.dat
"#;

        let config: PoolConfig = serde_yaml::from_str(yaml).unwrap();

        // Should use default mode and timeout
        assert_eq!(config.mode, OpenMode::Write);
        assert_eq!(config.open_timeout, 30);
    }
}
