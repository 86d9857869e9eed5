//! Bridge configuration
//!
//! Settings are layered: built-in defaults, then the JSON config file
//! (`<config dir>/diagbridge/config.json` unless a path is given), then
//! `DIAGBRIDGE_*` environment variables. Command line flags are applied on
//! top by the caller.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::surface::RevealKind;

pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8765";
pub const DEFAULT_RECIPIENT: &str = "Cursor";
pub const DEFAULT_RELAY_BIND: &str = "127.0.0.1:8765";
/// End column of every selection. Not derived from the line length.
pub const DEFAULT_SELECTION_WIDTH: u32 = 100;

pub const ENV_ENDPOINT: &str = "DIAGBRIDGE_ENDPOINT";
pub const ENV_RECIPIENT: &str = "DIAGBRIDGE_RECIPIENT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// WebSocket endpoint diagnosis events arrive on
    pub endpoint: String,
    /// Identity events must be addressed to
    pub recipient: String,
    pub selection_width: u32,
    pub reveal: RevealKind,
    /// Base directory for relative paths in events
    pub workspace_root: Option<PathBuf>,
    /// External editor command template; empty means headless
    pub editor_command: Vec<String>,
    pub relay_bind: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            recipient: DEFAULT_RECIPIENT.to_string(),
            selection_width: DEFAULT_SELECTION_WIDTH,
            reveal: RevealKind::default(),
            workspace_root: None,
            editor_command: Vec::new(),
            relay_bind: DEFAULT_RELAY_BIND.to_string(),
        }
    }
}

impl BridgeConfig {
    /// Default location of the config file
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().ok_or(BridgeError::ConfigDirNotFound)?;
        Ok(dir.join("diagbridge").join("config.json"))
    }

    /// Read the config file, returns defaults if it does not exist
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: BridgeConfig = serde_json::from_str(&content)?;
        log::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Load from `path` (or the default location) and apply the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match Self::default_path() {
                Ok(p) => Self::from_file(&p)?,
                Err(BridgeError::ConfigDirNotFound) => Self::default(),
                Err(e) => return Err(e),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override fields from environment lookups
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            self.endpoint = endpoint;
        }
        if let Some(recipient) = lookup(ENV_RECIPIENT) {
            self.recipient = recipient;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("ws://") || self.endpoint.starts_with("wss://")) {
            return Err(BridgeError::invalid_config(format!(
                "endpoint must be a ws:// or wss:// URL, got {}",
                self.endpoint
            )));
        }
        if self.recipient.trim().is_empty() {
            return Err(BridgeError::invalid_config("recipient must not be empty"));
        }
        if self.selection_width == 0 {
            return Err(BridgeError::invalid_config(
                "selection_width must be greater than 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.endpoint, "ws://localhost:8765");
        assert_eq!(config.recipient, "Cursor");
        assert_eq!(config.selection_width, 100);
        assert_eq!(config.reveal, RevealKind::InCenter);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BridgeConfig::from_file(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"recipient": "Zed", "reveal": "at_top", "editor_command": ["zed", "{path}:{line}"]}"#,
        )
        .unwrap();

        let config = BridgeConfig::from_file(&path).unwrap();
        assert_eq!(config.recipient, "Zed");
        assert_eq!(config.reveal, RevealKind::AtTop);
        assert_eq!(config.editor_command.len(), 2);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            BridgeConfig::from_file(&path),
            Err(BridgeError::Json(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [(ENV_RECIPIENT, "Other"), (ENV_ENDPOINT, "ws://127.0.0.1:9000")]
            .into_iter()
            .collect();
        let mut config = BridgeConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.recipient, "Other");
        assert_eq!(config.endpoint, "ws://127.0.0.1:9000");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = BridgeConfig {
            endpoint: "http://localhost:8765".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.endpoint = DEFAULT_ENDPOINT.to_string();
        config.recipient = "  ".to_string();
        assert!(config.validate().is_err());

        config.recipient = "Cursor".to_string();
        config.selection_width = 0;
        assert!(config.validate().is_err());
    }
}
