//! Top-level configuration file

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "configuration.yaml";

/// The sections the server knows about
///
/// Each integration validates its own section; unknown top-level keys are
/// kept out of the way so one file can carry settings for other tools.
#[derive(Debug, Default, Deserialize)]
pub struct CoreConfig {
    #[serde(default)]
    pub homekit: Option<serde_yaml::Value>,
    #[serde(default)]
    pub tradfri: Option<serde_yaml::Value>,
}

impl CoreConfig {
    pub fn parse(content: &str) -> Result<Self> {
        // An empty file is an empty mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).context("Failed to parse configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections() {
        let config = CoreConfig::parse(
            r#"
homekit:
  port: 51828
tradfri:
  host: 192.168.1.10
recorder:
  purge_keep_days: 3
"#,
        )
        .unwrap();

        assert!(config.homekit.is_some());
        assert_eq!(
            config.tradfri.unwrap()["host"],
            serde_yaml::Value::from("192.168.1.10")
        );
    }

    #[test]
    fn test_empty_file() {
        let config = CoreConfig::parse("\n").unwrap();
        assert!(config.homekit.is_none());
        assert!(config.tradfri.is_none());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(CoreConfig::parse("homekit: [").is_err());
    }
}
