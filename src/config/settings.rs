use crate::view::pagination::PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/flowlens.json";
pub const DEFAULT_FLOW_QUERY_LIMIT: u32 = 500;
pub const DEFAULT_TAB: &str = "packets";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub page_size: u64,
    pub flow_query_limit: u32,
    pub default_tab: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            flow_query_limit: DEFAULT_FLOW_QUERY_LIMIT,
            default_tab: DEFAULT_TAB.to_string(),
        }
    }
}

impl ViewConfig {
    fn normalized(mut self) -> Self {
        if self.page_size == 0 {
            log::warn!("page_size of 0 in config, using {}", PAGE_SIZE);
            self.page_size = PAGE_SIZE;
        }
        if self.default_tab.is_empty() {
            self.default_tab = DEFAULT_TAB.to_string();
        }
        self
    }
}

pub fn load_config_from(path: impl AsRef<Path>) -> Result<ViewConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ViewConfig = serde_json::from_str(&content)?;
    Ok(config.normalized())
}

/// Loads the config at `path`, falling back to defaults on any problem.
pub fn load_config(path: Option<&Path>) -> ViewConfig {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));

    if path.exists() {
        match load_config_from(path) {
            Ok(config) => {
                log::info!("Loaded configuration from {}", path.display());
                return config;
            }
            Err(e) => {
                log::warn!("{}. Using defaults.", e);
            }
        }
    }

    log::debug!("Using default configuration");
    ViewConfig::default()
}

pub fn save_config(path: impl AsRef<Path>, config: &ViewConfig) -> Result<(), ConfigError> {
    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: ViewConfig = serde_json::from_str(r#"{"page_size": 50}"#).unwrap();
        assert_eq!(config.page_size, 50);
        assert_eq!(config.flow_query_limit, DEFAULT_FLOW_QUERY_LIMIT);
        assert_eq!(config.default_tab, "packets");
    }

    #[test]
    fn zero_page_size_is_replaced() {
        let config: ViewConfig = serde_json::from_str(r#"{"page_size": 0}"#).unwrap();
        assert_eq!(config.normalized().page_size, PAGE_SIZE);
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("flowlens-config-{}.json", std::process::id()));
        let config = ViewConfig {
            page_size: 100,
            ..Default::default()
        };
        save_config(&path, &config).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), config);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn unreadable_config_falls_back() {
        let path = Path::new("/nonexistent/flowlens.json");
        assert!(matches!(load_config_from(path), Err(ConfigError::Io(_))));
        assert_eq!(load_config(Some(path)), ViewConfig::default());
    }
}
