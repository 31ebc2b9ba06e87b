use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Last opened archetype document (reopened when no file argument
    /// is given).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_file: Option<PathBuf>,

    /// Directory containing the templates/ tree; defaults to the
    /// current working directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_root: Option<PathBuf>,

    /// Show desktop notifications for errors
    #[serde(default)]
    pub notifications: bool,

    /// Visible rows in list widgets
    #[serde(default = "default_list_rows")]
    pub list_rows: u16,
}

fn default_list_rows() -> u16 {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            last_file: None,
            template_root: None,
            notifications: false,
            list_rows: default_list_rows(),
        }
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("archet");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = match Self::config_path() {
            Ok(p) => p,
            Err(_) => return Ok(AppConfig::default()),
        };

        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Failed to parse config: {}", e),
                },
                Err(e) => tracing::warn!("Failed to read config: {}", e),
            }
        }

        let config = AppConfig::default();
        let _ = config.save();
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig {
            last_file: Some(PathBuf::from("/tmp/archetype.json")),
            template_root: Some(PathBuf::from("/usr/share/archet")),
            notifications: true,
            list_rows: 12,
        };

        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(config.last_file, deserialized.last_file);
        assert_eq!(config.template_root, deserialized.template_root);
        assert_eq!(config.list_rows, deserialized.list_rows);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.list_rows, 10);
        assert!(!config.notifications);
    }
}
