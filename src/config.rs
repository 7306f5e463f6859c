//! Application configuration for routergen

use crate::error::{RoutergenError, RoutergenResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main routergen configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// File locations
    #[serde(default)]
    pub paths: ConfigPaths,
    /// Artifact generation switches
    #[serde(default)]
    pub generate: GenerateSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigPaths {
    /// Intent document location
    #[serde(default = "default_settings_file")]
    pub settings_file: PathBuf,
    /// Directory receiving generated artifacts
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateSettings {
    /// Emit live flush commands in the load-balance script instead of
    /// commented-out ones.
    #[serde(default)]
    pub destructive_routing: bool,
}

fn default_settings_file() -> PathBuf {
    PathBuf::from("config/settings.json")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("generated")
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self {
            settings_file: default_settings_file(),
            output_dir: default_output_dir(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paths: ConfigPaths::default(),
            generate: GenerateSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> RoutergenResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| RoutergenError::ConfigError(format!("Failed to read config: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| RoutergenError::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> RoutergenResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RoutergenError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| RoutergenError::ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Ensure the settings directory and the artifact directory exist
    pub fn ensure_directories(&self) -> RoutergenResult<()> {
        let mut dirs: Vec<&Path> = vec![&self.paths.output_dir];
        if let Some(parent) = self.paths.settings_file.parent() {
            if !parent.as_os_str().is_empty() {
                dirs.push(parent);
            }
        }

        for dir in dirs {
            std::fs::create_dir_all(dir).map_err(|e| {
                RoutergenError::ConfigError(format!("Failed to create directory {:?}: {}", dir, e))
            })?;
        }
        Ok(())
    }
}
