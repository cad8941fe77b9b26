//! Build settings (`loomql.toml`)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildSettings {
    #[serde(default)]
    pub schema: SchemaSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl BuildSettings {
    /// Load settings from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Settings file does not exist, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&content).map_err(|e| ConfigError::parse(e.to_string()))?;
        settings.validate().map_err(ConfigError::validation)?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.schema.paths.is_empty() {
            return Err("schema.paths must name at least one file or directory".into());
        }
        if self.store.dir.as_os_str().is_empty() {
            return Err("store.dir must not be empty".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaSettings {
    /// Schema documents: files or directories, applied in order
    #[serde(default = "default_schema_paths")]
    pub paths: Vec<PathBuf>,
    /// Model catalogs describing the classes models are built from
    #[serde(default)]
    pub models: Vec<PathBuf>,
}

fn default_schema_paths() -> Vec<PathBuf> {
    vec![PathBuf::from("schema")]
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            paths: default_schema_paths(),
            models: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Directory persisted artifacts are written to
    #[serde(default = "default_store_dir")]
    pub dir: PathBuf,
    /// Mixed into every schema hash so a deploy can force regeneration
    #[serde(default)]
    pub salt: String,
}

fn default_store_dir() -> PathBuf {
    PathBuf::from(".loomql")
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
            salt: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
