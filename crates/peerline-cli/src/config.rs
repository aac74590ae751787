//! Configuration loading from TOML files

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global configuration for peerline
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub extract: ExtractConfig,
    pub join: JoinConfig,
    pub provenance: ProvenanceConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub default_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_dir: PathBuf::from("./output"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub batch_size: usize,
    pub max_workers: usize,
    pub lookup_path: PathBuf,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        let defaults = peerline_extract::Config::default();
        Self {
            batch_size: defaults.batch_size,
            max_workers: defaults.max_workers,
            lookup_path: defaults.lookup_path,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JoinConfig {
    pub column: String,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            column: peerline_join::DEFAULT_JOIN_COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvenanceConfig {
    pub attribution_url: String,
    pub source_url: String,
}

impl Default for ProvenanceConfig {
    fn default() -> Self {
        let defaults = peerline_join::Provenance::default();
        Self {
            attribution_url: defaults.attribution_url,
            source_url: defaults.source_url,
        }
    }
}

impl From<&ProvenanceConfig> for peerline_join::Provenance {
    fn from(p: &ProvenanceConfig) -> Self {
        Self {
            attribution_url: p.attribution_url.clone(),
            source_url: p.source_url.clone(),
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./peerline.toml (current directory)
    /// 2. ~/.config/peerline/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("peerline.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "peerline") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}
