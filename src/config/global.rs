//! Global configuration.
//!
//! Loaded from ~/.config/redraft/redraft.yml or .redraft.yml

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::review::AcceptanceCriteria;

/// Global configuration for Redraft.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Generation client settings.
    pub llm: LlmSettings,

    /// Refine loop settings.
    pub refine: RefineSettings,

    /// Acceptance criteria for the rule reviewer.
    pub criteria: AcceptanceCriteria,

    /// Session store settings.
    pub storage: StorageSettings,
}

impl GlobalConfig {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. .redraft.yml in current directory
    /// 3. ~/.config/redraft/redraft.yml
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path)
                .context(format!("Failed to load config from {}", path.display()));
        }

        let project_config = PathBuf::from(".redraft.yml");
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(config) => {
                    log::info!("Loaded config from .redraft.yml");
                    return Ok(config);
                }
                Err(e) => {
                    log::warn!("Failed to load .redraft.yml: {}", e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("redraft").join("redraft.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", user_config.display());
                        return Ok(config);
                    }
                    Err(e) => {
                        log::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.refine.max_iterations == 0 {
            eyre::bail!("refine.max_iterations must be > 0");
        }
        if self.llm.timeout_ms == 0 {
            eyre::bail!("llm.timeout-ms must be > 0");
        }
        if self.criteria.min_length > self.criteria.max_length {
            eyre::bail!(
                "criteria.min_length ({}) exceeds criteria.max_length ({})",
                self.criteria.min_length,
                self.criteria.max_length
            );
        }
        Ok(())
    }

    /// Resolve the session database path, defaulting under the local data dir.
    pub fn db_path(&self) -> PathBuf {
        self.storage.db_path.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("redraft")
                .join("sessions.db")
        })
    }
}

/// Generation client settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Model identifier.
    pub model: String,

    /// Timeout per generation call in milliseconds.
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Max tokens per response.
    pub max_tokens: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: crate::config::DEFAULT_MODEL.to_string(),
            timeout_ms: 300_000,
            max_tokens: 4096,
        }
    }
}

/// Refine loop settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RefineSettings {
    /// Maximum generator/reviewer cycles before giving up.
    pub max_iterations: u32,
}

impl Default for RefineSettings {
    fn default() -> Self {
        Self {
            max_iterations: crate::config::DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Session store settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Explicit database path; defaults under the local data directory.
    pub db_path: Option<PathBuf>,
}
