//! Configuration system for Redraft.
//!
//! One YAML file resolved through a fallback chain:
//! 1. Explicit path (--config)
//! 2. .redraft.yml in the current directory (project config)
//! 3. ~/.config/redraft/redraft.yml (user config)
//! 4. Default values

mod global;

pub use global::{GlobalConfig, LlmSettings, RefineSettings, StorageSettings};

/// Default maximum generator/reviewer cycles; the configured value always wins.
pub const DEFAULT_MAX_ITERATIONS: u32 = 5;

/// Default generation model.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Load configuration from the standard search paths.
pub fn load_config(explicit_path: Option<&std::path::PathBuf>) -> eyre::Result<GlobalConfig> {
    GlobalConfig::load(explicit_path)
}
