//! Strata Configuration System
//!
//! Layered configuration for the strata tools:
//! - Project configuration (strata.toml, found by walking up from the working directory)
//! - Global user configuration (~/.strata/config.toml)
//! - Environment overrides (STRATA_STORE_ROOT, STRATA_SCOPES, STRATA_MAX_FETCHES, STRATA_LOG)
//!
//! # Configuration Hierarchy
//!
//! Later sources override earlier ones:
//! 1. Global config (~/.strata/config.toml)
//! 2. Project config (./strata.toml)
//! 3. Environment variables (STRATA_*)
//! 4. CLI flags
//!
//! # Example
//!
//! ```no_run
//! use strata_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! let options = config.resolve_options().unwrap();
//! ```

pub mod global;
pub mod loader;
pub mod settings;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

pub use loader::{Config, ConfigLoader, PROJECT_FILE};
pub use settings::{LoggingSection, ResolutionSection, Settings, StoreSection};
