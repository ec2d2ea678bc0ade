//! Configuration file schema shared by `strata.toml` and `~/.strata/config.toml`

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strata_package::{Scope, ScopeSet};

/// One configuration file. Every section and key is optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreSection>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<ResolutionSection>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingSection>,
}

/// Artifact store location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    /// Store root directory; relative paths are taken from the file's directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ResolutionSection {
    /// Scope names followed during resolution (default: compile, runtime)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,

    /// Manifest fetches in flight per resolution level (default: 8)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_fetches: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// `tracing` filter directive, e.g. `info` or `strata_package=debug`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl Settings {
    /// Load and validate a configuration file.
    ///
    /// A relative `store.root` is rebased onto the file's directory.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let mut settings: Self =
            toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
                file: path.to_path_buf(),
                error: e,
            })?;

        if let (Some(base), Some(root)) = (
            path.parent(),
            settings.store.as_mut().and_then(|s| s.root.as_mut()),
        ) {
            if root.is_relative() {
                *root = base.join(&*root);
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(resolution) = &self.resolution {
            if let Some(scopes) = &resolution.scopes {
                parse_scopes(scopes)?;
            }
            if resolution.max_concurrent_fetches == Some(0) {
                return Err(ConfigError::InvalidValue {
                    field: "resolution.max_concurrent_fetches".to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
        }

        if let Some(filter) = self.logging.as_ref().and_then(|l| l.filter.as_deref()) {
            if filter.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "logging.filter".to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Layer `other` over `self`; keys set in `other` win
    pub fn merge(&mut self, other: &Settings) {
        if let Some(store) = &other.store {
            let target = self.store.get_or_insert_with(Default::default);
            if store.root.is_some() {
                target.root = store.root.clone();
            }
        }

        if let Some(resolution) = &other.resolution {
            let target = self.resolution.get_or_insert_with(Default::default);
            if resolution.scopes.is_some() {
                target.scopes = resolution.scopes.clone();
            }
            if resolution.max_concurrent_fetches.is_some() {
                target.max_concurrent_fetches = resolution.max_concurrent_fetches;
            }
        }

        if let Some(logging) = &other.logging {
            let target = self.logging.get_or_insert_with(Default::default);
            if logging.filter.is_some() {
                target.filter = logging.filter.clone();
            }
        }
    }
}

/// Parse scope names into a set; unknown names and empty lists are rejected
pub fn parse_scopes<S: AsRef<str>>(names: &[S]) -> ConfigResult<ScopeSet> {
    if names.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "resolution.scopes".to_string(),
            reason: "must name at least one scope".to_string(),
        });
    }

    names
        .iter()
        .map(|name| {
            Scope::parse(name.as_ref()).ok_or_else(|| ConfigError::InvalidValue {
                field: "resolution.scopes".to_string(),
                reason: format!(
                    "unknown scope '{}', expected one of compile, runtime, provided, system, test",
                    name.as_ref()
                ),
            })
        })
        .collect()
}
