//! Configuration Loader
//!
//! Loads configuration from multiple sources and merges them with proper precedence.

use crate::global;
use crate::settings::{parse_scopes, Settings};
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};
use strata_package::{ResolveOptions, Scope, ScopeSet};

/// Project configuration file name
pub const PROJECT_FILE: &str = "strata.toml";

/// Default `tracing` filter when nothing is configured
pub const DEFAULT_LOG_FILTER: &str = "warn";

pub const ENV_STORE_ROOT: &str = "STRATA_STORE_ROOT";
pub const ENV_SCOPES: &str = "STRATA_SCOPES";
pub const ENV_MAX_FETCHES: &str = "STRATA_MAX_FETCHES";
pub const ENV_LOG: &str = "STRATA_LOG";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.strata/config.toml) - lowest priority
/// 2. Project config (strata.toml) - overrides global
/// 3. Environment variables (STRATA_*) - overrides project
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub settings: Settings,

    /// Directory where strata.toml was found
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Loader reading its global configuration from `path` instead of the home directory
    pub fn with_global_path(path: impl Into<PathBuf>) -> Self {
        Self {
            global_config_path: Some(path.into()),
        }
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find strata.toml, layers it over the
    /// global config, then applies environment overrides.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project) = self.find_project_config(start_dir)?;
        self.finish(project_root, project)
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project = Settings::load_from_file(config_path)?;
        let project_root = config_path.parent().map(|p| p.to_path_buf());
        self.finish(project_root, project)
    }

    fn finish(&mut self, project_root: Option<PathBuf>, project: Settings) -> ConfigResult<Config> {
        let mut settings = self.load_global_config()?;
        settings.merge(&project);
        apply_env_overrides(&mut settings)?;
        settings.validate()?;

        Ok(Config {
            settings,
            project_root,
        })
    }

    /// Find project configuration by walking up directory tree
    fn find_project_config(&self, start_dir: &Path) -> ConfigResult<(Option<PathBuf>, Settings)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_FILE);

            if config_path.is_file() {
                let settings = Settings::load_from_file(&config_path)?;
                return Ok((Some(current), settings));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, Settings::default())),
            }
        }
    }

    fn load_global_config(&mut self) -> ConfigResult<Settings> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => match global::global_config_path() {
                Ok(path) => {
                    self.global_config_path = Some(path.clone());
                    path
                }
                // No home directory means no global config
                Err(ConfigError::HomeNotFound) => return Ok(Settings::default()),
                Err(e) => return Err(e),
            },
        };

        global::load_global(&path)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply STRATA_* environment overrides
fn apply_env_overrides(settings: &mut Settings) -> ConfigResult<()> {
    if let Some(root) = env_var(ENV_STORE_ROOT) {
        settings.store.get_or_insert_with(Default::default).root = Some(PathBuf::from(root));
    }

    if let Some(scopes) = env_var(ENV_SCOPES) {
        let names: Vec<String> = scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        settings.resolution.get_or_insert_with(Default::default).scopes = Some(names);
    }

    if let Some(max) = env_var(ENV_MAX_FETCHES) {
        let max = max.trim().parse::<usize>().map_err(|_| ConfigError::InvalidValue {
            field: ENV_MAX_FETCHES.to_string(),
            reason: format!("expected a positive integer, got '{}'", max),
        })?;
        settings
            .resolution
            .get_or_insert_with(Default::default)
            .max_concurrent_fetches = Some(max);
    }

    if let Some(filter) = env_var(ENV_LOG) {
        settings.logging.get_or_insert_with(Default::default).filter = Some(filter);
    }

    Ok(())
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Store root directory, if configured anywhere
    pub fn store_root(&self) -> Option<&Path> {
        self.settings.store.as_ref()?.root.as_deref()
    }

    /// Effective scope set (configured, or compile + runtime)
    pub fn scopes(&self) -> ConfigResult<ScopeSet> {
        match self
            .settings
            .resolution
            .as_ref()
            .and_then(|r| r.scopes.as_ref())
        {
            Some(names) => parse_scopes(names),
            None => Ok(Scope::runtime_scopes()),
        }
    }

    pub fn max_concurrent_fetches(&self) -> usize {
        self.settings
            .resolution
            .as_ref()
            .and_then(|r| r.max_concurrent_fetches)
            .unwrap_or(ResolveOptions::DEFAULT_MAX_CONCURRENT_FETCHES)
    }

    /// Effective `tracing` filter directive
    pub fn log_filter(&self) -> &str {
        self.settings
            .logging
            .as_ref()
            .and_then(|l| l.filter.as_deref())
            .unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Resolver options derived from this configuration
    pub fn resolve_options(&self) -> ConfigResult<ResolveOptions> {
        Ok(ResolveOptions::default()
            .with_scopes(self.scopes()?)
            .with_max_concurrent_fetches(self.max_concurrent_fetches()))
    }

    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if a strata.toml was found
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }
}
