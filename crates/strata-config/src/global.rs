//! Global configuration (~/.strata/config.toml)

use crate::settings::Settings;
use crate::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};

/// The global configuration directory (~/.strata)
pub fn global_config_dir() -> ConfigResult<PathBuf> {
    let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
    Ok(home.join(".strata"))
}

/// The global config file path (~/.strata/config.toml)
pub fn global_config_path() -> ConfigResult<PathBuf> {
    Ok(global_config_dir()?.join("config.toml"))
}

/// Load the global configuration at `path`; a missing file yields defaults
pub fn load_global(path: &Path) -> ConfigResult<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    Settings::load_from_file(path)
}
