//! CLI subcommands.

pub mod config;
pub mod extract;
pub mod run;

use std::path::{Path, PathBuf};

use propsig_core::PropsigConfig;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("propsig")
        .join("config.json")
}

/// Load the explicit config file, else the default one if it exists, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<PropsigConfig> {
    if let Some(path) = config_path {
        return Ok(PropsigConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        Ok(PropsigConfig::from_file(&default_path)?)
    } else {
        Ok(PropsigConfig::default())
    }
}
