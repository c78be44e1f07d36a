//! Loads `RevealConfig` from `$XDG_CONFIG_HOME/ascii-reveal/config.toml` or an explicit path.

use std::path::{Path, PathBuf};

use ascii_reveal::RevealConfig;
use log::debug;

const APP_NAME: &str = "ascii-reveal";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// An explicit path must exist; without one the first installed config is used, if any.
pub fn load(path: Option<&Path>) -> Result<RevealConfig, ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match installed_config() {
            Some(path) => path,
            None => {
                debug!("no config file found, using defaults");
                return Ok(RevealConfig::default());
            },
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|source| ConfigError::Io { path: path.clone(), source })?;
    let config = toml::from_str(&content)
        .map_err(|source| ConfigError::Parse { path: path.clone(), source })?;
    debug!("loaded config from {}", path.display());
    Ok(config)
}

/// Get the location of the first found default config file.
///
/// Checks `$XDG_CONFIG_HOME/ascii-reveal/config.toml`, the same file under
/// `$XDG_CONFIG_DIRS`, then `~/.ascii-reveal.toml`.
#[cfg(not(windows))]
pub fn installed_config() -> Option<PathBuf> {
    xdg::BaseDirectories::with_prefix(APP_NAME).find_config_file(CONFIG_FILE).or_else(|| {
        let fallback = home::home_dir()?.join(format!(".{APP_NAME}.toml"));
        fallback.exists().then_some(fallback)
    })
}

#[cfg(windows)]
pub fn installed_config() -> Option<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join(APP_NAME).join(CONFIG_FILE))
        .filter(|path| path.exists())
}
