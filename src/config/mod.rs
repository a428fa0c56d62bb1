//! Bridge configuration
//!
//! Settings live in `~/.config/bufbridge/bridge.json`; every field is
//! optional. The user init script sits next to it as `init.rhai`.

mod settings;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use settings::{BridgeSettings, FRAME_BYTES};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Get the config directory path
/// Uses ~/.config/bufbridge/ on all platforms for consistency
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".config").join("bufbridge"))
}

/// Get the default settings file path
pub fn settings_file() -> Option<PathBuf> {
    config_dir().map(|p| p.join("bridge.json"))
}

/// Get the user init script path
pub fn init_script() -> Option<PathBuf> {
    config_dir().map(|p| p.join("init.rhai"))
}

/// Load settings from a JSON file
pub fn load(path: &Path) -> Result<BridgeSettings, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the default settings file if it exists
pub fn load_default() -> Result<BridgeSettings, ConfigError> {
    match settings_file() {
        Some(path) if path.exists() => load(&path),
        _ => Ok(BridgeSettings::default()), // No config file is fine
    }
}
