//! Configuration Layer Management
//!
//! Resolves the configuration for a CLI invocation: an explicit `--config`,
//! otherwise a local `.hat.yml`/`.hat.yaml`, otherwise the defaults.

use std::path::{Path, PathBuf};

use hat_rs::HatConfig;
use tracing::debug;

/// File names picked up from the working directory when `--config` is absent.
pub const IMPLICIT_CONFIG_FILES: [&str; 2] = [".hat.yml", ".hat.yaml"];

/// Locate the configuration file to load, if any.
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => IMPLICIT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists()),
    }
}

/// Load and validate the layered configuration.
pub fn load_configuration(explicit: Option<&Path>) -> anyhow::Result<HatConfig> {
    let config = match config_path(explicit) {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            HatConfig::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!(
                    "Failed to load configuration from {}: {}",
                    path.display(),
                    e
                )
            })?
        }
        None => HatConfig::default(),
    };

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}
