//! Config path resolution helpers.

use std::path::PathBuf;

pub const CONFIG_FILE_NAME: &str = "hystore.toml";
pub const STATE_FILE_NAME: &str = "state.json";

/// `<config_dir>/hystore`, e.g. `~/.config/hystore` on Linux
pub fn default_config_dir() -> anyhow::Result<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join("hystore");
    Ok(dir)
}
