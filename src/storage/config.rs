use std::path::{Path, PathBuf};

use anyhow::anyhow;
use twid_core::models::settings::{Config, FileConfig};

pub const CONFIG_FILE: &str = "twid.config.json";

/// `<config dir>/twid/twid.config.json`, consulted when the working
/// directory has no config file.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("twid").join(CONFIG_FILE))
}

pub fn read_file_config(path: &Path) -> anyhow::Result<FileConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read config {}: {}", path.display(), e))?;
    serde_json::from_str(&raw)
        .map_err(|e| anyhow!("Invalid config {}: {}", path.display(), e))
}

/// Layers the config file over `base`. An explicit path must exist; the
/// default locations are optional.
pub fn load_config(base: Config, explicit: Option<&Path>) -> anyhow::Result<Config> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => std::iter::once(PathBuf::from(CONFIG_FILE))
            .chain(user_config_path())
            .find(|p| p.is_file()),
    };

    match path {
        Some(path) => Ok(base.merge_file(read_file_config(&path)?)),
        None => Ok(base),
    }
}
