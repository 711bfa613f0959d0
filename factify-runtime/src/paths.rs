use std::path::{Path, PathBuf};

use anyhow::Context;

const APP_DIR: &str = "factify";
const CONFIG_FILE: &str = "config.json";
const HISTORY_FILE: &str = "history.json";
const CREDENTIALS_FILE: &str = "credentials.json";

/// `<config dir>/factify/config.json` for the current platform.
pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let base = dirs::config_dir().context("no config directory for this platform")?;
    Ok(base.join(APP_DIR).join(CONFIG_FILE))
}

/// History lives beside whichever config file is in use.
pub fn history_path_for(config_path: &Path) -> PathBuf {
    sibling(config_path, HISTORY_FILE)
}

/// Token file used when the OS keyring is unavailable.
pub fn credentials_path_for(config_path: &Path) -> PathBuf {
    sibling(config_path, CREDENTIALS_FILE)
}

fn sibling(config_path: &Path, name: &str) -> PathBuf {
    match config_path.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}
