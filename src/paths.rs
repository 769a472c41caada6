//! Configuration directory resolution
//!
//! Priority:
//! 1. `--conf-dir` flag
//! 2. `HEARTH_CONFIG_DIR` environment variable (read by clap into the flag)
//! 3. `~/hearth`

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "HEARTH_CONFIG_DIR";

/// Name of the default config directory under `$HOME`
const DEFAULT_DIR_NAME: &str = "hearth";

/// Resolve the configuration directory from the flag (or its env fallback)
pub fn config_dir(flag: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = flag {
        let path = expand(dir);
        log::debug!("Using config dir: {}", path.display());
        return Ok(path);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(DEFAULT_DIR_NAME))
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}
