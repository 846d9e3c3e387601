//! Centralized path management for broll.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Get the broll config directory
pub fn broll_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Unable to determine user config directory")?
        .join("broll");

    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("creating config directory at {}", config_dir.display()))?;

    Ok(config_dir)
}

/// Directory where downloaded clips are materialized, keyed by URL hash.
///
/// Not created here; resolution only reads from it.
pub fn remote_clip_cache_dir() -> Result<PathBuf> {
    Ok(dirs::cache_dir()
        .context("Unable to determine cache directory for downloaded clips")?
        .join("broll")
        .join("clips"))
}
