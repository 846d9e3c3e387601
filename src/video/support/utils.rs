use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Path with a `<stem><suffix>.<extension>` file name next to `path`.
pub fn sibling_with_suffix(path: &Path, suffix: &str, extension: &str) -> Result<PathBuf> {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .with_context(|| format!("{} has no valid file name", path.display()))?;
    Ok(path.with_file_name(format!("{stem}{suffix}.{extension}")))
}
