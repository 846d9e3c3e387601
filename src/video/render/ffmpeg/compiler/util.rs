use std::path::Path;

pub fn format_decimal(value: f64) -> String {
    format!("{value:.6}")
}

/// One concat demuxer line: `file '<path>'` with forward slashes and single
/// quotes escaped the way the demuxer expects.
pub fn manifest_entry(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    format!("file '{}'", normalized.replace('\'', "'\\''"))
}
