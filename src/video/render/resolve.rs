use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use super::error::RenderError;
use crate::video::segment::{ClipRef, Segment};

pub const DEFAULT_CLIP_EXTENSION: &str = "mp4";

/// Maps segments to clip files that exist on disk.
#[derive(Debug, Clone)]
pub struct ClipResolver {
    clips_dir: PathBuf,
    extension: String,
    cache_dir: Option<PathBuf>,
}

impl ClipResolver {
    pub fn new(clips_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        let extension = extension.trim_start_matches('.').to_string();
        Self {
            clips_dir: clips_dir.into(),
            extension: if extension.is_empty() {
                DEFAULT_CLIP_EXTENSION.to_string()
            } else {
                extension
            },
            cache_dir: None,
        }
    }

    pub fn with_cache_dir(mut self, cache_dir: Option<PathBuf>) -> Self {
        self.cache_dir = cache_dir;
        self
    }

    /// Candidate paths for a segment, in the order they are tried.
    pub fn candidates(&self, segment: &Segment) -> Vec<PathBuf> {
        match &segment.assigned_clip {
            Some(ClipRef::File(path)) if path.is_absolute() => vec![path.clone()],
            Some(ClipRef::File(path)) => vec![self.clips_dir.join(path), path.clone()],
            Some(ClipRef::Url(url)) => self
                .cache_dir
                .as_deref()
                .map(|dir| vec![remote_cache_path(dir, url, &self.extension)])
                .unwrap_or_default(),
            None => vec![
                self.clips_dir
                    .join(format!("{}.{}", segment.index, self.extension)),
            ],
        }
    }

    pub fn resolve(&self, segment: &Segment) -> Result<PathBuf, RenderError> {
        let candidates = self.candidates(segment);
        if let Some(found) = candidates.iter().find(|path| path.is_file()) {
            return Ok(found.clone());
        }

        let reason = match &segment.assigned_clip {
            Some(ClipRef::Url(url)) if candidates.is_empty() => {
                format!("remote clip {url} cannot be resolved without a cache directory")
            }
            Some(ClipRef::Url(url)) => format!(
                "remote clip {url} has not been downloaded (expected {})",
                display_paths(&candidates)
            ),
            Some(ClipRef::File(path)) => format!(
                "assigned clip {} not found (tried {})",
                path.display(),
                display_paths(&candidates)
            ),
            None => format!("no clip assigned and {} does not exist", display_paths(&candidates)),
        };

        Err(RenderError::Resolution {
            index: segment.index,
            reason,
        })
    }
}

/// Where a remote clip is materialized: `<cache>/<sha256(url)>.<ext>`, with
/// the extension taken from the URL path when it has one.
pub fn remote_cache_path(cache_dir: &Path, url: &str, default_extension: &str) -> PathBuf {
    let key = format!("{:x}", Sha256::digest(url.as_bytes()));
    let extension = url_extension(url).unwrap_or_else(|| default_extension.to_string());
    cache_dir.join(format!("{key}.{extension}"))
}

fn url_extension(url: &str) -> Option<String> {
    let without_query = url.split(['?', '#']).next()?;
    let path = without_query
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(without_query);
    let (_, path) = path.split_once('/')?;
    let file_name = path.rsplit('/').next()?;
    let (_, extension) = file_name.rsplit_once('.')?;
    let valid = !extension.is_empty()
        && extension.len() <= 5
        && extension.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| extension.to_ascii_lowercase())
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
