//! Segment → clip/policy assignments loaded from a TOML file:
//!
//! ```toml
//! [[segment]]
//! index = 2
//! clip = "harbor.mp4"
//! fit = "loop"
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::render::error::RenderError;
use super::segment::{ClipRef, FitPolicy, Segment};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentFile {
    #[serde(default, rename = "segment")]
    pub segments: Vec<Assignment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Assignment {
    pub index: usize,
    pub clip: Option<String>,
    /// Kept as text so an unknown policy can be reported against its segment.
    pub fit: Option<String>,
}

pub fn load_assignments(path: &Path) -> Result<AssignmentFile> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading assignments from {}", path.display()))?;
    parse_assignments(&contents)
        .with_context(|| format!("parsing assignments from {}", path.display()))
}

pub fn parse_assignments(contents: &str) -> Result<AssignmentFile> {
    Ok(toml::from_str(contents)?)
}

impl AssignmentFile {
    /// Apply every assignment to its segment. Unknown indices, duplicates and
    /// unknown policies are rejected before any segment is touched.
    pub fn apply(&self, segments: &mut [Segment]) -> Result<(), RenderError> {
        let known: HashSet<usize> = segments.iter().map(|segment| segment.index).collect();
        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(self.segments.len());

        for assignment in &self.segments {
            if !known.contains(&assignment.index) {
                return Err(RenderError::invalid(format!(
                    "assignment for segment {} does not match any transcript segment",
                    assignment.index
                )));
            }
            if !seen.insert(assignment.index) {
                return Err(RenderError::invalid(format!(
                    "segment {} is assigned more than once",
                    assignment.index
                )));
            }

            let fit = match assignment.fit.as_deref() {
                Some(value) => Some(value.parse::<FitPolicy>().map_err(|_| {
                    RenderError::UnknownPolicy {
                        index: assignment.index,
                        value: value.to_string(),
                    }
                })?),
                None => None,
            };
            let clip = assignment
                .clip
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(ClipRef::parse);
            resolved.push((assignment.index, clip, fit));
        }

        for (index, clip, fit) in resolved {
            if let Some(segment) = segments.iter_mut().find(|segment| segment.index == index) {
                if clip.is_some() {
                    segment.assigned_clip = clip;
                }
                if let Some(fit) = fit {
                    segment.fit_policy = fit;
                }
            }
        }
        Ok(())
    }
}
