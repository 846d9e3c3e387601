use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

pub const INTERMEDIATE_EXTENSION: &str = "mp4";
pub const MANIFEST_FILE_NAME: &str = "concat.txt";
pub const FINAL_OUTPUT_NAME: &str = "final.mp4";
/// The final encode lands here and is renamed into place once verified.
pub const PARTIAL_OUTPUT_NAME: &str = ".final.partial.mp4";

/// Directories owned by one render run. The work directory is written only
/// by the job runner and read only by the composition step.
#[derive(Debug)]
pub struct RunDirs {
    work_dir: PathBuf,
    out_dir: PathBuf,
    // Removes the work directory on drop when it was created for this run.
    _scratch: Option<TempDir>,
}

impl RunDirs {
    /// Use `work_dir` when given, otherwise a fresh temporary directory that
    /// is removed when the run ends unless `keep` is set.
    pub fn prepare(work_dir: Option<&Path>, out_dir: &Path, keep: bool) -> Result<Self> {
        fs::create_dir_all(out_dir)
            .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

        let (work_dir, scratch) = match work_dir {
            Some(dir) => {
                fs::create_dir_all(dir).with_context(|| {
                    format!("Failed to create work directory {}", dir.display())
                })?;
                (dir.to_path_buf(), None)
            }
            None => {
                let scratch = tempfile::Builder::new()
                    .prefix("broll-")
                    .keep(keep)
                    .tempdir()
                    .context("Failed to create temporary work directory")?;
                (scratch.path().to_path_buf(), Some(scratch))
            }
        };

        Ok(Self {
            work_dir: std::path::absolute(&work_dir).unwrap_or(work_dir),
            out_dir: out_dir.to_path_buf(),
            _scratch: scratch,
        })
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn intermediate_path(&self, index: usize) -> PathBuf {
        self.work_dir
            .join(format!("clip_{index}.{INTERMEDIATE_EXTENSION}"))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.work_dir.join(MANIFEST_FILE_NAME)
    }

    pub fn final_output(&self) -> PathBuf {
        self.out_dir.join(FINAL_OUTPUT_NAME)
    }

    pub fn partial_output(&self) -> PathBuf {
        self.out_dir.join(PARTIAL_OUTPUT_NAME)
    }
}
