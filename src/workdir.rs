//! The ephemeral per-submission work directory: `code/`, `testcases/`, `results/`.
//! Owned exclusively by the batch executor; guaranteed removed on every termination
//! path via `Drop`, mirroring the teacher's `Sandbox`/`IsolateRunner` cleanup.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// An RAII guard over a submission's scratch directory.
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    /// Creates a fresh work directory under `temp_root`, keyed by a
    /// collision-resistant identifier, with the `code/`, `testcases/`, `results/`
    /// layout of spec.md §3.
    pub fn create(temp_root: &Path) -> Result<Self> {
        let id = uuid::Uuid::new_v4();
        let root = temp_root.join(id.to_string());

        fs::create_dir_all(root.join("code"))
            .with_context(|| format!("creating {}/code", root.display()))?;
        fs::create_dir_all(root.join("testcases"))
            .with_context(|| format!("creating {}/testcases", root.display()))?;
        fs::create_dir_all(root.join("results"))
            .with_context(|| format!("creating {}/results", root.display()))?;

        Ok(WorkDir { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn code_path(&self, source_file: &str) -> PathBuf {
        self.root.join("code").join(source_file)
    }

    /// 1-based, contiguous, per spec.md §6's sandbox contract.
    pub fn input_path(&self, case_index: usize) -> PathBuf {
        self.root.join("testcases").join(format!("{case_index}.in"))
    }

    pub fn stdout_path(&self, case_index: usize) -> PathBuf {
        self.root.join("results").join(format!("{case_index}.out"))
    }

    pub fn stderr_path(&self, case_index: usize) -> PathBuf {
        self.root.join("results").join(format!("{case_index}.err"))
    }

    pub fn meta_path(&self, case_index: usize) -> PathBuf {
        self.root.join("results").join(format!("{case_index}.meta"))
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.root) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::error!("failed to remove work directory {}: {e}", self.root.display());
            }
        } else {
            log::debug!("removed work directory {}", self.root.display());
        }
    }
}
