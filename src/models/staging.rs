//! Staged model directories
//!
//! An upload owns its freshly created directory until it either commits or
//! rolls back. Both are explicit; the upload pipeline runs in its own task,
//! so a dropped request never tears the directory down underneath it.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::name::ModelName;
use crate::error::{AppError, Result};

#[derive(Debug)]
#[must_use = "a staged directory must be committed or rolled back"]
pub struct StagedModelDir {
    path: PathBuf,
}

impl StagedModelDir {
    /// Create `<root>/<name>` exclusively
    ///
    /// The directory itself is created with a single non-recursive
    /// `create_dir`, so two uploads racing for the same name cannot both
    /// succeed.
    pub async fn create(root: &Path, name: &ModelName) -> Result<Self> {
        tokio::fs::create_dir_all(root).await?;

        let path = root.join(name.as_str());
        match tokio::fs::create_dir(&path).await {
            Ok(()) => {
                tracing::debug!(model = %name, path = %path.display(), "Created model directory");
                Ok(Self { path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(AppError::Conflict(format!(
                "Model '{}' already exists",
                name
            ))),
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the directory
    pub fn commit(self) -> PathBuf {
        self.path
    }

    /// Remove the directory and everything written into it
    pub async fn rollback(self) {
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => tracing::info!(path = %self.path.display(), "Cleaned up model directory"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::error!(
                path = %self.path.display(),
                "Failed to clean up model directory: {}",
                e
            ),
        }
    }
}
