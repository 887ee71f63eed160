//! Workspace management - isolated per-execution directories
//!
//! Every execution gets a uniquely named directory under a shared root.
//! Uniqueness across concurrent executions is a hard invariant (a collision
//! would corrupt another execution's files), so directory names are uuid v4.
//!
//! This module does NOT:
//! - Write source files (language adapters do that)
//! - Decide when a workspace is needed (the executor does)

use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

use crate::error::JudgeError;

/// A directory exclusively owned by one in-flight execution
#[derive(Debug)]
pub struct Workspace {
    id: Uuid,
    path: PathBuf,
    released: bool,
}

impl Workspace {
    /// Unique workspace id
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Path of the workspace directory
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        // Backstop for unwind paths; release() is the normal route.
        if !self.released && self.path.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                warn!("Failed to remove workspace {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Allocates and destroys workspaces under a fixed root
#[derive(Debug)]
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a fresh uniquely named workspace directory.
    ///
    /// Fails with `JudgeError::Workspace` if the root or the workspace
    /// itself cannot be created.
    pub async fn acquire(&self) -> Result<Workspace, JudgeError> {
        let id = Uuid::new_v4();
        let path = self.root.join(id.to_string());

        tokio::fs::create_dir_all(&path).await.map_err(|e| {
            JudgeError::Workspace(format!(
                "failed to create workspace {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(Workspace {
            id,
            path,
            released: false,
        })
    }

    /// Remove a workspace directory recursively.
    ///
    /// Removal failures are logged, never raised: cleanup is best-effort and
    /// must not block the caller from receiving its result.
    pub async fn release(&self, mut workspace: Workspace) {
        workspace.released = true;
        if let Err(e) = tokio::fs::remove_dir_all(&workspace.path).await {
            warn!(
                "Failed to remove workspace {}: {}",
                workspace.path.display(),
                e
            );
        }
    }
}
