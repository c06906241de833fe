//! Per-execution workspace staging
//!
//! Every execution gets a uniquely named directory holding the staged
//! source and, when present, the stdin file. The directory name doubles as
//! the container instance name, so no two concurrent executions can
//! collide on files or containers.
//!
//! # Cleanup
//!
//! **Important:** Always call [`dispose()`](Workspace::dispose) explicitly
//! when the execution is over, on every code path. The `Drop`
//! implementation attempts best-effort removal via a spawned thread, but
//! this is unreliable and may not complete before process exit.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Fixed name of the staged stdin file. Its absence signals "no stdin".
pub const STDIN_FILE: &str = "input.txt";

/// Errors that occur while staging a workspace
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("failed to create workspace directory {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {name} into workspace: {source}")]
    WriteFile {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Generate a workspace identifier: creation time plus a random suffix.
///
/// The identifier names both the directory and the container instance, so
/// collisions between concurrent executions are practically impossible and
/// cleanup never races another execution's files.
pub fn generate_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("kiln-{millis}-{}", &suffix[..8])
}

/// An isolated filesystem directory owned by exactly one execution.
#[derive(Debug)]
pub struct Workspace {
    /// Unique identifier; also the container instance name
    id: String,

    /// Path to the workspace directory
    root: PathBuf,

    /// Name of the staged source file
    source_name: String,

    /// Whether a stdin file was staged
    has_stdin: bool,

    /// Whether the directory has been removed
    disposed: bool,
}

impl Workspace {
    /// Create the workspace directory and write the staged files.
    ///
    /// The stdin file is only written when `stdin` carries non-blank text,
    /// so its absence cleanly signals "no stdin" to command construction.
    #[instrument(skip(source, stdin))]
    pub async fn stage(
        base: &Path,
        id: String,
        source_name: &str,
        source: &str,
        stdin: Option<&str>,
    ) -> Result<Self, WorkspaceError> {
        let root = base.join(&id);
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|source| WorkspaceError::Create {
                path: root.clone(),
                source,
            })?;

        let stdin = stdin.filter(|text| !text.trim().is_empty());
        if let Err(e) = Self::write_files(&root, source_name, source, stdin).await {
            // A half-staged directory must not outlive the failed stage
            if let Err(cleanup) = tokio::fs::remove_dir_all(&root).await {
                warn!(path = %root.display(), error = %cleanup, "failed to remove half-staged workspace");
            }
            return Err(e);
        }

        Ok(Self {
            id,
            root,
            source_name: source_name.to_owned(),
            has_stdin: stdin.is_some(),
            disposed: false,
        })
    }

    async fn write_files(
        root: &Path,
        source_name: &str,
        source: &str,
        stdin: Option<&str>,
    ) -> Result<(), WorkspaceError> {
        let source_path = root.join(source_name);
        tokio::fs::write(&source_path, source)
            .await
            .map_err(|e| WorkspaceError::WriteFile {
                name: source_name.to_owned(),
                source: e,
            })?;
        debug!(path = %source_path.display(), len = source.len(), "staged source");

        if let Some(text) = stdin {
            let stdin_path = root.join(STDIN_FILE);
            tokio::fs::write(&stdin_path, text)
                .await
                .map_err(|e| WorkspaceError::WriteFile {
                    name: STDIN_FILE.to_owned(),
                    source: e,
                })?;
            debug!(path = %stdin_path.display(), "staged stdin");
        }

        Ok(())
    }

    /// Get the workspace identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the path to the workspace directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the staged source file name
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Host path of the staged stdin file, if one was written
    pub fn stdin_path(&self) -> Option<PathBuf> {
        self.has_stdin.then(|| self.root.join(STDIN_FILE))
    }

    /// Whether a stdin file was staged
    pub fn has_stdin(&self) -> bool {
        self.has_stdin
    }

    /// Whether the directory has been removed
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Remove the workspace directory tree.
    ///
    /// Idempotent. A missing or already-removed directory is logged and
    /// tolerated; a removal failure must never mask the execution's real
    /// result, so no error is returned.
    #[instrument(skip(self), fields(id = %self.id))]
    pub async fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => debug!("workspace removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("workspace already gone");
            }
            Err(e) => {
                warn!(path = %self.root.display(), error = %e, "failed to remove workspace");
            }
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.disposed {
            return;
        }

        warn!(
            id = %self.id,
            path = %self.root.display(),
            "Workspace dropped without explicit dispose! \
             Call dispose() on every exit path. \
             Attempting best-effort removal via spawned thread (may not complete)."
        );

        let root = self.root.clone();
        let id = self.id.clone();
        std::thread::spawn(move || match std::fs::remove_dir_all(&root) {
            Ok(()) => debug!(%id, "best-effort workspace removal succeeded"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(%id, error = %e, "best-effort workspace removal failed"),
        });
    }
}
