//! Container runtime adapter
//!
//! Shells out to the docker CLI with argument vectors: availability
//! probing, bounded container steps, and defensive instance removal.
//! Every container runs network-disabled, memory- and CPU-capped, with a
//! read-only root, a tmpfs scratch mount, and the workspace directory as
//! the sole writable data path.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

pub use crate::docker::command::{DockerAction, DockerCommand, SCRATCH_TMPFS, WORKSPACE_MOUNT};
pub use crate::docker::process::run_step;

pub mod command;
mod process;

/// Errors that occur while driving the container runtime
#[derive(Debug, Error)]
pub enum DockerError {
    #[error("failed to spawn container runtime client: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("container runtime command failed: {0}")]
    CommandFailed(String),

    #[error("container runtime client not found at {0}")]
    BinaryNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Probe whether the container runtime daemon is reachable.
///
/// Bounded by `timeout` so a wedged daemon can't stall the caller; any
/// failure (spawn error, non-zero exit, timeout) reads as unavailable.
/// Failing fast here avoids a confusing downstream timeout for an
/// environment that was never going to work.
#[instrument(skip(docker_path))]
pub async fn probe_available(docker_path: &Path, timeout: Duration) -> bool {
    let args = DockerCommand::new(docker_path)
        .action(DockerAction::Info)
        .build();

    let probe = async {
        let program = args.first()?;
        Command::new(program)
            .args(&args[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .ok()
    };

    match tokio::time::timeout(timeout, probe).await {
        Ok(Some(status)) if status.success() => true,
        Ok(_) => {
            warn!("container runtime probe failed");
            false
        }
        Err(_) => {
            warn!("container runtime probe timed out");
            false
        }
    }
}

/// Force-remove a container instance by name.
///
/// The runtime may leave a stopped instance behind even after a `--rm`
/// auto-removal request, under kill/timeout races. Removal of an already
/// gone instance is the common case and is tolerated silently.
#[instrument(skip(docker_path))]
pub async fn force_remove(docker_path: &Path, name: &str) {
    let args = DockerCommand::new(docker_path)
        .action(DockerAction::Remove)
        .name(name)
        .build();

    let Some(program) = args.first() else { return };
    match Command::new(program)
        .args(&args[1..])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
    {
        Ok(status) if status.success() => debug!(name, "container force-removed"),
        Ok(_) => debug!(name, "container already removed"),
        Err(e) => warn!(name, error = %e, "container removal failed"),
    }
}
