//! Command builder for the docker CLI
//!
//! Builds argument vectors for the container runtime client. Arguments are
//! never interpolated into a shell string; user-influenced values only ever
//! appear as discrete argv entries.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::types::ContainerLimits;

/// Path the workspace is bind-mounted at inside the container
pub const WORKSPACE_MOUNT: &str = "/workspace";

/// Writable scratch mount; everything else in the container is read-only
pub const SCRATCH_TMPFS: &str = "/tmp";

/// Builder for docker client argument vectors
#[derive(Debug)]
pub struct DockerCommand {
    /// Path to the docker client binary
    docker_path: PathBuf,
    /// One of run / info / rm -f
    action: DockerAction,
    /// Container instance name (the workspace identifier)
    name: Option<String>,
    /// Toolchain image
    image: Option<String>,
    /// Host workspace directory bind-mounted at WORKSPACE_MOUNT
    workspace: Option<PathBuf>,
    /// Resource ceilings
    limits: ContainerLimits,
    /// -e KEY=VALUE
    env: HashMap<String, String>,
    /// -i, keep stdin open for piped input
    interactive: bool,
    command: Vec<String>,
}

impl DockerCommand {
    /// Create a new docker command builder
    pub fn new(docker_path: impl Into<PathBuf>) -> Self {
        Self {
            docker_path: docker_path.into(),
            action: DockerAction::Run,
            name: None,
            image: None,
            workspace: None,
            limits: ContainerLimits::none(),
            env: HashMap::new(),
            interactive: false,
            command: Vec::new(),
        }
    }

    /// Set the action to perform
    pub fn action(mut self, action: DockerAction) -> Self {
        self.action = action;
        self
    }

    /// Set the container instance name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the toolchain image
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Bind-mount the given host directory as the workspace
    pub fn workspace(mut self, path: impl Into<PathBuf>) -> Self {
        self.workspace = Some(path.into());
        self
    }

    /// Set resource ceilings
    pub fn limits(mut self, limits: ContainerLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set an environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Keep stdin open so input can be piped into the container
    pub fn interactive(mut self, enable: bool) -> Self {
        self.interactive = enable;
        self
    }

    /// Set the command to run inside the container
    pub fn command(mut self, cmd: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.command = cmd.into_iter().map(Into::into).collect();
        self
    }

    /// Build the argument vector.
    ///
    /// Consumes self to avoid cloning the command vector.
    pub fn build(self) -> Vec<String> {
        let mut args = vec![self.docker_path.to_string_lossy().into_owned()];

        match self.action {
            DockerAction::Info => {
                args.push("info".to_string());
            }
            DockerAction::Remove => {
                args.push("rm".to_string());
                args.push("-f".to_string());
                if let Some(name) = self.name {
                    args.push(name);
                }
            }
            DockerAction::Run => {
                args.push("run".to_string());
                args.push("--rm".to_string());

                if let Some(ref name) = self.name {
                    args.push("--name".to_string());
                    args.push(name.clone());
                }

                // Confinement: no network, bounded memory and CPU, read-only
                // root with a single writable scratch mount
                args.push("--network=none".to_string());
                args.push(format!("--memory={}m", self.limits.memory_mb()));
                args.push(format!("--cpus={}", self.limits.cpus()));
                args.push("--read-only".to_string());
                args.push("--tmpfs".to_string());
                args.push(SCRATCH_TMPFS.to_string());

                if let Some(ref workspace) = self.workspace {
                    args.push("-v".to_string());
                    args.push(format!("{}:{}", workspace.display(), WORKSPACE_MOUNT));
                    args.push("-w".to_string());
                    args.push(WORKSPACE_MOUNT.to_string());
                }

                if self.interactive {
                    args.push("-i".to_string());
                }

                for (key, value) in &self.env {
                    args.push("-e".to_string());
                    args.push(format!("{key}={value}"));
                }

                if let Some(image) = self.image {
                    args.push(image);
                }
                args.extend(self.command);
            }
        }

        args
    }

    /// Get the docker client binary path
    pub fn docker_path(&self) -> &Path {
        &self.docker_path
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockerAction {
    /// Run a command in a fresh container
    Run,
    /// Probe daemon availability
    Info,
    /// Force-remove a container by name
    Remove,
}
