use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Resource ceilings applied to a single container step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerLimits {
    /// Memory ceiling in megabytes
    #[serde(default)]
    pub memory_mb: Option<u64>,

    /// Fractional CPU ceiling (e.g. 0.5 = half a core)
    #[serde(default)]
    pub cpus: Option<f64>,

    /// Hard wall-clock budget for the whole build+run pipeline, in seconds
    #[serde(default)]
    pub wall_time_secs: Option<u64>,

    /// Bound on the runtime availability probe, in seconds
    #[serde(default)]
    pub probe_timeout_secs: Option<u64>,

    /// Ceiling on captured bytes per output stream
    #[serde(default)]
    pub max_output_bytes: Option<u64>,
}

impl ContainerLimits {
    pub const DEFAULT_MEMORY_MB: u64 = 128;
    pub const DEFAULT_CPUS: f64 = 0.5;
    pub const DEFAULT_WALL_TIME_SECS: u64 = 10;
    pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;
    /// 1 MiB per stream
    pub const DEFAULT_MAX_OUTPUT_BYTES: u64 = 1024 * 1024;

    /// Create new limits with all fields unset
    pub fn none() -> Self {
        Self {
            memory_mb: None,
            cpus: None,
            wall_time_secs: None,
            probe_timeout_secs: None,
            max_output_bytes: None,
        }
    }

    /// Set the memory ceiling in megabytes
    pub fn with_memory_mb(mut self, mb: u64) -> Self {
        self.memory_mb = Some(mb);
        self
    }

    /// Set the fractional CPU ceiling
    pub fn with_cpus(mut self, cpus: f64) -> Self {
        self.cpus = Some(cpus);
        self
    }

    /// Set the wall-clock budget in seconds
    pub fn with_wall_time_secs(mut self, secs: u64) -> Self {
        self.wall_time_secs = Some(secs);
        self
    }

    /// Set the output capture ceiling in bytes
    pub fn with_max_output_bytes(mut self, bytes: u64) -> Self {
        self.max_output_bytes = Some(bytes);
        self
    }

    /// Apply overrides from another ContainerLimits, preferring values from
    /// `overrides` when both are present.
    pub fn with_overrides(&self, overrides: &ContainerLimits) -> ContainerLimits {
        ContainerLimits {
            memory_mb: overrides.memory_mb.or(self.memory_mb),
            cpus: overrides.cpus.or(self.cpus),
            wall_time_secs: overrides.wall_time_secs.or(self.wall_time_secs),
            probe_timeout_secs: overrides.probe_timeout_secs.or(self.probe_timeout_secs),
            max_output_bytes: overrides.max_output_bytes.or(self.max_output_bytes),
        }
    }

    /// Effective memory ceiling in megabytes
    pub fn memory_mb(&self) -> u64 {
        self.memory_mb.unwrap_or(Self::DEFAULT_MEMORY_MB)
    }

    /// Effective CPU ceiling
    pub fn cpus(&self) -> f64 {
        self.cpus.unwrap_or(Self::DEFAULT_CPUS)
    }

    /// Effective wall-clock budget
    pub fn wall_time(&self) -> Duration {
        Duration::from_secs(self.wall_time_secs.unwrap_or(Self::DEFAULT_WALL_TIME_SECS))
    }

    /// Effective probe bound
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(
            self.probe_timeout_secs
                .unwrap_or(Self::DEFAULT_PROBE_TIMEOUT_SECS),
        )
    }

    /// Effective per-stream capture ceiling in bytes
    pub fn max_output_bytes(&self) -> u64 {
        self.max_output_bytes
            .unwrap_or(Self::DEFAULT_MAX_OUTPUT_BYTES)
    }
}

impl Default for ContainerLimits {
    fn default() -> Self {
        Self {
            memory_mb: Some(Self::DEFAULT_MEMORY_MB),
            cpus: Some(Self::DEFAULT_CPUS),
            wall_time_secs: Some(Self::DEFAULT_WALL_TIME_SECS),
            probe_timeout_secs: Some(Self::DEFAULT_PROBE_TIMEOUT_SECS),
            max_output_bytes: Some(Self::DEFAULT_MAX_OUTPUT_BYTES),
        }
    }
}

/// One code submission. Owned by the engine for the request's lifetime.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionRequest {
    /// Language ID, resolved against the configured language table
    pub language: String,

    /// Submitted source text
    #[serde(rename = "code")]
    pub source: String,

    /// Optional text fed to the program's standard input
    #[serde(default, rename = "input")]
    pub stdin: Option<String>,
}

impl ExecutionRequest {
    pub fn new(language: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            source: source.into(),
            stdin: None,
        }
    }

    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }
}

/// How one execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    /// Program ran to completion with exit code 0
    Ok,

    /// Killed at the wall-clock budget
    Timeout,

    /// The container runtime is not reachable (probe failed)
    IsolationUnavailable,

    /// The runtime is reachable but the container could not start
    IsolationStartFailure,

    /// Compile failure or non-zero exit inside the container
    RuntimeError,
}

impl Classification {
    /// Classify a raw step outcome.
    ///
    /// Precedence: timeout, then start failure, then non-zero exit. Probe
    /// failures are classified before a step ever runs.
    pub fn from_outcome(outcome: &RunOutcome) -> Self {
        if outcome.killed_by_timeout {
            Classification::Timeout
        } else if outcome.is_start_failure() {
            Classification::IsolationStartFailure
        } else if outcome.exit_code != Some(0) {
            Classification::RuntimeError
        } else {
            Classification::Ok
        }
    }
}

/// Final result of one execution, returned to the caller and not persisted.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub classification: Classification,

    /// Captured standard output (capped)
    pub stdout: String,

    /// Captured standard error, or the raised error's message when the
    /// program produced none
    pub stderr: String,

    /// Exit code of the final step, if it exited normally
    pub exit_code: Option<i32>,

    /// Wall-clock time for the whole request
    pub elapsed_millis: u64,
}

impl ExecutionResult {
    /// Check if the submission ran to completion successfully
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.classification == Classification::Ok
    }
}

/// Raw outcome of one container step, before classification.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    /// Captured standard output (capped)
    pub stdout: String,

    /// Captured standard error (capped)
    pub stderr: String,

    /// Exit code of the container client, if it exited normally
    pub exit_code: Option<i32>,

    /// Runtime-level error message, populated when the client could not
    /// start the container
    pub error: Option<String>,

    /// Whether the step was killed at the wall-clock budget
    pub killed_by_timeout: bool,
}

impl RunOutcome {
    /// Exit codes the docker client reserves for its own failures:
    /// 125 = container failed to start, 126 = command not executable,
    /// 127 = command not found.
    pub fn is_start_failure(&self) -> bool {
        matches!(self.exit_code, Some(125) | Some(126) | Some(127))
    }

    /// Stderr with a fallback to the runtime error message, for surfacing
    /// to the submitter
    pub fn failure_output(&self) -> String {
        if !self.stderr.is_empty() {
            self.stderr.clone()
        } else {
            self.error.clone().unwrap_or_default()
        }
    }
}
