//! Execution orchestrator
//!
//! The entry point invoked per request: validates the language, stages the
//! workspace, builds the step pipeline, runs it bounded, classifies the
//! outcome, and guarantees teardown on every exit path.

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::{Config, Language, StagedSource};
use crate::docker::{self, DockerCommand, DockerError};
use crate::types::{Classification, ContainerLimits, ExecutionRequest, ExecutionResult, RunOutcome};
use crate::workspace::{self, Workspace, WorkspaceError};

/// Surfaced when the availability probe fails before anything is staged
pub const RUNTIME_UNAVAILABLE_MESSAGE: &str =
    "Container runtime is not available. Ensure the daemon is running and accessible.";

/// The user-facing timeout message mandated by the wire contract
pub fn timeout_message(secs: u64) -> String {
    format!("Execution timed out after {secs} seconds")
}

/// Errors that escape an execution
///
/// Anything classifiable (timeout, compile failure, start failure) is a
/// result, not an error; only unsupported languages and internal
/// staging/runtime faults surface here.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    #[error("failed to read staged stdin: {0}")]
    StdinRead(#[source] std::io::Error),

    #[error("container runtime error: {0}")]
    Docker(#[from] DockerError),
}

/// Orchestrates sandboxed executions against an immutable configuration.
///
/// One engine serves arbitrarily many concurrent requests; there is no
/// shared mutable state, and per-request uniqueness of the workspace
/// identifier keeps executions from colliding.
#[derive(Debug, Clone)]
pub struct Engine {
    config: Config,
}

impl Engine {
    /// Create a new engine with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Create a new engine with the embedded default configuration
    pub fn with_defaults() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Availability hook for external liveness tooling
    pub async fn probe_isolation(&self) -> bool {
        docker::probe_available(
            &self.config.docker_binary(),
            self.config.limits.probe_timeout(),
        )
        .await
    }

    /// Execute one submission end to end.
    ///
    /// Classifiable failures (timeout, compile error, runtime error,
    /// unavailable runtime) come back as an [`ExecutionResult`]; an `Err`
    /// means the language is unknown or the engine itself faulted. The
    /// workspace and container instance are torn down on every path.
    #[instrument(skip(self, request), fields(language = %request.language))]
    pub async fn execute(
        &self,
        request: &ExecutionRequest,
    ) -> Result<ExecutionResult, EngineError> {
        let started = Instant::now();

        let language = self
            .config
            .get_language(&request.language)
            .map_err(|_| EngineError::UnsupportedLanguage(request.language.clone()))?;

        // Fail fast when the runtime is missing; the alternative is a
        // confusing downstream timeout for an environment that was never
        // going to work.
        if !self.probe_isolation().await {
            return Ok(ExecutionResult {
                classification: Classification::IsolationUnavailable,
                stdout: String::new(),
                stderr: RUNTIME_UNAVAILABLE_MESSAGE.to_owned(),
                exit_code: None,
                elapsed_millis: started.elapsed().as_millis() as u64,
            });
        }

        // The staged filename depends on the source content, so derivation
        // must precede staging.
        let staged = language
            .entry_point
            .resolve(&request.source, &language.extension);

        let mut workspace = Workspace::stage(
            &self.config.workspace_root,
            workspace::generate_id(),
            &staged.file_name,
            &staged.source,
            request.stdin.as_deref(),
        )
        .await?;

        debug!(id = %workspace.id(), "workspace staged");

        let pipeline = self.run_pipeline(&workspace, language, &staged).await;

        // Two independent teardown actions, both always attempted; a
        // failure in one never skips the other, and neither can mask the
        // execution's real result.
        self.remove_instances(&workspace, language).await;
        workspace.dispose().await;

        let outcome = pipeline?;
        Ok(self.classify(outcome, started))
    }

    /// Run the compile step (when the language has one) and then the run
    /// step, sharing a single wall-clock budget. A failed compile
    /// short-circuits and surfaces the compiler's stderr.
    async fn run_pipeline(
        &self,
        workspace: &Workspace,
        language: &Language,
        staged: &StagedSource<'_>,
    ) -> Result<RunOutcome, EngineError> {
        let deadline = Instant::now() + self.config.limits.wall_time();
        let binary = language.binary_name(&staged.stem);

        if let Some(ref compile) = language.compile {
            let limits = self.config.effective_limits(compile.limits.as_ref());
            let argv = Language::expand_command(&compile.command, &staged.file_name, &binary);
            let command = self
                .step_command(workspace, language, limits.clone(), argv, &compile.env)
                .name(build_instance_name(workspace.id()));

            let outcome = docker::run_step(
                command,
                None,
                deadline.saturating_duration_since(Instant::now()),
                limits.max_output_bytes(),
            )
            .await?;

            if outcome.killed_by_timeout || outcome.exit_code != Some(0) {
                debug!(exit_code = ?outcome.exit_code, "compile step failed, short-circuiting");
                return Ok(outcome);
            }
        }

        let limits = self.config.effective_limits(language.run.limits.as_ref());
        let argv = Language::expand_command(&language.run.command, &staged.file_name, &binary);

        // Stdin comes from the staged file; its absence means the run gets
        // no input at all rather than an empty redirect.
        let stdin = match workspace.stdin_path() {
            Some(path) => Some(
                tokio::fs::read(path)
                    .await
                    .map_err(EngineError::StdinRead)?,
            ),
            None => None,
        };

        let command = self
            .step_command(workspace, language, limits.clone(), argv, &language.run.env)
            .name(workspace.id())
            .interactive(stdin.is_some());

        let outcome = docker::run_step(
            command,
            stdin,
            deadline.saturating_duration_since(Instant::now()),
            limits.max_output_bytes(),
        )
        .await?;

        Ok(outcome)
    }

    fn step_command(
        &self,
        workspace: &Workspace,
        language: &Language,
        limits: ContainerLimits,
        argv: Vec<String>,
        env: &std::collections::HashMap<String, String>,
    ) -> DockerCommand {
        let mut command = DockerCommand::new(self.config.docker_binary())
            .image(&language.image)
            .workspace(workspace.root())
            .limits(limits)
            .command(argv);

        for (key, value) in env {
            command = command.env(key, value);
        }

        command
    }

    /// Force-remove every container instance this execution may have
    /// created. Both removals are idempotent and individually
    /// fault-tolerant.
    async fn remove_instances(&self, workspace: &Workspace, language: &Language) {
        let docker_path = self.config.docker_binary();
        if language.is_compiled() {
            docker::force_remove(&docker_path, &build_instance_name(workspace.id())).await;
        }
        docker::force_remove(&docker_path, workspace.id()).await;
    }

    /// Map a raw outcome into the final result.
    ///
    /// Precedence: probe failure is classified before any step runs;
    /// timeout beats start failure beats non-zero exit.
    fn classify(&self, outcome: RunOutcome, started: Instant) -> ExecutionResult {
        let classification = Classification::from_outcome(&outcome);
        let stderr = match classification {
            Classification::Timeout => {
                warn!("execution killed at wall-clock budget");
                timeout_message(self.config.limits.wall_time().as_secs())
            }
            Classification::Ok => outcome.stderr.clone(),
            _ => outcome.failure_output(),
        };

        ExecutionResult {
            classification,
            stdout: outcome.stdout,
            stderr,
            exit_code: outcome.exit_code,
            elapsed_millis: started.elapsed().as_millis() as u64,
        }
    }
}

fn build_instance_name(workspace_id: &str) -> String {
    format!("{workspace_id}-build")
}
