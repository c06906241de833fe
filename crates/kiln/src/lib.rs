//! A library for executing untrusted code in throwaway containers.
//!
//! Kiln takes a code submission in one of several configured languages,
//! stages it into a uniquely named workspace, builds and runs it inside a
//! network-disabled, resource-capped container, and returns the captured
//! output. Workspaces and container instances are torn down on every exit
//! path, including timeouts and runtime failures.
//!
//! # Features
//!
//! - **Container isolation** — no network, memory and CPU ceilings, read-only
//!   root with a tmpfs scratch mount, workspace as the sole writable path.
//! - **Multi-language** — interpreted and compiled languages from one TOML
//!   config, including entry-point derivation for Java-style filename rules.
//! - **Bounded everything** — availability probe, wall-clock budget, and
//!   capped output capture; a runaway submission cannot stall the host.
//! - **Guaranteed teardown** — per-request workspace and container removal
//!   are independent, idempotent, and always attempted.

pub use api::{ExecuteResponse, ResponseBody};
pub use config::{Config, ConfigError, EXAMPLE_CONFIG, EntryPointRule, Language};
pub use engine::{Engine, EngineError, RUNTIME_UNAVAILABLE_MESSAGE, timeout_message};
pub use types::{
    Classification, ContainerLimits, ExecutionRequest, ExecutionResult, RunOutcome,
};
pub use workspace::{Workspace, WorkspaceError};

pub mod api;
pub mod config;
pub mod docker;
pub mod engine;
pub mod types;
pub mod workspace;
