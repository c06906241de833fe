//! Process spawning and I/O for the container runtime
//!
//! Runs one docker client invocation with a wall-clock bound, piped stdin,
//! and capped output capture.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::docker::DockerError;
use crate::docker::command::DockerCommand;
use crate::types::RunOutcome;

/// Read at most `cap` bytes, then keep draining so the client never blocks
/// on a full pipe.
async fn read_capped<R>(reader: R, cap: u64) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut take = reader.take(cap);
    let mut buf = Vec::new();
    take.read_to_end(&mut buf).await?;

    let mut reader = take.into_inner();
    let mut sink = [0u8; 8192];
    loop {
        match reader.read(&mut sink).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => break,
        }
    }

    Ok(buf)
}

fn start_failure_message(exit_code: i32) -> Option<&'static str> {
    match exit_code {
        125 => Some("container failed to start"),
        126 => Some("container command not executable"),
        127 => Some("container command not found"),
        _ => None,
    }
}

/// Run one container step, bounded by `budget`.
///
/// When `stdin_data` is given, the bytes are piped into the container's
/// standard input. On timeout the client process is killed and the outcome
/// is marked `killed_by_timeout`; the caller is expected to force-remove
/// the named container afterwards, since the container itself may outlive
/// its killed client.
#[instrument(skip(command, stdin_data), fields(budget_secs = budget.as_secs()))]
pub async fn run_step(
    command: DockerCommand,
    stdin_data: Option<Vec<u8>>,
    budget: Duration,
    max_output_bytes: u64,
) -> Result<RunOutcome, DockerError> {
    let args = command.build();
    debug!(?args, "running container step");

    let program = args
        .first()
        .ok_or_else(|| DockerError::CommandFailed("empty command arguments".to_string()))?;

    let mut child = Command::new(program)
        .args(&args[1..])
        .stdin(if stdin_data.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(DockerError::SpawnFailed)?;

    let stdin_handle = child.stdin.take();
    let stdout_handle = child
        .stdout
        .take()
        .ok_or_else(|| DockerError::CommandFailed("stdout not captured".to_string()))?;
    let stderr_handle = child
        .stderr
        .take()
        .ok_or_else(|| DockerError::CommandFailed("stderr not captured".to_string()))?;

    let io = async {
        let stdin_fut = async {
            if let (Some(mut handle), Some(data)) = (stdin_handle, stdin_data.as_deref()) {
                handle.write_all(data).await?;
                handle.shutdown().await?;
                // Dropping the handle closes the pipe and signals EOF
            }
            Ok::<_, std::io::Error>(())
        };

        let (stdin_res, stdout, stderr, status) = tokio::join!(
            stdin_fut,
            read_capped(stdout_handle, max_output_bytes),
            read_capped(stderr_handle, max_output_bytes),
            child.wait(),
        );

        // A program that exits without reading its input breaks the pipe;
        // that is its prerogative, not an adapter failure.
        if let Err(e) = stdin_res {
            debug!(error = %e, "stdin pipe closed early");
        }

        Ok::<_, DockerError>((stdout?, stderr?, status?))
    };

    let (stdout, stderr, status) = match tokio::time::timeout(budget, io).await {
        Ok(result) => result?,
        Err(_) => {
            warn!("wall-clock budget exhausted, killing client");
            if let Err(e) = child.kill().await {
                warn!(error = %e, "failed to kill timed-out client");
            }
            return Ok(RunOutcome {
                killed_by_timeout: true,
                ..Default::default()
            });
        }
    };

    let exit_code = status.code();
    let error = exit_code
        .and_then(start_failure_message)
        .map(str::to_owned);

    debug!(?exit_code, "container step complete");

    Ok(RunOutcome {
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        exit_code,
        error,
        killed_by_timeout: false,
    })
}
