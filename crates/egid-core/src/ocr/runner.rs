//! Execution of the external OCR program.

use std::ffi::OsStr;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::ProcessError;

/// Run a shell command and return its captured output.
///
/// Stderr is redirected into stdout, so lines appear in the order the
/// command wrote them. A zero `timeout` waits indefinitely; otherwise the
/// child is killed on expiry.
pub async fn run_command(command: &str, timeout: Duration) -> Result<String, ProcessError> {
    debug!("Running command: {}", command);

    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(format!("exec 2>&1\n{command}"));
    execute(cmd, timeout).await
}

/// Run a program directly, without a shell.
///
/// The output is the stdout lines followed by the stderr lines.
pub async fn run_program<I, S>(program: &str, args: I, timeout: Duration) -> Result<String, ProcessError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    debug!("Running program: {}", program);

    let mut cmd = Command::new(program);
    cmd.args(args);
    execute(cmd, timeout).await
}

async fn execute(mut cmd: Command, timeout: Duration) -> Result<String, ProcessError> {
    let start = Instant::now();

    let child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(ProcessError::Spawn)?;

    // Dropping the pending future drops the child, which kills it.
    let waited = if timeout.is_zero() {
        child.wait_with_output().await
    } else {
        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Process timed out after {}s, killed", timeout.as_secs());
                return Err(ProcessError::Timeout {
                    secs: timeout.as_secs(),
                });
            }
        }
    };
    let output = waited.map_err(ProcessError::Spawn)?;

    let text = merge_output(&output.stdout, &output.stderr);

    debug!(
        "Process exited with {} after {}ms ({} bytes of output)",
        output.status,
        start.elapsed().as_millis(),
        text.len()
    );

    if !output.status.success() {
        return Err(ProcessError::Failure {
            code: output.status.code(),
            output: text,
        });
    }

    Ok(text)
}

/// Join stdout and stderr line by line, trimming trailing whitespace.
fn merge_output(stdout: &[u8], stderr: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);

    stdout
        .lines()
        .chain(stderr.lines())
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}
