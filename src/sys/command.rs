// src/sys/command.rs
//
// Thin wrapper over `tokio::process::Command` shared by every Linux backend.
// No timeouts: a hung tool hangs the run until the operator interrupts it.

use tokio::process::Command;
use tracing::debug;

/// Runs `program` to completion and returns its stdout.
/// A non-zero exit becomes an error carrying the exit code and stderr.
pub async fn run_checked(program: &str, args: &[&str]) -> Result<String, String> {
    run_checked_with_env(program, args, &[]).await
}

pub async fn run_checked_with_env(
    program: &str,
    args: &[&str],
    env: &[(&str, &str)],
) -> Result<String, String> {
    debug!(program, ?args, "running external command");

    let output = Command::new(program)
        .args(args)
        .envs(env.iter().copied())
        .output()
        .await
        .map_err(|e| format!("{} could not be started: {}", program, e))?;

    if !output.status.success() {
        let code = output
            .status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("{} exited with {}: {}", program, code, stderr.trim()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
