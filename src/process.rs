//! External process gateway.
//!
//! The analysis tools this crate wraps (depcheck, yarn audit) routinely exit
//! non-zero while still writing usable JSON to stdout, so exit status is
//! ignored here: whatever the child produced before exiting is returned
//! as-is. Only failing to launch the process at all is an error.

use std::path::Path;
use tokio::process::Command;

use crate::error::ProcessError;

/// Runs `command args..` in `dir` and returns everything the process wrote
/// to stdout, decoded lossily.
///
/// # Errors
///
/// Returns [`ProcessError::Launch`] if the command cannot be spawned
/// (missing binary, permission denied).
pub async fn run_capture(dir: &Path, command: &str, args: &[&str]) -> Result<String, ProcessError> {
    let output = Command::new(command)
        .args(args)
        .current_dir(dir)
        .output()
        .await
        .map_err(|source| ProcessError::Launch {
            command: command.to_string(),
            dir: dir.to_path_buf(),
            source,
        })?;

    if !output.status.success() {
        tracing::debug!(
            command,
            status = %output.status,
            "external tool exited non-zero, keeping its output"
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
