//! User hook commands run between release phases.
//!
//! Hooks are shell commands configured per phase (`post_write`,
//! `post_record`, `post_bundle`). They run one at a time, in order, with
//! `sh -c` in the project root. The first failure stops the release.
//!
//! # Variables
//!
//! Commands support `{var}` interpolation for `{version}`,
//! `{prev_version}`, `{tag}` and `{bundle_path}`. The versioning context's
//! environment (`VERSTAMP_PREVIOUS_VERSION`, `VERSTAMP_CURRENT_VERSION`) is
//! exported to every command.

use std::process::Command;
use std::time::{Duration, Instant};

use camino::Utf8Path;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors from hook execution.
#[derive(Error, Debug)]
pub enum HookError {
    /// A hook command exited with a non-zero status.
    #[error("hook command failed: {command}")]
    CommandFailed {
        /// The command that failed.
        command: String,
        /// The exit code, if available.
        exit_code: Option<i32>,
        /// Captured stderr.
        stderr: String,
    },

    /// Failed to spawn a hook command.
    #[error("failed to execute hook: {0}")]
    Exec(#[from] std::io::Error),
}

/// Result alias for hook operations.
pub type HookResult<T> = Result<T, HookError>;

/// Variables and environment for hook commands.
///
/// Usually derived from
/// [`VersioningContext::hook_context`](crate::context::VersioningContext::hook_context).
#[derive(Debug, Clone, Default)]
pub struct HookContext {
    /// The version being released (e.g., `1.2.3`).
    pub version: String,
    /// The previous version (e.g., `1.1.0`).
    pub prev_version: String,
    /// The pushed tag (e.g., `v1.2.3`), empty before tagging.
    pub tag: String,
    /// Absolute archive path, empty unless bundled.
    pub bundle_path: String,
    /// Extra environment variables for each command.
    pub env: Vec<(String, String)>,
}

/// Result of running a single hook command.
#[derive(Debug, Clone, Serialize)]
pub struct HookOutput {
    /// The original command (before interpolation).
    pub command: String,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
    /// How long the command took to run.
    pub duration: Duration,
}

/// Run hook commands in order, stopping at the first failure.
#[instrument(skip_all, fields(count = commands.len()))]
pub fn run_hooks(
    commands: &[String],
    context: &HookContext,
    project_root: &Utf8Path,
) -> HookResult<Vec<HookOutput>> {
    commands
        .iter()
        .map(|cmd| run_single(cmd, context, project_root))
        .collect()
}

fn run_single(cmd: &str, context: &HookContext, project_root: &Utf8Path) -> HookResult<HookOutput> {
    let interpolated = interpolate_command(cmd, context);
    debug!(%interpolated, "running hook");

    let start = Instant::now();
    let output = Command::new("sh")
        .args(["-c", &interpolated])
        .current_dir(project_root.as_std_path())
        .envs(context.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .output()?;
    let duration = start.elapsed();

    if !output.status.success() {
        return Err(HookError::CommandFailed {
            command: cmd.to_string(),
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(HookOutput {
        command: cmd.to_string(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        duration,
    })
}

/// Replace `{var}` placeholders with values from the context.
///
/// Public so that dry runs can show what would be executed.
pub fn interpolate_command(command: &str, context: &HookContext) -> String {
    command
        .replace("{version}", &context.version)
        .replace("{prev_version}", &context.prev_version)
        .replace("{tag}", &context.tag)
        .replace("{bundle_path}", &context.bundle_path)
}
