//! Preflight checks for release readiness.
//!
//! Read-only: validates that `git` is available, the project is a work
//! tree, the configured remote exists and the first version file is
//! readable. Returns structured results that the CLI formats.

use camino::Utf8Path;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::git::Repo;
use crate::store::VersionStore;

/// A single preflight check result.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    /// Human-readable name of the check.
    pub name: String,
    /// Whether the check passed.
    pub passed: bool,
    /// Description of the result (reason for failure, or confirmation).
    pub message: String,
}

impl CheckResult {
    fn pass(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            message: message.into(),
        }
    }

    fn fail(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            message: message.into(),
        }
    }
}

/// Full preflight report.
#[derive(Debug, Clone, Serialize)]
pub struct PreflightReport {
    /// Individual check results.
    pub checks: Vec<CheckResult>,
    /// Whether all checks passed.
    pub all_passed: bool,
    /// Version read from the first version file, if readable.
    pub current_version: Option<String>,
}

/// Run all preflight checks against the project at `project_root`.
#[instrument(skip(config), fields(root = %project_root))]
pub fn run_preflight(project_root: &Utf8Path, config: &Config) -> PreflightReport {
    let mut checks = Vec::new();

    let git = check_git_binary();
    let has_git = git.passed;
    checks.push(git);

    let repo = Repo::new(project_root);
    if has_git {
        let in_repo = check_git_repo(&repo);
        let is_repo = in_repo.passed;
        checks.push(in_repo);
        if is_repo {
            checks.push(check_remote(&repo, &config.git.remote));
        }
    }

    let (version_check, current_version) = check_version_file(project_root, config);
    checks.push(version_check);

    let all_passed = checks.iter().all(|c| c.passed);
    debug!(all_passed, check_count = checks.len(), "preflight complete");

    PreflightReport {
        checks,
        all_passed,
        current_version,
    }
}

fn check_git_binary() -> CheckResult {
    match which::which("git") {
        Ok(path) => CheckResult::pass("Git binary", format!("Found {}", path.display())),
        Err(_) => CheckResult::fail("Git binary", "git not found on PATH"),
    }
}

fn check_git_repo(repo: &Repo) -> CheckResult {
    match repo.is_inside() {
        Ok(true) => CheckResult::pass("Git repository", "Inside a git repository"),
        Ok(false) => CheckResult::fail("Git repository", "Not inside a git repository"),
        Err(e) => CheckResult::fail("Git repository", format!("Failed to check: {e}")),
    }
}

fn check_remote(repo: &Repo, remote: &str) -> CheckResult {
    match repo.remote_url(remote) {
        Ok(Some(url)) => CheckResult::pass("Remote", format!("'{remote}' points at {url}")),
        Ok(None) => CheckResult::fail("Remote", format!("No remote named '{remote}'")),
        Err(e) => CheckResult::fail("Remote", format!("Failed to check: {e}")),
    }
}

fn check_version_file(project_root: &Utf8Path, config: &Config) -> (CheckResult, Option<String>) {
    let versioner = config.versioning.versioner.build();
    let store = VersionStore::new(
        project_root,
        &config.versioning.version_files,
        versioner.as_ref(),
    );
    match store.read() {
        Ok(version) => {
            let file = store.files().first().map(ToString::to_string).unwrap_or_default();
            (
                CheckResult::pass("Version file", format!("{file} is at {version}")),
                Some(version),
            )
        }
        Err(e) => (CheckResult::fail("Version file", e.to_string()), None),
    }
}
