//! Git operations for release workflows.
//!
//! Shells out to `git` for all operations. This ensures we inherit the user's
//! SSH keys, GPG signing, hooks, and other configuration.
//!
//! Every operation runs inside the working tree a [`Repo`] was opened on, so
//! the same process can drive several repositories (the test suite does).

use std::process::Command;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    /// Failed to execute the `git` command.
    #[error("failed to run git: {0}")]
    Exec(#[from] std::io::Error),

    /// `git` returned a non-zero exit code.
    #[error("git {command} failed: {stderr}")]
    Command {
        /// The git subcommand that failed (e.g., "commit").
        command: String,
        /// Captured stderr (or stdout when git reported nothing on stderr).
        stderr: String,
    },

    /// A fetch or push against the remote failed.
    #[error("remote unavailable: git {command} failed: {stderr}")]
    RemoteUnavailable {
        /// The git subcommand that failed ("fetch" or "push").
        command: String,
        /// Captured stderr.
        stderr: String,
    },

    /// Not inside a git repository.
    #[error("not a git repository (or any parent up to mount point)")]
    NotARepo,
}

/// Result alias for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// A git working tree, addressed by its root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repo {
    root: Utf8PathBuf,
}

impl Repo {
    /// Open the working tree at (or containing) `root`.
    ///
    /// Nothing is checked here; operations fail with [`GitError::NotARepo`]
    /// when `root` turns out not to be inside a repository.
    pub fn new(root: impl AsRef<Utf8Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// The directory git commands run in.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Check if we're inside a git repository.
    #[instrument(skip(self), fields(root = %self.root))]
    pub fn is_inside(&self) -> GitResult<bool> {
        match self.git(&["rev-parse", "--is-inside-work-tree"]) {
            Ok(output) => Ok(output.trim() == "true"),
            Err(GitError::Command { .. } | GitError::NotARepo) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Get the current branch name.
    ///
    /// Returns `None` if in a detached HEAD state.
    #[instrument(skip(self), fields(root = %self.root))]
    pub fn current_branch(&self) -> GitResult<Option<String>> {
        let output = self.git(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        let branch = output.trim().to_string();
        if branch == "HEAD" {
            debug!("detached HEAD");
            Ok(None)
        } else {
            debug!(%branch, "current branch");
            Ok(Some(branch))
        }
    }

    /// Fetch all tags from `remote` so the local tag list mirrors it.
    #[instrument(skip(self), fields(root = %self.root))]
    pub fn fetch_tags(&self, remote: &str) -> GitResult<()> {
        self.remote_git(&["fetch", "--quiet", remote, "--tags"])?;
        Ok(())
    }

    /// List every tag name known locally.
    #[instrument(skip(self), fields(root = %self.root))]
    pub fn tags(&self) -> GitResult<Vec<String>> {
        let output = self.git(&["tag", "--list"])?;
        let tags: Vec<String> = output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToString::to_string)
            .collect();
        debug!(count = tags.len(), "listed tags");
        Ok(tags)
    }

    /// Stage the given paths for the next commit.
    #[instrument(skip(self), fields(root = %self.root))]
    pub fn add(&self, paths: &[String]) -> GitResult<()> {
        let mut args = vec!["add", "--"];
        args.extend(paths.iter().map(String::as_str));
        self.git(&args)?;
        Ok(())
    }

    /// Commit the staged changes, returning the short hash of the new commit.
    #[instrument(skip(self), fields(root = %self.root))]
    pub fn commit(&self, message: &str) -> GitResult<String> {
        self.git(&["commit", "-m", message])?;
        let hash = self.git(&["rev-parse", "--short", "HEAD"])?.trim().to_string();
        debug!(%hash, "created commit");
        Ok(hash)
    }

    /// Create an annotated tag on `HEAD`.
    #[instrument(skip(self), fields(root = %self.root))]
    pub fn create_annotated_tag(&self, name: &str, message: &str) -> GitResult<()> {
        self.git(&["tag", "-a", name, "-m", message])?;
        Ok(())
    }

    /// Push a single refspec to `remote`.
    #[instrument(skip(self), fields(root = %self.root))]
    pub fn push(&self, remote: &str, refspec: &str) -> GitResult<()> {
        self.remote_git(&["push", "--quiet", remote, refspec])?;
        Ok(())
    }

    /// Write a zip archive of `treeish` to `output`.
    #[instrument(skip(self), fields(root = %self.root))]
    pub fn archive_zip(&self, output: &Utf8Path, treeish: &str) -> GitResult<()> {
        let output_arg = format!("--output={output}");
        self.git(&["archive", "--format=zip", &output_arg, treeish])?;
        Ok(())
    }

    /// Get the URL configured for a named remote.
    #[instrument(skip(self), fields(root = %self.root))]
    pub fn remote_url(&self, remote: &str) -> GitResult<Option<String>> {
        match self.git(&["remote", "get-url", remote]) {
            Ok(url) => {
                let url = url.trim().to_string();
                debug!(%remote, %url, "remote URL");
                Ok(Some(url))
            }
            Err(GitError::Command { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Run a command that talks to a remote, classifying failures as
    /// [`GitError::RemoteUnavailable`].
    fn remote_git(&self, args: &[&str]) -> GitResult<String> {
        match self.git(args) {
            Err(GitError::Command { command, stderr }) => {
                Err(GitError::RemoteUnavailable { command, stderr })
            }
            other => other,
        }
    }

    /// Run a git command and return its stdout.
    fn git(&self, args: &[&str]) -> GitResult<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.root.as_std_path())
            // Never block on a credential prompt
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).to_string());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        // Detect "not a git repo" specifically
        if stderr.contains("not a git repository") {
            return Err(GitError::NotARepo);
        }

        // `git commit` reports "nothing to commit" on stdout
        let stderr = if stderr.is_empty() {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        } else {
            stderr
        };

        Err(GitError::Command {
            command: args.first().unwrap_or(&"").to_string(),
            stderr,
        })
    }
}

/// Throwaway repositories for tests: a bare "remote" and a clone of it.
#[cfg(test)]
pub(crate) mod testing {
    use std::process::Command;

    use camino::{Utf8Path, Utf8PathBuf};
    use tempfile::TempDir;

    use super::Repo;

    /// A clone with an `origin` remote, both living in temp directories.
    pub struct Sandbox {
        _tmp: TempDir,
        pub remote: Utf8PathBuf,
        pub work: Utf8PathBuf,
    }

    impl Sandbox {
        pub fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let base = Utf8Path::from_path(tmp.path()).unwrap().to_path_buf();
            let remote = base.join("remote.git");
            let work = base.join("work");

            run(&base, &["init", "--quiet", "--bare", "-b", "main", remote.as_str()]);
            run(&base, &["init", "--quiet", "-b", "main", work.as_str()]);
            run(&work, &["config", "user.name", "Release Bot"]);
            run(&work, &["config", "user.email", "release@example.com"]);
            run(&work, &["config", "commit.gpgsign", "false"]);
            run(&work, &["config", "tag.gpgsign", "false"]);
            run(&work, &["remote", "add", "origin", remote.as_str()]);

            std::fs::write(
                work.join("package.json"),
                "{\n  \"name\": \"demo\",\n  \"version\": \"1.0.0\"\n}\n",
            )
            .unwrap();
            run(&work, &["add", "package.json"]);
            run(&work, &["commit", "--quiet", "-m", "initial"]);
            run(&work, &["push", "--quiet", "-u", "origin", "main"]);

            Self {
                _tmp: tmp,
                remote,
                work,
            }
        }

        pub fn repo(&self) -> Repo {
            Repo::new(&self.work)
        }

        /// Run git in the working clone, returning trimmed stdout.
        pub fn git(&self, args: &[&str]) -> String {
            run(&self.work, args)
        }

        /// Run git against the bare remote, returning trimmed stdout.
        pub fn remote_git(&self, args: &[&str]) -> String {
            run(&self.remote, args)
        }
    }

    fn run(dir: &Utf8Path, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir.as_std_path())
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }
}
